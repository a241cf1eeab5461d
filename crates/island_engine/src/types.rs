//! # Core Type Definitions
//!
//! Fundamental value types shared by every island component: player identities,
//! world locations, block coordinates, materials and biomes.
//!
//! ## Key Types
//!
//! - [`PlayerId`] - Stable identity of a player (UUID)
//! - [`IslandIndex`] - Sequential primary key of an island
//! - [`Location`] - World position with orientation, used for spawns and warps
//! - [`BlockPos`] - Integer voxel coordinate
//! - [`Material`] - Block material name as reported by the terrain service
//! - [`Biome`] - The fixed set of biomes an island owner may choose from

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Sequential island identifier. Never reused once assigned.
pub type IslandIndex = u32;

/// Unique identifier for a player.
///
/// A wrapper around UUID so player identities cannot be confused with other
/// identifiers. The persisted form is the hyphenated UUID string.
///
/// # Examples
///
/// ```rust
/// use island_engine::PlayerId;
///
/// let player = PlayerId::from_str("550e8400-e29b-41d4-a716-446655440000")?;
/// println!("Player ID: {}", player);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    /// Creates a new random player ID using UUID v4.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses a player ID from its string representation.
    pub fn from_str(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }
}

impl FromStr for PlayerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlayerId::from_str(s)
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A position in a named world with a facing direction.
///
/// Spawn and warp points are stored as full locations so players arrive facing
/// the way the owner was facing when the point was set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Name of the world the location belongs to
    pub world: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Horizontal rotation in degrees
    pub yaw: f32,
    /// Vertical rotation in degrees
    pub pitch: f32,
}

impl Location {
    /// Creates a location with a neutral orientation.
    pub fn new(world: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    /// Returns a copy of this location with the given orientation.
    pub fn facing(mut self, yaw: f32, pitch: f32) -> Self {
        self.yaw = yaw;
        self.pitch = pitch;
        self
    }

    /// Squared distance on the horizontal (x/z) plane, ignoring height.
    pub fn horizontal_distance_squared(&self, x: f64, z: f64) -> f64 {
        let dx = self.x - x;
        let dz = self.z - z;
        dx * dx + dz * dz
    }

    /// The block this location falls inside.
    pub fn block(&self) -> BlockPos {
        BlockPos::new(
            self.x.floor() as i32,
            self.y.floor() as i32,
            self.z.floor() as i32,
        )
    }
}

/// Integer voxel coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Location at the centre of the block's bottom face.
    pub fn to_location(self, world: impl Into<String>) -> Location {
        Location::new(
            world,
            self.x as f64 + 0.5,
            self.y as f64,
            self.z as f64 + 0.5,
        )
    }
}

/// Block material name, upper snake case (`GRASS_BLOCK`, `OAK_LOG`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Material(pub String);

impl Material {
    pub const AIR: &'static str = "AIR";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into().to_ascii_uppercase())
    }

    pub fn air() -> Self {
        Self(Self::AIR.to_string())
    }

    /// Empty blocks contribute nothing to an island's score.
    pub fn is_air(&self) -> bool {
        matches!(self.0.as_str(), "AIR" | "CAVE_AIR" | "VOID_AIR")
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// `GRASS_BLOCK` becomes `Grass Block`.
    pub fn display_name(&self) -> String {
        title_case(&self.0)
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn title_case(raw: &str) -> String {
    raw.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let lower = word.to_ascii_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Biomes an island owner may apply to their island.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Biome {
    Badlands,
    DeepDark,
    Desert,
    DripstoneCaves,
    Forest,
    Jungle,
    LushCaves,
    Meadow,
    MushroomFields,
    Ocean,
    Plains,
    River,
    Savanna,
    SnowyTaiga,
    Swamp,
    Taiga,
}

impl Biome {
    /// Every selectable biome, in alphabetical order of [`Biome::key`].
    pub const ALL: [Biome; 16] = [
        Biome::Badlands,
        Biome::DeepDark,
        Biome::Desert,
        Biome::DripstoneCaves,
        Biome::Forest,
        Biome::Jungle,
        Biome::LushCaves,
        Biome::Meadow,
        Biome::MushroomFields,
        Biome::Ocean,
        Biome::Plains,
        Biome::River,
        Biome::Savanna,
        Biome::SnowyTaiga,
        Biome::Swamp,
        Biome::Taiga,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Biome::Badlands => "BADLANDS",
            Biome::DeepDark => "DEEP_DARK",
            Biome::Desert => "DESERT",
            Biome::DripstoneCaves => "DRIPSTONE_CAVES",
            Biome::Forest => "FOREST",
            Biome::Jungle => "JUNGLE",
            Biome::LushCaves => "LUSH_CAVES",
            Biome::Meadow => "MEADOW",
            Biome::MushroomFields => "MUSHROOM_FIELDS",
            Biome::Ocean => "OCEAN",
            Biome::Plains => "PLAINS",
            Biome::River => "RIVER",
            Biome::Savanna => "SAVANNA",
            Biome::SnowyTaiga => "SNOWY_TAIGA",
            Biome::Swamp => "SWAMP",
            Biome::Taiga => "TAIGA",
        }
    }

    /// Lower case with spaces, as shown to players.
    pub fn display_name(self) -> String {
        self.key().to_ascii_lowercase().replace('_', " ")
    }

    /// Comma separated list of every key, used in the "invalid biome" reply.
    pub fn available() -> String {
        Self::ALL
            .iter()
            .map(|biome| biome.key())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromStr for Biome {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|biome| biome.key() == wanted)
            .ok_or(())
    }
}

impl fmt::Display for Biome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_round_trips_through_string() {
        let player = PlayerId::new();
        let parsed: PlayerId = player.to_string().parse().expect("valid uuid");
        assert_eq!(player, parsed);
        assert!(PlayerId::from_str("not-a-uuid").is_err());
    }

    #[test]
    fn test_material_display_name() {
        assert_eq!(Material::new("grass_block").display_name(), "Grass Block");
        assert_eq!(Material::new("DIRT").display_name(), "Dirt");
        assert!(Material::air().is_air());
        assert!(Material::new("cave_air").is_air());
        assert!(!Material::new("STONE").is_air());
    }

    #[test]
    fn test_biome_parsing_is_case_insensitive() {
        assert_eq!("snowy_taiga".parse::<Biome>(), Ok(Biome::SnowyTaiga));
        assert_eq!("PLAINS".parse::<Biome>(), Ok(Biome::Plains));
        assert!("PALE_GARDEN".parse::<Biome>().is_err());
        assert_eq!(Biome::MushroomFields.display_name(), "mushroom fields");
    }

    #[test]
    fn test_biome_list_is_alphabetical() {
        let keys: Vec<&str> = Biome::ALL.iter().map(|b| b.key()).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert!(Biome::available().starts_with("BADLANDS, DEEP_DARK"));
    }

    #[test]
    fn test_horizontal_distance_ignores_height() {
        let location = Location::new("skyblock_world", 3.0, 250.0, 4.0);
        assert_eq!(location.horizontal_distance_squared(0.0, 0.0), 25.0);
    }
}
