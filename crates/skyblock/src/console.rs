//! Operator console.
//!
//! Reads one command per line from stdin and drives the engine as if the
//! named player had typed it. Players are simulated by [`ConsoleGateway`],
//! which keeps their positions in memory and logs every message sent to them.
//!
//! ```text
//! join <name>                  connect a player (stand in the lobby)
//! quit <name>                  disconnect a player
//! save                         force a save
//! players                      list connected players
//! stop                         shut the server down
//! <name> <subcommand> [args]   run an island command or world event as <name>
//! ```

use dashmap::DashMap;
use island_engine::{
    BlockAction, IslandEngine, IslandSettings, Location, PlayerGateway, PlayerId, SaveOutcome,
    ShutdownState,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

const HELP: &str = "island commands: create, home, restart, setspawn, setwarp, invite <p>, accept, reject, \
kick <p>, ban <p>, unban <p>, promote <p>, leave, lock, unlock, togglelock, setname <name>, \
setgreeting <text>, setfarewell <text>, setbiome <biome>, warp [p], teleport <p>, party, info [p], top, \
permission <grant|revoke> <p> <perm>; world events: move <x> <y> <z>, goto <x> <y> <z> [world], \
break|place|use <x> <y> <z>, respawn";

#[derive(Debug, Clone)]
struct ConsolePlayer {
    name: String,
    online: bool,
    location: Location,
}

/// Player gateway backed by the console: stable name-derived identities,
/// in-memory positions, messages written to the log.
pub struct ConsoleGateway {
    players: DashMap<PlayerId, ConsolePlayer>,
    lobby: Location,
}

impl ConsoleGateway {
    pub fn new(settings: &IslandSettings) -> Self {
        Self {
            players: DashMap::new(),
            lobby: Location::new(settings.lobby_world.clone(), 0.5, 64.0, 0.5),
        }
    }

    /// Identity of `name`. The same name always maps to the same player, so
    /// islands survive restarts.
    pub fn identity(name: &str) -> PlayerId {
        let key = format!("OfflinePlayer:{}", name.to_ascii_lowercase());
        PlayerId(Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes()))
    }

    /// Connects a player in the lobby.
    pub fn join(&self, name: &str) -> PlayerId {
        let player = Self::identity(name);
        self.players.insert(
            player,
            ConsolePlayer {
                name: name.to_string(),
                online: true,
                location: self.lobby.clone(),
            },
        );
        info!("👋 {} joined ({})", name, player);
        player
    }

    pub fn quit(&self, player: PlayerId) {
        if let Some(mut entry) = self.players.get_mut(&player) {
            entry.online = false;
            info!("👋 {} left", entry.name);
        }
    }

    pub fn place(&self, player: PlayerId, location: Location) {
        if let Some(mut entry) = self.players.get_mut(&player) {
            entry.location = location;
        }
    }

    pub fn online_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .players
            .iter()
            .filter(|entry| entry.online)
            .map(|entry| entry.name.clone())
            .collect();
        names.sort();
        names
    }
}

impl PlayerGateway for ConsoleGateway {
    fn online_player(&self, name: &str) -> Option<PlayerId> {
        self.known_player(name).filter(|player| self.is_online(*player))
    }

    fn known_player(&self, name: &str) -> Option<PlayerId> {
        self.players
            .iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(name))
            .map(|entry| *entry.key())
    }

    fn name_of(&self, player: PlayerId) -> String {
        self.players
            .get(&player)
            .map(|entry| entry.name.clone())
            .unwrap_or_else(|| player.to_string())
    }

    fn is_online(&self, player: PlayerId) -> bool {
        self.players.get(&player).map(|entry| entry.online).unwrap_or(false)
    }

    fn location_of(&self, player: PlayerId) -> Option<Location> {
        self.players
            .get(&player)
            .filter(|entry| entry.online)
            .map(|entry| entry.location.clone())
    }

    fn send_message(&self, player: PlayerId, message: &str) {
        if let Some(entry) = self.players.get(&player).filter(|entry| entry.online) {
            info!("💬 [{}] {}", entry.name, message);
        }
    }

    fn teleport(&self, player: PlayerId, destination: &Location) {
        if let Some(mut entry) = self.players.get_mut(&player) {
            info!(
                "🌀 {} teleported to {} ({:.1}, {:.1}, {:.1})",
                entry.name, destination.world, destination.x, destination.y, destination.z
            );
            entry.location = destination.clone();
        }
    }

    fn send_to_lobby(&self, player: PlayerId) {
        let lobby = self.lobby.clone();
        self.teleport(player, &lobby);
    }

    fn reset_player_state(&self, player: PlayerId) {
        debug!("🧼 Reset inventory and progress of {}", self.name_of(player));
    }
}

/// One parsed console line.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Join(String),
    Quit(String),
    Save,
    Players,
    Stop,
    Help,
    /// `<player> <subcommand> [args...]`
    Player {
        name: String,
        subcommand: String,
        args: Vec<String>,
    },
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Option<Self> {
        let mut words = line.split_whitespace();
        let first = words.next()?;
        let rest: Vec<String> = words.map(str::to_string).collect();

        let command = match (first.to_ascii_lowercase().as_str(), rest.as_slice()) {
            ("join", [name]) => ConsoleCommand::Join(name.clone()),
            ("quit", [name]) => ConsoleCommand::Quit(name.clone()),
            ("save", []) => ConsoleCommand::Save,
            ("players", []) => ConsoleCommand::Players,
            ("stop", []) => ConsoleCommand::Stop,
            ("help", []) => ConsoleCommand::Help,
            (_, [subcommand, args @ ..]) => ConsoleCommand::Player {
                name: first.to_string(),
                subcommand: subcommand.to_ascii_lowercase(),
                args: args.to_vec(),
            },
            _ => return None,
        };
        Some(command)
    }
}

/// Parses `x y z [world]` into a location in `default_world`.
fn parse_location(args: &[String], default_world: &str) -> Option<Location> {
    let coordinate = |i: usize| args.get(i).and_then(|raw| raw.parse::<f64>().ok());
    let world = args.get(3).map(String::as_str).unwrap_or(default_world);
    Some(Location::new(world, coordinate(0)?, coordinate(1)?, coordinate(2)?))
}

/// Drives the engine with one command. Returns `false` when the console
/// should stop reading.
pub async fn dispatch(
    engine: &IslandEngine,
    gateway: &ConsoleGateway,
    shutdown: &ShutdownState,
    command: ConsoleCommand,
) -> bool {
    match command {
        ConsoleCommand::Join(name) => {
            gateway.join(&name);
        }
        ConsoleCommand::Quit(name) => match gateway.known_player(&name) {
            Some(player) => {
                engine.player_quit(player);
                gateway.quit(player);
            }
            None => warn!("⚠️ Unknown player: {}", name),
        },
        ConsoleCommand::Save => match engine.save(true).await {
            Ok(SaveOutcome::Saved { islands }) => info!("💾 Saved {} islands", islands),
            Ok(SaveOutcome::Skipped) => {}
            Err(e) => error!("❌ Save failed: {}", e),
        },
        ConsoleCommand::Players => {
            info!("👥 Online: {}", gateway.online_names().join(", "));
        }
        ConsoleCommand::Help => info!("❓ {}", HELP),
        ConsoleCommand::Stop => {
            info!("🛑 Stop requested from console");
            shutdown.initiate_shutdown();
            return false;
        }
        ConsoleCommand::Player {
            name,
            subcommand,
            args,
        } => match gateway.online_player(&name) {
            Some(player) => run_player_command(engine, gateway, player, &subcommand, &args).await,
            None => warn!("⚠️ {} is not online; use `join {}` first", name, name),
        },
    }
    true
}

async fn run_player_command(
    engine: &IslandEngine,
    gateway: &ConsoleGateway,
    player: PlayerId,
    subcommand: &str,
    args: &[String],
) {
    let first = args.first().map(String::as_str);
    let text = args.join(" ");
    let world = engine.settings().world.clone();

    // Engine operations report their own failures to the player.
    let outcome = match subcommand {
        "create" => engine.create_island(player).await.map(drop),
        "home" => engine.teleport_to_island(player).await,
        "restart" => engine.restart_island(player).await,
        "setspawn" => engine.set_island_spawn(player).await,
        "setwarp" => engine.set_island_warp(player).await,
        "invite" => engine.invite(player, first).await,
        "accept" => engine.accept_invitation(player).await.map(drop),
        "reject" => engine.reject_invitation(player).await,
        "kick" => engine.kick(player, first).await,
        "ban" => engine.ban(player, first).await,
        "unban" => engine.unban(player, first).await,
        "promote" => engine.promote(player, first).await,
        "leave" => engine.leave_island(player).await,
        "lock" => engine.lock_warp(player).await,
        "unlock" => engine.unlock_warp(player).await,
        "togglelock" => engine.toggle_warp_lock(player).await.map(drop),
        "setname" => engine.set_island_name(player, &text).await,
        "setgreeting" => engine.set_greeting(player, &text).await,
        "setfarewell" => engine.set_farewell(player, &text).await,
        "setbiome" => engine.set_island_biome(player, first).await.map(drop),
        "warp" => engine.warp_teleport(player, first).await,
        "teleport" | "tp" => engine.teleport_to_friend(player, first).await,
        "party" => engine.show_island_party(player).await.map(drop),
        "info" => engine.show_island_info(player, first).await.map(drop),
        "top" => engine.send_top_islands(player).await.map(drop),
        "permission" => {
            let grant = match first {
                Some("grant") => Some(true),
                Some("revoke") => Some(false),
                _ => None,
            };
            match grant {
                Some(grant) => engine
                    .set_friend_permission(
                        player,
                        args.get(1).map(String::as_str),
                        args.get(2).map(String::as_str),
                        grant,
                    )
                    .await
                    .map(drop),
                None => {
                    gateway.send_message(
                        player,
                        "Invalid syntax. Usage: /island permission <grant|revoke> <player> <permission>",
                    );
                    Ok(())
                }
            }
        }
        "move" => {
            if let Some(to) = parse_location(args, &world) {
                gateway.place(player, to.clone());
                engine.on_player_move(player, &to).await;
            } else {
                warn!("⚠️ Usage: <player> move <x> <y> <z> [world]");
            }
            Ok(())
        }
        "goto" => match parse_location(args, &world) {
            Some(to) => engine
                .check_teleport(player, &to)
                .await
                .map(|()| gateway.teleport(player, &to)),
            None => {
                warn!("⚠️ Usage: <player> goto <x> <y> <z> [world]");
                Ok(())
            }
        },
        "break" | "place" | "use" => {
            let action = match subcommand {
                "break" => BlockAction::Break,
                "place" => BlockAction::Place,
                _ => BlockAction::UseItem,
            };
            match parse_location(args, &world) {
                Some(target) => engine
                    .check_block_action(player, &target, action, false)
                    .await
                    .map(|()| info!("✅ {} may {}", gateway.name_of(player), action.phrase())),
                None => {
                    warn!("⚠️ Usage: <player> {} <x> <y> <z>", subcommand);
                    Ok(())
                }
            }
        }
        "respawn" => {
            match engine.respawn_location(player).await {
                Some(spawn) => gateway.teleport(player, &spawn),
                None => gateway.send_to_lobby(player),
            }
            Ok(())
        }
        other => {
            warn!("⚠️ Unknown subcommand `{}`. {}", other, HELP);
            Ok(())
        }
    };

    if let Err(e) = outcome {
        debug!("{} {} refused: {}", gateway.name_of(player), subcommand, e);
    }
}

/// Reads console lines until EOF, `stop`, or shutdown.
pub async fn run(engine: IslandEngine, gateway: Arc<ConsoleGateway>, shutdown: ShutdownState) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    info!("⌨️ Console ready - type `help` for commands");

    loop {
        let line = tokio::select! {
            _ = shutdown.wait() => break,
            line = lines.next_line() => line,
        };
        match line {
            Ok(Some(line)) => {
                let Some(command) = ConsoleCommand::parse(&line) else {
                    continue;
                };
                if !dispatch(&engine, &gateway, &shutdown, command).await {
                    break;
                }
            }
            Ok(None) => {
                debug!("⌨️ Console input closed");
                break;
            }
            Err(e) => {
                error!("❌ Console read failed: {}", e);
                break;
            }
        }
    }
}
