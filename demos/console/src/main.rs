//! Quill Console Example
//!
//! An interactive console that serves the commands in `commands.txt` against a
//! tiny in-memory economy. Every input line is dispatched like a chat command;
//! a line starting with `?` prints the completions for the rest of the line.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package quill-console
//! cargo run --package quill-console -- --as Steve --permission demo.give
//! ```
//!
//! Configuration is read from `quill.toml` (or the file given with
//! `--config`) and `QUILL_*` environment variables, e.g.
//! `QUILL_LOGGING__LEVEL=debug`.

use std::any::Any;
use std::collections::{BTreeMap, HashSet};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use parking_lot::Mutex;
use quill::prelude::*;
use quill::runtime::{load_config_from_file, logging};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "quill-console", about = "Interactive Quill command console")]
struct Cli {
    /// Configuration file (TOML or YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Command definition file, loaded after any configured ones
    #[arg(long, default_value = "demos/console/commands.txt")]
    commands: PathBuf,

    /// Start as this player instead of the console
    #[arg(long = "as")]
    player: Option<String>,

    /// Permissions held by players
    #[arg(short, long, value_delimiter = ',')]
    permission: Vec<String>,

    /// Players that are online
    #[arg(long, value_delimiter = ',', default_value = "Steve,Alex")]
    players: Vec<String>,
}

// ============================================================================
// Actors
// ============================================================================

/// Whoever is typing: the console or a player.
#[derive(Debug)]
struct ConsoleActor {
    name: String,
    kind: SenderKind,
    permissions: Arc<HashSet<String>>,
}

impl ConsoleActor {
    fn console() -> Self {
        Self {
            name: "console".to_string(),
            kind: SenderKind::Console,
            permissions: Arc::default(),
        }
    }

    fn player(name: &str, permissions: Arc<HashSet<String>>) -> Self {
        Self {
            name: name.to_string(),
            kind: SenderKind::Player,
            permissions,
        }
    }
}

impl Actor for ConsoleActor {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_permission(&self, permission: &str) -> bool {
        self.kind == SenderKind::Console || self.permissions.contains(permission)
    }

    fn kind(&self) -> SenderKind {
        self.kind
    }

    fn send_message(&self, text: &str) {
        println!("{text}");
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Demo state
// ============================================================================

#[derive(Debug, Default)]
struct World {
    online: Vec<String>,
    balances: Mutex<BTreeMap<String, i64>>,
    warps: Mutex<BTreeMap<String, String>>,
    locations: Mutex<BTreeMap<String, String>>,
    switch_to: Mutex<Option<String>>,
}

impl World {
    fn new(online: Vec<String>) -> Self {
        Self {
            online,
            ..Self::default()
        }
    }

    fn find_player(&self, token: &str) -> Option<&String> {
        self.online.iter().find(|name| name.eq_ignore_ascii_case(token))
    }

    fn deposit(&self, player: &str, amount: i64) -> i64 {
        let mut balances = self.balances.lock();
        let balance = balances.entry(player.to_string()).or_default();
        *balance += amount;
        *balance
    }
}

fn register_world(manager: &mut CommandManager, world: &Arc<World>) -> Result<()> {
    let players = Arc::clone(world);
    let completions = Arc::clone(world);
    manager.register_type(
        ArgType::new("player", move |_, token| {
            players.find_player(token).map(|name| Value::from(name.as_str()))
        })
        .with_completions(move |_| completions.online.clone()),
    )?;

    manager.register_provider(
        ContextProvider::new("self", |actor| {
            (actor.kind() == SenderKind::Player).then(|| Value::from(actor.name()))
        })
        .with_error("Only players can use this without naming a player."),
    )?;
    Ok(())
}

fn hooks(world: &Arc<World>) -> HookTable {
    let give = Arc::clone(world);
    let give_all = Arc::clone(world);
    let balance = Arc::clone(world);
    let warp_list = Arc::clone(world);
    let warp_set = Arc::clone(world);
    let warp_go = Arc::clone(world);
    let switch = Arc::clone(world);

    HookTable::new()
        .hook(
            "give",
            move |actor: &dyn Actor, amount: i32, target: String, silent: bool| {
                let total = give.deposit(&target, i64::from(amount));
                info!(from = %actor.name(), to = %target, amount, "Coins given");
                (!silent).then(|| format!("Gave {amount} coins to {target} (now {total})"))
            },
        )
        .hook("give_all", move |_: &dyn Actor, amount: i32| {
            for player in &give_all.online {
                give_all.deposit(player, i64::from(amount));
            }
            format!("Gave {amount} coins to {} players", give_all.online.len())
        })
        .hook("balance", move |_: &dyn Actor, player: String| {
            let coins = balance.balances.lock().get(&player).copied().unwrap_or(0);
            format!("{player} has {coins} coins")
        })
        .hook("warp_list", move |_: &dyn Actor| {
            let warps = warp_list.warps.lock();
            if warps.is_empty() {
                "No warps saved".to_string()
            } else {
                warps.keys().cloned().collect::<Vec<_>>().join(", ")
            }
        })
        .hook("warp_set", move |actor: &dyn Actor, name: String| {
            let here = warp_set
                .locations
                .lock()
                .get(actor.name())
                .cloned()
                .unwrap_or_else(|| "spawn".to_string());
            warp_set.warps.lock().insert(name.clone(), here.clone());
            format!("Saved warp {name} at {here}")
        })
        .hook("warp_go", move |actor: &dyn Actor, name: String| {
            let Some(target) = warp_go.warps.lock().get(&name).cloned() else {
                return Err(format!("unknown warp {name}"));
            };
            warp_go
                .locations
                .lock()
                .insert(actor.name().to_string(), target.clone());
            Ok(format!("Warped to {name} ({target})"))
        })
        .hook("say", |actor: &dyn Actor, message: String| {
            format!("[{}] {message}", actor.name())
        })
        .hook("switch", move |_: &dyn Actor, player: String| {
            *switch.switch_to.lock() = Some(player);
        })
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config_from_file(path)?,
        None => load_config()?,
    };
    logging::init_from_config(&config.logging);

    let world = Arc::new(World::new(cli.players.clone()));
    let mut manager = CommandManager::from_config(&config);
    register_world(&mut manager, &world)?;

    let hooks = hooks(&world);
    manager.load_files(&config.commands.files, &[&hooks])?;
    manager
        .load_file(&cli.commands, &[&hooks])
        .with_context(|| format!("loading {}", cli.commands.display()))?;

    let permissions = Arc::new(cli.permission.iter().cloned().collect::<HashSet<_>>());
    let mut actor = match &cli.player {
        Some(name) => ConsoleActor::player(name, Arc::clone(&permissions)),
        None => ConsoleActor::console(),
    };
    info!(commands = ?manager.roots(), actor = %actor.name, "Console ready");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        write!(stdout, "{}> ", actor.name)?;
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim_end_matches(['\r', '\n']);

        match line.trim() {
            "" => continue,
            "exit" | "quit" => break,
            _ => {}
        }

        if let Some(partial) = line.strip_prefix('?') {
            let candidates = manager.complete_line(&actor, partial.trim_start());
            println!("{}", candidates.join("  "));
            continue;
        }

        if !manager.execute_line(&actor, line) {
            println!("Unknown command. Known: {}", manager.roots().join(", "));
        }

        if let Some(name) = world.switch_to.lock().take() {
            actor = ConsoleActor::player(&name, Arc::clone(&permissions));
        }
    }

    Ok(())
}
