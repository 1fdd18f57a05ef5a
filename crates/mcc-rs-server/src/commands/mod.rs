//! Server commands and the console sender.

use std::sync::Arc;

use mcc_rs_command::{CommandContext, CommandRegistry, CommandResult, CommandSender};
use tracing::info;

use crate::server::{LevelHandle, Server};
use crate::session::Session;

mod level;
mod player;

/// Longest accepted level name.
const MAX_LEVEL_NAME: usize = 64;

type Ctx<'a> = CommandContext<'a, Arc<Session>>;

/// The operator at the terminal.
pub struct Console;

impl CommandSender for Console {
    type Player = Arc<Session>;

    fn name(&self) -> String {
        "Console".to_string()
    }

    fn send_message(&self, message: &str) {
        info!("{message}");
    }

    fn as_player(&self) -> Option<Arc<Session>> {
        None
    }
}

pub fn register(registry: &mut CommandRegistry<Server, Arc<Session>>) {
    level::register(registry);
    player::register(registry);
}

/// Unwrap a `Result<T, CommandResult>` or return the refusal.
macro_rules! try_cmd {
    ($e:expr) => {
        match $e {
            Ok(value) => value,
            Err(result) => return result,
        }
    };
}
use try_cmd;

fn find_level(server: &Server, name: &str) -> Result<LevelHandle, CommandResult> {
    server
        .find_level(name)
        .ok_or_else(|| CommandResult::err(format!("Level {name} is not loaded")))
}

/// The level the sending player is on.
fn own_level(ctx: &Ctx<'_>) -> Result<(Arc<Session>, LevelHandle), CommandResult> {
    let player = ctx.player()?;
    let level = player
        .level()
        .ok_or_else(|| CommandResult::err("You are not on a level"))?;
    Ok((player, level))
}

/// Refuse players without operator status. The console always passes.
fn require_operator(ctx: &Ctx<'_>) -> Result<(), CommandResult> {
    match ctx.sender.as_player() {
        Some(player) if !player.is_operator() => {
            Err(CommandResult::err("You must be an operator to do that"))
        }
        _ => Ok(()),
    }
}
