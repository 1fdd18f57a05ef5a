//! Level management: creating, copying, loading and switching levels.

use std::sync::Arc;

use mcc_rs_command::args::{is_valid_name, parse_number};
use mcc_rs_command::{CommandRegistry, CommandResult};
use mcc_rs_world::generator::generator;
use mcc_rs_world::{Level, Weather};

use super::{find_level, own_level, require_operator, try_cmd, Ctx, MAX_LEVEL_NAME};
use crate::server::Server;
use crate::session::Session;

pub(super) fn register(registry: &mut CommandRegistry<Server, Arc<Session>>) {
    registry.register("copylvl", "<src> <dest>", "Copy a level", cmd_copylvl);
    registry.register("goto", "<level>", "Go to another level", cmd_goto);
    registry.register("levels", "", "List loaded levels", cmd_levels);
    registry.register("list", "", "List online players", cmd_list);
    registry.register("load", "<level>", "Load a level from disk", cmd_load);
    registry.register("main", "[level]", "Show or set the main level", cmd_main);
    registry.register(
        "newlvl",
        "<name> <width> <height> <length> <theme> [args]",
        "Generate a new level",
        cmd_newlvl,
    );
    registry.register("save", "<level|all>", "Save levels to disk", cmd_save);
    registry.register("setspawn", "[player]", "Set the level spawn", cmd_setspawn);
    registry.register("spawn", "", "Return to the level spawn", cmd_spawn);
    registry.register("unload", "<level>", "Unload a level", cmd_unload);
    registry.register(
        "weather",
        "[level] <sunny|raining|snowing>",
        "Change the weather",
        cmd_weather,
    );
}

fn parse_weather(arg: &str) -> Option<Weather> {
    match arg.to_ascii_lowercase().as_str() {
        "sunny" | "sun" | "clear" => Some(Weather::Sunny),
        "raining" | "rain" => Some(Weather::Raining),
        "snowing" | "snow" => Some(Weather::Snowing),
        _ => None,
    }
}

fn cmd_copylvl(server: &Server, ctx: &Ctx<'_>) -> CommandResult {
    let [src, dest] = ctx.args.as_slice() else {
        return CommandResult::usage("copylvl", "<src> <dest>");
    };
    try_cmd!(require_operator(ctx));
    if !is_valid_name(dest, MAX_LEVEL_NAME) {
        return CommandResult::err(format!("Invalid level name: {dest}"));
    }
    if server.level_exists(dest) {
        return CommandResult::err(format!("Level {dest} already exists"));
    }
    let source = try_cmd!(find_level(server, src));
    let copy = match source.read().clone_named(dest) {
        Ok(level) => level,
        Err(e) => return CommandResult::err(e.to_string()),
    };
    match server.add_level(copy) {
        Ok(_) => CommandResult::ok(format!("Level {src} copied to {dest}")),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

fn cmd_goto(server: &Server, ctx: &Ctx<'_>) -> CommandResult {
    let [name] = ctx.args.as_slice() else {
        return CommandResult::usage("goto", "<level>");
    };
    let player = try_cmd!(ctx.player());
    let level = try_cmd!(find_level(server, name));
    if player.is_on(&level) {
        return CommandResult::err(format!("You are already on {name}"));
    }
    match server.teleport_level(&player, &level) {
        Ok(_) => CommandResult {
            broadcast: Some(format!("{} went to {name}", player.name())),
            ..CommandResult::silent()
        },
        Err(e) => CommandResult::err(e.to_string()),
    }
}

fn cmd_levels(server: &Server, _ctx: &Ctx<'_>) -> CommandResult {
    let main = server.main_level();
    let main_name = main.read().name().to_string();
    let names: Vec<String> = server
        .level_names()
        .into_iter()
        .map(|name| {
            if name == main_name {
                format!("{name} (main)")
            } else {
                name
            }
        })
        .collect();
    CommandResult::ok(format!("Loaded levels: {}", names.join(", ")))
}

fn cmd_list(server: &Server, _ctx: &Ctx<'_>) -> CommandResult {
    let players = server.players();
    let mut lines = vec![format!(
        "{} of {} players online:",
        players.len(),
        server.config().server.max_players
    )];
    for player in players {
        let level = player
            .level()
            .map(|l| l.read().name().to_string())
            .unwrap_or_else(|| "-".to_string());
        lines.push(format!("  {} ({level})", player.name()));
    }
    CommandResult {
        messages: lines,
        ..CommandResult::silent()
    }
}

fn cmd_load(server: &Server, ctx: &Ctx<'_>) -> CommandResult {
    let [name] = ctx.args.as_slice() else {
        return CommandResult::usage("load", "<level>");
    };
    try_cmd!(require_operator(ctx));
    match server.load_level(name) {
        Ok(level) => {
            let level = level.read();
            CommandResult::ok(format!(
                "Level {name} loaded ({}x{}x{})",
                level.width(),
                level.height(),
                level.length()
            ))
        }
        Err(e) => CommandResult::err(e.to_string()),
    }
}

fn cmd_main(server: &Server, ctx: &Ctx<'_>) -> CommandResult {
    match ctx.args.as_slice() {
        [] => {
            let main = server.main_level();
            let name = main.read().name().to_string();
            CommandResult::ok(format!("The main level is {name}"))
        }
        [name] => {
            try_cmd!(require_operator(ctx));
            match server.set_main_level(name) {
                Ok(_) => CommandResult::ok(format!("The main level is now {name}")),
                Err(e) => CommandResult::err(e.to_string()),
            }
        }
        _ => CommandResult::usage("main", "[level]"),
    }
}

fn cmd_newlvl(server: &Server, ctx: &Ctx<'_>) -> CommandResult {
    let [name, width, height, length, theme, extra @ ..] = ctx.args.as_slice() else {
        return CommandResult::usage("newlvl", "<name> <width> <height> <length> <theme> [args]");
    };
    try_cmd!(require_operator(ctx));
    if !is_valid_name(name, MAX_LEVEL_NAME) {
        return CommandResult::err(format!("Invalid level name: {name}"));
    }
    if server.level_exists(name) {
        return CommandResult::err(format!("Level {name} already exists"));
    }
    let width: usize = try_cmd!(parse_number(width));
    let height: usize = try_cmd!(parse_number(height));
    let length: usize = try_cmd!(parse_number(length));
    let max_volume = server.config().world.max_volume;
    let volume = width
        .checked_mul(height)
        .and_then(|v| v.checked_mul(length));
    if !volume.is_some_and(|v| v <= max_volume) {
        return CommandResult::err(format!("Levels may hold at most {max_volume} blocks"));
    }

    let extra: Vec<&str> = extra.iter().map(String::as_str).collect();
    let theme = match generator(theme, &extra) {
        Ok(theme) => theme,
        Err(e) => return CommandResult::err(e.to_string()),
    };
    let mut level = match Level::new(name, width, height, length) {
        Ok(level) => level,
        Err(e) => return CommandResult::err(e.to_string()),
    };
    theme.generate(&mut level);
    match server.add_level(level) {
        Ok(_) => CommandResult::ok(format!("Level {name} created ({width}x{height}x{length})")),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

fn cmd_save(server: &Server, ctx: &Ctx<'_>) -> CommandResult {
    let [target] = ctx.args.as_slice() else {
        return CommandResult::usage("save", "<level|all>");
    };
    try_cmd!(require_operator(ctx));
    if target.eq_ignore_ascii_case("all") {
        let saved = server.save_all();
        return CommandResult::ok(format!("Saved {saved} level(s)"));
    }
    let level = try_cmd!(find_level(server, target));
    match server.save_level(&level) {
        Ok(()) => CommandResult::ok(format!("Level {target} saved")),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

/// Without a player: move the level spawn to the sender. With one: bring
/// that player to the sender and make it their respawn point.
fn cmd_setspawn(server: &Server, ctx: &Ctx<'_>) -> CommandResult {
    try_cmd!(require_operator(ctx));
    let (player, level) = try_cmd!(own_level(ctx));
    match ctx.args.as_slice() {
        [] => {
            server.set_spawn(&level, player.location());
            player.set_spawn();
            CommandResult::ok("Spawn location set to your current location")
        }
        [name] => {
            let Some(target) = server.find_player(name) else {
                return CommandResult::err(format!("Player {name} is not online"));
            };
            if !target.is_on(&level) {
                return CommandResult::err(format!("{} is on a different level", target.name()));
            }
            target.teleport(player.location());
            target.set_spawn();
            CommandResult::ok(format!(
                "Spawn location of {} set to your current location",
                target.name()
            ))
        }
        _ => CommandResult::usage("setspawn", "[player]"),
    }
}

fn cmd_spawn(_server: &Server, ctx: &Ctx<'_>) -> CommandResult {
    if !ctx.args.is_empty() {
        return CommandResult::usage("spawn", "");
    }
    let (player, level) = try_cmd!(own_level(ctx));
    let spawn = level.read().spawn;
    player.teleport(spawn);
    CommandResult::silent()
}

fn cmd_unload(server: &Server, ctx: &Ctx<'_>) -> CommandResult {
    let [name] = ctx.args.as_slice() else {
        return CommandResult::usage("unload", "<level>");
    };
    try_cmd!(require_operator(ctx));
    match server.unload_level(name) {
        Ok(()) => CommandResult::ok(format!("Level {name} unloaded")),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

fn cmd_weather(server: &Server, ctx: &Ctx<'_>) -> CommandResult {
    let (level, arg) = match ctx.args.as_slice() {
        [arg] => (try_cmd!(own_level(ctx)).1, arg),
        [name, arg] => (try_cmd!(find_level(server, name)), arg),
        _ => return CommandResult::usage("weather", "[level] <sunny|raining|snowing>"),
    };
    try_cmd!(require_operator(ctx));
    let Some(weather) = parse_weather(arg) else {
        return CommandResult::err(format!("Unknown weather: {arg}"));
    };
    let name = level.read().name().to_string();
    if server.set_weather(&level, weather) {
        CommandResult::ok(format!("Weather on {name} set to {}", arg.to_ascii_lowercase()))
    } else {
        CommandResult::ok(format!("Weather on {name} is already {}", arg.to_ascii_lowercase()))
    }
}
