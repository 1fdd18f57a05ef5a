//! Commands that change how a player is shown or what their client allows.

use std::sync::Arc;

use mcc_rs_command::args::parse_number;
use mcc_rs_command::{CommandRegistry, CommandResult};
use mcc_rs_proto::codec::fits_string;
use mcc_rs_proto::packets::{EntityPropertyType, HackControl, MakeSelection};
use mcc_rs_proto::types::{Aabb, BlockPos, Rgba};
use mcc_rs_world::block::{self, BlockId};

use super::{own_level, require_operator, try_cmd, Ctx};
use crate::server::Server;
use crate::session::Session;

/// SetClickDistance carries fixed-point shorts.
const MAX_CLICK_DISTANCE: f32 = 1023.0;

const SELECTION_COLOR: Rgba = Rgba::new(70, 180, 130, 128);

pub(super) fn register(registry: &mut CommandRegistry<Server, Arc<Session>>) {
    registry.register("deop", "<player>", "Revoke operator status", cmd_deop);
    registry.register(
        "deselect",
        "<id>",
        "Remove a selection outline",
        cmd_deselect,
    );
    registry.register(
        "fill",
        "<x1> <y1> <z1> <x2> <y2> <z2> <block>",
        "Fill a cuboid with one block",
        cmd_fill,
    );
    registry.register("hacks", "<on|off> [player]", "Allow or deny client hacks", cmd_hacks);
    registry.register("hold", "<block> [lock]", "Put a block in your hand", cmd_hold);
    registry.register("model", "<model> [player]", "Change a player model", cmd_model);
    registry.register("op", "<player>", "Grant operator status", cmd_op);
    registry.register("reach", "<distance> [player]", "Set reach distance", cmd_reach);
    registry.register("rotate", "<x|y|z> <degrees>", "Rotate your model", cmd_rotate);
    registry.register(
        "select",
        "<id> <x1> <y1> <z1> <x2> <y2> <z2> [label]",
        "Outline a cuboid",
        cmd_select,
    );
}

/// The sender, or the named player if the sender may act on others.
fn target(server: &Server, ctx: &Ctx<'_>, name: Option<&String>) -> Result<Arc<Session>, CommandResult> {
    match name {
        None => ctx.player(),
        Some(name) => {
            require_operator(ctx)?;
            server
                .find_player(name)
                .ok_or_else(|| CommandResult::err(format!("Player {name} is not online")))
        }
    }
}

fn set_operator(server: &Server, ctx: &Ctx<'_>, operator: bool) -> CommandResult {
    let [name] = ctx.args.as_slice() else {
        let command = if operator { "op" } else { "deop" };
        return CommandResult::usage(command, "<player>");
    };
    try_cmd!(require_operator(ctx));
    let Some(player) = server.find_player(name) else {
        return CommandResult::err(format!("Player {name} is not online"));
    };
    player.set_operator(operator);
    if operator {
        player.send_message("&eYou are now an operator");
        CommandResult::ok(format!("{} is now an operator", player.name()))
    } else {
        player.send_message("&eYou are no longer an operator");
        CommandResult::ok(format!("{} is no longer an operator", player.name()))
    }
}

fn cmd_op(server: &Server, ctx: &Ctx<'_>) -> CommandResult {
    set_operator(server, ctx, true)
}

fn cmd_deop(server: &Server, ctx: &Ctx<'_>) -> CommandResult {
    set_operator(server, ctx, false)
}

fn cmd_model(server: &Server, ctx: &Ctx<'_>) -> CommandResult {
    let (model, name) = match ctx.args.as_slice() {
        [model] => (model, None),
        [model, name] => (model, Some(name)),
        _ => return CommandResult::usage("model", "<model> [player]"),
    };
    if !fits_string(model) {
        return CommandResult::err("Model names are at most 64 characters");
    }
    let player = try_cmd!(target(server, ctx, name));
    server.set_model(&player, &model.to_ascii_lowercase());
    CommandResult::ok(format!("{} is now a {model}", player.name()))
}

fn cmd_reach(server: &Server, ctx: &Ctx<'_>) -> CommandResult {
    let (distance, name) = match ctx.args.as_slice() {
        [distance] => (distance, None),
        [distance, name] => (distance, Some(name)),
        _ => return CommandResult::usage("reach", "<distance> [player]"),
    };
    let distance: f32 = try_cmd!(parse_number(distance));
    if !(0.0..=MAX_CLICK_DISTANCE).contains(&distance) {
        return CommandResult::err(format!("Reach must be between 0 and {MAX_CLICK_DISTANCE}"));
    }
    let player = try_cmd!(target(server, ctx, name));
    player.set_click_distance(distance);
    CommandResult::ok(format!("Reach of {} set to {distance}", player.name()))
}

fn cmd_hold(_server: &Server, ctx: &Ctx<'_>) -> CommandResult {
    let (name, locked) = match ctx.args.as_slice() {
        [name] => (name, false),
        [name, lock] if lock.eq_ignore_ascii_case("lock") => (name, true),
        _ => return CommandResult::usage("hold", "<block> [lock]"),
    };
    let player = try_cmd!(ctx.player());
    let Some(block) = block::parse(name) else {
        return CommandResult::err(format!("Unknown block: {name}"));
    };
    player.set_held_block(block, locked);
    CommandResult::silent()
}

fn cmd_hacks(server: &Server, ctx: &Ctx<'_>) -> CommandResult {
    let (allow, name) = match ctx.args.as_slice() {
        [mode] => (mode, None),
        [mode, name] => (mode, Some(name)),
        _ => return CommandResult::usage("hacks", "<on|off> [player]"),
    };
    let allow = match allow.to_ascii_lowercase().as_str() {
        "on" => true,
        "off" => false,
        _ => return CommandResult::usage("hacks", "<on|off> [player]"),
    };
    try_cmd!(require_operator(ctx));
    let player = try_cmd!(target(server, ctx, name));
    let hacks = if allow {
        HackControl::default()
    } else {
        HackControl {
            flying: false,
            no_clip: false,
            speeding: false,
            spawn_control: false,
            third_person_view: false,
            jump_height: -1,
        }
    };
    player.set_hack_control(hacks);
    let state = if allow { "allowed" } else { "denied" };
    CommandResult::ok(format!("Hacks {state} for {}", player.name()))
}

fn cmd_rotate(server: &Server, ctx: &Ctx<'_>) -> CommandResult {
    let [axis, degrees] = ctx.args.as_slice() else {
        return CommandResult::usage("rotate", "<x|y|z> <degrees>");
    };
    let property = match axis.to_ascii_lowercase().as_str() {
        "x" => EntityPropertyType::RotationX,
        "y" => EntityPropertyType::RotationY,
        "z" => EntityPropertyType::RotationZ,
        _ => return CommandResult::usage("rotate", "<x|y|z> <degrees>"),
    };
    let degrees: i32 = try_cmd!(parse_number(degrees));
    let player = try_cmd!(ctx.player());
    server.set_entity_property(&player, property, degrees.rem_euclid(360));
    CommandResult::silent()
}

fn parse_corners(args: &[String]) -> Result<(BlockPos, BlockPos), CommandResult> {
    let mut coords = [0u16; 6];
    for (slot, arg) in coords.iter_mut().zip(args) {
        *slot = parse_number(arg)?;
    }
    let [x1, y1, z1, x2, y2, z2] = coords;
    Ok((
        BlockPos::new(x1.min(x2), y1.min(y2), z1.min(z2)),
        BlockPos::new(x1.max(x2), y1.max(y2), z1.max(z2)),
    ))
}

fn cmd_select(_server: &Server, ctx: &Ctx<'_>) -> CommandResult {
    let (id, corners, label) = match ctx.args.as_slice() {
        [id, corners @ ..] if corners.len() == 6 => (id, corners, "Selection"),
        [id, rest @ ..] if rest.len() == 7 => (id, &rest[..6], rest[6].as_str()),
        _ => return CommandResult::usage("select", "<id> <x1> <y1> <z1> <x2> <y2> <z2> [label]"),
    };
    if !fits_string(label) {
        return CommandResult::err("Selection labels are at most 64 characters");
    }
    let selection_id: u8 = try_cmd!(parse_number(id));
    let (min, max) = try_cmd!(parse_corners(corners));
    let player = try_cmd!(ctx.player());
    let shown = player.make_selection(&MakeSelection {
        selection_id,
        label: label.to_string(),
        bounds: Aabb { min, max },
        color: SELECTION_COLOR,
    });
    if shown {
        CommandResult::silent()
    } else {
        CommandResult::err("Your client cannot show selections")
    }
}

fn cmd_deselect(_server: &Server, ctx: &Ctx<'_>) -> CommandResult {
    let [id] = ctx.args.as_slice() else {
        return CommandResult::usage("deselect", "<id>");
    };
    let selection_id: u8 = try_cmd!(parse_number(id));
    let player = try_cmd!(ctx.player());
    player.remove_selection(selection_id);
    CommandResult::silent()
}

fn cmd_fill(server: &Server, ctx: &Ctx<'_>) -> CommandResult {
    let [corners @ .., block_name] = ctx.args.as_slice() else {
        return CommandResult::usage("fill", "<x1> <y1> <z1> <x2> <y2> <z2> <block>");
    };
    if corners.len() != 6 {
        return CommandResult::usage("fill", "<x1> <y1> <z1> <x2> <y2> <z2> <block>");
    }
    let (min, max) = try_cmd!(parse_corners(corners));
    let Some(block) = block::parse(block_name) else {
        return CommandResult::err(format!("Unknown block: {block_name}"));
    };
    try_cmd!(require_operator(ctx));
    let (_, level) = try_cmd!(own_level(ctx));

    let (width, height, length) = {
        let level = level.read();
        (level.width(), level.height(), level.length())
    };
    let mut changes: Vec<(usize, usize, usize, BlockId)> = Vec::new();
    for y in min.y as usize..=(max.y as usize).min(height.saturating_sub(1)) {
        for z in min.z as usize..=(max.z as usize).min(length.saturating_sub(1)) {
            for x in min.x as usize..=(max.x as usize).min(width.saturating_sub(1)) {
                changes.push((x, y, z, block));
            }
        }
    }
    let changed = server.set_blocks(&level, &changes);
    CommandResult::ok(format!("Filled {changed} block(s)"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Console;
    use crate::testing::{connect, drain, join, tags, test_server};
    use mcc_rs_command::CommandSender;
    use mcc_rs_proto::extensions::ExtensionSet;
    use mcc_rs_proto::packets::id;

    fn run(server: &Server, sender: &dyn CommandSender<Player = Arc<Session>>, line: &str) -> CommandResult {
        server.commands().dispatch(server, sender, line)
    }

    #[test]
    fn only_operators_grant_operator_status() {
        let server = test_server();
        let (a, mut ra) = connect(&server, "a", ExtensionSet::none());
        let (b, _rb) = connect(&server, "b", ExtensionSet::none());

        let refused = run(&server, a.as_ref(), "op a");
        assert_eq!(refused.messages[0], "You must be an operator to do that");
        assert!(!a.is_operator());

        assert!(run(&server, &Console, "op a").success);
        assert!(a.is_operator());
        assert_eq!(&drain(&mut ra)[0][..], &[id::SET_PERMISSION, 0x64]);

        assert!(run(&server, a.as_ref(), "op b").success);
        assert!(run(&server, a.as_ref(), "deop b").success);
        assert!(!b.is_operator());
        assert!(!run(&server, &Console, "op nobody").success);
        assert_eq!(run(&server, &Console, "deop").messages[0], "Usage: /deop <player>");
    }

    #[tokio::test]
    async fn model_change_reaches_capable_peers() {
        let server = test_server();
        let main = server.main_level();
        let (a, mut ra) = connect(&server, "a", ExtensionSet::all());
        let (b, mut rb) = connect(&server, "b", ExtensionSet::all());
        let (c, mut rc) = connect(&server, "c", ExtensionSet::none());
        for s in [&a, &b, &c] {
            join(&server, s, &main).await;
        }
        drain(&mut ra);
        drain(&mut rb);
        drain(&mut rc);

        assert!(run(&server, a.as_ref(), "model Chicken").success);
        assert_eq!(a.entity().model, "chicken");
        let own = drain(&mut ra);
        assert_eq!(own[0][0], id::CHANGE_MODEL);
        assert_eq!(own[0][1], 0xFF);
        let seen = drain(&mut rb);
        assert_eq!(seen[0][0], id::CHANGE_MODEL);
        assert_eq!(seen[0][1], a.entity_id());
        assert!(drain(&mut rc).is_empty());

        let refused = run(&server, b.as_ref(), "model pig a");
        assert!(!refused.success);
        assert!(!run(&server, a.as_ref(), &format!("model {}", "x".repeat(65))).success);
    }

    #[tokio::test]
    async fn newcomer_sees_existing_model_and_rotation() {
        let server = test_server();
        let main = server.main_level();
        let (a, _ra) = connect(&server, "a", ExtensionSet::all());
        join(&server, &a, &main).await;
        run(&server, a.as_ref(), "model sheep");
        run(&server, a.as_ref(), "rotate z 450");
        assert_eq!(a.entity().rotation, [0, 0, 90]);

        let (b, mut rb) = connect(&server, "b", ExtensionSet::all());
        join(&server, &b, &main).await;
        let frames = tags(&drain(&mut rb));
        assert!(frames.contains(&id::CHANGE_MODEL));
        assert!(frames.contains(&id::SET_ENTITY_PROPERTY));
    }

    #[test]
    fn reach_is_validated_and_gated() {
        let server = test_server();
        let (cpe, mut rcpe) = connect(&server, "cpe", ExtensionSet::all());
        let (plain, mut rplain) = connect(&server, "plain", ExtensionSet::none());

        assert!(!run(&server, cpe.as_ref(), "reach -1").success);
        assert!(!run(&server, cpe.as_ref(), "reach far").success);
        assert!(run(&server, cpe.as_ref(), "reach 8").success);
        assert_eq!(&drain(&mut rcpe)[0][..], &[id::SET_CLICK_DISTANCE, 1, 0]);

        assert!(run(&server, plain.as_ref(), "reach 8").success);
        assert!(drain(&mut rplain).is_empty());
    }

    #[test]
    fn hold_and_hacks() {
        let server = test_server();
        let (a, mut ra) = connect(&server, "a", ExtensionSet::all());

        assert!(run(&server, a.as_ref(), "hold stone lock").success);
        assert_eq!(a.held_block(), block::STONE);
        assert_eq!(&drain(&mut ra)[0][..], &[id::HOLD_THIS, block::STONE, 1]);
        assert!(!run(&server, a.as_ref(), "hold unobtainium").success);

        assert!(!run(&server, a.as_ref(), "hacks off").success);
        assert!(run(&server, &Console, "hacks off a").success);
        assert_eq!(
            &drain(&mut ra)[0][..],
            &[id::HACK_CONTROL, 0, 0, 0, 0, 0, 0xFF, 0xFF]
        );
    }

    #[test]
    fn selections_need_the_extension() {
        let server = test_server();
        let (cpe, mut rcpe) = connect(&server, "cpe", ExtensionSet::all());
        let (plain, _rplain) = connect(&server, "plain", ExtensionSet::none());

        assert!(run(&server, cpe.as_ref(), "select 1 0 0 0 4 4 4 Arena").success);
        assert!(run(&server, cpe.as_ref(), "deselect 1").success);
        assert_eq!(
            tags(&drain(&mut rcpe)),
            vec![id::MAKE_SELECTION, id::REMOVE_SELECTION]
        );

        let refused = run(&server, plain.as_ref(), "select 1 0 0 0 4 4 4");
        assert_eq!(refused.messages[0], "Your client cannot show selections");
        assert!(!run(&server, cpe.as_ref(), "select 1 0 0").success);
        drain(&mut rcpe);
        let long = format!("select 2 0 0 0 4 4 4 {}", "l".repeat(65));
        let refused = run(&server, cpe.as_ref(), &long);
        assert_eq!(refused.messages[0], "Selection labels are at most 64 characters");
        assert!(drain(&mut rcpe).is_empty());
    }

    #[tokio::test]
    async fn fill_clamps_to_level_and_batches() {
        let server = test_server();
        let main = server.main_level();
        let (a, mut ra) = connect(&server, "a", ExtensionSet::all());
        join(&server, &a, &main).await;
        drain(&mut ra);

        assert!(!run(&server, a.as_ref(), "fill 0 0 0 1 1 1 glass").success);
        a.set_operator(true);
        drain(&mut ra);

        let result = run(&server, a.as_ref(), "fill 20 12 20 0 12 0 glass");
        assert_eq!(result.messages[0], "Filled 256 block(s)");
        assert_eq!(main.read().get_block(15, 12, 15), block::GLASS);
        assert_eq!(tags(&drain(&mut ra)), vec![id::BULK_BLOCK_UPDATE]);
        assert!(!run(&server, &Console, "fill 0 0 0 1 1 1 glass").success);
    }
}
