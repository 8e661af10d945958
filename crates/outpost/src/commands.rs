//! Built-in server commands.
//!
//! Every handler reports through `tracing`: `info!` for results, and a
//! returned error for anything the operator got wrong. The registry logs
//! returned errors at error level, so handlers never log their own
//! failures.

use std::path::Path;

use outpost_admin::KickReason;
use outpost_command::{Invocation, RegistryError};
use outpost_input::COMMAND_SOCKET_PORT;
use outpost_round::{Difficulty, NetHost, PlayerId, World};
use tracing::info;

use crate::{OutpostError, Registry, ServerState};

type CommandResult = Result<(), OutpostError>;

/// Registers the built-in commands, in the order `help` lists them.
pub fn register_builtin(registry: &mut Registry) -> Result<(), RegistryError> {
    registry.register("help", "", "Displays this command list.", help)?;
    registry.register("version", "", "Displays server version info.", version)?;
    registry.register("exit", "", "Exit the server application.", exit)?;
    registry.register("stop", "", "Stop hosting the server.", stop)?;
    registry.register(
        "host",
        "<mapname> [mode] [password]",
        "Open the server with a specific map and mode, survival if not given.",
        host,
    )?;
    registry.register("port", "[port]", "Sets or displays the port for hosting the server.", port)?;
    registry.register("maps", "", "Display all available maps.", maps)?;
    registry.register("reloadmaps", "", "Reload all maps from disk.", reload_maps)?;
    registry.register("status", "", "Display server status.", status)?;
    registry.register("plugins", "", "Display all loaded plugins.", plugins)?;
    registry.register("plugin", "<name...>", "Display information about a loaded plugin.", plugin)?;
    registry.register("say", "<message...>", "Send a message to all players.", say)?;
    registry.register("difficulty", "<difficulty>", "Set game difficulty.", difficulty)?;
    registry.register("name", "[name...]", "Change the server display name.", name)?;
    registry.register("playerlimit", "[off/somenumber]", "Set the server player limit.", player_limit)?;
    registry.register("whitelist", "[on/off...]", "Enable/disable whitelisting.", whitelist)?;
    registry.register("whitelisted", "", "List the entire whitelist.", whitelisted)?;
    registry.register("whitelist-add", "<ID>", "Add a player to the whitelist by ID.", whitelist_add)?;
    registry.register(
        "whitelist-remove",
        "<ID>",
        "Remove a player from the whitelist by ID.",
        whitelist_remove,
    )?;
    registry.register("crashreport", "<on/off>", "Disables or enables automatic crash reporting.", crash_report)?;
    registry.register("logging", "<on/off>", "Disables or enables server logs.", logging)?;
    registry.register("strict", "<on/off>", "Disables or enables strict mode.", strict)?;
    registry.register(
        "socketinput",
        "[on/off]",
        &format!(
            "Disables or enables a local TCP socket at port {COMMAND_SOCKET_PORT} to receive commands from other applications."
        ),
        socket_input,
    )?;
    registry.register(
        "allow-custom-clients",
        "[on/off]",
        "Allow or disallow custom clients.",
        custom_clients,
    )?;
    registry.register("shuffle", "<on/off>", "Set map shuffling.", shuffle)?;
    registry.register("kick", "<username...>", "Kick a person by name.", kick)?;
    registry.register(
        "ban",
        "<type-id/name/ip> <username/IP/ID...>",
        "Ban a person.",
        ban,
    )?;
    registry.register("bans", "", "List all banned IPs and IDs.", bans)?;
    registry.register("unban", "<ip/ID>", "Completely unban a person by IP or ID.", unban)?;
    registry.register("admin", "<username...>", "Make an online user admin.", admin)?;
    registry.register("unadmin", "<username...>", "Removes admin status from an online player.", unadmin)?;
    registry.register("admins", "", "List all admins.", admins)?;
    registry.register("runwave", "", "Trigger the next wave.", run_wave)?;
    registry.register("load", "<slot>", "Load a save from a slot.", load)?;
    registry.register("save", "<slot>", "Save game state to a slot.", save)?;
    registry.register("gameover", "", "Force a game over.", game_over)?;
    registry.register(
        "info",
        "<IP/UUID/name...>",
        "Find player info(s). Matches all names and IPs a player has used.",
        player_info,
    )?;
    Ok(())
}

fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}

fn is_on(arg: &str) -> bool {
    arg.eq_ignore_ascii_case("on")
}

fn display_path(path: &Path) -> String {
    std::path::absolute(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

fn help(_state: &mut ServerState, inv: Invocation<'_>) -> CommandResult {
    info!("Commands:");
    for command in inv.commands {
        info!("   {command}");
    }
    Ok(())
}

fn version(_state: &mut ServerState, _inv: Invocation<'_>) -> CommandResult {
    info!("Version: Outpost {}", env!("CARGO_PKG_VERSION"));
    Ok(())
}

fn exit(state: &mut ServerState, _inv: Invocation<'_>) -> CommandResult {
    info!("Shutting down server.");
    state.round.net_mut().close();
    state.request_exit();
    Ok(())
}

fn stop(state: &mut ServerState, _inv: Invocation<'_>) -> CommandResult {
    state.round.stop();
    Ok(())
}

fn host(state: &mut ServerState, inv: Invocation<'_>) -> CommandResult {
    let map = inv.arg(0).unwrap_or_default();
    state.round.host(map, inv.arg(1), state.settings.port)?;
    if inv.len() > 1 {
        state.settings.password = inv.arg(2).unwrap_or_default().to_string();
        state.persist()?;
    }
    Ok(())
}

fn port(state: &mut ServerState, inv: Invocation<'_>) -> CommandResult {
    let Some(arg) = inv.arg(0) else {
        info!("Port: {}", state.settings.port);
        return Ok(());
    };
    let port: u16 = arg
        .parse()
        .map_err(|_| OutpostError::user("Port must be a number between 0 and 65535."))?;
    state.settings.port = port;
    state.persist()?;
    info!("Port set to {port}.");
    Ok(())
}

fn status(state: &mut ServerState, _inv: Invocation<'_>) -> CommandResult {
    let round = &state.round;
    let Some(map) = round.state().map.as_ref().filter(|_| round.is_playing()) else {
        info!("Status: server closed");
        return Ok(());
    };

    info!("Status:");
    info!("  Playing on map {} / Wave {}", capitalize(&map.name), round.world().wave());
    if round.state().rules.wave_timer {
        info!("  {} seconds until next wave.", round.world().wave_countdown().as_secs());
    } else {
        info!("  {} enemies.", round.world().enemies());
    }

    let roster = round.net().roster();
    if roster.is_empty() {
        info!("  No players connected.");
    } else {
        info!("  Players: {}", roster.len());
        for player in roster.iter() {
            info!("    {} / {}", player.name, player.uuid);
        }
    }
    Ok(())
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn name(state: &mut ServerState, inv: Invocation<'_>) -> CommandResult {
    match inv.arg(0) {
        None => info!("Server name is currently '{}'.", state.settings.name),
        Some(name) => {
            state.settings.name = name.to_string();
            state.persist()?;
            info!("Server name is now '{name}'.");
        }
    }
    Ok(())
}

fn crash_report(state: &mut ServerState, inv: Invocation<'_>) -> CommandResult {
    let value = is_on(inv.arg(0).unwrap_or_default());
    state.settings.crashreport = value;
    state.persist()?;
    info!("Crash reporting is now {}.", on_off(value));
    Ok(())
}

fn logging(state: &mut ServerState, inv: Invocation<'_>) -> CommandResult {
    let value = is_on(inv.arg(0).unwrap_or_default());
    state.set_logging(value);
    state.persist()?;
    info!("Logging is now {}.", on_off(value));
    Ok(())
}

fn socket_input(state: &mut ServerState, inv: Invocation<'_>) -> CommandResult {
    let Some(arg) = inv.arg(0) else {
        info!("Socket input is currently {}.", on_off(state.socket.is_enabled()));
        return Ok(());
    };
    let value = is_on(arg);
    if value {
        state.enable_socket()?;
    } else {
        state.socket.disable();
    }
    state.settings.socket = value;
    state.persist()?;
    info!("Socket input is now {}.", on_off(value));
    Ok(())
}

fn shuffle(state: &mut ServerState, inv: Invocation<'_>) -> CommandResult {
    let arg = inv.arg(0).unwrap_or_default();
    state.settings.shuffle = match arg {
        "on" => true,
        "off" => false,
        _ => return Err(OutpostError::user("Invalid shuffle mode.")),
    };
    state.persist()?;
    info!("Shuffle mode set to '{arg}'.");
    Ok(())
}

// ---------------------------------------------------------------------------
// Maps and plugins
// ---------------------------------------------------------------------------

fn maps(state: &mut ServerState, _inv: Invocation<'_>) -> CommandResult {
    let registry = state.round.maps();
    if registry.is_empty() {
        info!("No maps found.");
    } else {
        info!("Maps:");
        for map in registry.all() {
            let kind = if map.custom { "Custom" } else { "Default" };
            info!("  {}: {kind} / {}x{}", map.name, map.width, map.height);
        }
    }
    info!("Map directory: {}", display_path(registry.directory()));
    Ok(())
}

fn reload_maps(state: &mut ServerState, _inv: Invocation<'_>) -> CommandResult {
    let found = state.round.maps_mut().reload();
    if found > 0 {
        info!("{found} new map(s) found and reloaded.");
    } else {
        info!("Maps reloaded.");
    }
    Ok(())
}

fn plugins(state: &mut ServerState, _inv: Invocation<'_>) -> CommandResult {
    if state.plugins.is_empty() {
        info!("No plugins found.");
    } else {
        info!("Plugins:");
        for meta in &state.plugins {
            info!("  {} {}", meta.name, meta.version);
        }
    }
    info!("Plugin directory: {}", display_path(&state.paths.plugins));
    Ok(())
}

fn plugin(state: &mut ServerState, inv: Invocation<'_>) -> CommandResult {
    let query = inv.arg(0).unwrap_or_default();
    match state.plugins.iter().find(|m| m.name.eq_ignore_ascii_case(query)) {
        Some(meta) => {
            info!("Name: {}", meta.name);
            info!("Version: {}", meta.version);
            info!("Author: {}", meta.author);
            info!("Description: {}", meta.description);
        }
        None => info!("No plugin with name '{query}' found."),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Round
// ---------------------------------------------------------------------------

fn say(state: &mut ServerState, inv: Invocation<'_>) -> CommandResult {
    if !state.round.is_playing() {
        return Err(outpost_round::RoundError::NotHosting.into());
    }
    let message = inv.arg(0).unwrap_or_default();
    state.round.net_mut().broadcast(&format!("[scarlet][[Server]:[] {message}"));
    info!("Server: {message}");
    Ok(())
}

fn difficulty(state: &mut ServerState, inv: Invocation<'_>) -> CommandResult {
    let arg = inv.arg(0).unwrap_or_default();
    let difficulty: Difficulty = arg
        .parse()
        .map_err(|_| OutpostError::user(format!("No difficulty with name '{arg}' found.")))?;
    state.round.rules_mut().wave_spacing = difficulty.wave_spacing();
    info!("Difficulty set to '{arg}'.");
    Ok(())
}

fn run_wave(state: &mut ServerState, _inv: Invocation<'_>) -> CommandResult {
    state.round.run_wave()?;
    Ok(())
}

fn load(state: &mut ServerState, inv: Invocation<'_>) -> CommandResult {
    let slot = inv.arg(0).unwrap_or_default();
    state.round.load(slot, state.settings.port)?;
    Ok(())
}

fn save(state: &mut ServerState, inv: Invocation<'_>) -> CommandResult {
    state.round.save(inv.arg(0).unwrap_or_default())?;
    Ok(())
}

fn game_over(state: &mut ServerState, _inv: Invocation<'_>) -> CommandResult {
    state.round.force_game_over(state.settings.shuffle);
    Ok(())
}

// ---------------------------------------------------------------------------
// Administration
// ---------------------------------------------------------------------------

fn player_limit(state: &mut ServerState, inv: Invocation<'_>) -> CommandResult {
    let admin = &mut state.settings.admin;
    match inv.arg(0) {
        None => match admin.player_limit() {
            Some(limit) => info!("Player limit is currently {limit}."),
            None => info!("Player limit is currently off."),
        },
        Some("off") => {
            admin.set_player_limit(None);
            state.persist()?;
            info!("Player limit disabled.");
        }
        Some(arg) => {
            let limit = arg
                .parse::<u32>()
                .ok()
                .filter(|&n| n > 0)
                .ok_or_else(|| OutpostError::user("Limit must be a number above 0."))?;
            admin.set_player_limit(Some(limit));
            state.persist()?;
            info!("Player limit is now {limit}.");
        }
    }
    Ok(())
}

fn whitelist(state: &mut ServerState, inv: Invocation<'_>) -> CommandResult {
    match inv.arg(0) {
        None => info!("Whitelist is currently {}.", on_off(state.settings.admin.whitelist_enabled())),
        Some(arg) => {
            let value = is_on(arg);
            state.settings.admin.set_whitelist_enabled(value);
            state.persist()?;
            info!("Whitelist is now {}.", on_off(value));
        }
    }
    Ok(())
}

fn whitelisted(state: &mut ServerState, _inv: Invocation<'_>) -> CommandResult {
    let players = state.settings.admin.whitelisted();
    if players.is_empty() {
        info!("No whitelisted players found.");
        return Ok(());
    }
    info!("Whitelist:");
    for player in players {
        info!("- {}", player.last_name);
    }
    Ok(())
}

fn whitelist_add(state: &mut ServerState, inv: Invocation<'_>) -> CommandResult {
    let name = state.settings.admin.whitelist(inv.arg(0).unwrap_or_default())?.last_name.clone();
    state.persist()?;
    info!("Player '{name}' has been whitelisted.");
    Ok(())
}

fn whitelist_remove(state: &mut ServerState, inv: Invocation<'_>) -> CommandResult {
    let name = state.settings.admin.unwhitelist(inv.arg(0).unwrap_or_default())?.last_name.clone();
    state.persist()?;
    info!("Player '{name}' has been un-whitelisted.");
    Ok(())
}

fn strict(state: &mut ServerState, inv: Invocation<'_>) -> CommandResult {
    let value = is_on(inv.arg(0).unwrap_or_default());
    state.settings.admin.set_strict(value);
    state.persist()?;
    info!("Strict mode is now {}.", on_off(value));
    Ok(())
}

fn custom_clients(state: &mut ServerState, inv: Invocation<'_>) -> CommandResult {
    let Some(arg) = inv.arg(0) else {
        let allowed = state.settings.admin.allows_custom_clients();
        info!("Custom clients are currently {}.", if allowed { "allowed" } else { "disallowed" });
        return Ok(());
    };
    let value = if arg.eq_ignore_ascii_case("on") {
        true
    } else if arg.eq_ignore_ascii_case("off") {
        false
    } else {
        return Err(OutpostError::user("Incorrect command usage."));
    };
    state.settings.admin.set_custom_clients(value);
    state.persist()?;
    info!("Custom clients {}.", if value { "enabled" } else { "disabled" });
    Ok(())
}

fn kick(state: &mut ServerState, inv: Invocation<'_>) -> CommandResult {
    if !state.round.is_playing() {
        return Err(OutpostError::user("Not hosting a game yet. Calm down."));
    }
    let name = inv.arg(0).unwrap_or_default();
    let Some((id, uuid)) = state
        .round
        .net()
        .roster()
        .find_by_name(name)
        .map(|p| (p.id, p.uuid.clone()))
    else {
        info!("Nobody with that name could be found...");
        return Ok(());
    };

    let net = state.round.net_mut();
    net.broadcast(&format!("[scarlet]{name}[scarlet] has been kicked by the server."));
    net.kick(id, KickReason::Kick);
    state.settings.admin.record_kick(&uuid);
    state.persist()?;
    info!("It is done.");
    Ok(())
}

fn ban(state: &mut ServerState, inv: Invocation<'_>) -> CommandResult {
    let target = inv.arg(1).unwrap_or_default();
    match inv.arg(0).unwrap_or_default() {
        "id" => {
            state.settings.admin.ban_id(target);
        }
        "name" => {
            let uuid = state
                .round
                .net()
                .roster()
                .find_by_name_ignore_case(target)
                .map(|p| p.uuid.clone())
                .ok_or_else(|| OutpostError::user("No matches found."))?;
            state.settings.admin.ban_id(&uuid);
        }
        "ip" => {
            state.settings.admin.ban_ip(target);
        }
        _ => return Err(OutpostError::user("Invalid type.")),
    }
    state.persist()?;
    info!("Banned.");

    let admin = &state.settings.admin;
    let banned: Vec<(PlayerId, String)> = state
        .round
        .net()
        .roster()
        .iter()
        .filter(|p| admin.is_id_banned(&p.uuid) || admin.is_ip_banned(&p.ip))
        .map(|p| (p.id, p.name.clone()))
        .collect();
    let net = state.round.net_mut();
    for (id, name) in banned {
        net.broadcast(&format!("[scarlet] {name} has been banned."));
        net.kick(id, KickReason::Banned);
    }
    Ok(())
}

fn bans(state: &mut ServerState, _inv: Invocation<'_>) -> CommandResult {
    let admin = &state.settings.admin;

    let banned = admin.banned();
    if banned.is_empty() {
        info!("No ID-banned players have been found.");
    } else {
        info!("Banned players [ID]:");
        for player in banned {
            info!(" {} / Last known name: '{}'", player.id, player.last_name);
        }
    }

    let ips = admin.banned_ips();
    if ips.is_empty() {
        info!("No IP-banned players have been found.");
    } else {
        info!("Banned players [IP]:");
        for ip in ips {
            match admin.find_by_ip(ip) {
                Some(player) => info!(
                    "  '{ip}' / Last known name: '{}' / ID: '{}'",
                    player.last_name, player.id
                ),
                None => info!("  '{ip}' (No known name or info)"),
            }
        }
    }
    Ok(())
}

fn unban(state: &mut ServerState, inv: Invocation<'_>) -> CommandResult {
    let target = inv.arg(0).unwrap_or_default();
    if target.contains('.') {
        state.settings.admin.unban_ip(target)?;
        info!("Unbanned player by IP: {target}.");
    } else {
        state.settings.admin.unban_id(target)?;
        info!("Unbanned player by ID: {target}.");
    }
    state.persist()?;
    Ok(())
}

fn admin(state: &mut ServerState, inv: Invocation<'_>) -> CommandResult {
    set_admin(state, inv.arg(0).unwrap_or_default(), true)
}

fn unadmin(state: &mut ServerState, inv: Invocation<'_>) -> CommandResult {
    set_admin(state, inv.arg(0).unwrap_or_default(), false)
}

fn set_admin(state: &mut ServerState, name: &str, admin: bool) -> CommandResult {
    if !state.round.is_playing() {
        return Err(OutpostError::user("Open the server first."));
    }
    let Some(player) = state.round.net_mut().roster_mut().iter_mut().find(|p| p.name == name) else {
        info!("Nobody with that name could be found.");
        return Ok(());
    };
    player.admin = admin;
    let uuid = player.uuid.clone();
    state.settings.admin.set_admin(&uuid, admin);
    state.persist()?;
    if admin {
        info!("Admin-ed player: {name}");
    } else {
        info!("Un-admin-ed player: {name}");
    }
    Ok(())
}

fn admins(state: &mut ServerState, _inv: Invocation<'_>) -> CommandResult {
    let admins = state.settings.admin.admins();
    if admins.is_empty() {
        info!("No admins have been found.");
        return Ok(());
    }
    info!("Admins:");
    for player in admins {
        info!(" {} /  ID: '{}' / IP: '{}'", player.last_name, player.id, player.last_ip);
    }
    Ok(())
}

fn player_info(state: &mut ServerState, inv: Invocation<'_>) -> CommandResult {
    let found = state.settings.admin.find(inv.arg(0).unwrap_or_default());
    if found.is_empty() {
        info!("Nobody with that name could be found.");
        return Ok(());
    }
    info!("Players found: {}", found.len());
    for (i, player) in found.iter().enumerate() {
        info!("[{i}] Trace info for player '{}' / UUID {}", player.last_name, player.id);
        info!("  all names used: [{}]", player.names.join(", "));
        info!("  IP: {}", player.last_ip);
        info!("  all IPs used: [{}]", player.ips.join(", "));
        info!("  times joined: {}", player.times_joined);
        info!("  times kicked: {}", player.times_kicked);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("craters"), "Craters");
        assert_eq!(capitalize("Ground Zero"), "Ground Zero");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_on_off() {
        assert!(is_on("ON"));
        assert!(!is_on("yes"));
        assert_eq!(on_off(true), "on");
    }

    #[test]
    fn test_builtins_register_once() {
        let mut registry = Registry::new();
        register_builtin(&mut registry).unwrap();
        assert_eq!(registry.commands()[0].name, "help");
        assert!(registry.get("allow-custom-clients").is_some());
        assert!(matches!(
            register_builtin(&mut registry),
            Err(RegistryError::DuplicateCommand(_))
        ));
    }
}
