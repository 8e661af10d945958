//! Integration tests for registration, parsing and dispatch.

use outpost_command::{CommandError, CommandRegistry, Invocation, RegistryError, ResponseKind};

// =========================================================================
// Helpers
// =========================================================================

/// Records every handler call so tests can assert on side effects.
#[derive(Default)]
struct Calls {
    log: Vec<(String, Vec<String>)>,
}

type Registry = CommandRegistry<Calls, CommandError>;

fn record(
    name: &'static str,
) -> impl Fn(&mut Calls, Invocation<'_>) -> Result<(), CommandError> + Send + Sync + 'static {
    move |calls: &mut Calls, inv: Invocation<'_>| {
        calls.log.push((name.to_string(), inv.args.to_vec()));
        Ok(())
    }
}

fn server_registry() -> Registry {
    let mut r = Registry::new();
    r.register("help", "", "Displays this command list.", record("help")).unwrap();
    r.register("host", "<mapname> [mode] [password]", "Open the server.", record("host"))
        .unwrap();
    r.register("stop", "", "Stop hosting the server.", record("stop")).unwrap();
    r.register("ban", "<type-id/name/ip> <username/IP/ID...>", "Ban a person.", record("ban"))
        .unwrap();
    r.register("kick", "<username...>", "Kick a person by name.", record("kick")).unwrap();
    r
}

// =========================================================================
// Registration
// =========================================================================

#[test]
fn test_duplicate_registration_fails() {
    let mut r = server_registry();
    let err = r.register("host", "", "again", record("host")).unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateCommand(name) if name == "host"));
    assert_eq!(r.len(), 5);
}

#[test]
fn test_names_are_case_sensitive() {
    let mut r = server_registry();
    r.register("Host", "", "different command", record("Host")).unwrap();
    let mut calls = Calls::default();
    assert_eq!(r.dispatch(&mut calls, "HOST").kind, ResponseKind::UnknownCommand);
    assert!(r.dispatch(&mut calls, "Host").is_valid());
    assert_eq!(calls.log[0].0, "Host");
}

#[test]
fn test_commands_listed_in_registration_order() {
    let r = server_registry();
    let names: Vec<&str> = r.commands().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["help", "host", "stop", "ban", "kick"]);
    assert_eq!(r.commands()[1].params_text, "<mapname> [mode] [password]");
}

#[test]
fn test_help_handler_sees_all_commands() {
    let mut r = Registry::new();
    r.register("help", "", "Displays this command list.", |calls: &mut Calls, inv| {
        let lines = inv.commands.iter().map(|c| c.to_string()).collect();
        calls.log.push(("help".into(), lines));
        Ok(())
    })
    .unwrap();
    r.register("say", "<message...>", "Send a message to all players.", record("say"))
        .unwrap();

    let mut calls = Calls::default();
    r.dispatch(&mut calls, "help");
    assert_eq!(
        calls.log[0].1,
        vec![
            "help - Displays this command list.".to_string(),
            "say <message...> - Send a message to all players.".to_string(),
        ]
    );
}

// =========================================================================
// Tokenizing
// =========================================================================

#[test]
fn test_whitespace_variants_resolve_to_same_command() {
    let r = server_registry();
    for line in ["stop", "  stop", "stop  ", "\tstop\t", "   stop   "] {
        let mut calls = Calls::default();
        let resp = r.dispatch(&mut calls, line);
        assert!(resp.is_valid(), "line {line:?}");
        assert_eq!(resp.run_command, "stop");
        assert_eq!(calls.log.len(), 1);
    }

    for line in ["host testmap survival", "  host   testmap\tsurvival  "] {
        let mut calls = Calls::default();
        r.dispatch(&mut calls, line);
        assert_eq!(calls.log[0].1, vec!["testmap", "survival"], "line {line:?}");
    }
}

#[test]
fn test_last_greedy_parameter_takes_rest() {
    let r = server_registry();
    let mut calls = Calls::default();
    r.dispatch(&mut calls, "ban name Some  Player Name");
    assert_eq!(calls.log[0].1, vec!["name", "Some  Player Name"]);

    r.dispatch(&mut calls, "kick [red]the king");
    assert_eq!(calls.log[1].1, vec!["[red]the king"]);
}

#[test]
fn test_too_few_arguments_never_invokes_handler() {
    let r = server_registry();
    let mut calls = Calls::default();

    let resp = r.dispatch(&mut calls, "host");
    assert_eq!(resp.kind, ResponseKind::FewArguments);
    assert_eq!(resp.command.unwrap().usage(), "host <mapname> [mode] [password]");

    let resp = r.dispatch(&mut calls, "ban id");
    assert_eq!(resp.kind, ResponseKind::FewArguments);
    assert!(calls.log.is_empty());
}

#[test]
fn test_too_many_arguments() {
    let r = server_registry();
    let mut calls = Calls::default();
    assert_eq!(r.dispatch(&mut calls, "stop now").kind, ResponseKind::ManyArguments);
    assert_eq!(
        r.dispatch(&mut calls, "host a b c d").kind,
        ResponseKind::ManyArguments
    );
    assert!(calls.log.is_empty());
}

// =========================================================================
// Unknown commands and suggestions
// =========================================================================

#[test]
fn test_unknown_command_reports_raw_token() {
    let r = server_registry();
    let mut calls = Calls::default();
    let resp = r.dispatch(&mut calls, "nonexistent with args");
    assert_eq!(resp.kind, ResponseKind::UnknownCommand);
    assert_eq!(resp.run_command, "nonexistent");
    assert!(resp.command.is_none());
}

#[test]
fn test_suggestion_within_distance_two() {
    let mut r = server_registry();
    r.register("nonexistant", "", "near miss", record("x")).unwrap();
    assert_eq!(r.suggest("nonexistent").unwrap().name, "nonexistant");
    assert_eq!(r.suggest("hots").unwrap().name, "host");
}

#[test]
fn test_no_suggestion_at_distance_three() {
    let mut r = Registry::new();
    r.register("existent", "", "three edits away", record("x")).unwrap();
    assert!(r.suggest("nonexistent").is_none());
}

#[test]
fn test_suggestion_ties_go_to_first_registered() {
    let mut r = Registry::new();
    r.register("ban", "", "", record("ban")).unwrap();
    r.register("bad", "", "", record("bad")).unwrap();
    // "bat" is one edit from both.
    assert_eq!(r.suggest("bat").unwrap().name, "ban");
}

#[test]
fn test_closer_match_beats_earlier_registration() {
    let mut r = Registry::new();
    r.register("stat", "", "", record("stat")).unwrap();
    r.register("status", "", "", record("status")).unwrap();
    // "statuz" is two edits from "stat" but one from "status".
    assert_eq!(r.suggest("statuz").unwrap().name, "status");
}

// =========================================================================
// Handler failures
// =========================================================================

#[test]
fn test_handler_error_is_contained() {
    let mut r = Registry::new();
    r.register("fail", "", "", |_: &mut Calls, _| {
        Err(CommandError::Invalid("No map with name 'x' found.".into()))
    })
    .unwrap();
    let mut calls = Calls::default();
    let resp = r.dispatch(&mut calls, "fail");
    assert!(resp.is_valid());
    assert_eq!(resp.error.as_deref(), Some("No map with name 'x' found."));
}

#[test]
fn test_handler_panic_is_contained() {
    let mut r = Registry::new();
    r.register("crash", "", "", |_: &mut Calls, _| -> Result<(), CommandError> {
        panic!("handler exploded")
    })
    .unwrap();
    r.register("ok", "", "", record("ok")).unwrap();

    let mut calls = Calls::default();
    let resp = r.dispatch(&mut calls, "crash");
    assert_eq!(resp.error.as_deref(), Some("handler exploded"));

    // The registry keeps working afterwards.
    assert!(r.dispatch(&mut calls, "ok").is_valid());
    assert_eq!(calls.log.len(), 1);
}
