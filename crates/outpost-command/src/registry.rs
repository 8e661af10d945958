//! The command registry: registration, tokenizing and dispatch.

use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crate::{CommandInfo, Invocation, Param, RegistryError, SUGGESTION_THRESHOLD, levenshtein};

/// A command handler: mutates the context `C`, fails with `E`.
pub type Handler<C, E> = Box<dyn Fn(&mut C, Invocation<'_>) -> Result<(), E> + Send + Sync>;

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// How a line was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// The handler ran (it may still have reported an error).
    Valid,
    /// The line was blank. Nothing ran.
    Empty,
    /// No command with this name.
    UnknownCommand,
    /// Fewer arguments than required parameters. The handler did not run.
    FewArguments,
    /// More arguments than declared parameters. The handler did not run.
    ManyArguments,
}

/// The result of dispatching one line.
#[derive(Debug, Clone)]
pub struct Response {
    pub kind: ResponseKind,
    /// The matched command, for usage text on arity errors.
    pub command: Option<CommandInfo>,
    /// The first token of the line, as typed.
    pub run_command: String,
    /// The handler's error or panic message, when a `Valid` call failed.
    pub error: Option<String>,
}

impl Response {
    fn new(kind: ResponseKind, run_command: &str, command: Option<&CommandInfo>) -> Self {
        Self {
            kind,
            command: command.cloned(),
            run_command: run_command.to_string(),
            error: None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.kind == ResponseKind::Valid
    }
}

// ---------------------------------------------------------------------------
// CommandRegistry
// ---------------------------------------------------------------------------

/// Holds every command the server understands.
///
/// Append-only: commands are registered at startup (built-ins first, then
/// plugins through the same [`register`](Self::register) call) and never
/// removed. Lookup is an exact, case-sensitive match on the name.
pub struct CommandRegistry<C, E> {
    infos: Vec<CommandInfo>,
    handlers: Vec<Handler<C, E>>,
    index: HashMap<String, usize>,
}

impl<C, E: fmt::Display> CommandRegistry<C, E> {
    pub fn new() -> Self {
        Self {
            infos: Vec::new(),
            handlers: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Registers a command.
    ///
    /// # Errors
    /// [`RegistryError::DuplicateCommand`] if the name is taken,
    /// [`RegistryError::InvalidParams`] if `params` does not parse.
    pub fn register<F>(
        &mut self,
        name: &str,
        params: &str,
        description: &str,
        handler: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(&mut C, Invocation<'_>) -> Result<(), E> + Send + Sync + 'static,
    {
        if self.index.contains_key(name) {
            return Err(RegistryError::DuplicateCommand(name.to_string()));
        }
        let parsed = Param::parse_spec(name, params)?;

        self.index.insert(name.to_string(), self.infos.len());
        self.infos.push(CommandInfo {
            name: name.to_string(),
            params_text: params.to_string(),
            params: parsed,
            description: description.to_string(),
        });
        self.handlers.push(Box::new(handler));
        tracing::trace!(command = name, "command registered");
        Ok(())
    }

    /// All commands in registration order.
    pub fn commands(&self) -> &[CommandInfo] {
        &self.infos
    }

    pub fn get(&self, name: &str) -> Option<&CommandInfo> {
        self.index.get(name).map(|&i| &self.infos[i])
    }

    pub fn len(&self) -> usize {
        self.infos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    /// The closest registered name within the suggestion threshold.
    ///
    /// Ties resolve to the command registered first.
    pub fn suggest(&self, token: &str) -> Option<&CommandInfo> {
        let mut best: Option<(usize, &CommandInfo)> = None;
        for info in &self.infos {
            let distance = levenshtein(&info.name, token);
            if distance < SUGGESTION_THRESHOLD
                && best.is_none_or(|(min, _)| distance < min)
            {
                best = Some((distance, info));
            }
        }
        best.map(|(_, info)| info)
    }

    /// Resolves a line against the registry without running anything.
    ///
    /// Returns the response kind and, for `Valid`, the parsed arguments.
    pub fn parse(&self, line: &str) -> (Response, Vec<String>) {
        let line = line.trim();
        if line.is_empty() {
            return (Response::new(ResponseKind::Empty, "", None), Vec::new());
        }

        let (name, rest) = split_token(line);
        let Some(&idx) = self.index.get(name) else {
            return (Response::new(ResponseKind::UnknownCommand, name, None), Vec::new());
        };
        let info = &self.infos[idx];

        let mut args = Vec::with_capacity(info.params.len());
        let mut rest = rest;
        for param in &info.params {
            if rest.is_empty() {
                break;
            }
            if param.greedy {
                args.push(rest.to_string());
                rest = "";
                break;
            }
            let (token, remainder) = split_token(rest);
            args.push(token.to_string());
            rest = remainder;
        }

        let kind = if !rest.is_empty() {
            ResponseKind::ManyArguments
        } else if args.len() < info.required_params() {
            ResponseKind::FewArguments
        } else {
            ResponseKind::Valid
        };
        (Response::new(kind, name, Some(info)), args)
    }

    /// Parses a line and, when it is valid, runs the handler on `ctx`.
    ///
    /// A handler error is logged at error level and recorded in
    /// [`Response::error`]. A panicking handler is caught the same way, so
    /// one broken command cannot take down the caller's loop.
    pub fn dispatch(&self, ctx: &mut C, line: &str) -> Response {
        let (mut response, args) = self.parse(line);
        if response.kind != ResponseKind::Valid {
            return response;
        }
        let Some(&idx) = self.index.get(response.run_command.as_str()) else {
            return response;
        };

        let invocation = Invocation {
            args: &args,
            commands: &self.infos,
        };
        let handler = &self.handlers[idx];
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler(ctx, invocation)));

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::error!("{e}");
                response.error = Some(e.to_string());
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(
                    command = %response.run_command,
                    "Command handler crashed: {message}"
                );
                response.error = Some(message);
            }
        }
        response
    }
}

impl<C, E: fmt::Display> Default for CommandRegistry<C, E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Splits off the first whitespace-delimited token; the remainder is left-trimmed.
fn split_token(s: &str) -> (&str, &str) {
    match s.find(char::is_whitespace) {
        Some(pos) => (&s[..pos], s[pos..].trim_start()),
        None => (s, ""),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CommandError;

    type Registry = CommandRegistry<Vec<String>, CommandError>;

    fn registry() -> Registry {
        let mut r = Registry::new();
        r.register("say", "<message...>", "Broadcast.", |log, inv| {
            log.push(format!("say:{}", inv.args[0]));
            Ok(())
        })
        .unwrap();
        r.register("port", "[port]", "Port.", |log, inv| {
            log.push(format!("port:{:?}", inv.arg(0)));
            Ok(())
        })
        .unwrap();
        r
    }

    #[test]
    fn test_split_token() {
        assert_eq!(split_token("host  map  mode"), ("host", "map  mode"));
        assert_eq!(split_token("help"), ("help", ""));
    }

    #[test]
    fn test_greedy_keeps_inner_spacing() {
        let r = registry();
        let mut log = Vec::new();
        let resp = r.dispatch(&mut log, "say   hello   there  world  ");
        assert!(resp.is_valid());
        assert_eq!(log, vec!["say:hello   there  world"]);
    }

    #[test]
    fn test_optional_param_absent() {
        let r = registry();
        let mut log = Vec::new();
        assert!(r.dispatch(&mut log, "port").is_valid());
        assert_eq!(log, vec!["port:None"]);
    }

    #[test]
    fn test_too_many_for_optional() {
        let r = registry();
        let mut log = Vec::new();
        let resp = r.dispatch(&mut log, "port 1 2");
        assert_eq!(resp.kind, ResponseKind::ManyArguments);
        assert!(log.is_empty());
    }

    #[test]
    fn test_blank_line_is_empty() {
        let r = registry();
        let mut log = Vec::new();
        assert_eq!(r.dispatch(&mut log, "   ").kind, ResponseKind::Empty);
    }

    #[test]
    fn test_panic_message_extraction() {
        let boxed: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(boxed.as_ref()), "bang");
        let boxed: Box<dyn std::any::Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic");
    }
}
