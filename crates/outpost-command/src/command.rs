//! Command metadata and the parameter-spec parser.

use std::fmt;

use crate::RegistryError;

// ---------------------------------------------------------------------------
// Param
// ---------------------------------------------------------------------------

/// One declared parameter of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// The text between the brackets, without the `...` suffix.
    pub name: String,
    /// Declared with `[...]` rather than `<...>`.
    pub optional: bool,
    /// Declared with a trailing `...`: absorbs the rest of the line.
    pub greedy: bool,
}

impl Param {
    /// Parses a param spec like `<mapname> [mode] <message...>`.
    ///
    /// # Errors
    /// [`RegistryError::InvalidParams`] when a token is not bracketed, a
    /// greedy parameter is not last, or a required parameter follows an
    /// optional one.
    pub fn parse_spec(command: &str, spec: &str) -> Result<Vec<Param>, RegistryError> {
        let invalid = |reason: String| RegistryError::InvalidParams {
            name: command.to_string(),
            reason,
        };

        let tokens: Vec<&str> = spec.split_whitespace().collect();
        let mut params = Vec::with_capacity(tokens.len());

        for (i, token) in tokens.iter().enumerate() {
            let optional = match (token.chars().next(), token.chars().last()) {
                (Some('<'), Some('>')) => false,
                (Some('['), Some(']')) => true,
                _ => return Err(invalid(format!("malformed parameter '{token}'"))),
            };
            let inner = &token[1..token.len() - 1];
            let (name, greedy) = match inner.strip_suffix("...") {
                Some(name) => (name, true),
                None => (inner, false),
            };
            if name.is_empty() {
                return Err(invalid(format!("empty parameter name in '{token}'")));
            }
            if greedy && i != tokens.len() - 1 {
                return Err(invalid(format!("greedy parameter '{token}' must be last")));
            }
            if !optional && params.iter().any(|p: &Param| p.optional) {
                return Err(invalid(format!(
                    "required parameter '{token}' follows an optional one"
                )));
            }
            params.push(Param {
                name: name.to_string(),
                optional,
                greedy,
            });
        }

        Ok(params)
    }
}

// ---------------------------------------------------------------------------
// CommandInfo
// ---------------------------------------------------------------------------

/// Immutable description of a registered command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInfo {
    pub name: String,
    /// The parameter text exactly as registered, used in help and usage text.
    pub params_text: String,
    pub params: Vec<Param>,
    pub description: String,
}

impl CommandInfo {
    /// Number of parameters that must be present.
    pub fn required_params(&self) -> usize {
        self.params.iter().filter(|p| !p.optional).count()
    }

    /// `name params`, the usage line printed on arity errors.
    pub fn usage(&self) -> String {
        if self.params_text.is_empty() {
            self.name.clone()
        } else {
            format!("{} {}", self.name, self.params_text)
        }
    }
}

impl fmt::Display for CommandInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.usage(), self.description)
    }
}

// ---------------------------------------------------------------------------
// Invocation
// ---------------------------------------------------------------------------

/// What a handler receives besides its context.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    /// Parsed arguments, one per supplied parameter.
    pub args: &'a [String],
    /// All registered commands in registration order (for `help`).
    pub commands: &'a [CommandInfo],
}

impl<'a> Invocation<'a> {
    /// The argument at `index`, if it was supplied.
    pub fn arg(&self, index: usize) -> Option<&'a str> {
        self.args.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}
