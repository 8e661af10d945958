//! Command registry for Outpost.
//!
//! This crate defines the "language" an operator speaks to the server:
//!
//! - **Commands** ([`CommandInfo`], [`Param`]): a name, a parameter spec
//!   such as `<mapname> [mode] [password]`, and a description.
//! - **Registry** ([`CommandRegistry`]): holds commands in registration
//!   order and turns a raw line into a handler call.
//! - **Responses** ([`Response`], [`ResponseKind`]): what happened to a
//!   line: ran, unknown command, too few or too many arguments.
//! - **Suggestions** ([`levenshtein`]): the "did you mean" helper for
//!   mistyped command names.
//!
//! # Parameter notation
//!
//! ```text
//! <required>   [optional]   <greedy...>   [greedy...]
//! ```
//!
//! Only the last parameter may be greedy; it absorbs the rest of the line,
//! spaces included, so `say <message...>` receives the whole chat message.
//!
//! The registry is generic over the context type `C` handed to handlers and
//! the error type `E` they return, so it knows nothing about game state.

mod command;
mod error;
mod registry;
mod suggest;

pub use command::{CommandInfo, Invocation, Param};
pub use error::{CommandError, RegistryError};
pub use registry::{CommandRegistry, Handler, Response, ResponseKind};
pub use suggest::{SUGGESTION_THRESHOLD, levenshtein};
