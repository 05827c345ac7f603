//! Command language for chat messages.
//!
//! This crate turns the free-form text of a chat message into a structured
//! command invocation:
//! - Mention resolution against the platform's resolved user/role lists
//! - Tokenization into words, quoted phrases and the `=` / `+` markers
//! - Folding of `a + b` runs into lists and `key = value` runs into maps
//! - Binding of the folded values to named, possibly defaulted parameters
//!
//! Every stage is synchronous and keeps its state local to one call, so a
//! host may parse many messages concurrently.

pub mod binder;
pub mod error;
pub mod invocation;
pub mod mention;
pub mod rewrite;
pub mod token;
pub mod value;

// Re-export main types
pub use binder::{bind, Arguments, Defaults, SlotSet};
pub use error::{InterpreterError, Result};
pub use invocation::Invocation;
pub use mention::{resolve_mentions, MentionKind, MentionMap, Reference};
pub use rewrite::rewrite;
pub use token::{tokenize, Token};
pub use value::Value;
