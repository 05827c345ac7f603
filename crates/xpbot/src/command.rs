//! Chat commands: the menu tree and the dispatcher that runs it.

pub mod dispatcher;
pub mod menu;

pub use dispatcher::Commands;
pub use menu::{CommandId, CommandSpec, Failure, MenuEntry, MenuNode};
