//! User-facing commands for Dynablock.
//!
//! Provides:
//! - The interactive prompt boundary
//! - Family creation, instance insert and edit, family sync and listing
//! - A menu dispatcher over all commands
//!
//! Every command collects its input before touching the document, so a
//! cancelled prompt leaves no trace.

pub mod command;
pub mod context;
pub mod family;
pub mod instance;
pub mod prompt;

pub use command::{run_command, run_menu, CommandKind, CommandOutcome};
pub use context::CommandContext;
pub use prompt::Prompt;
