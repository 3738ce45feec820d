//! Media handling: external tool execution and transcoding.

pub mod command;
pub mod transcoder;

pub use command::{CommandExecutor, ScriptedCommandExecutor, SystemCommandExecutor};
pub use transcoder::Transcoder;
