//! Command-line surface

pub mod bootstrap;
pub mod commands;
pub mod context;
pub mod contract;
pub mod deploy;
pub mod display;

pub use bootstrap::{BootstrapArgs, BootstrapCommand};
pub use commands::{CliArgs, Commands};
pub use context::{BufferSink, CommandContext, OutputSink, StdoutSink};
pub use contract::{Command, CommandInfo, ResolveDefaults};
pub use deploy::{DeployArgs, DeployCommand};
