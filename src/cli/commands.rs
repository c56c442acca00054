// CLI command definitions

use super::bootstrap::BootstrapArgs;
use super::deploy::DeployArgs;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "charmctl",
    version,
    about = "Bootstrap clusters and deploy charm-based services onto them",
    long_about = "A standalone CLI tool for initializing cluster state and deploying services from charms"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Deploy a new service from a charm
    Deploy(DeployArgs),

    /// Initialize cluster state and register the bootstrap machine
    Bootstrap(BootstrapArgs),
}
