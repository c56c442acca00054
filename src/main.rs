// Copyright 2025 JiangLong.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use charmctl::cli::{commands::Commands, CliArgs};
use charmctl::infrastructure::home::CharmctlHome;
use charmctl::{
    BootstrapCommand, BootstrapIntent, Command, CommandContext, DefaultRepositoryResolver,
    DeployCommand, DeployIntent, EnvironmentsConfig, FileStore, ResolveDefaults,
};
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so command output on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    let ctx = CommandContext::current()?;

    match prepare(args.command, |key| std::env::var(key).ok())? {
        Prepared::Deploy(command, intent) => command.execute(intent, &ctx).await?,
        Prepared::Bootstrap(command, intent) => command.execute(intent, &ctx).await?,
    }

    Ok(())
}

enum Prepared {
    Deploy(DeployCommand, DeployIntent),
    Bootstrap(BootstrapCommand, BootstrapIntent),
}

/// Resolves the intent, then loads the environments it runs against, so
/// argument errors are reported even when no configuration exists.
fn prepare(
    command: Commands,
    lookup: impl Fn(&str) -> Option<String> + Copy,
) -> charmctl::Result<Prepared> {
    match command {
        Commands::Deploy(deploy) => {
            let defaults = ResolveDefaults::from_lookup(lookup);
            let intent = deploy.into_intent(&defaults)?;

            let (home, environments) = load_environments(lookup)?;
            let charm_store = environments
                .select(intent.env_name.as_deref())
                .ok()
                .and_then(|(_, env)| env.charm_store.clone());
            let store = FileStore::new(home.state_dir(), environments);
            let command = DeployCommand::new(
                defaults,
                Arc::new(store),
                Arc::new(DefaultRepositoryResolver::new(charm_store)),
            );
            Ok(Prepared::Deploy(command, intent))
        }
        Commands::Bootstrap(bootstrap) => {
            let intent = bootstrap.into_intent()?;
            let (home, environments) = load_environments(lookup)?;
            let store = FileStore::new(home.state_dir(), environments);
            Ok(Prepared::Bootstrap(BootstrapCommand::new(Arc::new(store)), intent))
        }
    }
}

fn load_environments(
    lookup: impl Fn(&str) -> Option<String>,
) -> charmctl::Result<(CharmctlHome, EnvironmentsConfig)> {
    let home = CharmctlHome::from_lookup(lookup)?;
    let environments = EnvironmentsConfig::load_or_default(home.environments_file())?;
    Ok((home, environments))
}
