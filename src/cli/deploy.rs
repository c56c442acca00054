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

//! The `deploy` command

use super::context::CommandContext;
use super::contract::{check_positionals, parse_args, Command, CommandInfo, ResolveDefaults};
use super::display::TableRenderer;
use crate::domain::workflow::{DeployIntent, DeployWorkflow};
use crate::infrastructure::constants::MAX_UNITS_PER_REQUEST;
use crate::infrastructure::repository::RepositoryResolver;
use crate::infrastructure::state::StoreConnector;
use crate::shared::error::{CommandError, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

const DEPLOY_DOC: &str = "
<charm name> can be a charm URL, or an unambiguously condensed form of it;
assuming a current default series of \"precise\", the following forms will be
accepted.

For cs:precise/mysql
  mysql
  precise/mysql

For cs:~user/precise/mysql
  cs:~user/mysql
  ~user/mysql

For local:precise/mysql
  local:mysql

In all cases, a versioned charm URL will be expanded as expected (for example,
mysql-33 becomes cs:precise/mysql-33).

<service name>, if omitted, will be derived from <charm name>.
";

#[derive(Parser, Debug, Clone)]
#[command(name = "deploy", about = "Deploy a new service")]
pub struct DeployArgs {
    /// Environment to operate in (defaults to the configured default)
    #[arg(long, short = 'e')]
    pub environment: Option<String>,

    /// Number of service units to deploy for principal charms
    #[arg(
        long = "num-units",
        short = 'n',
        default_value_t = 1,
        allow_negative_numbers = true
    )]
    pub num_units: i64,

    /// Increment local charm directory revision
    #[arg(long, short = 'u')]
    pub upgrade: bool,

    /// Path to yaml-formatted service config
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Local charm repository (defaults to $CHARM_REPOSITORY)
    #[arg(long, value_name = "PATH")]
    pub repository: Option<PathBuf>,

    /// <charm name> [<service name>]
    #[arg(value_name = "ARGS")]
    pub args: Vec<String>,
}

impl DeployArgs {
    /// Validates positionals and unit count, and applies environment defaults.
    pub fn into_intent(self, defaults: &ResolveDefaults) -> Result<DeployIntent> {
        let positionals = check_positionals(&self.args, 2)?;
        let (charm_name, service_name) = match positionals {
            [] => return Err(CommandError::argument("no charm specified")),
            [charm] => (charm.clone(), None),
            [charm, service, ..] => (charm.clone(), Some(service.clone())),
        };

        if self.num_units < 1 {
            return Err(CommandError::argument("must deploy at least one unit"));
        }
        let num_units = u32::try_from(self.num_units)
            .ok()
            .filter(|n| *n <= MAX_UNITS_PER_REQUEST)
            .ok_or_else(|| {
                CommandError::argument(format!(
                    "cannot deploy {} units: at most {} per deploy",
                    self.num_units, MAX_UNITS_PER_REQUEST
                ))
            })?;

        Ok(DeployIntent {
            env_name: self.environment,
            charm_name,
            service_name,
            num_units,
            bump_revision: self.upgrade,
            config_path: self.config,
            repo_path: self.repository.or_else(|| defaults.repository.clone()),
        })
    }
}

pub struct DeployCommand {
    defaults: ResolveDefaults,
    connector: Arc<dyn StoreConnector>,
    resolver: Arc<dyn RepositoryResolver>,
}

impl DeployCommand {
    pub fn new(
        defaults: ResolveDefaults,
        connector: Arc<dyn StoreConnector>,
        resolver: Arc<dyn RepositoryResolver>,
    ) -> Self {
        Self {
            defaults,
            connector,
            resolver,
        }
    }
}

#[async_trait::async_trait]
impl Command for DeployCommand {
    type Intent = DeployIntent;

    fn describe(&self) -> CommandInfo {
        CommandInfo {
            name: "deploy",
            args: "<charm name> [<service name>]",
            purpose: "deploy a new service",
            doc: DEPLOY_DOC,
        }
    }

    fn resolve(&self, args: &[String]) -> Result<DeployIntent> {
        parse_args::<DeployArgs>("deploy", args)?.into_intent(&self.defaults)
    }

    async fn execute(&self, mut intent: DeployIntent, ctx: &CommandContext) -> Result<()> {
        intent.repo_path = intent.repo_path.map(|p| ctx.abs_path(&p));
        intent.config_path = intent.config_path.map(|p| ctx.abs_path(&p));

        let renderer = TableRenderer::new();
        let report = match DeployWorkflow::new(self.connector.as_ref(), self.resolver.as_ref())
            .run(&intent)
            .await
        {
            Ok(report) => report,
            Err(err) => {
                if let CommandError::PartialDeploy {
                    ref service,
                    requested,
                    ..
                } = err
                {
                    ctx.info(&renderer.render_partial(service, requested));
                }
                return Err(err);
            }
        };
        ctx.info(&renderer.render_deploy(&report));
        Ok(())
    }
}
