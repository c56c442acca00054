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

//! The `bootstrap` command

use super::context::CommandContext;
use super::contract::{check_positionals, parse_args, Command, CommandInfo};
use super::display::TableRenderer;
use crate::domain::workflow::{BootstrapIntent, BootstrapWorkflow};
use crate::infrastructure::constants::DEFAULT_STATE_ADDR;
use crate::infrastructure::state::StoreInitializer;
use crate::shared::error::{CommandError, Result};
use clap::Parser;
use std::sync::Arc;

const BOOTSTRAP_DOC: &str = "
Initializes the cluster state held by the state servers and registers the
machine identified by --instance-id as the bootstrap machine. Run once per
environment, on the first machine.
";

#[derive(Parser, Debug, Clone)]
#[command(name = "bootstrap", about = "Initialize cluster state")]
pub struct BootstrapArgs {
    /// Comma-separated list of state server addresses
    #[arg(
        long = "state-servers",
        value_name = "ADDRS",
        value_delimiter = ',',
        default_value = DEFAULT_STATE_ADDR
    )]
    pub state_servers: Vec<String>,

    /// Instance id of this machine
    #[arg(long = "instance-id")]
    pub instance_id: Option<String>,

    /// Environment type of this machine
    #[arg(long = "env-type")]
    pub env_type: Option<String>,

    #[arg(value_name = "ARGS", hide = true)]
    pub args: Vec<String>,
}

impl BootstrapArgs {
    pub fn into_intent(self) -> Result<BootstrapIntent> {
        let instance_id = self
            .instance_id
            .filter(|s| !s.is_empty())
            .ok_or_else(|| CommandError::argument("--instance-id option must be set"))?;
        let env_type = self
            .env_type
            .filter(|s| !s.is_empty())
            .ok_or_else(|| CommandError::argument("--env-type option must be set"))?;
        check_positionals(&self.args, 0)?;

        let state_addrs: Vec<String> = self
            .state_servers
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if state_addrs.is_empty() {
            return Err(CommandError::argument(
                "--state-servers option must name at least one address",
            ));
        }

        Ok(BootstrapIntent {
            state_addrs,
            instance_id,
            env_type,
        })
    }
}

pub struct BootstrapCommand {
    initializer: Arc<dyn StoreInitializer>,
}

impl BootstrapCommand {
    pub fn new(initializer: Arc<dyn StoreInitializer>) -> Self {
        Self { initializer }
    }
}

#[async_trait::async_trait]
impl Command for BootstrapCommand {
    type Intent = BootstrapIntent;

    fn describe(&self) -> CommandInfo {
        CommandInfo {
            name: "bootstrap",
            args: "",
            purpose: "initialize cluster state",
            doc: BOOTSTRAP_DOC,
        }
    }

    fn resolve(&self, args: &[String]) -> Result<BootstrapIntent> {
        parse_args::<BootstrapArgs>("bootstrap", args)?.into_intent()
    }

    async fn execute(&self, intent: BootstrapIntent, ctx: &CommandContext) -> Result<()> {
        let report = BootstrapWorkflow::new(self.initializer.as_ref())
            .run(&intent)
            .await?;
        ctx.info(&TableRenderer::new().render_bootstrap(&report));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::state::MemoryStore;

    fn resolve(args: &[&str]) -> Result<BootstrapIntent> {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        BootstrapCommand::new(Arc::new(MemoryStore::new())).resolve(&args)
    }

    #[test]
    fn test_instance_id_required() {
        let err = resolve(&[]).unwrap_err();
        assert_eq!(err.to_string(), "--instance-id option must be set");

        let err = resolve(&["--env-type", "dummy", "--instance-id", ""]).unwrap_err();
        assert_eq!(err.to_string(), "--instance-id option must be set");
    }

    #[test]
    fn test_env_type_required() {
        let err = resolve(&["--instance-id", "i-deadbeef"]).unwrap_err();
        assert_eq!(err.to_string(), "--env-type option must be set");
    }

    #[test]
    fn test_unrecognized_args() {
        let err = resolve(&[
            "--instance-id",
            "ii",
            "--env-type",
            "et",
            "haha disregard that",
        ])
        .unwrap_err();
        assert_eq!(err.to_string(), r#"unrecognized args: ["haha disregard that"]"#);
    }

    #[test]
    fn test_required_options_checked_before_leftovers() {
        let err = resolve(&["haha disregard that"]).unwrap_err();
        assert_eq!(err.to_string(), "--instance-id option must be set");
    }

    #[test]
    fn test_default_state_servers() {
        let intent = resolve(&["--instance-id", "iWhatever", "--env-type", "dummy"]).unwrap();
        assert_eq!(intent.state_addrs, vec!["127.0.0.1:2181".to_string()]);
        assert_eq!(intent.instance_id, "iWhatever");
        assert_eq!(intent.env_type, "dummy");
    }

    #[test]
    fn test_state_servers_list() {
        let intent = resolve(&[
            "--state-servers",
            "st1:2181,st2:2181,st3:2181",
            "--instance-id",
            "iWhatever",
            "--env-type",
            "dummy",
        ])
        .unwrap();
        assert_eq!(intent.state_addrs, vec!["st1:2181", "st2:2181", "st3:2181"]);
    }

    #[test]
    fn test_empty_state_servers() {
        let err = resolve(&["--state-servers", "", "--instance-id", "i", "--env-type", "e"])
            .unwrap_err();
        assert!(matches!(err, CommandError::Argument(_)));
    }
}
