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

//! `environments.toml`: the environments charmctl knows how to reach

use crate::domain::charm::url::is_valid_series;
use crate::infrastructure::constants::{DEFAULT_SERIES, DEFAULT_STATE_ADDR};
use crate::shared::error::{CommandError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentsConfig {
    /// Environment used when none is named on the command line
    pub default: Option<String>,
    pub environments: BTreeMap<String, EnvironmentEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EnvironmentEntry {
    #[serde(rename = "type")]
    pub env_type: String,
    #[serde(default = "default_series")]
    pub default_series: String,
    #[serde(default = "default_state_servers")]
    pub state_servers: Vec<String>,
    /// Root of the charm store mirror used for `cs:` charms
    #[serde(default)]
    pub charm_store: Option<PathBuf>,
}

fn default_series() -> String {
    DEFAULT_SERIES.to_string()
}

fn default_state_servers() -> Vec<String> {
    vec![DEFAULT_STATE_ADDR.to_string()]
}

impl EnvironmentEntry {
    pub fn new(env_type: impl Into<String>) -> Self {
        Self {
            env_type: env_type.into(),
            default_series: default_series(),
            state_servers: default_state_servers(),
            charm_store: None,
        }
    }
}

impl EnvironmentsConfig {
    pub fn parse(content: &str) -> Result<Self> {
        let conf: Self = toml::from_str(content)?;
        conf.validate()?;
        Ok(conf)
    }

    /// Load configuration from TOML file
    pub fn from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = read_to_string(path).map_err(|e| {
            CommandError::config_error(format!(
                "Failed to read environments file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&content)
    }

    /// Like [`EnvironmentsConfig::from`], but a missing file yields an empty
    /// configuration.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::from(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(ref name) = self.default {
            if !self.environments.contains_key(name) {
                return Err(CommandError::config_error(format!(
                    "default environment {:?} is not defined",
                    name
                )));
            }
        }
        for (name, env) in &self.environments {
            if env.env_type.is_empty() {
                return Err(CommandError::config_error(format!(
                    "environment {:?} has no type",
                    name
                )));
            }
            if !is_valid_series(&env.default_series) {
                return Err(CommandError::config_error(format!(
                    "environment {:?} has invalid default-series {:?}",
                    name, env.default_series
                )));
            }
            if env.state_servers.is_empty() {
                return Err(CommandError::config_error(format!(
                    "environment {:?} has no state-servers",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Picks the named environment, else the configured default, else the
    /// only environment defined.
    pub fn select(&self, name: Option<&str>) -> Result<(&str, &EnvironmentEntry)> {
        let name = match name {
            Some(name) => name,
            None => match self.default.as_deref() {
                Some(name) => name,
                None if self.environments.len() == 1 => {
                    return self
                        .environments
                        .iter()
                        .next()
                        .map(|(k, v)| (k.as_str(), v))
                        .ok_or_else(|| CommandError::config_error("no environments defined"));
                }
                None if self.environments.is_empty() => {
                    return Err(CommandError::config_error("no environments defined"))
                }
                None => {
                    return Err(CommandError::config_error(
                        "no default environment; use -e to name one",
                    ))
                }
            },
        };
        self.environments
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v))
            .ok_or_else(|| CommandError::config_error(format!("unknown environment {:?}", name)))
    }

    /// Environment whose state servers include `addr`.
    pub fn find_by_addr(&self, addr: &str) -> Option<(&str, &EnvironmentEntry)> {
        self.environments
            .iter()
            .find(|(_, env)| env.state_servers.iter().any(|a| a == addr))
            .map(|(k, v)| (k.as_str(), v))
    }
}
