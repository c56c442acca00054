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

use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CommandError>;

/// Workflow phase an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Connecting,
    CharmResolving,
    CharmPublishing,
    ServiceCreating,
    UnitsCreating,
    StoreInitializing,
    MachineRegistering,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Connecting => "connecting",
            Phase::CharmResolving => "charm resolution",
            Phase::CharmPublishing => "charm publishing",
            Phase::ServiceCreating => "service creation",
            Phase::UnitsCreating => "unit creation",
            Phase::StoreInitializing => "store initialization",
            Phase::MachineRegistering => "machine registration",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("{0}")]
    Argument(String),

    #[error("unrecognized args: [{}]", quote_all(.0))]
    UnrecognizedArguments(Vec<String>),

    #[error("{0}")]
    InvalidCharmName(String),

    #[error("{0}")]
    AmbiguousCharm(String),

    #[error("no repository found for {url}: {reason}")]
    RepositoryNotFound { url: String, reason: String },

    #[error("charm not found in {repository}: {url}")]
    CharmNotFound { url: String, repository: String },

    #[error("cannot connect to environment {env:?}: {reason}")]
    Connection { env: String, reason: String },

    #[error("state store unavailable at [{}]: {reason}", .addrs.join(", "))]
    StoreUnavailable { addrs: Vec<String>, reason: String },

    #[error("service {0:?} already exists")]
    DuplicateService(String),

    #[error("bootstrap machine already registered (instance {instance_id:?})")]
    DuplicateBootstrap { instance_id: String },

    #[error(
        "service {service:?} was created but adding {requested} unit(s) failed: {reason}; \
         re-run unit creation for the existing service rather than deploying it again"
    )]
    PartialDeploy {
        service: String,
        requested: u32,
        reason: String,
    },

    #[error("not implemented: {0}")]
    NotImplemented(String),

    #[error("state error: {0}")]
    Store(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{phase} failed: {source}")]
    PhaseFailed {
        phase: Phase,
        #[source]
        source: Box<CommandError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

fn quote_all(args: &[String]) -> String {
    args.iter()
        .map(|a| format!("{:?}", a))
        .collect::<Vec<_>>()
        .join(" ")
}

impl From<clap::Error> for CommandError {
    fn from(err: clap::Error) -> Self {
        let rendered = err.to_string();
        let first = rendered
            .lines()
            .next()
            .unwrap_or_default()
            .trim_start_matches("error: ")
            .to_string();
        CommandError::Argument(first)
    }
}

impl CommandError {
    pub fn argument(msg: impl Into<String>) -> Self {
        Self::Argument(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    pub fn config_error(context: impl Into<String>) -> Self {
        Self::Config(context.into())
    }

    pub fn connection(env: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Connection {
            env: env.into(),
            reason: reason.to_string(),
        }
    }

    pub fn repository_not_found(url: impl fmt::Display, reason: impl Into<String>) -> Self {
        Self::RepositoryNotFound {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    pub fn charm_not_found(url: impl fmt::Display, repository: impl Into<String>) -> Self {
        Self::CharmNotFound {
            url: url.to_string(),
            repository: repository.into(),
        }
    }

    /// Wraps the error with the phase it was raised in. Errors that already
    /// carry a phase, and partial deploys, are returned untouched.
    pub fn in_phase(self, phase: Phase) -> Self {
        match self {
            e @ (CommandError::PhaseFailed { .. } | CommandError::PartialDeploy { .. }) => e,
            e => CommandError::PhaseFailed {
                phase,
                source: Box::new(e),
            },
        }
    }

    /// The error as raised by the failing step, without phase wrapping.
    pub fn root(&self) -> &CommandError {
        match self {
            CommandError::PhaseFailed { source, .. } => source.root(),
            e => e,
        }
    }

    pub fn phase(&self) -> Option<Phase> {
        match self {
            CommandError::PhaseFailed { phase, .. } => Some(*phase),
            CommandError::PartialDeploy { .. } => Some(Phase::UnitsCreating),
            _ => None,
        }
    }

    /// True when the store was left modified by the failed command.
    pub fn is_partial(&self) -> bool {
        matches!(self.root(), CommandError::PartialDeploy { .. })
    }
}
