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

//! The shape every command implements

use super::context::CommandContext;
use crate::shared::error::{CommandError, Result};
use std::path::PathBuf;

/// Command metadata shown in help output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandInfo {
    pub name: &'static str,
    pub args: &'static str,
    pub purpose: &'static str,
    pub doc: &'static str,
}

/// Defaults taken from the process environment once, before resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveDefaults {
    pub repository: Option<PathBuf>,
}

impl ResolveDefaults {
    /// Builds defaults from a variable lookup, e.g. `|k| std::env::var(k).ok()`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        use crate::infrastructure::constants::ENV_CHARM_REPOSITORY;
        Self {
            repository: lookup(ENV_CHARM_REPOSITORY)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        }
    }
}

#[async_trait::async_trait]
pub trait Command: Send + Sync {
    type Intent: Send + Sync;

    fn describe(&self) -> CommandInfo;

    /// Parses `args` (excluding the command name) into a validated intent.
    fn resolve(&self, args: &[String]) -> Result<Self::Intent>;

    async fn execute(&self, intent: Self::Intent, ctx: &CommandContext) -> Result<()>;
}

/// Splits positional arguments into at most `max` accepted values, reporting
/// the remainder as unrecognized.
pub fn check_positionals(args: &[String], max: usize) -> Result<&[String]> {
    if args.len() > max {
        return Err(CommandError::UnrecognizedArguments(args[max..].to_vec()));
    }
    Ok(args)
}

/// Runs clap over `args` with `name` as the program name.
pub fn parse_args<P: clap::Parser>(name: &str, args: &[String]) -> Result<P> {
    let argv = std::iter::once(name).chain(args.iter().map(String::as_str));
    Ok(P::try_parse_from(argv)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_positionals() {
        let args: Vec<String> = vec!["a".into(), "b".into(), "c".into()];
        assert_eq!(check_positionals(&args, 3).unwrap().len(), 3);
        let err = check_positionals(&args, 1).unwrap_err();
        assert!(matches!(err, CommandError::UnrecognizedArguments(ref rest) if rest == &["b", "c"]));
    }

    #[test]
    fn test_defaults_from_lookup() {
        let defaults = ResolveDefaults::from_lookup(|k| {
            (k == "CHARM_REPOSITORY").then(|| "/srv/charms".to_string())
        });
        assert_eq!(defaults.repository, Some(PathBuf::from("/srv/charms")));

        let empty = ResolveDefaults::from_lookup(|_| Some(String::new()));
        assert_eq!(empty.repository, None);
    }
}
