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

use super::constants::{
    ENVIRONMENTS_FILE, ENV_CHARMCTL_HOME, ENV_HOME, HOME_DIR_NAME, STATE_DIR_NAME,
};
use crate::shared::error::{CommandError, Result};
use std::path::{Path, PathBuf};

/// Directory holding `environments.toml` and the file store state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharmctlHome {
    root: PathBuf,
}

impl CharmctlHome {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `$CHARMCTL_HOME`, falling back to `$HOME/.charmctl`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());
        if let Some(dir) = non_empty(ENV_CHARMCTL_HOME) {
            return Ok(Self::new(dir));
        }
        non_empty(ENV_HOME)
            .map(|home| Self::new(Path::new(&home).join(HOME_DIR_NAME)))
            .ok_or_else(|| {
                CommandError::config_error(format!(
                    "neither {} nor {} is set",
                    ENV_CHARMCTL_HOME, ENV_HOME
                ))
            })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn environments_file(&self) -> PathBuf {
        self.root.join(ENVIRONMENTS_FILE)
    }

    pub fn state_dir(&self) -> PathBuf {
        self.root.join(STATE_DIR_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_home() {
        let home = CharmctlHome::from_lookup(|k| match k {
            "CHARMCTL_HOME" => Some("/opt/charmctl".to_string()),
            "HOME" => Some("/home/me".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(home.root(), Path::new("/opt/charmctl"));
        assert_eq!(
            home.environments_file(),
            PathBuf::from("/opt/charmctl/environments.toml")
        );
        assert_eq!(home.state_dir(), PathBuf::from("/opt/charmctl/state"));
    }

    #[test]
    fn test_falls_back_to_user_home() {
        let home = CharmctlHome::from_lookup(|k| (k == "HOME").then(|| "/home/me".to_string()))
            .unwrap();
        assert_eq!(home.root(), Path::new("/home/me/.charmctl"));
    }

    #[test]
    fn test_no_home() {
        let err = CharmctlHome::from_lookup(|_| None).unwrap_err();
        assert!(matches!(err, CommandError::Config(_)));
    }
}
