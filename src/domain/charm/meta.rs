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

use crate::shared::error::{CommandError, Result};
use serde::{Deserialize, Serialize};
use std::fs::read_to_string;
use std::path::{Path, PathBuf};

/// Charm metadata as read from `metadata.yaml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharmMeta {
    pub name: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    /// Subordinate charms only run attached to another service's units
    #[serde(default)]
    pub subordinate: bool,
}

impl CharmMeta {
    pub fn from_yaml(content: &str) -> Result<Self> {
        let meta: Self = serde_yaml::from_str(content)?;
        if meta.name.is_empty() {
            return Err(CommandError::InvalidCharmName(
                "charm metadata has an empty name".to_string(),
            ));
        }
        Ok(meta)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = read_to_string(path)?;
        Self::from_yaml(&content)
    }
}

/// A charm fetched from a repository.
#[derive(Debug, Clone, PartialEq)]
pub struct Charm {
    pub meta: CharmMeta,
    pub revision: u32,
    /// Charm directory, for charms that live on the local filesystem
    pub path: Option<PathBuf>,
}

impl Charm {
    pub fn new(meta: CharmMeta, revision: u32) -> Self {
        Self {
            meta,
            revision,
            path: None,
        }
    }
}
