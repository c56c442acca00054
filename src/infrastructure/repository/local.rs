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

//! Filesystem charm repository laid out as `<root>/[~user/]<series>/<charm-dir>`

use super::CharmRepository;
use crate::domain::charm::{Charm, CharmMeta, CharmUrl};
use crate::infrastructure::constants::{CHARM_METADATA_FILE, CHARM_REVISION_FILE};
use crate::shared::error::{CommandError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct LocalRepository {
    root: PathBuf,
}

impl LocalRepository {
    /// Opens the repository, failing when `root` is not a readable directory.
    pub fn open(root: &Path, url: &CharmUrl) -> Result<Self> {
        if !root.is_dir() {
            return Err(CommandError::repository_not_found(
                url,
                format!("{} is not a directory", root.display()),
            ));
        }
        fs::read_dir(root).map_err(|e| {
            CommandError::repository_not_found(
                url,
                format!("cannot read {}: {}", root.display(), e),
            )
        })?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    fn series_dir(&self, url: &CharmUrl) -> PathBuf {
        let mut dir = self.root.clone();
        if let Some(ref user) = url.user {
            dir.push(format!("~{}", user));
        }
        dir.push(&url.series);
        dir
    }

    /// All charms in the series directory whose metadata name matches `url`.
    /// Directories that are not charms are skipped.
    fn candidates(&self, url: &CharmUrl) -> Result<Vec<Charm>> {
        let dir = self.series_dir(url);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut found = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_dir() {
                continue;
            }
            let meta_path = path.join(CHARM_METADATA_FILE);
            if !meta_path.is_file() {
                continue;
            }
            let meta = match CharmMeta::from_file(&meta_path) {
                Ok(meta) => meta,
                Err(e) => {
                    warn!(path = %meta_path.display(), error = %e, "skipping unreadable charm");
                    continue;
                }
            };
            if meta.name != url.name {
                continue;
            }
            let revision = read_revision(&path)?;
            found.push(Charm {
                meta,
                revision,
                path: Some(path),
            });
        }
        Ok(found)
    }
}

fn read_revision(charm_dir: &Path) -> Result<u32> {
    let path = charm_dir.join(CHARM_REVISION_FILE);
    match fs::read_to_string(&path) {
        Ok(content) => content.trim().parse::<u32>().map_err(|e| {
            CommandError::InvalidCharmName(format!(
                "invalid revision file {}: {}",
                path.display(),
                e
            ))
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
        Err(e) => Err(e.into()),
    }
}

#[async_trait::async_trait]
impl CharmRepository for LocalRepository {
    fn location(&self) -> String {
        self.root.display().to_string()
    }

    async fn latest(&self, url: &CharmUrl) -> Result<u32> {
        self.candidates(url)?
            .iter()
            .map(|c| c.revision)
            .max()
            .ok_or_else(|| CommandError::charm_not_found(url.unversioned(), self.location()))
    }

    async fn get(&self, url: &CharmUrl) -> Result<Charm> {
        let candidates = self.candidates(url)?;
        let chosen = match url.revision {
            Some(rev) => candidates.into_iter().find(|c| c.revision == rev),
            None => candidates.into_iter().max_by_key(|c| c.revision),
        };
        let charm = chosen.ok_or_else(|| CommandError::charm_not_found(url, self.location()))?;
        debug!(charm = %url, revision = charm.revision, "found charm in local repository");
        Ok(charm)
    }

    async fn set_revision(&self, charm: &Charm, revision: u32) -> Result<()> {
        if let Some(ref dir) = charm.path {
            fs::write(dir.join(CHARM_REVISION_FILE), format!("{}\n", revision))?;
        }
        Ok(())
    }
}
