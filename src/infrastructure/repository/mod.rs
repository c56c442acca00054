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

//! Charm repositories

pub mod local;

pub use self::local::LocalRepository;

use crate::domain::charm::{Charm, CharmUrl, Schema};
use crate::shared::error::{CommandError, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[async_trait::async_trait]
pub trait CharmRepository: Send + Sync {
    /// Human-readable location, used in error messages
    fn location(&self) -> String;

    /// Highest revision available for the charm, ignoring any revision in `url`
    async fn latest(&self, url: &CharmUrl) -> Result<u32>;

    /// Fetches the charm at the revision in `url`, or the latest one
    async fn get(&self, url: &CharmUrl) -> Result<Charm>;

    /// Records a new revision at the charm's source. Repositories that cannot
    /// be written to ignore the request.
    async fn set_revision(&self, _charm: &Charm, _revision: u32) -> Result<()> {
        Ok(())
    }
}

pub trait RepositoryResolver: Send + Sync {
    fn resolve(&self, url: &CharmUrl, root: Option<&Path>) -> Result<Arc<dyn CharmRepository>>;
}

/// Resolves `local:` URLs against the supplied root and `cs:` URLs against the
/// configured charm store mirror.
#[derive(Debug, Clone, Default)]
pub struct DefaultRepositoryResolver {
    charm_store: Option<PathBuf>,
}

impl DefaultRepositoryResolver {
    pub fn new(charm_store: Option<PathBuf>) -> Self {
        Self { charm_store }
    }
}

impl RepositoryResolver for DefaultRepositoryResolver {
    fn resolve(&self, url: &CharmUrl, root: Option<&Path>) -> Result<Arc<dyn CharmRepository>> {
        match url.schema {
            Schema::Local => {
                let root = root.ok_or_else(|| {
                    CommandError::repository_not_found(url, "no local repository path specified")
                })?;
                Ok(Arc::new(LocalRepository::open(root, url)?))
            }
            Schema::CharmStore => {
                let store = self.charm_store.as_deref().ok_or_else(|| {
                    CommandError::repository_not_found(url, "no charm store configured")
                })?;
                Ok(Arc::new(LocalRepository::open(store, url)?))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_url_requires_root() {
        let resolver = DefaultRepositoryResolver::default();
        let url = CharmUrl::parse("local:precise/mysql").unwrap();
        let err = resolver.resolve(&url, None).err().unwrap();
        assert!(matches!(err, CommandError::RepositoryNotFound { .. }));
    }

    #[test]
    fn test_store_url_requires_charm_store() {
        let resolver = DefaultRepositoryResolver::default();
        let url = CharmUrl::parse("cs:precise/mysql").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let err = resolver.resolve(&url, Some(dir.path())).err().unwrap();
        assert!(matches!(err, CommandError::RepositoryNotFound { .. }));
    }

    #[test]
    fn test_missing_root_is_not_found() {
        let resolver = DefaultRepositoryResolver::default();
        let url = CharmUrl::parse("local:precise/mysql").unwrap();
        let err = resolver
            .resolve(&url, Some(Path::new("/nonexistent/charm/repo")))
            .err()
            .unwrap();
        assert!(matches!(err, CommandError::RepositoryNotFound { .. }));
    }
}
