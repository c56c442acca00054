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

use super::{Charm, CharmUrl};
use crate::infrastructure::repository::{CharmRepository, RepositoryResolver};
use crate::shared::error::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// A charm resolved to a pinned URL, with the repository it came from.
pub struct LocatedCharm {
    /// Inferred from the user's input, before revision pinning
    pub requested: CharmUrl,
    /// Always carries a revision
    pub url: CharmUrl,
    pub charm: Charm,
    pub repository: Arc<dyn CharmRepository>,
}

pub struct CharmLocator<'a> {
    resolver: &'a dyn RepositoryResolver,
}

impl<'a> CharmLocator<'a> {
    pub fn new(resolver: &'a dyn RepositoryResolver) -> Self {
        Self { resolver }
    }

    pub fn infer(&self, src: &str, default_series: &str) -> Result<CharmUrl> {
        CharmUrl::infer(src, default_series)
    }

    /// Infers the URL, resolves its repository and pins the revision to the
    /// latest one available when none was given.
    pub async fn locate(
        &self,
        src: &str,
        default_series: &str,
        repo_root: Option<&Path>,
    ) -> Result<LocatedCharm> {
        let requested = self.infer(src, default_series)?;
        let repository = self.resolver.resolve(&requested, repo_root)?;

        let revision = match requested.revision {
            Some(rev) => rev,
            None => repository.latest(&requested).await?,
        };
        let url = requested.with_revision(revision);
        let charm = repository.get(&url).await?;
        debug!(requested = %requested, resolved = %url, "located charm");

        Ok(LocatedCharm {
            requested,
            url,
            charm,
            repository,
        })
    }
}
