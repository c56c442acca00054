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

use crate::domain::charm::{CharmLocator, CharmUrl};
use crate::infrastructure::repository::RepositoryResolver;
use crate::infrastructure::state::{ConnectionGuard, StoreConnector};
use crate::shared::error::{CommandError, Phase, Result};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Validated `deploy` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployIntent {
    pub env_name: Option<String>,
    pub charm_name: String,
    /// Derived from the charm's name when omitted
    pub service_name: Option<String>,
    pub num_units: u32,
    pub bump_revision: bool,
    pub config_path: Option<PathBuf>,
    pub repo_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployReport {
    pub charm_url: CharmUrl,
    pub service: String,
    pub units: Vec<String>,
    pub subordinate: bool,
}

pub struct DeployWorkflow<'a> {
    connector: &'a dyn StoreConnector,
    resolver: &'a dyn RepositoryResolver,
}

impl<'a> DeployWorkflow<'a> {
    pub fn new(connector: &'a dyn StoreConnector, resolver: &'a dyn RepositoryResolver) -> Self {
        Self {
            connector,
            resolver,
        }
    }

    /// Runs connect, charm resolution, publishing, service creation and unit
    /// creation in order. Relative paths in `intent` must already be
    /// absolute.
    pub async fn run(&self, intent: &DeployIntent) -> Result<DeployReport> {
        let env = intent.env_name.as_deref();
        debug!(env = ?env, charm = %intent.charm_name, "deploy: connecting");
        let conn = ConnectionGuard::new(
            self.connector
                .connect(env)
                .await
                .map_err(|e| e.in_phase(Phase::Connecting))?,
        );

        debug!(charm = %intent.charm_name, "deploy: resolving charm");
        let config = conn
            .environ_config()
            .await
            .map_err(|e| e.in_phase(Phase::CharmResolving))?;
        let located = CharmLocator::new(self.resolver)
            .locate(
                &intent.charm_name,
                config.default_series(),
                intent.repo_path.as_deref(),
            )
            .await
            .map_err(|e| e.in_phase(Phase::CharmResolving))?;

        if intent.bump_revision && !located.url.is_local() {
            return Err(CommandError::argument(format!(
                "cannot increment revision of charm {:?} from repository {}",
                located.url.to_string(),
                located.repository.location()
            ))
            .in_phase(Phase::CharmPublishing));
        }

        debug!(charm = %located.url, bump = intent.bump_revision, "deploy: publishing charm");
        let stored = conn
            .publish_charm(&located.url, &located.charm, intent.bump_revision)
            .await
            .map_err(|e| e.in_phase(Phase::CharmPublishing))?;
        if stored.revision() != located.charm.revision {
            located
                .repository
                .set_revision(&located.charm, stored.revision())
                .await
                .map_err(|e| e.in_phase(Phase::CharmPublishing))?;
        }

        if let Some(ref path) = intent.config_path {
            warn!(config = %path.display(), "service configuration files are not supported");
            return Err(CommandError::NotImplemented(
                "setting service configuration from a file".to_string(),
            ));
        }

        let service_name = intent
            .service_name
            .clone()
            .unwrap_or_else(|| located.charm.meta.name.clone());
        debug!(service = %service_name, "deploy: creating service");
        let service = conn
            .add_service(&service_name, &stored)
            .await
            .map_err(|e| e.in_phase(Phase::ServiceCreating))?;

        if service.subordinate {
            info!(service = %service.name, charm = %stored.url, "deployed subordinate service");
            return Ok(DeployReport {
                charm_url: stored.url,
                service: service.name,
                units: Vec::new(),
                subordinate: true,
            });
        }

        debug!(service = %service.name, units = intent.num_units, "deploy: creating units");
        let units = conn
            .add_units(&service, intent.num_units)
            .await
            .map_err(|e| CommandError::PartialDeploy {
                service: service.name.clone(),
                requested: intent.num_units,
                reason: e.to_string(),
            })?;

        info!(
            service = %service.name,
            charm = %stored.url,
            units = units.len(),
            "deployed service"
        );
        Ok(DeployReport {
            charm_url: stored.url,
            service: service.name,
            units,
            subordinate: false,
        })
    }
}
