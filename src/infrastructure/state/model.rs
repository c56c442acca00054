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

//! State records and the mutations shared by every store implementation

use crate::domain::charm::url::is_valid_name;
use crate::domain::charm::{Charm, CharmMeta, CharmUrl};
use crate::infrastructure::constants::{BOOTSTRAP_MACHINE_ID, MAX_UNITS_PER_REQUEST};
use crate::shared::error::{CommandError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EnvironConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub env_type: String,
    pub default_series: String,
}

impl EnvironConfig {
    pub fn default_series(&self) -> &str {
        &self.default_series
    }
}

/// A charm as recorded in the store's catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCharm {
    /// Always carries a revision
    pub url: CharmUrl,
    pub meta: CharmMeta,
}

impl StoredCharm {
    pub fn revision(&self) -> u32 {
        self.url.revision.unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub name: String,
    pub charm_url: CharmUrl,
    pub subordinate: bool,
    next_unit_seq: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitRecord {
    pub name: String,
    pub service: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineRecord {
    pub id: String,
    pub instance_id: String,
    pub bootstrap: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateModel {
    pub environ: Option<EnvironConfig>,
    pub charms: BTreeMap<String, StoredCharm>,
    pub services: BTreeMap<String, ServiceRecord>,
    pub units: Vec<UnitRecord>,
    pub machines: Vec<MachineRecord>,
}

impl StateModel {
    pub fn is_bootstrapped(&self) -> bool {
        self.environ.is_some()
    }

    /// Records environment settings on first initialization only.
    pub fn initialize(&mut self, environ: EnvironConfig) {
        if self.environ.is_none() {
            self.environ = Some(environ);
        }
    }

    pub fn environ_config(&self) -> Result<EnvironConfig> {
        self.environ
            .clone()
            .ok_or_else(|| CommandError::store("environment is not bootstrapped"))
    }

    /// Adds the charm to the catalogue. A charm already present at the same
    /// revision is returned as is, unless `bump_revision` asks for a new
    /// revision one above the highest stored one.
    pub fn publish_charm(
        &mut self,
        url: &CharmUrl,
        charm: &Charm,
        bump_revision: bool,
    ) -> Result<StoredCharm> {
        let url = match url.revision {
            Some(_) => url.clone(),
            None => url.with_revision(charm.revision),
        };

        let key = url.to_string();
        let url = match self.charms.get(&key) {
            Some(existing) if !bump_revision => return Ok(existing.clone()),
            Some(_) => url.with_revision(self.highest_revision(&url) + 1),
            None => url,
        };

        let stored = StoredCharm {
            url,
            meta: charm.meta.clone(),
        };
        self.charms.insert(stored.url.to_string(), stored.clone());
        Ok(stored)
    }

    fn highest_revision(&self, url: &CharmUrl) -> u32 {
        let base = url.unversioned();
        self.charms
            .values()
            .filter(|c| c.url.unversioned() == base)
            .map(|c| c.revision())
            .max()
            .unwrap_or_default()
    }

    pub fn add_service(&mut self, name: &str, charm: &StoredCharm) -> Result<ServiceRecord> {
        if !is_valid_name(name) {
            return Err(CommandError::store(format!("invalid service name {:?}", name)));
        }
        if self.services.contains_key(name) {
            return Err(CommandError::DuplicateService(name.to_string()));
        }
        if !self.charms.contains_key(&charm.url.to_string()) {
            return Err(CommandError::store(format!(
                "charm {} is not in the catalogue",
                charm.url
            )));
        }

        let service = ServiceRecord {
            name: name.to_string(),
            charm_url: charm.url.clone(),
            subordinate: charm.meta.subordinate,
            next_unit_seq: 0,
        };
        self.services.insert(name.to_string(), service.clone());
        Ok(service)
    }

    pub fn add_units(&mut self, service: &str, count: u32) -> Result<Vec<String>> {
        let record = self
            .services
            .get_mut(service)
            .ok_or_else(|| CommandError::store(format!("service {:?} not found", service)))?;
        if record.subordinate {
            return Err(CommandError::store(format!(
                "cannot directly add units to subordinate service {:?}",
                service
            )));
        }

        if count > MAX_UNITS_PER_REQUEST {
            return Err(CommandError::store(format!(
                "cannot add {} units to {:?}: at most {} per request",
                count, service, MAX_UNITS_PER_REQUEST
            )));
        }

        let mut names = Vec::new();
        for _ in 0..count {
            let name = format!("{}/{}", service, record.next_unit_seq);
            record.next_unit_seq += 1;
            self.units.push(UnitRecord {
                name: name.clone(),
                service: service.to_string(),
            });
            names.push(name);
        }
        Ok(names)
    }

    pub fn units_of(&self, service: &str) -> Vec<&UnitRecord> {
        self.units.iter().filter(|u| u.service == service).collect()
    }

    pub fn register_bootstrap_machine(&mut self, instance_id: &str) -> Result<String> {
        if let Some(existing) = self.machines.iter().find(|m| m.bootstrap) {
            return Err(CommandError::DuplicateBootstrap {
                instance_id: existing.instance_id.clone(),
            });
        }
        if instance_id.is_empty() {
            return Err(CommandError::store("instance id must not be empty"));
        }

        let machine = MachineRecord {
            id: BOOTSTRAP_MACHINE_ID.to_string(),
            instance_id: instance_id.to_string(),
            bootstrap: true,
        };
        self.machines.push(machine);
        Ok(BOOTSTRAP_MACHINE_ID.to_string())
    }

    pub fn machine(&self, id: &str) -> Result<MachineRecord> {
        self.machines
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| CommandError::store(format!("machine {} not found", id)))
    }
}
