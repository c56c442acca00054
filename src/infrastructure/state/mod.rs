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

//! Cluster state store contract

pub mod file;
pub mod memory;
pub mod model;

pub use self::file::FileStore;
pub use self::memory::{FailOn, MemoryStore, StoreOperation};
pub use self::model::{
    EnvironConfig, MachineRecord, ServiceRecord, StateModel, StoredCharm, UnitRecord,
};

use crate::domain::charm::{Charm, CharmUrl};
use crate::shared::error::Result;
use std::ops::Deref;

/// An open handle on a state store.
#[async_trait::async_trait]
pub trait StateConnection: Send + Sync {
    async fn environ_config(&self) -> Result<EnvironConfig>;

    async fn publish_charm(
        &self,
        url: &CharmUrl,
        charm: &Charm,
        bump_revision: bool,
    ) -> Result<StoredCharm>;

    async fn add_service(&self, name: &str, charm: &StoredCharm) -> Result<ServiceRecord>;

    async fn add_units(&self, service: &ServiceRecord, count: u32) -> Result<Vec<String>>;

    async fn register_bootstrap_machine(&self, instance_id: &str) -> Result<String>;

    async fn machine(&self, id: &str) -> Result<MachineRecord>;

    async fn machines(&self) -> Result<Vec<MachineRecord>>;

    /// Releases the connection. Calling it more than once has no effect.
    fn close(&self);
}

/// Opens connections to an already bootstrapped environment.
#[async_trait::async_trait]
pub trait StoreConnector: Send + Sync {
    /// `None` selects the default environment.
    async fn connect(&self, env_name: Option<&str>) -> Result<Box<dyn StateConnection>>;
}

/// Creates or attaches to a store at explicit addresses.
#[async_trait::async_trait]
pub trait StoreInitializer: Send + Sync {
    async fn initialize(
        &self,
        addrs: &[String],
        env_type: &str,
    ) -> Result<Box<dyn StateConnection>>;
}

/// Closes the wrapped connection when dropped.
pub struct ConnectionGuard {
    conn: Box<dyn StateConnection>,
}

impl ConnectionGuard {
    pub fn new(conn: Box<dyn StateConnection>) -> Self {
        Self { conn }
    }
}

impl Deref for ConnectionGuard {
    type Target = dyn StateConnection;

    fn deref(&self) -> &Self::Target {
        self.conn.as_ref()
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.conn.close();
    }
}
