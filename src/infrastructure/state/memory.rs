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

//! In-process state store.
//!
//! Every operation is recorded so callers can verify exactly which mutations
//! a workflow issued, and any single operation can be made to fail. Clones
//! share the same state.

use super::model::{EnvironConfig, MachineRecord, ServiceRecord, StateModel, StoredCharm};
use super::{StateConnection, StoreConnector, StoreInitializer};
use crate::domain::charm::{Charm, CharmUrl};
use crate::infrastructure::constants::DEFAULT_SERIES;
use crate::shared::error::{CommandError, Result};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

const MEMORY_ENV_NAME: &str = "memory";

/// Operation to fail, with the reason reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailOn {
    Connect(String),
    Initialize(String),
    EnvironConfig(String),
    PublishCharm(String),
    AddService(String),
    AddUnits(String),
    RegisterMachine(String),
}

/// Recorded operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOperation {
    Connect { env: Option<String> },
    Initialize { addrs: Vec<String>, env_type: String },
    EnvironConfig,
    PublishCharm { url: String, bump_revision: bool },
    AddService { name: String, charm_url: String },
    AddUnits { service: String, count: u32 },
    RegisterBootstrapMachine { instance_id: String },
    Close,
}

#[derive(Debug)]
struct MemoryStoreInner {
    model: StateModel,
    env_name: String,
    default_series: String,
    fail_on: Option<FailOn>,
    unreachable: HashSet<String>,
    operations: Vec<StoreOperation>,
}

#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryStoreInner>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// An empty store that has not been bootstrapped.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemoryStoreInner {
                model: StateModel::default(),
                env_name: MEMORY_ENV_NAME.to_string(),
                default_series: DEFAULT_SERIES.to_string(),
                fail_on: None,
                unreachable: HashSet::new(),
                operations: Vec::new(),
            })),
        }
    }

    /// A store that is already bootstrapped with the given default series.
    pub fn bootstrapped(env_type: &str, default_series: &str) -> Self {
        let store = Self::new();
        {
            let mut inner = store.lock();
            inner.default_series = default_series.to_string();
            let environ = EnvironConfig {
                name: inner.env_name.clone(),
                env_type: env_type.to_string(),
                default_series: default_series.to_string(),
            };
            inner.model.initialize(environ);
        }
        store
    }

    fn lock(&self) -> MutexGuard<'_, MemoryStoreInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn fail_on(&self, fail_on: FailOn) {
        self.lock().fail_on = Some(fail_on);
    }

    pub fn clear_failure(&self) {
        self.lock().fail_on = None;
    }

    pub fn set_unreachable(&self, addr: &str) {
        self.lock().unreachable.insert(addr.to_string());
    }

    pub fn operations(&self) -> Vec<StoreOperation> {
        self.lock().operations.clone()
    }

    /// Snapshot of the stored state.
    pub fn model(&self) -> StateModel {
        self.lock().model.clone()
    }

    /// Every `(service, count)` unit creation request received.
    pub fn add_units_calls(&self) -> Vec<(String, u32)> {
        self.operations()
            .into_iter()
            .filter_map(|op| match op {
                StoreOperation::AddUnits { service, count } => Some((service, count)),
                _ => None,
            })
            .collect()
    }

    /// Number of operations that changed or attempted to change state.
    pub fn mutation_count(&self) -> usize {
        self.operations()
            .iter()
            .filter(|op| {
                matches!(
                    op,
                    StoreOperation::PublishCharm { .. }
                        | StoreOperation::AddService { .. }
                        | StoreOperation::AddUnits { .. }
                        | StoreOperation::RegisterBootstrapMachine { .. }
                )
            })
            .count()
    }

    pub fn close_count(&self) -> usize {
        self.operations()
            .iter()
            .filter(|op| matches!(op, StoreOperation::Close))
            .count()
    }

    fn open(&self) -> Box<dyn StateConnection> {
        Box::new(MemoryConnection {
            store: self.clone(),
            closed: AtomicBool::new(false),
        })
    }
}

/// Records `op` and returns the configured failure reason when `matches`
/// selects it.
fn record(
    inner: &mut MemoryStoreInner,
    op: StoreOperation,
    matches: impl Fn(&FailOn) -> Option<&String>,
) -> Option<String> {
    inner.operations.push(op);
    inner.fail_on.as_ref().and_then(matches).cloned()
}

#[async_trait::async_trait]
impl StoreConnector for MemoryStore {
    async fn connect(&self, env_name: Option<&str>) -> Result<Box<dyn StateConnection>> {
        let mut inner = self.lock();
        let op = StoreOperation::Connect {
            env: env_name.map(str::to_string),
        };
        let name = env_name.unwrap_or(&inner.env_name).to_string();
        if let Some(reason) = record(&mut inner, op, |f| match f {
            FailOn::Connect(r) => Some(r),
            _ => None,
        }) {
            return Err(CommandError::connection(name, reason));
        }
        if name != inner.env_name {
            return Err(CommandError::connection(name, "unknown environment"));
        }
        if !inner.model.is_bootstrapped() {
            return Err(CommandError::connection(name, "environment is not bootstrapped"));
        }
        drop(inner);
        Ok(self.open())
    }
}

#[async_trait::async_trait]
impl StoreInitializer for MemoryStore {
    async fn initialize(
        &self,
        addrs: &[String],
        env_type: &str,
    ) -> Result<Box<dyn StateConnection>> {
        let mut inner = self.lock();
        let op = StoreOperation::Initialize {
            addrs: addrs.to_vec(),
            env_type: env_type.to_string(),
        };
        if let Some(reason) = record(&mut inner, op, |f| match f {
            FailOn::Initialize(r) => Some(r),
            _ => None,
        }) {
            return Err(CommandError::StoreUnavailable {
                addrs: addrs.to_vec(),
                reason,
            });
        }
        if !addrs.iter().any(|a| !inner.unreachable.contains(a)) {
            return Err(CommandError::StoreUnavailable {
                addrs: addrs.to_vec(),
                reason: "no address is reachable".to_string(),
            });
        }

        let environ = EnvironConfig {
            name: inner.env_name.clone(),
            env_type: env_type.to_string(),
            default_series: inner.default_series.clone(),
        };
        inner.model.initialize(environ);
        drop(inner);
        Ok(self.open())
    }
}

struct MemoryConnection {
    store: MemoryStore,
    closed: AtomicBool,
}

impl MemoryConnection {
    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(CommandError::store("connection is closed"));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl StateConnection for MemoryConnection {
    async fn environ_config(&self) -> Result<EnvironConfig> {
        self.ensure_open()?;
        let mut inner = self.store.lock();
        if let Some(reason) = record(&mut inner, StoreOperation::EnvironConfig, |f| match f {
            FailOn::EnvironConfig(r) => Some(r),
            _ => None,
        }) {
            return Err(CommandError::store(reason));
        }
        inner.model.environ_config()
    }

    async fn publish_charm(
        &self,
        url: &CharmUrl,
        charm: &Charm,
        bump_revision: bool,
    ) -> Result<StoredCharm> {
        self.ensure_open()?;
        let mut inner = self.store.lock();
        let op = StoreOperation::PublishCharm {
            url: url.to_string(),
            bump_revision,
        };
        if let Some(reason) = record(&mut inner, op, |f| match f {
            FailOn::PublishCharm(r) => Some(r),
            _ => None,
        }) {
            return Err(CommandError::store(reason));
        }
        inner.model.publish_charm(url, charm, bump_revision)
    }

    async fn add_service(&self, name: &str, charm: &StoredCharm) -> Result<ServiceRecord> {
        self.ensure_open()?;
        let mut inner = self.store.lock();
        let op = StoreOperation::AddService {
            name: name.to_string(),
            charm_url: charm.url.to_string(),
        };
        if let Some(reason) = record(&mut inner, op, |f| match f {
            FailOn::AddService(r) => Some(r),
            _ => None,
        }) {
            return Err(CommandError::store(reason));
        }
        inner.model.add_service(name, charm)
    }

    async fn add_units(&self, service: &ServiceRecord, count: u32) -> Result<Vec<String>> {
        self.ensure_open()?;
        let mut inner = self.store.lock();
        let op = StoreOperation::AddUnits {
            service: service.name.clone(),
            count,
        };
        if let Some(reason) = record(&mut inner, op, |f| match f {
            FailOn::AddUnits(r) => Some(r),
            _ => None,
        }) {
            return Err(CommandError::store(reason));
        }
        inner.model.add_units(&service.name, count)
    }

    async fn register_bootstrap_machine(&self, instance_id: &str) -> Result<String> {
        self.ensure_open()?;
        let mut inner = self.store.lock();
        let op = StoreOperation::RegisterBootstrapMachine {
            instance_id: instance_id.to_string(),
        };
        if let Some(reason) = record(&mut inner, op, |f| match f {
            FailOn::RegisterMachine(r) => Some(r),
            _ => None,
        }) {
            return Err(CommandError::store(reason));
        }
        inner.model.register_bootstrap_machine(instance_id)
    }

    async fn machine(&self, id: &str) -> Result<MachineRecord> {
        self.ensure_open()?;
        self.store.lock().model.machine(id)
    }

    async fn machines(&self) -> Result<Vec<MachineRecord>> {
        self.ensure_open()?;
        Ok(self.store.lock().model.machines.clone())
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.store.lock().operations.push(StoreOperation::Close);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_requires_bootstrap() {
        let store = MemoryStore::new();
        let err = store.connect(None).await.err().unwrap();
        assert!(matches!(err, CommandError::Connection { .. }));

        let store = MemoryStore::bootstrapped("dummy", "precise");
        let conn = store.connect(None).await.unwrap();
        assert_eq!(conn.environ_config().await.unwrap().default_series(), "precise");
    }

    #[tokio::test]
    async fn test_unknown_environment() {
        let store = MemoryStore::bootstrapped("dummy", "precise");
        let err = store.connect(Some("elsewhere")).await.err().unwrap();
        assert!(err.to_string().contains("unknown environment"));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let store = MemoryStore::bootstrapped("dummy", "precise");
        let conn = store.connect(None).await.unwrap();
        conn.close();
        conn.close();
        assert_eq!(store.close_count(), 1);
        assert!(conn.environ_config().await.is_err());
    }

    #[tokio::test]
    async fn test_initialize_skips_unreachable_addresses() {
        let store = MemoryStore::new();
        store.set_unreachable("a:1");
        let addrs = vec!["a:1".to_string()];
        let err = store.initialize(&addrs, "dummy").await.err().unwrap();
        assert!(matches!(err, CommandError::StoreUnavailable { .. }));

        let addrs = vec!["a:1".to_string(), "b:2".to_string()];
        assert!(store.initialize(&addrs, "dummy").await.is_ok());
        assert!(store.model().is_bootstrapped());
    }

    #[tokio::test]
    async fn test_fail_on_records_operation() {
        let store = MemoryStore::bootstrapped("dummy", "precise");
        store.fail_on(FailOn::RegisterMachine("boom".to_string()));
        let conn = store.connect(None).await.unwrap();
        let err = conn.register_bootstrap_machine("i-1").await.unwrap_err();
        assert_eq!(err.to_string(), "state error: boom");
        assert!(store.model().machines.is_empty());
        assert_eq!(store.mutation_count(), 1);
    }
}
