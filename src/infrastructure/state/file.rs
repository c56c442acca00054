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

//! JSON-file state store. Each store address maps to one state file under
//! the state directory, so separate invocations see each other's changes.

use super::model::{EnvironConfig, MachineRecord, ServiceRecord, StateModel, StoredCharm};
use super::{StateConnection, StoreConnector, StoreInitializer};
use crate::domain::charm::{Charm, CharmUrl};
use crate::domain::config::EnvironmentsConfig;
use crate::infrastructure::constants::{DEFAULT_SERIES, STATE_FILE_EXTENSION};
use crate::shared::error::{CommandError, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct FileStore {
    state_dir: PathBuf,
    environments: EnvironmentsConfig,
}

impl FileStore {
    pub fn new(state_dir: impl Into<PathBuf>, environments: EnvironmentsConfig) -> Self {
        Self {
            state_dir: state_dir.into(),
            environments,
        }
    }

    /// State file for a `host:port` address.
    pub fn state_path(&self, addr: &str) -> Result<PathBuf> {
        let (host, port) = addr
            .rsplit_once(':')
            .ok_or_else(|| CommandError::store(format!("invalid state address {:?}", addr)))?;
        if host.is_empty() {
            return Err(CommandError::store(format!("invalid state address {:?}", addr)));
        }
        let port: u16 = port
            .parse()
            .map_err(|_| CommandError::store(format!("invalid port in state address {:?}", addr)))?;
        let host: String = host
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
            .collect();
        Ok(self
            .state_dir
            .join(format!("{}_{}.{}", host, port, STATE_FILE_EXTENSION)))
    }
}

fn load_model(path: &Path) -> Result<StateModel> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(serde_json::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StateModel::default()),
        Err(e) => Err(e.into()),
    }
}

fn save_model(path: &Path, model: &StateModel) -> Result<()> {
    let tmp = path.with_extension(format!("{}.tmp", STATE_FILE_EXTENSION));
    fs::write(&tmp, serde_json::to_string_pretty(model)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// OS-level lock on `<state file>.lock`, released on drop.
struct StateLock {
    file: File,
}

impl StateLock {
    fn acquire(state_path: &Path, exclusive: bool) -> Result<Self> {
        let lock_path = state_path.with_extension(format!("{}.lock", STATE_FILE_EXTENSION));
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)?;
        if exclusive {
            FileExt::lock_exclusive(&file)?;
        } else {
            FileExt::lock_shared(&file)?;
        }
        Ok(Self { file })
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// Loads the state file, applies `f` and saves the result, all under an
/// exclusive lock. Nothing is written when `f` fails.
fn update_model<T>(path: &Path, f: impl FnOnce(&mut StateModel) -> Result<T>) -> Result<T> {
    let _lock = StateLock::acquire(path, true)?;
    let mut model = load_model(path)?;
    let out = f(&mut model)?;
    save_model(path, &model)?;
    Ok(out)
}

fn read_model(path: &Path) -> Result<StateModel> {
    let _lock = StateLock::acquire(path, false)?;
    load_model(path)
}

#[async_trait::async_trait]
impl StoreConnector for FileStore {
    async fn connect(&self, env_name: Option<&str>) -> Result<Box<dyn StateConnection>> {
        let (name, env) = self.environments.select(env_name).map_err(|e| {
            CommandError::connection(env_name.unwrap_or("<default>"), e.to_string())
        })?;

        for addr in &env.state_servers {
            let path = match self.state_path(addr) {
                Ok(path) => path,
                Err(e) => {
                    warn!(addr = %addr, error = %e, "skipping state server");
                    continue;
                }
            };
            if !path.is_file() {
                continue;
            }
            let model = read_model(&path).map_err(|e| CommandError::connection(name, e))?;
            if !model.is_bootstrapped() {
                continue;
            }
            debug!(env = name, addr = %addr, "connected to state");
            return Ok(Box::new(FileConnection {
                path,
                overlay: Some((name.to_string(), env.default_series.clone())),
                closed: AtomicBool::new(false),
            }));
        }

        Err(CommandError::connection(
            name,
            "environment is not bootstrapped",
        ))
    }
}

#[async_trait::async_trait]
impl StoreInitializer for FileStore {
    async fn initialize(
        &self,
        addrs: &[String],
        env_type: &str,
    ) -> Result<Box<dyn StateConnection>> {
        let unavailable = |reason: String| CommandError::StoreUnavailable {
            addrs: addrs.to_vec(),
            reason,
        };
        fs::create_dir_all(&self.state_dir).map_err(|e| {
            unavailable(format!("cannot create {}: {}", self.state_dir.display(), e))
        })?;

        for addr in addrs {
            let path = match self.state_path(addr) {
                Ok(path) => path,
                Err(e) => {
                    warn!(addr = %addr, error = %e, "skipping state server");
                    continue;
                }
            };

            let (name, default_series) = match self.environments.find_by_addr(addr) {
                Some((name, env)) => (name.to_string(), env.default_series.clone()),
                None => (env_type.to_string(), DEFAULT_SERIES.to_string()),
            };
            let environ = EnvironConfig {
                name,
                env_type: env_type.to_string(),
                default_series,
            };
            if let Err(e) = update_model(&path, |model| {
                model.initialize(environ);
                Ok(())
            }) {
                warn!(addr = %addr, path = %path.display(), error = %e, "skipping state server");
                continue;
            }

            debug!(addr = %addr, path = %path.display(), "attached to state");
            return Ok(Box::new(FileConnection {
                path,
                overlay: None,
                closed: AtomicBool::new(false),
            }));
        }

        Err(unavailable("no address is reachable".to_string()))
    }
}

/// Every call re-reads the state file, so concurrent connections see each
/// other's changes.
struct FileConnection {
    path: PathBuf,
    /// Environment name and default series from `environments.toml`
    overlay: Option<(String, String)>,
    closed: AtomicBool,
}

impl FileConnection {
    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(CommandError::store("connection is closed"));
        }
        Ok(())
    }

    fn read(&self) -> Result<StateModel> {
        self.ensure_open()?;
        read_model(&self.path)
    }

    fn mutate<T>(&self, f: impl FnOnce(&mut StateModel) -> Result<T>) -> Result<T> {
        self.ensure_open()?;
        update_model(&self.path, f)
    }
}

#[async_trait::async_trait]
impl StateConnection for FileConnection {
    async fn environ_config(&self) -> Result<EnvironConfig> {
        let mut config = self.read()?.environ_config()?;
        if let Some((ref name, ref series)) = self.overlay {
            config.name = name.clone();
            config.default_series = series.clone();
        }
        Ok(config)
    }

    async fn publish_charm(
        &self,
        url: &CharmUrl,
        charm: &Charm,
        bump_revision: bool,
    ) -> Result<StoredCharm> {
        self.mutate(|m| m.publish_charm(url, charm, bump_revision))
    }

    async fn add_service(&self, name: &str, charm: &StoredCharm) -> Result<ServiceRecord> {
        self.mutate(|m| m.add_service(name, charm))
    }

    async fn add_units(&self, service: &ServiceRecord, count: u32) -> Result<Vec<String>> {
        self.mutate(|m| m.add_units(&service.name, count))
    }

    async fn register_bootstrap_machine(&self, instance_id: &str) -> Result<String> {
        self.mutate(|m| m.register_bootstrap_machine(instance_id))
    }

    async fn machine(&self, id: &str) -> Result<MachineRecord> {
        self.read()?.machine(id)
    }

    async fn machines(&self) -> Result<Vec<MachineRecord>> {
        Ok(self.read()?.machines)
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::EnvironmentEntry;

    fn environments(addr: &str) -> EnvironmentsConfig {
        let mut entry = EnvironmentEntry::new("dummy");
        entry.default_series = "quantal".to_string();
        entry.state_servers = vec![addr.to_string()];
        let mut conf = EnvironmentsConfig::default();
        conf.environments.insert("sample".to_string(), entry);
        conf
    }

    #[test]
    fn test_state_path() {
        let store = FileStore::new("/tmp/state", EnvironmentsConfig::default());
        assert_eq!(
            store.state_path("127.0.0.1:2181").unwrap(),
            PathBuf::from("/tmp/state/127.0.0.1_2181.json")
        );
        assert!(store.state_path("no-port").is_err());
        assert!(store.state_path(":2181").is_err());
        assert!(store.state_path("host:99999").is_err());
    }

    #[tokio::test]
    async fn test_state_survives_reconnect() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path(), environments("127.0.0.1:2181"));

        let conn = store
            .initialize(&["127.0.0.1:2181".to_string()], "dummy")
            .await
            .unwrap();
        let id = conn.register_bootstrap_machine("i-42").await.unwrap();
        conn.close();

        let conn = store.connect(Some("sample")).await.unwrap();
        assert_eq!(conn.machine(&id).await.unwrap().instance_id, "i-42");
        let config = conn.environ_config().await.unwrap();
        assert_eq!(config.name, "sample");
        assert_eq!(config.default_series, "quantal");
        assert_eq!(config.env_type, "dummy");
    }

    #[tokio::test]
    async fn test_connect_before_bootstrap_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path(), environments("127.0.0.1:2181"));
        let err = store.connect(None).await.err().unwrap();
        assert!(matches!(err, CommandError::Connection { .. }));
    }

    #[tokio::test]
    async fn test_initialize_without_valid_address() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path(), EnvironmentsConfig::default());
        let err = store
            .initialize(&["nonsense".to_string()], "dummy")
            .await
            .err()
            .unwrap();
        assert!(matches!(err, CommandError::StoreUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_failed_mutation_is_not_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path(), environments("127.0.0.1:2181"));
        let conn = store
            .initialize(&["127.0.0.1:2181".to_string()], "dummy")
            .await
            .unwrap();
        conn.register_bootstrap_machine("i-1").await.unwrap();
        assert!(conn.register_bootstrap_machine("i-2").await.is_err());
        assert_eq!(conn.machines().await.unwrap().len(), 1);

        let on_disk = load_model(&store.state_path("127.0.0.1:2181").unwrap()).unwrap();
        assert_eq!(on_disk.machines.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_connections_see_each_other() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path(), environments("127.0.0.1:2181"));
        store
            .initialize(&["127.0.0.1:2181".to_string()], "dummy")
            .await
            .unwrap()
            .close();

        let url = CharmUrl::parse("local:precise/mysql-1").unwrap();
        let charm = Charm::new(
            crate::domain::charm::CharmMeta::from_yaml("name: mysql\n").unwrap(),
            1,
        );

        let first = store.connect(None).await.unwrap();
        let second = store.connect(None).await.unwrap();
        let stored = second.publish_charm(&url, &charm, false).await.unwrap();
        second.add_service("b", &stored).await.unwrap();
        first.add_service("a", &stored).await.unwrap();

        let third = store.connect(None).await.unwrap();
        let err = third.add_service("b", &stored).await.unwrap_err();
        assert!(matches!(err, CommandError::DuplicateService(ref name) if name == "b"));

        let on_disk = load_model(&store.state_path("127.0.0.1:2181").unwrap()).unwrap();
        assert!(on_disk.services.contains_key("a"));
        assert!(on_disk.services.contains_key("b"));
    }

    #[tokio::test]
    async fn test_second_bootstrap_through_another_connection() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path(), environments("127.0.0.1:2181"));
        let addrs = ["127.0.0.1:2181".to_string()];
        let first = store.initialize(&addrs, "dummy").await.unwrap();
        let second = store.initialize(&addrs, "dummy").await.unwrap();

        first.register_bootstrap_machine("i-1").await.unwrap();
        let err = second.register_bootstrap_machine("i-2").await.unwrap_err();
        assert!(matches!(err, CommandError::DuplicateBootstrap { .. }));
        assert_eq!(second.machines().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_initialize_skips_corrupt_state_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path(), EnvironmentsConfig::default());
        fs::write(store.state_path("st1:2181").unwrap(), "{ not json").unwrap();

        let addrs = ["st1:2181".to_string(), "st2:2181".to_string()];
        let conn = store.initialize(&addrs, "dummy").await.unwrap();
        conn.register_bootstrap_machine("i-1").await.unwrap();

        let on_disk = load_model(&store.state_path("st2:2181").unwrap()).unwrap();
        assert_eq!(on_disk.machines.len(), 1);
    }
}
