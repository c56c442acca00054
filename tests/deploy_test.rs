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

#[cfg(test)]
mod tests {
    use charmctl::cli::BufferSink;
    use charmctl::*;
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    fn write_charm(root: &Path, series_dir: &str, name: &str, revision: u32, subordinate: bool) {
        let dir = root.join(series_dir).join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("metadata.yaml"),
            format!(
                "name: {}\nsummary: test charm\nsubordinate: {}\n",
                name, subordinate
            ),
        )
        .unwrap();
        fs::write(dir.join("revision"), format!("{}\n", revision)).unwrap();
    }

    fn read_revision(root: &Path, series_dir: &str, name: &str) -> String {
        fs::read_to_string(root.join(series_dir).join(name).join("revision"))
            .unwrap()
            .trim()
            .to_string()
    }

    struct Fixture {
        store: MemoryStore,
        mirror: tempfile::TempDir,
        repo: tempfile::TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            let fixture = Self {
                store: MemoryStore::bootstrapped("dummy", "precise"),
                mirror: tempfile::tempdir().unwrap(),
                repo: tempfile::tempdir().unwrap(),
            };
            write_charm(fixture.mirror.path(), "precise", "mysql", 7, false);
            write_charm(fixture.repo.path(), "precise", "mysql", 1, false);
            write_charm(fixture.repo.path(), "precise", "logging", 3, true);
            fixture
        }

        fn resolver(&self) -> DefaultRepositoryResolver {
            DefaultRepositoryResolver::new(Some(self.mirror.path().to_path_buf()))
        }

        fn intent(&self, charm: &str) -> DeployIntent {
            DeployIntent {
                env_name: None,
                charm_name: charm.to_string(),
                service_name: None,
                num_units: 1,
                bump_revision: false,
                config_path: None,
                repo_path: Some(self.repo.path().to_path_buf()),
            }
        }

        async fn run(&self, intent: &DeployIntent) -> Result<DeployReport> {
            let resolver = self.resolver();
            DeployWorkflow::new(&self.store, &resolver).run(intent).await
        }

        fn command(&self) -> DeployCommand {
            DeployCommand::new(
                ResolveDefaults {
                    repository: Some(self.repo.path().to_path_buf()),
                },
                Arc::new(self.store.clone()),
                Arc::new(self.resolver()),
            )
        }
    }

    fn args(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_deploy_store_charm_with_defaults() {
        let fx = Fixture::new();
        let report = fx.run(&fx.intent("mysql")).await.unwrap();

        assert_eq!(report.charm_url.to_string(), "cs:precise/mysql-7");
        assert_eq!(report.charm_url.unversioned().to_string(), "cs:precise/mysql");
        assert_eq!(report.service, "mysql");
        assert_eq!(report.units, vec!["mysql/0"]);
        assert!(!report.subordinate);

        assert_eq!(fx.store.add_units_calls(), vec![("mysql".to_string(), 1)]);
        let model = fx.store.model();
        assert!(model.services.contains_key("mysql"));
        assert_eq!(model.units_of("mysql").len(), 1);
        assert_eq!(fx.store.close_count(), 1);
    }

    #[tokio::test]
    async fn test_deploy_local_charm_with_service_name_and_units() {
        let fx = Fixture::new();
        let cmd = fx.command();
        let intent = cmd
            .resolve(&args(&["local:mysql", "myservice", "-n", "3"]))
            .unwrap();

        let sink = Arc::new(BufferSink::new());
        let ctx = CommandContext::new(fx.repo.path(), sink.clone());
        cmd.execute(intent, &ctx).await.unwrap();

        assert_eq!(fx.store.add_units_calls(), vec![("myservice".to_string(), 3)]);
        let model = fx.store.model();
        let service = &model.services["myservice"];
        assert_eq!(service.charm_url.to_string(), "local:precise/mysql-1");
        assert_eq!(
            model
                .units_of("myservice")
                .iter()
                .map(|u| u.name.as_str())
                .collect::<Vec<_>>(),
            vec!["myservice/0", "myservice/1", "myservice/2"]
        );
        assert!(sink.contents().contains("myservice/2"));
        assert_eq!(fx.store.close_count(), 1);
    }

    #[tokio::test]
    async fn test_repository_path_resolved_against_work_dir() {
        let fx = Fixture::new();
        let cmd = DeployCommand::new(
            ResolveDefaults::default(),
            Arc::new(fx.store.clone()),
            Arc::new(fx.resolver()),
        );
        let parent = fx.repo.path().parent().unwrap().to_path_buf();
        let relative = fx.repo.path().file_name().unwrap().to_str().unwrap().to_string();
        let intent = cmd
            .resolve(&args(&["local:mysql", "--repository", &relative]))
            .unwrap();
        assert_eq!(intent.repo_path, Some(PathBuf::from(&relative)));

        let ctx = CommandContext::new(parent, Arc::new(BufferSink::new()));
        cmd.execute(intent, &ctx).await.unwrap();
        assert!(fx.store.model().services.contains_key("mysql"));
    }

    #[tokio::test]
    async fn test_subordinate_charm_creates_no_units() {
        let fx = Fixture::new();
        let mut intent = fx.intent("local:logging");
        intent.num_units = 5;
        let report = fx.run(&intent).await.unwrap();

        assert!(report.subordinate);
        assert!(report.units.is_empty());
        assert!(fx.store.add_units_calls().is_empty());
        assert!(fx.store.model().services["logging"].subordinate);
        assert_eq!(fx.store.close_count(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_service() {
        let fx = Fixture::new();
        fx.run(&fx.intent("mysql")).await.unwrap();

        let err = fx.run(&fx.intent("local:mysql")).await.unwrap_err();
        assert_eq!(err.phase(), Some(Phase::ServiceCreating));
        assert!(matches!(err.root(), CommandError::DuplicateService(name) if name == "mysql"));
        assert_eq!(fx.store.add_units_calls().len(), 1);
        assert_eq!(fx.store.close_count(), 2);
    }

    #[tokio::test]
    async fn test_connect_failure_touches_nothing() {
        let fx = Fixture::new();
        fx.store.fail_on(FailOn::Connect("connection refused".to_string()));

        let err = fx.run(&fx.intent("mysql")).await.unwrap_err();
        assert_eq!(err.phase(), Some(Phase::Connecting));
        assert!(matches!(err.root(), CommandError::Connection { .. }));
        assert_eq!(fx.store.mutation_count(), 0);
        assert_eq!(fx.store.close_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_environment() {
        let fx = Fixture::new();
        let mut intent = fx.intent("mysql");
        intent.env_name = Some("elsewhere".to_string());

        let err = fx.run(&intent).await.unwrap_err();
        assert!(matches!(err.root(), CommandError::Connection { .. }));
        assert_eq!(fx.store.mutation_count(), 0);
    }

    #[tokio::test]
    async fn test_resolution_failures_leave_store_untouched() {
        let fx = Fixture::new();

        let err = fx.run(&fx.intent("cs:~user/a/b/c")).await.unwrap_err();
        assert_eq!(err.phase(), Some(Phase::CharmResolving));
        assert!(matches!(
            err.root(),
            CommandError::AmbiguousCharm(_) | CommandError::InvalidCharmName(_)
        ));

        let err = fx.run(&fx.intent("local:postgresql")).await.unwrap_err();
        assert!(matches!(err.root(), CommandError::CharmNotFound { .. }));

        let mut intent = fx.intent("local:mysql");
        intent.repo_path = Some(fx.repo.path().join("missing"));
        let err = fx.run(&intent).await.unwrap_err();
        assert!(matches!(err.root(), CommandError::RepositoryNotFound { .. }));

        assert_eq!(fx.store.mutation_count(), 0);
        assert_eq!(fx.store.close_count(), 3);
    }

    #[tokio::test]
    async fn test_partial_deploy_keeps_service() {
        let fx = Fixture::new();
        fx.store.fail_on(FailOn::AddUnits("machine quota exceeded".to_string()));
        let mut intent = fx.intent("mysql");
        intent.num_units = 4;

        let err = fx.run(&intent).await.unwrap_err();
        assert!(err.is_partial());
        assert_eq!(err.phase(), Some(Phase::UnitsCreating));
        match err {
            CommandError::PartialDeploy {
                ref service,
                requested,
                ref reason,
            } => {
                assert_eq!(service, "mysql");
                assert_eq!(requested, 4);
                assert!(reason.contains("machine quota exceeded"));
            }
            ref other => panic!("unexpected error: {}", other),
        }

        assert!(fx.store.model().services.contains_key("mysql"));
        assert_eq!(fx.store.add_units_calls(), vec![("mysql".to_string(), 4)]);
        assert_eq!(fx.store.close_count(), 1);

        fx.store.clear_failure();
        intent.service_name = Some("replica".to_string());
        let report = fx.run(&intent).await.unwrap();
        assert_eq!(report.units.len(), 4);
    }

    #[tokio::test]
    async fn test_partial_deploy_is_reported_to_output() {
        let fx = Fixture::new();
        fx.store.fail_on(FailOn::AddUnits("machine quota exceeded".to_string()));
        let cmd = fx.command();
        let intent = cmd.resolve(&args(&["mysql", "-n", "2"])).unwrap();

        let sink = Arc::new(BufferSink::new());
        let ctx = CommandContext::new(fx.repo.path(), sink.clone());
        let err = cmd.execute(intent, &ctx).await.unwrap_err();
        assert!(err.is_partial());
        assert!(sink.contents().contains("0/2"));
    }

    #[tokio::test]
    async fn test_config_file_not_implemented() {
        let fx = Fixture::new();
        let mut intent = fx.intent("mysql");
        intent.config_path = Some(fx.repo.path().join("service.yaml"));

        let err = fx.run(&intent).await.unwrap_err();
        assert!(matches!(err, CommandError::NotImplemented(_)));
        assert!(fx.store.model().services.is_empty());
        assert!(fx.store.add_units_calls().is_empty());
        assert_eq!(fx.store.close_count(), 1);
    }

    #[tokio::test]
    async fn test_bump_revision_updates_local_charm() {
        let fx = Fixture::new();
        let mut intent = fx.intent("local:mysql");
        intent.service_name = Some("first".to_string());
        let report = fx.run(&intent).await.unwrap();
        assert_eq!(report.charm_url.to_string(), "local:precise/mysql-1");

        intent.service_name = Some("second".to_string());
        intent.bump_revision = true;
        let report = fx.run(&intent).await.unwrap();
        assert_eq!(report.charm_url.to_string(), "local:precise/mysql-2");
        assert_eq!(read_revision(fx.repo.path(), "precise", "mysql"), "2");

        let model = fx.store.model();
        assert!(model.charms.contains_key("local:precise/mysql-1"));
        assert!(model.charms.contains_key("local:precise/mysql-2"));
    }

    #[tokio::test]
    async fn test_bump_revision_rejected_for_store_charm() {
        let fx = Fixture::new();
        let mut intent = fx.intent("mysql");
        fx.run(&intent).await.unwrap();

        intent.service_name = Some("second".to_string());
        intent.bump_revision = true;
        let err = fx.run(&intent).await.unwrap_err();
        assert_eq!(err.phase(), Some(Phase::CharmPublishing));
        assert!(matches!(err.root(), CommandError::Argument(msg) if msg.contains("cannot increment revision")));

        let model = fx.store.model();
        assert_eq!(model.charms.keys().collect::<Vec<_>>(), vec!["cs:precise/mysql-7"]);
        assert!(!model.services.contains_key("second"));
        assert_eq!(read_revision(fx.mirror.path(), "precise", "mysql"), "7");
    }

    #[tokio::test]
    async fn test_publish_reuses_existing_charm() {
        let fx = Fixture::new();
        let mut intent = fx.intent("mysql");
        fx.run(&intent).await.unwrap();

        intent.service_name = Some("replica".to_string());
        let report = fx.run(&intent).await.unwrap();
        assert_eq!(report.charm_url.to_string(), "cs:precise/mysql-7");
        assert_eq!(fx.store.model().charms.len(), 1);
    }

    #[tokio::test]
    async fn test_owner_scoped_store_charm() {
        let fx = Fixture::new();
        write_charm(fx.mirror.path(), "~alice/precise", "wordpress", 2, false);

        let report = fx.run(&fx.intent("~alice/wordpress")).await.unwrap();
        assert_eq!(report.charm_url.to_string(), "cs:~alice/precise/wordpress-2");
        assert_eq!(report.service, "wordpress");
    }

    #[tokio::test]
    async fn test_explicit_revision() {
        let fx = Fixture::new();
        let report = fx.run(&fx.intent("mysql-7")).await.unwrap();
        assert_eq!(report.charm_url.to_string(), "cs:precise/mysql-7");

        let err = fx.run(&fx.intent("mysql-9")).await.unwrap_err();
        assert!(matches!(err.root(), CommandError::CharmNotFound { .. }));
    }
}
