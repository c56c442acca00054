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

/// State store endpoints
pub const DEFAULT_STATE_ADDR: &str = "127.0.0.1:2181";
pub const STATE_FILE_EXTENSION: &str = "json";

/// Charm URL schemas
pub const SCHEMA_CHARM_STORE: &str = "cs";
pub const SCHEMA_LOCAL: &str = "local";

/// Series used when neither the charm URL nor the environment names one
pub const DEFAULT_SERIES: &str = "precise";

/// Charm directory layout
pub const CHARM_METADATA_FILE: &str = "metadata.yaml";
pub const CHARM_REVISION_FILE: &str = "revision";

/// Environment variables
pub const ENV_CHARM_REPOSITORY: &str = "CHARM_REPOSITORY";
pub const ENV_CHARMCTL_HOME: &str = "CHARMCTL_HOME";
pub const ENV_HOME: &str = "HOME";

/// Files under the charmctl home directory
pub const HOME_DIR_NAME: &str = ".charmctl";
pub const ENVIRONMENTS_FILE: &str = "environments.toml";
pub const STATE_DIR_NAME: &str = "state";

/// Machine ids
pub const BOOTSTRAP_MACHINE_ID: &str = "0";

/// Upper bound on units created by a single request
pub const MAX_UNITS_PER_REQUEST: u32 = 1000;
