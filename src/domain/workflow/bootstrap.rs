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

use crate::infrastructure::state::{ConnectionGuard, StoreInitializer};
use crate::shared::error::{Phase, Result};
use tracing::{debug, info};

/// Validated `bootstrap` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapIntent {
    pub state_addrs: Vec<String>,
    pub instance_id: String,
    pub env_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapReport {
    pub machine_id: String,
    pub instance_id: String,
    pub env_type: String,
    pub state_addrs: Vec<String>,
}

pub struct BootstrapWorkflow<'a> {
    initializer: &'a dyn StoreInitializer,
}

impl<'a> BootstrapWorkflow<'a> {
    pub fn new(initializer: &'a dyn StoreInitializer) -> Self {
        Self { initializer }
    }

    pub async fn run(&self, intent: &BootstrapIntent) -> Result<BootstrapReport> {
        debug!(addrs = ?intent.state_addrs, env_type = %intent.env_type, "bootstrap: initializing state");
        let conn = ConnectionGuard::new(
            self.initializer
                .initialize(&intent.state_addrs, &intent.env_type)
                .await
                .map_err(|e| e.in_phase(Phase::StoreInitializing))?,
        );

        let machine_id = conn
            .register_bootstrap_machine(&intent.instance_id)
            .await
            .map_err(|e| e.in_phase(Phase::MachineRegistering))?;

        info!(machine = %machine_id, instance = %intent.instance_id, "registered bootstrap machine");
        Ok(BootstrapReport {
            machine_id,
            instance_id: intent.instance_id.clone(),
            env_type: intent.env_type.clone(),
            state_addrs: intent.state_addrs.clone(),
        })
    }
}
