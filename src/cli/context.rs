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

//! Execution context handed to commands

use crate::shared::error::Result;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Destination for informational output.
pub trait OutputSink: Send + Sync {
    fn info(&self, message: &str);
}

#[derive(Debug, Default)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn info(&self, message: &str) {
        println!("{}", message);
    }
}

/// Collects output in memory.
#[derive(Debug, Default)]
pub struct BufferSink {
    lines: Mutex<Vec<String>>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn contents(&self) -> String {
        self.lines().join("\n")
    }
}

impl OutputSink for BufferSink {
    fn info(&self, message: &str) {
        self.lines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(message.to_string());
    }
}

#[derive(Clone)]
pub struct CommandContext {
    work_dir: PathBuf,
    output: Arc<dyn OutputSink>,
}

impl CommandContext {
    pub fn new(work_dir: impl Into<PathBuf>, output: Arc<dyn OutputSink>) -> Self {
        Self {
            work_dir: work_dir.into(),
            output,
        }
    }

    /// Context rooted at the process working directory, printing to stdout.
    pub fn current() -> Result<Self> {
        Ok(Self::new(std::env::current_dir()?, Arc::new(StdoutSink)))
    }

    /// Resolves `path` against the working directory.
    pub fn abs_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.work_dir.join(path)
        }
    }

    pub fn info(&self, message: &str) {
        self.output.info(message);
    }
}
