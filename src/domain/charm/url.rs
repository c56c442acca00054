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

//! Charm URLs: `schema:[~user/]series/name[-revision]`

use crate::infrastructure::constants::{SCHEMA_CHARM_STORE, SCHEMA_LOCAL};
use crate::shared::error::{CommandError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Schema {
    #[serde(rename = "cs")]
    CharmStore,
    #[serde(rename = "local")]
    Local,
}

impl Schema {
    pub fn as_str(&self) -> &'static str {
        match self {
            Schema::CharmStore => SCHEMA_CHARM_STORE,
            Schema::Local => SCHEMA_LOCAL,
        }
    }
}

impl FromStr for Schema {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            SCHEMA_CHARM_STORE => Ok(Schema::CharmStore),
            SCHEMA_LOCAL => Ok(Schema::Local),
            _ => Err(CommandError::InvalidCharmName(format!(
                "charm URL has invalid schema: {:?}",
                s
            ))),
        }
    }
}

/// A fully-qualified charm reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CharmUrl {
    pub schema: Schema,
    pub user: Option<String>,
    pub series: String,
    pub name: String,
    pub revision: Option<u32>,
}

fn user_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-zA-Z0-9+.-]+$").expect("valid user regex"))
}

fn series_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z]+([a-z-]+[a-z])?$").expect("valid series regex"))
}

fn name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[a-z][a-z0-9]*(-[a-z0-9]*[a-z][a-z0-9]*)*$").expect("valid name regex")
    })
}

pub fn is_valid_series(series: &str) -> bool {
    series_regex().is_match(series)
}

pub fn is_valid_name(name: &str) -> bool {
    name_regex().is_match(name)
}

impl CharmUrl {
    /// Parses a complete charm URL. The schema and series must both be present.
    pub fn parse(url: &str) -> Result<Self> {
        let invalid = |what: &str| {
            CommandError::InvalidCharmName(format!("charm URL has invalid {}: {:?}", what, url))
        };

        let (schema, rest) = url
            .split_once(':')
            .ok_or_else(|| CommandError::InvalidCharmName(format!("charm URL has no schema: {:?}", url)))?;
        let schema: Schema = schema.parse()?;

        let mut parts: Vec<&str> = rest.split('/').collect();
        let user = if parts.first().is_some_and(|p| p.starts_with('~')) {
            let user = &parts.remove(0)[1..];
            if !user_regex().is_match(user) {
                return Err(CommandError::InvalidCharmName(format!(
                    "charm URL has invalid user name: {:?}",
                    url
                )));
            }
            if schema == Schema::Local {
                return Err(CommandError::InvalidCharmName(format!(
                    "local charm URL with user name: {:?}",
                    url
                )));
            }
            Some(user.to_string())
        } else {
            None
        };

        if parts.len() != 2 {
            return Err(CommandError::InvalidCharmName(format!(
                "charm URL has invalid form: {:?}",
                url
            )));
        }

        let series = parts[0];
        if !is_valid_series(series) {
            return Err(invalid("series"));
        }

        let (name, revision) = split_revision(parts[1]);
        if !is_valid_name(name) {
            return Err(invalid("charm name"));
        }

        Ok(Self {
            schema,
            user,
            series: series.to_string(),
            name: name.to_string(),
            revision,
        })
    }

    /// Expands an abbreviated charm identifier into a full URL, filling in
    /// the `cs` schema and `default_series` where they are omitted.
    pub fn infer(src: &str, default_series: &str) -> Result<Self> {
        if src.trim().is_empty() {
            return Err(CommandError::InvalidCharmName(
                "charm name must not be empty".to_string(),
            ));
        }
        if let Ok(url) = Self::parse(src) {
            return Ok(url);
        }

        let (schema, path) = match src.split_once(':') {
            Some((schema, path)) => (schema, path),
            None => (SCHEMA_CHARM_STORE, src),
        };

        let parts: Vec<&str> = path.split('/').collect();
        let has_user = parts[0].starts_with('~');
        let full = match (parts.len(), has_user) {
            (1, _) => format!("{}:{}/{}", schema, default_series, path),
            (2, true) => format!("{}:{}/{}/{}", schema, parts[0], default_series, parts[1]),
            (2, false) | (3, true) => format!("{}:{}", schema, path),
            _ => {
                return Err(CommandError::AmbiguousCharm(format!(
                    "cannot infer charm URL from {:?}: expected [~user/][series/]name",
                    src
                )))
            }
        };

        Self::parse(&full).map_err(|e| match e {
            CommandError::InvalidCharmName(msg) if full != src => CommandError::InvalidCharmName(
                format!("{} (URL inferred from {:?})", msg, src),
            ),
            other => other,
        })
    }

    pub fn with_revision(&self, revision: u32) -> Self {
        Self {
            revision: Some(revision),
            ..self.clone()
        }
    }

    /// The same charm with no revision pinned.
    pub fn unversioned(&self) -> Self {
        Self {
            revision: None,
            ..self.clone()
        }
    }

    pub fn is_local(&self) -> bool {
        self.schema == Schema::Local
    }
}

/// Splits a trailing `-<integer>` off a charm name.
fn split_revision(name: &str) -> (&str, Option<u32>) {
    if let Some((base, rev)) = name.rsplit_once('-') {
        if !rev.is_empty() && rev.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(rev) = rev.parse::<u32>() {
                return (base, Some(rev));
            }
        }
    }
    (name, None)
}

impl fmt::Display for CharmUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.schema.as_str())?;
        if let Some(ref user) = self.user {
            write!(f, "~{}/", user)?;
        }
        write!(f, "{}/{}", self.series, self.name)?;
        if let Some(rev) = self.revision {
            write!(f, "-{}", rev)?;
        }
        Ok(())
    }
}

impl FromStr for CharmUrl {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
