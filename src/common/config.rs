// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.
use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

static CONFIG: OnceLock<RiptideConfig> = OnceLock::new();

fn default_log_level() -> String {
    "info".to_string()
}

pub fn init_from_path(path: impl AsRef<Path>) -> Result<&'static RiptideConfig> {
    if let Some(cfg) = CONFIG.get() {
        return Ok(cfg);
    }
    let path = path.as_ref().to_path_buf();
    let cfg = RiptideConfig::load_from_file(&path)?;
    let _ = CONFIG.set(cfg);
    Ok(CONFIG.get().expect("CONFIG set"))
}

pub fn init_from_env_or_default() -> Result<&'static RiptideConfig> {
    if let Some(cfg) = CONFIG.get() {
        return Ok(cfg);
    }
    let path = config_path_from_env_or_default()?;
    let cfg = RiptideConfig::load_from_file(&path)?;
    let _ = CONFIG.set(cfg);
    Ok(CONFIG.get().expect("CONFIG set"))
}

pub fn config() -> Result<&'static RiptideConfig> {
    init_from_env_or_default()
}

fn config_path_from_env_or_default() -> Result<PathBuf> {
    if let Ok(p) = std::env::var("RIPTIDE_CONFIG") {
        if !p.trim().is_empty() {
            return Ok(PathBuf::from(p));
        }
    }

    let candidates = [PathBuf::from("riptide.toml")];
    for p in candidates {
        if p.exists() {
            return Ok(p);
        }
    }

    Err(anyhow!(
        "missing config file: set $RIPTIDE_CONFIG or create ./riptide.toml"
    ))
}

#[derive(Clone, Deserialize)]
pub struct RiptideConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Optional full tracing EnvFilter expression.
    /// If set, this takes precedence over `log_level`.
    /// Example: "riptide=debug"
    #[serde(default)]
    pub log_filter: Option<String>,

    #[serde(default)]
    pub compute: ComputeConfig,
}

impl RiptideConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read config file: {}", path.display()))?;
        let cfg: RiptideConfig =
            toml::from_str(&s).with_context(|| format!("parse toml: {}", path.display()))?;
        Ok(cfg)
    }

    /// Directive string handed to the logging layer.
    pub fn log_directive(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(&self.log_level)
    }
}

impl Default for RiptideConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_filter: None,
            compute: ComputeConfig::default(),
        }
    }
}

#[derive(Clone, Deserialize)]
pub struct ComputeConfig {
    /// Byte budget for aggregation state across the process, enforced by the
    /// process memory tracker. Negative means unlimited.
    #[serde(default = "default_mem_limit_bytes")]
    pub mem_limit_bytes: i64,
}

fn default_mem_limit_bytes() -> i64 {
    -1
}

impl Default for ComputeConfig {
    fn default() -> Self {
        Self {
            mem_limit_bytes: default_mem_limit_bytes(),
        }
    }
}

pub(crate) fn compute_mem_limit_bytes() -> i64 {
    config()
        .ok()
        .map(|c| c.compute.mem_limit_bytes)
        .unwrap_or(-1)
}

#[cfg(test)]
mod tests {
    use super::RiptideConfig;

    #[test]
    fn test_log_level_default_is_info() {
        let cfg: RiptideConfig = toml::from_str(
            r#"
[compute]
"#,
        )
        .expect("parse config");
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.log_directive(), "info");
    }

    #[test]
    fn test_log_filter_takes_precedence() {
        let cfg: RiptideConfig = toml::from_str(
            r#"
log_level = "warn"
log_filter = "riptide=debug"
"#,
        )
        .expect("parse config");
        assert_eq!(cfg.log_directive(), "riptide=debug");
    }

    #[test]
    fn test_compute_mem_limit_default_is_unlimited() {
        let cfg: RiptideConfig = toml::from_str("").expect("parse config");
        assert_eq!(cfg.compute.mem_limit_bytes, -1);
    }

    #[test]
    fn test_compute_mem_limit_can_be_overridden() {
        let cfg: RiptideConfig = toml::from_str(
            r#"
[compute]
mem_limit_bytes = 268435456
"#,
        )
        .expect("parse config");
        assert_eq!(cfg.compute.mem_limit_bytes, 268_435_456);
    }
}
