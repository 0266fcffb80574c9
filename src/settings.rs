// Copyright 2025 coScene
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

// Live settings consumed by exporters during configure

use crate::config::SettingsConfig;
use dashmap::DashMap;

/// Source of runtime flags for exporters.
///
/// Persistence lives outside this crate; exporters only read the flags
/// when they are configured.
pub trait SettingsProvider: Send + Sync {
    /// Whether verbose per-record logging is on for the named exporter
    fn debug_enabled(&self, exporter: &str) -> bool;

    /// Whether the named exporter should transmit at all
    fn exporter_enabled(&self, exporter: &str) -> bool {
        let _ = exporter;
        true
    }
}

/// In-memory settings, mutable at runtime
#[derive(Debug, Default)]
pub struct StaticSettings {
    debug: DashMap<String, bool>,
    enabled: DashMap<String, bool>,
}

impl StaticSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &SettingsConfig) -> Self {
        let settings = Self::new();
        for (name, debug) in &config.debug {
            settings.set_debug(name, *debug);
        }
        for name in &config.disabled {
            settings.set_enabled(name, false);
        }
        settings
    }

    pub fn set_debug(&self, exporter: &str, debug: bool) {
        self.debug.insert(exporter.to_string(), debug);
    }

    pub fn set_enabled(&self, exporter: &str, enabled: bool) {
        self.enabled.insert(exporter.to_string(), enabled);
    }
}

impl SettingsProvider for StaticSettings {
    fn debug_enabled(&self, exporter: &str) -> bool {
        self.debug.get(exporter).map(|v| *v).unwrap_or(false)
    }

    fn exporter_enabled(&self, exporter: &str) -> bool {
        self.enabled.get(exporter).map(|v| *v).unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let settings = StaticSettings::new();
        assert!(!settings.debug_enabled("kafka"));
        assert!(settings.exporter_enabled("kafka"));
    }

    #[test]
    fn test_from_config() {
        let config = SettingsConfig {
            debug: HashMap::from([("s3".to_string(), true)]),
            disabled: vec!["stdout".to_string()],
        };
        let settings = StaticSettings::from_config(&config);
        assert!(settings.debug_enabled("s3"));
        assert!(!settings.debug_enabled("stdout"));
        assert!(!settings.exporter_enabled("stdout"));
        assert!(settings.exporter_enabled("s3"));
    }
}
