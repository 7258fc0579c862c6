//! Runtime Configuration
//!
//! A `RuntimeConfig` controls the few knobs a `Runtime` has. Everything is
//! optional: the default configuration behaves exactly like an unconfigured
//! runtime (unbounded nesting, no label).
//!
//! Configs can be built in code or parsed from JSON:
//!
//! ```rust
//! use trkl_core::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_json(r#"{ "max_depth": 64, "label": "ui" }"#).unwrap();
//! assert_eq!(config.max_depth, Some(64));
//! ```

use serde::Deserialize;

use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Maximum number of computed re-runs allowed to nest during one
    /// propagation. Each link of a computed chain counts once, from the
    /// start of its evaluation until its dependents have been updated.
    /// `None` means unbounded.
    pub max_depth: Option<usize>,

    /// Name recorded on log events emitted by the runtime.
    pub label: Option<String>,
}

impl RuntimeConfig {
    /// Parse a config from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}
