//! Configuration options and builder pattern for the permission subsystem
//!
//! This module provides [`PermissionOptions`] for configuring how a
//! [`PermissionManager`](crate::manager::PermissionManager) persists its
//! requested flags, negotiates with the host bridge, and decides which denied
//! permissions are prompted again.
//!
//! # Example
//!
//! ```
//! use rusty_perms::options::PermissionOptions;
//!
//! let options = PermissionOptions::builder()
//!     .flag_store_path("/data/app/permission_flags.json")
//!     .bridge_version(semver::Version::new(6, 2, 0))
//!     .build();
//!
//! assert!(options.reprompt_denied);
//! ```
//!
//! # Builder Pattern
//!
//! All fields have sensible defaults; `PermissionOptions::default()` gives an
//! in-memory flag store and assumes a modern bridge:
//!
//! ```
//! use rusty_perms::options::PermissionOptions;
//!
//! let options = PermissionOptions::default();
//! assert!(options.flag_store_path.is_none());
//! assert!(options.bridge_version.is_none());
//! ```
//!
//! Options are serde-serializable so a host can keep them in its own config file:
//!
//! ```
//! use rusty_perms::options::PermissionOptions;
//!
//! let options: PermissionOptions =
//!     serde_json::from_str(r#"{ "reprompt_denied": false, "bridge_version": "4.1.0" }"#).unwrap();
//! assert!(!options.reprompt_denied);
//! assert_eq!(options.bridge_version, Some(semver::Version::new(4, 1, 0)));
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Permission subsystem configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionOptions {
    /// Prompt again for permissions already classified `DENIED_ONCE` or `DENIED_ALWAYS`
    ///
    /// When `false`, denied permissions are returned as-is alongside granted ones.
    pub reprompt_denied: bool,

    /// JSON file backing the persisted requested flags
    ///
    /// `None` keeps the flags in memory for the lifetime of the subsystem.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flag_store_path: Option<PathBuf>,

    /// Version reported by the host bridge
    ///
    /// `None` means the host did not report one and is treated as modern.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bridge_version: Option<semver::Version>,
}

impl Default for PermissionOptions {
    fn default() -> Self {
        Self {
            reprompt_denied: true,
            flag_store_path: None,
            bridge_version: None,
        }
    }
}

impl PermissionOptions {
    /// Create a new options builder
    pub fn builder() -> PermissionOptionsBuilder {
        PermissionOptionsBuilder::default()
    }
}

/// Builder for [`PermissionOptions`]
///
/// # Example
///
/// ```
/// use rusty_perms::options::PermissionOptions;
///
/// let options = PermissionOptions::builder()
///     .reprompt_denied(false)
///     .build();
/// assert!(!options.reprompt_denied);
/// ```
#[derive(Debug, Default)]
pub struct PermissionOptionsBuilder {
    inner: PermissionOptions,
}

impl PermissionOptionsBuilder {
    /// Set whether denied permissions are prompted again
    pub fn reprompt_denied(mut self, reprompt: bool) -> Self {
        self.inner.reprompt_denied = reprompt;
        self
    }

    /// Persist requested flags to a JSON file at `path`
    pub fn flag_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.inner.flag_store_path = Some(path.into());
        self
    }

    /// Set the host bridge version used for capability negotiation
    pub fn bridge_version(mut self, version: semver::Version) -> Self {
        self.inner.bridge_version = Some(version);
        self
    }

    /// Build the options
    pub fn build(self) -> PermissionOptions {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_default() {
        let opts = PermissionOptions::builder().build();
        assert!(opts.reprompt_denied);
        assert_eq!(opts.flag_store_path, None);
        assert_eq!(opts.bridge_version, None);
        assert_eq!(opts, PermissionOptions::default());
    }

    #[test]
    fn test_builder_chaining() {
        let opts = PermissionOptions::builder()
            .reprompt_denied(false)
            .flag_store_path("/tmp/flags.json")
            .bridge_version(semver::Version::new(4, 1, 1))
            .build();

        assert!(!opts.reprompt_denied);
        assert_eq!(opts.flag_store_path, Some(PathBuf::from("/tmp/flags.json")));
        assert_eq!(opts.bridge_version, Some(semver::Version::new(4, 1, 1)));
    }

    #[test]
    fn test_serialize_skips_unset_fields() {
        let value = serde_json::to_value(PermissionOptions::default()).unwrap();
        assert_eq!(value, json!({ "reprompt_denied": true }));
    }

    #[test]
    fn test_deserialize_empty_object_uses_defaults() {
        let opts: PermissionOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts, PermissionOptions::default());
    }

    #[test]
    fn test_deserialize_rejects_bad_bridge_version() {
        let result: Result<PermissionOptions, _> =
            serde_json::from_value(json!({ "bridge_version": "five" }));
        assert!(result.is_err());
    }
}
