//! Rusty Perms - runtime permission authorization engine for mobile web bridges
//!
//! This crate lets a web-based mobile application query and request operating
//! system runtime permissions and learn their precise authorization state, on a
//! platform whose permission model changed across many releases.
//!
//! # Overview
//!
//! Rusty Perms provides:
//! - A fixed permission catalog with per-permission platform version windows
//! - Four-state status classification (`GRANTED`, `DENIED_ONCE`, `DENIED_ALWAYS`, `NOT_REQUESTED`)
//! - Batch requests that prompt only for what is unresolved
//! - Tracking of in-flight prompts across the asynchronous dialog boundary
//! - Reconciliation of dialog results, including version-dependent remapping
//! - Host-bridge capability negotiation at startup
//!
//! # Architecture
//!
//! The crate is organized into several key modules:
//! - `catalog`: The [`Permission`](catalog::Permission) enum and its version windows
//! - `classifier`: Status classification rules
//! - `tracker`: Pending request bookkeeping and response destinations
//! - `manager`: The [`PermissionManager`](manager::PermissionManager) entry point
//! - `host`: The boundary to the platform's permission machinery
//! - `store`: Persisted "has been requested" flags
//! - `action`: Parsing of bridge actions
//!
//! # Example
//!
//! ```rust,no_run
//! use rusty_perms::prelude::*;
//! use std::sync::Arc;
//!
//! # fn host() -> Arc<dyn HostPermissions> { unimplemented!() }
//! # fn versions() -> Arc<dyn VersionSource> { unimplemented!() }
//! #[tokio::main]
//! async fn main() -> Result<(), PermissionError> {
//!     let options = PermissionOptions::builder()
//!         .flag_store_path("/data/app/permission_flags.json")
//!         .build();
//!
//!     let manager = Arc::new(PermissionManager::new(options, host(), versions())?);
//!
//!     // Status without prompting
//!     let status = manager.authorization_status("CAMERA")?;
//!     println!("CAMERA is {}", status);
//!
//!     // Prompt if needed; the host reports back through
//!     // `on_request_permission_result`
//!     let statuses = manager.request(&["CAMERA", "RECORD_AUDIO"]).await?;
//!     for (permission, status) in statuses {
//!         println!("{} -> {}", permission, status);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # License
//!
//! Licensed under MIT. See LICENSE file for details.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Bridge action parsing
///
/// This module turns an action name plus positional JSON arguments, as handed
/// over by the web-to-native bridge, into a typed `Action`.
pub mod action;

/// Permission catalog
///
/// This module defines the `Permission` enum: every supported permission with
/// its logical name, platform identifier, and supported platform version window.
pub mod catalog;

/// Authorization status classification
pub mod classifier;

/// Error types and utilities
///
/// This module defines the `PermissionError` enum, which covers all error cases in the crate:
///
/// - `UnknownPermission` - Name absent from the catalog
/// - `VersionUnsupported` - Permission outside its platform version window
/// - `RequestNotFound` - Completion for an unknown or expired request id
/// - `PersistenceWrite` - Requested flag could not be written (logged, non-fatal)
/// - `FlagStore` - Flag store could not be opened
/// - `HostContract` / `Host` - Host platform misbehaved or failed
/// - `UnsupportedBridge` - Negotiated bridge lacks a capability
/// - `InvalidAction` - Malformed bridge action
/// - `ChannelClosed` - Response destination went away
pub mod error;

/// Host platform abstraction
///
/// This module provides the `HostPermissions` trait and the bridge capability
/// negotiation that wraps it.
pub mod host;

/// Permission subsystem entry point
///
/// This module provides `PermissionManager`, constructed once at application
/// start, which runs status queries, batch requests, and completion callbacks.
pub mod manager;

/// Configuration options and builder
pub mod options;

/// Authorization statuses and replies
pub mod status;

/// Persisted requested flags
///
/// This module provides the `FlagStore` trait with file-backed, in-memory, and
/// read-only implementations.
pub mod store;

/// Pending request tracking
pub mod tracker;

/// Platform version introspection
pub mod version;

// Prelude module for common imports
pub mod prelude {
    //! Common imports for rusty_perms users
    //!
    //! Use `use rusty_perms::prelude::*;` to import commonly used types.

    pub use crate::action::Action;
    pub use crate::catalog::Permission;
    pub use crate::error::PermissionError;
    pub use crate::host::{BridgeProfile, HostPermissions};
    pub use crate::manager::{Dispatch, PermissionManager};
    pub use crate::options::PermissionOptions;
    pub use crate::status::{AuthorizationStatus, Reply, StatusMap};
    pub use crate::store::{FileFlagStore, FlagStore, MemoryFlagStore, StoreError};
    pub use crate::tracker::{destination_fn, Delivery, RequestId, ResponseDestination};
    pub use crate::version::{VersionSource, Versions};
}
