//! Authorization status values and the replies built from them

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::catalog::Permission;
use crate::version::{BuildOsVersion, DeviceOsVersion};

/// Authorization state of one permission at one point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthorizationStatus {
    /// User authorised the permission, or the platform grants it implicitly
    Granted,
    /// User denied the permission but may be asked again
    DeniedOnce,
    /// User denied with "don't ask again", or the permission is not requestable
    DeniedAlways,
    /// The permission has never been presented to the user
    NotRequested,
}

impl AuthorizationStatus {
    /// Wire representation (`"GRANTED"`, `"DENIED_ONCE"`, ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthorizationStatus::Granted => "GRANTED",
            AuthorizationStatus::DeniedOnce => "DENIED_ONCE",
            AuthorizationStatus::DeniedAlways => "DENIED_ALWAYS",
            AuthorizationStatus::NotRequested => "NOT_REQUESTED",
        }
    }

    /// Whether this is [`AuthorizationStatus::Granted`]
    pub fn is_granted(&self) -> bool {
        matches!(self, AuthorizationStatus::Granted)
    }

    /// Whether this is one of the two denied states
    pub fn is_denied(&self) -> bool {
        matches!(
            self,
            AuthorizationStatus::DeniedOnce | AuthorizationStatus::DeniedAlways
        )
    }
}

impl fmt::Display for AuthorizationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statuses keyed by permission, ordered by catalog order
pub type StatusMap = BTreeMap<Permission, AuthorizationStatus>;

/// A successful reply delivered to a response destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Status of every permission in a batch
    Statuses(StatusMap),
    /// Status of a single permission query
    Status(AuthorizationStatus),
    /// Runtime platform version of the device
    DeviceOsVersion(DeviceOsVersion),
    /// Platform versions the app was built against
    BuildOsVersion(BuildOsVersion),
}

impl Reply {
    /// JSON form handed back across the bridge
    ///
    /// A status map becomes an object, a single status becomes a bare string.
    pub fn to_json(&self) -> Value {
        match self {
            Reply::Statuses(map) => Value::Object(
                map.iter()
                    .map(|(permission, status)| {
                        (
                            permission.name().to_string(),
                            Value::String(status.as_str().to_string()),
                        )
                    })
                    .collect(),
            ),
            Reply::Status(status) => Value::String(status.as_str().to_string()),
            Reply::DeviceOsVersion(v) => serde_json::to_value(v).unwrap_or(Value::Null),
            Reply::BuildOsVersion(v) => serde_json::to_value(v).unwrap_or(Value::Null),
        }
    }

    /// The status map, if this reply carries one
    pub fn statuses(&self) -> Option<&StatusMap> {
        match self {
            Reply::Statuses(map) => Some(map),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_wire_names() {
        assert_eq!(AuthorizationStatus::Granted.as_str(), "GRANTED");
        assert_eq!(AuthorizationStatus::DeniedOnce.to_string(), "DENIED_ONCE");
        assert_eq!(
            serde_json::to_value(AuthorizationStatus::DeniedAlways).unwrap(),
            json!("DENIED_ALWAYS")
        );
        let parsed: AuthorizationStatus = serde_json::from_str("\"NOT_REQUESTED\"").unwrap();
        assert_eq!(parsed, AuthorizationStatus::NotRequested);
    }

    #[test]
    fn test_status_predicates() {
        assert!(AuthorizationStatus::Granted.is_granted());
        assert!(!AuthorizationStatus::NotRequested.is_denied());
        assert!(AuthorizationStatus::DeniedAlways.is_denied());
    }

    #[test]
    fn test_statuses_reply_json() {
        let mut map = StatusMap::new();
        map.insert(Permission::Camera, AuthorizationStatus::Granted);
        map.insert(Permission::ReadSms, AuthorizationStatus::NotRequested);

        assert_eq!(
            Reply::Statuses(map).to_json(),
            json!({ "CAMERA": "GRANTED", "READ_SMS": "NOT_REQUESTED" })
        );
    }

    #[test]
    fn test_single_status_reply_is_bare_string() {
        assert_eq!(
            Reply::Status(AuthorizationStatus::DeniedOnce).to_json(),
            json!("DENIED_ONCE")
        );
    }

    #[test]
    fn test_status_map_serializes_with_logical_names() {
        let mut map = StatusMap::new();
        map.insert(Permission::RecordAudio, AuthorizationStatus::DeniedOnce);
        assert_eq!(
            serde_json::to_value(&map).unwrap(),
            json!({ "RECORD_AUDIO": "DENIED_ONCE" })
        );
    }
}
