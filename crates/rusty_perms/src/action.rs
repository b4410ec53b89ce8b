//! Bridge actions
//!
//! The web layer invokes the plugin with an action name and a JSON array of
//! positional arguments:
//!
//! ```text
//! getPermissionAuthorizationStatus   ["CAMERA"]
//! getPermissionsAuthorizationStatus  [["CAMERA", "READ_SMS"]]
//! requestRuntimePermission           ["CAMERA"]
//! requestRuntimePermissions          [["CAMERA", "READ_SMS"]]
//! requestMicrophoneAuthorization     []
//! getDeviceOSVersion                 []
//! getBuildOSVersion                  []
//! ```
//!
//! [`Action::parse`] turns that pair into a typed [`Action`], which
//! [`PermissionManager::execute`](crate::manager::PermissionManager::execute) runs.
//!
//! # Example
//!
//! ```
//! use rusty_perms::action::Action;
//! use serde_json::json;
//!
//! let action = Action::parse("requestRuntimePermissions", &json!([["CAMERA", "READ_SMS"]])).unwrap();
//! assert_eq!(
//!     action,
//!     Action::RequestRuntimePermissions {
//!         permissions: vec!["CAMERA".to_string(), "READ_SMS".to_string()],
//!     }
//! );
//! ```

use serde_json::Value;

use crate::error::PermissionError;

/// A typed bridge action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Status of one permission, replied as a bare status string
    GetPermissionAuthorizationStatus {
        /// Logical permission name
        permission: String,
    },

    /// Statuses of several permissions, replied as a name to status object
    GetPermissionsAuthorizationStatus {
        /// Logical permission names
        permissions: Vec<String>,
    },

    /// Prompt for one permission if needed
    RequestRuntimePermission {
        /// Logical permission name
        permission: String,
    },

    /// Prompt for a batch of permissions if needed
    RequestRuntimePermissions {
        /// Logical permission names
        permissions: Vec<String>,
    },

    /// Prompt for `RECORD_AUDIO` if needed
    RequestMicrophoneAuthorization,

    /// Describe the device's runtime platform version
    GetDeviceOsVersion,

    /// Describe the platform versions the app was built against
    GetBuildOsVersion,
}

impl Action {
    /// Parse an action name and its positional JSON arguments
    ///
    /// # Returns
    ///
    /// - `Ok(Action)` - The typed action
    /// - `Err(PermissionError::InvalidAction)` - Unknown action or malformed arguments
    pub fn parse(name: &str, args: &Value) -> Result<Self, PermissionError> {
        let action = match name {
            "getPermissionAuthorizationStatus" => Action::GetPermissionAuthorizationStatus {
                permission: string_arg(name, args)?,
            },
            "getPermissionsAuthorizationStatus" => Action::GetPermissionsAuthorizationStatus {
                permissions: string_list_arg(name, args)?,
            },
            "requestRuntimePermission" => Action::RequestRuntimePermission {
                permission: string_arg(name, args)?,
            },
            "requestRuntimePermissions" => Action::RequestRuntimePermissions {
                permissions: string_list_arg(name, args)?,
            },
            "requestMicrophoneAuthorization" => Action::RequestMicrophoneAuthorization,
            "getDeviceOSVersion" => Action::GetDeviceOsVersion,
            "getBuildOSVersion" => Action::GetBuildOsVersion,
            other => return Err(PermissionError::invalid_action(other, "unknown action")),
        };
        Ok(action)
    }

    /// Bridge name of this action
    pub fn name(&self) -> &'static str {
        match self {
            Action::GetPermissionAuthorizationStatus { .. } => "getPermissionAuthorizationStatus",
            Action::GetPermissionsAuthorizationStatus { .. } => "getPermissionsAuthorizationStatus",
            Action::RequestRuntimePermission { .. } => "requestRuntimePermission",
            Action::RequestRuntimePermissions { .. } => "requestRuntimePermissions",
            Action::RequestMicrophoneAuthorization => "requestMicrophoneAuthorization",
            Action::GetDeviceOsVersion => "getDeviceOSVersion",
            Action::GetBuildOsVersion => "getBuildOSVersion",
        }
    }
}

fn first_arg<'a>(action: &str, args: &'a Value) -> Result<&'a Value, PermissionError> {
    args.as_array()
        .and_then(|args| args.first())
        .ok_or_else(|| PermissionError::invalid_action(action, "missing argument"))
}

fn string_arg(action: &str, args: &Value) -> Result<String, PermissionError> {
    first_arg(action, args)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| PermissionError::invalid_action(action, "expected a permission name"))
}

fn string_list_arg(action: &str, args: &Value) -> Result<Vec<String>, PermissionError> {
    let list = first_arg(action, args)?
        .as_array()
        .ok_or_else(|| PermissionError::invalid_action(action, "expected a list of permission names"))?;

    list.iter()
        .map(|item| {
            item.as_str().map(str::to_string).ok_or_else(|| {
                PermissionError::invalid_action(action, format!("not a permission name: {}", item))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_single_status() {
        let action = Action::parse("getPermissionAuthorizationStatus", &json!(["CAMERA"])).unwrap();
        assert_eq!(
            action,
            Action::GetPermissionAuthorizationStatus {
                permission: "CAMERA".to_string()
            }
        );
    }

    #[test]
    fn test_parse_no_argument_actions() {
        assert_eq!(
            Action::parse("getDeviceOSVersion", &json!([])).unwrap(),
            Action::GetDeviceOsVersion
        );
        assert_eq!(
            Action::parse("getBuildOSVersion", &Value::Null).unwrap(),
            Action::GetBuildOsVersion
        );
        assert_eq!(
            Action::parse("requestMicrophoneAuthorization", &json!([])).unwrap(),
            Action::RequestMicrophoneAuthorization
        );
    }

    #[test]
    fn test_name_matches_parse() {
        let actions = [
            ("getPermissionAuthorizationStatus", json!(["CAMERA"])),
            ("getPermissionsAuthorizationStatus", json!([["CAMERA"]])),
            ("requestRuntimePermission", json!(["CAMERA"])),
            ("requestRuntimePermissions", json!([["CAMERA"]])),
            ("requestMicrophoneAuthorization", json!([])),
            ("getDeviceOSVersion", json!([])),
            ("getBuildOSVersion", json!([])),
        ];
        for (name, args) in actions {
            assert_eq!(Action::parse(name, &args).unwrap().name(), name);
        }
    }

    #[test]
    fn test_unknown_action() {
        let err = Action::parse("isRoamingEnabled", &json!([])).unwrap_err();
        assert_eq!(
            err,
            PermissionError::invalid_action("isRoamingEnabled", "unknown action")
        );
    }

    #[test]
    fn test_missing_argument() {
        let err = Action::parse("requestRuntimePermission", &json!([])).unwrap_err();
        assert!(matches!(err, PermissionError::InvalidAction { .. }));
    }

    #[test]
    fn test_list_with_non_string_entry() {
        let err = Action::parse("requestRuntimePermissions", &json!([["CAMERA", 7]])).unwrap_err();
        assert!(err.to_string().contains("not a permission name: 7"));
    }

    #[test]
    fn test_list_argument_must_be_array() {
        let err = Action::parse("getPermissionsAuthorizationStatus", &json!(["CAMERA"])).unwrap_err();
        assert!(matches!(err, PermissionError::InvalidAction { .. }));
    }
}
