//! Platform version introspection
//!
//! The host supplies three integers: the runtime API level of the device, and the
//! target and minimum API levels the app was built with. This module carries
//! them as a snapshot and renders them as the descriptive objects the bridge
//! exposes to the web layer.

use serde::{Deserialize, Serialize};

/// Read-only version queries supplied by the host platform
pub trait VersionSource: Send + Sync {
    /// API level of the running device
    fn device_runtime_version(&self) -> u32;

    /// API level the app declares as its target
    fn app_target_version(&self) -> u32;

    /// Minimum API level the app supports
    fn app_minimum_version(&self) -> u32;

    /// Capture all three values at once
    fn snapshot(&self) -> Versions {
        Versions {
            runtime: self.device_runtime_version(),
            target: self.app_target_version(),
            minimum: self.app_minimum_version(),
        }
    }
}

/// Point-in-time copy of the host's version values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Versions {
    /// Device runtime API level
    pub runtime: u32,
    /// App target API level
    pub target: u32,
    /// App minimum API level
    pub minimum: u32,
}

impl VersionSource for Versions {
    fn device_runtime_version(&self) -> u32 {
        self.runtime
    }

    fn app_target_version(&self) -> u32 {
        self.target
    }

    fn app_minimum_version(&self) -> u32 {
        self.minimum
    }
}

/// Description of the device's runtime platform version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceOsVersion {
    /// Runtime API level
    pub api_level: u32,
    /// Code name for the API level
    pub api_name: String,
}

/// Description of the versions the app was built against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildOsVersion {
    /// Target API level
    pub target_api_level: u32,
    /// Code name for the target API level
    pub target_api_name: String,
    /// Minimum API level
    pub min_api_level: u32,
    /// Code name for the minimum API level
    pub min_api_name: String,
}

impl Versions {
    /// Describe the runtime version
    pub fn device_os(&self) -> DeviceOsVersion {
        DeviceOsVersion {
            api_level: self.runtime,
            api_name: api_level_name(self.runtime).to_string(),
        }
    }

    /// Describe the build versions
    pub fn build_os(&self) -> BuildOsVersion {
        BuildOsVersion {
            target_api_level: self.target,
            target_api_name: api_level_name(self.target).to_string(),
            min_api_level: self.minimum,
            min_api_name: api_level_name(self.minimum).to_string(),
        }
    }
}

/// Platform code name for an API level, `"UNKNOWN"` when there is none
pub fn api_level_name(level: u32) -> &'static str {
    match level {
        1 => "BASE",
        2 => "BASE_1_1",
        3 => "CUPCAKE",
        4 => "DONUT",
        5 => "ECLAIR",
        6 => "ECLAIR_0_1",
        7 => "ECLAIR_MR1",
        8 => "FROYO",
        9 => "GINGERBREAD",
        10 => "GINGERBREAD_MR1",
        11 => "HONEYCOMB",
        12 => "HONEYCOMB_MR1",
        13 => "HONEYCOMB_MR2",
        14 => "ICE_CREAM_SANDWICH",
        15 => "ICE_CREAM_SANDWICH_MR1",
        16 => "JELLY_BEAN",
        17 => "JELLY_BEAN_MR1",
        18 => "JELLY_BEAN_MR2",
        19 => "KITKAT",
        20 => "KITKAT_WATCH",
        21 => "LOLLIPOP",
        22 => "LOLLIPOP_MR1",
        23 => "M",
        24 => "N",
        25 => "N_MR1",
        26 => "O",
        27 => "O_MR1",
        28 => "P",
        29 => "Q",
        30 => "R",
        31 => "S",
        32 => "S_V2",
        33 => "TIRAMISU",
        34 => "UPSIDE_DOWN_CAKE",
        35 => "VANILLA_ICE_CREAM",
        10000 => "CUR_DEVELOPMENT",
        _ => "UNKNOWN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_api_level_names() {
        assert_eq!(api_level_name(23), "M");
        assert_eq!(api_level_name(29), "Q");
        assert_eq!(api_level_name(33), "TIRAMISU");
        assert_eq!(api_level_name(0), "UNKNOWN");
        assert_eq!(api_level_name(999), "UNKNOWN");
    }

    #[test]
    fn test_device_os_json_shape() {
        let versions = Versions {
            runtime: 30,
            target: 33,
            minimum: 22,
        };
        assert_eq!(
            serde_json::to_value(versions.device_os()).unwrap(),
            json!({ "apiLevel": 30, "apiName": "R" })
        );
    }

    #[test]
    fn test_build_os_json_shape() {
        let versions = Versions {
            runtime: 30,
            target: 33,
            minimum: 22,
        };
        assert_eq!(
            serde_json::to_value(versions.build_os()).unwrap(),
            json!({
                "targetApiLevel": 33,
                "targetApiName": "TIRAMISU",
                "minApiLevel": 22,
                "minApiName": "LOLLIPOP_MR1"
            })
        );
    }

    #[test]
    fn test_snapshot_via_trait() {
        let versions = Versions {
            runtime: 28,
            target: 29,
            minimum: 21,
        };
        assert_eq!(versions.snapshot(), versions);
    }
}
