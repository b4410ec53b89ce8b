//! Static permission catalog
//!
//! Every runtime permission the subsystem knows about is a variant of
//! [`Permission`]. Each variant carries its logical name (the stable,
//! platform-independent key used by the calling application), its platform
//! identifier, and the platform version window in which it can be requested.
//!
//! Lookups in both directions are exhaustive matches, so there is no second
//! map to keep in sync and "unknown permission" is simply the `None`/`Err`
//! case of a total function.
//!
//! # Example
//!
//! ```
//! use rusty_perms::catalog::Permission;
//!
//! let camera = Permission::resolve("CAMERA").unwrap();
//! assert_eq!(camera.platform_id(), "android.permission.CAMERA");
//! assert_eq!(
//!     Permission::from_platform_id("android.permission.CAMERA"),
//!     Some(camera)
//! );
//! assert_eq!(Permission::BluetoothScan.min_version(), Some(31));
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::PermissionError;

/// Platform version that introduced background location and activity recognition.
///
/// Below this version, results for those permissions are attributed to the older
/// permission that gated the capability.
pub const REMAP_BELOW_VERSION: u32 = 29;

macro_rules! permission_catalog {
    ($( $(#[$meta:meta])* $variant:ident => $name:literal, min = $min:expr, max = $max:expr; )+) => {
        /// A runtime permission known to the catalog
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Permission {
            $( $(#[$meta])* #[doc = concat!("`", $name, "`")] $variant, )+
        }

        impl Permission {
            /// Every catalog entry, in catalog order
            pub const ALL: &'static [Permission] = &[ $( Permission::$variant, )+ ];

            /// Logical permission name (e.g. `"CAMERA"`)
            pub const fn name(self) -> &'static str {
                match self {
                    $( Permission::$variant => $name, )+
                }
            }

            /// Platform identifier (e.g. `"android.permission.CAMERA"`)
            pub const fn platform_id(self) -> &'static str {
                match self {
                    $( Permission::$variant => concat!("android.permission.", $name), )+
                }
            }

            /// Minimum platform version required to request this permission
            pub const fn min_version(self) -> Option<u32> {
                match self {
                    $( Permission::$variant => $min, )+
                }
            }

            /// Maximum platform version on which this permission can be requested
            pub const fn max_version(self) -> Option<u32> {
                match self {
                    $( Permission::$variant => $max, )+
                }
            }

            /// Look up a permission by logical name
            pub fn from_name(name: &str) -> Option<Permission> {
                match name {
                    $( $name => Some(Permission::$variant), )+
                    _ => None,
                }
            }
        }
    };
}

permission_catalog! {
    AccessCoarseLocation => "ACCESS_COARSE_LOCATION", min = None, max = None;
    AccessFineLocation => "ACCESS_FINE_LOCATION", min = None, max = None;
    AddVoicemail => "ADD_VOICEMAIL", min = None, max = None;
    BodySensors => "BODY_SENSORS", min = None, max = None;
    CallPhone => "CALL_PHONE", min = None, max = None;
    Camera => "CAMERA", min = None, max = None;
    GetAccounts => "GET_ACCOUNTS", min = None, max = None;
    ProcessOutgoingCalls => "PROCESS_OUTGOING_CALLS", min = None, max = None;
    ReadCalendar => "READ_CALENDAR", min = None, max = None;
    ReadCallLog => "READ_CALL_LOG", min = None, max = None;
    ReadContacts => "READ_CONTACTS", min = None, max = None;
    ReadExternalStorage => "READ_EXTERNAL_STORAGE", min = None, max = Some(32);
    ReadPhoneState => "READ_PHONE_STATE", min = None, max = None;
    ReadSms => "READ_SMS", min = None, max = None;
    ReceiveMms => "RECEIVE_MMS", min = None, max = None;
    ReceiveSms => "RECEIVE_SMS", min = None, max = None;
    ReceiveWapPush => "RECEIVE_WAP_PUSH", min = None, max = None;
    RecordAudio => "RECORD_AUDIO", min = None, max = None;
    SendSms => "SEND_SMS", min = None, max = None;
    UseSip => "USE_SIP", min = None, max = None;
    WriteCalendar => "WRITE_CALENDAR", min = None, max = None;
    WriteCallLog => "WRITE_CALL_LOG", min = None, max = None;
    WriteContacts => "WRITE_CONTACTS", min = None, max = None;
    WriteExternalStorage => "WRITE_EXTERNAL_STORAGE", min = None, max = Some(29);

    // API 26
    AnswerPhoneCalls => "ANSWER_PHONE_CALLS", min = Some(26), max = None;
    ReadPhoneNumbers => "READ_PHONE_NUMBERS", min = Some(26), max = None;

    // API 28
    AcceptHandover => "ACCEPT_HANDOVER", min = Some(28), max = None;

    // API 29
    AccessBackgroundLocation => "ACCESS_BACKGROUND_LOCATION", min = Some(29), max = None;
    AccessMediaLocation => "ACCESS_MEDIA_LOCATION", min = Some(29), max = None;
    ActivityRecognition => "ACTIVITY_RECOGNITION", min = Some(29), max = None;

    // API 31
    BluetoothAdvertise => "BLUETOOTH_ADVERTISE", min = Some(31), max = None;
    BluetoothConnect => "BLUETOOTH_CONNECT", min = Some(31), max = None;
    BluetoothScan => "BLUETOOTH_SCAN", min = Some(31), max = None;
    UwbRanging => "UWB_RANGING", min = Some(31), max = None;

    // API 33
    BodySensorsBackground => "BODY_SENSORS_BACKGROUND", min = Some(33), max = None;
    NearbyWifiDevices => "NEARBY_WIFI_DEVICES", min = Some(33), max = None;
    PostNotifications => "POST_NOTIFICATIONS", min = Some(33), max = None;
    ReadMediaAudio => "READ_MEDIA_AUDIO", min = Some(33), max = None;
    ReadMediaImages => "READ_MEDIA_IMAGES", min = Some(33), max = None;
    ReadMediaVideo => "READ_MEDIA_VIDEO", min = Some(33), max = None;
}

impl Permission {
    /// Resolve a logical name, failing with [`PermissionError::UnknownPermission`]
    pub fn resolve(name: &str) -> Result<Permission, PermissionError> {
        Self::from_name(name).ok_or_else(|| PermissionError::unknown(name))
    }

    /// Reverse lookup from a platform identifier
    pub fn from_platform_id(platform_id: &str) -> Option<Permission> {
        platform_id
            .strip_prefix("android.permission.")
            .and_then(Self::from_name)
    }

    /// Whether the permission can be requested on a device running `runtime_version`
    pub fn supports_runtime(self, runtime_version: u32) -> bool {
        let above_min = self.min_version().is_none_or(|min| runtime_version >= min);
        let below_max = self.max_version().is_none_or(|max| runtime_version <= max);
        above_min && below_max
    }

    /// The logical permission a platform result is attributed to on `runtime_version`
    ///
    /// Older platforms have no dedicated permission for background location or
    /// activity recognition and gate them behind coarse location and body sensors.
    pub fn attributed_on(self, runtime_version: u32) -> Permission {
        if runtime_version >= REMAP_BELOW_VERSION {
            return self;
        }
        match self {
            Permission::AccessBackgroundLocation => Permission::AccessCoarseLocation,
            Permission::ActivityRecognition => Permission::BodySensors,
            other => other,
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Permission {
    type Err = PermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::resolve(s)
    }
}

impl Serialize for Permission {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Permission {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Self::resolve(&name).map_err(serde::de::Error::custom)
    }
}
