//! Push-capable device platforms.
//!
//! Values must match the CHECK constraint on `devices.platform`.

use serde::{Deserialize, Serialize};

pub const PLATFORM_APPLE: &str = "apple";
pub const PLATFORM_ANDROID: &str = "android";
pub const PLATFORM_ELECTRON: &str = "electron";
pub const PLATFORM_WEB: &str = "web";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePlatform {
    Apple,
    Android,
    Electron,
    Web,
}

impl DevicePlatform {
    pub const fn as_str(self) -> &'static str {
        match self {
            DevicePlatform::Apple => PLATFORM_APPLE,
            DevicePlatform::Android => PLATFORM_ANDROID,
            DevicePlatform::Electron => PLATFORM_ELECTRON,
            DevicePlatform::Web => PLATFORM_WEB,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            PLATFORM_APPLE => Some(DevicePlatform::Apple),
            PLATFORM_ANDROID => Some(DevicePlatform::Android),
            PLATFORM_ELECTRON => Some(DevicePlatform::Electron),
            PLATFORM_WEB => Some(DevicePlatform::Web),
            _ => None,
        }
    }

    /// Only Apple devices are wired to a push provider.
    pub const fn receives_push(self) -> bool {
        matches!(self, DevicePlatform::Apple)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_apple_receives_push() {
        assert!(DevicePlatform::Apple.receives_push());
        assert!(!DevicePlatform::Android.receives_push());
        assert!(!DevicePlatform::Electron.receives_push());
        assert!(!DevicePlatform::Web.receives_push());
    }

    #[test]
    fn parse_rejects_unknown_platforms() {
        assert_eq!(DevicePlatform::parse("apple"), Some(DevicePlatform::Apple));
        assert_eq!(DevicePlatform::parse("symbian"), None);
    }
}
