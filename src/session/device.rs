//! Device classification.
//!
//! Decides whether a client looks like a real device. The heuristics are
//! deliberately shallow; anything stronger plugs in behind [`DeviceClassifier`].

use md5::{Digest, Md5};
use serde::Serialize;

// == Device Info ==
/// Request attributes the classifier looks at.
#[derive(Debug, Clone, Default)]
pub struct DeviceInfo {
    pub ip: String,
    pub user_agent: String,
    /// Client supplied fingerprint header, if any
    pub fingerprint: Option<String>,
}

impl DeviceInfo {
    /// Short stable id derived from the fingerprint.
    pub fn device_id(&self) -> Option<String> {
        self.fingerprint.as_deref().map(|fp| {
            let digest = Md5::digest(fp.as_bytes());
            digest.iter().take(8).map(|b| format!("{b:02x}")).collect()
        })
    }
}

// == Classification ==
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceVerdict {
    pub suspicious: bool,
    pub reasons: Vec<&'static str>,
}

pub trait DeviceClassifier: Send + Sync {
    fn classify(&self, device: &DeviceInfo) -> DeviceVerdict;
}

/// Flags emulators, rooted devices, and scripted HTTP clients by user agent.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserAgentClassifier;

// == Markers ==
const EMULATOR_MARKERS: &[&str] = &[
    "bluestacks",
    "nox",
    "mumu",
    "ldplayer",
    "koplayer",
    "genymotion",
    "droid4x",
    "micyo",
];

const ROOTED_MARKERS: &[&str] = &["root", "supersu", "magisk", "xposed"];

const SCRIPTED_MARKERS: &[&str] = &[
    "curl",
    "wget",
    "python",
    "java",
    "okhttp",
    "httpclient",
    "apache",
    "node",
];

// Anything shorter is not a browser or app user agent
const MIN_USER_AGENT_LEN: usize = 10;

impl DeviceClassifier for UserAgentClassifier {
    fn classify(&self, device: &DeviceInfo) -> DeviceVerdict {
        let ua = device.user_agent.to_ascii_lowercase();
        let mut reasons = Vec::new();

        if is_android_emulator(&ua) || EMULATOR_MARKERS.iter().any(|m| ua.contains(m)) {
            reasons.push("emulator");
        }
        if ROOTED_MARKERS.iter().any(|m| ua.contains(m)) {
            reasons.push("rooted");
        }
        if ua.len() < MIN_USER_AGENT_LEN || SCRIPTED_MARKERS.iter().any(|m| ua.contains(m)) {
            reasons.push("suspicious_ua");
        }

        DeviceVerdict {
            suspicious: !reasons.is_empty(),
            reasons,
        }
    }
}

/// "emulator" only counts when it follows "android".
fn is_android_emulator(ua: &str) -> bool {
    ua.find("android")
        .is_some_and(|start| ua[start + "android".len()..].contains("emulator"))
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn classify(ua: &str) -> DeviceVerdict {
        UserAgentClassifier.classify(&DeviceInfo {
            user_agent: ua.to_string(),
            ..DeviceInfo::default()
        })
    }

    #[test]
    fn test_browser_is_trusted() {
        let verdict = classify(
            "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 Chrome/126.0 Mobile Safari/537.36",
        );
        assert!(!verdict.suspicious);
        assert!(verdict.reasons.is_empty());
    }

    #[test]
    fn test_scripted_clients_are_suspicious() {
        assert_eq!(classify("curl/8.4.0").reasons, vec!["suspicious_ua"]);
        assert!(classify("python-requests/2.31").suspicious);
        assert!(classify("").suspicious);
    }

    #[test]
    fn test_emulator_and_rooted() {
        let verdict = classify("Mozilla/5.0 (Linux; Android 9; BlueStacks) Magisk");
        assert_eq!(verdict.reasons, vec!["emulator", "rooted"]);
    }

    #[test]
    fn test_emulator_marker_requires_android_first() {
        let verdict = classify("Mozilla/5.0 (Linux; Android 13; sdk_gphone64 Emulator Build)");
        assert_eq!(verdict.reasons, vec!["emulator"]);

        let verdict = classify("Mozilla/5.0 (Macintosh) EmulatorStudio/2.1 Safari/605.1");
        assert!(!verdict.suspicious);

        let verdict = classify("Mozilla/5.0 Emulator/1.0 (Linux; Android 13)");
        assert!(!verdict.suspicious);
    }

    #[test]
    fn test_device_id_is_stable() {
        let device = DeviceInfo {
            fingerprint: Some("fp-1".to_string()),
            ..DeviceInfo::default()
        };

        let id = device.device_id().unwrap();
        assert_eq!(id.len(), 16);
        assert_eq!(device.device_id().unwrap(), id);
        assert_eq!(DeviceInfo::default().device_id(), None);
    }
}
