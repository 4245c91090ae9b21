//! Host platform selection

use std::fmt;

use serde::{Deserialize, Serialize};

/// Host operating system whose native networking module backs the bridge.
///
/// The platform decides how response payloads are decoded and which error
/// table translates native errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// OkHttp based module; payloads arrive as JSON text
    Android,
    /// NSURLSession based module; payloads arrive already decoded
    Ios,
}

impl Platform {
    /// Platform of the compilation target.
    ///
    /// Apple targets use [`Platform::Ios`], everything else [`Platform::Android`].
    pub fn current() -> Self {
        if cfg!(any(target_os = "ios", target_os = "macos")) {
            Platform::Ios
        } else {
            Platform::Android
        }
    }

    /// Lowercase platform name
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Android => "android",
            Platform::Ios => "ios",
        }
    }

    /// Whether payloads are delivered already decoded
    pub fn decodes_payloads(&self) -> bool {
        matches!(self, Platform::Ios)
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
