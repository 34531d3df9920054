//! Host platform classification for player selection.

use std::fmt;

/// The platform families playback knows how to drive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Platform {
    MacLike,
    LinuxLike,
    WindowsLike,
    Other(String),
}

impl Platform {
    /// Platform of the running binary.
    pub fn current() -> Self {
        Self::from_os_name(std::env::consts::OS)
    }

    /// Maps an OS name as reported by `std::env::consts::OS`.
    pub fn from_os_name(name: &str) -> Self {
        match name {
            "macos" | "ios" => Platform::MacLike,
            "linux" | "android" | "freebsd" | "openbsd" | "netbsd" | "dragonfly" => {
                Platform::LinuxLike
            }
            "windows" => Platform::WindowsLike,
            other => Platform::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::MacLike => f.write_str("macos"),
            Platform::LinuxLike => f.write_str("linux"),
            Platform::WindowsLike => f.write_str("windows"),
            Platform::Other(name) => f.write_str(name),
        }
    }
}
