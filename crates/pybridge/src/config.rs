//! Bridge configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Python version installed when no runtime is present.
pub const PYTHON_VERSION: &str = "3.12.8";

/// Default port for the callback listener.
pub const DEFAULT_CALLBACK_PORT: u16 = 8763;

/// Configuration for a [`PyBridge`](crate::PyBridge).
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Root directory holding the managed Python runtime.
    pub install_dir: PathBuf,

    /// Python version to install when bootstrapping.
    pub python_version: String,

    /// Address the callback listener binds to.
    pub callback_host: String,

    /// Port for the callback listener. Port 0 binds an ephemeral port.
    pub callback_port: u16,

    /// How long a call waits for its result after the interpreter exits.
    pub result_timeout: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            install_dir: default_install_dir(),
            python_version: PYTHON_VERSION.to_string(),
            callback_host: "127.0.0.1".to_string(),
            callback_port: DEFAULT_CALLBACK_PORT,
            result_timeout: Duration::from_secs(30),
        }
    }
}

/// Default install root under the user data directory.
pub fn default_install_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pybridge")
        .join("runtime")
}
