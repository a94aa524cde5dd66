//! Embedded Python execution bridge.
//!
//! Bootstraps a managed Python runtime, ships host values and code fragments
//! into a fresh interpreter process, and retrieves the computed result back
//! into the calling process over a local HTTP callback.
//!
//! # Architecture
//!
//! - **runtime**: installs the interpreter on first use (prebuilt installer on
//!   Windows, source build elsewhere) and provisions interpreter-side libraries
//! - **script**: marshals arguments into an ordered record and expands `$v{n}`
//!   template placeholders into a self-contained script
//! - **executor**: runs one interpreter process per call with captured output
//! - **callback**: local listener routing posted results to callers by token
//! - **bridge**: the [`PyBridge`] façade tying the pieces together
//!
//! # Example
//!
//! ```no_run
//! use pybridge::{BridgeConfig, PyBridge};
//! use serde_json::json;
//!
//! # async fn demo() -> pybridge::Result<()> {
//! let bridge = PyBridge::connect(BridgeConfig::default()).await?;
//! let result = bridge
//!     .run_with("pybridge_return({'sum': $v1 + $v2})", &[json!(3), json!(4)])
//!     .await?;
//! assert_eq!(result["sum"], 7);
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod callback;
pub mod config;
pub mod error;
pub mod executor;
pub mod paths;
pub mod runtime;
pub mod script;

pub use bridge::PyBridge;
pub use callback::{CallbackServer, ExecutionResult};
pub use config::{BridgeConfig, DEFAULT_CALLBACK_PORT, PYTHON_VERSION};
pub use error::{Error, Result};
pub use executor::RunOutput;
pub use paths::RuntimeDirs;
pub use script::{Template, argument_record, build_script};
