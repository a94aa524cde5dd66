//! Bridge façade tying bootstrap, marshalling, execution, and result delivery.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::callback::{CallbackServer, ExecutionResult};
use crate::config::BridgeConfig;
use crate::error::{Error, Result};
use crate::{executor, runtime, script};

/// An installed runtime plus a live callback channel.
///
/// Construction bootstraps the runtime (download and build on first use) and
/// binds the callback listener; both are reused for every call made through
/// the bridge. Calls may overlap: each one is correlated by its own token and
/// receives exactly the result its interpreter process posted.
pub struct PyBridge {
    config: BridgeConfig,
    python: PathBuf,
    callback: CallbackServer,
}

impl PyBridge {
    /// Bootstrap the runtime and bind the callback listener.
    pub async fn connect(config: BridgeConfig) -> Result<Self> {
        let python = runtime::ensure(&config).await?;
        let callback = CallbackServer::bind(&config.callback_host, config.callback_port).await?;
        Ok(Self {
            config,
            python,
            callback,
        })
    }

    /// Use an already-installed interpreter, skipping bootstrap entirely.
    pub async fn with_python(python: impl Into<PathBuf>, config: BridgeConfig) -> Result<Self> {
        let callback = CallbackServer::bind(&config.callback_host, config.callback_port).await?;
        Ok(Self {
            config,
            python: python.into(),
            callback,
        })
    }

    /// Interpreter executable in use.
    pub fn python_path(&self) -> &Path {
        &self.python
    }

    /// Address the callback listener is bound to.
    pub fn callback_addr(&self) -> SocketAddr {
        self.callback.addr()
    }

    /// Run a code fragment with no arguments.
    ///
    /// See [`PyBridge::run_with`] for the result contract.
    pub async fn run(&self, code: &str) -> Result<ExecutionResult> {
        self.run_with(code, &[]).await
    }

    /// Run a code template against ordered arguments.
    ///
    /// Placeholders `$v1…$vN` refer to the arguments in declaration order. The
    /// executed code delivers its result by calling `pybridge_return(data)`;
    /// the call completes once the interpreter process has exited *and* the
    /// result has arrived. When the process exits cleanly but no result shows
    /// up within the configured deadline, the call fails with
    /// [`Error::ResultTimeout`].
    pub async fn run_with(&self, template: &str, args: &[Value]) -> Result<ExecutionResult> {
        let token = Uuid::new_v4();
        let script = script::build_script(template, args, self.callback.addr(), token)?;
        let rx = self.callback.register(token);

        tracing::debug!(%token, "spawning interpreter");
        if let Err(e) = executor::run(&self.python, &self.config.install_dir, &script).await {
            self.callback.unregister(token);
            return Err(e);
        }

        self.await_result(token, rx).await
    }

    /// Rendezvous: the process has exited; wait (bounded) for its result.
    async fn await_result(
        &self,
        token: Uuid,
        rx: oneshot::Receiver<ExecutionResult>,
    ) -> Result<ExecutionResult> {
        let waited = self.config.result_timeout;
        match tokio::time::timeout(waited, rx).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(_)) => {
                self.callback.unregister(token);
                Err(Error::Callback(
                    "callback channel closed before a result arrived".to_string(),
                ))
            }
            Err(_) => {
                self.callback.unregister(token);
                Err(Error::ResultTimeout { waited })
            }
        }
    }
}
