//! Callback result channel.
//!
//! A local HTTP listener the interpreter process posts its result to. Every
//! call registers a correlation token before its process is spawned; a posted
//! payload is routed to the matching call's oneshot channel, so several calls
//! may be in flight at once. The listener stays bound for the lifetime of the
//! owning bridge.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Result record posted by the interpreter: arbitrary string keys to values.
pub type ExecutionResult = Map<String, Value>;

/// Payload posted by the reporting primitive.
#[derive(Debug, Deserialize)]
struct ResultPost {
    /// Correlation token identifying the call.
    token: Uuid,
    /// The computed result record.
    data: ExecutionResult,
}

/// Calls waiting for their result, keyed by correlation token.
type Pending = Arc<Mutex<HashMap<Uuid, oneshot::Sender<ExecutionResult>>>>;

/// Local listener receiving posted results.
pub struct CallbackServer {
    addr: SocketAddr,
    pending: Pending,
    task: tokio::task::JoinHandle<()>,
}

impl CallbackServer {
    /// Bind the listener.
    ///
    /// Port 0 binds an ephemeral port; the actual address is available from
    /// [`CallbackServer::addr`] and is baked into every generated script.
    pub async fn bind(host: &str, port: u16) -> Result<Self> {
        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let app = Router::new()
            .route("/result", post(post_result))
            .route("/health", get(health))
            .with_state(pending.clone());

        let listener = tokio::net::TcpListener::bind((host, port))
            .await
            .map_err(|e| Error::Callback(format!("failed to bind {host}:{port}: {e}")))?;
        let addr = listener
            .local_addr()
            .map_err(|e| Error::Callback(format!("failed to read local address: {e}")))?;

        tracing::debug!("callback listener bound at http://{addr}");

        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("callback listener terminated: {e}");
            }
        });

        Ok(Self {
            addr,
            pending,
            task,
        })
    }

    /// Address scripts post their result to.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Register a call's token, returning the receiver its result arrives on.
    pub fn register(&self, token: Uuid) -> oneshot::Receiver<ExecutionResult> {
        let (tx, rx) = oneshot::channel();
        if let Ok(mut pending) = self.pending.lock() {
            pending.insert(token, tx);
        }
        rx
    }

    /// Drop a call's registration after it failed or timed out.
    pub fn unregister(&self, token: Uuid) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.remove(&token);
        }
    }
}

impl Drop for CallbackServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Liveness probe.
async fn health() -> Json<Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Route a posted result to the caller waiting on its token.
async fn post_result(State(pending): State<Pending>, Json(payload): Json<ResultPost>) -> StatusCode {
    let sender = match pending.lock() {
        Ok(mut map) => map.remove(&payload.token),
        Err(_) => None,
    };

    match sender {
        Some(tx) => {
            if tx.send(payload.data).is_err() {
                tracing::warn!(
                    "result for {} arrived after the caller stopped waiting",
                    payload.token
                );
                return StatusCode::GONE;
            }
            StatusCode::OK
        }
        None => {
            tracing::warn!("result posted for unknown token {}", payload.token);
            StatusCode::NOT_FOUND
        }
    }
}
