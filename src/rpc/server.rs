//! JSON-RPC server over stdin/stdout.
//!
//! Implements the JSON-RPC 2.0 protocol for daemon communication.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::catalog::Catalog;
use crate::config::DaemonConfig;
use crate::driver::PollState;
use crate::error::Result;

use super::methods::handle_request;
use super::types::{
    JsonRpcError, JsonRpcErrorResponse, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse,
    JSONRPC_VERSION,
};

/// State shared across all request handlers.
pub struct ServerState {
    /// Current catalog. Replaced whole on a successful reload.
    catalog: Arc<Catalog>,
    /// Where the current catalog was loaded from.
    catalog_path: PathBuf,
    /// Daemon configuration.
    pub config: DaemonConfig,
    /// Last observed target and seed.
    pub poll: PollState,
    /// Flag to signal server shutdown.
    shutdown: Arc<AtomicBool>,
    /// Serialized notifications waiting to be written ahead of the next response.
    outbox: Vec<String>,
}

impl ServerState {
    /// Creates new server state around an already loaded catalog.
    pub fn new(config: DaemonConfig, catalog: Catalog, catalog_path: impl Into<PathBuf>) -> Self {
        let poll = PollState::new(config.ignored_target_ids.iter().copied());
        Self {
            catalog: Arc::new(catalog),
            catalog_path: catalog_path.into(),
            config,
            poll,
            shutdown: Arc::new(AtomicBool::new(false)),
            outbox: Vec::new(),
        }
    }

    /// Returns a handle to the current catalog.
    pub fn catalog(&self) -> Arc<Catalog> {
        Arc::clone(&self.catalog)
    }

    pub fn catalog_path(&self) -> &Path {
        &self.catalog_path
    }

    /// Loads `path` (or the current document path) and swaps it in.
    ///
    /// On failure the current catalog stays in place.
    pub fn reload(&mut self, path: Option<&Path>) -> Result<Arc<Catalog>> {
        let path = path.unwrap_or(self.catalog_path.as_path()).to_path_buf();
        match Catalog::load_file(&path) {
            Ok(catalog) => {
                let catalog = Arc::new(catalog);
                self.catalog = Arc::clone(&catalog);
                self.catalog_path = path;
                // a new catalog may route the current target differently
                self.poll.reset();
                Ok(catalog)
            }
            Err(e) => {
                warn!("Reload of {} failed, keeping current catalog: {}", path.display(), e);
                Err(e)
            }
        }
    }

    /// Signals the server to shut down.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Returns true if shutdown has been requested.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Queues a JSON-RPC notification for the serving loop to write.
    pub fn notify<T: Serialize>(&mut self, method: &'static str, params: T) {
        match serde_json::to_string(&JsonRpcNotification::new(method, params)) {
            Ok(json) => self.outbox.push(json),
            Err(e) => error!("Dropping {} notification: {}", method, e),
        }
    }

    /// Removes and returns the queued notifications, oldest first.
    pub fn take_notifications(&mut self) -> Vec<String> {
        std::mem::take(&mut self.outbox)
    }
}

/// Runs the JSON-RPC server, reading from stdin and writing to stdout.
pub fn run_server(state: ServerState) -> Result<()> {
    let stdin = io::stdin();
    serve(stdin.lock(), io::stdout(), state)
}

/// Serves newline-delimited requests from `reader`, one response per line.
pub fn serve<R: BufRead, W: Write>(reader: R, mut writer: W, mut state: ServerState) -> Result<()> {
    info!("JSON-RPC server started, waiting for requests...");

    for line in reader.lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                error!("Error reading stdin: {}", e);
                break;
            }
        };

        // Skip empty lines
        if line.trim().is_empty() {
            continue;
        }

        let response = process_request(&line, &mut state);

        for notification in state.take_notifications() {
            writeln!(writer, "{}", notification).ok();
        }
        if let Some(response) = response {
            writeln!(writer, "{}", response).ok();
        }
        writer.flush().ok();

        if state.is_shutdown() {
            info!("Server shutdown requested");
            break;
        }
    }

    info!("JSON-RPC server stopped");
    Ok(())
}

/// Processes a single JSON-RPC request line.
fn process_request(line: &str, state: &mut ServerState) -> Option<String> {
    let request: JsonRpcRequest = match serde_json::from_str(line) {
        Ok(r) => r,
        Err(e) => {
            let error = JsonRpcErrorResponse::new(
                None,
                JsonRpcError::parse_error(format!("Invalid JSON: {}", e)),
            );
            return Some(serde_json::to_string(&error).unwrap_or_default());
        }
    };

    // Validate JSON-RPC version
    if request.jsonrpc != JSONRPC_VERSION {
        let error = JsonRpcErrorResponse::new(
            Some(request.id),
            JsonRpcError::invalid_request("Invalid JSON-RPC version (expected 2.0)"),
        );
        return Some(serde_json::to_string(&error).unwrap_or_default());
    }

    let result = handle_request(&request.method, request.params, state);

    let line = match result {
        Ok(value) => serde_json::to_string(&JsonRpcResponse::new(request.id, value)),
        Err(error) => serde_json::to_string(&JsonRpcErrorResponse::new(Some(request.id), error)),
    };
    Some(line.unwrap_or_default())
}
