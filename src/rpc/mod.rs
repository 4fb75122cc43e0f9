//! JSON-RPC module for daemon communication.
//!
//! Provides the JSON-RPC 2.0 server implementation for:
//! - `observe`: Feed one poll of the game state; selects on target change
//! - `select`: Resolve a target id and seed without change detection
//! - `get_track`, `unused_tracks`, `track_usage`: Catalog queries
//! - `reload`: Reload the playlist document
//! - `ping`: Health check
//! - `shutdown`: Graceful shutdown
//!
//! Notifications:
//! - `track_selected`: An observed target change picked a track

pub mod methods;
pub mod server;
pub mod types;

// Re-export commonly used types
pub use server::{run_server, serve, ServerState};
pub use types::{
    CatalogSummary, JsonRpcError, JsonRpcErrorResponse, JsonRpcNotification, JsonRpcRequest,
    JsonRpcResponse, ObserveResult, ObserveStatus, RequestId, SelectResult, TrackSelectedParams,
};
