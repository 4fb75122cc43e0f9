//! Wire types for the daemon's JSON-RPC 2.0 protocol: envelopes, error
//! codes, method params and results, and notifications.

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::error::DaemonError;
use crate::inspect::TrackUsage;
use crate::selection::{ConsistencyFault, SelectionMode};
use crate::types::{TargetId, TrackDescriptor, TrackId};

pub const JSONRPC_VERSION: &str = "2.0";

/// Error codes used in [`JsonRpcError::code`].
///
/// The negative 32700..32600 band is reserved by JSON-RPC 2.0; the daemon's
/// own failures live at -32000 and below.
pub mod codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
    pub const CONFIG_INVALID: i32 = -32000;
    pub const CONSISTENCY_FAULT: i32 = -32001;
    pub const TRACK_NOT_FOUND: i32 = -32002;
    pub const SEED_REQUIRED: i32 = -32003;
}

/// Request id as sent by the client, echoed back unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RequestId {
    Integer(i64),
    String(String),
}

impl From<i64> for RequestId {
    fn from(id: i64) -> Self {
        RequestId::Integer(id)
    }
}

impl From<&str> for RequestId {
    fn from(id: &str) -> Self {
        RequestId::String(id.to_owned())
    }
}

/// One request line. `params` defaults to null when absent.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub id: RequestId,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Success envelope around a method result.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse<T: Serialize> {
    pub jsonrpc: &'static str,
    pub id: RequestId,
    pub result: T,
}

impl<T: Serialize> JsonRpcResponse<T> {
    pub fn new(id: RequestId, result: T) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result,
        }
    }
}

/// Failure envelope. `id` is null when the request line could not be parsed.
#[derive(Debug, Serialize)]
pub struct JsonRpcErrorResponse {
    pub jsonrpc: &'static str,
    pub id: Option<RequestId>,
    pub error: JsonRpcError,
}

impl JsonRpcErrorResponse {
    pub fn new(id: Option<RequestId>, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            error,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonRpcErrorData>,
}

/// Machine-readable detail attached to the daemon's own error codes.
#[derive(Debug, Serialize)]
pub struct JsonRpcErrorData {
    /// Same spelling as [`crate::error::ErrorCode::as_str`] where one applies.
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl JsonRpcError {
    fn protocol(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    fn daemon(code: i32, message: &str, error_code: &str, details: String) -> Self {
        Self {
            code,
            message: message.to_owned(),
            data: Some(JsonRpcErrorData {
                error_code: error_code.to_owned(),
                details: Some(details),
            }),
        }
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::protocol(codes::PARSE_ERROR, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::protocol(codes::INVALID_REQUEST, message)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::protocol(codes::METHOD_NOT_FOUND, format!("Method not found: {}", method))
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::protocol(codes::INVALID_PARAMS, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::protocol(codes::INTERNAL_ERROR, message)
    }

    /// A playlist document failed to load; carries the loader's error code.
    pub fn config_invalid(err: &DaemonError) -> Self {
        Self::daemon(
            codes::CONFIG_INVALID,
            "Playlist document rejected",
            err.code.as_str(),
            err.to_string(),
        )
    }

    pub fn consistency_fault(fault: &ConsistencyFault) -> Self {
        Self::daemon(
            codes::CONSISTENCY_FAULT,
            "Catalog inconsistency",
            "CONSISTENCY_FAULT",
            fault.to_string(),
        )
    }

    pub fn track_not_found(track_id: TrackId) -> Self {
        Self::daemon(
            codes::TRACK_NOT_FOUND,
            "Track not found",
            "TRACK_NOT_FOUND",
            format!("No track with id {:#x}", track_id),
        )
    }

    /// Seeded selection was asked for without a seed.
    pub fn seed_required() -> Self {
        Self::daemon(
            codes::SEED_REQUIRED,
            "Seed required",
            "SEED_REQUIRED",
            "Seeded selection needs a seed parameter".to_owned(),
        )
    }
}

// ============================================================================
// Requests
// ============================================================================

/// Parameters for a select request.
#[derive(Debug, Deserialize)]
pub struct SelectParams {
    pub target_id: TargetId,
    /// Required in seeded mode, ignored in unseeded mode.
    #[serde(default)]
    pub seed: Option<u32>,
}

/// Parameters for a get_track request.
#[derive(Debug, Deserialize)]
pub struct GetTrackParams {
    pub track_id: TrackId,
}

/// Parameters for a track_usage request.
#[derive(Debug, Deserialize)]
pub struct TrackUsageParams {
    pub track_ids: Vec<TrackId>,
}

/// Parameters for a reload request.
#[derive(Debug, Default, Deserialize)]
pub struct ReloadParams {
    /// Load from here instead of the current document path.
    #[serde(default)]
    pub path: Option<String>,
}

// ============================================================================
// Responses
// ============================================================================

/// Response for a select request.
#[derive(Debug, Serialize)]
pub struct SelectResult {
    pub target_id: TargetId,
    pub mode: SelectionMode,
    /// None when the target is unmapped or its pool is empty.
    pub track: Option<TrackDescriptor>,
}

/// What an observe request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObserveStatus {
    Unchanged,
    Ignored,
    Selected,
    NoMusic,
}

/// Response for an observe request.
#[derive(Debug, Serialize)]
pub struct ObserveResult {
    pub status: ObserveStatus,
    pub seed_changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track: Option<TrackDescriptor>,
}

/// Response for a track_usage request.
#[derive(Debug, Serialize)]
pub struct TrackUsageResult {
    pub usage: Vec<TrackUsage>,
}

/// Summary of the loaded catalog, returned by reload.
#[derive(Debug, Serialize)]
pub struct CatalogSummary {
    pub path: String,
    pub tracks: usize,
    pub playlists: usize,
    pub targets: usize,
    pub fingerprint: String,
}

impl CatalogSummary {
    pub fn new(path: impl Into<String>, catalog: &Catalog) -> Self {
        Self {
            path: path.into(),
            tracks: catalog.track_count(),
            playlists: catalog.group_count(),
            targets: catalog.target_count(),
            fingerprint: catalog.fingerprint(),
        }
    }
}

// ============================================================================
// Notifications
// ============================================================================

/// A JSON-RPC notification (no id field).
#[derive(Debug, Serialize)]
pub struct JsonRpcNotification<T: Serialize> {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: T,
}

impl<T: Serialize> JsonRpcNotification<T> {
    pub fn new(method: &'static str, params: T) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method,
            params,
        }
    }
}

/// Notification sent when an observed target change selects a track.
#[derive(Debug, Serialize)]
pub struct TrackSelectedParams {
    pub target_id: TargetId,
    pub previous_target_id: Option<TargetId>,
    pub seed: u32,
    pub mode: SelectionMode,
    pub track: TrackDescriptor,
    /// Catalog fingerprint, for comparing configuration across instances.
    pub fingerprint: String,
}
