//! JSON-RPC method handlers.
//!
//! Implements the handlers for all supported JSON-RPC methods.

use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::driver::{Observation, PollEvent, PollOutcome};
use crate::inspect::{unused_tracks, Inspector};
use crate::selection::{select_with_mode, SelectionMode};

use super::server::ServerState;
use super::types::{
    CatalogSummary, GetTrackParams, JsonRpcError, ObserveResult, ObserveStatus,
    ReloadParams, SelectParams, SelectResult, TrackSelectedParams, TrackUsageParams,
    TrackUsageResult,
};

type MethodResult = Result<serde_json::Value, JsonRpcError>;

/// Handles a JSON-RPC method call.
pub fn handle_request(
    method: &str,
    params: serde_json::Value,
    state: &mut ServerState,
) -> MethodResult {
    match method {
        "select" => handle_select(params, state),
        "observe" => handle_observe(params, state),
        "get_track" => handle_get_track(params, state),
        "unused_tracks" => handle_unused_tracks(state),
        "track_usage" => handle_track_usage(params, state),
        "reload" => handle_reload(params, state),
        "ping" => handle_ping(state),
        "shutdown" => handle_shutdown(state),
        _ => Err(JsonRpcError::method_not_found(method)),
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(params: serde_json::Value) -> Result<T, JsonRpcError> {
    serde_json::from_value(params)
        .map_err(|e| JsonRpcError::invalid_params(format!("Invalid params: {}", e)))
}

fn to_result<T: Serialize>(value: T) -> MethodResult {
    serde_json::to_value(value).map_err(|e| JsonRpcError::internal_error(e.to_string()))
}

/// Handles the ping method for health checks.
fn handle_ping(state: &ServerState) -> MethodResult {
    Ok(serde_json::json!({
        "status": "ok",
        "fingerprint": state.catalog().fingerprint()
    }))
}

/// Handles the shutdown method.
fn handle_shutdown(state: &mut ServerState) -> MethodResult {
    state.shutdown();
    Ok(serde_json::json!({ "status": "shutting_down" }))
}

/// Handles the select method: one selection, no change detection.
fn handle_select(params: serde_json::Value, state: &mut ServerState) -> MethodResult {
    let params: SelectParams = parse_params(params)?;
    let mode = state.config.selection_mode;
    let seed = match (mode, params.seed) {
        (SelectionMode::Seeded, None) => return Err(JsonRpcError::seed_required()),
        (_, seed) => seed.unwrap_or_default(),
    };

    let catalog = state.catalog();
    let track = select_with_mode(&catalog, mode, params.target_id, seed)
        .map_err(|fault| JsonRpcError::consistency_fault(&fault))?
        .map(|track| track.descriptor());

    to_result(SelectResult {
        target_id: params.target_id,
        mode,
        track,
    })
}

/// Handles the observe method: one poll of the game state.
///
/// Selects only when the target id changed to a non-ignored value, and
/// queues a `track_selected` notification for the pick.
fn handle_observe(params: serde_json::Value, state: &mut ServerState) -> MethodResult {
    let observation: Observation = parse_params(params)?;
    let PollOutcome {
        event,
        seed_changed,
    } = state.poll.observe(observation);

    let status = |status| ObserveResult {
        status,
        seed_changed,
        track: None,
    };
    let previous = match event {
        PollEvent::Unchanged => return to_result(status(ObserveStatus::Unchanged)),
        PollEvent::Ignored(_) => return to_result(status(ObserveStatus::Ignored)),
        PollEvent::Changed { from, .. } => from,
    };

    let mode = state.config.selection_mode;
    let catalog = state.catalog();
    let selected = select_with_mode(&catalog, mode, observation.target_id, observation.seed)
        .map_err(|fault| JsonRpcError::consistency_fault(&fault))?;

    let Some(track) = selected else {
        warn!("No music entry found for music id {:#x}.", observation.target_id);
        return to_result(status(ObserveStatus::NoMusic));
    };

    info!("Selected {}", track);
    let descriptor = track.descriptor();
    state.notify(
        "track_selected",
        TrackSelectedParams {
            target_id: observation.target_id,
            previous_target_id: previous,
            seed: observation.seed,
            mode,
            track: descriptor.clone(),
            fingerprint: catalog.fingerprint(),
        },
    );

    to_result(ObserveResult {
        status: ObserveStatus::Selected,
        seed_changed,
        track: Some(descriptor),
    })
}

/// Handles the get_track method.
fn handle_get_track(params: serde_json::Value, state: &ServerState) -> MethodResult {
    let params: GetTrackParams = parse_params(params)?;
    let catalog = state.catalog();
    let track = catalog
        .track(params.track_id)
        .ok_or_else(|| JsonRpcError::track_not_found(params.track_id))?;
    to_result(track.descriptor())
}

/// Handles the unused_tracks method.
fn handle_unused_tracks(state: &ServerState) -> MethodResult {
    to_result(unused_tracks(&state.catalog()))
}

/// Handles the track_usage method.
fn handle_track_usage(params: serde_json::Value, state: &ServerState) -> MethodResult {
    let params: TrackUsageParams = parse_params(params)?;
    let catalog = state.catalog();
    let usage = Inspector::new(&catalog).usage_many(&params.track_ids);
    to_result(TrackUsageResult { usage })
}

/// Handles the reload method.
fn handle_reload(params: serde_json::Value, state: &mut ServerState) -> MethodResult {
    let params: ReloadParams = if params.is_null() {
        ReloadParams::default()
    } else {
        parse_params(params)?
    };

    let catalog = state
        .reload(params.path.as_deref().map(Path::new))
        .map_err(|e| JsonRpcError::config_invalid(&e))?;

    to_result(CatalogSummary::new(
        state.catalog_path().display().to_string(),
        &catalog,
    ))
}
