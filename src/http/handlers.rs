//! Room API handlers
//!
//! Each handler parses the room code, calls into the room store and shapes
//! the result into the response schema. Store calls never suspend, so they
//! run inline on the request task.

use crate::http::error::ApiError;
use crate::http::messages::{
    GetQueueRequest, GetQueueResponse, JoinRequest, JoinResponse, QueueRequest, QueueResponse,
    RankingRequest, RankingResponse, RemoveRequest, RemoveResponse, SetupRequest, SetupResponse,
};
use crate::http::server::HttpServerState;
use axum::{extract::rejection::JsonRejection, extract::State, Json};
use tracing::debug;

type ApiResult<T> = Result<Json<T>, ApiError>;

/// `POST /setup`: create (or replace) a room with its host
pub async fn setup(
    State(state): State<HttpServerState>,
    payload: Result<Json<SetupRequest>, JsonRejection>,
) -> ApiResult<SetupResponse> {
    let Json(request) = payload?;
    let code = request.room_code.parse()?;
    debug!("Setup requested for room {} by '{}'", code, request.host_name);

    let snapshot = state
        .app_state
        .room_store()
        .create_room(code, &request.host_name)?;
    Ok(Json(snapshot.into()))
}

/// `POST /join`: add a guest to an existing room
pub async fn join(
    State(state): State<HttpServerState>,
    payload: Result<Json<JoinRequest>, JsonRejection>,
) -> ApiResult<JoinResponse> {
    let Json(request) = payload?;
    let code = request.query.parse()?;
    debug!("Join requested for room {} by '{}'", code, request.guest_name);

    let joined = state
        .app_state
        .room_store()
        .join_room(code, &request.guest_name)?;
    Ok(Json(joined.into()))
}

/// `POST /queue`: reconcile a client's song list with the room queue
pub async fn submit_queue(
    State(state): State<HttpServerState>,
    payload: Result<Json<QueueRequest>, JsonRejection>,
) -> ApiResult<QueueResponse> {
    let Json(request) = payload?;
    let code = request.room_code.parse()?;
    debug!(
        "Queue submitted for room {} with {} songs",
        code,
        request.songs.len()
    );

    let snapshot = state
        .app_state
        .room_store()
        .reconcile(code, &request.songs)?;
    Ok(Json(snapshot.into()))
}

/// `POST /rankings`: apply a vote and return the re-ranked queue
pub async fn rankings(
    State(state): State<HttpServerState>,
    payload: Result<Json<RankingRequest>, JsonRejection>,
) -> ApiResult<RankingResponse> {
    let Json(request) = payload?;
    let code = request.r_code.parse()?;
    let direction = request.direction();
    debug!(
        "Vote {:?} on '{}' in room {}",
        direction, request.to_change, code
    );

    let outcome = state
        .app_state
        .room_store()
        .vote(code, &request.to_change, direction)?;
    Ok(Json(outcome.into()))
}

/// `POST /remove`: drop a track and report the remaining dedup keys
pub async fn remove(
    State(state): State<HttpServerState>,
    payload: Result<Json<RemoveRequest>, JsonRejection>,
) -> ApiResult<RemoveResponse> {
    let Json(request) = payload?;
    let code = request.code.parse()?;
    debug!("Removal of '{}' requested in room {}", request.song_uri, code);

    let song_set = state
        .app_state
        .room_store()
        .remove_song(code, &request.song_uri)?;
    Ok(Json(RemoveResponse { song_set }))
}

/// `POST /getBackQueue`: read a room's queue
pub async fn get_queue(
    State(state): State<HttpServerState>,
    payload: Result<Json<GetQueueRequest>, JsonRejection>,
) -> ApiResult<GetQueueResponse> {
    let Json(request) = payload?;
    let code = request.room_code.parse()?;

    let song_list = state.app_state.room_store().queue(code)?;
    Ok(Json(GetQueueResponse { song_list }))
}
