//! Device registry and wake endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use super::{ApiError, ApiState};
use crate::device::{Device, DeviceUpdate};
use crate::mac::validate_mac;
use crate::wake::WakeResult;

/// Build device CRUD router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/", get(list_devices).post(create_device))
        .route(
            "/{name}",
            get(get_device)
                .put(update_device)
                .patch(update_device)
                .delete(delete_device),
        )
        .route("/{name}/wake", post(wake_device))
        .with_state(state)
}

/// Build wake router
pub fn wake_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/", post(wake_mac))
        .route("/all", post(wake_all))
        .route("/batch", post(wake_batch))
        .with_state(state)
}

/// Wake a bare MAC address
#[derive(Debug, Deserialize)]
pub struct WakeRequest {
    pub mac: String,
    #[serde(default)]
    pub broadcast: Option<String>,
}

/// Wake a list of registered devices by name
#[derive(Debug, Deserialize)]
pub struct BatchWakeRequest {
    pub names: Vec<String>,
}

type ApiResult<T> = Result<T, ApiError>;

fn not_found(name: &str) -> ApiError {
    ApiError::NotFound(format!("device not found: {name}"))
}

/// 200 when the packet left, 500 when it did not; the body is the result either way
fn wake_response(result: WakeResult) -> (StatusCode, Json<WakeResult>) {
    let status = if result.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(result))
}

async fn list_devices(State(state): State<Arc<ApiState>>) -> ApiResult<Json<Vec<Device>>> {
    Ok(Json(state.registry.list()?))
}

async fn get_device(
    State(state): State<Arc<ApiState>>,
    Path(name): Path<String>,
) -> ApiResult<Json<Device>> {
    state
        .registry
        .get(&name)?
        .map(Json)
        .ok_or_else(|| not_found(&name))
}

async fn create_device(
    State(state): State<Arc<ApiState>>,
    Json(device): Json<Device>,
) -> ApiResult<(StatusCode, Json<Device>)> {
    validate_mac(&device.mac)?;
    state.registry.add(&device)?;
    Ok((StatusCode::CREATED, Json(device)))
}

async fn update_device(
    State(state): State<Arc<ApiState>>,
    Path(name): Path<String>,
    Json(update): Json<DeviceUpdate>,
) -> ApiResult<Json<Device>> {
    if let Some(mac) = &update.mac {
        validate_mac(mac)?;
    }

    if !state.registry.update(&name, &update)? {
        return Err(not_found(&name));
    }

    let current = update.name.as_deref().unwrap_or(&name);
    state
        .registry
        .get(current)?
        .map(Json)
        .ok_or_else(|| not_found(current))
}

async fn delete_device(
    State(state): State<Arc<ApiState>>,
    Path(name): Path<String>,
) -> ApiResult<StatusCode> {
    if state.registry.remove(&name)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(&name))
    }
}

async fn wake_device(
    State(state): State<Arc<ApiState>>,
    Path(name): Path<String>,
) -> ApiResult<(StatusCode, Json<WakeResult>)> {
    let device = state.registry.get(&name)?.ok_or_else(|| not_found(&name))?;
    Ok(wake_response(state.dispatcher.wake_device(&device).await))
}

async fn wake_mac(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<WakeRequest>,
) -> ApiResult<(StatusCode, Json<WakeResult>)> {
    validate_mac(&req.mac)?;
    let result = state.dispatcher.wake(&req.mac, req.broadcast.as_deref()).await;
    Ok(wake_response(result))
}

async fn wake_all(State(state): State<Arc<ApiState>>) -> ApiResult<Json<Vec<WakeResult>>> {
    let devices = state.registry.list()?;
    Ok(Json(state.dispatcher.wake_multiple(&devices).await))
}

/// Unknown names yield a failed result in their position
async fn wake_batch(
    State(state): State<Arc<ApiState>>,
    Json(req): Json<BatchWakeRequest>,
) -> ApiResult<Json<Vec<WakeResult>>> {
    let mut resolved = Vec::with_capacity(req.names.len());
    for name in &req.names {
        resolved.push(state.registry.get(name)?);
    }

    let found: Vec<Device> = resolved.iter().flatten().cloned().collect();
    let mut woken = state.dispatcher.wake_multiple(&found).await.into_iter();

    let results = req
        .names
        .into_iter()
        .zip(resolved)
        .map(|(name, device)| match device {
            Some(_) => woken.next().unwrap_or_else(|| missing(name)),
            None => missing(name),
        })
        .collect();

    Ok(Json(results))
}

fn missing(name: String) -> WakeResult {
    WakeResult {
        success: false,
        message: format!("Device not found: {name}"),
        device: name,
        mac: String::new(),
    }
}
