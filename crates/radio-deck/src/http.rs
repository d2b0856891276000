use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use radio_engine::DeckEvent;
use radio_proto::protocol::{Command, DeckState, PlayerId};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::frame::{Frame, FrameSurface};
use crate::view::{BackgroundCss, RenderedView, SharedBackground, SharedViews};

pub type Surfaces = Arc<BTreeMap<PlayerId, Arc<Mutex<FrameSurface>>>>;

#[derive(Clone)]
pub struct HttpState {
    pub state_rx: watch::Receiver<DeckState>,
    pub event_tx: mpsc::Sender<DeckEvent>,
    pub views: SharedViews,
    pub background: SharedBackground,
    pub surfaces: Surfaces,
}

#[derive(Serialize)]
struct ApiState {
    #[serde(flatten)]
    deck: DeckState,
    views: BTreeMap<PlayerId, RenderedView>,
    background: BackgroundCss,
}

pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/api/state", get(get_state))
        .route("/api/players/:id/play", post(play))
        .route("/api/players/:id/pause", post(pause))
        .route("/api/players/:id/toggle", post(toggle))
        .route("/api/players/:id/mute", post(toggle_mute))
        .route("/api/players/:id/volume/:value", post(set_volume))
        .route("/api/players/:id/frame", get(get_frame))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub fn start_server(
    bind_address: String,
    port: u16,
    state: HttpState,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let app = router(state);

        let addr = format!("{}:{}", bind_address, port);
        let listener = match TcpListener::bind(&addr).await {
            Ok(l) => l,
            Err(e) => {
                error!("Failed to bind HTTP server to {}: {}", addr, e);
                return;
            }
        };

        info!("HTTP API server listening on http://{}", addr);

        if let Err(e) = axum::serve(listener, app).await {
            error!("HTTP server error: {}", e);
        }
    })
}

async fn get_state(State(state): State<HttpState>) -> Json<ApiState> {
    let deck = state.state_rx.borrow().clone();
    let views = state
        .views
        .read()
        .map(|v| v.clone())
        .unwrap_or_default();
    let background = state
        .background
        .read()
        .map(|b| b.clone())
        .unwrap_or_default();
    Json(ApiState {
        deck,
        views,
        background,
    })
}

async fn get_frame(
    State(state): State<HttpState>,
    Path(id): Path<String>,
) -> Result<Json<Frame>, StatusCode> {
    let surface = state
        .surfaces
        .get(&PlayerId::new(id))
        .ok_or(StatusCode::NOT_FOUND)?;
    let frame = surface
        .lock()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .frame();
    Ok(Json(frame))
}

/// Forward a command for a known player to the coordinator.
async fn dispatch(state: &HttpState, cmd: Command) -> StatusCode {
    let known = state
        .state_rx
        .borrow()
        .players
        .iter()
        .any(|p| &p.id == cmd.player());
    if !known {
        return StatusCode::NOT_FOUND;
    }
    info!("HTTP API: {:?}", cmd);
    if state.event_tx.send(DeckEvent::Command(cmd)).await.is_err() {
        error!("Failed to send command: coordinator gone");
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    StatusCode::OK
}

async fn play(State(state): State<HttpState>, Path(id): Path<String>) -> StatusCode {
    let player = PlayerId::new(id);
    dispatch(&state, Command::Play { player }).await
}

async fn pause(State(state): State<HttpState>, Path(id): Path<String>) -> StatusCode {
    let player = PlayerId::new(id);
    dispatch(&state, Command::Pause { player }).await
}

async fn toggle(State(state): State<HttpState>, Path(id): Path<String>) -> StatusCode {
    let player = PlayerId::new(id);
    dispatch(&state, Command::Toggle { player }).await
}

async fn toggle_mute(State(state): State<HttpState>, Path(id): Path<String>) -> StatusCode {
    let player = PlayerId::new(id);
    dispatch(&state, Command::ToggleMute { player }).await
}

async fn set_volume(
    State(state): State<HttpState>,
    Path((id, value)): Path<(String, u16)>,
) -> StatusCode {
    let cmd = Command::Volume {
        player: PlayerId::new(id),
        value: value.min(100) as u8,
    };
    dispatch(&state, cmd).await
}
