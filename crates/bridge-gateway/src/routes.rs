//! HTTP endpoint layer. Handlers decode the request, call one orchestrator and encode
//! its value; fallbacks are logged in the core and never reach the client as errors.

use crate::error::ApiError;
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, FromRequest, Multipart, Request, State},
    http::header,
    routing::{get, post},
    Json, Router,
};
use bridge_core::discovery::DEFAULT_TOP_K;
use bridge_core::{
    Bridge, ChatMessage, ChatReply, DiscoveredHelper, ExtractionMode, HelperExtraction,
    HelperNarrative, HelperSummary, Node, RiskLevel, SeekerProfile, Theme,
};
use bridge_voice::stt::is_http_url;
use bridge_voice::{AudioClip, SttBackend};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Uploads up to this size are accepted on `/transcribe`.
const MAX_AUDIO_BYTES: usize = 25 * 1024 * 1024;

pub struct AppState {
    pub bridge: Bridge,
    pub stt: Arc<dyn SttBackend>,
    pub http: reqwest::Client,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(bridge: Bridge, stt: Arc<dyn SttBackend>) -> Self {
        Self {
            bridge,
            stt,
            http: reqwest::Client::new(),
            started_at: Utc::now(),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/helpers", get(list_helpers))
        .route(
            "/transcribe",
            post(transcribe).layer(DefaultBodyLimit::max(MAX_AUDIO_BYTES)),
        )
        .route("/extract-profile", post(extract_profile))
        .route("/match", post(match_helpers))
        .route("/discover", post(discover))
        .route("/safety-check", post(safety_check))
        .route("/scaffold", post(scaffold))
        .with_state(state)
        .layer(axum::middleware::from_fn(crate::log_requests))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct TranscribeRequest {
    #[serde(default)]
    audio_url: Option<String>,
}

#[derive(Serialize)]
struct TranscribeResponse {
    transcript: String,
}

#[derive(Deserialize, Default)]
struct ExtractProfileRequest {
    #[serde(default)]
    mode: ExtractionMode,
    #[serde(default)]
    transcript: Option<String>,
    #[serde(default)]
    messages: Option<Vec<ChatMessage>>,
    #[serde(default)]
    narrative: Option<String>,
    #[serde(default)]
    selected_themes: Option<Vec<String>>,
    #[serde(default)]
    theme_narratives: Option<BTreeMap<String, String>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum ExtractProfileResponse {
    Seeker(SeekerProfile),
    Helper(HelperExtraction),
    Chat(ChatReply),
}

#[derive(Deserialize)]
struct MatchRequest {
    seeker_profile: SeekerProfile,
    #[serde(default)]
    helper_ids: Option<Vec<String>>,
}

#[derive(Serialize)]
struct MatchResponse {
    matches: Node,
}

#[derive(Deserialize)]
struct DiscoverRequest {
    theme_name: String,
    #[serde(default = "default_top_k")]
    top_k: usize,
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

#[derive(Serialize)]
struct DiscoverResponse {
    helpers: Vec<DiscoveredHelper>,
}

#[derive(Deserialize)]
struct SafetyRequest {
    transcript: String,
}

#[derive(Serialize)]
struct SafetyResponse {
    risk_level: RiskLevel,
}

#[derive(Deserialize)]
struct ScaffoldRequest {
    mode: String,
    system_prompt: String,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ScaffoldResponse {
    suggestion: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    helpers_loaded: usize,
    openai_available: bool,
    embedding_mode: &'static str,
    started_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct HelpersResponse {
    count: usize,
    helpers: Vec<HelperSummary>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        helpers_loaded: state.bridge.pool().len(),
        openai_available: state.bridge.ai_available(),
        embedding_mode: state.bridge.embedding_mode(),
        started_at: state.started_at,
    })
}

/// Debug listing of the helper pool.
async fn list_helpers(State(state): State<Arc<AppState>>) -> Json<HelpersResponse> {
    let pool = state.bridge.pool();
    Json(HelpersResponse {
        count: pool.len(),
        helpers: pool.summaries(),
    })
}

/// POST /transcribe: multipart upload (field `file`) or JSON `{audio_url}`.
async fn transcribe(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<TranscribeResponse>, ApiError> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let clip = if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        tracing::info!("/transcribe requested (file=true)");
        uploaded_clip(multipart).await?
    } else if content_type.starts_with("application/json") {
        let Json(body) = Json::<TranscribeRequest>::from_request(request, &state).await?;
        let url = body
            .audio_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        tracing::info!("/transcribe requested (url={:?})", url);
        match url {
            Some(url) if is_http_url(&url) => Some(AudioClip::fetch(&state.http, &url).await?),
            Some(url) => {
                return Err(ApiError::BadRequest(format!(
                    "audio_url must be an http(s) URL: {}",
                    url
                )))
            }
            None => None,
        }
    } else {
        None
    };

    let Some(clip) = clip else {
        return Err(ApiError::BadRequest("Provide audio file or audio_url".to_string()));
    };

    let transcript = state.stt.transcribe(&clip).await?;
    tracing::info!(
        "/transcribe completed (backend={}, chars={})",
        state.stt.name(),
        transcript.chars().count()
    );
    Ok(Json(TranscribeResponse { transcript }))
}

async fn uploaded_clip(mut multipart: Multipart) -> Result<Option<AudioClip>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("audio.wav").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        return Ok(Some(AudioClip::new(bytes.to_vec(), file_name)));
    }
    Ok(None)
}

async fn extract_profile(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ExtractProfileRequest>, JsonRejection>,
) -> Result<Json<ExtractProfileResponse>, ApiError> {
    let Json(req) = payload?;
    tracing::info!(
        "/extract-profile requested (mode={:?}, ai={})",
        req.mode,
        state.bridge.ai_available()
    );
    let extractor = &state.bridge.extractor;

    let response = match req.mode {
        ExtractionMode::SeekerChat => {
            let messages = req.messages.unwrap_or_default();
            ExtractProfileResponse::Chat(extractor.seeker_chat(&messages).await.into_value())
        }
        ExtractionMode::ExtractHelper => {
            let input = helper_narrative(req.narrative, req.selected_themes, req.theme_narratives);
            ExtractProfileResponse::Helper(extractor.extract_helper(&input).await.into_value())
        }
        ExtractionMode::ExtractSeeker | ExtractionMode::Other => {
            let transcript = req.transcript.unwrap_or_default();
            ExtractProfileResponse::Seeker(extractor.extract_seeker(&transcript).await.into_value())
        }
    };
    tracing::info!("/extract-profile completed (mode={:?})", req.mode);
    Ok(Json(response))
}

/// Theme names are free text on the wire; names outside the closed set are dropped.
fn helper_narrative(
    narrative: Option<String>,
    selected_themes: Option<Vec<String>>,
    theme_narratives: Option<BTreeMap<String, String>>,
) -> HelperNarrative {
    let known = |name: &str| {
        let theme = Theme::from_name(name);
        if theme.is_none() {
            tracing::warn!("/extract-profile ignoring unknown theme {:?}", name);
        }
        theme
    };
    HelperNarrative {
        narrative,
        selected_themes: selected_themes
            .unwrap_or_default()
            .iter()
            .filter_map(|name| known(name))
            .collect(),
        theme_narratives: theme_narratives
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(name, story)| known(&name).map(|t| (t, story)))
            .collect(),
    }
}

async fn match_helpers(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<MatchRequest>, JsonRejection>,
) -> Result<Json<MatchResponse>, ApiError> {
    let Json(MatchRequest {
        mut seeker_profile,
        helper_ids,
    }) = payload?;
    tracing::info!(
        "/match requested (helper_ids={})",
        helper_ids.as_ref().map_or(0, |ids| ids.len())
    );
    let matches = state
        .bridge
        .matching
        .match_payload(&mut seeker_profile, helper_ids.as_deref())
        .into_value();
    Ok(Json(MatchResponse { matches }))
}

async fn discover(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DiscoverRequest>, JsonRejection>,
) -> Result<Json<DiscoverResponse>, ApiError> {
    let Json(req) = payload?;
    tracing::info!("/discover requested (theme={}, top_k={})", req.theme_name, req.top_k);
    let helpers = match Theme::from_name(&req.theme_name) {
        Some(theme) => state.bridge.discovery.discover(theme, req.top_k).into_value(),
        None => {
            tracing::warn!("/discover unknown theme {:?}, no helpers", req.theme_name);
            Vec::new()
        }
    };
    tracing::info!("/discover completed (helpers={})", helpers.len());
    Ok(Json(DiscoverResponse { helpers }))
}

async fn safety_check(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SafetyRequest>, JsonRejection>,
) -> Result<Json<SafetyResponse>, ApiError> {
    let Json(req) = payload?;
    tracing::info!("/safety-check requested (ai={})", state.bridge.ai_available());
    let risk_level = state.bridge.safety.classify(&req.transcript).await.into_value();
    Ok(Json(SafetyResponse { risk_level }))
}

async fn scaffold(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ScaffoldRequest>, JsonRejection>,
) -> Result<Json<ScaffoldResponse>, ApiError> {
    let Json(req) = payload?;
    tracing::info!(
        "/scaffold requested (mode={}, ai={})",
        req.mode,
        state.bridge.ai_available()
    );
    let suggestion = state
        .bridge
        .scaffold
        .suggest(&req.mode, &req.system_prompt, &req.messages)
        .await
        .into_value();
    Ok(Json(ScaffoldResponse { suggestion }))
}
