use anyhow::{Context, Result};
use axum::{extract::{Path, Query, State}, http::{HeaderMap, StatusCode}, routing::{get, post}, Json, Router};
use cinematch_core::config::{IndexConfig, SourceColumns, DEFAULT_TOP_N};
use cinematch_core::display::{genres, poster_or_placeholder};
use cinematch_core::persist::{load_index, IndexPaths};
use cinematch_core::{corpus, IndexHandle, ItemRecord, ReadyIndex, Recommender};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub const MAX_K: usize = 100;

/// Where the served index comes from.
#[derive(Debug, Clone)]
pub enum IndexSource {
    /// Load the item table and build at startup; `/admin/reload` rebuilds from it.
    Data { path: PathBuf, columns: SourceColumns },
    /// Load a snapshot written by the indexer.
    Snapshot(PathBuf),
}

#[derive(Debug, Clone)]
pub struct AppOptions {
    pub source: IndexSource,
    pub config: IndexConfig,
    pub admin_token: Option<String>,
}

#[derive(Deserialize)]
pub struct RecommendParams {
    pub title: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { DEFAULT_TOP_N }

#[derive(Serialize)]
pub struct RecommendResponse {
    pub query: String,
    pub took_ms: u128,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<RecommendationHit>,
}

#[derive(Serialize)]
pub struct RecommendationHit {
    pub position: usize,
    pub score: f32,
    pub title: String,
    pub poster: String,
    pub genres: Option<String>,
    pub director: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

impl RecommendationHit {
    fn new(record: &ItemRecord, score: f32) -> Self {
        Self {
            position: record.position,
            score,
            title: record.key.clone(),
            poster: poster_or_placeholder(record).to_string(),
            genres: genres(record),
            director: record.field("director").map(str::to_string),
            metadata: record.metadata.clone(),
        }
    }
}

#[derive(Serialize)]
pub struct TitlesResponse {
    pub total: usize,
    pub titles: Vec<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub handle: Arc<IndexHandle>,
    pub options: Arc<AppOptions>,
}

/// Build the initial index. Any load failure is fatal for the caller.
pub fn load_initial(options: &AppOptions) -> Result<ReadyIndex> {
    match &options.source {
        IndexSource::Data { path, columns } => {
            let corpus = corpus::load(path, columns).with_context(|| format!("loading {}", path.display()))?;
            Ok(ReadyIndex::build(corpus, &options.config))
        }
        IndexSource::Snapshot(dir) => load_index(&IndexPaths::new(dir)),
    }
}

pub fn build_app(options: AppOptions) -> Result<Router> {
    let index = load_initial(&options)?;
    Ok(router(AppState { handle: Arc::new(IndexHandle::new(index)), options: Arc::new(options) }))
}

pub fn router(app_state: AppState) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/titles", get(titles_handler))
        .route("/recommend", get(recommend_handler))
        .route("/item/:title", get(item_handler))
        .route("/admin/reload", post(reload_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn recommend_handler(State(state): State<AppState>, Query(params): Query<RecommendParams>) -> Json<RecommendResponse> {
    let start = std::time::Instant::now();
    let recommender = Recommender::new(state.handle.current());
    let k = params.k.clamp(1, MAX_K);
    let results: Vec<RecommendationHit> = recommender
        .recommend_scored(&params.title, k)
        .into_iter()
        .map(|r| RecommendationHit::new(r.record, r.score))
        .collect();
    let elapsed = start.elapsed();
    tracing::debug!(title = %params.title, hits = results.len(), "recommend");
    Json(RecommendResponse {
        query: params.title,
        took_ms: elapsed.as_millis(),
        took_s: elapsed.as_secs_f64(),
        total_hits: results.len(),
        results,
    })
}

pub async fn titles_handler(State(state): State<AppState>) -> Json<TitlesResponse> {
    let index = state.handle.current();
    let titles: Vec<String> = index.corpus().all_keys().into_iter().map(str::to_string).collect();
    Json(TitlesResponse { total: titles.len(), titles })
}

pub async fn item_handler(State(state): State<AppState>, Path(title): Path<String>) -> (StatusCode, Json<serde_json::Value>) {
    let index = state.handle.current();
    match index.corpus().get(&title) {
        Some(record) => (StatusCode::OK, Json(serde_json::json!({
            "position": record.position,
            "title": record.key,
            "poster": poster_or_placeholder(record),
            "genres": genres(record),
            "metadata": record.metadata,
        }))),
        None => (StatusCode::NOT_FOUND, Json(serde_json::json!({ "error": "not found" }))),
    }
}

/// Rebuild from the configured data source and swap the new index in.
async fn reload_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    let IndexSource::Data { path, columns } = state.options.source.clone() else {
        return Err((StatusCode::CONFLICT, "server was started from a snapshot; nothing to reload".into()));
    };
    let handle = state.handle.clone();
    let config = state.options.config.clone();
    let reloaded = tokio::task::spawn_blocking(move || handle.reload(&path, &columns, &config))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    match reloaded {
        Ok(index) => {
            tracing::info!(items = index.corpus().len(), "index reloaded");
            Ok(Json(serde_json::json!({ "items": index.corpus().len(), "fingerprint": index.fingerprint() })))
        }
        Err(err) => {
            tracing::warn!(%err, "reload failed, keeping current index");
            Err((StatusCode::UNPROCESSABLE_ENTITY, err.to_string()))
        }
    }
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), (StatusCode, String)> {
    let required = match &state.options.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}
