#![cfg(feature = "web")]
//! HTTP transport for the artifact store and dashboards.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State, multipart::MultipartError},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use log::{info, warn};
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::config::Config;
use crate::dashboard::{DashboardSpec, load_dashboard};
use crate::error::{DashboardError, StoreError};
use crate::fs_store::FsArtifactStore;
use crate::graph::render_svg;
use crate::producer::{LoggingProducer, ResultProducer};
use crate::store::{ArtifactStore, ResultFile, ResultFolder};

/// Acknowledgment returned by the root health check
pub const HEALTH_MESSAGE: &str = "Sheetdash backend running";

/// Multipart field carrying the uploaded spreadsheet
const UPLOAD_FIELD: &str = "file";

pub struct AppState {
    store: Arc<dyn ArtifactStore>,
    producer: Arc<dyn ResultProducer>,
}

impl AppState {
    pub fn new(store: Arc<dyn ArtifactStore>, producer: Arc<dyn ResultProducer>) -> Self {
        Self { store, producer }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    message: &'static str,
}

#[derive(Serialize)]
struct UploadResponse {
    filename: String,
    message: &'static str,
}

#[derive(Serialize)]
struct FolderSummary {
    id: String,
    name: String,
    /// Last modification time, Unix seconds
    created: f64,
    file_count: usize,
}

impl From<ResultFolder> for FolderSummary {
    fn from(folder: ResultFolder) -> Self {
        let created = folder.modified.timestamp() as f64
            + f64::from(folder.modified.timestamp_subsec_nanos()) / 1e9;
        Self {
            name: folder.id.clone(),
            id: folder.id,
            created,
            file_count: folder.file_count,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

/// Failure of a request, mapped onto an HTTP status with a `{"detail": ...}` body
#[derive(Debug)]
pub enum ApiError {
    Store(StoreError),
    Dashboard(DashboardError),
    Multipart(MultipartError),
    MissingFile,
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}

impl From<DashboardError> for ApiError {
    fn from(err: DashboardError) -> Self {
        ApiError::Dashboard(err)
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::Multipart(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Store(StoreError::UnsupportedFileType(_) | StoreError::InvalidFileName(_)) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Store(StoreError::FolderNotFound(_) | StoreError::FileNotFound { .. }) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Store(StoreError::StorageWrite(_) | StoreError::Io(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Dashboard(DashboardError::Render(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Dashboard(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Multipart(err) => err.status(),
            ApiError::MissingFile => StatusCode::BAD_REQUEST,
        }
    }

    fn detail(&self) -> String {
        match self {
            ApiError::Store(err) => err.to_string(),
            ApiError::Dashboard(err) => err.to_string(),
            ApiError::Multipart(err) => err.body_text(),
            ApiError::MissingFile => format!("Missing multipart field '{}'", UPLOAD_FIELD),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = self.detail();
        if status.is_server_error() {
            warn!("{}", detail);
        }
        (status, Json(ErrorResponse { detail })).into_response()
    }
}

/// Builds the router over any artifact store
pub fn router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/upload", post(upload_file))
        .route("/processed", get(list_processed_folders))
        .route("/processed/:folder_id", get(list_folder_contents))
        .route("/download/:folder_id/:filename", get(download_file))
        .route("/dashboard/:folder_id/:filename", get(dashboard_spec))
        .route("/visualize/:folder_id/:filename", get(visualize_file))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Starts the server with a filesystem-backed store
pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let store = FsArtifactStore::new(&config.upload_dir, &config.output_dir);
    store.ensure_namespaces()?;

    let state = Arc::new(AppState::new(Arc::new(store), Arc::new(LoggingProducer)));
    let app = router(state, config.max_upload_bytes());

    let address = config.bind_address();
    let listener = TcpListener::bind(&address).await?;
    info!("Listening on http://{}", address);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn root() -> Json<HealthResponse> {
    Json(HealthResponse {
        message: HEALTH_MESSAGE,
    })
}

async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await?;
        let mut content: &[u8] = &data;

        let upload = state.store.accept_upload(&filename, &mut content)?;
        state.producer.on_upload(&upload);

        return Ok(Json(UploadResponse {
            filename: upload.filename,
            message: "File uploaded successfully",
        }));
    }

    Err(ApiError::MissingFile)
}

async fn list_processed_folders(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<FolderSummary>>, ApiError> {
    let folders = state.store.list_result_folders()?;
    Ok(Json(folders.into_iter().map(FolderSummary::from).collect()))
}

async fn list_folder_contents(
    State(state): State<Arc<AppState>>,
    Path(folder_id): Path<String>,
) -> Result<Json<Vec<ResultFile>>, ApiError> {
    Ok(Json(state.store.list_folder_contents(&folder_id)?))
}

async fn download_file(
    State(state): State<Arc<AppState>>,
    Path((folder_id, filename)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let handle = state.store.get_file(&folder_id, &filename)?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        handle.filename.replace('"', "\\\"")
    );

    Ok((
        [
            (header::CONTENT_TYPE, handle.media_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        handle.bytes,
    )
        .into_response())
}

/// Loads a result file through the store and builds its dashboard
fn build_for(state: &AppState, folder_id: &str, filename: &str) -> Result<DashboardSpec, ApiError> {
    let handle = state.store.get_file(folder_id, filename)?;
    let source = format!("{}/{}", folder_id, filename);
    Ok(load_dashboard(handle.bytes.as_slice(), &source)?)
}

async fn dashboard_spec(
    State(state): State<Arc<AppState>>,
    Path((folder_id, filename)): Path<(String, String)>,
) -> Result<Json<DashboardSpec>, ApiError> {
    Ok(Json(build_for(&state, &folder_id, &filename)?))
}

async fn visualize_file(
    State(state): State<Arc<AppState>>,
    Path((folder_id, filename)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let spec = build_for(&state, &folder_id, &filename)?;
    let svg = render_svg(&spec)?;
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response())
}
