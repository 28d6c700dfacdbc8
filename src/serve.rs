use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use log::{debug, error, info, warn};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc as StdArc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use url::Url;

use crate::config::Settings;
use crate::constants::{is_valid_record_id, UPLOADS_ROUTE, UPLOAD_FIELD};
use crate::db::{self, DynError};
use crate::record::RecordPatch;
use crate::upload;

// State shared by all request handlers
pub struct AppState {
    pub pool: SqlitePool,
    pub uploads_dir: PathBuf,
    pub public_url: Option<Url>,
}

impl AppState {
    /// Open the database, apply the schema and create the upload directory
    pub async fn open(settings: &Settings) -> Result<Self, DynError> {
        let pool = db::open_database(&settings.database).await?;
        db::init_database_schema(&pool).await?;
        upload::ensure_upload_dir(&settings.uploads_dir).await?;

        Ok(Self {
            pool,
            uploads_dir: settings.uploads_dir.clone(),
            public_url: settings.public_url.clone(),
        })
    }
}

/// Build the full application: REST API, upload endpoint, uploaded files
/// and the static client with index.html fallback for client-side routes
pub fn build_router(state: StdArc<AppState>, settings: &Settings) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let index_html = settings.client_dist.join("index.html");
    let client = ServeDir::new(&settings.client_dist).fallback(ServeFile::new(index_html));

    let uploads_dir = state.uploads_dir.clone();

    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/record",
            get(list_records_handler).post(create_record_handler),
        )
        .route(
            "/record/",
            get(list_records_handler).post(create_record_handler),
        )
        .route(
            "/record/{id}",
            get(get_record_handler)
                .patch(update_record_handler)
                .delete(delete_record_handler),
        )
        .route(
            "/upload",
            axum::routing::post(upload_handler)
                .layer(DefaultBodyLimit::max(settings.max_upload_bytes)),
        )
        .nest_service(UPLOADS_ROUTE, ServeDir::new(uploads_dir))
        .fallback_service(client)
        .layer(cors)
        .with_state(state)
}

/// Run the server until it fails
pub fn serve_app(settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    println!("Database: {}", settings.database.display());
    println!("Uploads directory: {}", settings.uploads_dir.display());
    println!("Client assets: {}", settings.client_dist.display());
    println!("Listening on: http://[::]:{} (IPv4 + IPv6)", settings.port);
    println!("Endpoints:");
    println!("  GET    /record/       - List all records");
    println!("  GET    /record/:id    - Fetch one record");
    println!("  POST   /record        - Create a record");
    println!("  PATCH  /record/:id    - Update a record");
    println!("  DELETE /record/:id    - Delete a record");
    println!("  POST   /upload        - Upload one image (multipart field 'image')");
    println!("  GET    /uploads/*     - Uploaded images");
    println!("  GET    /health        - Health check");

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let state = AppState::open(&settings)
            .await
            .map_err(|e| format!("Failed to prepare server state: {}", e))?;
        let app = build_router(StdArc::new(state), &settings);

        let listener = tokio::net::TcpListener::bind(format!("[::]:{}", settings.port))
            .await
            .map_err(|e| format!("Failed to bind to port {}: {}", settings.port, e))?;
        info!("Server listening on port {}", settings.port);
        axum::serve(listener, app)
            .await
            .map_err(|e| format!("Server error: {}", e))?;

        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

// Health check endpoint - returns 200 OK if server is running
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

fn database_error(context: &str, e: DynError) -> Response {
    error!("{}: {}", context, e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("{}: {}", context, e),
    )
        .into_response()
}

fn malformed_id(id: &str) -> Response {
    (StatusCode::BAD_REQUEST, format!("Malformed record id: {}", id)).into_response()
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not found").into_response()
}

async fn list_records_handler(State(state): State<StdArc<AppState>>) -> Response {
    match db::list_records(&state.pool).await {
        Ok(records) => Json(records).into_response(),
        Err(e) => database_error("Error fetching records", e),
    }
}

async fn get_record_handler(
    State(state): State<StdArc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    if !is_valid_record_id(&id) {
        return malformed_id(&id);
    }

    match db::get_record(&state.pool, &id).await {
        Ok(Some(record)) => Json(record).into_response(),
        Ok(None) => not_found(),
        Err(e) => database_error("Error fetching record", e),
    }
}

async fn create_record_handler(
    State(state): State<StdArc<AppState>>,
    Json(body): Json<Value>,
) -> Response {
    let fields = match RecordPatch::from_json(&body) {
        Ok(fields) => fields,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    match db::create_record(&state.pool, &fields).await {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(e) => database_error("Error adding record", e),
    }
}

async fn update_record_handler(
    State(state): State<StdArc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if !is_valid_record_id(&id) {
        return malformed_id(&id);
    }

    let patch = match RecordPatch::from_json(&body) {
        Ok(patch) => patch,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    match db::update_record(&state.pool, &id, &patch).await {
        Ok(Some(record)) => Json(record).into_response(),
        Ok(None) => not_found(),
        Err(e) => database_error("Error updating record", e),
    }
}

async fn delete_record_handler(
    State(state): State<StdArc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    if !is_valid_record_id(&id) {
        return malformed_id(&id);
    }

    match db::delete_record(&state.pool, &id).await {
        Ok(0) => not_found(),
        Ok(deleted) => {
            debug!("Deleted record {}", id);
            Json(json!({ "deletedCount": deleted })).into_response()
        }
        Err(e) => database_error("Error deleting record", e),
    }
}

fn no_file_uploaded() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "message": "No file uploaded" })),
    )
        .into_response()
}

// Image upload endpoint: stores the first `image` field and returns its public URL
async fn upload_handler(
    State(state): State<StdArc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let (original_name, data) = loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return no_file_uploaded(),
            Err(e) => {
                warn!("Malformed multipart upload: {}", e);
                return (
                    e.status(),
                    Json(json!({ "message": e.body_text() })),
                )
                    .into_response();
            }
        };

        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let original_name = field.file_name().map(str::to_string);
        match field.bytes().await {
            Ok(data) => break (original_name, data),
            Err(e) => {
                warn!("Failed to read upload body: {}", e);
                return (
                    e.status(),
                    Json(json!({ "message": e.body_text() })),
                )
                    .into_response();
            }
        }
    };

    let base = match &state.public_url {
        Some(url) => Ok(url.clone()),
        None => upload::request_base_url(&headers),
    };
    let base = match base {
        Ok(base) => base,
        Err(e) => {
            warn!("Rejecting upload: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "message": e.to_string() })),
            )
                .into_response();
        }
    };

    let filename = match upload::store_upload(&state.uploads_dir, original_name.as_deref(), &data).await {
        Ok(filename) => filename,
        Err(e) => {
            error!("Failed to store upload: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "Failed to store file" })),
            )
                .into_response();
        }
    };

    match upload::public_url(&base, &filename) {
        Ok(image_url) => Json(json!({ "imageUrl": image_url })).into_response(),
        Err(e) => {
            error!("Failed to build URL for {}: {}", filename, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": e.to_string() })),
            )
                .into_response()
        }
    }
}
