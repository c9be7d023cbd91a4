use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::catalog::{ProductCatalog, RestCatalog};
use crate::config::AppConfig;
use crate::editor::{ProductEditor, form_message};
use crate::error::{CatalogError, EditorError, UploadError};
use crate::export;
use crate::matrix::quantity_from_json;
use crate::notify::RecordingNotifier;
use crate::product::Product;
use crate::session::{ProductDetails, SessionView};
use crate::stats::{self, ChartSeries};
use crate::storefront::{CartLine, VariantPicker, unit_price};
use crate::upload::{HttpUploader, UploadFile};

pub struct AppState {
    editor: Mutex<ProductEditor>,
    toasts: Arc<RecordingNotifier>,
}

impl AppState {
    /// `toasts` must be the notifier the editor reports to.
    pub fn new(editor: ProductEditor, toasts: Arc<RecordingNotifier>) -> Arc<Self> {
        Arc::new(AppState {
            editor: Mutex::new(editor),
            toasts,
        })
    }

    /// Latest toast since the previous response.
    fn take_message(&self) -> Option<String> {
        self.toasts.drain().pop().map(|t| t.message)
    }
}

#[derive(Serialize)]
struct ApiResponse {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    session: Option<SessionView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    product: Option<Product>,
}

#[derive(Deserialize)]
struct SizeInput {
    value: String,
}

#[derive(Deserialize)]
struct ColorInput {
    name: String,
    #[serde(default)]
    code: String,
}

#[derive(Deserialize)]
struct QuantityInput {
    size: usize,
    color: usize,
    /// Text or number, as typed into the cell
    value: serde_json::Value,
}

#[derive(Deserialize)]
struct PickInput {
    size: Option<usize>,
    color: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PickerView {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    sizes: Vec<String>,
    available_colors: Vec<String>,
    quantity: u32,
    unit_price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    cart_line: Option<CartLine>,
}

fn status_for(err: &EditorError) -> StatusCode {
    match err {
        EditorError::Form(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EditorError::Upload(UploadError::Busy) => StatusCode::CONFLICT,
        EditorError::Upload(_) => StatusCode::BAD_GATEWAY,
        EditorError::Catalog(CatalogError::NotFound(_)) => StatusCode::NOT_FOUND,
        EditorError::Catalog(_) => StatusCode::BAD_GATEWAY,
    }
}

fn reply(state: &AppState, editor: &ProductEditor, result: Result<Option<Product>, EditorError>) -> Response {
    let toast = state.take_message();
    match result {
        Ok(product) => Json(ApiResponse {
            status: "ok".to_string(),
            message: toast,
            session: Some(editor.session().view()),
            product,
        })
        .into_response(),
        Err(e) => {
            let message = match &e {
                EditorError::Form(form) => form_message(form).to_string(),
                other => toast.unwrap_or_else(|| other.to_string()),
            };
            let body = Json(ApiResponse {
                status: "error".to_string(),
                message: Some(message),
                session: Some(editor.session().view()),
                product: None,
            });
            (status_for(&e), body).into_response()
        }
    }
}

fn catalog_failure(err: CatalogError) -> Response {
    let status = match err {
        CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_GATEWAY,
    };
    let body = Json(ApiResponse {
        status: "error".to_string(),
        message: Some(err.to_string()),
        session: None,
        product: None,
    });
    (status, body).into_response()
}

fn bad_request(message: &str) -> Response {
    let body = Json(ApiResponse {
        status: "error".to_string(),
        message: Some(message.to_string()),
        session: None,
        product: None,
    });
    (StatusCode::BAD_REQUEST, body).into_response()
}

/// Routes of the admin API, ready to serve.
pub fn router(state: Arc<AppState>) -> Router {
    let router = Router::new()
        .route("/api/categories", get(list_categories))
        .route("/api/session", get(get_session))
        .route("/api/session/new", post(new_session))
        .route("/api/session/edit/:id", post(edit_session))
        .route("/api/session/sizes", post(add_size))
        .route("/api/session/sizes/:index", delete(remove_size))
        .route("/api/session/colors", post(add_color))
        .route("/api/session/colors/:index", delete(remove_color))
        .route("/api/session/colors/:index/images", post(upload_color_image))
        .route("/api/session/colors/:index/images/:image", delete(remove_image))
        .route("/api/session/image", post(upload_main_image))
        .route("/api/session/quantity", put(set_quantity))
        .route("/api/session/details", put(set_details))
        .route("/api/session/save", post(save))
        .route("/api/session/export.csv", get(export_csv))
        .route("/api/session/export.xlsx", get(export_xlsx))
        .route("/api/products/:id/picker", get(pick_variant))
        .route("/api/stats/best-sellers", get(best_sellers));
    #[cfg(feature = "charts")]
    let router = router.route("/api/stats/best-sellers.png", get(best_sellers_chart));

    router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = Arc::new(RestCatalog::new(config.api_url.clone(), config.http_timeout));
    let uploader = Arc::new(HttpUploader::new(config.upload_url.clone(), config.http_timeout));
    let toasts = Arc::new(RecordingNotifier::new());

    let editor = ProductEditor::new(catalog.clone(), catalog, uploader, toasts.clone())
        .with_keying(config.keying)
        .with_placeholder_image(config.default_image.clone());
    let app = router(AppState::new(editor, toasts));

    let listener = TcpListener::bind(&config.bind).await?;
    info!("Listening on http://{} (backend {})", config.bind, config.api_url);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn list_categories(State(state): State<Arc<AppState>>) -> Response {
    let mut editor = state.editor.lock().await;
    let categories = editor.load_categories().await.map(|c| c.to_vec());
    match categories {
        Ok(categories) => {
            state.take_message();
            Json(categories).into_response()
        }
        Err(e) => reply(&state, &editor, Err(e)),
    }
}

async fn get_session(State(state): State<Arc<AppState>>) -> Response {
    let editor = state.editor.lock().await;
    reply(&state, &editor, Ok(None))
}

async fn new_session(State(state): State<Arc<AppState>>) -> Response {
    let mut editor = state.editor.lock().await;
    editor.open_new();
    reply(&state, &editor, Ok(None))
}

async fn edit_session(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> Response {
    let mut editor = state.editor.lock().await;
    let result = editor.open_existing(id).await.map(|_| None);
    reply(&state, &editor, result)
}

async fn add_size(State(state): State<Arc<AppState>>, Json(input): Json<SizeInput>) -> Response {
    let mut editor = state.editor.lock().await;
    let result = editor.add_size(&input.value).map(|_| None);
    reply(&state, &editor, result)
}

async fn remove_size(State(state): State<Arc<AppState>>, Path(index): Path<usize>) -> Response {
    let mut editor = state.editor.lock().await;
    let result = editor.remove_size(index).map(|_| None);
    reply(&state, &editor, result)
}

async fn add_color(State(state): State<Arc<AppState>>, Json(input): Json<ColorInput>) -> Response {
    let mut editor = state.editor.lock().await;
    let result = editor.add_color(&input.name, &input.code).map(|_| None);
    reply(&state, &editor, result)
}

async fn remove_color(State(state): State<Arc<AppState>>, Path(index): Path<usize>) -> Response {
    let mut editor = state.editor.lock().await;
    let result = editor.remove_color(index).map(|_| None);
    reply(&state, &editor, result)
}

async fn remove_image(
    State(state): State<Arc<AppState>>,
    Path((index, image)): Path<(usize, usize)>,
) -> Response {
    let mut editor = state.editor.lock().await;
    let result = editor.remove_image(index, image).map(|_| None);
    reply(&state, &editor, result)
}

async fn set_quantity(State(state): State<Arc<AppState>>, Json(input): Json<QuantityInput>) -> Response {
    let raw = quantity_from_json(&input.value).to_string();
    let mut editor = state.editor.lock().await;
    let result = editor.set_quantity(input.size, input.color, &raw).map(|_| None);
    reply(&state, &editor, result)
}

async fn set_details(State(state): State<Arc<AppState>>, Json(details): Json<ProductDetails>) -> Response {
    let mut editor = state.editor.lock().await;
    editor.set_details(details);
    reply(&state, &editor, Ok(None))
}

async fn save(State(state): State<Arc<AppState>>) -> Response {
    let mut editor = state.editor.lock().await;
    let result = editor.save().await.map(Some);
    reply(&state, &editor, result)
}

/// Reads the `file` field of a multipart upload.
async fn read_upload(mut multipart: Multipart) -> Result<UploadFile, String> {
    while let Some(field) = multipart.next_field().await.map_err(|e| e.to_string())? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(|e| e.to_string())?;
        return Ok(UploadFile {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }
    Err("No file data received".to_string())
}

async fn upload_color_image(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
    multipart: Multipart,
) -> Response {
    let file = match read_upload(multipart).await {
        Ok(file) => file,
        Err(message) => return bad_request(&message),
    };

    // the editor stays unlocked while the upload runs
    let (ticket, uploader) = {
        let mut editor = state.editor.lock().await;
        match editor.begin_color_upload(index) {
            Ok(started) => started,
            Err(e) => return reply(&state, &editor, Err(e)),
        }
    };
    let uploaded = uploader.upload(file).await;

    let mut editor = state.editor.lock().await;
    let result = editor.finish_color_upload(ticket, uploaded).map(|_| None);
    reply(&state, &editor, result)
}

async fn upload_main_image(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
    let file = match read_upload(multipart).await {
        Ok(file) => file,
        Err(message) => return bad_request(&message),
    };

    let (ticket, uploader) = {
        let mut editor = state.editor.lock().await;
        match editor.begin_main_upload() {
            Ok(started) => started,
            Err(e) => return reply(&state, &editor, Err(e)),
        }
    };
    let uploaded = uploader.upload(file).await;

    let mut editor = state.editor.lock().await;
    let result = editor.finish_main_upload(ticket, uploaded).map(|_| None);
    reply(&state, &editor, result)
}

async fn export_csv(State(state): State<Arc<AppState>>) -> Response {
    let editor = state.editor.lock().await;
    let csv = export::to_csv(editor.session());
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"stock.csv\""),
        ],
        csv,
    )
        .into_response()
}

async fn export_xlsx(State(state): State<Arc<AppState>>) -> Response {
    let editor = state.editor.lock().await;
    match export::to_xlsx(editor.session()) {
        Ok(bytes) => (
            [
                (
                    header::CONTENT_TYPE,
                    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                ),
                (header::CONTENT_DISPOSITION, "attachment; filename=\"stock.xlsx\""),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => {
            let body = Json(ApiResponse {
                status: "error".to_string(),
                message: Some(e.to_string()),
                session: None,
                product: None,
            });
            (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
        }
    }
}

/// Size and color choice on the product page, with the resulting cart line
/// once both are picked.
async fn pick_variant(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(input): Query<PickInput>,
) -> Response {
    let catalog = state.editor.lock().await.catalog();
    let product = match catalog.fetch_one(id).await {
        Ok(product) => product,
        Err(e) => return catalog_failure(e),
    };

    let mut picker = VariantPicker::new(&product);
    let mut picked = Ok(());
    if let Some(size) = input.size {
        picked = picker.select_size(size);
    }
    if let (Ok(()), Some(color)) = (picked, input.color) {
        picked = picker.select_color(color);
    }
    let cart = match picked {
        Ok(()) if input.color.is_some() => picker.confirm().map(Some),
        other => other.map(|_| None),
    };

    let (status, message, cart_line) = match cart {
        Ok(line) => (StatusCode::OK, None, line),
        Err(e) => (StatusCode::UNPROCESSABLE_ENTITY, Some(e.to_string()), None),
    };
    let view = PickerView {
        status: if status == StatusCode::OK { "ok" } else { "error" }.to_string(),
        message,
        sizes: product.sizes.iter().map(|s| s.size_value.clone()).collect(),
        available_colors: picker
            .available_colors()
            .iter()
            .map(|c| c.color_name.clone())
            .collect(),
        quantity: picker.variant_quantity(),
        unit_price: unit_price(&product),
        cart_line,
    };
    (status, Json(view)).into_response()
}

async fn best_seller_series(state: &AppState) -> Result<ChartSeries, CatalogError> {
    let catalog = state.editor.lock().await.catalog();
    let products = catalog.fetch_all().await?;
    Ok(stats::best_seller_series(&products))
}

async fn best_sellers(State(state): State<Arc<AppState>>) -> Response {
    match best_seller_series(&state).await {
        Ok(series) => Json(series).into_response(),
        Err(e) => catalog_failure(e),
    }
}

#[cfg(feature = "charts")]
async fn best_sellers_chart(State(state): State<Arc<AppState>>) -> Response {
    use crate::chart::{ChartOptions, render};
    use crate::error::ChartError;

    let series = match best_seller_series(&state).await {
        Ok(series) => series,
        Err(e) => return catalog_failure(e),
    };
    let options = ChartOptions {
        x_label: "Product".to_string(),
        y_label: "Sold".to_string(),
        ..ChartOptions::default()
    };
    match render(&series, &options) {
        Ok(png) => ([(header::CONTENT_TYPE, "image/png")], png).into_response(),
        Err(ChartError::Empty) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            let body = Json(ApiResponse {
                status: "error".to_string(),
                message: Some(e.to_string()),
                session: None,
                product: None,
            });
            (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
        }
    }
}
