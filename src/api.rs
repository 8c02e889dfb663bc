use std::path::PathBuf;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::{
    app_state::AppState,
    error::ResolveError,
    models::TreeNode,
    store::{self, WebviewStore},
    tree::TreeBuilder,
};

// --- Respuestas de la API ---

#[derive(Serialize)]
pub struct ProductSummary {
    name: String,
    version_count: usize,
    latest_version: Option<String>,
}

#[derive(Serialize)]
pub struct VersionInfo {
    version: String,
    folder: String,
}

type ApiError = (StatusCode, Json<serde_json::Value>);

/// `NotFound` → 404; el resto de la taxonomía → 500.
fn map_resolve_error(err: ResolveError) -> ApiError {
    let status = match err {
        ResolveError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({"error": err.to_string()})))
}

// --- Router ---

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/products", get(list_products_handler))
        .route("/api/scan", get(rescan_handler))
        .route("/api/product/:product/versions", get(product_versions_handler))
        .route(
            "/api/product/:product/version/:version/tree",
            get(product_tree_handler),
        )
        .route(
            "/api/product/:product/version/:version/invalidate",
            post(invalidate_tree_handler),
        )
        .route(
            "/api/product/:product/version/:version/file/*filepath",
            get(serve_file_handler),
        )
        .route("/api/shutdown", post(shutdown_handler))
        .with_state(app_state)
}

// --- Handlers ---

#[axum::debug_handler]
async fn index_handler() -> Json<serde_json::Value> {
    Json(json!({
        "name": "Simulink WebView Navigation API",
        "description": "Navegación de jerarquías de diagramas exportadas por Simulink WebView",
        "endpoints": {
            "/api/products": "Lista todos los productos",
            "/api/product/<producto>/versions": "Lista las versiones de un producto",
            "/api/product/<producto>/version/<version>/tree": "Construye el árbol de navegación",
            "/api/product/<producto>/version/<version>/invalidate": "Invalida el árbol cacheado",
            "/api/product/<producto>/version/<version>/file/<fichero>": "Sirve un fichero SVG o JSON",
            "/api/scan": "Fuerza un re-escaneo del directorio de releases"
        }
    }))
}

#[axum::debug_handler]
async fn list_products_handler(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut scanner = state.scanner.lock().unwrap();
    scanner.scan().map_err(map_resolve_error)?;

    let mut products: Vec<ProductSummary> = scanner
        .products()
        .iter()
        .map(|(name, versions)| ProductSummary {
            name: name.clone(),
            version_count: versions.len(),
            latest_version: versions.first().map(|v| v.version.clone()),
        })
        .collect();
    products.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(Json(json!({
        "count": products.len(),
        "products": products,
    })))
}

#[axum::debug_handler]
async fn product_versions_handler(
    State(state): State<AppState>,
    Path(product): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut scanner = state.scanner.lock().unwrap();
    if !scanner.has_product(&product) {
        scanner.scan().map_err(map_resolve_error)?;
    }

    let versions = scanner.versions_of(&product).ok_or_else(|| {
        map_resolve_error(ResolveError::NotFound(format!(
            "Producto no encontrado: {product}"
        )))
    })?;

    let version_list: Vec<VersionInfo> = versions
        .iter()
        .map(|v| VersionInfo {
            version: v.version.clone(),
            folder: v.folder.clone(),
        })
        .collect();

    Ok(Json(json!({
        "product": product,
        "count": version_list.len(),
        "versions": version_list,
    })))
}

#[axum::debug_handler]
async fn product_tree_handler(
    State(state): State<AppState>,
    Path((product, version)): Path<(String, String)>,
) -> Result<Json<TreeNode>, ApiError> {
    let webview_path = locate_webview(&state, &product, &version).map_err(map_resolve_error)?;
    let webview_store = WebviewStore::new(webview_path);
    let doc_name = store::hierarchy_doc_name(&product);
    let mode = state.config.discovery_mode;

    let tree = state
        .cache
        .get_or_build(&product, &version, || {
            TreeBuilder::new(&webview_store, &product, mode).build_from_root(&doc_name)
        })
        .map_err(map_resolve_error)?;

    Ok(Json(tree.as_ref().clone()))
}

#[axum::debug_handler]
async fn invalidate_tree_handler(
    State(state): State<AppState>,
    Path((product, version)): Path<(String, String)>,
) -> impl IntoResponse {
    state.cache.invalidate(&product, &version);
    (
        StatusCode::OK,
        Json(json!({ "message": format!("Caché invalidada para {product} v{version}") })),
    )
}

#[axum::debug_handler]
async fn serve_file_handler(
    State(state): State<AppState>,
    Path((product, version, filepath)): Path<(String, String, String)>,
) -> Result<axum::response::Response, ApiError> {
    let webview_path = locate_webview(&state, &product, &version).map_err(map_resolve_error)?;
    let webview_store = WebviewStore::new(webview_path);

    // Documento de detalle → JSON parseado; artefacto → texto plano.
    if filepath.ends_with(".json") {
        let doc = webview_store.read_json(&filepath).map_err(map_resolve_error)?;
        Ok(Json(doc).into_response())
    } else {
        let content = webview_store.read_text(&filepath).map_err(map_resolve_error)?;
        let mime = mime_guess::from_path(&filepath).first_or_octet_stream();
        Ok(([(header::CONTENT_TYPE, mime.to_string())], content).into_response())
    }
}

#[axum::debug_handler]
async fn rescan_handler(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let products_found = state
        .scanner
        .lock()
        .unwrap()
        .scan()
        .map_err(map_resolve_error)?;

    // Un re-escaneo señala una re-exportación: los árboles cacheados contra
    // el estado anterior del disco dejan de valer.
    state.cache.invalidate_all();

    Ok(Json(json!({
        "message": "Escaneo completado",
        "products_found": products_found,
    })))
}

#[axum::debug_handler]
async fn shutdown_handler(State(state): State<AppState>) -> impl IntoResponse {
    info!("Petición de apagado recibida.");
    if let Some(sender) = state.shutdown_sender.lock().unwrap().take() {
        let _ = sender.send(());
    }
    StatusCode::OK
}

// --- Utilidades ---

/// Localiza la raíz del almacén de una revisión, re-escaneando una vez si
/// el producto aún no se conoce.
fn locate_webview(
    state: &AppState,
    product: &str,
    version: &str,
) -> Result<PathBuf, ResolveError> {
    let mut scanner = state.scanner.lock().unwrap();
    if !scanner.has_product(product) {
        scanner.scan()?;
    }
    if !scanner.has_product(product) {
        return Err(ResolveError::NotFound(format!(
            "Producto no encontrado: {product}"
        )));
    }
    scanner.webview_path(product, version).ok_or_else(|| {
        ResolveError::NotFound(format!("Versión no encontrada: {version}"))
    })
}
