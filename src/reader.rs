//! Lectura de documentos de metadatos del almacén WebView.
//!
//! El documento de jerarquía es una lista plana de nodos; la raíz se
//! identifica únicamente por su `parent == 0`, nunca por posición.

use serde_json::Value;

use crate::error::ResolveError;
use crate::models::RawHierarchyNode;
use crate::store::WebviewStore;

/// Carga y valida un documento de jerarquía (`<nombre>_diagrams_1.json`).
/// Campos obligatorios ausentes (hid, parent, name) fallan aquí como
/// `ParseFailure`, no más adentro.
pub fn load_hierarchy(
    store: &WebviewStore,
    doc_name: &str,
) -> Result<Vec<RawHierarchyNode>, ResolveError> {
    let text = store.read_text(doc_name)?;
    serde_json::from_str(&text)
        .map_err(|e| ResolveError::ParseFailure(format!("{doc_name}: {e}")))
}

/// Carga el documento de detalle de un diagrama (`*_d.json`) como JSON
/// opaco. La variante slx lo inspecciona; el flujo base sólo lo sirve.
pub fn load_element_document(
    store: &WebviewStore,
    name: &str,
) -> Result<Value, ResolveError> {
    store.read_json(name)
}
