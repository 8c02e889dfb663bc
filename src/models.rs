//! Modelos de dominio (documentos crudos de la exportación WebView y árbol
//! de navegación resuelto).

use serde::{Deserialize, Serialize};

/// Un nodo tal y como aparece en `<nombre>_diagrams_1.json`.
/// `hid`, `parent` y `name` son obligatorios: un documento sin ellos
/// falla en la frontera de parseo, no dentro del motor.
#[derive(Debug, Clone, Deserialize)]
pub struct RawHierarchyNode {
    pub hid: i64,
    pub parent: i64,
    pub name: String,
    #[serde(default)]
    pub sid: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub fullname: Option<String>,
    #[serde(rename = "className", default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub svg: Option<String>,
    #[serde(rename = "sysViewURL", default)]
    pub sys_view_url: Option<String>,
    #[serde(default)]
    pub children: Vec<i64>,
    #[serde(default)]
    pub elements: Vec<RawElement>,
}

/// Un bloque anotado dentro del diagrama de un nodo, potencialmente clicable.
/// El `sid` tiene formato `"<prefijo>:<número>"`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawElement {
    #[serde(default)]
    pub sid: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

/// Clasificación de navegación de un elemento clicable:
/// dentro de la misma jerarquía, en una jerarquía externa, o terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HierarchyType {
    Internal,
    External,
    Leaf,
}

/// Elemento clicable resuelto: sólo existe si su artefacto SVG está
/// confirmado en el almacén.
#[derive(Debug, Clone, Serialize)]
pub struct ClickableElement {
    pub sid: String,
    pub name: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub svg: String,
    pub json: String,
    /// hid del nodo hijo correspondiente; sólo presente cuando es `internal`.
    pub hid: Option<i64>,
    pub has_children: bool,
    pub hierarchy_type: HierarchyType,
    /// Nombre del documento de jerarquía externo a cargar a continuación.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_hierarchy: Option<String>,
}

/// Nodo del árbol de navegación resuelto que consume el frontend.
/// `svg_path`/`json_path` duplican `svg`/`json`; el visor los lee así.
#[derive(Debug, Clone, Serialize)]
pub struct TreeNode {
    pub name: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fullname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hid: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    #[serde(rename = "className", skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub svg: String,
    pub json: String,
    pub svg_path: String,
    pub json_path: String,
    pub children: Vec<TreeNode>,
    pub level: usize,
    pub is_root: bool,
    pub product: String,
    pub clickable_elements: Vec<ClickableElement>,
}
