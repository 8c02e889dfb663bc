//! Acceso al almacén de ficheros WebView de una revisión concreta
//! (`.../WebView_<producto>/support/slwebview_files`).
//!
//! API pública:
//!   - convención de nombres canónicos (`svg_name`, `json_name`,
//!     `hierarchy_doc_name`)
//!   - sondeo de existencia (`exists`) — sin caché: debe reflejar el estado
//!     actual del disco
//!   - lectura de ficheros (`read_text`, `read_json`).

use std::path::PathBuf;

use crate::error::ResolveError;

/// Sufijo fijo de los artefactos renderizados y sus documentos de detalle.
const ARTIFACT_SUFFIX: &str = "_d";
/// Sufijo fijo de los documentos de jerarquía.
const HIERARCHY_SUFFIX: &str = "_diagrams_1.json";

/// Nombre canónico del artefacto SVG de un elemento `<prefijo>:<número>`.
pub fn svg_name(prefix: &str, sid_number: &str) -> String {
    format!("{prefix}_{sid_number}{ARTIFACT_SUFFIX}.svg")
}

/// Nombre canónico del documento de detalle emparejado con el artefacto.
pub fn json_name(prefix: &str, sid_number: &str) -> String {
    format!("{prefix}_{sid_number}{ARTIFACT_SUFFIX}.json")
}

/// Nombre del documento de jerarquía de una unidad (`<nombre>_diagrams_1.json`).
pub fn hierarchy_doc_name(name: &str) -> String {
    format!("{name}{HIERARCHY_SUFFIX}")
}

/// Vista de sólo lectura sobre el directorio `slwebview_files` de una revisión.
#[derive(Debug, Clone)]
pub struct WebviewStore {
    root: PathBuf,
}

impl WebviewStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// ¿Existe el fichero con este nombre en el almacén?
    pub fn exists(&self, name: &str) -> bool {
        self.path_of(name).is_file()
    }

    /// Lee un fichero como texto plano (artefactos SVG).
    pub fn read_text(&self, name: &str) -> Result<String, ResolveError> {
        let path = self.path_of(name);
        if !path.is_file() {
            return Err(ResolveError::NotFound(format!("Fichero no encontrado: {name}")));
        }
        Ok(std::fs::read_to_string(path)?)
    }

    /// Lee y parsea un fichero JSON (documentos de detalle).
    pub fn read_json(&self, name: &str) -> Result<serde_json::Value, ResolveError> {
        let text = self.read_text(name)?;
        serde_json::from_str(&text)
            .map_err(|e| ResolveError::ParseFailure(format!("{name}: {e}")))
    }
}
