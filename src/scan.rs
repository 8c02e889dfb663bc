//! Descubrimiento de productos y revisiones bajo el directorio de releases.
//!
//! Una carpeta de release sigue el patrón `<Producto>[.<nn>]_<versión>` y
//! sólo cuenta si contiene `WebView_<Producto>/support/slwebview_files`,
//! que pasa a ser la raíz del almacén de esa revisión.

use std::collections::HashMap;
use std::path::PathBuf;

use regex::Regex;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::ResolveError;

const FOLDER_PATTERN: &str = r"^([A-Za-z0-9]+)(?:\.(\d+))?_(.+)$";

/// Una revisión exportada de un producto.
#[derive(Debug, Clone)]
pub struct VersionEntry {
    pub version: String,
    pub folder: String,
    pub webview_path: PathBuf,
}

pub struct ProductScanner {
    base_path: PathBuf,
    pattern: Regex,
    products: HashMap<String, Vec<VersionEntry>>,
}

impl ProductScanner {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            pattern: Regex::new(FOLDER_PATTERN).expect("patrón de carpeta inválido"),
            products: HashMap::new(),
        }
    }

    /// Re-lee el directorio base y agrupa las carpetas por producto, con
    /// las versiones ordenadas descendentemente (la última primero).
    pub fn scan(&mut self) -> Result<usize, ResolveError> {
        if !self.base_path.is_dir() {
            return Err(ResolveError::NotFound(format!(
                "La ruta base no existe: {}",
                self.base_path.display()
            )));
        }

        info!("Escaneando {}", self.base_path.display());
        let mut products: HashMap<String, Vec<VersionEntry>> = HashMap::new();

        let folders = WalkDir::new(&self.base_path)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_dir());

        for entry in folders {
            let folder = entry.file_name().to_string_lossy().to_string();
            let Some(caps) = self.pattern.captures(&folder) else {
                continue;
            };
            let product = caps[1].to_string();
            let version = caps[3].to_string();

            let webview_path = entry
                .path()
                .join(format!("WebView_{product}"))
                .join("support")
                .join("slwebview_files");

            if webview_path.is_dir() {
                info!("Encontrado: {product} v{version}");
                products.entry(product).or_default().push(VersionEntry {
                    version,
                    folder,
                    webview_path,
                });
            } else {
                warn!("Sin carpeta WebView para: {folder}");
            }
        }

        for versions in products.values_mut() {
            versions.sort_by(|a, b| b.version.cmp(&a.version));
        }

        self.products = products;
        info!("Total {} productos encontrados", self.products.len());
        Ok(self.products.len())
    }

    pub fn products(&self) -> &HashMap<String, Vec<VersionEntry>> {
        &self.products
    }

    pub fn has_product(&self, product: &str) -> bool {
        self.products.contains_key(product)
    }

    pub fn versions_of(&self, product: &str) -> Option<&[VersionEntry]> {
        self.products.get(product).map(Vec::as_slice)
    }

    /// Raíz del almacén WebView de una revisión concreta.
    pub fn webview_path(&self, product: &str, version: &str) -> Option<PathBuf> {
        self.products
            .get(product)?
            .iter()
            .find(|v| v.version == version)
            .map(|v| v.webview_path.clone())
    }
}
