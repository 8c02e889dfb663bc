//! Carga y gestión de configuración de la aplicación (almacén de releases +
//! servidor + variante de descubrimiento).

use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Result};

/// Variante del algoritmo de descubrimiento de hijos (ver `tree.rs`):
/// índice explícito padre/hijo, cadena de documentos `.slx`, o sondeo
/// automático de la forma de los metadatos.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiscoveryMode {
    Auto,
    Hierarchy,
    SlxChain,
}

impl DiscoveryMode {
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "hierarchy" => Ok(Self::Hierarchy),
            "slx" => Ok(Self::SlxChain),
            other => Err(anyhow!("Modo de descubrimiento no soportado: {other}")),
        }
    }
}

/// Configuración completa de la aplicación.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub releases_dir: PathBuf,
    pub server_addr: String,
    pub discovery_mode: DiscoveryMode,
}

impl AppConfig {
    /// Carga la configuración desde variables de entorno (usando .env si existe).
    pub fn from_env() -> Result<Self> {
        let releases_dir = env::var("RELEASES_DIR")
            .unwrap_or_else(|_| r"\\FS01\release_hub$\System_Releases".to_string());

        let server_addr =
            env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:5000".to_string());

        let discovery_str = env::var("DISCOVERY_MODE").unwrap_or_else(|_| "auto".to_string());
        let discovery_mode = DiscoveryMode::from_str(&discovery_str)?;

        Ok(Self {
            releases_dir: PathBuf::from(releases_dir),
            server_addr,
            discovery_mode,
        })
    }
}
