//! Taxonomía de errores del motor de resolución de jerarquías.
//!
//! `NotFound` se mapea a 404 en la capa HTTP; el resto a 500. Las
//! referencias colgantes (child declarado pero ausente del índice) NO son
//! errores: se registran y el hijo se omite.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    /// Producto, versión, documento o fichero inexistente.
    #[error("No encontrado: {0}")]
    NotFound(String),

    /// Documento de metadatos malformado (mensaje del parser incluido).
    #[error("Documento de metadatos malformado: {0}")]
    ParseFailure(String),

    /// Ningún nodo con `parent == 0` en el documento de jerarquía.
    #[error("Nodo raíz no encontrado en el documento de jerarquía")]
    RootNotFound,

    /// Un nodo reaparece en el mismo camino de descenso (hid repetido).
    #[error("Jerarquía cíclica detectada en el nodo hid:{0}")]
    CyclicHierarchy(i64),

    /// Fallo de E/S inesperado leyendo el almacén.
    #[error("Error de E/S: {0}")]
    Io(#[from] std::io::Error),
}
