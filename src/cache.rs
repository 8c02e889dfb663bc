//! Caché de resolución: un árbol inmutable por clave (producto, versión).
//!
//! Objeto explícito con ciclo de vida propio, construido una vez en `main`
//! y compartido vía `AppState` — nada de estado global ambiente. Las
//! construcciones concurrentes de la misma clave no se deduplican: son
//! baratas, de sólo lectura e idempotentes, así que el trabajo duplicado
//! es tolerable y el resultado idéntico.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::info;

use crate::error::ResolveError;
use crate::models::TreeNode;

#[derive(Default)]
pub struct TreeCache {
    inner: Mutex<HashMap<(String, String), Arc<TreeNode>>>,
}

impl TreeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Devuelve el árbol cacheado o lo construye con `build` y lo guarda.
    /// El builder corre FUERA del lock; los errores no se cachean.
    pub fn get_or_build<F>(
        &self,
        product: &str,
        version: &str,
        build: F,
    ) -> Result<Arc<TreeNode>, ResolveError>
    where
        F: FnOnce() -> Result<TreeNode, ResolveError>,
    {
        let key = (product.to_string(), version.to_string());

        if let Some(tree) = self.inner.lock().unwrap().get(&key) {
            info!("Usando árbol cacheado para {product} v{version}");
            return Ok(Arc::clone(tree));
        }

        let tree = Arc::new(build()?);
        self.inner
            .lock()
            .unwrap()
            .insert(key, Arc::clone(&tree));
        info!("Árbol construido y cacheado para {product} v{version}");
        Ok(tree)
    }

    /// Descarta el árbol de una clave concreta.
    pub fn invalidate(&self, product: &str, version: &str) {
        let key = (product.to_string(), version.to_string());
        if self.inner.lock().unwrap().remove(&key).is_some() {
            info!("Caché invalidada para {product} v{version}");
        }
    }

    /// Vacía la caché entera.
    pub fn invalidate_all(&self) {
        self.inner.lock().unwrap().clear();
    }
}
