//! Clasificación de elementos de un diagrama como clicables o inertes.
//!
//! Sólo dos iconos son estructuralmente significativos: subsistema
//! compuesto y referencia a modelo externo. Un elemento clicable sólo
//! existe si su artefacto SVG está presente en el almacén; los demás se
//! descartan en silencio (estado normal en exportaciones parciales).

use std::collections::HashMap;

use tracing::debug;

use crate::models::{ClickableElement, HierarchyType, RawElement, RawHierarchyNode};
use crate::store::{self, WebviewStore};

/// Icono de subsistema compuesto (navegable dentro de la misma jerarquía).
pub const SUBSYSTEM_ICON: &str = "SubSystemIcon_icon";
/// Icono de referencia a modelo (posible jerarquía externa propia).
pub const MODEL_REF_ICON: &str = "MdlRefBlockIcon_icon";

/// Clasifica un elemento del diagrama de un nodo.
///
/// Orden del algoritmo (el empate se resuelve SIEMPRE a favor de interno):
/// 1. icono no navegable → None
/// 2. sid sin forma `prefijo:número` → None
/// 3. artefacto SVG ausente → None (descarte silencioso)
/// 4. sid en el índice Y su hid declarado como hijo del padre → `internal`
/// 5. si no, icono de referencia: documento externo presente → `external`,
///    ausente → `leaf`
/// 6. si no → `leaf`
pub fn classify_element(
    store: &WebviewStore,
    element: &RawElement,
    sibling_children: &[i64],
    nodes_by_sid: &HashMap<String, &RawHierarchyNode>,
) -> Option<ClickableElement> {
    let icon = element.icon.as_deref()?;
    if icon != SUBSYSTEM_ICON && icon != MODEL_REF_ICON {
        return None;
    }

    let sid = element.sid.as_deref()?;
    let mut parts = sid.split(':');
    let prefix = parts.next()?;
    let number = parts.next()?;

    let svg = store::svg_name(prefix, number);
    let json = store::json_name(prefix, number);

    if !store.exists(&svg) {
        debug!("Elemento {sid} sin artefacto {svg}, descartado");
        return None;
    }

    let name = element.name.clone().unwrap_or_else(|| sid.to_string());
    let label = element.label.clone().unwrap_or_else(|| name.clone());

    // Subsistema con nodo hijo declarado en la jerarquía → navegación interna.
    if let Some(child_node) = nodes_by_sid.get(sid) {
        if sibling_children.contains(&child_node.hid) {
            return Some(ClickableElement {
                sid: sid.to_string(),
                name,
                label,
                icon: Some(icon.to_string()),
                svg,
                json,
                hid: Some(child_node.hid),
                has_children: true,
                hierarchy_type: HierarchyType::Internal,
                external_hierarchy: None,
            });
        }
    }

    // Referencia a modelo → ¿jerarquía externa propia?
    if icon == MODEL_REF_ICON {
        let external_doc = store::hierarchy_doc_name(&name);
        if store.exists(&external_doc) {
            return Some(ClickableElement {
                sid: sid.to_string(),
                name,
                label,
                icon: Some(icon.to_string()),
                svg,
                json,
                hid: None,
                has_children: true,
                hierarchy_type: HierarchyType::External,
                external_hierarchy: Some(external_doc),
            });
        }
    }

    // Sin hijo en la jerarquía y sin jerarquía externa: nodo terminal.
    Some(ClickableElement {
        sid: sid.to_string(),
        name,
        label,
        icon: Some(icon.to_string()),
        svg,
        json,
        hid: None,
        has_children: false,
        hierarchy_type: HierarchyType::Leaf,
        external_hierarchy: None,
    })
}
