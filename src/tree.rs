//! Construcción recursiva del árbol de navegación a partir de un documento
//! de jerarquía.
//!
//! Dos variantes de descubrimiento de hijos detrás del mismo contrato:
//!   - `Hierarchy`: índice explícito padre/hijo del documento
//!     `<nombre>_diagrams_1.json` más la lista de elementos de cada nodo.
//!   - `SlxChain`: cadena de documentos de detalle, siguiendo referencias
//!     `.slx` en `inspector.values` de documento en documento.
//!
//! El motor nunca sale del documento que se le dio: un clicable `external`
//! lleva el nombre del siguiente documento y el llamante decide resolverlo
//! como petición nueva.

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::classify::classify_element;
use crate::config::DiscoveryMode;
use crate::error::ResolveError;
use crate::models::{ClickableElement, HierarchyType, RawHierarchyNode, TreeNode};
use crate::reader;
use crate::store::WebviewStore;

/// Valor centinela de `parent` que marca el nodo raíz.
const ROOT_PARENT: i64 = 0;

pub struct TreeBuilder<'a> {
    store: &'a WebviewStore,
    product: &'a str,
    mode: DiscoveryMode,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(store: &'a WebviewStore, product: &'a str, mode: DiscoveryMode) -> Self {
        Self { store, product, mode }
    }

    /// Resuelve el árbol completo del documento de jerarquía dado.
    pub fn build_from_root(&self, doc_name: &str) -> Result<TreeNode, ResolveError> {
        let hierarchy = reader::load_hierarchy(self.store, doc_name)?;

        let root = hierarchy
            .iter()
            .find(|n| n.parent == ROOT_PARENT)
            .ok_or(ResolveError::RootNotFound)?;

        let nodes_by_hid: HashMap<i64, &RawHierarchyNode> =
            hierarchy.iter().map(|n| (n.hid, n)).collect();
        let nodes_by_sid: HashMap<String, &RawHierarchyNode> = hierarchy
            .iter()
            .filter_map(|n| n.sid.clone().map(|sid| (sid, n)))
            .collect();

        info!(
            "Jerarquía {doc_name}: {} nodos, raíz '{}' (hid:{})",
            hierarchy.len(),
            root.name,
            root.hid
        );

        let use_index = match self.mode {
            DiscoveryMode::Hierarchy => true,
            DiscoveryMode::SlxChain => false,
            // Sondeo de la forma de los metadatos: si algún nodo declara
            // hijos hay índice explícito; si no, se sigue la cadena .slx.
            DiscoveryMode::Auto => hierarchy.iter().any(|n| !n.children.is_empty()),
        };

        if use_index {
            let mut path = HashSet::new();
            self.build_node(root, &nodes_by_hid, &nodes_by_sid, 0, &mut path)
        } else {
            Ok(self.build_slx_root(root))
        }
    }

    // --- Variante con índice explícito ---

    fn build_node(
        &self,
        node: &RawHierarchyNode,
        nodes_by_hid: &HashMap<i64, &RawHierarchyNode>,
        nodes_by_sid: &HashMap<String, &RawHierarchyNode>,
        level: usize,
        path: &mut HashSet<i64>,
    ) -> Result<TreeNode, ResolveError> {
        // Conjunto de visitados acotado al camino actual: un hid repetido
        // en el mismo descenso es un ciclo en las declaraciones padre/hijo.
        if !path.insert(node.hid) {
            return Err(ResolveError::CyclicHierarchy(node.hid));
        }

        let mut tree_node = self.tree_node_shell(node, level);

        for element in &node.elements {
            if let Some(clickable) =
                classify_element(self.store, element, &node.children, nodes_by_sid)
            {
                tree_node.clickable_elements.push(clickable);
            }
        }

        // Los hijos salen EXCLUSIVAMENTE de la lista declarada filtrada por
        // el índice; nunca de escanear el almacén.
        for child_hid in &node.children {
            let Some(child) = nodes_by_hid.get(child_hid) else {
                warn!("Child hid:{child_hid} no encontrado en la jerarquía (referencia colgante)");
                continue;
            };
            let subtree =
                self.build_node(child, nodes_by_hid, nodes_by_sid, level + 1, path)?;
            tree_node.children.push(subtree);
        }

        path.remove(&node.hid);
        Ok(tree_node)
    }

    /// Esqueleto de un nodo resuelto con los nombres de fichero extraídos
    /// de las referencias del nodo crudo (último segmento de ruta, con
    /// fallback al diagrama raíz del producto).
    fn tree_node_shell(&self, node: &RawHierarchyNode, level: usize) -> TreeNode {
        let svg = last_segment(node.svg.as_deref())
            .unwrap_or_else(|| format!("{}_d.svg", self.product));
        let json = last_segment(node.sys_view_url.as_deref())
            .unwrap_or_else(|| format!("{}_d.json", self.product));

        TreeNode {
            name: node.name.clone(),
            label: node.label.clone().unwrap_or_else(|| node.name.clone()),
            fullname: Some(node.fullname.clone().unwrap_or_else(|| node.name.clone())),
            hid: Some(node.hid),
            sid: node.sid.clone(),
            class_name: node.class_name.clone(),
            icon: node.icon.clone(),
            svg_path: svg.clone(),
            json_path: json.clone(),
            svg,
            json,
            children: Vec::new(),
            level,
            is_root: level == 0,
            product: self.product.to_string(),
            clickable_elements: Vec::new(),
        }
    }

    // --- Variante de cadena de documentos .slx ---

    fn build_slx_root(&self, root: &RawHierarchyNode) -> TreeNode {
        let mut tree_node = self.tree_node_shell(root, 0);
        let root_doc = tree_node.json.clone();

        let mut path = HashSet::new();
        path.insert(root_doc.trim_end_matches("_d.json").to_string());
        self.populate_from_inspector(&mut tree_node, &root_doc, &mut path);
        tree_node
    }

    /// Lee el documento de detalle del nodo, extrae referencias `.slx` de
    /// `inspector.values` y cuelga un hijo por cada una cuyo artefacto
    /// exista. Documentos ilegibles se absorben: el nodo queda terminal.
    fn populate_from_inspector(
        &self,
        tree_node: &mut TreeNode,
        doc_name: &str,
        path: &mut HashSet<String>,
    ) {
        let doc = match reader::load_element_document(self.store, doc_name) {
            Ok(doc) => doc,
            Err(err) => {
                warn!("No se pudo leer {doc_name}: {err}");
                return;
            }
        };

        let child_level = tree_node.level + 1;

        for slx_ref in extract_slx_refs(&doc) {
            let base = slx_ref.file.trim_end_matches(".slx").to_string();
            let svg = format!("{base}_d.svg");
            let json = format!("{base}_d.json");

            if !self.store.exists(&svg) {
                debug!("Referencia {} sin artefacto {svg}, descartada", slx_ref.file);
                continue;
            }

            tree_node.clickable_elements.push(ClickableElement {
                sid: base.clone(),
                name: base.clone(),
                label: slx_ref.label.clone(),
                icon: None,
                svg: svg.clone(),
                json: json.clone(),
                hid: None,
                has_children: true,
                hierarchy_type: HierarchyType::Internal,
                external_hierarchy: None,
            });

            if !path.insert(base.clone()) {
                warn!("Ciclo de documentos .slx en {base}, se omite el descenso");
                continue;
            }

            let mut child = TreeNode {
                name: base.clone(),
                label: slx_ref.label.clone(),
                fullname: None,
                hid: None,
                sid: None,
                class_name: None,
                icon: None,
                svg: svg.clone(),
                json: json.clone(),
                svg_path: svg,
                json_path: json.clone(),
                children: Vec::new(),
                level: child_level,
                is_root: false,
                product: self.product.to_string(),
                clickable_elements: Vec::new(),
            };
            self.populate_from_inspector(&mut child, &json, path);
            path.remove(&base);

            tree_node.children.push(child);
        }
    }
}

struct SlxRef {
    file: String,
    label: String,
}

/// Extrae las referencias `.slx` de los arrays `inspector.values` de un
/// documento de detalle. Sólo cuenta el primer `.slx` por objeto; la
/// etiqueta sale del índice 11 de `values` cuando es una cadena no vacía.
fn extract_slx_refs(doc: &Value) -> Vec<SlxRef> {
    let items: Vec<&Value> = match doc {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };

    let mut refs = Vec::new();
    for item in items {
        let Some(values) = item
            .get("inspector")
            .and_then(|inspector| inspector.get("values"))
            .and_then(Value::as_array)
        else {
            continue;
        };

        for value in values {
            let Some(text) = value.as_str() else { continue };
            if !text.ends_with(".slx") {
                continue;
            }
            let label = values
                .get(11)
                .and_then(Value::as_str)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| text.trim_end_matches(".slx").to_string());
            refs.push(SlxRef {
                file: text.to_string(),
                label,
            });
            break;
        }
    }
    refs
}

/// Último segmento de una referencia con separadores `/` (o None si está
/// vacía o ausente).
fn last_segment(reference: Option<&str>) -> Option<String> {
    let reference = reference?;
    if reference.is_empty() {
        return None;
    }
    Some(
        reference
            .rsplit('/')
            .next()
            .unwrap_or(reference)
            .to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{MODEL_REF_ICON, SUBSYSTEM_ICON};
    use serde_json::json;

    fn write(dir: &std::path::Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    fn fixture() -> (tempfile::TempDir, WebviewStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = WebviewStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn three_level_hierarchy_resolves_end_to_end() {
        let (dir, store) = fixture();
        let doc = json!([
            {
                "hid": 1, "parent": 0, "name": "R",
                "svg": "support/R_d.svg", "sysViewURL": "support/R_d.json",
                "children": [2],
                "elements": [
                    {"sid": "A:1", "icon": SUBSYSTEM_ICON, "name": "C1"}
                ]
            },
            {
                "hid": 2, "parent": 1, "name": "C1", "sid": "A:1",
                "svg": "support/A_1_d.svg", "sysViewURL": "support/A_1_d.json",
                "children": [], "elements": []
            }
        ]);
        write(dir.path(), "R_diagrams_1.json", &doc.to_string());
        write(dir.path(), "A_1_d.svg", "<svg/>");

        let builder = TreeBuilder::new(&store, "R", DiscoveryMode::Auto);
        let tree = builder.build_from_root("R_diagrams_1.json").unwrap();

        assert!(tree.is_root);
        assert_eq!(tree.level, 0);
        assert_eq!(tree.svg, "R_d.svg");
        assert_eq!(tree.children.len(), 1);
        assert_eq!(tree.children[0].name, "C1");
        assert_eq!(tree.children[0].level, 1);
        assert!(tree.children[0].children.is_empty());

        assert_eq!(tree.clickable_elements.len(), 1);
        let clickable = &tree.clickable_elements[0];
        assert_eq!(clickable.sid, "A:1");
        assert_eq!(clickable.hierarchy_type, HierarchyType::Internal);
        assert!(clickable.has_children);
        assert_eq!(clickable.hid, Some(2));
    }

    #[test]
    fn dangling_child_reference_is_skipped() {
        let (dir, store) = fixture();
        let doc = json!([
            {"hid": 1, "parent": 0, "name": "R", "children": [2, 99], "elements": []},
            {"hid": 2, "parent": 1, "name": "C1", "children": [], "elements": []}
        ]);
        write(dir.path(), "R_diagrams_1.json", &doc.to_string());

        let builder = TreeBuilder::new(&store, "R", DiscoveryMode::Hierarchy);
        let tree = builder.build_from_root("R_diagrams_1.json").unwrap();
        assert_eq!(tree.children.len(), 1);
        assert_eq!(tree.children[0].name, "C1");
    }

    #[test]
    fn missing_root_is_fatal() {
        let (dir, store) = fixture();
        let doc = json!([
            {"hid": 1, "parent": 5, "name": "A", "children": [], "elements": []}
        ]);
        write(dir.path(), "A_diagrams_1.json", &doc.to_string());

        let builder = TreeBuilder::new(&store, "A", DiscoveryMode::Hierarchy);
        assert!(matches!(
            builder.build_from_root("A_diagrams_1.json"),
            Err(ResolveError::RootNotFound)
        ));
    }

    #[test]
    fn cyclic_declarations_are_detected() {
        let (dir, store) = fixture();
        let doc = json!([
            {"hid": 1, "parent": 0, "name": "R", "children": [2], "elements": []},
            {"hid": 2, "parent": 1, "name": "C", "children": [1], "elements": []}
        ]);
        write(dir.path(), "R_diagrams_1.json", &doc.to_string());

        let builder = TreeBuilder::new(&store, "R", DiscoveryMode::Hierarchy);
        assert!(matches!(
            builder.build_from_root("R_diagrams_1.json"),
            Err(ResolveError::CyclicHierarchy(1))
        ));
    }

    #[test]
    fn shared_subtree_across_branches_is_not_a_cycle() {
        // El nodo 4 es hijo declarado de dos ramas distintas; sólo la
        // repetición en el MISMO camino es un ciclo.
        let (dir, store) = fixture();
        let doc = json!([
            {"hid": 1, "parent": 0, "name": "R", "children": [2, 3], "elements": []},
            {"hid": 2, "parent": 1, "name": "A", "children": [4], "elements": []},
            {"hid": 3, "parent": 1, "name": "B", "children": [4], "elements": []},
            {"hid": 4, "parent": 2, "name": "C", "children": [], "elements": []}
        ]);
        write(dir.path(), "R_diagrams_1.json", &doc.to_string());

        let builder = TreeBuilder::new(&store, "R", DiscoveryMode::Hierarchy);
        let tree = builder.build_from_root("R_diagrams_1.json").unwrap();
        assert_eq!(tree.children[0].children[0].name, "C");
        assert_eq!(tree.children[1].children[0].name, "C");
    }

    #[test]
    fn external_reference_is_clickable_but_not_a_child() {
        let (dir, store) = fixture();
        let doc = json!([
            {
                "hid": 1, "parent": 0, "name": "R", "children": [],
                "elements": [
                    {"sid": "P:9", "icon": MODEL_REF_ICON, "name": "Ext"}
                ]
            }
        ]);
        write(dir.path(), "R_diagrams_1.json", &doc.to_string());
        write(dir.path(), "P_9_d.svg", "<svg/>");
        write(dir.path(), "Ext_diagrams_1.json", "[]");

        let builder = TreeBuilder::new(&store, "R", DiscoveryMode::Hierarchy);
        let tree = builder.build_from_root("R_diagrams_1.json").unwrap();

        assert!(tree.children.is_empty());
        assert_eq!(tree.clickable_elements.len(), 1);
        let clickable = &tree.clickable_elements[0];
        assert_eq!(clickable.hierarchy_type, HierarchyType::External);
        assert_eq!(
            clickable.external_hierarchy.as_deref(),
            Some("Ext_diagrams_1.json")
        );
    }

    #[test]
    fn repeated_builds_are_idempotent() {
        let (dir, store) = fixture();
        let doc = json!([
            {
                "hid": 1, "parent": 0, "name": "R", "children": [2],
                "elements": [{"sid": "A:1", "icon": SUBSYSTEM_ICON, "name": "C1"}]
            },
            {"hid": 2, "parent": 1, "name": "C1", "sid": "A:1", "children": [], "elements": []}
        ]);
        write(dir.path(), "R_diagrams_1.json", &doc.to_string());
        write(dir.path(), "A_1_d.svg", "<svg/>");

        let builder = TreeBuilder::new(&store, "R", DiscoveryMode::Auto);
        let first = builder.build_from_root("R_diagrams_1.json").unwrap();
        let second = builder.build_from_root("R_diagrams_1.json").unwrap();
        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }

    #[test]
    fn slx_chain_follows_inspector_values() {
        let (dir, store) = fixture();
        // Documento sin índice de hijos: Auto debe sondear y elegir la
        // cadena .slx.
        let doc = json!([
            {"hid": 1, "parent": 0, "name": "P",
             "svg": "support/P_d.svg", "sysViewURL": "support/P_d.json"}
        ]);
        write(dir.path(), "P_diagrams_1.json", &doc.to_string());
        write(
            dir.path(),
            "P_d.json",
            &json!([{"inspector": {"values": ["x", "Sub1.slx"]}}]).to_string(),
        );
        write(dir.path(), "Sub1_d.svg", "<svg/>");
        write(dir.path(), "Sub1_d.json", "[]");

        let builder = TreeBuilder::new(&store, "P", DiscoveryMode::Auto);
        let tree = builder.build_from_root("P_diagrams_1.json").unwrap();

        assert_eq!(tree.children.len(), 1);
        assert_eq!(tree.children[0].name, "Sub1");
        assert_eq!(tree.children[0].level, 1);
        assert!(tree.children[0].children.is_empty());

        assert_eq!(tree.clickable_elements.len(), 1);
        let clickable = &tree.clickable_elements[0];
        assert_eq!(clickable.svg, "Sub1_d.svg");
        assert_eq!(clickable.hierarchy_type, HierarchyType::Internal);
        assert!(clickable.has_children);
    }

    #[test]
    fn slx_label_comes_from_values_index_11() {
        let values = json!([{
            "inspector": {"values": [
                "Sub2.slx", "", "", "", "", "", "", "", "", "", "", "Etiqueta Bonita"
            ]}
        }]);
        let refs = extract_slx_refs(&values);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].file, "Sub2.slx");
        assert_eq!(refs[0].label, "Etiqueta Bonita");
    }

    #[test]
    fn slx_refs_take_first_match_per_object() {
        let values = json!([
            {"inspector": {"values": ["A.slx", "B.slx"]}},
            {"inspector": {"values": [1, 2, "C.slx"]}},
            {"sin_inspector": true}
        ]);
        let refs = extract_slx_refs(&values);
        let files: Vec<&str> = refs.iter().map(|r| r.file.as_str()).collect();
        assert_eq!(files, vec!["A.slx", "C.slx"]);
    }

    #[test]
    fn slx_chain_with_missing_artifact_drops_reference() {
        let (dir, store) = fixture();
        let doc = json!([
            {"hid": 1, "parent": 0, "name": "P", "sysViewURL": "support/P_d.json"}
        ]);
        write(dir.path(), "P_diagrams_1.json", &doc.to_string());
        write(
            dir.path(),
            "P_d.json",
            &json!([{"inspector": {"values": ["Fantasma.slx"]}}]).to_string(),
        );
        // Fantasma_d.svg no existe.

        let builder = TreeBuilder::new(&store, "P", DiscoveryMode::SlxChain);
        let tree = builder.build_from_root("P_diagrams_1.json").unwrap();
        assert!(tree.children.is_empty());
        assert!(tree.clickable_elements.is_empty());
    }

    #[test]
    fn slx_chain_guards_against_document_cycles() {
        let (dir, store) = fixture();
        let doc = json!([
            {"hid": 1, "parent": 0, "name": "P", "sysViewURL": "support/P_d.json"}
        ]);
        write(dir.path(), "P_diagrams_1.json", &doc.to_string());
        // P referencia a Sub1, y Sub1 referencia de vuelta a P.
        write(
            dir.path(),
            "P_d.json",
            &json!([{"inspector": {"values": ["Sub1.slx"]}}]).to_string(),
        );
        write(
            dir.path(),
            "Sub1_d.json",
            &json!([{"inspector": {"values": ["P.slx"]}}]).to_string(),
        );
        write(dir.path(), "Sub1_d.svg", "<svg/>");
        write(dir.path(), "P_d.svg", "<svg/>");

        let builder = TreeBuilder::new(&store, "P", DiscoveryMode::SlxChain);
        let tree = builder.build_from_root("P_diagrams_1.json").unwrap();

        // Sub1 cuelga de P, pero el descenso de vuelta a P se corta.
        assert_eq!(tree.children.len(), 1);
        assert!(tree.children[0].children.is_empty());
    }

    #[test]
    fn wire_format_matches_viewer_contract() {
        let (dir, store) = fixture();
        let doc = json!([
            {
                "hid": 1, "parent": 0, "name": "R", "children": [],
                "elements": [{"sid": "P:3", "icon": SUBSYSTEM_ICON, "name": "Hoja"}]
            }
        ]);
        write(dir.path(), "R_diagrams_1.json", &doc.to_string());
        write(dir.path(), "P_3_d.svg", "<svg/>");

        let builder = TreeBuilder::new(&store, "R", DiscoveryMode::Hierarchy);
        let tree = builder.build_from_root("R_diagrams_1.json").unwrap();
        let value = serde_json::to_value(&tree).unwrap();

        assert_eq!(value["is_root"], json!(true));
        assert_eq!(value["level"], json!(0));
        let clickable = &value["clickable_elements"][0];
        assert_eq!(clickable["hierarchy_type"], json!("leaf"));
        assert_eq!(clickable["has_children"], json!(false));
        assert_eq!(clickable["hid"], json!(null));
        assert!(clickable.get("external_hierarchy").is_none());
    }
}
