//! TOC normalizer.
//!
//! Turns Doxygen's `toc.xml` (`<toc>` with nested `<topic label href>`
//! elements) into the `toc.json` tree used by every other job: ids are
//! assigned pre-order and one subtree can be relocated beforehand.

use std::path::Path;

use tracing::{debug, info, instrument};

use docsite_shared::{DocsiteError, RelocationConfig, Result, TocDocument, TocNode};

/// Parse a TOC XML document into a tree (ids not yet assigned).
#[instrument(skip_all, fields(len = xml.len()))]
pub fn parse_toc_xml(xml: &str) -> Result<TocNode> {
    let doc = roxmltree::Document::parse(xml)
        .map_err(|e| DocsiteError::parse(format!("invalid TOC XML: {e}")))?;

    let toc = doc
        .descendants()
        .find(|n| n.has_tag_name("toc"))
        .ok_or_else(|| DocsiteError::parse("no <toc> element in TOC XML"))?;

    Ok(convert_node(toc))
}

fn convert_node(node: roxmltree::Node<'_, '_>) -> TocNode {
    let children = node
        .children()
        .filter(|c| c.has_tag_name("topic"))
        .map(convert_node)
        .collect();
    TocNode::new(node.attribute("label").unwrap_or_default(), node.attribute("href"))
        .with_children(children)
}

/// Assign pre-order ids starting at 0. Returns the number of nodes.
pub fn assign_ids(root: &mut TocNode) -> u32 {
    let mut next = 0;
    assign(root, &mut next);
    next
}

fn assign(node: &mut TocNode, next: &mut u32) {
    node.id = *next;
    *next += 1;
    for child in &mut node.children {
        assign(child, next);
    }
}

// ---------------------------------------------------------------------------
// Relocation
// ---------------------------------------------------------------------------

/// Move the node described by `reloc` under its new parent, renaming it.
///
/// Every lookup happens before the tree is touched, so on error the tree
/// is exactly as it was.
#[instrument(skip_all, fields(label = %reloc.label, rename = %reloc.rename))]
pub fn relocate(root: &mut TocNode, reloc: &RelocationConfig) -> Result<()> {
    let from = resolve_path(root, &reloc.from)?;
    let index = find_child(node_at(root, &from), &reloc.label)?;
    let mut to = resolve_path(root, &reloc.to)?;

    let mut moved_path = from.clone();
    moved_path.push(index);
    if to.starts_with(&moved_path) {
        return Err(DocsiteError::validation(format!(
            "cannot move '{}' beneath itself",
            reloc.label
        )));
    }

    // Removing the node shifts its later siblings down by one.
    if to.len() > from.len() && to.starts_with(&from) && to[from.len()] > index {
        to[from.len()] -= 1;
    }

    let mut node = node_at_mut(root, &from).children.remove(index);
    node.label.clone_from(&reloc.rename);
    node_at_mut(root, &to).children.push(node);

    info!(
        from = %display_path(&reloc.from),
        to = %display_path(&reloc.to),
        "relocated TOC node"
    );
    Ok(())
}

/// Indices of the nodes along a label path from the root.
fn resolve_path(root: &TocNode, labels: &[String]) -> Result<Vec<usize>> {
    let mut indices = Vec::with_capacity(labels.len());
    let mut node = root;
    for label in labels {
        let i = find_child(node, label)?;
        indices.push(i);
        node = &node.children[i];
    }
    Ok(indices)
}

/// Index of the single child labelled `label`.
fn find_child(parent: &TocNode, label: &str) -> Result<usize> {
    let matches: Vec<usize> = parent
        .children
        .iter()
        .enumerate()
        .filter(|(_, c)| c.label == label)
        .map(|(i, _)| i)
        .collect();

    match matches.as_slice() {
        [i] => Ok(*i),
        _ => Err(DocsiteError::TocNode {
            label: label.to_string(),
            parent: parent.label.clone(),
            found: matches.len(),
            siblings: parent.child_labels(),
        }),
    }
}

fn node_at<'a>(root: &'a TocNode, path: &[usize]) -> &'a TocNode {
    path.iter().fold(root, |node, &i| &node.children[i])
}

fn node_at_mut<'a>(root: &'a mut TocNode, path: &[usize]) -> &'a mut TocNode {
    path.iter().fold(root, |node, &i| &mut node.children[i])
}

fn display_path(labels: &[String]) -> String {
    if labels.is_empty() {
        "<root>".into()
    } else {
        labels.join(" > ")
    }
}

// ---------------------------------------------------------------------------
// Whole conversion and file I/O
// ---------------------------------------------------------------------------

/// XML → normalized document: parse, optionally relocate, then assign ids.
pub fn convert(xml: &str, relocation: Option<&RelocationConfig>) -> Result<TocDocument> {
    let mut toc = parse_toc_xml(xml)?;
    if let Some(reloc) = relocation {
        relocate(&mut toc, reloc)?;
    }
    let count = assign_ids(&mut toc);
    debug!(nodes = count, "ids assigned");
    Ok(TocDocument { toc })
}

/// Read and parse a `toc.json` file.
pub fn load_toc(path: &Path) -> Result<TocDocument> {
    let content = std::fs::read_to_string(path).map_err(|e| DocsiteError::io(path, e))?;
    serde_json::from_str(&content)
        .map_err(|e| DocsiteError::parse(format!("{}: {e}", path.display())))
}

/// Write a document as compact JSON.
pub fn write_toc(path: &Path, doc: &TocDocument) -> Result<()> {
    let json = serde_json::to_string(doc)
        .map_err(|e| DocsiteError::parse(format!("failed to serialize TOC: {e}")))?;
    std::fs::write(path, json).map_err(|e| DocsiteError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE: &str = r#"<toc label="root" href="index.html">
  <topic label="Build Apps" href="a.html">
    <topic label="Concepts" href="b.html"/>
  </topic>
</toc>"#;

    fn sample_tree() -> TocNode {
        TocNode::new("Legato", Some("index.html")).with_children(vec![
            TocNode::new("Build Apps", Some("buildAppsMain.html")).with_children(vec![
                TocNode::new("Concepts", Some("concepts.html")),
                TocNode::new("API Guides", Some("apiGuides.html")),
            ]),
            TocNode::new("Reference", Some("reference.html"))
                .with_children(vec![TocNode::new("le_args.h", Some("le__args_8h.html"))]),
            TocNode::new("About", Some("aboutLegato.html")),
        ])
    }

    #[test]
    fn xml_becomes_nested_tree_with_preorder_ids() {
        let doc = convert(SIMPLE, None).expect("convert");
        assert_eq!(doc.toc.label, "root");
        assert_eq!(doc.toc.id, 0);
        assert_eq!(doc.toc.children[0].label, "Build Apps");
        assert_eq!(doc.toc.children[0].id, 1);
        assert_eq!(doc.toc.children[0].children[0].href.as_deref(), Some("b.html"));
        assert_eq!(doc.toc.children[0].children[0].id, 2);
    }

    #[test]
    fn json_output_matches_toc_format() {
        let doc = convert(SIMPLE, None).expect("convert");
        let json = serde_json::to_string(&doc).expect("serialize");
        assert_eq!(
            json,
            r#"{"toc":{"label":"root","href":"index.html","children":[{"label":"Build Apps","href":"a.html","children":[{"label":"Concepts","href":"b.html","id":2}],"id":1}],"id":0}}"#
        );
    }

    #[test]
    fn id_assignment_is_deterministic() {
        let mut tree = sample_tree();
        assert_eq!(assign_ids(&mut tree), 7);
        let first = tree.clone();
        assign_ids(&mut tree);
        assert_eq!(tree, first);
        let ids: Vec<u32> = {
            fn collect(n: &TocNode, out: &mut Vec<u32>) {
                out.push(n.id);
                n.children.iter().for_each(|c| collect(c, out));
            }
            let mut out = Vec::new();
            collect(&tree, &mut out);
            out
        };
        assert_eq!(ids, vec![0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn missing_toc_element_is_an_error() {
        let err = parse_toc_xml("<index><topic label=\"x\"/></index>").unwrap_err();
        assert!(matches!(err, DocsiteError::Parse { .. }));
        assert!(parse_toc_xml("<toc label=").is_err());
    }

    #[test]
    fn default_relocation_moves_reference() {
        let mut tree = sample_tree();
        relocate(&mut tree, &RelocationConfig::default()).expect("relocate");

        assert_eq!(tree.child_labels(), vec!["Build Apps", "About"]);
        let guides = &tree.children[0].children[1];
        assert_eq!(guides.label, "API Guides");
        assert_eq!(guides.children.len(), 1);
        assert_eq!(guides.children[0].label, "C Prototypes");
        assert_eq!(guides.children[0].children[0].label, "le_args.h");
    }

    #[test]
    fn relocation_into_later_sibling_adjusts_index() {
        let mut tree = sample_tree();
        let reloc = RelocationConfig {
            label: "Build Apps".into(),
            from: vec![],
            rename: "Apps".into(),
            to: vec!["About".into()],
        };
        relocate(&mut tree, &reloc).expect("relocate");
        assert_eq!(tree.child_labels(), vec!["Reference", "About"]);
        assert_eq!(tree.children[1].children[0].label, "Apps");
    }

    #[test]
    fn failed_relocation_leaves_tree_untouched() {
        let mut tree = sample_tree();
        let before = tree.clone();
        let reloc = RelocationConfig {
            to: vec!["Build Apps".into(), "Missing".into()],
            ..RelocationConfig::default()
        };
        let err = relocate(&mut tree, &reloc).unwrap_err();
        assert_eq!(tree, before);
        let msg = err.to_string();
        assert!(msg.contains("'Missing'"));
        assert!(msg.contains("Build Apps:\n    Concepts\n    API Guides"));
    }

    #[test]
    fn missing_source_label_is_reported() {
        let mut tree = sample_tree();
        let before = tree.clone();
        let reloc = RelocationConfig {
            label: "Nope".into(),
            from: vec![],
            rename: "X".into(),
            to: vec!["Build Apps".into()],
        };
        let err = relocate(&mut tree, &reloc).unwrap_err();
        assert!(matches!(err, DocsiteError::TocNode { found: 0, .. }));
        let msg = err.to_string();
        assert!(msg.contains("'Nope'"));
        assert!(msg.contains("Build Apps"));
        assert!(msg.contains("About"));
        assert_eq!(tree, before);
    }

    #[test]
    fn duplicate_label_is_reported() {
        let mut tree = TocNode::new("root", None).with_children(vec![
            TocNode::new("Reference", Some("a.html")),
            TocNode::new("Reference", Some("b.html")),
        ]);
        let err = relocate(&mut tree, &RelocationConfig::default()).unwrap_err();
        assert!(matches!(err, DocsiteError::TocNode { found: 2, .. }));
    }

    #[test]
    fn moving_beneath_itself_is_rejected() {
        let mut tree = sample_tree();
        let before = tree.clone();
        let reloc = RelocationConfig {
            label: "Build Apps".into(),
            from: vec![],
            rename: "x".into(),
            to: vec!["Build Apps".into(), "Concepts".into()],
        };
        let err = relocate(&mut tree, &reloc).unwrap_err();
        assert!(matches!(err, DocsiteError::Validation { .. }));
        assert_eq!(tree, before);
    }

    #[test]
    fn toc_file_round_trip() {
        let dir = std::env::temp_dir().join(format!("docsite-toc-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("toc.json");

        let doc = convert(SIMPLE, None).expect("convert");
        write_toc(&path, &doc).expect("write");
        assert_eq!(load_toc(&path).expect("load"), doc);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn fixture_toc_converts() {
        let xml = std::fs::read_to_string("../../../fixtures/toc.xml").expect("fixture");
        let doc = convert(&xml, Some(&RelocationConfig::default())).expect("convert");
        let labels = doc.toc.child_labels();
        assert!(!labels.contains(&"Reference".to_string()));
        assert_eq!(doc.toc.id, 0);

        let guides = &doc.toc.children[0].children[1];
        assert_eq!(guides.label, "API Guides");
        assert_eq!(guides.child_labels(), vec!["Arguments", "C Prototypes"]);
        assert_eq!(guides.children[1].children.len(), 2);
    }
}
