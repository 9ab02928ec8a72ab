//! Attribute optimizer over hand-built trees.

use folio_core::Node;
use folio_core::output::optimizer::optimize;

fn path(fill: &str, stroke: Option<&str>) -> Node {
    let mut n = Node::new("path").attr("d", "M0 0H1").attr("fill", fill);
    if let Some(s) = stroke {
        n.set_attr("stroke", s);
    }
    n
}

fn content(children: Vec<Node>) -> Node {
    let mut g = Node::new("g").attr("id", "content");
    g.children = children;
    Node::new("svg").child(g)
}

#[test]
fn test_runs_split_by_attribute_changes() {
    let mut root = content(vec![
        path("#f00", None),
        path("#f00", None),
        path("#f00", None),
        path("#00f", None),
        path("#00f", None),
        path("#00f", None),
    ]);
    optimize(&mut root, 3);
    let g = &root.children[0];
    assert_eq!(g.children.len(), 2);
    assert_eq!(g.children[0].get_attr("fill"), Some("#f00"));
    assert_eq!(g.children[1].get_attr("fill"), Some("#00f"));
    assert_eq!(g.children[1].children.len(), 3);
}

#[test]
fn test_partial_attribute_sets_not_grouped() {
    let mut root = content(vec![
        path("#f00", Some("#000")),
        path("#f00", None),
        path("#f00", Some("#000")),
        Node::new("rect"),
    ]);
    let before = root.clone();
    optimize(&mut root, 3);
    assert_eq!(root, before);
}

#[test]
fn test_definitions_untouched() {
    let clip = Node::new("clipPath")
        .attr("id", "c1")
        .child(path("#f00", None))
        .child(path("#f00", None))
        .child(path("#f00", None));
    let mut root = Node::new("svg").child(Node::new("defs").child(clip));
    let before = root.clone();
    optimize(&mut root, 3);
    assert_eq!(root, before);
}

#[test]
fn test_text_content_preserved() {
    let text = Node::new("text")
        .attr("font-size", "12")
        .child(Node::new("tspan").attr("fill", "#f00").with_text("a"))
        .child(Node::new("tspan").attr("fill", "#f00").with_text("b"))
        .child(Node::new("tspan").attr("fill", "#f00").with_text("c"));
    let mut root = content(vec![text.clone(), Node::new("rect")]);
    optimize(&mut root, 3);
    assert_eq!(root.children[0].children[0], text);
}
