//! Attribute optimizer.
//!
//! Post-pass over the finished tree:
//! - runs of consecutive siblings sharing inheritable presentation
//!   attributes are wrapped in a group carrying those attributes;
//! - attributes shared by every child of a group move up to the group;
//! - groups left without attributes are dissolved into their parent.

use itertools::Itertools;

use super::node::Node;

/// Presentation attributes whose value is inherited by descendants.
const INHERITABLE: &[&str] = &[
    "fill",
    "fill-opacity",
    "fill-rule",
    "stroke",
    "stroke-width",
    "stroke-linecap",
    "stroke-linejoin",
    "stroke-miterlimit",
    "stroke-dasharray",
    "stroke-dashoffset",
    "stroke-opacity",
    "font-family",
    "font-size",
    "font-weight",
    "font-style",
];

fn is_inheritable(name: &str) -> bool {
    INHERITABLE.contains(&name)
}

/// Elements that may be wrapped in and hoisted from groups.
fn is_groupable(node: &Node) -> bool {
    matches!(
        node.tag.as_str(),
        "path" | "rect" | "text" | "use" | "image" | "g"
    )
}

/// Inheritable attributes of a node, sorted by name.
fn inherited_attrs(node: &Node) -> Vec<(&str, &str)> {
    node.attrs
        .iter()
        .filter(|(k, _)| is_inheritable(k))
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .sorted()
        .collect()
}

/// Attributes present with equal values on all nodes.
fn common_attrs(nodes: &[Node]) -> Vec<(String, String)> {
    let Some(first) = nodes.first() else {
        return Vec::new();
    };
    inherited_attrs(first)
        .into_iter()
        .filter(|(k, v)| nodes[1..].iter().all(|n| n.get_attr(k) == Some(*v)))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Optimizes the children of `node` recursively.
pub fn optimize(node: &mut Node, min_run: usize) {
    for child in &mut node.children {
        optimize(child, min_run);
    }
    if matches!(node.tag.as_str(), "clipPath" | "mask" | "pattern" | "defs" | "text") {
        return;
    }
    group_runs(node, min_run);
    if node.is_group() {
        hoist(node);
    }
    dissolve_empty_groups(node);
}

/// Wraps runs of at least `min_run` siblings sharing inheritable attributes.
fn group_runs(node: &mut Node, min_run: usize) {
    if node.children.len() < min_run {
        return;
    }
    let children = std::mem::take(&mut node.children);
    let keyed: Vec<(Vec<(String, String)>, Node)> = children
        .into_iter()
        .map(|c| {
            let key = if is_groupable(&c) {
                inherited_attrs(&c)
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect()
            } else {
                Vec::new()
            };
            (key, c)
        })
        .collect();

    // Whole-node parents get their attributes hoisted instead.
    let all_same = node.is_group() && keyed.iter().map(|(k, _)| k).all_equal();

    for (key, run) in &keyed.into_iter().chunk_by(|(k, _)| k.clone()) {
        let run: Vec<Node> = run.map(|(_, n)| n).collect();
        if key.is_empty() || run.len() < min_run || all_same {
            node.children.extend(run);
            continue;
        }
        let mut group = Node::new("g");
        for (k, v) in &key {
            group.set_attr(k, v.clone());
        }
        group.children = run
            .into_iter()
            .map(|mut n| {
                for (k, _) in &key {
                    n.remove_attr(k);
                }
                n
            })
            .collect();
        node.children.push(group);
    }
}

/// Moves attributes shared by all children of a group onto the group.
fn hoist(group: &mut Node) {
    if group.children.len() < 2 || !group.children.iter().all(is_groupable) {
        return;
    }
    for (k, v) in common_attrs(&group.children) {
        match group.get_attr(&k) {
            Some(existing) if existing != v => continue,
            _ => {}
        }
        group.set_attr(&k, v);
        for child in &mut group.children {
            child.remove_attr(&k);
        }
    }
}

/// Replaces attribute-less groups by their children.
fn dissolve_empty_groups(node: &mut Node) {
    if !node.children.iter().any(|c| c.is_group() && c.attrs.is_empty()) {
        return;
    }
    let children = std::mem::take(&mut node.children);
    for child in children {
        if child.is_group() && child.attrs.is_empty() {
            node.children.extend(child.children);
        } else {
            node.children.push(child);
        }
    }
}
