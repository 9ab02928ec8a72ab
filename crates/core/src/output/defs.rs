//! Shared definitions pool.
//!
//! Clip paths, images, patterns, gradients, masks and style rules are emitted
//! once, keyed by a stable id derived from their content, and referenced by
//! id everywhere else.

use indexmap::IndexMap;
use smol_str::SmolStr;

use super::node::Node;

/// Derives a deterministic id from a content description.
pub fn stable_id(prefix: &str, key: &str) -> SmolStr {
    let digest = md5::compute(key.as_bytes());
    let hex = format!("{:x}", digest);
    SmolStr::new(format!("{}{}", prefix, &hex[..10]))
}

/// Definitions collected while interpreting a page.
#[derive(Debug, Default)]
pub struct DefsPool {
    defs: IndexMap<SmolStr, Node>,
    /// CSS declarations -> class name
    styles: IndexMap<String, SmolStr>,
}

impl DefsPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.defs.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty() && self.styles.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.defs.get(id)
    }

    /// Adds the definition built by `build` unless `id` is already present.
    /// The built node receives `id` as its `id` attribute.
    pub fn get_or_insert_with(&mut self, id: &str, build: impl FnOnce() -> Node) -> SmolStr {
        if !self.defs.contains_key(id) {
            let mut node = build();
            node.set_attr("id", id);
            self.defs.insert(SmolStr::new(id), node);
        } else {
            tracing::trace!(id, "definition reused");
        }
        SmolStr::new(id)
    }

    /// Returns the class for a set of CSS declarations, creating a rule for it
    /// on first use.
    pub fn style_class(&mut self, declarations: &str) -> SmolStr {
        if let Some(class) = self.styles.get(declarations) {
            return class.clone();
        }
        let class = stable_id("s", declarations);
        self.styles.insert(declarations.to_string(), class.clone());
        class
    }

    /// Stylesheet text of all registered classes.
    pub fn stylesheet(&self) -> String {
        self.styles
            .iter()
            .map(|(decl, class)| format!(".{}{{{}}}", class, decl))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Builds the `defs` element: the stylesheet, then `leading` (clip paths)
    /// and the pooled definitions in insertion order.
    pub fn into_node(self, leading: Vec<Node>) -> Node {
        let mut defs = Node::new("defs");
        if !self.styles.is_empty() {
            defs.children
                .push(Node::new("style").with_text(self.stylesheet()));
        }
        defs.children.extend(leading);
        defs.children.extend(self.defs.into_values());
        defs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stable_id_is_deterministic() {
        assert_eq!(stable_id("c", "abc"), stable_id("c", "abc"));
        assert_ne!(stable_id("c", "abc"), stable_id("c", "abd"));
        assert!(stable_id("img", "x").starts_with("img"));
    }

    #[test]
    fn test_insert_once() {
        let mut pool = DefsPool::new();
        let mut calls = 0;
        for _ in 0..3 {
            pool.get_or_insert_with("p1", || {
                calls += 1;
                Node::new("pattern")
            });
        }
        assert_eq!(calls, 1);
        assert_eq!(pool.get("p1").and_then(|n| n.get_attr("id")), Some("p1"));
    }

    #[test]
    fn test_style_classes_shared() {
        let mut pool = DefsPool::new();
        let a = pool.style_class("font-family:serif");
        let b = pool.style_class("font-family:serif");
        let c = pool.style_class("font-family:sans-serif");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(pool.stylesheet().lines().count(), 2);
    }
}
