//! Generic attributed scene tree.

use smol_str::SmolStr;

/// A scene graph node: tag, ordered attributes, children and optional text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Node {
    pub tag: SmolStr,
    pub attrs: Vec<(SmolStr, String)>,
    pub children: Vec<Node>,
    /// Character content, for text-bearing elements.
    pub text: Option<String>,
}

impl Node {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: SmolStr::new(tag),
            ..Default::default()
        }
    }

    /// Builder form of [`Node::set_attr`].
    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Sets an attribute, keeping its position if it already exists.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value,
            None => self.attrs.push((SmolStr::new(name), value)),
        }
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|(k, _)| k == name)
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let idx = self.attrs.iter().position(|(k, _)| k == name)?;
        Some(self.attrs.remove(idx).1)
    }

    pub fn is_group(&self) -> bool {
        self.tag == "g"
    }

    /// Total number of nodes in this subtree, including `self`.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Node::count).sum::<usize>()
    }

    /// Depth-first search for nodes with the given tag.
    pub fn find_all<'a>(&'a self, tag: &str, out: &mut Vec<&'a Node>) {
        if self.tag == tag {
            out.push(self);
        }
        for c in &self.children {
            c.find_all(tag, out);
        }
    }

    pub fn descendants_with_tag(&self, tag: &str) -> Vec<&Node> {
        let mut out = Vec::new();
        self.find_all(tag, &mut out);
        out
    }

    /// Looks up a node by `id` attribute.
    pub fn find_by_id(&self, id: &str) -> Option<&Node> {
        if self.get_attr("id") == Some(id) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_by_id(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_attr_keeps_order() {
        let mut n = Node::new("rect").attr("x", "1").attr("y", "2");
        n.set_attr("x", "5");
        assert_eq!(
            n.attrs,
            vec![("x".into(), "5".to_string()), ("y".into(), "2".to_string())]
        );
        assert_eq!(n.remove_attr("x").as_deref(), Some("5"));
        assert!(!n.has_attr("x"));
    }

    #[test]
    fn test_find_helpers() {
        let tree = Node::new("svg")
            .child(Node::new("g").child(Node::new("rect").attr("id", "r1")))
            .child(Node::new("rect"));
        assert_eq!(tree.count(), 4);
        assert_eq!(tree.descendants_with_tag("rect").len(), 2);
        assert!(tree.find_by_id("r1").is_some());
    }
}
