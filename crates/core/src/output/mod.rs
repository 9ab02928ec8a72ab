//! Output scene tree, definitions pool, optimizer and SVG writer.

pub mod defs;
pub mod node;
pub mod optimizer;
pub mod svg;

pub use defs::{DefsPool, stable_id};
pub use node::Node;
pub use svg::{SvgWriter, to_svg_string};

/// A converted page: viewport size and the root `svg` element, which holds a
/// `defs` element followed by the `g#content` container.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub width: f64,
    pub height: f64,
    pub root: Node,
}

impl Document {
    pub fn defs(&self) -> Option<&Node> {
        self.root.children.iter().find(|c| c.tag == "defs")
    }

    pub fn content(&self) -> Option<&Node> {
        self.root.find_by_id("content")
    }

    pub fn to_svg(&self) -> String {
        to_svg_string(self)
    }
}
