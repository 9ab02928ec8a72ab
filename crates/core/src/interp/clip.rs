//! Clip region manager.
//!
//! Clip regions form a forest of nodes stored in an arena and addressed by
//! [`ClipRef`]. Every node is identified by a hash over its parent id, its
//! geometry and its fill rule, so intersecting the same parent with the same
//! geometry twice yields the same node. Nodes are only emitted once content is
//! actually wrapped by them (see [`ClipArena::mark_referenced`]).

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::geometry::{Path, Rectangle};
use crate::output::defs::stable_id;
use crate::output::node::Node;
use crate::params::format_number;

/// Index of a node in a [`ClipArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClipRef(u32);

impl ClipRef {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Device-space geometry of a clip node.
#[derive(Debug, Clone, PartialEq)]
pub enum ClipGeometry {
    Rect(Rectangle),
    Path(Path),
    /// Glyph outlines of text drawn with a clipping render mode.
    Text(Vec<Node>),
}

#[derive(Debug, Clone)]
pub struct ClipNode {
    pub id: SmolStr,
    pub parent: Option<ClipRef>,
    pub geometry: ClipGeometry,
    pub even_odd: bool,
    pub children: FxHashMap<SmolStr, ClipRef>,
    pub referenced: bool,
}

impl ClipNode {
    pub fn is_rect(&self) -> bool {
        matches!(self.geometry, ClipGeometry::Rect(_))
    }
}

/// Arena of clip nodes for one page.
#[derive(Debug, Default)]
pub struct ClipArena {
    nodes: Vec<ClipNode>,
    roots: FxHashMap<SmolStr, ClipRef>,
    precision: usize,
}

impl ClipArena {
    pub fn new(precision: usize) -> Self {
        Self {
            nodes: Vec::new(),
            roots: FxHashMap::default(),
            precision,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, r: ClipRef) -> &ClipNode {
        &self.nodes[r.index()]
    }

    pub fn id(&self, r: ClipRef) -> &str {
        &self.nodes[r.index()].id
    }

    /// The clip rectangle when `r` is a single rectangle with no ancestors.
    pub fn unnested_rect(&self, r: ClipRef) -> Option<Rectangle> {
        let node = self.get(r);
        match (&node.geometry, node.parent) {
            (ClipGeometry::Rect(rect), None) => Some(*rect),
            _ => None,
        }
    }

    /// Intersects `parent` with a device-space path.
    ///
    /// Axis-aligned rectangles become rectangle nodes; a rectangle inside a
    /// plain rectangle parent is merged with it and attached to the parent's
    /// own parent.
    pub fn intersect(&mut self, parent: Option<ClipRef>, path: &Path, even_odd: bool) -> ClipRef {
        match Rectangle::from_path(path) {
            Some(rect) => self.intersect_rect(parent, rect),
            None => self.insert(parent, ClipGeometry::Path(path.clone()), even_odd),
        }
    }

    pub fn intersect_rect(&mut self, parent: Option<ClipRef>, rect: Rectangle) -> ClipRef {
        if let Some(p) = parent
            && let ClipGeometry::Rect(prect) = self.get(p).geometry
        {
            let merged = rect
                .intersect(&prect)
                .unwrap_or(Rectangle::new(rect.x1, rect.y1, rect.x1, rect.y1));
            let grandparent = self.get(p).parent;
            return self.insert(grandparent, ClipGeometry::Rect(merged), false);
        }
        self.insert(parent, ClipGeometry::Rect(rect), false)
    }

    /// Intersects `parent` with text outlines.
    pub fn intersect_text(&mut self, parent: Option<ClipRef>, text: Vec<Node>) -> ClipRef {
        self.insert(parent, ClipGeometry::Text(text), false)
    }

    fn describe(&self, geometry: &ClipGeometry) -> String {
        let p = self.precision;
        match geometry {
            ClipGeometry::Rect(r) => format!(
                "R{} {} {} {}",
                format_number(r.x1, p),
                format_number(r.y1, p),
                format_number(r.x2, p),
                format_number(r.y2, p)
            ),
            ClipGeometry::Path(path) => format!("P{}", path.to_data(p)),
            ClipGeometry::Text(nodes) => format!("T{:?}", nodes),
        }
    }

    fn insert(
        &mut self,
        parent: Option<ClipRef>,
        geometry: ClipGeometry,
        even_odd: bool,
    ) -> ClipRef {
        let parent_id = parent.map(|p| self.id(p).to_string()).unwrap_or_default();
        let key = format!(
            "{}|{}|{}",
            parent_id,
            self.describe(&geometry),
            if even_odd { "evenodd" } else { "nonzero" }
        );
        let id = stable_id("clip", &key);

        let siblings = match parent {
            Some(p) => &self.nodes[p.index()].children,
            None => &self.roots,
        };
        if let Some(existing) = siblings.get(&id) {
            return *existing;
        }

        let r = ClipRef(self.nodes.len() as u32);
        self.nodes.push(ClipNode {
            id: id.clone(),
            parent,
            geometry,
            even_odd,
            children: FxHashMap::default(),
            referenced: false,
        });
        match parent {
            Some(p) => self.nodes[p.index()].children.insert(id, r),
            None => self.roots.insert(id, r),
        };
        r
    }

    /// Marks `r` and its ancestors as used by emitted content.
    pub fn mark_referenced(&mut self, r: ClipRef) {
        let mut current = Some(r);
        while let Some(c) = current {
            let node = &mut self.nodes[c.index()];
            if node.referenced {
                break;
            }
            node.referenced = true;
            current = node.parent;
        }
    }

    /// `clipPath` definitions of all referenced nodes, parents first.
    pub fn to_nodes(&self) -> Vec<Node> {
        let p = self.precision;
        self.nodes
            .iter()
            .filter(|n| n.referenced)
            .map(|n| {
                let mut clip = Node::new("clipPath").attr("id", n.id.as_str());
                if let Some(parent) = n.parent {
                    clip.set_attr("clip-path", format!("url(#{})", self.id(parent)));
                }
                match &n.geometry {
                    ClipGeometry::Rect(r) => clip.children.push(
                        Node::new("rect")
                            .attr("x", format_number(r.x1, p))
                            .attr("y", format_number(r.y1, p))
                            .attr("width", format_number(r.width(), p))
                            .attr("height", format_number(r.height(), p)),
                    ),
                    ClipGeometry::Path(path) => {
                        let mut node = Node::new("path").attr("d", path.to_data(p));
                        if n.even_odd {
                            node.set_attr("clip-rule", "evenodd");
                        }
                        clip.children.push(node);
                    }
                    ClipGeometry::Text(nodes) => clip.children.extend(nodes.iter().cloned()),
                }
                clip
            })
            .collect()
    }
}
