//! Content stream interpreter and scene builder.
//!
//! `PageInterpreter` walks an operator stream, dispatching every operator
//! through the static operator table to the `do_*` handlers in
//! [`crate::interp::ops`]. Handlers mutate the graphics state, the current
//! path and the clip arena, and append nodes to the current output container.
//!
//! Nested content (forms, tiling pattern cells, soft mask groups, annotation
//! appearances, Type 3 glyphs) runs through [`PageInterpreter::run_nested`],
//! which swaps the whole per-stream context out, runs the nested stream and
//! swaps the outer context back in whether or not the nested run succeeded.

use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock};

use crate::error::{FolioError, Result};
use crate::geometry::{Matrix, Path, Rectangle};
use crate::interp::clip::{ClipArena, ClipRef};
use crate::interp::dispatch::OperatorTable;
use crate::interp::ops;
use crate::layout::text::{TextBuilder, TextStyle};
use crate::model::cache::ResourceCache;
use crate::model::objects::Operation;
use crate::model::resources::{Form, Resources};
use crate::model::state::GraphicsState;
use crate::output::Document;
use crate::output::defs::DefsPool;
use crate::output::node::Node;
use crate::output::optimizer;
use crate::params::ConvertOptions;

/// Operator table shared by all interpreters.
pub(crate) static OPERATORS: LazyLock<OperatorTable<PageInterpreter>> =
    LazyLock::new(ops::operator_table);

/// Cooperative cancellation signal, cheap to clone and share across threads.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// An annotation appearance to draw on top of the page content.
#[derive(Debug, Clone)]
pub struct Annotation {
    /// Annotation rectangle in default user space.
    pub rect: Rectangle,
    pub appearance: Arc<Form>,
    /// Annotations flagged hidden are skipped.
    pub hidden: bool,
}

/// Per-stream interpreter context, swapped out while nested content runs.
pub(crate) struct InterpreterState {
    pub(crate) gstate: GraphicsState,
    pub(crate) gstack: Vec<GraphicsState>,
    pub(crate) curpath: Path,
    pub(crate) pending_clip: Option<bool>,
    pub(crate) resources: Arc<dyn Resources>,
    pub(crate) content: Vec<Node>,
    pub(crate) open_clip: Option<ClipRef>,
    pub(crate) text: TextBuilder,
    pub(crate) text_clip: Vec<Node>,
    pub(crate) in_text: bool,
    pub(crate) text_style: Option<(f64, Arc<TextStyle>)>,
    pub(crate) color_locked: bool,
    pub(crate) marked_depth: usize,
}

impl InterpreterState {
    pub(crate) fn new(
        gstate: GraphicsState,
        resources: Arc<dyn Resources>,
        options: &ConvertOptions,
    ) -> Self {
        Self {
            gstate,
            gstack: Vec::new(),
            curpath: Path::new(),
            pending_clip: None,
            resources,
            content: Vec::new(),
            open_clip: None,
            text: TextBuilder::new(options),
            text_clip: Vec::new(),
            in_text: false,
            text_style: None,
            color_locked: false,
            marked_depth: 0,
        }
    }
}

/// Page interpreter - executes content stream operators into a scene tree.
///
/// Note: Method names like `do_Q`, `do_S`, `do_B` intentionally use uppercase
/// to match the operator names (q/Q, s/S, b/B, etc.).
pub struct PageInterpreter {
    pub(crate) options: ConvertOptions,
    /// Current graphics state
    pub(crate) gstate: GraphicsState,
    /// Graphics state stack for q/Q operators
    pub(crate) gstack: Vec<GraphicsState>,
    /// Current path being constructed, in user space
    pub(crate) curpath: Path,
    /// Clip requested by W/W* (even-odd flag), applied by the next painting operator
    pub(crate) pending_clip: Option<bool>,
    /// Resources of the content being executed
    pub(crate) resources: Arc<dyn Resources>,
    pub(crate) cache: Option<Arc<ResourceCache>>,
    pub(crate) clips: ClipArena,
    pub(crate) defs: DefsPool,
    /// Current output container
    pub(crate) content: Vec<Node>,
    /// Clip of the wrapper group that is the last node of `content`
    pub(crate) open_clip: Option<ClipRef>,
    pub(crate) text: TextBuilder,
    /// Outlines of clipping text in the current text object
    pub(crate) text_clip: Vec<Node>,
    pub(crate) in_text: bool,
    /// Cached text style, keyed by line scale
    pub(crate) text_style: Option<(f64, Arc<TextStyle>)>,
    /// Color operators are ignored (uncolored patterns, `d1` glyphs)
    pub(crate) color_locked: bool,
    pub(crate) marked_depth: usize,
    /// Page transform: default user space to output space
    pub(crate) base_ctm: Matrix,
    /// Output viewport
    pub(crate) viewport: Rectangle,
    pub(crate) depth: usize,
    /// Forms currently executing, to skip self references
    pub(crate) active_forms: Vec<SmolStr>,
    pub(crate) warned: FxHashSet<String>,
    pub(crate) cancel: CancellationToken,
}

impl PageInterpreter {
    /// Creates an interpreter for content drawn under `base_ctm` into an
    /// output viewport of `width` x `height`.
    pub fn new(
        base_ctm: Matrix,
        width: f64,
        height: f64,
        resources: Arc<dyn Resources>,
        options: ConvertOptions,
    ) -> Self {
        let state = InterpreterState::new(GraphicsState::new(base_ctm), resources, &options);
        Self {
            clips: ClipArena::new(options.precision),
            options,
            gstate: state.gstate,
            gstack: state.gstack,
            curpath: state.curpath,
            pending_clip: state.pending_clip,
            resources: state.resources,
            cache: None,
            defs: DefsPool::new(),
            content: state.content,
            open_clip: state.open_clip,
            text: state.text,
            text_clip: state.text_clip,
            in_text: state.in_text,
            text_style: state.text_style,
            color_locked: state.color_locked,
            marked_depth: state.marked_depth,
            base_ctm,
            viewport: Rectangle::new(0.0, 0.0, width, height),
            depth: 0,
            active_forms: Vec::new(),
            warned: FxHashSet::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_cache(mut self, cache: Arc<ResourceCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Current graphics state (read-only).
    pub fn gstate(&self) -> &GraphicsState {
        &self.gstate
    }

    /// Number of saved states on the q/Q stack.
    pub fn stack_depth(&self) -> usize {
        self.gstack.len()
    }

    /// Current path (read-only).
    pub fn current_path(&self) -> &Path {
        &self.curpath
    }

    pub fn clips(&self) -> &ClipArena {
        &self.clips
    }

    /// Nodes emitted so far into the current container.
    pub fn content(&self) -> &[Node] {
        &self.content
    }

    pub(crate) fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(FolioError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Logs a warning once per distinct message.
    pub(crate) fn warn_once(&mut self, message: String) {
        if self.warned.insert(message.clone()) {
            tracing::warn!("{}", message);
        }
    }

    /// Dispatches a single operation. Returns false when it was skipped.
    pub fn execute_operation(&mut self, op: &Operation) -> Result<bool> {
        let handled = OPERATORS.dispatch(self, &op.operator, &op.operands)?;
        if !handled {
            tracing::trace!(
                operator = %op.operator,
                operands = op.operands.len(),
                "skipped operator"
            );
        }
        Ok(handled)
    }

    /// Executes a top-level operator stream.
    ///
    /// On cancellation, nodes emitted before the signal stay in the tree.
    pub fn execute(&mut self, ops: &[Operation]) -> Result<()> {
        let result = self.execute_ops(ops);
        if result.is_ok() {
            // Unterminated text objects still produce their text.
            self.flush_text();
        }
        result
    }

    pub(crate) fn execute_ops(&mut self, ops: &[Operation]) -> Result<()> {
        for op in ops {
            self.check_cancelled()?;
            self.execute_operation(op)?;
        }
        Ok(())
    }

    /// Exchanges the per-stream context with `state`, returning the old one.
    fn exchange(&mut self, state: InterpreterState) -> InterpreterState {
        InterpreterState {
            gstate: std::mem::replace(&mut self.gstate, state.gstate),
            gstack: std::mem::replace(&mut self.gstack, state.gstack),
            curpath: std::mem::replace(&mut self.curpath, state.curpath),
            pending_clip: std::mem::replace(&mut self.pending_clip, state.pending_clip),
            resources: std::mem::replace(&mut self.resources, state.resources),
            content: std::mem::replace(&mut self.content, state.content),
            open_clip: std::mem::replace(&mut self.open_clip, state.open_clip),
            text: std::mem::replace(&mut self.text, state.text),
            text_clip: std::mem::replace(&mut self.text_clip, state.text_clip),
            in_text: std::mem::replace(&mut self.in_text, state.in_text),
            text_style: std::mem::replace(&mut self.text_style, state.text_style),
            color_locked: std::mem::replace(&mut self.color_locked, state.color_locked),
            marked_depth: std::mem::replace(&mut self.marked_depth, state.marked_depth),
        }
    }

    /// Runs nested content in a fresh context seeded with `gstate` and
    /// returns the nodes it produced.
    ///
    /// The outer context is restored whether the nested run succeeds or
    /// fails, so errors cannot leak inner state into sibling content.
    pub(crate) fn run_nested(
        &mut self,
        gstate: GraphicsState,
        resources: Arc<dyn Resources>,
        ops: &[Operation],
        color_locked: bool,
    ) -> Result<Vec<Node>> {
        self.check_cancelled()?;
        if self.depth >= self.options.max_nesting_depth {
            return Err(FolioError::NestingTooDeep(self.options.max_nesting_depth));
        }
        let mut inner = InterpreterState::new(gstate, resources, &self.options);
        inner.color_locked = color_locked;
        let outer = self.exchange(inner);
        self.depth += 1;
        tracing::debug!(depth = self.depth, ops = ops.len(), "enter nested content");

        let result = self.execute_ops(ops).map(|()| self.flush_text());

        self.depth -= 1;
        let inner = self.exchange(outer);
        tracing::debug!(depth = self.depth, nodes = inner.content.len(), "leave nested content");
        result.map(|()| inner.content)
    }

    /// Like [`Self::run_nested`], but nesting limits only skip the branch.
    pub(crate) fn run_nested_or_skip(
        &mut self,
        gstate: GraphicsState,
        resources: Arc<dyn Resources>,
        ops: &[Operation],
        color_locked: bool,
    ) -> Result<Option<Vec<Node>>> {
        match self.run_nested(gstate, resources, ops, color_locked) {
            Ok(nodes) => Ok(Some(nodes)),
            Err(FolioError::NestingTooDeep(max)) => {
                tracing::warn!(max, "nested content too deep, skipped");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Draws an annotation appearance stream.
    ///
    /// The appearance bounding box, transformed by the appearance matrix, is
    /// mapped onto the annotation rectangle.
    pub fn render_annotation(&mut self, annot: &Annotation) -> Result<()> {
        if annot.hidden {
            return Ok(());
        }
        let form = &annot.appearance;
        let Some(bbox) = form.bbox else {
            return Ok(());
        };
        let t = bbox.to_path().transform(&form.matrix);
        let Some(tb) = t.bounds() else {
            return Ok(());
        };
        if tb.width() == 0.0 || tb.height() == 0.0 {
            tracing::debug!("annotation appearance has an empty box");
            return Ok(());
        }
        let fit = Matrix::translation(-tb.x1, -tb.y1)
            .multiply(&Matrix::scaling(
                annot.rect.width() / tb.width(),
                annot.rect.height() / tb.height(),
            ))
            .multiply(&Matrix::translation(annot.rect.x1, annot.rect.y1));
        self.flush_text();
        let ctm = form.matrix.multiply(&fit).multiply(&self.base_ctm);
        let mut state = GraphicsState::new(ctm);
        state.clip = self.gstate.clip;
        if let Some(clip) = self.form_bbox_clip(state.clip, &bbox, &ctm) {
            state.clip = Some(clip);
        }
        let resources = form
            .resources
            .clone()
            .unwrap_or_else(|| self.resources.clone());
        if let Some(nodes) = self.run_nested_or_skip(state, resources, &form.content, false)? {
            for node in nodes {
                self.push_raw(node);
            }
        }
        Ok(())
    }

    /// Clip node for a form bounding box under `ctm`.
    pub(crate) fn form_bbox_clip(
        &mut self,
        parent: Option<ClipRef>,
        bbox: &Rectangle,
        ctm: &Matrix,
    ) -> Option<ClipRef> {
        let device = bbox.to_path().transform(ctm);
        // A box that contains the whole current clip does not clip anything.
        if let Some(b) = device.bounds()
            && let Some(p) = parent.and_then(|p| self.clips.unnested_rect(p))
            && b.contains(&p)
        {
            return None;
        }
        if let Some(b) = device.bounds()
            && parent.is_none()
            && Rectangle::from_path(&device).is_some()
            && b.contains(&self.viewport)
        {
            return None;
        }
        Some(self.clips.intersect(parent, &device, false))
    }

    /// Finishes the page: assembles definitions and content and runs the
    /// attribute optimizer.
    pub fn finish(mut self) -> Document {
        self.flush_text();
        let width = self.viewport.width();
        let height = self.viewport.height();
        let precision = self.options.precision;
        let fmt = |v: f64| crate::params::format_number(v, precision);

        let mut content = Node::new("g").attr("id", "content");
        content.children = std::mem::take(&mut self.content);
        if self.options.optimize_attributes {
            optimizer::optimize(&mut content, self.options.min_group_run);
        }
        let defs = self.defs.into_node(self.clips.to_nodes());

        let root = Node::new("svg")
            .attr("xmlns", "http://www.w3.org/2000/svg")
            .attr("width", fmt(width))
            .attr("height", fmt(height))
            .attr("viewBox", format!("0 0 {} {}", fmt(width), fmt(height)))
            .child(defs)
            .child(content);
        Document {
            width,
            height,
            root,
        }
    }
}
