//! The scene engine: one owner for the document, the element forest, the
//! opaque defs, selection, undo history, milestones, and the symbol library.
//!
//! Every mutation goes through [`Engine`]. Recorded mutations push a deep
//! snapshot of the prior scene first; silent ones (`MutateOptions::SILENT`)
//! skip it so high-frequency gestures can commit once at gesture start and
//! stream updates after. Bound connector endpoints are re-seated inside the
//! same mutation that moved their target.
//!
//! Expected failures (malformed markup, unknown ids) are logged and reported
//! through `bool` / `Option` returns; the scene is left untouched.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::doc::{DocPatch, Document, Element, ElementId, ElementPatch, ElementStore, fresh_id};
use crate::geometry::{Bounds, Estimate, Measure, Point, anchor_points, element_bounds};
use crate::hit::{self, SnapTarget};
use crate::history::{EditorSnapshot, HistoryEntry, ImportMeta, ImportRecord, Milestones, UndoStack};
use crate::parse::parse_svg;
use crate::refs::{SymbolLibrary, follow_subtree, lines_bound_to, remap_refs, subtree_anchors};
use crate::serialize::{SerializeOptions, build_svg_markup};
use crate::transform::Affine;

/// Whether a mutation pushes an undo snapshot first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutateOptions {
    pub record: bool,
}

impl MutateOptions {
    pub const RECORD: Self = Self { record: true };
    pub const SILENT: Self = Self { record: false };
}

impl Default for MutateOptions {
    fn default() -> Self {
        Self::RECORD
    }
}

/// Switches for [`Engine::load_svg_markup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Append a milestone for the loaded scene.
    pub save_history: bool,
    /// Do not push an undo snapshot of the prior scene.
    pub skip_snapshot: bool,
    /// Append an import record with this identity.
    pub record_meta: Option<ImportMeta>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self { save_history: true, skip_snapshot: false, record_meta: None }
    }
}

pub struct Engine {
    pub(crate) config: EngineConfig,
    pub(crate) doc: Document,
    pub(crate) elements: ElementStore,
    pub(crate) defs: Option<String>,
    selected_id: Option<ElementId>,
    selected_ids: Vec<ElementId>,
    undo: UndoStack,
    milestones: Milestones,
    import_records: Vec<ImportRecord>,
    symbols: SymbolLibrary,
    measure: Box<dyn Measure>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::with_config(EngineConfig::default())
    }
}

impl Engine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            doc: Document::new(config.canvas_width, config.canvas_height),
            elements: ElementStore::new(),
            defs: None,
            selected_id: None,
            selected_ids: Vec::new(),
            undo: UndoStack::new(config.history_limit),
            milestones: Milestones::new(config.milestone_limit),
            import_records: Vec::new(),
            symbols: SymbolLibrary::new(),
            measure: Box::new(Estimate),
            config,
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn doc(&self) -> &Document {
        &self.doc
    }

    #[must_use]
    pub fn elements(&self) -> &ElementStore {
        &self.elements
    }

    #[must_use]
    pub fn defs(&self) -> Option<&str> {
        self.defs.as_deref()
    }

    /// Look up an element anywhere in the forest.
    #[must_use]
    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.get(id)
    }

    // --- Selection ---

    /// The focused element, if any.
    #[must_use]
    pub fn selected_id(&self) -> Option<&str> {
        self.selected_id.as_deref()
    }

    /// The multi-selection, in selection order.
    #[must_use]
    pub fn selected_ids(&self) -> &[ElementId] {
        &self.selected_ids
    }

    /// Focus one element, or clear focus with `None`.
    pub fn select(&mut self, id: Option<&str>) {
        self.selected_id = id.map(str::to_owned);
    }

    /// Replace the multi-selection. Duplicates are dropped.
    pub fn set_selected_ids(&mut self, ids: impl IntoIterator<Item = ElementId>) {
        self.selected_ids.clear();
        for id in ids {
            if !self.selected_ids.contains(&id) {
                self.selected_ids.push(id);
            }
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected_id = None;
        self.selected_ids.clear();
    }

    // --- Mutations ---

    /// Append an element at the top level and focus it. An empty or
    /// already-used id is replaced with a fresh one. Returns the final id.
    pub fn add_element(&mut self, mut el: Element) -> ElementId {
        self.commit_snapshot();
        if el.id.is_empty() || self.elements.contains(&el.id) {
            el.id = fresh_id();
        }
        let id = el.id.clone();
        self.elements.push(el);
        self.selected_id = Some(id.clone());
        id
    }

    /// Apply a sparse patch. Returns `false` when `id` is unknown.
    pub fn update_element(&mut self, id: &str, patch: &ElementPatch, opts: MutateOptions) -> bool {
        self.update_element_with(id, |el| patch.apply(el), opts)
    }

    /// Mutate an element in place through `f`. The id is kept stable and
    /// lines bound to the element or its descendants follow their anchors.
    /// Returns `false` when `id` is unknown.
    pub fn update_element_with(&mut self, id: &str, f: impl FnOnce(&mut Element), opts: MutateOptions) -> bool {
        if !self.elements.contains(id) {
            debug!(%id, "update of unknown element ignored");
            return false;
        }
        if opts.record {
            self.commit_snapshot();
        }
        let outer = self.parent_placement(id);
        let Some(el) = self.elements.get_mut(id) else {
            return false;
        };
        let before = subtree_anchors(el, self.measure.as_ref(), outer);
        f(el);
        el.id = id.to_owned();
        let after = subtree_anchors(el, self.measure.as_ref(), outer);
        follow_subtree(&mut self.elements, id, &before, &after);
        true
    }

    /// Translate an element by `(dx, dy)` in its parent's space.
    pub fn move_element(&mut self, id: &str, dx: f64, dy: f64, opts: MutateOptions) -> bool {
        self.update_element_with(id, |el| el.translate(dx, dy), opts)
    }

    /// Remove an element and its subtree. Focus and multi-selection drop
    /// every removed id. Lines bound to it keep their now-dangling reference.
    pub fn remove_element(&mut self, id: &str) -> bool {
        if !self.elements.contains(id) {
            return false;
        }
        self.commit_snapshot();
        let Some(removed) = self.elements.remove(id) else {
            return false;
        };
        let mut gone = HashSet::new();
        removed.walk(&mut |el| {
            gone.insert(el.id.clone());
        });
        if self.selected_id.as_ref().is_some_and(|s| gone.contains(s)) {
            self.selected_id = None;
        }
        self.selected_ids.retain(|s| !gone.contains(s));
        let dangling = lines_bound_to(&self.elements, id).len();
        if dangling > 0 {
            debug!(%id, dangling, "removed element still referenced by connectors");
        }
        true
    }

    /// Remove every listed element in one recorded step and clear the
    /// selection. Returns how many were removed.
    pub fn remove_many(&mut self, ids: &[ElementId]) -> usize {
        if !ids.iter().any(|id| self.elements.contains(id)) {
            return 0;
        }
        self.commit_snapshot();
        let mut removed = 0;
        for id in ids {
            if self.elements.remove(id).is_some() {
                removed += 1;
            }
        }
        self.clear_selection();
        removed
    }

    /// Copy an element next to the original. The copy gets fresh ids
    /// throughout, is offset by the duplicate offset, and becomes the
    /// selection.
    pub fn duplicate_element(&mut self, id: &str) -> Option<ElementId> {
        self.duplicate_many(&[id.to_owned()]).into_iter().next()
    }

    /// Duplicate several elements in one recorded step. Lines copied along
    /// with their targets are rebound to the copies. The copies become the
    /// multi-selection; focus moves only when there is a single copy.
    /// Returns the new ids.
    pub fn duplicate_many(&mut self, ids: &[ElementId]) -> Vec<ElementId> {
        let originals: Vec<Element> = ids.iter().filter_map(|id| self.elements.get(id)).cloned().collect();
        if originals.is_empty() {
            return Vec::new();
        }
        self.commit_snapshot();

        let mut id_map = HashMap::new();
        let copies: Vec<(ElementId, Element)> = originals
            .into_iter()
            .map(|mut el| {
                let source = el.id.clone();
                el.walk_mut(&mut |node| {
                    let fresh = fresh_id();
                    id_map.insert(std::mem::replace(&mut node.id, fresh.clone()), fresh);
                });
                (source, el)
            })
            .collect();

        let offset = self.config.duplicate_offset;
        let mut created = Vec::with_capacity(copies.len());
        for (source, mut copy) in copies {
            remap_refs(&mut copy, &id_map);
            copy.translate(offset, offset);
            created.push(copy.id.clone());
            match self.elements.container_of_mut(&source) {
                Some(container) => container.push(copy),
                None => self.elements.push(copy),
            }
        }

        self.selected_id = match created.as_slice() {
            [only] => Some(only.clone()),
            _ => None,
        };
        self.set_selected_ids(created.clone());
        debug!(count = created.len(), "duplicated elements");
        created
    }

    /// Patch the document. The viewBox follows a resize while it still
    /// matches the old canvas size.
    pub fn update_doc(&mut self, patch: &DocPatch) {
        self.commit_snapshot();
        self.doc.apply_patch(patch);
    }

    /// Reset to an empty scene on the configured canvas. Undo history and
    /// milestones are dropped too.
    pub fn clear(&mut self) {
        self.doc = Document::new(self.config.canvas_width, self.config.canvas_height);
        self.elements = ElementStore::new();
        self.defs = None;
        self.clear_selection();
        self.milestones.clear();
        self.undo.clear();
        info!("scene cleared");
    }

    // --- Load / export ---

    /// Replace the scene with parsed markup. Malformed input is logged and
    /// leaves the scene and its history untouched. Returns `true` on success.
    pub fn load_svg_markup(&mut self, svg: &str, opts: &LoadOptions) -> bool {
        let parsed = match parse_svg(svg) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(error = %err, "svg markup rejected");
                return false;
            }
        };
        if !opts.skip_snapshot {
            self.commit_snapshot();
        }
        self.doc = parsed.doc;
        self.elements = ElementStore::from(parsed.elements);
        self.defs = parsed.defs;
        self.clear_selection();

        if opts.save_history {
            let svg = self.export_svg_markup_with(SerializeOptions { include_hidden: true });
            self.milestones.push(HistoryEntry::capture(svg));
        }
        if let Some(meta) = &opts.record_meta {
            self.import_records.push(meta.record(&self.doc, &self.elements));
        }
        info!(
            elements = self.elements.total_len(),
            paths = self.elements.path_count(),
            width = self.doc.width,
            height = self.doc.height,
            "svg markup loaded"
        );
        true
    }

    /// A self-contained `<svg>` document of the visible scene.
    #[must_use]
    pub fn export_svg_markup(&self) -> String {
        self.export_svg_markup_with(SerializeOptions::default())
    }

    #[must_use]
    pub fn export_svg_markup_with(&self, opts: SerializeOptions) -> String {
        build_svg_markup(&self.doc, self.elements.as_slice(), self.defs.as_deref(), opts)
    }

    // --- Undo / redo ---

    fn snapshot(&self) -> EditorSnapshot {
        EditorSnapshot { doc: self.doc.clone(), elements: self.elements.clone(), defs: self.defs.clone() }
    }

    fn restore(&mut self, snapshot: EditorSnapshot) {
        self.doc = snapshot.doc;
        self.elements = snapshot.elements;
        self.defs = snapshot.defs;
        self.clear_selection();
    }

    /// Push a snapshot of the current scene and clear the redo stack.
    pub fn commit_snapshot(&mut self) {
        self.undo.push(self.snapshot());
        debug!(depth = self.undo.past_len(), "snapshot committed");
    }

    /// Step back one recorded mutation. Returns `false` when there is none.
    pub fn undo(&mut self) -> bool {
        let current = self.snapshot();
        let Some(prev) = self.undo.undo(current) else {
            return false;
        };
        self.restore(prev);
        debug!(past = self.undo.past_len(), future = self.undo.future_len(), "undo");
        true
    }

    /// Re-apply one undone mutation. Returns `false` when there is none.
    pub fn redo(&mut self) -> bool {
        let current = self.snapshot();
        let Some(next) = self.undo.redo(current) else {
            return false;
        };
        self.restore(next);
        debug!(past = self.undo.past_len(), future = self.undo.future_len(), "redo");
        true
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.undo.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.undo.can_redo()
    }

    // --- Milestones ---

    #[must_use]
    pub fn history(&self) -> Vec<&HistoryEntry> {
        self.milestones.entries()
    }

    #[must_use]
    pub fn active_history_index(&self) -> Option<usize> {
        self.milestones.active()
    }

    /// Replace the scene with milestone `index`. This bypasses undo/redo:
    /// no snapshot is pushed and the stacks are left as they are.
    pub fn restore_history_at(&mut self, index: usize) -> bool {
        let Some(entry) = self.milestones.get(index) else {
            return false;
        };
        let parsed = match parse_svg(&entry.svg) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(index, error = %err, "milestone could not be restored");
                return false;
            }
        };
        self.doc = parsed.doc;
        self.elements = ElementStore::from(parsed.elements);
        self.defs = parsed.defs;
        self.clear_selection();
        self.milestones.set_active(index);
        info!(index, elements = self.elements.total_len(), "milestone restored");
        true
    }

    // --- Import diagnostics ---

    pub fn add_import_record(&mut self, record: ImportRecord) {
        self.import_records.push(record);
    }

    #[must_use]
    pub fn import_records(&self) -> &[ImportRecord] {
        &self.import_records
    }

    // --- Symbols ---

    /// Register an element as the target of `<use href="#id">`.
    pub fn register_symbol(&mut self, id: impl Into<String>, el: Element) {
        self.symbols.register(id, el);
    }

    /// Resolve a `use` reference. `None` on a miss.
    #[must_use]
    pub fn resolve_use_reference(&self, href: &str) -> Option<&Element> {
        self.symbols.resolve(href)
    }

    // --- Geometry ---

    /// Install a measuring surface for exact bounds.
    pub fn set_measure(&mut self, measure: Box<dyn Measure>) {
        self.measure = measure;
    }

    #[must_use]
    pub fn measure(&self) -> &dyn Measure {
        self.measure.as_ref()
    }

    /// Bounds of `id` in its parent's space.
    #[must_use]
    pub fn bounds(&self, id: &str) -> Option<Bounds> {
        self.elements.get(id).and_then(|el| element_bounds(el, self.measure.as_ref()))
    }

    /// Connector anchors of `id`; empty for lines and unknown ids.
    #[must_use]
    pub fn anchor_points(&self, id: &str) -> Vec<Point> {
        self.elements.get(id).map_or_else(Vec::new, |el| anchor_points(el, self.measure.as_ref()))
    }

    /// Composed matrix from `id`'s local space to the canvas, including every
    /// ancestor group's transform.
    #[must_use]
    pub fn effective_transform(&self, id: &str) -> Option<Affine> {
        let el = self.elements.get(id)?;
        let chain = self.elements.ancestors(id)?;
        let outer = chain
            .iter()
            .filter_map(|a| a.transform)
            .fold(Affine::IDENTITY, |m, t| m.then(t.to_affine()));
        Some(el.transform.map_or(outer, |t| outer.then(t.to_affine())))
    }

    /// Lines with an endpoint bound to `id`, anywhere in the tree.
    #[must_use]
    pub fn lines_bound_to(&self, id: &str) -> Vec<ElementId> {
        lines_bound_to(&self.elements, id)
    }

    /// Scale-and-translate placement of the space holding `id`, built from
    /// its ancestors the way bounds and anchors are. Identity at top level.
    fn parent_placement(&self, id: &str) -> Affine {
        self.elements.ancestors(id).map_or(Affine::IDENTITY, |chain| {
            chain
                .iter()
                .filter_map(|a| a.transform)
                .fold(Affine::IDENTITY, |m, t| m.then(t.to_placement()))
        })
    }

    // --- Hit queries ---

    /// Nearest anchor within the configured snap radius.
    #[must_use]
    pub fn find_snap_anchor(&self, p: Point, exclude: Option<&str>) -> Option<SnapTarget> {
        hit::find_snap_anchor(&self.elements, self.measure.as_ref(), p, self.config.snap_radius, exclude)
    }

    /// Topmost visible element under `p`.
    #[must_use]
    pub fn element_at(&self, p: Point) -> Option<ElementId> {
        hit::element_at(&self.elements, self.measure.as_ref(), p)
    }

    /// Marquee select: replaces the multi-selection with every hit and
    /// focuses the hit only when there is exactly one.
    pub fn select_in_rect(&mut self, rect: &Bounds) -> Vec<ElementId> {
        let hits = hit::select_in_rect(&self.elements, self.measure.as_ref(), rect);
        self.selected_id = if hits.len() == 1 { hits.first().cloned() } else { None };
        self.set_selected_ids(hits.clone());
        hits
    }

    /// Union of the multi-selection's bounds.
    #[must_use]
    pub fn selection_bounds(&self) -> Option<Bounds> {
        hit::selection_bounds(&self.elements, self.measure.as_ref(), &self.selected_ids)
    }
}
