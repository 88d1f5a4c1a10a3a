//! In-memory rendered document.
//!
//! A deterministic stand-in for a browser page. Geometry is given explicitly
//! per element and hit-testing follows nested stacking contexts:
//!
//! - an element with an explicit z-index (override or its own) opens a
//!   stacking context, and its whole subtree paints inside it
//! - within one context, siblings order by z-index (`auto` counts as 0),
//!   then by document order, later on top
//! - `pointer-events` inherits like CSS, and `none` elements are skipped
//!
//! Activation is modelled with shared [`Command`] callbacks, so a duplicate
//! created for remediation triggers exactly the same outcome as its original.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::trace;

use super::types::{
    BoundingBox, ElementRef, NodeId, OverlaySpec, PointerEvents, Position, Presentation,
    ViewportInfo,
};
use super::RenderedDocument;
use crate::error::DocumentError;

/// Activation callback shared between an element and its duplicates.
pub type Command = Arc<dyn Fn() + Send + Sync>;

/// Description of an element to append to a [`MemoryDocument`].
#[derive(Clone)]
pub struct ElementSpec {
    tag: String,
    dom_id: Option<String>,
    classes: Vec<String>,
    role: Option<String>,
    input_type: Option<String>,
    rect: BoundingBox,
    z_index: Option<i64>,
    position: Position,
    pointer_events: Option<PointerEvents>,
    text: String,
    command: Option<Command>,
}

impl ElementSpec {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            dom_id: None,
            classes: Vec::new(),
            role: None,
            input_type: None,
            rect: BoundingBox::default(),
            z_index: None,
            position: Position::Static,
            pointer_events: None,
            text: String::new(),
            command: None,
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.dom_id = Some(id.into());
        self
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn input_type(mut self, input_type: impl Into<String>) -> Self {
        self.input_type = Some(input_type.into());
        self
    }

    pub fn rect(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.rect = BoundingBox::new(x, y, width, height);
        self
    }

    pub fn z_index(mut self, z_index: i64) -> Self {
        self.z_index = Some(z_index);
        self
    }

    pub fn position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn pointer_events(mut self, pointer_events: PointerEvents) -> Self {
        self.pointer_events = Some(pointer_events);
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn on_activate(mut self, command: Command) -> Self {
        self.command = Some(command);
        self
    }
}

struct MemoryNode {
    element: ElementRef,
    children: Vec<NodeId>,
    rect: BoundingBox,
    z_index: Option<i64>,
    position: Position,
    pointer_events: Option<PointerEvents>,
    text: String,
    command: Option<Command>,
    presentation: Option<Presentation>,
    overlay: Option<OverlaySpec>,
}

impl MemoryNode {
    fn own_z_index(&self) -> Option<i64> {
        self.presentation
            .as_ref()
            .and_then(|p| p.z_index)
            .or(self.z_index)
    }

    fn own_pointer_events(&self) -> Option<PointerEvents> {
        self.presentation
            .as_ref()
            .and_then(|p| p.pointer_events)
            .or(self.pointer_events)
    }

    fn own_position(&self) -> Position {
        self.presentation
            .as_ref()
            .and_then(|p| p.position)
            .unwrap_or(self.position)
    }
}

struct Inner {
    nodes: HashMap<NodeId, MemoryNode>,
    roots: Vec<NodeId>,
    next_id: u64,
    viewport: ViewportInfo,
    detached: bool,
    /// Writes remaining before one injected failure.
    fail_write_in: Option<usize>,
}

impl Inner {
    fn check_attached(&self) -> Result<(), DocumentError> {
        if self.detached {
            Err(DocumentError::Detached)
        } else {
            Ok(())
        }
    }

    fn node(&self, id: NodeId) -> Result<&MemoryNode, DocumentError> {
        self.nodes.get(&id).ok_or(DocumentError::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut MemoryNode, DocumentError> {
        self.nodes.get_mut(&id).ok_or(DocumentError::NodeNotFound(id))
    }

    fn allocate(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Pre-order traversal from the roots.
    fn document_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.get(&id) {
                order.push(id);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        order
    }

    /// Paint order key of a node: one `(z-index, document index)` entry per
    /// enclosing stacking context, outermost first, then the node itself.
    /// Keys compare lexicographically, higher paints on top.
    fn stacking_key(&self, id: NodeId, order: &HashMap<NodeId, usize>) -> Vec<(i64, usize)> {
        let index = |n: NodeId| order.get(&n).copied().unwrap_or(0);
        let own = self.nodes.get(&id).and_then(MemoryNode::own_z_index);
        let mut key = vec![(own.unwrap_or(0), index(id))];

        let mut current = self.nodes.get(&id).and_then(|n| n.element.parent);
        while let Some(cur) = current {
            let Some(node) = self.nodes.get(&cur) else { break };
            if let Some(z) = node.own_z_index() {
                key.push((z, index(cur)));
            }
            current = node.element.parent;
        }
        key.reverse();
        key
    }

    fn effective_pointer_events(&self, id: NodeId) -> PointerEvents {
        let mut current = Some(id);
        while let Some(cur) = current {
            let Some(node) = self.nodes.get(&cur) else { break };
            if let Some(pe) = node.own_pointer_events() {
                return pe;
            }
            current = node.element.parent;
        }
        PointerEvents::Auto
    }

    fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(cur) = current {
            if cur == ancestor {
                return true;
            }
            current = self.nodes.get(&cur).and_then(|n| n.element.parent);
        }
        false
    }

    fn subtree(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.get(&id) {
                out.push(id);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    fn translate_subtree(&mut self, root: NodeId, dx: f64, dy: f64) {
        for id in self.subtree(root) {
            if let Some(node) = self.nodes.get_mut(&id) {
                node.rect = node.rect.translate(dx, dy);
            }
        }
    }

    /// Stack overlay children vertically and anchor the overlay to the
    /// top-right corner of the viewport.
    fn layout_overlay(&mut self, overlay_id: NodeId) {
        let Some(node) = self.nodes.get(&overlay_id) else { return };
        let Some(spec) = node.overlay.clone() else { return };
        let children = node.children.clone();

        let sizes: Vec<BoundingBox> = children
            .iter()
            .filter_map(|c| self.nodes.get(c).map(|n| n.rect))
            .collect();
        let content_width = sizes.iter().map(|r| r.width).fold(0.0, f64::max);
        let content_height: f64 = sizes.iter().map(|r| r.height).sum();

        let width = content_width + 2.0 * spec.gap;
        let height = content_height + spec.gap * (sizes.len() as f64 + 1.0);
        let x = self.viewport.width as f64 - spec.right - width;
        let y = spec.top;

        if let Some(node) = self.nodes.get_mut(&overlay_id) {
            node.rect = BoundingBox::new(x, y, width, height);
        }

        let mut cursor = y + spec.gap;
        for child in children {
            let Some(rect) = self.nodes.get(&child).map(|n| n.rect) else { continue };
            let target_x = x + spec.gap;
            self.translate_subtree(child, target_x - rect.x, cursor - rect.y);
            cursor += rect.height + spec.gap;
        }
    }

    fn consume_write(&mut self) -> Result<(), DocumentError> {
        match self.fail_write_in {
            Some(0) => {
                self.fail_write_in = None;
                Err(DocumentError::Backend("injected write failure".to_string()))
            }
            Some(n) => {
                self.fail_write_in = Some(n - 1);
                Ok(())
            }
            None => Ok(()),
        }
    }
}

/// Deterministic in-memory [`RenderedDocument`].
pub struct MemoryDocument {
    inner: Mutex<Inner>,
}

impl MemoryDocument {
    /// Create an empty document with the given viewport.
    pub fn new(viewport: ViewportInfo) -> Self {
        Self {
            inner: Mutex::new(Inner {
                nodes: HashMap::new(),
                roots: Vec::new(),
                next_id: 1,
                viewport,
                detached: false,
                fail_write_in: None,
            }),
        }
    }

    /// Append an element under `parent` (or at the top level).
    pub fn append(&self, parent: Option<NodeId>, spec: ElementSpec) -> Result<NodeId, DocumentError> {
        let mut inner = self.inner.lock();
        if let Some(parent) = parent {
            inner.node(parent)?;
        }

        let id = inner.allocate();
        let element = ElementRef {
            node: id,
            parent,
            tag: spec.tag,
            dom_id: spec.dom_id,
            classes: spec.classes,
            role: spec.role,
            input_type: spec.input_type,
        };
        inner.nodes.insert(
            id,
            MemoryNode {
                element,
                children: Vec::new(),
                rect: spec.rect,
                z_index: spec.z_index,
                position: spec.position,
                pointer_events: spec.pointer_events,
                text: spec.text,
                command: spec.command,
                presentation: None,
                overlay: None,
            },
        );
        match parent {
            Some(parent) => inner.node_mut(parent)?.children.push(id),
            None => inner.roots.push(id),
        }
        Ok(id)
    }

    /// Invalidate the handle; every later call fails with [`DocumentError::Detached`].
    pub fn detach(&self) {
        self.inner.lock().detached = true;
    }

    /// Make the override write after the next `successful_writes` writes fail once.
    pub fn fail_write_after(&self, successful_writes: usize) {
        self.inner.lock().fail_write_in = Some(successful_writes);
    }

    /// Snapshot of a node's role tags.
    pub fn element(&self, node: NodeId) -> Option<ElementRef> {
        self.inner.lock().nodes.get(&node).map(|n| n.element.clone())
    }

    /// Direct text of a node.
    pub fn text(&self, node: NodeId) -> Option<String> {
        self.inner.lock().nodes.get(&node).map(|n| n.text.clone())
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.inner
            .lock()
            .nodes
            .get(&node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// Activate a node: run the nearest command on it or its ancestors.
    ///
    /// Returns whether a command ran.
    pub fn activate(&self, node: NodeId) -> Result<bool, DocumentError> {
        let command = {
            let inner = self.inner.lock();
            inner.check_attached()?;
            inner.node(node)?;
            let mut current = Some(node);
            let mut found = None;
            while let Some(cur) = current {
                let Some(n) = inner.nodes.get(&cur) else { break };
                if let Some(ref cmd) = n.command {
                    found = Some(cmd.clone());
                    break;
                }
                current = n.element.parent;
            }
            found
        };

        match command {
            Some(cmd) => {
                cmd();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Click at a viewport point: activate the topmost element there.
    pub fn click_at(&self, x: f64, y: f64) -> Result<Option<NodeId>, DocumentError> {
        let target = self.stack_at(x, y)?.first().map(|e| e.node);
        if let Some(node) = target {
            self.activate(node)?;
        }
        Ok(target)
    }

    fn stack_at(&self, x: f64, y: f64) -> Result<Vec<ElementRef>, DocumentError> {
        let inner = self.inner.lock();
        inner.check_attached()?;

        let order = inner.document_order();
        let positions: HashMap<NodeId, usize> =
            order.iter().enumerate().map(|(index, id)| (*id, index)).collect();

        let mut hits: Vec<(Vec<(i64, usize)>, ElementRef)> = order
            .into_iter()
            .filter_map(|id| {
                let node = inner.nodes.get(&id)?;
                if node.rect.is_empty() || !node.rect.contains(x, y) {
                    return None;
                }
                if inner.effective_pointer_events(id) == PointerEvents::None {
                    return None;
                }
                Some((inner.stacking_key(id, &positions), node.element.clone()))
            })
            .collect();

        hits.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(hits.into_iter().map(|(_, element)| element).collect())
    }
}

#[async_trait]
impl RenderedDocument for MemoryDocument {
    async fn elements(&self) -> Result<Vec<ElementRef>, DocumentError> {
        let inner = self.inner.lock();
        inner.check_attached()?;
        Ok(inner
            .document_order()
            .into_iter()
            .filter_map(|id| inner.nodes.get(&id).map(|n| n.element.clone()))
            .collect())
    }

    async fn viewport(&self) -> Result<ViewportInfo, DocumentError> {
        let inner = self.inner.lock();
        inner.check_attached()?;
        Ok(inner.viewport.clone())
    }

    async fn bounding_box(&self, node: NodeId) -> Result<BoundingBox, DocumentError> {
        let inner = self.inner.lock();
        inner.check_attached()?;
        Ok(inner.node(node)?.rect)
    }

    async fn computed_style(&self, node: NodeId, property: &str) -> Result<String, DocumentError> {
        let inner = self.inner.lock();
        inner.check_attached()?;
        let n = inner.node(node)?;
        let value = match property {
            "z-index" => n
                .own_z_index()
                .map(|z| z.to_string())
                .unwrap_or_else(|| "auto".to_string()),
            "position" => n.own_position().as_css().to_string(),
            "pointer-events" => inner.effective_pointer_events(node).as_css().to_string(),
            _ => String::new(),
        };
        Ok(value)
    }

    async fn presentation_override(
        &self,
        node: NodeId,
    ) -> Result<Option<Presentation>, DocumentError> {
        let inner = self.inner.lock();
        inner.check_attached()?;
        Ok(inner.node(node)?.presentation.clone())
    }

    async fn set_presentation_override(
        &self,
        node: NodeId,
        presentation: Option<&Presentation>,
    ) -> Result<(), DocumentError> {
        let mut inner = self.inner.lock();
        inner.check_attached()?;
        inner.node(node)?;
        inner.consume_write()?;
        trace!("override {} -> {:?}", node, presentation);
        inner.node_mut(node)?.presentation = presentation.cloned();
        Ok(())
    }

    async fn hit_test(&self, x: f64, y: f64) -> Result<Vec<ElementRef>, DocumentError> {
        self.stack_at(x, y)
    }

    async fn contains(&self, ancestor: NodeId, node: NodeId) -> Result<bool, DocumentError> {
        let inner = self.inner.lock();
        inner.check_attached()?;
        inner.node(ancestor)?;
        inner.node(node)?;
        Ok(inner.is_ancestor(ancestor, node))
    }

    async fn create_overlay(&self, spec: &OverlaySpec) -> Result<ElementRef, DocumentError> {
        let mut inner = self.inner.lock();
        inner.check_attached()?;

        let id = inner.allocate();
        let element = ElementRef::new(id, "div").with_id(spec.panel_id.clone());
        inner.nodes.insert(
            id,
            MemoryNode {
                element: element.clone(),
                children: Vec::new(),
                rect: BoundingBox::default(),
                z_index: Some(spec.z_index),
                position: Position::Fixed,
                pointer_events: Some(spec.pointer_events),
                text: String::new(),
                command: None,
                presentation: None,
                overlay: Some(spec.clone()),
            },
        );
        inner.roots.push(id);
        inner.layout_overlay(id);
        Ok(element)
    }

    async fn duplicate_into(
        &self,
        original: NodeId,
        container: NodeId,
        presentation: &Presentation,
    ) -> Result<ElementRef, DocumentError> {
        let mut inner = self.inner.lock();
        inner.check_attached()?;
        inner.node(original)?;
        inner.node(container)?;

        let mut mapping: HashMap<NodeId, NodeId> = HashMap::new();
        let mut root_ref = None;
        for source_id in inner.subtree(original) {
            let new_id = inner.allocate();
            mapping.insert(source_id, new_id);

            let source = inner.node(source_id)?;
            let parent = if source_id == original {
                container
            } else {
                let source_parent = source.element.parent.ok_or(DocumentError::NodeNotFound(source_id))?;
                *mapping
                    .get(&source_parent)
                    .ok_or(DocumentError::NodeNotFound(source_parent))?
            };

            let mut element = source.element.clone();
            element.node = new_id;
            element.parent = Some(parent);
            element.dom_id = element.dom_id.map(|id| format!("{}--reachguard", id));

            let node = MemoryNode {
                element: element.clone(),
                children: Vec::new(),
                rect: source.rect,
                z_index: source.z_index,
                position: source.position,
                pointer_events: source.pointer_events,
                text: source.text.clone(),
                command: source.command.clone(),
                presentation: if source_id == original {
                    Some(presentation.clone())
                } else {
                    source.presentation.clone()
                },
                overlay: None,
            };
            inner.nodes.insert(new_id, node);
            inner.node_mut(parent)?.children.push(new_id);

            if source_id == original {
                root_ref = Some(element);
            }
        }

        inner.layout_overlay(container);
        root_ref.ok_or(DocumentError::NodeNotFound(original))
    }

    async fn remove(&self, node: NodeId) -> Result<(), DocumentError> {
        let mut inner = self.inner.lock();
        inner.check_attached()?;
        let parent = inner.node(node)?.element.parent;

        for id in inner.subtree(node) {
            inner.nodes.remove(&id);
        }
        match parent {
            Some(parent) => {
                if let Some(p) = inner.nodes.get_mut(&parent) {
                    p.children.retain(|c| *c != node);
                }
                inner.layout_overlay(parent);
            }
            None => inner.roots.retain(|r| *r != node),
        }
        Ok(())
    }

    async fn wait_for_render(&self, _timeout: Duration) -> Result<(), DocumentError> {
        self.inner.lock().check_attached()
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
