//! In-memory scroll document
//!
//! A minimal stand-in for a laid-out UI tree: one document viewport plus any
//! number of fixed scroll containers, each holding vertically stacked elements
//! registered by string id. Elements are addressed through [`ElementHandle`]s
//! that measure themselves against the live document, so a handle resolved
//! once keeps reporting up-to-date client rectangles as its container scrolls.
//!
//! Scroll listeners are plain `Rc` callbacks. They are cloned out of the
//! document before being invoked, so a listener may freely read or mutate the
//! document it was notified by.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};

use spyglass_core::{Rect, RootSelector, RootSnapshot, TargetGeometry};
use spyglass_runtime::{ScrollCallback, ScrollEventSource, SpyEnvironment};

new_key_type! {
    /// Key of an element node
    pub struct NodeId;
    /// Key of a registered scroll listener
    pub struct ListenerId;
}

#[derive(Debug, Clone)]
struct Node {
    id: String,
    root: RootSelector,
    /// Top edge in the container's content coordinates
    y: f32,
    height: f32,
}

struct ScrollContainer {
    /// Position in client coordinates
    rect: Rect,
    scroll_offset: f32,
    /// Bottom of the lowest child, in content coordinates
    content_height: f32,
    listeners: SlotMap<ListenerId, ScrollCallback>,
}

impl ScrollContainer {
    fn new(rect: Rect) -> Self {
        Self {
            rect,
            scroll_offset: 0.0,
            content_height: 0.0,
            listeners: SlotMap::with_key(),
        }
    }

    fn scroll_height(&self) -> f32 {
        self.content_height.max(self.rect.height)
    }

    fn max_scroll(&self) -> f32 {
        (self.scroll_height() - self.rect.height).max(0.0)
    }

    fn snapshot(&self) -> RootSnapshot {
        RootSnapshot {
            scroll_offset: self.scroll_offset,
            viewport_height: self.rect.height,
            scroll_height: self.scroll_height(),
            rect: self.rect,
        }
    }
}

#[derive(Default)]
struct DocumentInner {
    containers: FxHashMap<RootSelector, ScrollContainer>,
    nodes: SlotMap<NodeId, Node>,
    ids: FxHashMap<String, NodeId>,
}

impl DocumentInner {
    /// Drop a node, handing its id to a remaining duplicate if there is one
    fn remove_node(&mut self, key: NodeId) -> bool {
        let Some(node) = self.nodes.remove(key) else {
            return false;
        };
        if self.ids.get(&node.id) == Some(&key) {
            let fallback = self
                .nodes
                .iter()
                .filter(|(_, other)| other.id == node.id)
                .map(|(other, _)| other)
                .last();
            match fallback {
                Some(other) => {
                    self.ids.insert(node.id, other);
                }
                None => {
                    self.ids.remove(&node.id);
                }
            }
        }
        true
    }

    fn client_rect(&self, node: NodeId) -> Option<Rect> {
        let node = self.nodes.get(node)?;
        let container = self.containers.get(&node.root)?;
        Some(Rect::new(
            container.rect.x,
            container.rect.y + node.y - container.scroll_offset,
            container.rect.width,
            node.height,
        ))
    }
}

/// Shared handle to an in-memory document
///
/// Cloning is cheap and every clone refers to the same document.
#[derive(Clone)]
pub struct Document {
    inner: Rc<RefCell<DocumentInner>>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Document")
            .field("containers", &inner.containers.len())
            .field("elements", &inner.nodes.len())
            .finish()
    }
}

impl Document {
    /// Create a document whose viewport is `width` x `height`
    pub fn new(width: f32, height: f32) -> Self {
        let mut inner = DocumentInner::default();
        inner.containers.insert(
            RootSelector::Document,
            ScrollContainer::new(Rect::new(0.0, 0.0, width, height)),
        );
        Self {
            inner: Rc::new(RefCell::new(inner)),
        }
    }

    /// Add a scroll container pinned at `rect` (client coordinates)
    ///
    /// Re-adding an existing id replaces its geometry and keeps its children.
    pub fn add_container(&self, id: impl Into<String>, rect: Rect) -> RootSelector {
        let root = RootSelector::Element(id.into());
        self.inner
            .borrow_mut()
            .containers
            .entry(root.clone())
            .and_modify(|container| container.rect = rect)
            .or_insert_with(|| ScrollContainer::new(rect));
        root
    }

    /// Remove a scroll container together with its elements
    pub fn remove_container(&self, root: &RootSelector) -> bool {
        if *root == RootSelector::Document {
            return false;
        }

        let mut inner = self.inner.borrow_mut();
        if inner.containers.remove(root).is_none() {
            return false;
        }
        let orphans: Vec<NodeId> = inner
            .nodes
            .iter()
            .filter(|(_, node)| node.root == *root)
            .map(|(key, _)| key)
            .collect();
        for key in orphans {
            inner.remove_node(key);
        }
        true
    }

    pub fn has_container(&self, root: &RootSelector) -> bool {
        self.inner.borrow().containers.contains_key(root)
    }

    /// Append an element below the current content of `root`
    pub fn append(&self, root: &RootSelector, id: impl Into<String>, height: f32) -> Option<NodeId> {
        let y = self.inner.borrow().containers.get(root)?.content_height;
        self.insert(root, id, y, height)
    }

    /// Place an element at content position `y` in `root`
    ///
    /// If the id already exists, the new element takes it over (last wins).
    pub fn insert(
        &self,
        root: &RootSelector,
        id: impl Into<String>,
        y: f32,
        height: f32,
    ) -> Option<NodeId> {
        let id = id.into();
        let mut inner = self.inner.borrow_mut();
        let container = inner.containers.get_mut(root)?;
        container.content_height = container.content_height.max(y + height);

        if inner.ids.contains_key(&id) {
            tracing::warn!("Duplicate element ID registered: {}", id);
        }

        let key = inner.nodes.insert(Node {
            id: id.clone(),
            root: root.clone(),
            y,
            height,
        });
        inner.ids.insert(id, key);
        Some(key)
    }

    /// Remove an element; handles to it become disconnected
    ///
    /// Another element registered under the same id takes the id over.
    pub fn remove(&self, id: &str) -> bool {
        let mut inner = self.inner.borrow_mut();
        let Some(key) = inner.ids.get(id).copied() else {
            return false;
        };
        inner.remove_node(key)
    }

    /// Look up an element by id
    pub fn element(&self, id: &str) -> Option<ElementHandle> {
        let node = *self.inner.borrow().ids.get(id)?;
        Some(ElementHandle {
            document: Rc::downgrade(&self.inner),
            node,
        })
    }

    /// Current scroll offset of `root`
    pub fn scroll_offset(&self, root: &RootSelector) -> Option<f32> {
        self.inner
            .borrow()
            .containers
            .get(root)
            .map(|container| container.scroll_offset)
    }

    /// Scroll `root` to `offset`, clamped to its scrollable range
    ///
    /// Listeners are notified only when the offset actually changes.
    pub fn scroll_to(&self, root: &RootSelector, offset: f32) -> Option<f32> {
        let (clamped, listeners) = {
            let mut inner = self.inner.borrow_mut();
            let container = inner.containers.get_mut(root)?;
            let clamped = offset.clamp(0.0, container.max_scroll());
            if clamped == container.scroll_offset {
                return Some(clamped);
            }
            container.scroll_offset = clamped;
            let listeners: Vec<ScrollCallback> = container.listeners.values().cloned().collect();
            (clamped, listeners)
        };

        tracing::trace!(root = %root, offset = clamped, "scrolled");
        for listener in listeners {
            listener();
        }
        Some(clamped)
    }

    /// Scroll `root` by `dy`
    pub fn scroll_by(&self, root: &RootSelector, dy: f32) -> Option<f32> {
        let current = self.scroll_offset(root)?;
        self.scroll_to(root, current + dy)
    }

    /// Scroll `root` so that element `id` sits at the top of the window
    pub fn scroll_into_view(&self, id: &str) -> Option<f32> {
        let (root, y) = {
            let inner = self.inner.borrow();
            let node = inner.nodes.get(*inner.ids.get(id)?)?;
            (node.root.clone(), node.y)
        };
        self.scroll_to(&root, y)
    }

    /// Register a scroll listener on `root`
    pub fn on_scroll(&self, root: &RootSelector, listener: ScrollCallback) -> Option<ListenerId> {
        let mut inner = self.inner.borrow_mut();
        let container = inner.containers.get_mut(root)?;
        Some(container.listeners.insert(listener))
    }

    /// Remove a scroll listener from `root`
    pub fn remove_scroll_listener(&self, root: &RootSelector, listener: ListenerId) -> bool {
        let mut inner = self.inner.borrow_mut();
        inner
            .containers
            .get_mut(root)
            .is_some_and(|container| container.listeners.remove(listener).is_some())
    }

    /// Number of scroll listeners on `root`
    pub fn listener_count(&self, root: &RootSelector) -> usize {
        self.inner
            .borrow()
            .containers
            .get(root)
            .map_or(0, |container| container.listeners.len())
    }

    /// Measure `root`
    pub fn snapshot(&self, root: &RootSelector) -> Option<RootSnapshot> {
        self.inner
            .borrow()
            .containers
            .get(root)
            .map(ScrollContainer::snapshot)
    }
}

impl SpyEnvironment for Document {
    type Target = ElementHandle;

    fn resolve_target(&self, id: &str) -> Option<ElementHandle> {
        self.element(id)
    }

    fn root_snapshot(&self, root: &RootSelector) -> Option<RootSnapshot> {
        self.snapshot(root)
    }
}

impl ScrollEventSource for Document {
    type Subscription = ListenerId;

    fn subscribe(&self, root: &RootSelector, callback: ScrollCallback) -> Option<ListenerId> {
        self.on_scroll(root, callback)
    }

    fn unsubscribe(&self, root: &RootSelector, subscription: ListenerId) {
        self.remove_scroll_listener(root, subscription);
    }
}

/// Live reference to an element of a [`Document`]
///
/// Holds the document weakly; once the document is dropped or the element
/// removed, the handle reports itself disconnected.
#[derive(Clone)]
pub struct ElementHandle {
    document: Weak<RefCell<DocumentInner>>,
    node: NodeId,
}

impl std::fmt::Debug for ElementHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementHandle")
            .field("id", &self.id())
            .field("node", &self.node)
            .finish()
    }
}

impl ElementHandle {
    pub fn node_id(&self) -> NodeId {
        self.node
    }

    /// Element id, `None` once disconnected
    pub fn id(&self) -> Option<String> {
        let document = self.document.upgrade()?;
        let inner = document.borrow();
        inner.nodes.get(self.node).map(|node| node.id.clone())
    }

    fn with_inner<R>(&self, f: impl FnOnce(&DocumentInner) -> Option<R>) -> Option<R> {
        let document = self.document.upgrade()?;
        let inner = document.borrow();
        f(&inner)
    }
}

impl TargetGeometry for ElementHandle {
    fn bounding_rect(&self) -> Rect {
        self.with_inner(|inner| inner.client_rect(self.node))
            .unwrap_or_default()
    }

    fn offset_height(&self) -> f32 {
        self.with_inner(|inner| inner.nodes.get(self.node).map(|node| node.height))
            .unwrap_or(0.0)
    }

    fn is_connected(&self) -> bool {
        self.with_inner(|inner| inner.nodes.get(self.node).map(|_| ()))
            .is_some()
    }
}
