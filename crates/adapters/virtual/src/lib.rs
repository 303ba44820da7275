//! # autotask-adapter-virtual
//!
//! Virtual in-memory document implementing the `Document` port, for tests,
//! demos, and embedding without a real page.
//!
//! ## Behavior
//!
//! | Operation | Effect |
//! |-----------|--------|
//! | `append` | inserts an element, broadcasts `NodesAdded` |
//! | `click` | records the click and runs a registered handler, if any |
//! | `remove*` | detaches the subtree, broadcasts `NodesRemoved` |
//! | `reload` | counts the navigation, broadcasts `Navigated` |
//! | `ready` | resolves once the simulated page load has finished |
//!
//! Selector matching is handled by a small CSS engine (see [`SelectorError`]
//! for the supported grammar). Node handles implement the selector
//! generator's `DomNode` view.
//!
//! ## Dependency rule
//!
//! Depends on `autotask-app` (port traits) and `autotask-domain` only.

mod css;
mod dom;

pub use css::SelectorError;
pub use dom::Element;

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{broadcast, watch};

use autotask_app::ports::Document;
use autotask_app::selector::DomNode;
use autotask_domain::error::AutoTaskError;
use autotask_domain::event::{DocumentEvent, DocumentEventKind};

use dom::{NodeId, Tree};

type ClickHandler = Arc<dyn Fn(&VirtualDocument) + Send + Sync>;

struct Inner {
    tree: Mutex<Tree>,
    handlers: Mutex<HashMap<NodeId, ClickHandler>>,
    clicks: Mutex<Vec<NodeId>>,
    scrolled: Mutex<Vec<NodeId>>,
    events: broadcast::Sender<DocumentEvent>,
    loaded: watch::Sender<bool>,
    reloads: AtomicUsize,
}

/// An in-memory document rooted at a `body` element.
///
/// Cloning is cheap and shares the underlying tree.
#[derive(Clone)]
pub struct VirtualDocument {
    inner: Arc<Inner>,
}

impl Default for VirtualDocument {
    fn default() -> Self {
        let (events, _) = broadcast::channel(256);
        let (loaded, _) = watch::channel(true);
        Self {
            inner: Arc::new(Inner {
                tree: Mutex::new(Tree::new()),
                handlers: Mutex::new(HashMap::new()),
                clicks: Mutex::new(Vec::new()),
                scrolled: Mutex::new(Vec::new()),
                events,
                loaded,
                reloads: AtomicUsize::new(0),
            }),
        }
    }
}

/// Handle to an element in a [`VirtualDocument`].
///
/// Stays valid after the node is removed; operations then see a dead node.
#[derive(Clone)]
pub struct NodeHandle {
    inner: Arc<Inner>,
    id: NodeId,
}

impl std::fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeHandle").field("id", &self.id).finish()
    }
}

impl PartialEq for NodeHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) && self.id == other.id
    }
}

impl Eq for NodeHandle {}

impl VirtualDocument {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn tree(&self) -> MutexGuard<'_, Tree> {
        self.inner.tree.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn handle(&self, id: NodeId) -> NodeHandle {
        NodeHandle {
            inner: Arc::clone(&self.inner),
            id,
        }
    }

    fn emit(&self, kind: DocumentEventKind) {
        // Send fails only without subscribers, which is fine.
        let _ = self.inner.events.send(DocumentEvent::new(kind));
    }

    /// The root `body` element.
    #[must_use]
    pub fn body(&self) -> NodeHandle {
        let id = self.tree().body();
        self.handle(id)
    }

    /// Insert `element` as the last child of `parent`.
    pub fn append(&self, parent: &NodeHandle, element: Element) -> NodeHandle {
        let id = self.tree().insert(parent.id, element);
        self.emit(DocumentEventKind::NodesAdded);
        self.handle(id)
    }

    /// Insert `element` directly under the body.
    pub fn append_to_body(&self, element: Element) -> NodeHandle {
        let body = self.body();
        self.append(&body, element)
    }

    /// Detach `node` and its subtree; no-op when already removed.
    pub fn remove_node(&self, node: &NodeHandle) -> bool {
        let removed = self.tree().detach(node.id);
        if removed {
            self.emit(DocumentEventKind::NodesRemoved);
        }
        removed
    }

    /// Run `handler` whenever `node` receives a click.
    ///
    /// The handler runs with no internal locks held, so it may freely
    /// mutate the document (append, remove, ...).
    pub fn on_click(&self, node: &NodeHandle, handler: impl Fn(&Self) + Send + Sync + 'static) {
        self.inner
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(node.id, Arc::new(handler));
    }

    /// All elements matching `selector`, in document order.
    ///
    /// # Errors
    ///
    /// Returns [`AutoTaskError::Document`] for a malformed selector.
    pub fn query(&self, selector: &str) -> Result<Vec<NodeHandle>, AutoTaskError> {
        Ok(self
            .select(selector)?
            .into_iter()
            .map(|id| self.handle(id))
            .collect())
    }

    /// Clicks recorded so far, oldest first.
    #[must_use]
    pub fn clicks(&self) -> Vec<NodeHandle> {
        self.inner
            .clicks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|&id| self.handle(id))
            .collect()
    }

    /// Elements scrolled into view so far, oldest first.
    #[must_use]
    pub fn scrolled(&self) -> Vec<NodeHandle> {
        self.inner
            .scrolled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|&id| self.handle(id))
            .collect()
    }

    /// How many reloads were triggered.
    #[must_use]
    pub fn reload_count(&self) -> usize {
        self.inner.reloads.load(Ordering::SeqCst)
    }

    /// Simulate a page that has not finished loading yet.
    pub fn mark_loading(&self) {
        let _ = self.inner.loaded.send(false);
    }

    /// Finish the simulated page load, releasing `ready()` waiters.
    pub fn mark_loaded(&self) {
        let _ = self.inner.loaded.send(true);
    }

    fn select(&self, selector: &str) -> Result<Vec<NodeId>, AutoTaskError> {
        let list = css::parse(selector).map_err(AutoTaskError::document)?;
        let tree = self.tree();
        Ok(list.select(&tree))
    }

    fn first_match(&self, selector: &str) -> Result<Option<NodeId>, AutoTaskError> {
        Ok(self.select(selector)?.first().copied())
    }
}

impl Document for VirtualDocument {
    async fn query_count(&self, selector: &str) -> Result<usize, AutoTaskError> {
        Ok(self.select(selector)?.len())
    }

    async fn scroll_into_view(&self, selector: &str) -> Result<(), AutoTaskError> {
        if let Some(target) = self.first_match(selector)? {
            self.inner
                .scrolled
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(target);
        }
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<(), AutoTaskError> {
        let Some(target) = self.first_match(selector)? else {
            return Ok(());
        };
        self.inner
            .clicks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(target);
        let handler = self
            .inner
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&target)
            .cloned();
        if let Some(handler) = handler {
            handler(self);
        }
        Ok(())
    }

    async fn remove(&self, selector: &str) -> Result<(), AutoTaskError> {
        if let Some(target) = self.first_match(selector)? {
            let removed = self.tree().detach(target);
            if removed {
                self.emit(DocumentEventKind::NodesRemoved);
            }
        }
        Ok(())
    }

    async fn remove_closest(&self, selector: &str, ancestor: &str) -> Result<(), AutoTaskError> {
        let ancestors = css::parse(ancestor).map_err(AutoTaskError::document)?;
        let Some(target) = self.first_match(selector)? else {
            return Ok(());
        };

        let closest = {
            let tree = self.tree();
            let mut current = Some(target);
            let mut found = None;
            while let Some(node) = current {
                if ancestors.matches(&tree, node) {
                    found = Some(node);
                    break;
                }
                current = tree.parent(node);
            }
            found
        };

        if let Some(node) = closest {
            let removed = self.tree().detach(node);
            if removed {
                self.emit(DocumentEventKind::NodesRemoved);
            }
        }
        Ok(())
    }

    async fn remove_all(&self, selector: &str) -> Result<usize, AutoTaskError> {
        let targets = self.select(selector)?;
        let mut removed = 0;
        {
            let mut tree = self.tree();
            for target in targets {
                if tree.detach(target) {
                    removed += 1;
                }
            }
        }
        if removed > 0 {
            self.emit(DocumentEventKind::NodesRemoved);
        }
        Ok(removed)
    }

    fn subscribe(&self) -> broadcast::Receiver<DocumentEvent> {
        self.inner.events.subscribe()
    }

    fn ready(&self) -> impl Future<Output = ()> + Send {
        let mut loaded = self.inner.loaded.subscribe();
        async move {
            let _ = loaded.wait_for(|loaded| *loaded).await;
        }
    }

    async fn reload(&self) -> Result<(), AutoTaskError> {
        self.inner.reloads.fetch_add(1, Ordering::SeqCst);
        self.emit(DocumentEventKind::Navigated);
        Ok(())
    }
}

impl DomNode for NodeHandle {
    fn tag(&self) -> String {
        let tree = self.inner.tree.lock().unwrap_or_else(PoisonError::into_inner);
        tree.node(self.id).tag.clone()
    }

    fn id_attr(&self) -> Option<String> {
        let tree = self.inner.tree.lock().unwrap_or_else(PoisonError::into_inner);
        tree.node(self.id).id_attr.clone()
    }

    fn parent(&self) -> Option<Self> {
        let parent = {
            let tree = self.inner.tree.lock().unwrap_or_else(PoisonError::into_inner);
            tree.parent(self.id)
        };
        parent.map(|id| Self {
            inner: Arc::clone(&self.inner),
            id,
        })
    }

    fn nth_of_type(&self) -> usize {
        let tree = self.inner.tree.lock().unwrap_or_else(PoisonError::into_inner);
        tree.nth_of_type(self.id)
    }
}
