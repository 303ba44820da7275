//! In-memory port doubles shared by the unit tests in this crate.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{broadcast, watch};

use autotask_domain::config::Config;
use autotask_domain::error::AutoTaskError;
use autotask_domain::event::{DocumentEvent, DocumentEventKind};

use crate::ports::{ConfigStore, Document};

/// Selector-keyed fake document: tests control exactly which selectors
/// match and observe every action the core performs.
pub struct FakeDocument {
    counts: Mutex<HashMap<String, usize>>,
    bad_selectors: Mutex<HashSet<String>>,
    clicks: Mutex<Vec<String>>,
    scrolls: Mutex<Vec<String>>,
    removed: Mutex<Vec<String>>,
    removed_closest: Mutex<Vec<(String, String)>>,
    reloads: AtomicUsize,
    events: broadcast::Sender<DocumentEvent>,
    loaded: watch::Sender<bool>,
    // Keep a receiver alive so `loaded.send(..)` always updates the value;
    // tokio's `watch::Sender::send` is a no-op when no receivers exist.
    _loaded_rx: watch::Receiver<bool>,
}

impl Default for FakeDocument {
    fn default() -> Self {
        let (events, _) = broadcast::channel(64);
        let (loaded, _loaded_rx) = watch::channel(true);
        Self {
            counts: Mutex::new(HashMap::new()),
            bad_selectors: Mutex::new(HashSet::new()),
            clicks: Mutex::new(Vec::new()),
            scrolls: Mutex::new(Vec::new()),
            removed: Mutex::new(Vec::new()),
            removed_closest: Mutex::new(Vec::new()),
            reloads: AtomicUsize::new(0),
            events,
            loaded,
            _loaded_rx,
        }
    }
}

impl FakeDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how many elements `selector` matches, emitting a change event.
    pub fn set_count(&self, selector: &str, count: usize) {
        let previous = self
            .counts
            .lock()
            .unwrap()
            .insert(selector.to_string(), count)
            .unwrap_or(0);
        let kind = if count >= previous {
            DocumentEventKind::NodesAdded
        } else {
            DocumentEventKind::NodesRemoved
        };
        let _ = self.events.send(DocumentEvent::new(kind));
    }

    /// Make every query for `selector` fail as a malformed selector.
    pub fn fail_selector(&self, selector: &str) {
        self.bad_selectors
            .lock()
            .unwrap()
            .insert(selector.to_string());
    }

    pub fn mark_loading(&self) {
        let _ = self.loaded.send(false);
    }

    pub fn mark_loaded(&self) {
        let _ = self.loaded.send(true);
    }

    pub fn clicks(&self) -> Vec<String> {
        self.clicks.lock().unwrap().clone()
    }

    pub fn scrolls(&self) -> Vec<String> {
        self.scrolls.lock().unwrap().clone()
    }

    pub fn removed(&self) -> Vec<String> {
        self.removed.lock().unwrap().clone()
    }

    pub fn removed_closest(&self) -> Vec<(String, String)> {
        self.removed_closest.lock().unwrap().clone()
    }

    pub fn reloads(&self) -> usize {
        self.reloads.load(Ordering::SeqCst)
    }

    fn count_of(&self, selector: &str) -> Result<usize, AutoTaskError> {
        if self.bad_selectors.lock().unwrap().contains(selector) {
            return Err(AutoTaskError::document(std::io::Error::other(format!(
                "malformed selector: {selector}"
            ))));
        }
        Ok(self
            .counts
            .lock()
            .unwrap()
            .get(selector)
            .copied()
            .unwrap_or(0))
    }
}

impl Document for FakeDocument {
    async fn query_count(&self, selector: &str) -> Result<usize, AutoTaskError> {
        self.count_of(selector)
    }

    async fn scroll_into_view(&self, selector: &str) -> Result<(), AutoTaskError> {
        if self.count_of(selector)? > 0 {
            self.scrolls.lock().unwrap().push(selector.to_string());
        }
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<(), AutoTaskError> {
        if self.count_of(selector)? > 0 {
            self.clicks.lock().unwrap().push(selector.to_string());
        }
        Ok(())
    }

    async fn remove(&self, selector: &str) -> Result<(), AutoTaskError> {
        let count = self.count_of(selector)?;
        if count > 0 {
            self.counts
                .lock()
                .unwrap()
                .insert(selector.to_string(), count - 1);
            self.removed.lock().unwrap().push(selector.to_string());
            let _ = self
                .events
                .send(DocumentEvent::new(DocumentEventKind::NodesRemoved));
        }
        Ok(())
    }

    async fn remove_closest(&self, selector: &str, ancestor: &str) -> Result<(), AutoTaskError> {
        if self.count_of(selector)? > 0 && self.count_of(ancestor)? > 0 {
            self.removed_closest
                .lock()
                .unwrap()
                .push((selector.to_string(), ancestor.to_string()));
            let _ = self
                .events
                .send(DocumentEvent::new(DocumentEventKind::NodesRemoved));
        }
        Ok(())
    }

    async fn remove_all(&self, selector: &str) -> Result<usize, AutoTaskError> {
        let count = self.count_of(selector)?;
        if count > 0 {
            self.counts.lock().unwrap().insert(selector.to_string(), 0);
            self.removed.lock().unwrap().push(selector.to_string());
            let _ = self
                .events
                .send(DocumentEvent::new(DocumentEventKind::NodesRemoved));
        }
        Ok(count)
    }

    fn subscribe(&self) -> broadcast::Receiver<DocumentEvent> {
        self.events.subscribe()
    }

    fn ready(&self) -> impl Future<Output = ()> + Send {
        let mut loaded = self.loaded.subscribe();
        async move {
            let _ = loaded.wait_for(|loaded| *loaded).await;
        }
    }

    async fn reload(&self) -> Result<(), AutoTaskError> {
        self.reloads.fetch_add(1, Ordering::SeqCst);
        let _ = self
            .events
            .send(DocumentEvent::new(DocumentEventKind::Navigated));
        Ok(())
    }
}

use std::future::Future;

/// In-memory config store recording every write.
#[derive(Default)]
pub struct InMemoryConfigStore {
    config: Mutex<Option<Config>>,
    autorun: Mutex<Option<bool>>,
    config_saves: AtomicUsize,
}

impl InMemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_autorun(armed: bool) -> Self {
        let store = Self::default();
        *store.autorun.lock().unwrap() = Some(armed);
        store
    }

    pub fn saved_config(&self) -> Option<Config> {
        self.config.lock().unwrap().clone()
    }

    pub fn autorun(&self) -> Option<bool> {
        *self.autorun.lock().unwrap()
    }

    pub fn config_saves(&self) -> usize {
        self.config_saves.load(Ordering::SeqCst)
    }
}

impl ConfigStore for InMemoryConfigStore {
    async fn load_config(&self) -> Result<Config, AutoTaskError> {
        Ok(self.config.lock().unwrap().clone().unwrap_or_default())
    }

    async fn save_config(&self, config: Config) -> Result<(), AutoTaskError> {
        *self.config.lock().unwrap() = Some(config);
        self.config_saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn load_autorun(&self) -> Result<bool, AutoTaskError> {
        Ok(self.autorun.lock().unwrap().unwrap_or(false))
    }

    async fn save_autorun(&self, armed: bool) -> Result<(), AutoTaskError> {
        *self.autorun.lock().unwrap() = Some(armed);
        Ok(())
    }
}
