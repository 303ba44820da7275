//! Document port — the live page boundary.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast;

use autotask_domain::error::AutoTaskError;
use autotask_domain::event::DocumentEvent;

/// A live document the runner can query, mutate, and observe.
///
/// Selector strings are opaque to the core; matching is the adapter's job.
/// Action methods are silent no-ops when nothing matches — in a live, racy
/// document an element may legitimately vanish between a successful wait
/// and the action.
pub trait Document {
    /// Number of live elements currently matching `selector`.
    ///
    /// # Errors
    ///
    /// Returns [`AutoTaskError::Document`] when `selector` is malformed.
    fn query_count(
        &self,
        selector: &str,
    ) -> impl Future<Output = Result<usize, AutoTaskError>> + Send;

    /// Scroll the first match into view, centered.
    fn scroll_into_view(
        &self,
        selector: &str,
    ) -> impl Future<Output = Result<(), AutoTaskError>> + Send;

    /// Dispatch a bubbling click on the first match.
    fn click(&self, selector: &str) -> impl Future<Output = Result<(), AutoTaskError>> + Send;

    /// Remove the first match from the document.
    fn remove(&self, selector: &str) -> impl Future<Output = Result<(), AutoTaskError>> + Send;

    /// Remove the nearest ancestor (self included) of the first match that
    /// matches `ancestor`.
    fn remove_closest(
        &self,
        selector: &str,
        ancestor: &str,
    ) -> impl Future<Output = Result<(), AutoTaskError>> + Send;

    /// Remove every element matching `selector`, returning how many went.
    fn remove_all(
        &self,
        selector: &str,
    ) -> impl Future<Output = Result<usize, AutoTaskError>> + Send;

    /// Subscribe to subtree change notifications.
    ///
    /// Dropping the receiver releases the subscription.
    fn subscribe(&self) -> broadcast::Receiver<DocumentEvent>;

    /// Resolves once the page is fully loaded.
    fn ready(&self) -> impl Future<Output = ()> + Send;

    /// Trigger a full page reload.
    fn reload(&self) -> impl Future<Output = Result<(), AutoTaskError>> + Send;
}

impl<T: Document + Send + Sync> Document for Arc<T> {
    fn query_count(
        &self,
        selector: &str,
    ) -> impl Future<Output = Result<usize, AutoTaskError>> + Send {
        (**self).query_count(selector)
    }

    fn scroll_into_view(
        &self,
        selector: &str,
    ) -> impl Future<Output = Result<(), AutoTaskError>> + Send {
        (**self).scroll_into_view(selector)
    }

    fn click(&self, selector: &str) -> impl Future<Output = Result<(), AutoTaskError>> + Send {
        (**self).click(selector)
    }

    fn remove(&self, selector: &str) -> impl Future<Output = Result<(), AutoTaskError>> + Send {
        (**self).remove(selector)
    }

    fn remove_closest(
        &self,
        selector: &str,
        ancestor: &str,
    ) -> impl Future<Output = Result<(), AutoTaskError>> + Send {
        (**self).remove_closest(selector, ancestor)
    }

    fn remove_all(
        &self,
        selector: &str,
    ) -> impl Future<Output = Result<usize, AutoTaskError>> + Send {
        (**self).remove_all(selector)
    }

    fn subscribe(&self) -> broadcast::Receiver<DocumentEvent> {
        (**self).subscribe()
    }

    fn ready(&self) -> impl Future<Output = ()> + Send {
        (**self).ready()
    }

    fn reload(&self) -> impl Future<Output = Result<(), AutoTaskError>> + Send {
        (**self).reload()
    }
}
