//! Element wait primitive — resolve when a selector matches, or time out.

use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;

use autotask_domain::error::AutoTaskError;

use crate::ports::Document;

/// Wait until at least one element matches `selector`.
///
/// Resolves `true` immediately when a match already exists (no observation
/// needed). Otherwise the document's change notifications are observed and
/// the selector re-checked on every batch; a timer of `timeout` races the
/// observation and resolves `false` when it fires first. Exactly one of the
/// two outcomes terminates the wait, and the subscription is released on
/// both paths — the receiver is dropped when this function returns.
///
/// Callers handle `ignore_wait` themselves: a rule that ignores the wait
/// never reaches this primitive, it just polls presence once.
///
/// # Errors
///
/// Propagates [`AutoTaskError::Document`] from the document boundary,
/// e.g. for a malformed selector.
pub async fn wait_for_element<D: Document>(
    document: &D,
    selector: &str,
    timeout: Duration,
) -> Result<bool, AutoTaskError> {
    if document.query_count(selector).await? > 0 {
        return Ok(true);
    }

    // Subscribe first, then re-check: an insert landing between the check
    // above and the subscription must not be missed.
    let mut changes = document.subscribe();
    if document.query_count(selector).await? > 0 {
        return Ok(true);
    }

    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            () = &mut deadline => return Ok(false),
            event = changes.recv() => match event {
                Ok(_) | Err(RecvError::Lagged(_)) => {
                    if document.query_count(selector).await? > 0 {
                        return Ok(true);
                    }
                }
                Err(RecvError::Closed) => {
                    // No further mutations can arrive; wait out the timer.
                    deadline.await;
                    return Ok(false);
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDocument;
    use std::sync::Arc;
    use tokio::time::Instant;

    #[tokio::test]
    async fn should_resolve_true_immediately_when_element_present() {
        let document = FakeDocument::new();
        document.set_count("#x", 1);

        let found = wait_for_element(&document, "#x", Duration::from_millis(100))
            .await
            .unwrap();
        assert!(found);
    }

    #[tokio::test(start_paused = true)]
    async fn should_resolve_false_after_timeout_when_element_never_appears() {
        let document = FakeDocument::new();
        let started = Instant::now();

        let found = wait_for_element(&document, "#never", Duration::from_millis(100))
            .await
            .unwrap();

        assert!(!found);
        assert_eq!(started.elapsed(), Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn should_resolve_true_when_element_appears_mid_wait() {
        let document = Arc::new(FakeDocument::new());
        let mutator = Arc::clone(&document);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            mutator.set_count("#late", 1);
        });

        let started = Instant::now();
        let found = wait_for_element(&document, "#late", Duration::from_millis(200))
            .await
            .unwrap();

        assert!(found);
        assert!(started.elapsed() >= Duration::from_millis(50));
        assert!(started.elapsed() < Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn should_ignore_unrelated_mutations() {
        let document = Arc::new(FakeDocument::new());
        let mutator = Arc::clone(&document);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            mutator.set_count(".other", 1);
        });

        let found = wait_for_element(&document, "#wanted", Duration::from_millis(100))
            .await
            .unwrap();
        assert!(!found);
    }

    #[tokio::test]
    async fn should_propagate_document_error_for_bad_selector() {
        let document = FakeDocument::new();
        document.fail_selector("<<<");

        let result = wait_for_element(&document, "<<<", Duration::from_millis(10)).await;
        assert!(matches!(result, Err(AutoTaskError::Document(_))));
    }
}
