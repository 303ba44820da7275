//! Rule action executor — the side effect performed on a matched element.

use autotask_domain::error::AutoTaskError;
use autotask_domain::rule::{Action, DeleteMode, Rule};

use crate::ports::Document;

/// What the scheduler should do after an action ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Keep going with the next rule.
    Continue,
    /// A STOP rule fired: halt the cycle and disarm auto-resume.
    Stop,
}

/// Perform `rule`'s action against the document.
///
/// Zero matches is a silent no-op for CLICK and DELETE — the element may
/// legitimately vanish between a successful wait and the action. STOP
/// needs no match at all; it only signals the scheduler.
///
/// # Errors
///
/// Propagates [`AutoTaskError::Document`] from the document boundary.
#[tracing::instrument(skip_all, fields(action = %rule.action, selector = %rule.selector))]
pub async fn execute_rule_action<D: Document>(
    document: &D,
    rule: &Rule,
) -> Result<ActionOutcome, AutoTaskError> {
    match rule.action {
        Action::Stop => return Ok(ActionOutcome::Stop),
        Action::Click => {
            if document.query_count(&rule.selector).await? > 0 {
                document.scroll_into_view(&rule.selector).await?;
                document.click(&rule.selector).await?;
            }
        }
        Action::Delete => {
            if document.query_count(&rule.selector).await? > 0 {
                execute_delete(document, rule).await?;
            }
        }
    }
    Ok(ActionOutcome::Continue)
}

async fn execute_delete<D: Document>(document: &D, rule: &Rule) -> Result<(), AutoTaskError> {
    match rule.options.delete_mode.unwrap_or(DeleteMode::Matched) {
        DeleteMode::Matched => document.remove(&rule.selector).await?,
        DeleteMode::Parent => {
            if let Some(parent) = rule.options.parent_selector.as_deref() {
                document.remove_closest(&rule.selector, parent).await?;
            }
        }
        DeleteMode::Custom => {
            if let Some(custom) = rule.options.custom_selector.as_deref() {
                let removed = document.remove_all(custom).await?;
                tracing::debug!(removed, "batch delete");
            }
        }
    }
    Ok(())
}
