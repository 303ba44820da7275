//! Cycle scheduler — drives repeated passes over the rule store.
//!
//! The runner owns the ephemeral [`RunnerState`] and publishes every change
//! through a `watch` channel (the in-process UI boundary). Cancellation is
//! cooperative: the cycle loop polls the shared running flag before and
//! after every suspension point, so a `stop()` lands at the next rule
//! boundary and an in-flight wait can never execute its action afterwards.
//!
//! A wait timeout on a rule that does not ignore the wait escalates: the
//! page is assumed to be in a state only a fresh navigation recovers from,
//! so the config is force-flushed, the auto-resume flag armed, and the
//! document reloaded.

use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::watch;

use autotask_domain::config::{Config, Settings};
use autotask_domain::error::AutoTaskError;
use autotask_domain::runner_state::{Highlight, RunnerState, Status};

use crate::executor::{ActionOutcome, execute_rule_action};
use crate::persistence::ConfigSaver;
use crate::ports::{ConfigStore, Document};
use crate::rule_store::RuleStore;
use crate::wait::wait_for_element;

/// Shared, live-updatable settings.
///
/// The cycle loop reads delays fresh at every iteration (never captured at
/// `start()`), so edits apply at the next rule boundary.
#[derive(Debug, Clone, Default)]
pub struct SharedSettings {
    inner: Arc<RwLock<Settings>>,
}

impl SharedSettings {
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings)),
        }
    }

    /// Snapshot the current settings.
    #[must_use]
    pub fn get(&self) -> Settings {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Apply an edit to the settings.
    pub fn update(&self, apply: impl FnOnce(&mut Settings)) {
        let mut settings = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        apply(&mut settings);
    }
}

/// Drives the wait → act → delay cycle over the rule store.
pub struct TaskRunner<D, S> {
    document: D,
    rules: Arc<RuleStore>,
    settings: SharedSettings,
    config_store: S,
    saver: ConfigSaver,
    state: watch::Sender<RunnerState>,
}

impl<D, S> TaskRunner<D, S>
where
    D: Document + Send + Sync + 'static,
    S: ConfigStore + Send + Sync + 'static,
{
    /// Create a runner over the given document, rule store, and storage.
    #[must_use]
    pub fn new(
        document: D,
        rules: Arc<RuleStore>,
        settings: SharedSettings,
        config_store: S,
        saver: ConfigSaver,
    ) -> Arc<Self> {
        let (state, _) = watch::channel(RunnerState::default());
        Arc::new(Self {
            document,
            rules,
            settings,
            config_store,
            saver,
            state,
        })
    }

    /// Subscribe to state snapshots.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<RunnerState> {
        self.state.subscribe()
    }

    /// Current state snapshot.
    #[must_use]
    pub fn state(&self) -> RunnerState {
        self.state.borrow().clone()
    }

    /// The shared rule store (UI-side CRUD goes through this).
    #[must_use]
    pub fn rules(&self) -> &RuleStore {
        &self.rules
    }

    /// The shared settings handle.
    #[must_use]
    pub fn settings(&self) -> &SharedSettings {
        &self.settings
    }

    /// Compose the persistable config from the live settings and rules.
    #[must_use]
    pub fn current_config(&self) -> Config {
        Config::new(self.settings.get(), self.rules.snapshot())
    }

    /// Queue a debounced save of the current config.
    pub fn persist_soon(&self) {
        self.saver.save_debounced(self.current_config());
    }

    /// User-initiated start.
    ///
    /// A no-op while a cycle loop is in flight or when the rule store is
    /// empty. Always records the user's intent by arming the persisted
    /// auto-resume flag, so an unexpected reload mid-run resumes the cycle.
    /// Returns whether a new cycle loop actually began.
    ///
    /// # Errors
    ///
    /// Returns [`AutoTaskError::Storage`] when arming the flag fails; the
    /// loop itself (if it started) keeps running.
    #[tracing::instrument(skip(self))]
    pub async fn start(self: &Arc<Self>) -> Result<bool, AutoTaskError> {
        let started = self.begin();
        self.config_store.save_autorun(true).await?;
        Ok(started)
    }

    /// User-initiated stop.
    ///
    /// Always disarms auto-resume (in memory and in storage); the state
    /// transition itself is a no-op unless a cycle is running. Returns
    /// whether a running cycle was actually stopped.
    ///
    /// # Errors
    ///
    /// Returns [`AutoTaskError::Storage`] when disarming the flag fails.
    #[tracing::instrument(skip(self))]
    pub async fn stop(&self) -> Result<bool, AutoTaskError> {
        let mut stopped = false;
        self.state.send_modify(|state| {
            state.is_auto_run = false;
            if state.is_running {
                state.is_running = false;
                state.status = Status::Stopped;
                stopped = true;
            }
        });
        self.config_store.save_autorun(false).await?;
        Ok(stopped)
    }

    /// Resume after a reload when the persisted auto-resume flag is armed.
    ///
    /// Waits for the page to finish loading, then enters the cycle loop
    /// exactly once and disarms the in-memory auto-start state. The stored
    /// flag is deliberately left armed — a reload mid-run must resume again;
    /// only an explicit [`stop`](Self::stop) clears it.
    ///
    /// # Errors
    ///
    /// Returns [`AutoTaskError::Storage`] when reading the flag fails.
    #[tracing::instrument(skip(self))]
    pub async fn resume_if_armed(self: &Arc<Self>) -> Result<bool, AutoTaskError> {
        if !self.config_store.load_autorun().await? {
            return Ok(false);
        }
        if self.state.borrow().is_running {
            return Ok(false);
        }

        self.state.send_modify(|state| {
            state.is_auto_run = true;
            state.status = Status::Waiting;
        });

        self.document.ready().await;

        // The user may have stopped (or started) while we waited for load.
        let armed = {
            let state = self.state.borrow();
            state.is_auto_run && !state.is_running
        };
        let started = armed && self.begin();

        self.state.send_modify(|state| {
            state.is_auto_run = false;
            if !started && state.status == Status::Waiting {
                state.status = Status::Idle;
            }
        });

        if started {
            tracing::info!("resumed from auto-run flag");
        }
        Ok(started)
    }

    /// Enter the cycle loop without touching the persisted flag.
    ///
    /// Sole loop entry point, idempotent while a loop is in flight: the
    /// compare-and-set on the state channel guarantees a second caller
    /// cannot spawn a concurrent loop.
    pub(crate) fn begin(self: &Arc<Self>) -> bool {
        if self.rules.is_empty() {
            return false;
        }
        let started = self.state.send_if_modified(|state| {
            if state.is_running {
                return false;
            }
            state.is_running = true;
            state.status = Status::Running;
            state.highlight = Highlight::Idle;
            state.highlighted_rule_index = None;
            true
        });
        if started {
            let runner = Arc::clone(self);
            tokio::spawn(async move {
                runner.run_cycles().await;
            });
        }
        started
    }

    fn is_running(&self) -> bool {
        self.state.borrow().is_running
    }

    fn set_highlight(&self, index: Option<usize>, highlight: Highlight) {
        self.state.send_modify(|state| {
            state.highlighted_rule_index = index;
            state.highlight = highlight;
        });
    }

    async fn run_cycles(self: Arc<Self>) {
        tracing::debug!("cycle loop started");
        while self.is_running() {
            if !self.run_single_cycle().await {
                return;
            }
            if self.is_running() {
                tokio::time::sleep(self.settings.get().cycle_delay()).await;
            }
        }
        tracing::debug!("cycle loop ended");
    }

    /// One full pass over the rule store. Returns `false` when the loop
    /// must terminate instead of starting another pass.
    async fn run_single_cycle(&self) -> bool {
        let mut index = 0;
        // Re-read the live list at every boundary so edits made while the
        // cycle is in flight apply to the next rule, not the next cycle.
        while let Some(rule) = self.rules.get(index) {
            if !self.is_running() {
                return false;
            }

            self.set_highlight(Some(index), Highlight::Waiting);

            let wait_delay = self.settings.get().wait_delay();
            let found = if rule.options.ignore_wait {
                match self.document.query_count(&rule.selector).await {
                    Ok(count) => count > 0,
                    Err(err) => return self.fail(&err),
                }
            } else {
                match wait_for_element(&self.document, &rule.selector, wait_delay).await {
                    Ok(found) => found,
                    Err(err) => return self.fail(&err),
                }
            };

            // A stop() issued during the wait must not execute the action.
            if !self.is_running() {
                return false;
            }

            if found {
                match execute_rule_action(&self.document, &rule).await {
                    Ok(ActionOutcome::Continue) => {
                        self.set_highlight(Some(index), Highlight::Success);
                    }
                    Ok(ActionOutcome::Stop) => {
                        self.halt().await;
                        return false;
                    }
                    Err(err) => return self.fail(&err),
                }
            } else if !rule.options.ignore_wait {
                self.escalate().await;
                return false;
            }

            if !rule.options.ignore_wait {
                tokio::time::sleep(self.settings.get().step_delay()).await;
            }

            self.set_highlight(None, Highlight::Idle);
            index += 1;
        }
        true
    }

    /// A STOP rule fired: end the loop and disarm auto-resume.
    async fn halt(&self) {
        tracing::info!("stop rule fired, halting");
        self.state.send_modify(|state| {
            state.is_running = false;
            state.is_auto_run = false;
            state.status = Status::Stopped;
            state.highlighted_rule_index = None;
            state.highlight = Highlight::Idle;
        });
        if let Err(err) = self.config_store.save_autorun(false).await {
            tracing::warn!(error = %err, "failed to disarm auto-resume flag");
        }
    }

    /// Timeout escalation: persist everything, arm auto-resume, reload.
    async fn escalate(&self) {
        tracing::warn!("element wait timed out, escalating to reload");
        self.state.send_modify(|state| {
            state.is_running = false;
            state.status = Status::Stopped;
            state.highlighted_rule_index = None;
            state.highlight = Highlight::Idle;
        });

        // Force-flush, bypassing the debounce: the reload is imminent.
        self.saver.flush(self.current_config()).await;
        if let Err(err) = self.config_store.save_autorun(true).await {
            tracing::warn!(error = %err, "failed to arm auto-resume flag");
        }
        if let Err(err) = self.document.reload().await {
            tracing::warn!(error = %err, "failed to trigger reload");
        }
    }

    /// A document fault (e.g. malformed selector) ends the loop without
    /// escalation — a reload cannot repair a bad selector.
    fn fail(&self, err: &AutoTaskError) -> bool {
        tracing::warn!(error = %err, "cycle aborted by document error");
        self.state.send_modify(|state| {
            state.is_running = false;
            state.status = Status::Stopped;
            state.highlighted_rule_index = None;
            state.highlight = Highlight::Idle;
        });
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeDocument, InMemoryConfigStore};
    use autotask_domain::rule::{Action, Rule, RuleOptions};
    use std::time::Duration;

    struct Harness {
        document: Arc<FakeDocument>,
        store: Arc<InMemoryConfigStore>,
        rules: Arc<RuleStore>,
        runner: Arc<TaskRunner<Arc<FakeDocument>, Arc<InMemoryConfigStore>>>,
    }

    fn harness_with(settings: Settings, store: InMemoryConfigStore) -> Harness {
        let document = Arc::new(FakeDocument::new());
        let store = Arc::new(store);
        let rules = Arc::new(RuleStore::default());
        let saver = ConfigSaver::spawn(Arc::clone(&store), Duration::from_millis(300));
        let runner = TaskRunner::new(
            Arc::clone(&document),
            Arc::clone(&rules),
            SharedSettings::new(settings),
            Arc::clone(&store),
            saver,
        );
        Harness {
            document,
            store,
            rules,
            runner,
        }
    }

    fn harness(settings: Settings) -> Harness {
        harness_with(settings, InMemoryConfigStore::new())
    }

    fn settings(step_ms: u64, wait_ms: u64, cycle_ms: u64) -> Settings {
        Settings {
            step_delay_ms: step_ms,
            wait_delay_ms: wait_ms,
            cycle_delay_ms: cycle_ms,
            ..Settings::default()
        }
    }

    fn click_rule(selector: &str) -> Rule {
        Rule::builder().selector(selector).build().unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn should_execute_rules_in_order_with_step_delays() {
        let h = harness(settings(150, 1000, 60_000));
        for selector in ["#a", "#b", "#c"] {
            h.document.set_count(selector, 1);
            h.rules.replace_push(click_rule(selector));
        }

        assert!(h.runner.start().await.unwrap());

        // First action fires immediately, the rest are paced by step_delay.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(h.document.clicks(), vec!["#a"]);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(h.document.clicks(), vec!["#a", "#b"]);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(h.document.clicks(), vec!["#a", "#b", "#c"]);

        // The cycle delay is far away: no rule ran twice.
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(h.document.clicks().len(), 3);

        h.runner.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn should_repeat_cycle_after_cycle_delay() {
        let h = harness(settings(10, 1000, 200));
        h.document.set_count("#a", 1);
        h.rules.replace_push(click_rule("#a"));

        h.runner.start().await.unwrap();

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(h.document.clicks().len() >= 2);

        h.runner.stop().await.unwrap();
    }

    #[tokio::test]
    async fn should_not_start_with_empty_rule_store() {
        let h = harness(settings(10, 100, 100));
        let started = h.runner.start().await.unwrap();
        assert!(!started);
        assert!(!h.runner.state().is_running);
        // User intent is still recorded, matching the UI behavior.
        assert_eq!(h.store.autorun(), Some(true));
    }

    #[tokio::test(start_paused = true)]
    async fn should_ignore_second_start_while_running() {
        let h = harness(settings(10_000, 10_000, 10_000));
        h.document.set_count("#a", 1);
        h.rules.replace_push(click_rule("#a"));

        assert!(h.runner.start().await.unwrap());
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!h.runner.start().await.unwrap());
        assert_eq!(h.runner.state().status, Status::Running);

        h.runner.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn should_not_execute_action_when_stopped_mid_wait() {
        let h = harness(settings(10, 10_000, 100));
        h.rules.replace_push(click_rule("#late"));

        h.runner.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(h.runner.stop().await.unwrap());
        // The element appears after the stop: the resolving wait must not
        // click it nor advance the cycle.
        h.document.set_count("#late", 1);
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(h.document.clicks().is_empty());
        assert_eq!(h.runner.state().status, Status::Stopped);
        assert_eq!(h.store.autorun(), Some(false));
    }

    #[tokio::test(start_paused = true)]
    async fn should_escalate_when_wait_times_out() {
        let h = harness(settings(10, 1000, 100));
        h.rules.replace_push(click_rule("#x"));

        h.runner.start().await.unwrap();
        assert_eq!(h.store.autorun(), Some(true));

        tokio::time::sleep(Duration::from_millis(1100)).await;

        let state = h.runner.state();
        assert!(!state.is_running);
        assert_eq!(state.status, Status::Stopped);
        assert_eq!(h.store.autorun(), Some(true));
        assert_eq!(h.document.reloads(), 1);
        // The config was force-flushed before the reload.
        let saved = h.store.saved_config().unwrap();
        assert_eq!(saved.rules.len(), 1);
        assert_eq!(saved.rules[0].selector, "#x");
    }

    #[tokio::test(start_paused = true)]
    async fn should_skip_missing_element_when_ignore_wait_set() {
        let h = harness(settings(150, 1000, 60_000));
        let skip = Rule {
            options: RuleOptions {
                ignore_wait: true,
                ..RuleOptions::default()
            },
            ..click_rule("#missing")
        };
        h.rules.replace_push(skip);
        h.document.set_count("#b", 1);
        h.rules.replace_push(click_rule("#b"));

        h.runner.start().await.unwrap();

        // The skip neither waits nor pauses for the step delay.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(h.document.clicks(), vec!["#b"]);
        assert_eq!(h.document.reloads(), 0);

        h.runner.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn should_halt_and_disarm_autorun_on_stop_rule() {
        let h = harness(settings(10, 1000, 100));
        h.document.set_count("#a", 1);
        h.document.set_count("body", 1);
        h.rules.replace_push(click_rule("#a"));
        h.rules.replace_push(
            Rule::builder()
                .selector("body")
                .action(Action::Stop)
                .build()
                .unwrap(),
        );

        h.runner.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        let state = h.runner.state();
        assert!(!state.is_running);
        assert_eq!(state.status, Status::Stopped);
        assert_eq!(h.store.autorun(), Some(false));
        assert_eq!(h.document.clicks(), vec!["#a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn should_stop_without_reload_on_malformed_selector() {
        let h = harness(settings(10, 1000, 100));
        h.document.fail_selector("<<<");
        h.rules.replace_push(click_rule("<<<"));

        h.runner.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let state = h.runner.state();
        assert!(!state.is_running);
        assert_eq!(state.status, Status::Stopped);
        assert_eq!(h.document.reloads(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn should_resume_once_page_loaded_when_flag_armed() {
        let h = harness_with(settings(10, 1000, 60_000), InMemoryConfigStore::with_autorun(true));
        h.document.mark_loading();
        h.document.set_count("#a", 1);
        h.rules.replace_push(click_rule("#a"));

        let runner = Arc::clone(&h.runner);
        let resume = tokio::spawn(async move { runner.resume_if_armed().await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        let state = h.runner.state();
        assert!(state.is_auto_run);
        assert_eq!(state.status, Status::Waiting);

        h.document.mark_loaded();
        assert!(resume.await.unwrap().unwrap());

        let state = h.runner.state();
        assert!(!state.is_auto_run);
        assert!(state.is_running);
        // The stored flag stays armed so a mid-run reload resumes again.
        assert_eq!(h.store.autorun(), Some(true));

        h.runner.stop().await.unwrap();
    }

    #[tokio::test]
    async fn should_not_resume_when_flag_disarmed() {
        let h = harness(settings(10, 1000, 100));
        h.document.set_count("#a", 1);
        h.rules.replace_push(click_rule("#a"));

        assert!(!h.runner.resume_if_armed().await.unwrap());
        assert!(!h.runner.state().is_running);
    }

    #[tokio::test(start_paused = true)]
    async fn should_not_resume_after_explicit_stop_while_waiting_for_load() {
        let h = harness_with(settings(10, 1000, 100), InMemoryConfigStore::with_autorun(true));
        h.document.mark_loading();
        h.document.set_count("#a", 1);
        h.rules.replace_push(click_rule("#a"));

        let runner = Arc::clone(&h.runner);
        let resume = tokio::spawn(async move { runner.resume_if_armed().await });
        tokio::time::sleep(Duration::from_millis(10)).await;

        h.runner.stop().await.unwrap();
        h.document.mark_loaded();

        assert!(!resume.await.unwrap().unwrap());
        assert!(!h.runner.state().is_running);
        assert_eq!(h.store.autorun(), Some(false));
    }

    #[tokio::test(start_paused = true)]
    async fn should_pick_up_rule_edits_at_next_rule_boundary() {
        let h = harness(settings(50, 1000, 60_000));
        h.document.set_count("#a", 1);
        h.document.set_count("#added", 1);
        h.rules.replace_push(click_rule("#a"));

        h.runner.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        // Appended mid-cycle: executed within the same pass.
        h.rules.replace_push(click_rule("#added"));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(h.document.clicks(), vec!["#a", "#added"]);

        h.runner.stop().await.unwrap();
    }

    #[tokio::test]
    async fn should_compose_current_config_from_settings_and_rules() {
        let h = harness(settings(10, 20, 30));
        h.rules.replace_push(click_rule("#a"));

        let config = h.runner.current_config();
        assert_eq!(config.settings.step_delay_ms, 10);
        assert_eq!(config.rules.len(), 1);
    }

    impl RuleStore {
        /// Test helper: push a pre-built rule, keeping its id.
        fn replace_push(&self, rule: Rule) {
            let mut rules = self.snapshot();
            rules.push(rule);
            self.replace(rules);
        }
    }
}
