//! Debounced config persistence.
//!
//! Every change to settings or rules funnels through [`ConfigSaver`]:
//! ordinary edits are coalesced over a debounce window, while the
//! escalation path and daemon shutdown use [`ConfigSaver::flush`] to write
//! immediately and wait for the write to land. Storage failures are
//! logged, never surfaced — a missed save only costs the latest edits.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use autotask_domain::config::Config;

use crate::ports::ConfigStore;

/// Default debounce window for config writes.
pub const SAVE_DEBOUNCE: Duration = Duration::from_millis(300);

enum SaveCommand {
    Debounced(Config),
    Flush(Config, oneshot::Sender<()>),
}

/// Handle to the background config writer task.
#[derive(Clone)]
pub struct ConfigSaver {
    tx: mpsc::UnboundedSender<SaveCommand>,
}

impl ConfigSaver {
    /// Spawn the background writer over `store`.
    #[must_use]
    pub fn spawn<S>(store: S, debounce: Duration) -> Self
    where
        S: ConfigStore + Send + Sync + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(writer_task(store, rx, debounce));
        Self { tx }
    }

    /// Queue a write after the debounce window; a later call restarts it.
    pub fn save_debounced(&self, config: Config) {
        if self.tx.send(SaveCommand::Debounced(config)).is_err() {
            tracing::warn!("config writer task is gone, dropping save");
        }
    }

    /// Write immediately, bypassing the debounce, and await completion.
    pub async fn flush(&self, config: Config) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(SaveCommand::Flush(config, ack)).is_err() {
            tracing::warn!("config writer task is gone, dropping flush");
            return;
        }
        if done.await.is_err() {
            tracing::warn!("config writer task died before acknowledging flush");
        }
    }
}

async fn writer_task<S: ConfigStore>(
    store: S,
    mut rx: mpsc::UnboundedReceiver<SaveCommand>,
    debounce: Duration,
) {
    let mut pending: Option<Config> = None;
    loop {
        let command = if pending.is_some() {
            tokio::select! {
                command = rx.recv() => command,
                () = tokio::time::sleep(debounce) => {
                    if let Some(config) = pending.take() {
                        write(&store, config).await;
                    }
                    continue;
                }
            }
        } else {
            rx.recv().await
        };

        match command {
            // Restart the window: only the newest pending config survives.
            Some(SaveCommand::Debounced(config)) => pending = Some(config),
            Some(SaveCommand::Flush(config, ack)) => {
                pending = None;
                write(&store, config).await;
                let _ = ack.send(());
            }
            None => {
                if let Some(config) = pending.take() {
                    write(&store, config).await;
                }
                return;
            }
        }
    }
}

async fn write<S: ConfigStore>(store: &S, config: Config) {
    if let Err(err) = store.save_config(config).await {
        tracing::warn!(error = %err, "failed to persist config");
    }
}
