//! # autotaskd — autotask daemon
//!
//! Composition root that wires all adapters together and runs the
//! automation engine against a virtual document.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Initialize the `SQLite` pool and run migrations
//! - Load the persisted config (settings + rules) and seed the rule store
//! - Construct the runner, injecting adapters via port traits
//! - Resume automatically when the auto-run flag is armed
//! - Handle graceful shutdown (ctrl-c) with a final config flush
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::sync::Arc;

use tokio_stream::StreamExt;
use tokio_stream::wrappers::WatchStream;
use tracing_subscriber::EnvFilter;

use autotask_adapter_storage_sqlite_sqlx::{Config as StorageConfig, SqliteConfigStore};
use autotask_adapter_virtual::{Element, VirtualDocument};
use autotask_app::persistence::{ConfigSaver, SAVE_DEBOUNCE};
use autotask_app::ports::ConfigStore as _;
use autotask_app::rule_store::RuleStore;
use autotask_app::runner::{SharedSettings, TaskRunner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_config = config::Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&app_config.logging.filter))
        .init();

    // Storage
    let db = StorageConfig {
        database_url: app_config.database.url.clone(),
    }
    .build()
    .await?;
    let store = Arc::new(SqliteConfigStore::new(db.pool().clone()));

    // Persisted config: settings + rule list
    let persisted = store.load_config().await?;
    tracing::info!(rules = persisted.rules.len(), "loaded persisted config");
    let settings = SharedSettings::new(persisted.settings);
    let rules = Arc::new(RuleStore::new(persisted.rules));

    // Document
    let document = VirtualDocument::new();
    if app_config.demo.enabled {
        seed_demo_page(&document);
    }

    // Runner
    let saver = ConfigSaver::spawn(Arc::clone(&store), SAVE_DEBOUNCE);
    let runner = TaskRunner::new(
        document,
        rules,
        settings,
        Arc::clone(&store),
        saver.clone(),
    );

    // Surface state transitions in the log.
    let mut states = WatchStream::new(runner.subscribe());
    tokio::spawn(async move {
        while let Some(state) = states.next().await {
            tracing::info!(
                status = %state.status,
                running = state.is_running,
                highlighted = ?state.highlighted_rule_index,
                "runner state",
            );
        }
    });

    if runner.resume_if_armed().await? {
        tracing::info!("resumed from persisted auto-run flag");
    }

    tracing::info!("autotaskd ready; press ctrl-c to exit");
    tokio::signal::ctrl_c().await?;

    runner.stop().await?;
    saver.flush(runner.current_config()).await;
    tracing::info!("shut down cleanly");
    Ok(())
}

/// Seed a small page so the daemon has something to automate out of the box.
fn seed_demo_page(document: &VirtualDocument) {
    let body = document.body();
    let main = document.append(&body, Element::new("main").with_id("app"));
    let button = document.append(&main, Element::new("button").with_class("demo-target"));
    let banner = document.append(&main, Element::new("div").with_class("banner"));
    document.append(&banner, Element::new("span").with_class("ad"));

    // Clicking the demo button grows the page, which exercises the
    // mutation-observation path.
    document.on_click(&button, |doc| {
        doc.append_to_body(Element::new("div").with_class("spawned"));
    });
}
