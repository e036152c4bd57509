//! roxterm-focus
//!
//! A small background helper that watches the X server for newly mapped
//! Roxterm windows and brings them to focus.

mod classify;
mod daemon;
mod ewmh;
mod seen;
mod xerror;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "roxterm_focus=debug,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("roxterm-focus started");

    daemon::run()
}
