//! Process-wide tracing setup for host shells.

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::tracing_layer::{SdkLogEvent, SdkLogLayer};

/// Installs the global subscriber: an `EnvFilter` built from `directive`
/// (e.g. `"woot_application=debug,info"`), a compact fmt layer on stderr and,
/// when `sender` is given, an [`SdkLogLayer`] forwarding events to the host.
///
/// # Errors
///
/// Fails when the directive does not parse or a global subscriber is already
/// installed.
pub fn install(directive: &str, sender: Option<mpsc::UnboundedSender<SdkLogEvent>>) -> Result<()> {
    let filter = EnvFilter::try_new(directive)
        .with_context(|| format!("Invalid log directive: {}", directive))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr),
        )
        .with(sender.map(SdkLogLayer::new))
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}
