// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Daemon HTTP server implementation

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{debug, error, info, warn};

use swarm_review_core::domain::config::SwarmConfigManifest;
use swarm_review_core::infrastructure::event_bus::{EventBus, EventBusError};
use swarm_review_swarm::presentation::app;

use crate::embedded::SwarmStack;

/// Run the REST daemon until Ctrl+C or SIGTERM.
///
/// `host` and `port` override `spec.network` from the configuration.
pub async fn start_server(config_path: Option<PathBuf>, host: Option<String>, port: Option<u16>) -> Result<()> {
    let config = SwarmConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;
    config
        .validate()
        .context("Configuration validation failed")?;

    info!("Configuration loaded: name={}", config.metadata.name);

    let stack = SwarmStack::from_config(&config).context("Failed to initialize swarm stack")?;
    tokio::spawn(log_coordination_messages(stack.event_bus.clone()));

    let health = stack.llm_registry.health_check_all().await;
    for (alias, result) in health {
        match result {
            Ok(()) => info!(alias = %alias, "LLM provider reachable"),
            Err(e) => warn!(alias = %alias, error = %e, "LLM provider health check failed"),
        }
    }

    let router = app(stack.dispatcher);

    let host = host.unwrap_or_else(|| config.spec.network.bind_address.clone());
    let port = port.unwrap_or(config.spec.network.port);
    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Daemon listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Daemon shutting down");

    Ok(())
}

async fn log_coordination_messages(event_bus: Arc<EventBus>) {
    let mut receiver = event_bus.subscribe();
    loop {
        match receiver.recv().await {
            Ok(message) => debug!(
                message_type = %message.message_type,
                subject = %message.subject,
                "{}",
                message.description
            ),
            Err(EventBusError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
