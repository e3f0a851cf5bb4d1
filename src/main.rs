use std::sync::Arc;

use anyhow::Context;
use tower_http::cors::CorsLayer;
use tracing_appender::non_blocking::WorkerGuard;

use ciberabogados::chat::SimulatedResponder;
use ciberabogados::config::AppConfig;
use ciberabogados::flow::{FlowDeps, SessionStore, flow_routes, spawn_idle_sweep};
use ciberabogados::handover::{AgentNotifier, SimulatedNotifier, WebhookNotifier};
use ciberabogados::registration::SimulatedRegistrar;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("Invalid configuration")?;

    // Keep the guard alive so buffered log lines are flushed on exit
    let _log_guard = init_tracing(config.log_dir.as_deref());

    let notifier: Arc<dyn AgentNotifier> = if config.webhook.live {
        Arc::new(WebhookNotifier::new(
            config.webhook.timeout,
            config.webhook.token.clone(),
        )?)
    } else {
        Arc::new(SimulatedNotifier::new(config.flow.handover_delay))
    };

    let unresolved = config.agents.unresolved_count();
    if config.webhook.live && unresolved > 0 {
        tracing::warn!(
            unresolved,
            "Live webhooks enabled but some agents still use placeholder URLs"
        );
    }

    let deps = Arc::new(FlowDeps {
        registrar: Arc::new(SimulatedRegistrar::new(config.flow.registration_delay)),
        notifier,
        responder: Arc::new(SimulatedResponder::new(config.flow.chat_delay)),
        agents: Arc::new(config.agents.clone()),
        flow: config.flow.clone(),
    });

    let store = SessionStore::new(deps);
    let _sweep = spawn_idle_sweep(Arc::clone(&store), config.session_idle_timeout);

    let app = flow_routes(store).layer(CorsLayer::permissive());

    let addr = format!("{}:{}", config.bind, config.port);
    eprintln!("⚖️  Ciberabogados v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   API: http://{}/api/sessions", addr);
    eprintln!("   WS:  ws://{}/api/sessions/{{id}}/ws", addr);
    eprintln!(
        "   Webhooks: {} ({} of {} agents unresolved)",
        if config.webhook.live { "live" } else { "simulated" },
        unresolved,
        config.agents.len()
    );

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(%addr, "Flow server started");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Stderr logging, plus a daily-rolling file when `log_dir` is set.
fn init_tracing(log_dir: Option<&str>) -> Option<WorkerGuard> {
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "ciberabogados.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_target(false)
                .init();
            None
        }
    }
}
