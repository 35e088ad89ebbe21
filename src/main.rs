mod ai;
mod api;
mod catalog;
mod config;
mod db;
mod error;
mod insights;
mod numeric;
mod orchestrator;
mod provider;
mod scheduler;
mod scrape;
mod service;
mod synth;
mod types;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::ai::{AiProvider, GeminiClient, TextGenerator};
use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::api::routes::{router, ApiState};
use crate::config::{Config, EngineKind, ProviderKind, CHANNEL_CAPACITY};
use crate::db::SqliteStore;
use crate::error::Result;
use crate::orchestrator::Orchestrator;
use crate::provider::ListingProvider;
use crate::scheduler::{RefreshScheduler, SchedulerSettings};
use crate::scrape::{HttpListingScraper, PageScraper, ScrapeProvider};
use crate::service::ProductService;
use crate::synth::SynthProvider;
use crate::types::PassReport;

#[tokio::main]
async fn main() {
    // A missing .env file is fine; the process environment still applies.
    let _ = dotenvy::dotenv();

    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    // --- Database setup ---
    let pool = sqlx::SqlitePool::connect(&format!("sqlite:{}?mode=rwc", cfg.db_path)).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database ready at {}", cfg.db_path);
    let store = SqliteStore::new(pool);

    // --- Providers ---
    let ai = Arc::new(build_ai(&cfg)?);
    if !ai.is_configured() {
        warn!("GEMINI_API_KEY not set: listings will come from scraping or synthesis");
    }
    let engines = build_engines(&cfg)?;
    if engines.is_empty() {
        info!("SCRAPE_ENGINES empty: page scraping disabled");
    }
    let scrape = Arc::new(ScrapeProvider::new(engines));
    let synth = Arc::new(SynthProvider::new(cfg.synth_seed));

    let pick = |kind: ProviderKind| -> Arc<dyn ListingProvider> {
        match kind {
            ProviderKind::Ai => Arc::clone(&ai) as Arc<dyn ListingProvider>,
            ProviderKind::Scrape => Arc::clone(&scrape) as Arc<dyn ListingProvider>,
            ProviderKind::Synth => Arc::clone(&synth) as Arc<dyn ListingProvider>,
        }
    };
    let chain: Vec<_> = cfg.provider_chain.iter().copied().map(pick).collect();
    // Single-platform lookups always prefer a real page over generated data.
    let single: Vec<_> = [ProviderKind::Scrape, ProviderKind::Ai, ProviderKind::Synth]
        .into_iter()
        .filter(|k| cfg.provider_chain.contains(k))
        .map(pick)
        .collect();
    info!(
        "Provider chain: [{}]",
        chain.iter().map(|p| p.name()).collect::<Vec<_>>().join(", ")
    );
    if !cfg.provider_chain.contains(&ProviderKind::Synth) {
        warn!("PROVIDER_CHAIN has no synth step: products may end up with no data");
    }

    let latency = Arc::new(LatencyStats::new());
    let orchestrator = Arc::new(Orchestrator::new(chain, single, Arc::clone(&latency)));
    let service = Arc::new(ProductService::new(store, orchestrator));

    // --- Scheduler ---
    let (report_tx, report_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let scheduler = Arc::new(RefreshScheduler::new(
        service.clone(),
        SchedulerSettings::from_config(&cfg),
        report_tx,
    ));
    scheduler.start().await;

    let health = Arc::new(HealthState::new());
    let consumer_health = Arc::clone(&health);
    tokio::spawn(async move { report_consumer(report_rx, consumer_health).await });

    // --- HTTP API ---
    let api_state = ApiState {
        service,
        scheduler: Arc::clone(&scheduler),
        ai,
        health,
        latency,
        theme: cfg.theme,
        refresh_minutes: cfg.auto_refresh_minutes,
    };
    let app = router(api_state);
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested");
        })
        .await?;

    scheduler.stop().await;
    Ok(())
}

fn build_ai(cfg: &Config) -> Result<AiProvider> {
    let Some(key) = cfg.gemini_api_key.as_deref() else {
        return Ok(AiProvider::new(None));
    };
    let generator: Arc<dyn TextGenerator> = Arc::new(GeminiClient::new(&cfg.gemini_api_url, key)?);
    Ok(AiProvider::new(Some(generator)))
}

fn build_engines(cfg: &Config) -> Result<Vec<Arc<dyn PageScraper>>> {
    cfg.scrape_engines
        .iter()
        .map(|kind| match kind {
            EngineKind::Http => Ok(Arc::new(HttpListingScraper::new()?) as Arc<dyn PageScraper>),
        })
        .collect()
}

/// Logs each pass report and folds it into the health state.
async fn report_consumer(mut rx: mpsc::Receiver<PassReport>, health: Arc<HealthState>) {
    while let Some(report) = rx.recv().await {
        let took_ms = (report.finished_at_ns - report.started_at_ns) / 1_000_000;
        info!(
            event = "PASS_REPORT",
            trigger = %report.trigger,
            refreshed = report.refreshed,
            failed = report.failed,
            interrupted = report.interrupted,
            took_ms,
            "PASS {} | refreshed: {} | failed: {} | {}ms{}",
            report.trigger,
            report.refreshed,
            report.failed,
            took_ms,
            if report.interrupted { " | interrupted" } else { "" },
        );
        health.record_pass(&report);
    }
}
