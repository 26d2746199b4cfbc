//! Application state management.

use anyhow::Context;
use pagewatch_audit::{AuditEngine, HttpAuditClient};
use pagewatch_core::AppConfig;
use pagewatch_crawl::CrawlService;
use pagewatch_db::Database;
use pagewatch_events::InProcEventBus;
use pagewatch_scanner::{
    AdmissionControl, IssueNotifier, LogNotifier, MemoryCounterStore, ScanHandler,
};
use std::sync::Arc;

/// Application state shared by every entry point.
pub struct AppState {
    /// Effective configuration
    pub config: AppConfig,
    /// Storage
    pub db: Database,
    /// In-process event bus subscribers attach to
    pub bus: Arc<InProcEventBus>,
    /// Single-page scan pipeline
    pub handler: Arc<ScanHandler>,
    /// Site-wide crawl intake
    pub crawls: CrawlService,
    /// Per-caller budgets
    pub admission: AdmissionControl,
}

impl AppState {
    /// Build the pipeline against the configured HTTP audit engine.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let engine =
            HttpAuditClient::new(&config.audit).context("failed to create audit client")?;
        Self::with_engine(config, Arc::new(engine)).await
    }

    /// Build the pipeline against any audit engine. Issue alerts are logged.
    pub async fn with_engine(
        config: AppConfig,
        engine: Arc<dyn AuditEngine>,
    ) -> anyhow::Result<Self> {
        Self::with_notifier(config, engine, Arc::new(LogNotifier)).await
    }

    /// Build the pipeline with a custom issue alert channel.
    pub async fn with_notifier(
        config: AppConfig,
        engine: Arc<dyn AuditEngine>,
        notifier: Arc<dyn IssueNotifier>,
    ) -> anyhow::Result<Self> {
        config.validate().context("invalid configuration")?;

        let db = Database::with_max_connections(
            &config.database.path,
            config.database.max_connections,
        )
        .await
        .with_context(|| format!("failed to open database at {}", config.database.path))?;
        db.run_migrations()
            .await
            .context("failed to run database migrations")?;
        tracing::info!("Database ready: {}", config.database.path);

        let bus = Arc::new(InProcEventBus::new(config.events.channel_capacity));
        let handler = Arc::new(
            ScanHandler::new(engine, Arc::new(db.clone()), bus.clone(), &config)
                .with_notifier(notifier),
        );
        let crawls = CrawlService::new(handler.clone(), &config.scanning);
        let admission = AdmissionControl::new(Arc::new(MemoryCounterStore::new()), &config.limits);

        Ok(Self {
            config,
            db,
            bus,
            handler,
            crawls,
            admission,
        })
    }

    /// Stop the crawl dispatcher and close the database pool.
    pub async fn shutdown(self) {
        self.crawls.shutdown();
        self.db.close().await;
    }
}
