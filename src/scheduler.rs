use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch, Mutex, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{error, info, warn};

use crate::config::{Config, MANUAL_PASS_WORKERS, SCHEDULER_STOP_GRACE};
use crate::error::{AppError, Result};
use crate::service::RefreshTarget;
use crate::types::{now_ns, PassReport, PassTrigger};

#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub interval: Duration,
    /// Pause between products inside one pass.
    pub product_delay: Duration,
    pub retention_days: u32,
    pub stop_grace: Duration,
    pub manual_workers: usize,
}

impl SchedulerSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            interval: cfg.refresh_interval(),
            product_delay: cfg.refresh_product_delay,
            retention_days: cfg.history_retention_days,
            stop_grace: SCHEDULER_STOP_GRACE,
            manual_workers: MANUAL_PASS_WORKERS,
        }
    }
}

struct Inner {
    target: Arc<dyn RefreshTarget>,
    settings: SchedulerSettings,
    reports: mpsc::Sender<PassReport>,
    /// Held for the whole of any pass; scheduled ticks skip when it is taken.
    pass_lock: Mutex<()>,
    manual_slots: Arc<Semaphore>,
    shutdown: watch::Sender<bool>,
    running: AtomicBool,
}

/// Periodic refresh of every known product, plus on-demand passes.
///
/// Stopped -> Running on `start`, Running -> Stopped on `stop`. Each product
/// refresh runs on its own task, so even a forced stop never cuts a product's
/// writes short.
pub struct RefreshScheduler {
    inner: Arc<Inner>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl RefreshScheduler {
    pub fn new(
        target: Arc<dyn RefreshTarget>,
        settings: SchedulerSettings,
        reports: mpsc::Sender<PassReport>,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        let manual_slots = Arc::new(Semaphore::new(settings.manual_workers));
        Self {
            inner: Arc::new(Inner {
                target,
                settings,
                reports,
                pass_lock: Mutex::new(()),
                manual_slots,
                shutdown,
                running: AtomicBool::new(false),
            }),
            handle: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Relaxed)
    }

    /// Arm the periodic timer. Returns false if already running.
    pub async fn start(&self) -> bool {
        let mut handle = self.handle.lock().await;
        if handle.is_some() {
            return false;
        }

        self.inner.shutdown.send_replace(false);
        let shutdown_rx = self.inner.shutdown.subscribe();
        let inner = Arc::clone(&self.inner);
        *handle = Some(tokio::spawn(async move { inner.run(shutdown_rx).await }));
        self.inner.running.store(true, Ordering::Relaxed);

        info!(
            interval_secs = self.inner.settings.interval.as_secs(),
            "Refresh scheduler started"
        );
        true
    }

    /// Signal the loop, wait up to the grace period for the current product
    /// to finish, then abort the loop. Returns false if not running.
    pub async fn stop(&self) -> bool {
        let Some(mut handle) = self.handle.lock().await.take() else {
            return false;
        };
        self.inner.shutdown.send_replace(true);
        self.inner.running.store(false, Ordering::Relaxed);

        match tokio::time::timeout(self.inner.settings.stop_grace, &mut handle).await {
            Ok(_) => info!("Refresh scheduler stopped"),
            Err(_) => {
                warn!(
                    grace_secs = self.inner.settings.stop_grace.as_secs(),
                    "Refresh pass still running after grace period, aborting"
                );
                handle.abort();
            }
        }
        true
    }

    /// Run one pass on a worker without touching the timer.
    /// Fails with `Busy` when every manual worker is taken.
    pub fn trigger_manual(&self) -> Result<()> {
        let permit = Arc::clone(&self.inner.manual_slots)
            .try_acquire_owned()
            .map_err(|_| AppError::Busy("manual refresh already queued".to_string()))?;

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let _permit = permit;
            // Manual passes are not tied to start/stop; this flag never fires.
            let (_never, mut shutdown_rx) = watch::channel(false);
            let _pass = inner.pass_lock.lock().await;
            let report = inner.run_pass(PassTrigger::Manual, &mut shutdown_rx).await;
            inner.publish(report);
        });
        Ok(())
    }
}

impl Inner {
    async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) {
        let mut ticker = interval(self.settings.interval);
        ticker.tick().await; // skip immediate first tick

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown_rx.changed() => {}
            }
            if *shutdown_rx.borrow() {
                break;
            }

            let Ok(_pass) = self.pass_lock.try_lock() else {
                info!("Skipping scheduled refresh: another pass is in flight");
                continue;
            };

            let report = self.run_pass(PassTrigger::Scheduled, &mut shutdown_rx).await;
            let interrupted = report.interrupted;
            self.publish(report);

            if !interrupted {
                match self.target.prune(self.settings.retention_days).await {
                    Ok(0) => {}
                    Ok(n) => info!(removed = n, "Pruned price history"),
                    Err(e) => error!("History prune failed: {e}"),
                }
            }
        }
    }

    async fn run_pass(&self, trigger: PassTrigger, shutdown_rx: &mut watch::Receiver<bool>) -> PassReport {
        let started_at_ns = now_ns();
        let ids = match self.target.product_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                error!(%trigger, "Could not list products: {e}");
                Vec::new()
            }
        };
        info!(%trigger, products = ids.len(), "Refresh pass started");

        let mut refreshed = 0;
        let mut failed = 0;
        let mut interrupted = false;

        for (i, &product_id) in ids.iter().enumerate() {
            if i > 0 && !self.settings.product_delay.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(self.settings.product_delay) => {}
                    _ = shutdown_rx.changed() => {}
                }
            }
            if *shutdown_rx.borrow() {
                interrupted = true;
                break;
            }

            let target = Arc::clone(&self.target);
            let task = tokio::spawn(async move { target.refresh_product(product_id).await });
            match task.await {
                Ok(Ok(_)) => refreshed += 1,
                Ok(Err(e)) => {
                    failed += 1;
                    warn!(product_id, %trigger, "Product refresh failed: {e}");
                }
                Err(e) => {
                    failed += 1;
                    error!(product_id, %trigger, "Product refresh task panicked: {e}");
                }
            }
        }

        let report = PassReport {
            trigger,
            refreshed,
            failed,
            interrupted,
            started_at_ns,
            finished_at_ns: now_ns(),
        };
        info!(
            %trigger,
            refreshed,
            failed,
            interrupted,
            "Refresh pass complete: {refreshed} refreshed, {failed} failed",
        );
        report
    }

    fn publish(&self, report: PassReport) {
        if let Err(e) = self.reports.try_send(report) {
            warn!("Pass report channel full: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex as StdMutex;

    const WRITES_PER_PRODUCT: usize = 3;

    struct FakeTarget {
        ids: Vec<i64>,
        fail: Vec<i64>,
        step: Duration,
        started: StdMutex<Vec<i64>>,
        writes: StdMutex<HashMap<i64, usize>>,
        prunes: AtomicUsize,
    }

    impl FakeTarget {
        fn new(ids: Vec<i64>, fail: Vec<i64>, step: Duration) -> Arc<Self> {
            Arc::new(Self {
                ids,
                fail,
                step,
                started: StdMutex::new(Vec::new()),
                writes: StdMutex::new(HashMap::new()),
                prunes: AtomicUsize::new(0),
            })
        }

        fn started(&self) -> Vec<i64> {
            self.started.lock().unwrap().clone()
        }

        fn writes(&self, id: i64) -> usize {
            self.writes.lock().unwrap().get(&id).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl RefreshTarget for FakeTarget {
        async fn product_ids(&self) -> Result<Vec<i64>> {
            Ok(self.ids.clone())
        }

        async fn refresh_product(&self, product_id: i64) -> Result<usize> {
            self.started.lock().unwrap().push(product_id);
            if self.fail.contains(&product_id) {
                return Err(AppError::NoData(format!("product {product_id}")));
            }
            for _ in 0..WRITES_PER_PRODUCT {
                tokio::time::sleep(self.step).await;
                *self.writes.lock().unwrap().entry(product_id).or_default() += 1;
            }
            Ok(WRITES_PER_PRODUCT)
        }

        async fn prune(&self, _older_than_days: u32) -> Result<u64> {
            self.prunes.fetch_add(1, Ordering::SeqCst);
            Ok(0)
        }
    }

    fn settings(interval_ms: u64, grace_ms: u64, workers: usize) -> SchedulerSettings {
        SchedulerSettings {
            interval: Duration::from_millis(interval_ms),
            product_delay: Duration::from_millis(5),
            retention_days: 365,
            stop_grace: Duration::from_millis(grace_ms),
            manual_workers: workers,
        }
    }

    async fn wait_until(mut cond: impl FnMut() -> bool) {
        for _ in 0..400 {
            if cond() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached");
    }

    #[tokio::test]
    async fn failing_product_does_not_abort_pass() {
        let target = FakeTarget::new(vec![1, 2, 3], vec![2], Duration::from_millis(1));
        let (tx, mut rx) = mpsc::channel(4);
        let scheduler = RefreshScheduler::new(target.clone(), settings(60_000, 1_000, 2), tx);

        scheduler.trigger_manual().unwrap();
        let report = rx.recv().await.unwrap();
        assert_eq!(report.trigger, PassTrigger::Manual);
        assert_eq!(report.refreshed, 2);
        assert_eq!(report.failed, 1);
        assert!(!report.interrupted);
        assert_eq!(target.started(), vec![1, 2, 3]);
        // manual passes do not prune
        assert_eq!(target.prunes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn scheduled_pass_reports_and_prunes() {
        let target = FakeTarget::new(vec![1, 2], vec![], Duration::from_millis(1));
        let (tx, mut rx) = mpsc::channel(4);
        let scheduler = RefreshScheduler::new(target.clone(), settings(20, 1_000, 2), tx);

        assert!(scheduler.start().await);
        assert!(!scheduler.start().await);
        assert!(scheduler.is_running());

        let report = rx.recv().await.unwrap();
        assert_eq!(report.trigger, PassTrigger::Scheduled);
        assert_eq!(report.refreshed, 2);
        wait_until(|| target.prunes.load(Ordering::SeqCst) >= 1).await;

        assert!(scheduler.stop().await);
        assert!(!scheduler.is_running());
        assert!(!scheduler.stop().await);
    }

    #[tokio::test]
    async fn stop_mid_pass_leaves_no_partial_product() {
        let target = FakeTarget::new(vec![1, 2, 3, 4, 5], vec![], Duration::from_millis(15));
        let (tx, mut rx) = mpsc::channel(4);
        let scheduler = RefreshScheduler::new(target.clone(), settings(10, 5_000, 2), tx);

        scheduler.start().await;
        wait_until(|| !target.started().is_empty()).await;
        scheduler.stop().await;

        let report = rx.recv().await.unwrap();
        assert!(report.interrupted);
        let started = target.started();
        assert!(started.len() < 5);
        for id in started {
            assert_eq!(target.writes(id), WRITES_PER_PRODUCT, "product {id} partially written");
        }
    }

    #[tokio::test]
    async fn forced_abort_still_completes_current_product() {
        let target = FakeTarget::new(vec![1, 2], vec![], Duration::from_millis(40));
        let (tx, _rx) = mpsc::channel(4);
        let scheduler = RefreshScheduler::new(target.clone(), settings(10, 1, 2), tx);

        scheduler.start().await;
        wait_until(|| !target.started().is_empty()).await;
        scheduler.stop().await;

        tokio::time::sleep(Duration::from_millis(300)).await;
        for id in target.started() {
            assert_eq!(target.writes(id), WRITES_PER_PRODUCT);
        }
    }

    #[tokio::test]
    async fn manual_trigger_is_bounded() {
        let target = FakeTarget::new(vec![1], vec![], Duration::from_millis(50));
        let (tx, _rx) = mpsc::channel(4);
        let scheduler = RefreshScheduler::new(target, settings(60_000, 1_000, 1), tx);

        scheduler.trigger_manual().unwrap();
        assert!(matches!(scheduler.trigger_manual(), Err(AppError::Busy(_))));
    }
}
