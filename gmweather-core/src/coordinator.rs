//! Poll cycle: fan out the three resource fetches, publish one snapshot.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use tokio::{
    sync::watch,
    time::{MissedTickBehavior, interval},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::{
    client::{MAX_FORECAST_DAYS, WeatherSource},
    error::{TransportError, UpdateFailed},
    sensor::ApiUsageEstimate,
    snapshot::{Snapshot, WeatherReport},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollSettings {
    pub update_interval: Duration,
    pub forecast_days: u32,
    pub hourly_hours: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            update_interval: Duration::from_secs(60 * 60),
            forecast_days: MAX_FORECAST_DAYS,
            hourly_hours: 48,
        }
    }
}

/// Owns the weather source and the last good snapshot.
///
/// At most one poll runs at a time; callers (the host scheduler or
/// [`Coordinator::run`]) are expected to keep it that way.
#[derive(Debug)]
pub struct Coordinator {
    source: Arc<dyn WeatherSource>,
    settings: PollSettings,
    latest: watch::Sender<Option<Arc<Snapshot>>>,
    cancel: CancellationToken,
    closed: AtomicBool,
}

impl Coordinator {
    pub fn new(source: Arc<dyn WeatherSource>, settings: PollSettings) -> Self {
        let (latest, _) = watch::channel(None);
        Self {
            source,
            settings,
            latest,
            cancel: CancellationToken::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Fetch all three resources concurrently and publish the result.
    ///
    /// The first failing fetch aborts the cycle; the previous snapshot stays
    /// published. After [`Coordinator::shutdown`] the in-flight fetches are
    /// dropped and nothing is published.
    pub async fn poll(&self) -> Result<Arc<Snapshot>, UpdateFailed> {
        let fetched = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                debug!("in-flight poll abandoned");
                return Err(TransportError::Cancelled.into());
            }
            fetched = async {
                tokio::try_join!(
                    self.source.fetch_current(),
                    self.source.fetch_daily(self.settings.forecast_days),
                    self.source.fetch_hourly(self.settings.hourly_hours),
                )
            } => fetched,
        };

        let (current, daily, hourly) = fetched.map_err(|err| {
            error!(%err, "weather update failed");
            UpdateFailed::from(err)
        })?;

        let snapshot = Arc::new(Snapshot::from_payloads(current, &daily, &hourly));
        debug!(
            daily = snapshot.forecast_daily.len(),
            hourly = snapshot.forecast_hourly.len(),
            "weather data updated"
        );

        self.latest.send_replace(Some(Arc::clone(&snapshot)));
        Ok(snapshot)
    }

    /// Initial poll made before setup is considered complete.
    pub async fn first_refresh(&self) -> Result<Arc<Snapshot>, UpdateFailed> {
        let snapshot = self.poll().await?;
        let minutes = self.settings.update_interval.as_secs() / 60;
        let usage = ApiUsageEstimate::for_interval(u32::try_from(minutes).unwrap_or(u32::MAX));
        info!(
            interval_minutes = minutes,
            hourly_hours = self.settings.hourly_hours,
            monthly_calls = usage.estimated_monthly_calls,
            "weather coordinator ready"
        );
        Ok(snapshot)
    }

    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.latest.borrow().clone()
    }

    pub fn report(&self) -> WeatherReport {
        WeatherReport::new(self.snapshot())
    }

    /// Receiver notified on every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Snapshot>>> {
        self.latest.subscribe()
    }

    /// Poll every `update_interval` until [`Coordinator::shutdown`].
    ///
    /// The first poll happens one interval after the call. Failed polls are
    /// logged and retried on the next tick; a poll still in flight at
    /// shutdown is dropped without publishing.
    pub async fn run(&self) {
        let mut ticker = interval(self.settings.update_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            // Errors are already logged by `poll`.
            let _ = self.poll().await;
        }

        debug!("polling stopped");
    }

    /// Stop [`Coordinator::run`] and close the source. Safe to call repeatedly.
    pub fn shutdown(&self) {
        self.cancel.cancel();
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.source.close();
            info!("weather coordinator shut down");
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Resource;
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::sync::atomic::AtomicUsize;
    use tokio::{sync::Barrier, time::timeout};

    #[derive(Debug, Default)]
    struct FakeSource {
        fail_daily: AtomicBool,
        fail_current: AtomicBool,
        hang_hourly: AtomicBool,
        current_calls: AtomicUsize,
        closes: AtomicUsize,
        barrier: Option<Barrier>,
    }

    impl FakeSource {
        async fn rendezvous(&self) {
            if let Some(barrier) = &self.barrier {
                barrier.wait().await;
            }
        }
    }

    #[async_trait]
    impl WeatherSource for FakeSource {
        async fn fetch_current(&self) -> Result<Value, TransportError> {
            let n = self.current_calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_current.load(Ordering::SeqCst) {
                return Err(TransportError::Closed);
            }
            self.rendezvous().await;
            Ok(json!({"temperature": {"degrees": n}}))
        }

        async fn fetch_daily(&self, days: u32) -> Result<Value, TransportError> {
            self.rendezvous().await;
            if self.fail_daily.load(Ordering::SeqCst) {
                return Err(TransportError::Status {
                    resource: Resource::DailyForecast,
                    status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                    body: "backend down".into(),
                });
            }
            let days: Vec<Value> = (0..days).map(|i| json!({"n": i})).collect();
            Ok(json!({ "forecastDays": days }))
        }

        async fn fetch_hourly(&self, hours: u32) -> Result<Value, TransportError> {
            if self.hang_hourly.load(Ordering::SeqCst) {
                std::future::pending::<()>().await;
            }
            self.rendezvous().await;
            let hours: Vec<Value> = (0..hours).map(|i| json!({"n": i})).collect();
            Ok(json!({ "forecastHours": hours }))
        }

        fn close(&self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn settings() -> PollSettings {
        PollSettings {
            update_interval: Duration::from_secs(60),
            forecast_days: 5,
            hourly_hours: 24,
        }
    }

    fn coordinator(source: &Arc<FakeSource>) -> Coordinator {
        Coordinator::new(Arc::clone(source) as Arc<dyn WeatherSource>, settings())
    }

    #[tokio::test]
    async fn poll_publishes_snapshot() {
        let source = Arc::new(FakeSource::default());
        let coordinator = coordinator(&source);
        let mut rx = coordinator.subscribe();
        assert!(coordinator.snapshot().is_none());

        let snapshot = coordinator.poll().await.unwrap();

        assert_eq!(snapshot.forecast_daily.len(), 5);
        assert_eq!(snapshot.forecast_hourly.len(), 24);
        assert!(rx.has_changed().unwrap());
        let seen = rx.borrow_and_update().clone().unwrap();
        assert!(Arc::ptr_eq(&seen, &snapshot));
        assert_eq!(coordinator.report().temperature(), Some(1.0));
    }

    #[tokio::test]
    async fn failed_fetch_keeps_previous_snapshot() {
        let source = Arc::new(FakeSource::default());
        let coordinator = coordinator(&source);
        let first = coordinator.poll().await.unwrap();

        source.fail_daily.store(true, Ordering::SeqCst);
        let err = coordinator.poll().await.unwrap_err();

        assert!(err.to_string().starts_with("Error communicating with API"));
        assert!(err.to_string().contains("backend down"));
        let kept = coordinator.snapshot().unwrap();
        assert!(Arc::ptr_eq(&kept, &first));
        assert_eq!(coordinator.report().temperature(), Some(1.0));
    }

    #[tokio::test]
    async fn failed_first_refresh_publishes_nothing() {
        let source = Arc::new(FakeSource::default());
        source.fail_daily.store(true, Ordering::SeqCst);
        let coordinator = coordinator(&source);

        assert!(coordinator.first_refresh().await.is_err());
        assert!(coordinator.snapshot().is_none());
        assert!(!coordinator.report().is_available());
    }

    #[tokio::test]
    async fn fetches_run_concurrently() {
        let source = Arc::new(FakeSource {
            barrier: Some(Barrier::new(3)),
            ..FakeSource::default()
        });
        let coordinator = coordinator(&source);

        let result = timeout(Duration::from_secs(5), coordinator.poll()).await;

        assert!(result.expect("fetches must overlap").is_ok());
    }

    #[tokio::test]
    async fn first_failure_ends_the_cycle() {
        let source = Arc::new(FakeSource::default());
        source.fail_current.store(true, Ordering::SeqCst);
        source.hang_hourly.store(true, Ordering::SeqCst);
        let coordinator = coordinator(&source);

        let result = timeout(Duration::from_secs(5), coordinator.poll()).await;

        assert!(matches!(
            result.expect("must not wait for the hanging fetch"),
            Err(UpdateFailed { source: TransportError::Closed })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn run_polls_on_interval_until_shutdown() {
        let source = Arc::new(FakeSource::default());
        let coordinator = coordinator(&source);

        let stop = async {
            tokio::time::sleep(Duration::from_secs(150)).await;
            coordinator.shutdown();
        };
        tokio::join!(coordinator.run(), stop);

        assert_eq!(source.current_calls.load(Ordering::SeqCst), 2);
        assert_eq!(coordinator.report().temperature(), Some(2.0));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_abandons_in_flight_poll() {
        let source = Arc::new(FakeSource::default());
        let coordinator = coordinator(&source);
        coordinator.poll().await.unwrap();
        let before = coordinator.snapshot().unwrap();

        source.hang_hourly.store(true, Ordering::SeqCst);
        let stop = async {
            tokio::time::sleep(Duration::from_secs(90)).await;
            coordinator.shutdown();
        };
        tokio::join!(coordinator.run(), stop);

        assert!(Arc::ptr_eq(&coordinator.snapshot().unwrap(), &before));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_direct_first_refresh() {
        let source = Arc::new(FakeSource::default());
        source.hang_hourly.store(true, Ordering::SeqCst);
        let coordinator = coordinator(&source);

        let stop = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            coordinator.shutdown();
        };
        let (result, ()) = tokio::join!(coordinator.first_refresh(), stop);

        assert!(matches!(result, Err(UpdateFailed { source: TransportError::Cancelled })));
        assert!(coordinator.snapshot().is_none());
    }

    #[tokio::test]
    async fn poll_after_shutdown_publishes_nothing() {
        let source = Arc::new(FakeSource::default());
        let coordinator = coordinator(&source);
        coordinator.shutdown();

        assert!(coordinator.poll().await.is_err());
        assert_eq!(source.current_calls.load(Ordering::SeqCst), 0);
        assert!(coordinator.snapshot().is_none());
    }

    #[tokio::test]
    async fn shutdown_closes_source_once() {
        let source = Arc::new(FakeSource::default());
        let coordinator = coordinator(&source);

        coordinator.shutdown();
        coordinator.shutdown();

        assert!(coordinator.is_shut_down());
        assert_eq!(source.closes.load(Ordering::SeqCst), 1);
        // A cancelled coordinator returns from run immediately.
        timeout(Duration::from_secs(1), coordinator.run()).await.unwrap();
    }
}
