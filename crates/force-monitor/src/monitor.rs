//! Composition root: wires the buffer host, listener and consumer cycle

use crate::error::AppError;
use crate::settings::AppConfig;
use force_buffer::{BufferEvent, BufferHost, PollingNotifier, Reading};
use metrics::gauge;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use udp_listener::UdpForceListener;

/// Running force monitor
pub struct Monitor {
    config: AppConfig,
    host: BufferHost,
    listener: Arc<UdpForceListener>,
    notifier: PollingNotifier,
}

impl Monitor {
    /// Build the monitor. Nothing is bound until [`start`](Self::start).
    pub fn new(config: AppConfig) -> Self {
        let host = BufferHost::new();
        let listener = Arc::new(UdpForceListener::new(
            config.listener.to_listener_config(),
            host.clone(),
        ));
        let notifier = PollingNotifier::new(host.clone());

        host.events().subscribe(|event| {
            if let BufferEvent::NewValue(reading) = event {
                debug!("Force: {:.2}", reading.value());
            }
        });

        Self {
            config,
            host,
            listener,
            notifier,
        }
    }

    /// Buffer host shared with the listener
    pub fn host(&self) -> &BufferHost {
        &self.host
    }

    /// UDP listener
    pub fn listener(&self) -> &Arc<UdpForceListener> {
        &self.listener
    }

    /// Initialize the buffer and start listening, retrying failed binds
    pub async fn start(&self) -> Result<SocketAddr, AppError> {
        self.host.init(self.config.buffer.capacity())?;

        match self.start_listener().await {
            Ok(addr) => Ok(addr),
            Err(e) => {
                self.host.teardown();
                Err(e)
            }
        }
    }

    async fn start_listener(&self) -> Result<SocketAddr, AppError> {
        let attempts = self.config.monitor.bind_retries.max(1);
        let backoff = Duration::from_millis(self.config.monitor.retry_backoff_ms);

        let mut attempt = 1;
        loop {
            match self.listener.start().await {
                Ok(addr) => return Ok(addr),
                Err(e) if attempt < attempts => {
                    warn!(
                        "Listener start failed (attempt {}/{}): {}",
                        attempt, attempts, e
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// One consumer cycle: deliver at most one new reading
    pub fn cycle(&self) -> Option<Reading> {
        self.notifier.poll()
    }

    /// Run consumer cycles until `shutdown` completes
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let period = Duration::from_secs_f64(1.0 / self.config.monitor.poll_hz.max(1) as f64);
        let mut cycles = tokio::time::interval(period);
        cycles.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let stats_period = Duration::from_secs(self.config.monitor.stats_interval_secs.max(1));
        let mut stats = tokio::time::interval_at(tokio::time::Instant::now() + stats_period, stats_period);

        tokio::pin!(shutdown);
        info!("Consumer cycle running at {} Hz", self.config.monitor.poll_hz.max(1));

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = cycles.tick() => {
                    self.cycle();
                }
                _ = stats.tick() => self.log_stats(),
            }
        }
    }

    fn log_stats(&self) {
        let stats = self.listener.stats().snapshot();
        let buffered = self.host.get().map(|b| b.len()).unwrap_or(0);
        gauge!("force_buffer_len").set(buffered as f64);
        info!(
            "Datagrams: {}, readings: {}, parse failures: {}, transport errors: {}, buffered: {}",
            stats.datagrams, stats.readings, stats.parse_failures, stats.transport_errors, buffered
        );
    }

    /// Stop the listener and release the buffer
    pub async fn shutdown(&self) {
        info!("Shutting down force monitor");
        self.listener.stop().await;
        self.host.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ListenerSettings;
    use std::net::{IpAddr, Ipv4Addr};

    fn loopback_config(port: i64) -> AppConfig {
        AppConfig {
            listener: ListenerSettings {
                bind_ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
                port,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_end_to_end_cycle() {
        let monitor = Monitor::new(loopback_config(0));
        let addr = monitor.start().await.unwrap();
        assert!(monitor.host().is_active());

        let client = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
        client.send_to(b"force=1.5", addr).await.unwrap();
        client.send_to(b"force=2.5", addr).await.unwrap();

        let buffer = monitor.host().get().unwrap();
        for _ in 0..400 {
            if buffer.len() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert_eq!(monitor.cycle(), Some(Reading::new(2.5)));
        assert_eq!(monitor.cycle(), None);
        assert_eq!(buffer.len(), 2);

        monitor.shutdown().await;
        assert!(!monitor.host().is_active());
        assert!(!monitor.listener().is_running());
    }

    #[tokio::test]
    async fn test_start_failure_releases_buffer() {
        let occupied = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        let port = occupied.local_addr().unwrap().port();

        let mut config = loopback_config(port as i64);
        config.monitor.bind_retries = 2;
        config.monitor.retry_backoff_ms = 1;
        let monitor = Monitor::new(config);

        let err = monitor.start().await.unwrap_err();
        assert!(matches!(err, AppError::Listener(_)));
        assert!(!monitor.host().is_active());
    }

    #[tokio::test]
    async fn test_huge_configured_capacity_starts() {
        let mut config = loopback_config(0);
        config.buffer.capacity = i64::MAX;
        let monitor = Monitor::new(config);

        monitor.start().await.unwrap();
        let buffer = monitor.host().get().unwrap();
        buffer.insert(3.0);
        assert_eq!(buffer.len(), 1);
        assert_eq!(monitor.cycle(), Some(Reading::new(3.0)));

        monitor.shutdown().await;
    }

    #[tokio::test]
    async fn test_run_until_returns_on_shutdown() {
        let monitor = Monitor::new(loopback_config(0));
        monitor.start().await.unwrap();

        monitor
            .run_until(tokio::time::sleep(Duration::from_millis(30)))
            .await;

        monitor.shutdown().await;
        monitor.shutdown().await;
    }
}
