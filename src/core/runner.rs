//! The publish loop.
//!
//! The `Runner` drives the indefinite cycle: generate a measurement,
//! serialize it, send it through the transport, classify and log the
//! outcome, then sleep a fixed delay and go again. Transport and protocol
//! failures are recoverable: the cycle is logged as failed and the loop
//! continues at its fixed cadence, with no failure cap, no backoff growth,
//! and no circuit breaker. Every cycle is independent.
//!
//! The transport and the measurement source are injected behind narrow
//! traits so tests can script exchanges and feed deterministic readings
//! without touching the network. The cancellation token is the only stop
//! signal; normal operation never exits.

use std::sync::Arc;

use tokio::{
    sync::watch,
    time::{sleep, Duration},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use thermopost_https::{HttpsTransport, WireResponse};

use super::{measurement::MeasurementSource, outcome::PublishOutcome, state::CycleState};
use crate::config::publisher::PublisherConfig;

/// Trait for transports that can carry one payload to the endpoint.
///
/// Deliberately narrow: one call, full response or error. Failure
/// injection in tests is a two-line mock.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Delivers the payload and resolves once a full response (status +
    /// body) has been read, or the exchange has failed.
    async fn send(
        &self,
        payload: &[u8],
    ) -> Result<WireResponse, Box<dyn std::error::Error + Send + Sync>>;
}

/// Production transport: the blocking HTTPS exchange, run on the blocking
/// pool and awaited to completion so the loop stays strictly sequential.
#[async_trait::async_trait]
impl Transport for HttpsTransport {
    async fn send(
        &self,
        payload: &[u8],
    ) -> Result<WireResponse, Box<dyn std::error::Error + Send + Sync>> {
        let transport = self.clone();
        let payload = payload.to_vec();
        let response = tokio::task::spawn_blocking(move || transport.send_blocking(&payload))
            .await
            .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)??;
        Ok(response)
    }
}

/// Drives the publish cycle until cancelled.
pub struct Runner {
    transport: Arc<dyn Transport>,
    source: Box<dyn MeasurementSource>,
    config: Arc<PublisherConfig>,
    cancel: CancellationToken,
    state_tx: watch::Sender<CycleState>,
    state_rx: watch::Receiver<CycleState>,
}

impl Runner {
    /// Creates a new runner.
    ///
    /// # Arguments
    /// * `transport` - the wire transport, shared and reused across all cycles
    /// * `source` - measurement source, one reading per cycle
    /// * `config` - publish timing configuration
    /// * `cancel` - stop signal; the loop finishes its in-flight cycle and exits
    pub fn new(
        transport: Arc<dyn Transport>,
        source: Box<dyn MeasurementSource>,
        config: Arc<PublisherConfig>,
        cancel: CancellationToken,
    ) -> Self {
        let (state_tx, state_rx) = watch::channel(CycleState::Idle);
        Self {
            transport,
            source,
            config,
            cancel,
            state_tx,
            state_rx,
        }
    }

    /// Subscribes to cycle state changes (`Idle`/`Publishing`).
    ///
    /// The receiver sees the current state immediately upon subscription.
    pub fn subscribe_state(&self) -> watch::Receiver<CycleState> {
        self.state_rx.clone()
    }

    /// Updates the cycle state and notifies subscribers. Only broadcasts
    /// on an actual change.
    fn update_state(&self, state: CycleState) {
        let changed = *self.state_tx.borrow() != state;
        if changed {
            let _ = self.state_tx.send(state);
            debug!("Cycle state changed to: {}", state);
        }
    }

    /// Runs the publish loop until the cancellation token fires.
    ///
    /// Each iteration performs one full cycle, then sleeps the fixed
    /// configured delay regardless of the cycle's outcome. The delay
    /// follows the response; cycle starts are not aligned to a schedule.
    pub async fn run(mut self) {
        let interval = Duration::from_millis(self.config.interval_ms);
        info!(
            "Publish loop started (interval: {} ms)",
            self.config.interval_ms
        );

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            self.cycle().await;

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = sleep(interval) => {}
            }
        }

        info!("Publish loop stopped");
    }

    /// One publish cycle: generate, serialize, send, classify, log.
    ///
    /// Never returns an error; every outcome, including transport
    /// failure, is logged exactly once and absorbed here.
    async fn cycle(&mut self) {
        let record = self.source.generate();
        let payload = match serde_json::to_vec(&record) {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to serialize measurement: {}", e);
                return;
            }
        };

        debug!("Publishing {}", String::from_utf8_lossy(&payload));
        self.update_state(CycleState::Publishing);

        let outcome = match self.transport.send(&payload).await {
            Ok(response) => PublishOutcome::classify(response),
            Err(e) => PublishOutcome::failed(e.to_string()),
        };

        self.update_state(CycleState::Idle);

        match &outcome {
            PublishOutcome::Delivered { body, .. } => info!("Publish acknowledged: {}", body),
            PublishOutcome::Rejected { status, body } => {
                warn!("Publish rejected (status {}): {}", status, body)
            }
            PublishOutcome::Failed { reason } => error!("Publish failed: {}", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::VecDeque, sync::Mutex};

    use tracing_test::traced_test;

    use super::*;
    use crate::core::measurement::RandomMeasurementSource;

    type ScriptEntry = Result<WireResponse, String>;

    /// Transport mock driven by a queue of scripted exchanges. Once the
    /// script runs dry it parks forever, so tests observe an exact number
    /// of cycles.
    struct ScriptedTransport {
        script: Mutex<VecDeque<ScriptEntry>>,
        sent: Mutex<Vec<Vec<u8>>>,
    }

    impl ScriptedTransport {
        fn new(entries: Vec<ScriptEntry>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(entries.into()),
                sent: Mutex::new(Vec::new()),
            })
        }

        fn ok(status: u16, body: &str) -> ScriptEntry {
            Ok(WireResponse {
                status,
                body: body.to_string(),
            })
        }

        fn sent_count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }

        fn last_payload(&self) -> Vec<u8> {
            self.sent.lock().unwrap().last().cloned().unwrap_or_default()
        }
    }

    #[async_trait::async_trait]
    impl Transport for ScriptedTransport {
        async fn send(
            &self,
            payload: &[u8],
        ) -> Result<WireResponse, Box<dyn std::error::Error + Send + Sync>> {
            self.sent.lock().unwrap().push(payload.to_vec());
            let next = self.script.lock().unwrap().pop_front();
            match next {
                Some(Ok(response)) => Ok(response),
                Some(Err(reason)) => Err(reason.into()),
                None => std::future::pending().await,
            }
        }
    }

    fn runner_with(
        transport: Arc<ScriptedTransport>,
        interval_ms: u64,
        cancel: CancellationToken,
    ) -> Runner {
        Runner::new(
            transport,
            Box::new(RandomMeasurementSource::new()),
            Arc::new(PublisherConfig { interval_ms }),
            cancel,
        )
    }

    async fn wait_until(deadline_ms: u64, mut cond: impl FnMut() -> bool) -> bool {
        for _ in 0..(deadline_ms / 5).max(1) {
            if cond() {
                return true;
            }
            sleep(Duration::from_millis(5)).await;
        }
        cond()
    }

    #[tokio::test]
    #[traced_test]
    async fn delivered_response_is_logged_at_info() {
        let transport =
            ScriptedTransport::new(vec![ScriptedTransport::ok(200, "{\"message\":\"OK\"}")]);
        let runner = runner_with(transport.clone(), 1, CancellationToken::new());
        let handle = tokio::spawn(runner.run());

        assert!(wait_until(500, || transport.sent_count() >= 1).await);
        sleep(Duration::from_millis(20)).await;

        assert!(logs_contain("Publish acknowledged"));
        assert!(logs_contain("{\"message\":\"OK\"}"));

        let payload = String::from_utf8(transport.last_payload()).unwrap();
        assert!(payload.contains("thermostatID"));

        handle.abort();
    }

    #[tokio::test]
    #[traced_test]
    async fn rejected_response_logs_the_body() {
        let transport = ScriptedTransport::new(vec![ScriptedTransport::ok(403, "ERROR: bad cert")]);
        let runner = runner_with(transport.clone(), 1, CancellationToken::new());
        let handle = tokio::spawn(runner.run());

        assert!(wait_until(500, || transport.sent_count() >= 1).await);
        sleep(Duration::from_millis(20)).await;

        assert!(logs_contain("Publish rejected"));
        assert!(logs_contain("ERROR: bad cert"));
        assert!(!logs_contain("Publish acknowledged"));

        handle.abort();
    }

    #[tokio::test]
    #[traced_test]
    async fn transport_failure_does_not_stop_the_loop() {
        let transport = ScriptedTransport::new(vec![
            Err("connection refused".to_string()),
            ScriptedTransport::ok(200, "OK"),
        ]);
        let runner = runner_with(transport.clone(), 1, CancellationToken::new());
        let handle = tokio::spawn(runner.run());

        // The loop must survive the failed cycle and publish again after
        // the fixed delay.
        assert!(wait_until(500, || transport.sent_count() >= 2).await);
        sleep(Duration::from_millis(20)).await;

        assert!(logs_contain("Publish failed"));
        assert!(logs_contain("connection refused"));
        assert!(logs_contain("Publish acknowledged"));

        handle.abort();
    }

    #[tokio::test]
    #[traced_test]
    async fn alternating_outcomes_log_once_per_cycle() {
        let transport = ScriptedTransport::new(vec![
            ScriptedTransport::ok(200, "ack OK one"),
            ScriptedTransport::ok(200, "ERROR: throttled"),
            Err("connection reset by peer".to_string()),
            ScriptedTransport::ok(200, "ack OK two"),
        ]);
        let runner = runner_with(transport.clone(), 1, CancellationToken::new());
        let handle = tokio::spawn(runner.run());

        assert!(wait_until(1000, || transport.sent_count() >= 4).await);
        sleep(Duration::from_millis(20)).await;

        // Four cycles, four outcome entries, no duplication or
        // suppression.
        logs_assert(|lines: &[&str]| {
            let markers = [
                "ack OK one",
                "ERROR: throttled",
                "connection reset by peer",
                "ack OK two",
            ];
            for marker in markers {
                let hits = lines.iter().filter(|line| line.contains(marker)).count();
                if hits != 1 {
                    return Err(format!("expected exactly 1 log for {marker:?}, got {hits}"));
                }
            }
            Ok(())
        });

        handle.abort();
    }

    #[tokio::test]
    async fn state_is_publishing_while_a_request_is_in_flight() {
        // An empty script parks the first send forever.
        let transport = ScriptedTransport::new(vec![]);
        let runner = runner_with(transport.clone(), 1000, CancellationToken::new());
        let mut state_rx = runner.subscribe_state();
        assert_eq!(*state_rx.borrow(), CycleState::Idle);

        let handle = tokio::spawn(runner.run());

        state_rx.changed().await.unwrap();
        assert_eq!(*state_rx.borrow(), CycleState::Publishing);

        handle.abort();
    }

    #[tokio::test]
    async fn cancelled_runner_stops_after_the_current_cycle() {
        let transport = ScriptedTransport::new(vec![ScriptedTransport::ok(200, "OK")]);
        let cancel = CancellationToken::new();
        let runner = runner_with(transport.clone(), 60_000, cancel.clone());
        let handle = tokio::spawn(runner.run());

        assert!(wait_until(500, || transport.sent_count() >= 1).await);
        cancel.cancel();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("loop should stop after cancellation")
            .unwrap();
    }

    #[tokio::test]
    async fn pre_cancelled_runner_never_publishes() {
        let transport = ScriptedTransport::new(vec![]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let runner = runner_with(transport.clone(), 1, cancel);
        tokio::time::timeout(Duration::from_secs(1), runner.run())
            .await
            .unwrap();

        assert_eq!(transport.sent_count(), 0);
    }
}
