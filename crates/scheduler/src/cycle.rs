//! One delivery cycle: evaluate, generate, deliver, retry, alert.
//!
//! The countdown is evaluated exactly once per cycle; retries reuse the
//! cached day count so every attempt of a cycle reports the same number.
//! The message itself is regenerated on every attempt.

use std::sync::Arc;

use chrono::NaiveDateTime;
use courier_core::config::TlsMode;
use courier_core::countdown::{Countdown, Remaining};
use courier_llm::encourage::MessageGenerator;
use courier_llm::provider::LlmError;
use courier_mail::traits::{Deliverer, FailureAlert, MailError};
use tracing::{info, warn};

use crate::policy::RetryPolicy;

/// How a cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Countdown mail delivered on the given attempt (1-indexed).
    Delivered { attempts: u32 },
    /// Target instant already reached; nothing to send.
    TargetReached,
    /// Every attempt failed; `alerted` says whether the operator heard.
    Exhausted { attempts: u32, alerted: bool },
}

#[derive(Debug, thiserror::Error)]
enum AttemptError {
    #[error("generate: {0}")]
    Generate(#[from] LlmError),
    #[error("deliver: {0}")]
    Deliver(#[from] MailError),
}

/// Drives one countdown mail from clock check to delivery or alert.
pub struct DailyCycle {
    generator: Arc<dyn MessageGenerator>,
    deliverer: Arc<dyn Deliverer>,
    alert: Arc<dyn FailureAlert>,
    policy: RetryPolicy,
}

impl DailyCycle {
    pub fn new(
        generator: Arc<dyn MessageGenerator>,
        deliverer: Arc<dyn Deliverer>,
        alert: Arc<dyn FailureAlert>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            generator,
            deliverer,
            alert,
            policy,
        }
    }

    /// Run a full cycle for the clock reading `now`.
    pub async fn run(&self, now: NaiveDateTime, target: NaiveDateTime) -> CycleOutcome {
        let remaining = match Countdown::evaluate(now, target) {
            Countdown::Passed => {
                info!(%target, "target date reached, nothing to send");
                return CycleOutcome::TargetReached;
            }
            Countdown::Remaining(r) => r,
        };

        info!(countdown = %remaining, "starting delivery cycle");

        let mut trace: Vec<String> = Vec::new();
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.attempt(&remaining).await {
                Ok(mode) => {
                    info!(attempt, mode = %mode, "cycle complete");
                    return CycleOutcome::Delivered { attempts: attempt };
                }
                Err(e) => {
                    warn!(attempt, max = self.policy.max_attempts, error = %e, "attempt failed");
                    trace.push(format!("attempt {}: {}", attempt, e));
                }
            }

            if !self.policy.should_retry(attempt) {
                break;
            }
            let delay = self.policy.backoff(attempt);
            info!(attempt, delay_secs = delay.as_secs(), "waiting before retry");
            tokio::time::sleep(delay).await;
        }

        let summary = format!(
            "All {} delivery attempts failed; the countdown mail ({} days to go) stayed undelivered.",
            attempt, remaining.days
        );
        let alerted = self.alert.alert(&summary, &trace.join("\n")).await;
        warn!(attempts = attempt, alerted, "cycle exhausted");
        CycleOutcome::Exhausted {
            attempts: attempt,
            alerted,
        }
    }

    async fn attempt(&self, remaining: &Remaining) -> Result<TlsMode, AttemptError> {
        let message = self.generator.generate(remaining.days).await?;
        let mode = self.deliverer.deliver(remaining, &message).await?;
        Ok(mode)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use chrono::NaiveDate;

    use super::*;

    fn at(y: i32, mo: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    struct ScriptedGenerator {
        script: Mutex<VecDeque<Result<String, LlmError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedGenerator {
        fn new(script: Vec<Result<String, LlmError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn always_ok() -> Arc<Self> {
            Self::new(Vec::new())
        }
    }

    #[async_trait::async_trait]
    impl MessageGenerator for ScriptedGenerator {
        async fn generate(&self, _days: u64) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("Keep going.".to_string()))
        }
    }

    struct ScriptedDeliverer {
        script: Mutex<VecDeque<Result<TlsMode, MailError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedDeliverer {
        fn new(script: Vec<Result<TlsMode, MailError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn always_ok() -> Arc<Self> {
            Self::new(Vec::new())
        }
    }

    #[async_trait::async_trait]
    impl Deliverer for ScriptedDeliverer {
        async fn deliver(&self, _remaining: &Remaining, _message: &str) -> Result<TlsMode, MailError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(TlsMode::Implicit))
        }
    }

    struct RecordingAlert {
        reachable: bool,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl RecordingAlert {
        fn new(reachable: bool) -> Arc<Self> {
            Arc::new(Self {
                reachable,
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl FailureAlert for RecordingAlert {
        async fn alert(&self, summary: &str, detail: &str) -> bool {
            self.calls
                .lock()
                .unwrap()
                .push((summary.to_string(), detail.to_string()));
            self.reachable
        }
    }

    fn refused() -> Result<TlsMode, MailError> {
        Err(MailError::Transport("connection refused".into()))
    }

    #[tokio::test]
    async fn first_attempt_success_makes_exactly_one_attempt() {
        let generator = ScriptedGenerator::always_ok();
        let deliverer = ScriptedDeliverer::always_ok();
        let alert = RecordingAlert::new(true);
        let cycle = DailyCycle::new(
            generator.clone(),
            deliverer.clone(),
            alert.clone(),
            fast_policy(3),
        );

        let outcome = cycle.run(at(2025, 12, 1, 8), at(2025, 12, 21, 0)).await;

        assert_eq!(outcome, CycleOutcome::Delivered { attempts: 1 });
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(deliverer.calls.load(Ordering::SeqCst), 1);
        assert!(alert.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn passed_target_sends_nothing() {
        let generator = ScriptedGenerator::always_ok();
        let deliverer = ScriptedDeliverer::always_ok();
        let cycle = DailyCycle::new(
            generator.clone(),
            deliverer.clone(),
            RecordingAlert::new(true),
            fast_policy(3),
        );

        let outcome = cycle.run(at(2025, 12, 21, 0), at(2025, 12, 21, 0)).await;

        assert_eq!(outcome, CycleOutcome::TargetReached);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
        assert_eq!(deliverer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn delivery_failures_are_retried_and_the_message_regenerated() {
        let generator = ScriptedGenerator::always_ok();
        let deliverer = ScriptedDeliverer::new(vec![
            refused(),
            refused(),
            Ok(TlsMode::StartTls),
        ]);
        let alert = RecordingAlert::new(true);
        let cycle = DailyCycle::new(
            generator.clone(),
            deliverer.clone(),
            alert.clone(),
            fast_policy(3),
        );

        let outcome = cycle.run(at(2025, 12, 1, 8), at(2025, 12, 21, 0)).await;

        assert_eq!(outcome, CycleOutcome::Delivered { attempts: 3 });
        // one fresh message per attempt
        assert_eq!(generator.calls.load(Ordering::SeqCst), 3);
        assert_eq!(deliverer.calls.load(Ordering::SeqCst), 3);
        assert!(alert.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn generator_failure_counts_as_a_full_attempt() {
        let generator = ScriptedGenerator::new(vec![
            Err(LlmError::ParseError("empty completion".into())),
            Ok("Better luck.".to_string()),
        ]);
        let deliverer = ScriptedDeliverer::always_ok();
        let cycle = DailyCycle::new(
            generator.clone(),
            deliverer.clone(),
            RecordingAlert::new(true),
            fast_policy(3),
        );

        let outcome = cycle.run(at(2025, 12, 1, 8), at(2025, 12, 21, 0)).await;

        assert_eq!(outcome, CycleOutcome::Delivered { attempts: 2 });
        assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
        // attempt 1 never reached the deliverer
        assert_eq!(deliverer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhaustion_alerts_the_operator_with_the_attempt_trace() {
        let generator = ScriptedGenerator::always_ok();
        let deliverer = ScriptedDeliverer::new(vec![refused(), refused(), refused()]);
        let alert = RecordingAlert::new(true);
        let cycle = DailyCycle::new(
            generator.clone(),
            deliverer.clone(),
            alert.clone(),
            fast_policy(3),
        );

        let outcome = cycle.run(at(2025, 12, 1, 8), at(2025, 12, 21, 0)).await;

        assert_eq!(
            outcome,
            CycleOutcome::Exhausted {
                attempts: 3,
                alerted: true
            }
        );

        let calls = alert.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (summary, detail) = &calls[0];
        assert!(summary.contains("3 delivery attempts failed"), "got: {summary}");
        assert!(summary.contains("19 days to go"), "got: {summary}");
        assert_eq!(detail.lines().count(), 3);
        assert!(detail.lines().next().unwrap().starts_with("attempt 1:"));
        assert!(detail.contains("connection refused"));
    }

    #[tokio::test]
    async fn unreachable_operator_shows_up_in_the_outcome() {
        let deliverer = ScriptedDeliverer::new(vec![refused(), refused(), refused()]);
        let alert = RecordingAlert::new(false);
        let cycle = DailyCycle::new(
            ScriptedGenerator::always_ok(),
            deliverer,
            alert.clone(),
            fast_policy(3),
        );

        let outcome = cycle.run(at(2025, 12, 1, 8), at(2025, 12, 21, 0)).await;

        assert_eq!(
            outcome,
            CycleOutcome::Exhausted {
                attempts: 3,
                alerted: false
            }
        );
        assert_eq!(alert.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn single_attempt_policy_gives_up_immediately() {
        let deliverer = ScriptedDeliverer::new(vec![refused()]);
        let alert = RecordingAlert::new(true);
        let cycle = DailyCycle::new(
            ScriptedGenerator::always_ok(),
            deliverer.clone(),
            alert.clone(),
            fast_policy(1),
        );

        let outcome = cycle.run(at(2025, 12, 1, 8), at(2025, 12, 21, 0)).await;

        assert_eq!(
            outcome,
            CycleOutcome::Exhausted {
                attempts: 1,
                alerted: true
            }
        );
        assert_eq!(deliverer.calls.load(Ordering::SeqCst), 1);
    }
}
