/// HTTP delivery of uplink payloads to the remote collector.
///
/// At-most-once semantics: one payload per accepted frame, delivered
/// within a bounded retry budget and then forgotten. A failed delivery
/// is logged and dropped; nothing is queued or rolled back.
use log::{error, info, warn};

use crate::config::MonitorConfig;
use crate::protocol::UplinkPayload;

/// Collector endpoint path, per the externally-agreed contract.
pub const SEND_DATA_PATH: &str = "/send-data";

/// Visible, testable retry budget. No backoff between attempts.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy { max_attempts: 2 }
    }
}

/// Hook invoked once after a connection-level failure, before the final
/// attempt. Stands in for WiFi re-association, which is outside this
/// component; the default does nothing.
pub trait ReconnectHook {
    fn reconnect(&mut self);
}

#[derive(Debug, Default)]
pub struct NoReconnect;

impl ReconnectHook for NoReconnect {
    fn reconnect(&mut self) {}
}

pub struct Uplink<R: ReconnectHook> {
    client: reqwest::Client,
    endpoint: String,
    policy: RetryPolicy,
    recovery: R,
}

impl Uplink<NoReconnect> {
    pub fn new(config: &MonitorConfig) -> Result<Self, reqwest::Error> {
        Uplink::with_recovery(config, RetryPolicy::default(), NoReconnect)
    }
}

impl<R: ReconnectHook> Uplink<R> {
    pub fn with_recovery(
        config: &MonitorConfig,
        policy: RetryPolicy,
        recovery: R,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.uplink_timeout)
            .build()?;
        Ok(Uplink {
            client,
            endpoint: format!("{}{}", config.collector_base_url, SEND_DATA_PATH),
            policy,
            recovery,
        })
    }

    /// POST one payload to the collector. Returns whether delivery
    /// succeeded; either way the payload is not retained. Any HTTP
    /// status is accepted and logged, non-2xx counting as a failure.
    pub async fn deliver(&mut self, payload: &UplinkPayload) -> bool {
        for attempt in 1..=self.policy.max_attempts {
            match self.client.post(&self.endpoint).json(payload).send().await {
                Ok(response) if response.status().is_success() => {
                    info!(
                        "Delivered frame to collector (attempt {}, status {})",
                        attempt,
                        response.status()
                    );
                    return true;
                }
                Ok(response) => {
                    warn!(
                        "Collector returned {} on attempt {}",
                        response.status(),
                        attempt
                    );
                }
                Err(e) => {
                    warn!("Uplink request failed on attempt {}: {}", attempt, e);
                    // Loss of association gets one recovery attempt
                    // before the remaining budget is spent.
                    if attempt < self.policy.max_attempts {
                        self.recovery.reconnect();
                    }
                }
            }
        }
        error!(
            "Frame not delivered after {} attempts, dropping",
            self.policy.max_attempts
        );
        false
    }
}
