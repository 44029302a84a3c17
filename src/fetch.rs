use std::time::Duration;

use reqwest::Client;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::error::FetchError;

const BASE_BACKOFF_MS: u64 = 2000;

/// Shared minimum spacing between successive requests.
pub struct RateGate {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateGate {
    pub fn new(interval: Duration) -> Self {
        RateGate {
            interval,
            next_slot: Mutex::new(None),
        }
    }

    /// Waits until this caller's slot comes up. Slots are handed out in
    /// lock order, each `interval` after the previous one.
    pub async fn wait(&self) {
        let slot = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match *next {
                Some(t) if t > now => t,
                _ => now,
            };
            *next = Some(slot + self.interval);
            slot
        };
        tokio::time::sleep_until(slot).await;
    }
}

pub struct GuideFetcher {
    client: Client,
    gate: RateGate,
    max_retries: u32,
}

impl GuideFetcher {
    pub fn new(settings: &Settings, rate_limit: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(GuideFetcher {
            client,
            gate: RateGate::new(rate_limit),
            max_retries: settings.max_retries,
        })
    }

    /// Fetch a guide page, retrying throttling, timeouts and server errors
    /// with exponential backoff.
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(url).await {
                Ok(html) => return Ok(html),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let backoff = Duration::from_millis(BASE_BACKOFF_MS * 2u64.pow(attempt));
                    warn!(
                        "{} (attempt {}/{}), backing off {:.1}s",
                        e,
                        attempt + 1,
                        self.max_retries,
                        backoff.as_secs_f64()
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_once(&self, url: &str) -> Result<String, FetchError> {
        self.gate.wait().await;
        let start = Instant::now();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| FetchError::from_reqwest(url, e))?;
        let html = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;
        debug!(url, bytes = html.len(), latency_ms = start.elapsed().as_millis() as u64, "fetched");
        Ok(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn rate_gate_spaces_requests() {
        let gate = RateGate::new(Duration::from_secs(2));
        let start = Instant::now();
        gate.wait().await;
        gate.wait().await;
        gate.wait().await;
        assert!(start.elapsed() >= Duration::from_secs(4));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn idle_gate_does_not_delay() {
        let gate = RateGate::new(Duration::from_secs(2));
        gate.wait().await;
        tokio::time::sleep(Duration::from_secs(10)).await;
        let before = Instant::now();
        gate.wait().await;
        assert!(before.elapsed() < Duration::from_millis(1));
    }
}
