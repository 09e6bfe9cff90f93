/// Prober module for the linkpulse link checking service
///
/// This module performs the single bounded-timeout reachability probe for
/// one link and classifies the outcome into exactly one of two statuses.
/// All failure modes collapse to `NotAvailable`; the caller never sees an
/// error.
use crate::config::ProbeConfig;
use crate::message::LinkStatus;
use std::time::Duration;

/// One-shot HEAD prober.
///
/// The client disables connection pooling so every probe uses a fresh
/// connection; correctness does not depend on reuse and stale keep-alive
/// sockets would only add noise to the classification.
pub struct Prober {
    client: reqwest::Client,
    request_timeout: Duration,
}

impl Prober {
    pub fn new(config: &ProbeConfig) -> Self {
        let client = reqwest::ClientBuilder::new()
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(0)
            .pool_idle_timeout(Duration::from_secs(0))
            .build()
            .expect("Failed to build reqwest client");

        Self {
            client,
            request_timeout: config.request_timeout,
        }
    }

    /// Probes a single link and returns its status.
    ///
    /// Links without a scheme are probed as `http://<link>`; the caller
    /// keeps the original text as the storage key. A response status below
    /// 400 counts as available; anything else, including transport errors,
    /// timeouts and malformed links, counts as not available.
    pub async fn probe(&self, link: &str) -> LinkStatus {
        let url = if link.starts_with("http://") || link.starts_with("https://") {
            link.to_string()
        } else {
            format!("http://{}", link)
        };

        match self
            .client
            .head(&url)
            .timeout(self.request_timeout)
            .send()
            .await
        {
            Ok(response) if response.status().as_u16() < 400 => LinkStatus::Available,
            Ok(response) => {
                tracing::debug!("{} answered {}", url, response.status());
                LinkStatus::NotAvailable
            }
            Err(e) => {
                tracing::debug!("request failed for {}: {}", url, e);
                LinkStatus::NotAvailable
            }
        }
    }
}
