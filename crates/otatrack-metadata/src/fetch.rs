//! Rate-limited package transfer

use std::time::Duration;

use reqwest::{Client, Response};
use tokio::time::Instant;
use tracing::debug;

use crate::error::ExtractError;
use crate::stage::{Flow, Pipeline};

/// Default transfer rate, 100 KiB/s
pub const DEFAULT_RATE_LIMIT: u64 = 100 * 1024;

/// Paces a transfer to an average byte rate
#[derive(Debug)]
pub struct RateLimiter {
    bytes_per_sec: Option<u64>,
    started: Instant,
    consumed: u64,
}

impl RateLimiter {
    /// Limit to `bytes_per_sec`; `None` or zero disables pacing
    pub fn new(bytes_per_sec: Option<u64>) -> Self {
        Self {
            bytes_per_sec: bytes_per_sec.filter(|rate| *rate > 0),
            started: Instant::now(),
            consumed: 0,
        }
    }

    /// Account for `bytes` and return how long to wait before reading more
    pub fn record(&mut self, bytes: usize) -> Duration {
        self.consumed = self.consumed.saturating_add(bytes as u64);
        let Some(rate) = self.bytes_per_sec else {
            return Duration::ZERO;
        };
        let nanos = u128::from(self.consumed) * 1_000_000_000 / u128::from(rate);
        let due = Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX));
        due.saturating_sub(self.started.elapsed())
    }

    /// Account for `bytes`, sleeping as long as the rate requires
    pub async fn throttle(&mut self, bytes: usize) {
        let wait = self.record(bytes);
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }
}

/// An open package transfer
///
/// Owns the HTTP response; dropping it closes the connection.
#[derive(Debug)]
pub struct Fetch {
    response: Response,
    limiter: RateLimiter,
    received: u64,
}

impl Fetch {
    /// Start downloading `url`
    pub async fn open(
        http: &Client,
        url: &str,
        rate_limit: Option<u64>,
    ) -> Result<Self, ExtractError> {
        let response = http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::Status {
                status: status.as_u16(),
            });
        }
        debug!(%url, length = ?response.content_length(), "package transfer started");
        Ok(Self {
            response,
            limiter: RateLimiter::new(rate_limit),
            received: 0,
        })
    }

    /// Stream the body into `pipeline` until it is done or the body ends
    ///
    /// Returns the number of body bytes read. The transfer is closed on return.
    pub async fn drive(mut self, pipeline: &mut Pipeline) -> Result<u64, ExtractError> {
        while let Some(chunk) = self.response.chunk().await? {
            self.received += chunk.len() as u64;
            if pipeline.push(&chunk)? == Flow::Done {
                debug!(received = self.received, "pipeline complete, closing transfer");
                return Ok(self.received);
            }
            self.limiter.throttle(chunk.len()).await;
        }
        pipeline.finish()?;
        debug!(received = self.received, "package body ended");
        Ok(self.received)
    }
}
