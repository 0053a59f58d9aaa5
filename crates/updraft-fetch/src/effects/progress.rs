use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use super::pipeline::Stage;
use crate::data::Progress;
use crate::error::{Error, Result};

const REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Pass-through stage counting bytes against a known total.
///
/// Reports at most once per second while data flows, then once more with
/// 100% when the stream ends.
pub struct ProgressStage {
    total:       u64,
    transferred: u64,
    delta:       u64,
    start:       Instant,
    next_report: Instant,
    token:       CancellationToken,
    callback:    Arc<dyn Fn(&Progress) + Send + Sync>,
}

impl ProgressStage {
    pub fn new(
        total: u64,
        token: CancellationToken,
        callback: Arc<dyn Fn(&Progress) + Send + Sync>,
    ) -> Self {
        let start = Instant::now();
        Self {
            total,
            transferred: 0,
            delta: 0,
            start,
            next_report: start + REPORT_INTERVAL,
            token,
            callback,
        }
    }

    fn report(&mut self, transferred: u64, percent: f64, now: Instant) {
        let elapsed = now.duration_since(self.start).as_secs_f64();
        let bytes_per_second = if elapsed > 0.0 {
            (self.transferred as f64 / elapsed).round()
        } else {
            0.0
        };
        (self.callback)(&Progress {
            total: self.total,
            delta: self.delta,
            transferred,
            percent,
            bytes_per_second,
        });
        self.delta = 0;
    }
}

impl Stage for ProgressStage {
    fn process(&mut self, chunk: Bytes) -> Result<Bytes> {
        if self.token.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let len = chunk.len() as u64;
        self.transferred += len;
        self.delta += len;

        let now = Instant::now();
        if now >= self.next_report && self.transferred != self.total {
            self.next_report = now + REPORT_INTERVAL;
            let percent = if self.total == 0 {
                0.0
            } else {
                self.transferred as f64 / self.total as f64 * 100.0
            };
            self.report(self.transferred, percent, now);
        }

        Ok(chunk)
    }

    fn finish(&mut self) -> Result<()> {
        if self.token.is_cancelled() {
            return Err(Error::Cancelled);
        }
        self.report(self.total, 100.0, Instant::now());
        Ok(())
    }
}
