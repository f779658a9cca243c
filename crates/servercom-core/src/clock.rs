//! Server wall-clock tracking.
//!
//! Boards have no RTC; the server's `unix_time` is paired with a local
//! monotonic instant and extrapolated from there.

use crate::{ProtocolError, Status};
use std::time::{Duration, Instant};

/// Seconds between the UNIX epoch and 2020-01-01T00:00:00Z.
const EPOCH_2020: u64 = 1_577_836_800;

/// The server's clock as observed at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerClock {
    unix_time: u64,
    observed_at: Instant,
}

impl ServerClock {
    pub fn new(unix_time: u64, observed_at: Instant) -> Self {
        Self {
            unix_time,
            observed_at,
        }
    }

    /// Anchor a clock to a freshly received status.
    pub fn from_status(status: &Status) -> Result<Self, ProtocolError> {
        let unix_time = status
            .unix_time
            .ok_or(ProtocolError::MissingField("unix_time"))?;
        Ok(Self::new(unix_time, Instant::now()))
    }

    /// Server time at `at`, in seconds since the UNIX epoch.
    pub fn unix_time_at(&self, at: Instant) -> u64 {
        let elapsed = at.saturating_duration_since(self.observed_at);
        self.unix_time.saturating_add(elapsed.as_secs())
    }

    /// Current server time, in seconds since the UNIX epoch.
    pub fn now_unix(&self) -> u64 {
        self.unix_time_at(Instant::now())
    }

    /// Current server time, in seconds since 2020-01-01.
    pub fn now_2020(&self) -> u64 {
        self.now_unix().saturating_sub(EPOCH_2020)
    }

    /// How long ago the clock was anchored.
    pub fn age(&self) -> Duration {
        self.observed_at.elapsed()
    }
}
