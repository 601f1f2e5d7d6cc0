// darksky_exporter - Prometheus metrics exporter for the Dark Sky API
//
// Copyright 2022 Nick Pillitteri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

use std::error;
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

const EVERY_PREFIX: &str = "@every";

#[derive(Debug)]
pub enum ScheduleError {
    Empty,
    Zero,
    Invalid(humantime::DurationError),
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty schedule"),
            Self::Zero => write!(f, "schedule interval must be greater than zero"),
            Self::Invalid(e) => write!(f, "invalid schedule interval: {}", e),
        }
    }
}

impl error::Error for ScheduleError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Invalid(e) => Some(e),
            _ => None,
        }
    }
}

/// Fixed interval to run a task at.
///
/// Parsed from a duration like `2m` or `1h 30m`, optionally prefixed with `@every`
/// (e.g. `@every 2m`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    period: Duration,
}

impl Schedule {
    pub fn every(period: Duration) -> Result<Self, ScheduleError> {
        if period.is_zero() {
            Err(ScheduleError::Zero)
        } else {
            Ok(Schedule { period })
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Run `task` on this schedule forever, starting immediately.
    ///
    /// Runs never overlap: the next run starts only after the previous one has completed.
    /// If a run takes longer than the period, the next run starts as soon as it completes
    /// and ticks that were missed in the meantime are dropped rather than run back to back.
    pub async fn run<F, Fut>(self, mut task: F)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ()>,
    {
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let _ = interval.tick().await;
            task().await;
        }
    }
}

impl FromStr for Schedule {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s.strip_prefix(EVERY_PREFIX).unwrap_or(s).trim();
        if s.is_empty() {
            return Err(ScheduleError::Empty);
        }

        let period = humantime::parse_duration(s).map_err(ScheduleError::Invalid)?;
        Self::every(period)
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", EVERY_PREFIX, humantime::format_duration(self.period))
    }
}
