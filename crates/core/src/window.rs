//! Inclusive calendar windows and the splitting rules applied before dispatch.
//!
//! The weather service exposes an archive endpoint for past dates and a
//! forecast endpoint for today onwards, so every dispatched window must sit
//! entirely on one side of today. Windows are also capped at a fixed number
//! of days per request.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Default maximum number of days requested in one weather call.
pub const DEFAULT_CHUNK_DAYS: u32 = 365;

/// Which side of today a window lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Horizon {
    /// Every date is before today (archive endpoint).
    Past,
    /// Every date is today or later (forecast endpoint).
    Future,
}

impl Horizon {
    /// Classify a window, or `None` when it straddles today.
    pub fn of(window: &DateWindow, today: NaiveDate) -> Option<Self> {
        if window.end < today {
            Some(Self::Past)
        } else if window.start >= today {
            Some(Self::Future)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Past => "past",
            Self::Future => "future",
        }
    }
}

/// `[start, end]`, both inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(Error::internal(format!(
                "window start {} is after end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    pub fn single(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    pub fn len_days(&self) -> u32 {
        (self.end - self.start).num_days() as u32 + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Every date in the window, ascending.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }

    /// Split into consecutive windows of at most `chunk_days` days.
    pub fn chunks(&self, chunk_days: u32) -> Vec<DateWindow> {
        let step = Duration::days(i64::from(chunk_days.max(1)) - 1);
        let mut out = Vec::new();
        let mut current = self.start;

        while current <= self.end {
            let chunk_end = (current + step).min(self.end);
            out.push(DateWindow {
                start: current,
                end: chunk_end,
            });
            match chunk_end.succ_opt() {
                Some(next) => current = next,
                None => break,
            }
        }

        out
    }

    /// Split at the today boundary. Yields one or two windows, none straddling.
    pub fn split_at_today(&self, today: NaiveDate) -> Vec<(Horizon, DateWindow)> {
        if let Some(horizon) = Horizon::of(self, today) {
            return vec![(horizon, *self)];
        }

        // start < today <= end, so today has a predecessor inside the window.
        let yesterday = today.pred_opt().unwrap_or(today);
        vec![
            (
                Horizon::Past,
                DateWindow {
                    start: self.start,
                    end: yesterday,
                },
            ),
            (
                Horizon::Future,
                DateWindow {
                    start: today,
                    end: self.end,
                },
            ),
        ]
    }

    /// Today split followed by chunking: the exact set of requests to issue.
    pub fn dispatch_plan(&self, today: NaiveDate, chunk_days: u32) -> Vec<(Horizon, DateWindow)> {
        self.split_at_today(today)
            .into_iter()
            .flat_map(|(horizon, half)| {
                half.chunks(chunk_days)
                    .into_iter()
                    .map(move |chunk| (horizon, chunk))
            })
            .collect()
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.start, self.end)
    }
}

/// Collapse dates into maximal runs of consecutive days.
///
/// Input need not be sorted; duplicates are ignored.
pub fn contiguous_runs(dates: &[NaiveDate]) -> Vec<DateWindow> {
    let mut sorted = dates.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut runs: Vec<DateWindow> = Vec::new();
    for date in sorted {
        match runs.last_mut() {
            Some(run) if run.end.succ_opt() == Some(date) => run.end = date,
            _ => runs.push(DateWindow::single(date)),
        }
    }
    runs
}
