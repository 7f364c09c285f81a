//! Resolved records and the work items that produce them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::keys::{AreaDateKey, AreaKey, EntityKey};
use crate::window::{DateWindow, Horizon};

/// Result of a successful lookup, addressable by its key.
pub trait ResolvedRecord: Clone + Send + Sync + std::fmt::Debug + 'static {
    type Key: EntityKey;

    fn key(&self) -> Self::Key;
}

/// Coordinates for one area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeRecord {
    pub area: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl ResolvedRecord for GeocodeRecord {
    type Key = AreaKey;

    fn key(&self) -> AreaKey {
        AreaKey::new(self.area.clone())
    }
}

/// Daily weather for one area.
///
/// The remote series can contain nulls for individual days; those days are
/// still resolved and stored as nulls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub area: String,
    pub date: NaiveDate,
    pub temperature: Option<f64>,
    pub precipitation: Option<f64>,
}

impl ResolvedRecord for WeatherRecord {
    type Key = AreaDateKey;

    fn key(&self) -> AreaDateKey {
        AreaDateKey::new(self.area.clone(), self.date)
    }
}

/// One geocode lookup to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeocodeWorkItem {
    pub area: String,
}

/// One weather lookup to perform.
///
/// `window` never straddles today; `horizon` says which endpoint serves it.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherWorkItem {
    pub area: String,
    pub latitude: f64,
    pub longitude: f64,
    pub window: DateWindow,
    pub horizon: Horizon,
}

impl WeatherWorkItem {
    /// Build a work item, refusing windows that straddle `today`.
    pub fn new(
        area: impl Into<String>,
        latitude: f64,
        longitude: f64,
        window: DateWindow,
        today: NaiveDate,
    ) -> Result<Self> {
        let horizon = Horizon::of(&window, today).ok_or(Error::StraddlesToday {
            start: window.start,
            end: window.end,
            today,
        })?;
        Ok(Self {
            area: area.into(),
            latitude,
            longitude,
            window,
            horizon,
        })
    }
}
