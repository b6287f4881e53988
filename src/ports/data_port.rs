//! Data access port trait.

use crate::domain::bar::BarSeries;
use crate::domain::error::EngineError;
use chrono::NaiveDate;

/// Supplies a resident bar series for one instrument.
pub trait DataPort {
    fn fetch_series(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<BarSeries, EngineError>;
}
