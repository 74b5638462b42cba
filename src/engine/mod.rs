//! Pure aggregation and forecasting over utilization entries.
//!
//! Nothing in this module performs I/O or touches the session: handlers
//! snapshot the record store first and hand the in-memory entries (plus the
//! configured policies) to these functions, so the same input always produces
//! the same output.

pub mod aggregate;
pub mod forecast;

pub use aggregate::{
    aggregate, team_average_series, AggregateOptions, ClipPolicy, EntryFilter, GroupBy,
    WeekPolicy, WeeklySummary,
};
pub use forecast::{forecast, ForecastError, ForecastPoint};
