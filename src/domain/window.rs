use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Closed time interval bounding a trend query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Window of length `span` that ends at `end`
    pub fn ending_at(end: DateTime<Utc>, span: Duration) -> Self {
        Self::new(end - span, end)
    }

    /// Window of length `span` that starts at `start`
    pub fn starting_at(start: DateTime<Utc>, span: Duration) -> Self {
        Self::new(start, start + span)
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }
}
