use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ElementId, TimeWindow};

/// Aggregation requested from the trend store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendingType {
    Realtime,
    Average,
}

/// Single trend data point, tagged by kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TrendRecord {
    Average {
        time: DateTime<Utc>,
        average: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minimum: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        maximum: Option<f64>,
    },
    Realtime {
        time: DateTime<Utc>,
        value: f64,
    },
    Minimum {
        time: DateTime<Utc>,
        value: f64,
    },
    Maximum {
        time: DateTime<Utc>,
        value: f64,
    },
}

impl TrendRecord {
    #[cfg(test)]
    pub fn average(time: DateTime<Utc>, average: f64) -> Self {
        Self::Average {
            time,
            average,
            minimum: None,
            maximum: None,
        }
    }

    pub fn time(&self) -> DateTime<Utc> {
        match self {
            Self::Average { time, .. }
            | Self::Realtime { time, .. }
            | Self::Minimum { time, .. }
            | Self::Maximum { time, .. } => *time,
        }
    }

    /// Average value, only for records of the average kind
    pub fn average_value(&self) -> Option<f64> {
        match self {
            Self::Average { average, .. } => Some(*average),
            _ => None,
        }
    }
}

/// Records returned for one `<parameter>/<index>` key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSeries {
    pub key: String,
    #[serde(default)]
    pub records: Option<Vec<TrendRecord>>,
}

impl TrendSeries {
    pub fn new(key: impl Into<String>, records: Vec<TrendRecord>) -> Self {
        Self {
            key: key.into(),
            records: Some(records),
        }
    }

    /// Segment after the first `/` of the key (the table index)
    pub fn index(&self) -> Option<&str> {
        self.key.split('/').nth(1)
    }
}

/// Trend store answer, series in the order the store returned them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendResponse {
    pub series: Vec<TrendSeries>,
}

impl TrendResponse {
    pub fn new(series: Vec<TrendSeries>) -> Self {
        Self { series }
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Batched historical query for one parameter over many table indices
#[derive(Debug, Clone, PartialEq)]
pub struct TrendQuery {
    pub element: ElementId,
    pub parameter_id: i32,
    pub indices: Vec<String>,
    pub window: TimeWindow,
    pub trending_type: TrendingType,
}

impl TrendQuery {
    pub fn average(
        element: ElementId,
        parameter_id: i32,
        indices: Vec<String>,
        window: TimeWindow,
    ) -> Self {
        Self {
            element,
            parameter_id,
            indices,
            window,
            trending_type: TrendingType::Average,
        }
    }
}
