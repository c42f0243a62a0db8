pub mod average;
pub mod element;
pub mod trend;
pub mod variation;
pub mod window;

pub use average::{ProcessAverages, ProcessKey};
pub use element::{Element, ElementFilter, ElementId, ElementState, TableRow};
pub use trend::{TrendQuery, TrendRecord, TrendResponse, TrendSeries};
pub use variation::{average_difference, format_size, VariationResult};
pub use window::TimeWindow;
