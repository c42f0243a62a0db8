pub mod element_source;
pub mod result_sink;
pub mod trend_source;

pub use element_source::ElementSource;
pub use result_sink::ResultSink;
pub use trend_source::TrendSource;
