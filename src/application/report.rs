use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::config::{Config, ConfigError};
use crate::domain::{
    average_difference, format_size, Element, ElementFilter, ElementId, ProcessAverages,
    ProcessKey, TimeWindow, TrendQuery, VariationResult,
};
use crate::error::{ScriptError, ScriptResult, Termination};
use crate::ports::{ElementSource, ResultSink, TrendSource};

/// Name of the script output carrying the results
pub const RESULT_OUTPUT_KEY: &str = "result";

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Platform ids and window lengths used by a run
#[derive(Debug, Clone)]
pub struct ReportSettings {
    pub protocol: String,
    pub vm_size_parameter: i32,
    pub process_table: i32,
    pub computer_name_parameter: i32,
    pub recent_span: Duration,
    pub reference_offset: Duration,
}

impl ReportSettings {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;

        let recent_span = Duration::try_hours(config.recent_hours).ok_or_else(|| {
            ConfigError::Invalid(format!("recent_hours out of range: {}", config.recent_hours))
        })?;
        let reference_offset = Duration::try_days(config.reference_days_back).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "reference_days_back out of range: {}",
                config.reference_days_back
            ))
        })?;

        Ok(Self {
            protocol: config.protocol.clone(),
            vm_size_parameter: config.vm_size_parameter,
            process_table: config.process_table,
            computer_name_parameter: config.computer_name_parameter,
            recent_span,
            reference_offset,
        })
    }
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            protocol: "Microsoft Platform".to_string(),
            vm_size_parameter: 99,
            process_table: 96,
            computer_name_parameter: 165,
            recent_span: Duration::hours(24),
            reference_offset: Duration::days(7),
        }
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub elements: usize,
    pub results: usize,
}

/// Average VM size per process over one window, using one batched query.
pub async fn average_vm_sizes(
    trend_source: &dyn TrendSource,
    element: &ElementId,
    vm_size_parameter: i32,
    process_names: &[String],
    window: TimeWindow,
) -> ScriptResult<ProcessAverages> {
    let query = TrendQuery::average(*element, vm_size_parameter, process_names.to_vec(), window);
    let response = trend_source.get_trend_data(&query).await?;

    let mut averages = ProcessAverages::new();
    averages.absorb(&response)?;

    debug!(
        "{}: {} averages for {} processes between {} and {}",
        element,
        averages.len(),
        process_names.len(),
        window.start,
        window.end
    );

    Ok(averages)
}

/// Builds the 7-day VM size variation report for all monitored hosts
pub struct ReportService {
    element_source: Arc<dyn ElementSource>,
    trend_source: Arc<dyn TrendSource>,
    result_sink: Arc<dyn ResultSink>,
    settings: ReportSettings,
    clock: Clock,
}

impl ReportService {
    pub fn new(
        element_source: Arc<dyn ElementSource>,
        trend_source: Arc<dyn TrendSource>,
        result_sink: Arc<dyn ResultSink>,
        settings: ReportSettings,
    ) -> Self {
        Self {
            element_source,
            trend_source,
            result_sink,
            settings,
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Run the report.
    ///
    /// Runtime terminations come back as they were raised. Any other error
    /// ends the run as a failed exit carrying the error text.
    pub async fn run(&self) -> Result<RunSummary, Termination> {
        match self.run_safe().await {
            Ok(summary) => Ok(summary),
            Err(ScriptError::Terminated(termination)) => Err(termination),
            Err(e) => Err(Termination::fail(format!("Run|Something went wrong: {}", e))),
        }
    }

    async fn run_safe(&self) -> ScriptResult<RunSummary> {
        let filter = ElementFilter::active(self.settings.protocol.as_str());
        let elements = self.element_source.list_elements(&filter).await?;
        info!("Found {} active '{}' elements", elements.len(), filter.protocol);

        let mut results = Vec::new();
        for element in &elements {
            let element_results = self.collect_element(element).await?;
            debug!("{}: {} variation records", element.name, element_results.len());
            results.extend(element_results);
        }

        if !results.is_empty() {
            let output = serde_json::to_string(&results)?;
            self.result_sink.add_output(RESULT_OUTPUT_KEY, &output).await?;
        }

        info!("Reported {} variations", results.len());

        Ok(RunSummary {
            elements: elements.len(),
            results: results.len(),
        })
    }

    async fn collect_element(&self, element: &Element) -> ScriptResult<Vec<VariationResult>> {
        let computer_name = self
            .element_source
            .get_string_parameter(&element.id, self.settings.computer_name_parameter)
            .await?;
        let now = (self.clock)();
        let rows = self
            .element_source
            .get_table_rows(&element.id, self.settings.process_table)
            .await?;
        let process_names: Vec<String> = rows.iter().map(|row| row.text(0)).collect();

        if process_names.is_empty() {
            debug!("{}: empty process table, skipping", element.name);
            return Ok(Vec::new());
        }

        let recent_window = TimeWindow::ending_at(now, self.settings.recent_span);
        let reference_window = TimeWindow::starting_at(
            now - self.settings.reference_offset,
            self.settings.recent_span,
        );

        let recent = average_vm_sizes(
            self.trend_source.as_ref(),
            &element.id,
            self.settings.vm_size_parameter,
            &process_names,
            recent_window,
        )
        .await?;
        let reference = average_vm_sizes(
            self.trend_source.as_ref(),
            &element.id,
            self.settings.vm_size_parameter,
            &process_names,
            reference_window,
        )
        .await?;

        let mut results = Vec::new();
        for process_name in process_names {
            let key = ProcessKey::new(&process_name);
            let (Some(older), Some(newer)) = (reference.get(&key), recent.get(&key)) else {
                continue;
            };

            let Some(delta) = average_difference(older, newer) else {
                debug!("{}: no usable averages for {}", element.name, process_name);
                continue;
            };

            results.push(VariationResult::new(
                process_name,
                element.name.clone(),
                computer_name.clone(),
                format_size(Some(delta)),
            ));
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::TimeZone;
    use serde_json::json;

    use crate::domain::{ElementState, TableRow, TrendRecord, TrendResponse, TrendSeries};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 31, 12, 0, 0).unwrap()
    }

    struct FakeElements {
        elements: Vec<Element>,
        processes: HashMap<ElementId, Vec<&'static str>>,
    }

    impl FakeElements {
        fn single(processes: Vec<&'static str>) -> Self {
            let element = Element::new(
                ElementId::new(1, 10),
                "WIN-APP01".to_string(),
                "Microsoft Platform".to_string(),
                ElementState::Active,
            );
            let mut map = HashMap::new();
            map.insert(element.id, processes);
            Self {
                elements: vec![element],
                processes: map,
            }
        }

        fn empty() -> Self {
            Self {
                elements: Vec::new(),
                processes: HashMap::new(),
            }
        }
    }

    #[async_trait]
    impl ElementSource for FakeElements {
        async fn list_elements(&self, filter: &ElementFilter) -> ScriptResult<Vec<Element>> {
            Ok(self.elements.iter().filter(|e| filter.matches(e)).cloned().collect())
        }

        async fn get_string_parameter(&self, element: &ElementId, _parameter_id: i32) -> ScriptResult<String> {
            Ok(format!("DMA-{}", element.agent_id))
        }

        async fn get_table_rows(&self, element: &ElementId, _table_id: i32) -> ScriptResult<Vec<TableRow>> {
            Ok(self.processes[element]
                .iter()
                .map(|name| TableRow::new(vec![json!(name)]))
                .collect())
        }
    }

    /// Answers the recent window from `recent` and anything older from `reference`
    struct FakeTrends {
        recent: Vec<(&'static str, f64)>,
        reference: Vec<(&'static str, f64)>,
        queries: Mutex<Vec<TrendQuery>>,
        failure: Option<fn() -> ScriptError>,
    }

    impl FakeTrends {
        fn new(recent: Vec<(&'static str, f64)>, reference: Vec<(&'static str, f64)>) -> Self {
            Self {
                recent,
                reference,
                queries: Mutex::new(Vec::new()),
                failure: None,
            }
        }

        fn failing(failure: fn() -> ScriptError) -> Self {
            Self {
                failure: Some(failure),
                ..Self::new(Vec::new(), Vec::new())
            }
        }
    }

    #[async_trait]
    impl TrendSource for FakeTrends {
        async fn get_trend_data(&self, query: &TrendQuery) -> ScriptResult<TrendResponse> {
            self.queries.lock().unwrap().push(query.clone());
            if let Some(failure) = self.failure {
                return Err(failure());
            }

            let values = if query.window.end == now() {
                &self.recent
            } else {
                &self.reference
            };
            let series = values
                .iter()
                .map(|(index, value)| {
                    TrendSeries::new(
                        format!("{}/{}", query.parameter_id, index),
                        vec![TrendRecord::average(query.window.start, *value)],
                    )
                })
                .collect();
            Ok(TrendResponse::new(series))
        }
    }

    #[derive(Default)]
    struct CapturingSink {
        outputs: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl ResultSink for CapturingSink {
        async fn add_output(&self, key: &str, value: &str) -> ScriptResult<()> {
            self.outputs.lock().unwrap().push((key.to_string(), value.to_string()));
            Ok(())
        }
    }

    fn service(
        elements: FakeElements,
        trends: Arc<FakeTrends>,
        sink: Arc<CapturingSink>,
    ) -> ReportService {
        ReportService::new(Arc::new(elements), trends, sink, ReportSettings::default())
            .with_clock(now)
    }

    fn reported(sink: &CapturingSink) -> Vec<VariationResult> {
        let outputs = sink.outputs.lock().unwrap();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].0, RESULT_OUTPUT_KEY);
        serde_json::from_str(&outputs[0].1).unwrap()
    }

    #[tokio::test]
    async fn test_process_missing_from_recent_window_is_skipped() {
        let trends = Arc::new(FakeTrends::new(
            vec![("svchost", 500.0)],
            vec![("svchost", 420.0), ("SQLSERVR", 300.0)],
        ));
        let sink = Arc::new(CapturingSink::default());
        let service = service(
            FakeElements::single(vec!["svchost", "SQLSERVR"]),
            trends.clone(),
            sink.clone(),
        );

        let summary = service.run().await.unwrap();
        assert_eq!(summary, RunSummary { elements: 1, results: 1 });

        let results = reported(&sink);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].display_name, "svchost");
        assert_eq!(results[0].received_value, "80.0");
        assert_eq!(results[0].element_name, "WIN-APP01");
        assert_eq!(results[0].dma_name, "DMA-1");
        assert_eq!(results[0].parameter_name, "7 Day Variation VmSize");
    }

    #[tokio::test]
    async fn test_one_batched_query_per_window() {
        let trends = Arc::new(FakeTrends::new(vec![], vec![]));
        let sink = Arc::new(CapturingSink::default());
        let service = service(
            FakeElements::single(vec!["svchost", "lsass", "svchost"]),
            trends.clone(),
            sink.clone(),
        );

        service.run().await.unwrap();

        let queries = trends.queries.lock().unwrap();
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0].window, TimeWindow::ending_at(now(), Duration::hours(24)));
        assert_eq!(
            queries[1].window,
            TimeWindow::new(now() - Duration::days(7), now() - Duration::days(6))
        );
        for query in queries.iter() {
            assert_eq!(query.parameter_id, 99);
            assert_eq!(query.indices, vec!["svchost", "lsass", "svchost"]);
            assert_eq!(query.trending_type, crate::domain::trend::TrendingType::Average);
        }
    }

    #[tokio::test]
    async fn test_join_is_case_insensitive_and_keeps_display_case() {
        let trends = Arc::new(FakeTrends::new(
            vec![("sqlservr", 1000.0)],
            vec![("SQLSERVR", 1012.34)],
        ));
        let sink = Arc::new(CapturingSink::default());
        let service = service(FakeElements::single(vec!["SqlServr"]), trends, sink.clone());

        service.run().await.unwrap();

        let results = reported(&sink);
        assert_eq!(results[0].display_name, "SqlServr");
        assert_eq!(results[0].received_value, "-12.3");
    }

    #[tokio::test]
    async fn test_nonpositive_average_yields_no_record() {
        let trends = Arc::new(FakeTrends::new(
            vec![("svchost", 500.0), ("lsass", 200.0), ("dwm", -4.0)],
            vec![("svchost", 0.0), ("lsass", 150.0), ("dwm", 80.0)],
        ));
        let sink = Arc::new(CapturingSink::default());
        let service = service(
            FakeElements::single(vec!["lsass", "svchost", "dwm"]),
            trends,
            sink.clone(),
        );

        let summary = service.run().await.unwrap();
        assert_eq!(summary.results, 1);

        let results = reported(&sink);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].display_name, "lsass");
        assert_eq!(results[0].received_value, "50.0");
    }

    #[tokio::test]
    async fn test_results_follow_enumeration_order_across_elements() {
        let second = Element::new(
            ElementId::new(2, 20),
            "WIN-DB01".to_string(),
            "Microsoft Platform".to_string(),
            ElementState::Active,
        );
        let stopped = Element::new(
            ElementId::new(3, 30),
            "WIN-OLD01".to_string(),
            "Microsoft Platform".to_string(),
            ElementState::Stopped,
        );
        let mut elements = FakeElements::single(vec!["winlogon", "explorer"]);
        elements.processes.insert(second.id, vec!["sqlservr"]);
        elements.processes.insert(stopped.id, vec!["explorer"]);
        elements.elements.push(stopped);
        elements.elements.push(second);

        let trends = Arc::new(FakeTrends::new(
            vec![("explorer", 300.0), ("winlogon", 100.0), ("sqlservr", 2000.0)],
            vec![("explorer", 250.0), ("winlogon", 100.0), ("sqlservr", 2500.0)],
        ));
        let sink = Arc::new(CapturingSink::default());
        let service = service(elements, trends.clone(), sink.clone());

        let summary = service.run().await.unwrap();
        assert_eq!(summary, RunSummary { elements: 2, results: 3 });
        assert_eq!(trends.queries.lock().unwrap().len(), 4);

        let results = reported(&sink);
        let values: Vec<(&str, &str, &str)> = results
            .iter()
            .map(|r| (r.element_name.as_str(), r.display_name.as_str(), r.received_value.as_str()))
            .collect();
        assert_eq!(
            values,
            vec![
                ("WIN-APP01", "winlogon", "0"),
                ("WIN-APP01", "explorer", "50.0"),
                ("WIN-DB01", "sqlservr", "-500.0"),
            ]
        );
    }

    #[tokio::test]
    async fn test_no_elements_means_no_output() {
        let trends = Arc::new(FakeTrends::new(vec![], vec![]));
        let sink = Arc::new(CapturingSink::default());
        let service = service(FakeElements::empty(), trends.clone(), sink.clone());

        let summary = service.run().await.unwrap();
        assert_eq!(summary, RunSummary { elements: 0, results: 0 });
        assert!(sink.outputs.lock().unwrap().is_empty());
        assert!(trends.queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_matching_trends_means_no_output() {
        let trends = Arc::new(FakeTrends::new(vec![("svchost", 10.0)], vec![]));
        let sink = Arc::new(CapturingSink::default());
        let service = service(FakeElements::single(vec!["svchost"]), trends, sink.clone());

        service.run().await.unwrap();
        assert!(sink.outputs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_backend_failure_becomes_failed_exit() {
        let trends = Arc::new(FakeTrends::failing(|| {
            ScriptError::Backend("trend store unreachable".to_string())
        }));
        let sink = Arc::new(CapturingSink::default());
        let service = service(FakeElements::single(vec!["svchost"]), trends.clone(), sink.clone());

        let termination = service.run().await.unwrap_err();
        assert_eq!(
            termination,
            Termination::fail(
                "Run|Something went wrong: Backend request failed: trend store unreachable"
            )
        );
        assert_eq!(trends.queries.lock().unwrap().len(), 1);
        assert!(sink.outputs.lock().unwrap().is_empty());
    }

    struct Terminating(Termination);

    #[async_trait]
    impl TrendSource for Terminating {
        async fn get_trend_data(&self, _query: &TrendQuery) -> ScriptResult<TrendResponse> {
            Err(self.0.clone().into())
        }
    }

    #[tokio::test]
    async fn test_runtime_termination_passes_through() {
        for raised in [
            Termination::ForceAbort,
            Termination::Timeout,
            Termination::UserDetached,
            Termination::success(),
        ] {
            let sink = Arc::new(CapturingSink::default());
            let service = ReportService::new(
                Arc::new(FakeElements::single(vec!["svchost"])),
                Arc::new(Terminating(raised.clone())),
                sink.clone(),
                ReportSettings::default(),
            )
            .with_clock(now);

            assert_eq!(service.run().await.unwrap_err(), raised);
            assert!(sink.outputs.lock().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_average_vm_sizes_first_wins() {
        struct Fixed;

        #[async_trait]
        impl TrendSource for Fixed {
            async fn get_trend_data(&self, query: &TrendQuery) -> ScriptResult<TrendResponse> {
                let time = query.window.start;
                Ok(TrendResponse::new(vec![
                    TrendSeries::new(
                        "99/svchost",
                        vec![
                            TrendRecord::Realtime { time, value: 1.0 },
                            TrendRecord::average(time, 640.0),
                            TrendRecord::average(time, 720.0),
                        ],
                    ),
                    TrendSeries::new("99/SVCHOST", vec![TrendRecord::average(time, 10.0)]),
                ]))
            }
        }

        let averages = average_vm_sizes(
            &Fixed,
            &ElementId::new(1, 10),
            99,
            &["svchost".to_string()],
            TimeWindow::ending_at(now(), Duration::hours(24)),
        )
        .await
        .unwrap();

        assert_eq!(averages.len(), 1);
        assert_eq!(averages.get(&ProcessKey::new("svchost")), Some(640.0));
    }

    #[test]
    fn test_settings_reject_out_of_range_windows() {
        let huge = Config {
            recent_hours: i64::MAX,
            ..Config::default()
        };
        assert!(matches!(
            ReportSettings::from_config(&huge),
            Err(ConfigError::Invalid(_))
        ));

        let inverted = Config {
            reference_days_back: -7,
            ..Config::default()
        };
        assert!(matches!(
            ReportSettings::from_config(&inverted),
            Err(ConfigError::Invalid(_))
        ));

        let settings = ReportSettings::from_config(&Config::default()).unwrap();
        assert_eq!(settings.recent_span, Duration::hours(24));
        assert_eq!(settings.reference_offset, Duration::days(7));
    }

    #[tokio::test]
    async fn test_report_over_platform_export() {
        use crate::adapters::snapshot::{Snapshot, SnapshotPlatform};

        let export = r#"{"elements": [
            {
                "agent_id": 346,
                "element_id": 12,
                "name": "WIN-APP01",
                "protocol": "Microsoft Platform",
                "state": "active",
                "parameters": {"165": "APP01"},
                "tables": {"96": [["svchost", 1204], ["sqlservr", 3312]]},
                "trends": [
                    {"key": "99/SVCHOST", "records": [
                        {"kind": "average", "time": "2024-07-31T08:00:00Z", "average": 500.0},
                        {"kind": "average", "time": "2024-07-24T20:00:00Z", "average": 420.0},
                        {"kind": "average", "time": "2024-07-20T00:00:00Z", "average": 9000.0}
                    ]},
                    {"key": "99/SQLSERVR", "records": [
                        {"kind": "average", "time": "2024-07-24T20:00:00Z", "average": 300.0}
                    ]}
                ]
            },
            {
                "agent_id": 346,
                "element_id": 13,
                "name": "WIN-OLD",
                "protocol": "Microsoft Platform",
                "state": "stopped"
            }
        ]}"#;
        let platform = SnapshotPlatform::new(Snapshot::from_json(export).unwrap());
        let sink = Arc::new(CapturingSink::default());
        let service = ReportService::new(
            Arc::new(platform.element_source()),
            Arc::new(platform.trend_source()),
            sink.clone(),
            ReportSettings::default(),
        )
        .with_clock(now);

        let summary = service.run().await.unwrap();
        assert_eq!(summary, RunSummary { elements: 1, results: 1 });

        let results = reported(&sink);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].display_name, "svchost");
        assert_eq!(results[0].element_name, "WIN-APP01");
        assert_eq!(results[0].dma_name, "APP01");
        assert_eq!(results[0].received_value, "80.0");
    }
}
