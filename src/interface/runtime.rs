use std::future::Future;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::application::{ReportService, RunSummary};
use crate::error::Termination;

/// Hosts a report run: bounds its execution time and turns an external
/// abort request into a forced-abort termination.
#[derive(Debug, Clone, Default)]
pub struct ScriptRuntime {
    max_runtime: Option<Duration>,
}

impl ScriptRuntime {
    pub fn new(max_runtime: Option<Duration>) -> Self {
        Self { max_runtime }
    }

    /// Run until done, aborting on Ctrl-C
    pub async fn execute(&self, service: &ReportService) -> Termination {
        self.execute_until(service, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Cannot listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Run until done or until `abort` resolves
    pub async fn execute_until(
        &self,
        service: &ReportService,
        abort: impl Future<Output = ()>,
    ) -> Termination {
        let outcome = tokio::select! {
            outcome = self.bounded(service.run()) => outcome,
            _ = abort => Err(Termination::ForceAbort),
        };

        match outcome {
            Ok(summary) => {
                info!(
                    "Run completed: {} elements, {} results",
                    summary.elements, summary.results
                );
                Termination::success()
            }
            Err(termination) => {
                if termination.is_success() {
                    info!("Run ended: {}", termination);
                } else {
                    error!("Run ended: {}", termination);
                }
                termination
            }
        }
    }

    async fn bounded(
        &self,
        run: impl Future<Output = Result<RunSummary, Termination>>,
    ) -> Result<RunSummary, Termination> {
        match self.max_runtime {
            Some(limit) => tokio::time::timeout(limit, run)
                .await
                .unwrap_or(Err(Termination::Timeout)),
            None => run.await,
        }
    }
}
