//! Report generation — orchestrator over the external generator.

pub mod format;
mod openweather;

pub use openweather::OpenWeatherGenerator;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ForecastError;
use crate::pipeline::request::ReportRequest;

/// External report generator: free-text location + report type in,
/// formatted report text out.
#[async_trait]
pub trait ReportGenerator: Send + Sync {
    async fn generate(&self, request: &ReportRequest) -> Result<String, ForecastError>;
}

/// Invokes the generator once (no retry) and classifies its outcome:
/// an empty report and a generator error are the same failure.
pub struct ForecastOrchestrator {
    generator: Arc<dyn ReportGenerator>,
}

impl ForecastOrchestrator {
    pub fn new(generator: Arc<dyn ReportGenerator>) -> Self {
        Self { generator }
    }

    pub async fn generate(&self, request: &ReportRequest) -> Result<String, ForecastError> {
        let report = self.generator.generate(request).await?;
        if report.trim().is_empty() {
            return Err(ForecastError::EmptyReport);
        }
        Ok(report)
    }
}
