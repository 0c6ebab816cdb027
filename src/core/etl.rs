use crate::core::Pipeline;
use crate::domain::model::{RowOutcome, RunSummary};
use crate::utils::error::Result;

pub struct RoundingEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> RoundingEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<RunSummary> {
        tracing::info!("Creating table from input");
        let table = self.pipeline.extract().await?;
        tracing::info!("Read {} rows", table.len());

        tracing::info!("Rounding date-time values");
        let result = self.pipeline.transform(table).await?;
        let failed = result.count(|o| matches!(o, RowOutcome::Failed(_)));
        if failed > 0 {
            tracing::warn!("{} of {} rows could not be rounded", failed, result.rows.len());
        }

        tracing::info!("Joining field '{}' back to the table", result.new_field);
        let summary = self.pipeline.load(result).await?;
        tracing::info!(
            "Rounded {} rows ({} null, {} failed) into {}",
            summary.rounded_rows,
            summary.null_rows,
            summary.failed_rows,
            summary.output_path
        );

        Ok(summary)
    }
}
