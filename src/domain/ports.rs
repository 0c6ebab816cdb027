use crate::domain::model::{OnRowError, RoundingSpec, RunSummary, TransformResult};
use crate::domain::table::Table;
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    /// Where the updated table goes; `None` rewrites the input table.
    fn output_path(&self) -> Option<&str>;
    fn source_field(&self) -> &str;
    fn new_field(&self) -> &str;
    fn oid_field(&self) -> Option<&str>;
    fn delimiter(&self) -> u8;
    fn rounding_spec(&self) -> RoundingSpec;
    fn input_formats(&self) -> &[String];
    fn output_format(&self) -> &str;
    fn on_row_error(&self) -> OnRowError;
    fn drop_source_field(&self) -> bool;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Table>;
    async fn transform(&self, table: Table) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<RunSummary>;
}
