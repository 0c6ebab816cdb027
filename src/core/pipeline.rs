use crate::core::{ConfigProvider, Pipeline, Storage};
use crate::domain::model::{OnRowError, RoundedRow, RowOutcome, RunSummary, Timestamp, TransformResult};
use crate::domain::rounding::DateRounder;
use crate::domain::table::{is_null_cell, unique_field_name, validate_field_name, Table};
use crate::utils::error::{Result, RoundingError};
use std::collections::HashMap;

/// Reads a table, rounds one date-time column into a new field and writes the table back.
pub struct RoundDatePipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
}

impl<S: Storage, C: ConfigProvider> RoundDatePipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }

    fn round_cell(&self, rounder: &DateRounder, cell: &str) -> RowOutcome {
        if is_null_cell(cell) {
            return RowOutcome::Null;
        }
        match Timestamp::parse(cell, self.config.input_formats()).and_then(|ts| rounder.round(&ts)) {
            Ok(rounded) => RowOutcome::Rounded(rounded),
            Err(e) => RowOutcome::Failed(e),
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for RoundDatePipeline<S, C> {
    async fn extract(&self) -> Result<Table> {
        let path = self.config.input_path();
        tracing::debug!("Reading table from: {}", path);
        let data = self.storage.read_file(path).await?;
        let table = Table::from_bytes(&data, self.config.delimiter())?;
        tracing::debug!(
            "Table has {} rows and fields: {}",
            table.len(),
            table.headers.join(", ")
        );
        Ok(table)
    }

    async fn transform(&self, table: Table) -> Result<TransformResult> {
        let source_idx = table.column_index(self.config.source_field())?;
        let keys = table.row_keys(self.config.oid_field())?;
        let new_field = unique_field_name(
            &validate_field_name(self.config.new_field())?,
            &table.headers,
        );
        if new_field != self.config.new_field() {
            tracing::info!(
                "New field '{}' will be written as '{}'",
                self.config.new_field(),
                new_field
            );
        }

        let rounder = DateRounder::new(self.config.rounding_spec());
        tracing::info!(
            "Creating new date-time field '{}' from '{}' with {}",
            new_field,
            self.config.source_field(),
            rounder.spec()
        );

        let mut rows = Vec::with_capacity(table.len());
        for (row, key) in table.rows.iter().zip(keys) {
            let outcome = match self.round_cell(&rounder, &row[source_idx]) {
                RowOutcome::Failed(e) => match self.config.on_row_error() {
                    OnRowError::Abort => {
                        return Err(RoundingError::RowAborted {
                            key,
                            source: Box::new(e),
                        });
                    }
                    OnRowError::Skip => {
                        tracing::warn!("Skipping row {}: {}", key, e);
                        RowOutcome::Failed(e)
                    }
                },
                outcome => outcome,
            };
            rows.push(RoundedRow { key, outcome });
        }

        Ok(TransformResult {
            table,
            new_field,
            rows,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<RunSummary> {
        let total_rows = result.rows.len();
        let rounded_rows = result.count(|o| matches!(o, RowOutcome::Rounded(_)));
        let null_rows = result.count(|o| matches!(o, RowOutcome::Null));
        let failed_rows = result.count(|o| matches!(o, RowOutcome::Failed(_)));

        let TransformResult {
            mut table,
            new_field,
            rows,
        } = result;

        let output_format = self.config.output_format();
        let mut keys = Vec::with_capacity(rows.len());
        let mut values = HashMap::with_capacity(rounded_rows);
        for row in rows {
            if let RowOutcome::Rounded(ts) = &row.outcome {
                values.insert(row.key.clone(), ts.format(output_format)?);
            }
            keys.push(row.key);
        }

        tracing::debug!("Joining {} values into field '{}'", values.len(), new_field);
        table.join_column(&new_field, &keys, &values);

        if self.config.drop_source_field() {
            let idx = table.column_index(self.config.source_field())?;
            table.drop_column(idx);
            tracing::debug!("Dropped source field '{}'", self.config.source_field());
        }

        let output_path = self
            .config
            .output_path()
            .unwrap_or_else(|| self.config.input_path())
            .to_string();
        let data = table.to_bytes()?;
        tracing::debug!("Writing table ({} bytes) to {}", data.len(), output_path);
        self.storage.write_file(&output_path, &data).await?;

        Ok(RunSummary {
            output_path,
            new_field,
            total_rows,
            rounded_rows,
            null_rows,
            failed_rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_input_formats;
    use crate::domain::model::{RoundingSpec, Unit};
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn with_file(path: &str, contents: &str) -> Self {
            let mut files = HashMap::new();
            files.insert(path.to_string(), contents.as_bytes().to_vec());
            Self {
                files: Arc::new(Mutex::new(files)),
            }
        }

        async fn get_file(&self, path: &str) -> Option<String> {
            let files = self.files.lock().await;
            files
                .get(path)
                .map(|data| String::from_utf8_lossy(data).into_owned())
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                RoundingError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct MockConfig {
        output_path: Option<String>,
        source_field: String,
        new_field: String,
        oid_field: Option<String>,
        spec: RoundingSpec,
        input_formats: Vec<String>,
        output_format: String,
        on_row_error: OnRowError,
        drop_source_field: bool,
    }

    impl MockConfig {
        fn new(spec: RoundingSpec) -> Self {
            Self {
                output_path: None,
                source_field: "REPORTED".to_string(),
                new_field: "REPORTED_R".to_string(),
                oid_field: Some("OBJECTID".to_string()),
                spec,
                input_formats: default_input_formats(),
                output_format: "%Y-%m-%d %H:%M:%S".to_string(),
                on_row_error: OnRowError::Skip,
                drop_source_field: false,
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn input_path(&self) -> &str {
            "incidents.csv"
        }

        fn output_path(&self) -> Option<&str> {
            self.output_path.as_deref()
        }

        fn source_field(&self) -> &str {
            &self.source_field
        }

        fn new_field(&self) -> &str {
            &self.new_field
        }

        fn oid_field(&self) -> Option<&str> {
            self.oid_field.as_deref()
        }

        fn delimiter(&self) -> u8 {
            b','
        }

        fn rounding_spec(&self) -> RoundingSpec {
            self.spec
        }

        fn input_formats(&self) -> &[String] {
            &self.input_formats
        }

        fn output_format(&self) -> &str {
            &self.output_format
        }

        fn on_row_error(&self) -> OnRowError {
            self.on_row_error
        }

        fn drop_source_field(&self) -> bool {
            self.drop_source_field
        }
    }

    const INCIDENTS: &str = "OBJECTID,REPORTED,KIND\n\
                             1,2016-07-24 15:42:07,theft\n\
                             2,,noise\n\
                             3,2016-02-10T08:30:00,theft\n\
                             4,not a date,other\n";

    #[tokio::test]
    async fn test_extract_reads_table_from_storage() {
        let storage = MockStorage::with_file("incidents.csv", INCIDENTS);
        let pipeline = RoundDatePipeline::new(storage, MockConfig::new(RoundingSpec::new()));

        let table = pipeline.extract().await.unwrap();

        assert_eq!(table.headers, vec!["OBJECTID", "REPORTED", "KIND"]);
        assert_eq!(table.len(), 4);
    }

    #[tokio::test]
    async fn test_extract_missing_table_is_io_error() {
        let storage = MockStorage::with_file("other.csv", INCIDENTS);
        let pipeline = RoundDatePipeline::new(storage, MockConfig::new(RoundingSpec::new()));

        let err = pipeline.extract().await.unwrap_err();
        assert!(matches!(err, RoundingError::IoError(_)));
    }

    #[tokio::test]
    async fn test_transform_classifies_rows() {
        let storage = MockStorage::with_file("incidents.csv", INCIDENTS);
        let spec = RoundingSpec::new().with(Unit::Hour, 0);
        let pipeline = RoundDatePipeline::new(storage, MockConfig::new(spec));

        let table = pipeline.extract().await.unwrap();
        let result = pipeline.transform(table).await.unwrap();

        assert_eq!(result.new_field, "REPORTED_R");
        assert_eq!(result.rows.len(), 4);
        match &result.rows[0].outcome {
            RowOutcome::Rounded(ts) => assert_eq!(ts.to_string(), "2016-07-24 00:00:00"),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(matches!(result.rows[1].outcome, RowOutcome::Null));
        assert!(matches!(result.rows[2].outcome, RowOutcome::Rounded(_)));
        assert!(matches!(
            result.rows[3].outcome,
            RowOutcome::Failed(RoundingError::TimestampParse { .. })
        ));
        assert_eq!(result.rows[3].key, "4");
    }

    #[tokio::test]
    async fn test_transform_missing_source_field_is_fatal() {
        let storage = MockStorage::with_file("incidents.csv", INCIDENTS);
        let mut config = MockConfig::new(RoundingSpec::new().with(Unit::Day, 1));
        config.source_field = "OCCURRED".to_string();
        let pipeline = RoundDatePipeline::new(storage, config);

        let table = pipeline.extract().await.unwrap();
        let err = pipeline.transform(table).await.unwrap_err();
        assert!(matches!(err, RoundingError::FieldNotFound { field, .. } if field == "OCCURRED"));
    }

    #[tokio::test]
    async fn test_transform_abort_on_row_error() {
        let storage = MockStorage::with_file("incidents.csv", INCIDENTS);
        let mut config = MockConfig::new(RoundingSpec::new().with(Unit::Minute, 0));
        config.on_row_error = OnRowError::Abort;
        let pipeline = RoundDatePipeline::new(storage.clone(), config);

        let table = pipeline.extract().await.unwrap();
        let err = pipeline.transform(table).await.unwrap_err();
        match err {
            RoundingError::RowAborted { key, source } => {
                assert_eq!(key, "4");
                assert!(source.is_row_level());
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_transform_invalid_date_is_per_row() {
        let data = "OBJECTID,REPORTED\n1,2015-02-10 08:00:00\n2,2015-03-10 08:00:00\n";
        let storage = MockStorage::with_file("incidents.csv", data);
        let pipeline = RoundDatePipeline::new(
            storage,
            MockConfig::new(RoundingSpec::new().with(Unit::Day, 31)),
        );

        let table = pipeline.extract().await.unwrap();
        let result = pipeline.transform(table).await.unwrap();

        assert!(matches!(
            result.rows[0].outcome,
            RowOutcome::Failed(RoundingError::InvalidDate { unit: Unit::Day, .. })
        ));
        match &result.rows[1].outcome {
            RowOutcome::Rounded(ts) => assert_eq!(ts.to_string(), "2015-03-31 00:00:00"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_transform_picks_unique_field_name() {
        let storage = MockStorage::with_file("incidents.csv", INCIDENTS);
        let mut config = MockConfig::new(RoundingSpec::new().with(Unit::Second, 0));
        config.new_field = "KIND".to_string();
        let pipeline = RoundDatePipeline::new(storage, config);

        let table = pipeline.extract().await.unwrap();
        let result = pipeline.transform(table).await.unwrap();
        assert_eq!(result.new_field, "KIND_1");
    }

    #[tokio::test]
    async fn test_load_joins_by_object_id_and_rewrites_input() {
        let storage = MockStorage::with_file("incidents.csv", INCIDENTS);
        let spec = RoundingSpec::new().with(Unit::Day, 1);
        let pipeline = RoundDatePipeline::new(storage.clone(), MockConfig::new(spec));

        let table = pipeline.extract().await.unwrap();
        let result = pipeline.transform(table).await.unwrap();
        let summary = pipeline.load(result).await.unwrap();

        assert_eq!(summary.output_path, "incidents.csv");
        assert_eq!(summary.total_rows, 4);
        assert_eq!(summary.rounded_rows, 2);
        assert_eq!(summary.null_rows, 1);
        assert_eq!(summary.failed_rows, 1);

        let written = storage.get_file("incidents.csv").await.unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines[0], "OBJECTID,REPORTED,KIND,REPORTED_R");
        assert_eq!(lines[1], "1,2016-07-24 15:42:07,theft,2016-07-01 00:00:00");
        assert_eq!(lines[2], "2,,noise,");
        assert_eq!(lines[3], "3,2016-02-10T08:30:00,theft,2016-02-01 00:00:00");
        assert_eq!(lines[4], "4,not a date,other,");
    }

    #[tokio::test]
    async fn test_load_to_separate_output_without_source_field() {
        let storage = MockStorage::with_file("incidents.csv", INCIDENTS);
        let mut config = MockConfig::new(RoundingSpec::new().with(Unit::Year, 2020));
        config.output_path = Some("out/rounded.csv".to_string());
        config.drop_source_field = true;
        config.oid_field = None;
        let pipeline = RoundDatePipeline::new(storage.clone(), config);

        let table = pipeline.extract().await.unwrap();
        let result = pipeline.transform(table).await.unwrap();
        let summary = pipeline.load(result).await.unwrap();

        assert_eq!(summary.output_path, "out/rounded.csv");
        let written = storage.get_file("out/rounded.csv").await.unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines[0], "OBJECTID,KIND,REPORTED_R");
        assert_eq!(lines[1], "1,theft,2020-01-01 00:00:00");

        // input untouched
        let original = storage.get_file("incidents.csv").await.unwrap();
        assert_eq!(original, INCIDENTS);
    }

    #[tokio::test]
    async fn test_load_with_unrenderable_format_fails_without_writing() {
        let storage = MockStorage::with_file("incidents.csv", INCIDENTS);
        let mut config = MockConfig::new(RoundingSpec::new().with(Unit::Hour, 0));
        config.output_format = "%Y-%m-%d %z".to_string();
        let pipeline = RoundDatePipeline::new(storage.clone(), config);

        let table = pipeline.extract().await.unwrap();
        let result = pipeline.transform(table).await.unwrap();
        let err = pipeline.load(result).await.unwrap_err();

        assert!(matches!(err, RoundingError::InvalidConfigValueError { .. }));
        assert_eq!(err.exit_code(), 1);
        assert_eq!(storage.get_file("incidents.csv").await.unwrap(), INCIDENTS);
    }
}
