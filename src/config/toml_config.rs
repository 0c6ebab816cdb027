use crate::config::{default_input_formats, DEFAULT_OUTPUT_FORMAT};
use crate::core::ConfigProvider;
use crate::domain::model::{OnRowError, RoundingSpec};
use crate::utils::error::{Result, RoundingError};
use crate::utils::validation::{
    validate_delimiter, validate_non_empty_string, validate_output_format, validate_path,
    validate_rounding_spec, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub job: Option<JobConfig>,
    pub table: TableConfig,
    pub fields: FieldsConfig,
    #[serde(default)]
    pub rounding: RoundingSpec,
    #[serde(default)]
    pub parsing: ParsingConfig,
    #[serde(default)]
    pub error_handling: ErrorHandlingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    pub input: String,
    pub output: Option<String>,
    pub oid_field: Option<String>,
    pub delimiter: Option<char>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldsConfig {
    pub source: String,
    pub new: String,
    #[serde(default)]
    pub drop_source: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsingConfig {
    #[serde(default = "default_input_formats")]
    pub input_formats: Vec<String>,
    #[serde(default = "default_output_format")]
    pub output_format: String,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            input_formats: default_input_formats(),
            output_format: default_output_format(),
        }
    }
}

fn default_output_format() -> String {
    DEFAULT_OUTPUT_FORMAT.to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorHandlingConfig {
    #[serde(default)]
    pub on_row_error: OnRowError,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(RoundingError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| RoundingError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DATA_DIR})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| RoundingError::ConfigValidationError {
            field: "environment".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn job_name(&self) -> &str {
        self.job.as_ref().map(|j| j.name.as_str()).unwrap_or("round-datetime")
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_path("table.input", &self.table.input)?;
        if let Some(output) = &self.table.output {
            validate_path("table.output", output)?;
        }
        if let Some(oid) = &self.table.oid_field {
            validate_non_empty_string("table.oid_field", oid)?;
        }
        if let Some(delimiter) = self.table.delimiter {
            validate_delimiter("table.delimiter", delimiter)?;
        }

        validate_non_empty_string("fields.source", &self.fields.source)?;
        validate_non_empty_string("fields.new", &self.fields.new)?;

        if self.parsing.input_formats.is_empty() {
            return Err(RoundingError::ConfigValidationError {
                field: "parsing.input_formats".to_string(),
                message: "at least one input format is required".to_string(),
            });
        }
        validate_output_format("parsing.output_format", &self.parsing.output_format)?;

        validate_rounding_spec(&self.rounding, |unit| format!("rounding.{}", unit))
    }
}

impl ConfigProvider for TomlConfig {
    fn input_path(&self) -> &str {
        &self.table.input
    }

    fn output_path(&self) -> Option<&str> {
        self.table.output.as_deref()
    }

    fn source_field(&self) -> &str {
        &self.fields.source
    }

    fn new_field(&self) -> &str {
        &self.fields.new
    }

    fn oid_field(&self) -> Option<&str> {
        self.table.oid_field.as_deref()
    }

    fn delimiter(&self) -> u8 {
        self.table.delimiter.map(|c| c as u8).unwrap_or(b',')
    }

    fn rounding_spec(&self) -> RoundingSpec {
        self.rounding
    }

    fn input_formats(&self) -> &[String] {
        &self.parsing.input_formats
    }

    fn output_format(&self) -> &str {
        &self.parsing.output_format
    }

    fn on_row_error(&self) -> OnRowError {
        self.error_handling.on_row_error
    }

    fn drop_source_field(&self) -> bool {
        self.fields.drop_source
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
