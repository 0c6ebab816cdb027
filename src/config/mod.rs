pub mod cli;
pub mod toml_config;

pub const DEFAULT_OUTPUT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Input formats tried in order when a job does not list its own.
pub fn default_input_formats() -> Vec<String> {
    [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
        "%Y-%m-%d",
        "%Y/%m/%d",
        "%m/%d/%Y",
    ]
    .iter()
    .map(|f| f.to_string())
    .collect()
}

#[cfg(feature = "cli")]
pub use self::args::CliConfig;

#[cfg(feature = "cli")]
mod args {
    use super::{default_input_formats, DEFAULT_OUTPUT_FORMAT};
    use crate::core::ConfigProvider;
    use crate::domain::model::{OnRowError, RoundingSpec};
    use crate::utils::error::Result;
    use crate::utils::validation::{
        validate_delimiter, validate_non_empty_string, validate_output_format, validate_path,
        validate_rounding_spec, Validate,
    };
    use clap::Parser;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize, Parser)]
    #[command(name = "round-datetime")]
    #[command(about = "Round a date-time field of a table into a new field")]
    pub struct CliConfig {
        /// Delimited table to read
        #[arg(long)]
        pub input: String,

        /// Where to write the updated table (defaults to rewriting the input)
        #[arg(long)]
        pub output: Option<String>,

        /// Date-time field to round
        #[arg(long)]
        pub field: String,

        /// Name of the field that receives the rounded values
        #[arg(long)]
        pub new_field: String,

        #[arg(long, allow_negative_numbers = true)]
        pub year: Option<i64>,

        #[arg(long, allow_negative_numbers = true)]
        pub month: Option<i64>,

        #[arg(long, allow_negative_numbers = true)]
        pub day: Option<i64>,

        #[arg(long, allow_negative_numbers = true)]
        pub hour: Option<i64>,

        #[arg(long, allow_negative_numbers = true)]
        pub minute: Option<i64>,

        #[arg(long, allow_negative_numbers = true)]
        pub second: Option<i64>,

        /// Field whose values identify rows; row position is used when omitted
        #[arg(long)]
        pub oid_field: Option<String>,

        #[arg(long, default_value_t = ',')]
        pub delimiter: char,

        /// chrono format for parsing the source field; repeat to try several
        #[arg(long = "input-format", default_values_t = default_input_formats())]
        pub input_formats: Vec<String>,

        #[arg(long, default_value = DEFAULT_OUTPUT_FORMAT)]
        pub output_format: String,

        #[arg(long, value_enum, default_value_t = OnRowError::Skip)]
        pub on_row_error: OnRowError,

        /// Remove the source field from the written table
        #[arg(long)]
        pub drop_source_field: bool,

        /// Print the run summary as JSON on stdout
        #[arg(long)]
        pub summary_json: bool,

        /// Emit logs as JSON lines
        #[arg(long)]
        pub json_logs: bool,

        #[arg(long, help = "Enable verbose output")]
        pub verbose: bool,
    }

    impl ConfigProvider for CliConfig {
        fn input_path(&self) -> &str {
            &self.input
        }

        fn output_path(&self) -> Option<&str> {
            self.output.as_deref()
        }

        fn source_field(&self) -> &str {
            &self.field
        }

        fn new_field(&self) -> &str {
            &self.new_field
        }

        fn oid_field(&self) -> Option<&str> {
            self.oid_field.as_deref()
        }

        fn delimiter(&self) -> u8 {
            self.delimiter as u8
        }

        fn rounding_spec(&self) -> RoundingSpec {
            RoundingSpec {
                year: self.year,
                month: self.month,
                day: self.day,
                hour: self.hour,
                minute: self.minute,
                second: self.second,
            }
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

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            validate_path("--input", &self.input)?;
            if let Some(output) = &self.output {
                validate_path("--output", output)?;
            }
            validate_non_empty_string("--field", &self.field)?;
            validate_non_empty_string("--new-field", &self.new_field)?;
            if let Some(oid) = &self.oid_field {
                validate_non_empty_string("--oid-field", oid)?;
            }
            validate_delimiter("--delimiter", self.delimiter)?;
            validate_output_format("--output-format", &self.output_format)?;
            validate_rounding_spec(&self.rounding_spec(), |unit| format!("--{}", unit))
        }
    }

}
