use crate::domain::model::{RoundingSpec, Timestamp, Unit};
use crate::utils::error::{Result, RoundingError};
use chrono::format::{Item, StrftimeItems};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(RoundingError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(RoundingError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(RoundingError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(RoundingError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// Delimiters must be a single ASCII byte other than a letter, a digit, the quote
/// character or a line terminator.
pub fn validate_delimiter(field_name: &str, delimiter: char) -> Result<()> {
    if !delimiter.is_ascii()
        || delimiter.is_ascii_alphanumeric()
        || matches!(delimiter, '"' | '\n' | '\r')
    {
        return Err(RoundingError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: delimiter.to_string(),
            reason: "Delimiter must be a single ASCII punctuation, space or tab character"
                .to_string(),
        });
    }
    Ok(())
}

/// Output formats must be known to chrono and renderable without a time zone.
pub fn validate_output_format(field_name: &str, fmt: &str) -> Result<()> {
    validate_non_empty_string(field_name, fmt)?;

    if StrftimeItems::new(fmt).any(|item| matches!(item, Item::Error)) {
        return Err(RoundingError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: fmt.to_string(),
            reason: "Unrecognized format specifier".to_string(),
        });
    }

    let sample = Timestamp::new(2016, 7, 24, 15, 42, 7)?;
    sample
        .format(fmt)
        .map(|_| ())
        .map_err(|_| RoundingError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: fmt.to_string(),
            reason: "Format needs a time zone, which table values do not carry".to_string(),
        })
}

/// Rejects overrides no calendar could ever accept. Day-of-month overflow is still
/// reported per row, since it depends on the month being rounded.
pub fn validate_rounding_spec(
    spec: &RoundingSpec,
    field_name: impl Fn(Unit) -> String,
) -> Result<()> {
    for unit in Unit::ALL {
        if let Some(value) = spec.get(unit) {
            let (min, max) = unit.range();
            validate_range(&field_name(unit), value, min, max)?;
        }
    }
    Ok(())
}
