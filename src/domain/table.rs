use crate::utils::error::{Result, RoundingError};
use csv::{ReaderBuilder, WriterBuilder};
use std::collections::{HashMap, HashSet};

/// A delimited table held fully in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub delimiter: u8,
}

impl Table {
    pub fn from_bytes(data: &[u8], delimiter: u8) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(false)
            .from_reader(data);

        let headers = rdr.headers()?.iter().map(|h| h.to_string()).collect();
        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            rows.push(record.iter().map(|cell| cell.to_string()).collect());
        }

        Ok(Self {
            headers,
            rows,
            delimiter,
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut wtr = WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(Vec::new());
        wtr.write_record(&self.headers)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        wtr.into_inner()
            .map_err(|e| RoundingError::IoError(e.into_error()))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| RoundingError::FieldNotFound {
                field: name.to_string(),
                available: self.headers.join(", "),
            })
    }

    /// Row identity keys: the object-id column when given, otherwise the 1-based row number.
    pub fn row_keys(&self, oid_field: Option<&str>) -> Result<Vec<String>> {
        let Some(oid_field) = oid_field else {
            return Ok((1..=self.rows.len()).map(|n| n.to_string()).collect());
        };

        let idx = self.column_index(oid_field)?;
        let mut seen = HashSet::with_capacity(self.rows.len());
        let mut keys = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            let key = row[idx].trim().to_string();
            if !seen.insert(key.clone()) {
                return Err(RoundingError::DuplicateRowKey { key });
            }
            keys.push(key);
        }
        Ok(keys)
    }

    /// Appends `field`, filling each row from `values` by row key. Rows without an entry
    /// get an empty cell.
    pub fn join_column(
        &mut self,
        field: &str,
        keys: &[String],
        values: &HashMap<String, String>,
    ) {
        self.headers.push(field.to_string());
        for (row, key) in self.rows.iter_mut().zip(keys) {
            row.push(values.get(key).cloned().unwrap_or_default());
        }
    }

    pub fn drop_column(&mut self, idx: usize) {
        self.headers.remove(idx);
        for row in &mut self.rows {
            row.remove(idx);
        }
    }
}

/// Cells treated as missing values.
pub fn is_null_cell(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.eq_ignore_ascii_case("null") || value.eq_ignore_ascii_case("<null>")
}

/// Makes `name` usable as a field name: anything outside `[A-Za-z0-9_]` becomes `_`
/// and a leading digit gets an `F` prefix.
pub fn validate_field_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(RoundingError::InvalidConfigValueError {
            field: "new_field".to_string(),
            value: name.to_string(),
            reason: "Field name cannot be empty".to_string(),
        });
    }

    let mut cleaned: String = trimmed
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if cleaned.starts_with(|c: char| c.is_ascii_digit()) {
        cleaned.insert(0, 'F');
    }
    Ok(cleaned)
}

/// Appends `_1`, `_2`, ... to `name` until it no longer collides with an existing field.
pub fn unique_field_name(name: &str, existing: &[String]) -> String {
    let taken = |candidate: &str| existing.iter().any(|h| h == candidate);
    if !taken(name) {
        return name.to_string();
    }
    (1..)
        .map(|n| format!("{}_{}", name, n))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| name.to_string())
}
