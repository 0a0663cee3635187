//! Export filter payloads and pre-transmission sanitization.
//!
//! Filters arrive from the UI as loosely filled forms; before they are
//! sent to the backend they must be sanitized so that placeholder
//! values (most importantly empty-string date bounds) never reach the
//! wire. `date_from: ""` is not a valid date and the backend rejects
//! it -- the field has to be omitted instead.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Output format of an export artifact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    /// Conventional file extension for this format.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

/// A field that is either unconstrained (`"All"` on the wire) or a
/// specific list of values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSelection {
    All,
    Listed(Vec<String>),
}

impl Serialize for FieldSelection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldSelection::All => serializer.serialize_str("All"),
            FieldSelection::Listed(values) => values.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for FieldSelection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Listed(Vec<String>),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Text(s) if s == "All" => Ok(FieldSelection::All),
            Raw::Text(other) => Err(D::Error::custom(format!(
                "expected \"All\" or a list of values, got \"{other}\""
            ))),
            Raw::Listed(values) => Ok(FieldSelection::Listed(values)),
        }
    }
}

/// Constraint fields shared by hotel and mapping exports.
///
/// Absent fields are omitted from the request body entirely.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterCriteria {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suppliers: Vec<String>,
    /// Comma-separated ISO country codes, or `"All"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_codes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_rating: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_rating: Option<f32>,
    /// ISO date lower bound (`YYYY-MM-DD`), omitted when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_from: Option<String>,
    /// ISO date upper bound (`YYYY-MM-DD`), omitted when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ittids: Option<FieldSelection>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub property_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_records: Option<u32>,
}

impl FilterCriteria {
    /// Normalize placeholder values in place.
    ///
    /// Empty or whitespace-only date bounds become `None` so they are
    /// omitted from the serialized payload.
    fn normalize(&mut self) {
        normalize_date(&mut self.date_from);
        normalize_date(&mut self.date_to);
    }
}

fn normalize_date(field: &mut Option<String>) {
    if let Some(value) = field {
        if value.trim().is_empty() {
            *field = None;
        }
    }
}

/// Filter payload for `POST /export/hotels`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HotelExportFilters {
    #[serde(default)]
    pub filters: FilterCriteria,
    #[serde(default)]
    pub format: ExportFormat,
    #[serde(default)]
    pub include_locations: bool,
    #[serde(default)]
    pub include_contacts: bool,
    #[serde(default)]
    pub include_mappings: bool,
}

impl HotelExportFilters {
    /// Return a copy safe for transmission (empty date bounds removed).
    pub fn sanitized(&self) -> Self {
        let mut clean = self.clone();
        clean.filters.normalize();
        clean
    }
}

/// Filter payload for `POST /export/mappings`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MappingExportFilters {
    #[serde(default)]
    pub filters: FilterCriteria,
    #[serde(default)]
    pub format: ExportFormat,
}

impl MappingExportFilters {
    /// Return a copy safe for transmission (empty date bounds removed).
    pub fn sanitized(&self) -> Self {
        let mut clean = self.clone();
        clean.filters.normalize();
        clean
    }
}
