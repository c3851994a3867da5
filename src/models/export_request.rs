use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Json => "application/json",
        }
    }

    /// Maps a response content type back onto a format. Parameters such as
    /// `charset` are ignored.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => {
                Some(ExportFormat::Xlsx)
            }
            "text/csv" => Some(ExportFormat::Csv),
            "application/json" => Some(ExportFormat::Json),
            _ => None,
        }
    }
}

/// Which of the request's filters the backend applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterBy {
    #[default]
    All,
    Date,
    Status,
    DateAndStatus,
}

impl FilterBy {
    pub fn uses_date(&self) -> bool {
        matches!(self, FilterBy::Date | FilterBy::DateAndStatus)
    }

    pub fn uses_status(&self) -> bool {
        matches!(self, FilterBy::Status | FilterBy::DateAndStatus)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    #[default]
    CreatedAt,
    TotalAmount,
    Status,
    CustomerName,
    OrderNumber,
}

impl SortBy {
    pub fn column(&self) -> &'static str {
        match self {
            SortBy::CreatedAt => "created_at",
            SortBy::TotalAmount => "total_amount",
            SortBy::Status => "status",
            SortBy::CustomerName => "customer_name",
            SortBy::OrderNumber => "order_number",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

impl SortOrder {
    pub fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }
}

/// Inclusive calendar-day range. Either side may be open.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub start: Option<NaiveDate>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub end: Option<NaiveDate>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    #[serde(default)]
    pub format: ExportFormat,
    #[serde(default)]
    pub filter_by: FilterBy,
    #[serde(default)]
    pub date_range: DateRange,
    #[serde(default)]
    pub statuses: BTreeSet<String>,
    #[serde(default)]
    pub sort_by: SortBy,
    #[serde(default)]
    pub sort_order: SortOrder,
}

/// Export desk selections, held until the admin runs the export.
///
/// Nothing is validated here: an empty date range or status set is
/// forwarded as-is and interpreted by the backend.
#[derive(Debug, Clone, Default)]
pub struct ExportFilterBuilder {
    format: ExportFormat,
    filter_by: FilterBy,
    date_range: DateRange,
    statuses: BTreeSet<String>,
    sort_by: SortBy,
    sort_order: SortOrder,
}

impl ExportFilterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn format(mut self, format: ExportFormat) -> Self {
        self.format = format;
        self
    }

    pub fn filter_by(mut self, filter_by: FilterBy) -> Self {
        self.filter_by = filter_by;
        self
    }

    pub fn date_range(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.date_range = DateRange { start, end };
        self
    }

    pub fn sort(mut self, sort_by: SortBy, sort_order: SortOrder) -> Self {
        self.sort_by = sort_by;
        self.sort_order = sort_order;
        self
    }

    /// Flips membership of `status` in the inclusion set and returns whether
    /// it is included afterwards.
    pub fn toggle_status(&mut self, status: &str) -> bool {
        if self.statuses.remove(status) {
            false
        } else {
            self.statuses.insert(status.to_string());
            true
        }
    }

    pub fn is_status_selected(&self, status: &str) -> bool {
        self.statuses.contains(status)
    }

    pub fn build(&self) -> ExportRequest {
        ExportRequest {
            format: self.format,
            filter_by: self.filter_by,
            date_range: self.date_range.clone(),
            statuses: self.statuses.clone(),
            sort_by: self.sort_by,
            sort_order: self.sort_order,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let request = ExportFilterBuilder::new().build();

        assert_eq!(request.format, ExportFormat::Xlsx);
        assert_eq!(request.filter_by, FilterBy::All);
        assert_eq!(request.date_range, DateRange::default());
        assert!(request.statuses.is_empty());
        assert_eq!(request.sort_by, SortBy::CreatedAt);
        assert_eq!(request.sort_order, SortOrder::Descending);
    }

    #[test]
    fn test_toggle_status_membership() {
        let mut builder = ExportFilterBuilder::new();

        assert!(builder.toggle_status("Delivered"));
        assert!(builder.toggle_status("Shipped"));
        assert!(builder.is_status_selected("Delivered"));

        assert!(!builder.toggle_status("Delivered"));
        assert!(!builder.is_status_selected("Delivered"));

        let request = builder.build();
        assert_eq!(request.statuses.len(), 1);
        assert!(request.statuses.contains("Shipped"));
    }

    #[test]
    fn test_request_wire_format() {
        let request = ExportFilterBuilder::new()
            .format(ExportFormat::Csv)
            .filter_by(FilterBy::DateAndStatus)
            .date_range(NaiveDate::from_ymd_opt(2024, 1, 1), None)
            .sort(SortBy::TotalAmount, SortOrder::Ascending)
            .build();

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["format"], "CSV");
        assert_eq!(json["filterBy"], "dateAndStatus");
        assert_eq!(json["dateRange"]["start"], "2024-01-01");
        assert!(json["dateRange"]["end"].is_null());
        assert_eq!(json["sortBy"], "totalAmount");
        assert_eq!(json["sortOrder"], "Ascending");
    }

    #[test]
    fn test_empty_date_strings_pass_through_as_open() {
        let body = r#"{
            "format": "JSON",
            "filterBy": "date",
            "dateRange": {"start": "", "end": ""},
            "statuses": [],
            "sortBy": "createdAt",
            "sortOrder": "Descending"
        }"#;

        let request: ExportRequest = serde_json::from_str(body).unwrap();
        assert_eq!(request.format, ExportFormat::Json);
        assert_eq!(request.date_range, DateRange::default());
    }

    #[test]
    fn test_invalid_date_rejected() {
        let body = r#"{"dateRange": {"start": "01/02/2024"}}"#;
        assert!(serde_json::from_str::<ExportRequest>(body).is_err());
    }

    #[test]
    fn test_format_from_content_type() {
        assert_eq!(
            ExportFormat::from_content_type("text/csv; charset=utf-8"),
            Some(ExportFormat::Csv)
        );
        assert_eq!(
            ExportFormat::from_content_type(ExportFormat::Xlsx.content_type()),
            Some(ExportFormat::Xlsx)
        );
        assert_eq!(
            ExportFormat::from_content_type("Application/JSON"),
            Some(ExportFormat::Json)
        );
        assert_eq!(ExportFormat::from_content_type("text/html"), None);
    }
}
