//! Import request/response types for CSV reconciliation

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::services::import::SourceEncoding;

/// Which entity a CSV file carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    Device,
    InspectionItem,
    InspectionItemName,
}

impl ImportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportKind::Device => "device",
            ImportKind::InspectionItem => "inspection_item",
            ImportKind::InspectionItemName => "inspection_item_name",
        }
    }

    /// Noun used in operator-facing messages
    pub fn label(&self) -> &'static str {
        match self {
            ImportKind::Device => "機器",
            ImportKind::InspectionItem => "点検項目",
            ImportKind::InspectionItemName => "点検項目名",
        }
    }

    /// Legacy spreadsheet exports are Shift-JIS; the catalog upload is UTF-8.
    pub fn default_encoding(&self) -> SourceEncoding {
        match self {
            ImportKind::Device | ImportKind::InspectionItem => SourceEncoding::ShiftJis,
            ImportKind::InspectionItemName => SourceEncoding::Utf8,
        }
    }
}

/// Original cells of one CSV row, serialized as a header → value object in
/// column order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowPayload(pub Vec<(String, String)>);

impl Serialize for RowPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (header, value) in &self.0 {
            map.serialize_entry(header, value)?;
        }
        map.end()
    }
}

/// A row that was not applied
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowError {
    pub row_number: usize,
    pub row: RowPayload,
    pub error: String,
}

/// Entity-specific display fields of an applied row
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum ImportedFields {
    Device {
        customer_id: i64,
        customer_name: String,
        device_name: String,
        rack_number: Option<String>,
        unit_start_position: Option<i32>,
    },
    InspectionItem {
        device_id: i64,
        device_name: String,
        item_name_id: i64,
        item_name: String,
    },
    InspectionItemName {
        name: String,
    },
}

/// A row that was applied
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedItem {
    pub row_number: usize,
    pub id: i64,
    #[serde(flatten)]
    pub fields: ImportedFields,
    pub created: bool,
    pub updated: bool,
}

/// Aggregated outcome of one import call
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub imported_rows: usize,
    pub total_rows: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<RowError>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub imported_items: Vec<ImportedItem>,
}

/// Response body of an import endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ImportResponse {
    pub message: String,
    pub data: ImportSummary,
}
