//! Header alias table
//!
//! Every logical field accepts a list of header names: the localized label
//! first, then the canonical ASCII name, then legacy names. The list is
//! resolved once per file against the actual header row.

use std::collections::HashMap;

use super::encoding::CsvRecord;
use crate::types::RowPayload;

/// Logical CSV field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Id,
    DeviceName,
    CustomerName,
    Model,
    RackNumber,
    UnitStartPosition,
    UnitEndPosition,
    DeviceType,
    HardwareType,
    ItemName,
}

impl Column {
    /// Label used in row error messages
    pub fn label(&self) -> &'static str {
        match self {
            Column::Id => "ID",
            Column::DeviceName => "機器名",
            Column::CustomerName => "顧客名",
            Column::Model => "モデル",
            Column::RackNumber => "ラック番号",
            Column::UnitStartPosition => "ユニット開始位置",
            Column::UnitEndPosition => "ユニット終了位置",
            Column::DeviceType => "機器種別",
            Column::HardwareType => "ハードウェア種別",
            Column::ItemName => "点検項目名",
        }
    }
}

/// Accepted header names for one field, in precedence order
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub column: Column,
    pub aliases: &'static [&'static str],
}

const ID: ColumnSpec = ColumnSpec { column: Column::Id, aliases: &["ID", "id"] };
const DEVICE_NAME: ColumnSpec = ColumnSpec { column: Column::DeviceName, aliases: &["機器名", "device_name"] };
const ITEM_NAME: ColumnSpec = ColumnSpec {
    column: Column::ItemName,
    aliases: &["点検項目名", "item_name", "点検項目", "name"],
};
const CUSTOMER_NAME: ColumnSpec = ColumnSpec { column: Column::CustomerName, aliases: &["顧客名", "customer_name"] };

pub const DEVICE_COLUMNS: &[ColumnSpec] = &[
    ID,
    DEVICE_NAME,
    CUSTOMER_NAME,
    ColumnSpec { column: Column::Model, aliases: &["モデル", "model"] },
    ColumnSpec { column: Column::RackNumber, aliases: &["ラック番号", "rack_number", "設置場所", "location"] },
    ColumnSpec {
        column: Column::UnitStartPosition,
        aliases: &["ユニット開始位置", "unit_start_position", "ユニット位置", "unit_position"],
    },
    ColumnSpec { column: Column::UnitEndPosition, aliases: &["ユニット終了位置", "unit_end_position"] },
    ColumnSpec { column: Column::DeviceType, aliases: &["機器種別", "device_type"] },
    ColumnSpec { column: Column::HardwareType, aliases: &["ハードウェア種別", "hardware_type"] },
];

pub const INSPECTION_ITEM_COLUMNS: &[ColumnSpec] = &[
    ID,
    ITEM_NAME,
    DEVICE_NAME,
    CUSTOMER_NAME,
];

pub const ITEM_NAME_COLUMNS: &[ColumnSpec] = &[
    ID,
    ITEM_NAME,
];

/// Field → column index for one file
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    indices: HashMap<Column, usize>,
}

impl ColumnMap {
    pub fn resolve(headers: &[String], specs: &[ColumnSpec]) -> Self {
        let indices = specs
            .iter()
            .filter_map(|spec| {
                spec.aliases
                    .iter()
                    .find_map(|alias| headers.iter().position(|h| h == alias))
                    .map(|idx| (spec.column, idx))
            })
            .collect();
        Self { indices }
    }

    pub fn index(&self, column: Column) -> Option<usize> {
        self.indices.get(&column).copied()
    }

    pub fn contains(&self, column: Column) -> bool {
        self.indices.contains_key(&column)
    }
}

/// A data row viewed through the resolved header aliases
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    record: &'a CsvRecord,
    headers: &'a [String],
    columns: &'a ColumnMap,
}

impl<'a> Row<'a> {
    pub fn new(record: &'a CsvRecord, headers: &'a [String], columns: &'a ColumnMap) -> Self {
        Self { record, headers, columns }
    }

    /// 1-based CSV line
    pub fn number(&self) -> usize {
        self.record.line
    }

    /// Non-empty value of a field
    pub fn get(&self, column: Column) -> Option<&'a str> {
        let idx = self.columns.index(column)?;
        self.record
            .cells
            .get(idx)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Whether the file has a header for this field at all
    pub fn has_column(&self, column: Column) -> bool {
        self.columns.contains(column)
    }

    /// Target ID for update mode. `Ok(None)` means create mode.
    pub fn id(&self) -> Result<Option<i64>, String> {
        match self.get(Column::Id) {
            None => Ok(None),
            Some(raw) => match raw.parse::<i64>() {
                Ok(id) if id > 0 => Ok(Some(id)),
                _ => Err(format!("IDの形式が不正です: {raw}")),
            },
        }
    }

    /// Optional non-negative integer field
    pub fn position(&self, column: Column) -> Result<Option<i32>, String> {
        match self.get(column) {
            None => Ok(None),
            Some(raw) => match raw.parse::<i32>() {
                Ok(v) if v >= 0 => Ok(Some(v)),
                _ => Err(format!("{}は0以上の整数で指定してください: {raw}", column.label())),
            },
        }
    }

    /// The row as uploaded, keyed by the file's own headers
    pub fn payload(&self) -> RowPayload {
        RowPayload(
            self.headers
                .iter()
                .cloned()
                .zip(self.record.cells.iter().cloned())
                .collect(),
        )
    }
}

/// Message for a missing required field
pub fn missing(column: Column) -> String {
    format!("{}は必須です", column.label())
}
