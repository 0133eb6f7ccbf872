//! Row outcomes and the per-import result aggregator

use tracing::{debug, info};

use super::columns::Row;
use crate::db::StoreError;
use crate::types::{ImportKind, ImportResponse, ImportSummary, ImportedFields, ImportedItem, RowError};

/// Entity written by an applied row
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedRecord {
    pub id: i64,
    pub fields: ImportedFields,
}

/// Terminal state of one row
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Created(AppliedRecord),
    Updated(AppliedRecord),
    /// Composite key already taken; nothing written
    Duplicate(String),
    /// Required field missing or malformed
    Invalid(String),
    /// Update targets an ID that does not exist
    NotFound(String),
}

impl RowOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, RowOutcome::Created(_) | RowOutcome::Updated(_))
    }
}

/// Message for a constraint the store rejected at write time
pub fn describe_store_error(err: &StoreError) -> String {
    match err {
        StoreError::UniqueViolation { constraint } => {
            format!("すでに存在します（一意制約違反: {constraint}）")
        }
        StoreError::Validation(detail) => format!("入力値が不正です: {detail}"),
        other => other.to_string(),
    }
}

/// Accumulates per-row results in file order
#[derive(Debug)]
pub struct ImportReport {
    kind: ImportKind,
    total_rows: usize,
    created: usize,
    updated: usize,
    errors: Vec<RowError>,
    imported_items: Vec<ImportedItem>,
}

impl ImportReport {
    pub fn new(kind: ImportKind, total_rows: usize) -> Self {
        Self {
            kind,
            total_rows,
            created: 0,
            updated: 0,
            errors: Vec::new(),
            imported_items: Vec::new(),
        }
    }

    pub fn record(&mut self, row: &Row<'_>, outcome: RowOutcome) {
        let (record, created) = match outcome {
            RowOutcome::Created(record) => (record, true),
            RowOutcome::Updated(record) => (record, false),
            RowOutcome::Duplicate(message) | RowOutcome::Invalid(message) | RowOutcome::NotFound(message) => {
                self.reject(row, message);
                return;
            }
        };

        debug!(row = row.number(), id = record.id, created, "Row applied");
        if created {
            self.created += 1;
        } else {
            self.updated += 1;
        }
        self.imported_items.push(ImportedItem {
            row_number: row.number(),
            id: record.id,
            fields: record.fields,
            created,
            updated: !created,
        });
    }

    pub fn reject(&mut self, row: &Row<'_>, message: String) {
        info!(row = row.number(), "Row rejected: {}", message);
        self.errors.push(RowError {
            row_number: row.number(),
            row: row.payload(),
            error: message,
        });
    }

    pub fn imported_rows(&self) -> usize {
        self.created + self.updated
    }

    pub fn message(&self) -> String {
        let mut message = format!(
            "{}件中{}件の{}をインポートしました",
            self.total_rows,
            self.imported_rows(),
            self.kind.label()
        );
        if self.created > 0 || self.updated > 0 {
            message.push_str(&format!("（新規{}件、更新{}件）", self.created, self.updated));
        }
        if !self.errors.is_empty() {
            message.push_str(&format!("。{}件のエラーがあります", self.errors.len()));
        }
        message
    }

    pub fn into_response(self) -> ImportResponse {
        let message = self.message();
        ImportResponse {
            message,
            data: ImportSummary {
                imported_rows: self.imported_rows(),
                total_rows: self.total_rows,
                errors: self.errors,
                imported_items: self.imported_items,
            },
        }
    }
}
