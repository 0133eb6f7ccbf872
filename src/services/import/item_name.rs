//! Item-name catalog rows

use async_trait::async_trait;

use super::columns::{missing, Column, ColumnSpec, Row, ITEM_NAME_COLUMNS};
use super::reconciler::RowReconciler;
use super::report::{AppliedRecord, RowOutcome};
use super::resolver::EntityResolver;
use crate::db::{ImportTx, StoreResult};
use crate::types::{ImportKind, ImportedFields, InspectionItemName};

pub struct ItemNameReconciler;

fn applied(entry: &InspectionItemName) -> AppliedRecord {
    AppliedRecord {
        id: entry.id,
        fields: ImportedFields::InspectionItemName { name: entry.name.clone() },
    }
}

#[async_trait]
impl RowReconciler for ItemNameReconciler {
    fn kind(&self) -> ImportKind {
        ImportKind::InspectionItemName
    }

    fn columns(&self) -> &'static [ColumnSpec] {
        ITEM_NAME_COLUMNS
    }

    // The resolver cache is bypassed: a catalog row is the entity itself,
    // not a parent reference.
    async fn reconcile(
        &self,
        tx: &mut dyn ImportTx,
        _resolver: &mut EntityResolver,
        row: &Row<'_>,
    ) -> StoreResult<RowOutcome> {
        let Some(name) = row.get(Column::ItemName) else {
            return Ok(RowOutcome::Invalid(missing(Column::ItemName)));
        };
        let id = match row.id() {
            Ok(id) => id,
            Err(message) => return Ok(RowOutcome::Invalid(message)),
        };

        let existing = tx.find_item_name_by_name(name).await?;

        match id {
            Some(id) => {
                if tx.find_item_name(id).await?.is_none() {
                    return Ok(RowOutcome::NotFound(format!("指定されたID: {id}の点検項目名が存在しません")));
                }
                if existing.is_some_and(|other| other.id != id) {
                    return Ok(RowOutcome::Duplicate(format!("点検項目名「{name}」はすでに存在します")));
                }
                let entry = tx.rename_item_name(id, name).await?;
                Ok(RowOutcome::Updated(applied(&entry)))
            }
            None => {
                if existing.is_some() {
                    return Ok(RowOutcome::Duplicate(format!("点検項目名「{name}」はすでに存在します")));
                }
                let entry = tx.create_item_name(name).await?;
                Ok(RowOutcome::Created(applied(&entry)))
            }
        }
    }
}
