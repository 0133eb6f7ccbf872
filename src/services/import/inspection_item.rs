//! Inspection item rows
//!
//! Parents are resolved in order customer → device → catalog name, each
//! created on demand. Duplicate key: `(device, catalog name)`.

use async_trait::async_trait;

use super::columns::{missing, Column, ColumnSpec, Row, INSPECTION_ITEM_COLUMNS};
use super::reconciler::RowReconciler;
use super::report::{AppliedRecord, RowOutcome};
use super::resolver::EntityResolver;
use crate::db::{ImportTx, StoreResult};
use crate::types::{Device, ImportKind, ImportedFields, InspectionItem};

pub struct InspectionItemReconciler;

fn applied(item: &InspectionItem, device: &Device) -> AppliedRecord {
    AppliedRecord {
        id: item.id,
        fields: ImportedFields::InspectionItem {
            device_id: device.id,
            device_name: device.device_name.clone(),
            item_name_id: item.item_name_id,
            item_name: item.item_name.clone(),
        },
    }
}

fn duplicate(device_name: &str, item_name: &str) -> RowOutcome {
    RowOutcome::Duplicate(format!(
        "機器「{device_name}」の点検項目「{item_name}」はすでに存在します"
    ))
}

#[async_trait]
impl RowReconciler for InspectionItemReconciler {
    fn kind(&self) -> ImportKind {
        ImportKind::InspectionItem
    }

    fn columns(&self) -> &'static [ColumnSpec] {
        INSPECTION_ITEM_COLUMNS
    }

    async fn reconcile(
        &self,
        tx: &mut dyn ImportTx,
        resolver: &mut EntityResolver,
        row: &Row<'_>,
    ) -> StoreResult<RowOutcome> {
        let Some(item_name) = row.get(Column::ItemName) else {
            return Ok(RowOutcome::Invalid(missing(Column::ItemName)));
        };
        let Some(device_name) = row.get(Column::DeviceName) else {
            return Ok(RowOutcome::Invalid(missing(Column::DeviceName)));
        };
        let Some(customer_name) = row.get(Column::CustomerName) else {
            return Ok(RowOutcome::Invalid(missing(Column::CustomerName)));
        };
        let id = match row.id() {
            Ok(id) => id,
            Err(message) => return Ok(RowOutcome::Invalid(message)),
        };

        if let Some(id) = id {
            if tx.find_item(id).await?.is_none() {
                return Ok(RowOutcome::NotFound(format!("指定されたID: {id}の点検項目が存在しません")));
            }
        }

        let customer = resolver.customer(tx, customer_name).await?;
        let device = resolver.device(tx, &customer, device_name).await?;
        let catalog = resolver.item_name(tx, item_name).await?;

        let existing = tx.find_item_for_device(device.id, catalog.id).await?;

        match id {
            Some(id) => {
                if existing.is_some_and(|other| other.id != id) {
                    return Ok(duplicate(&device.device_name, &catalog.name));
                }
                let item = tx.update_item(id, device.id, &catalog).await?;
                Ok(RowOutcome::Updated(applied(&item, &device)))
            }
            None => {
                if existing.is_some() {
                    return Ok(duplicate(&device.device_name, &catalog.name));
                }
                let item = tx.create_item(device.id, &catalog).await?;
                Ok(RowOutcome::Created(applied(&item, &device)))
            }
        }
    }
}
