//! Device rows
//!
//! Duplicate key: `(customer, device name, rack number, unit start position)`.

use async_trait::async_trait;

use super::columns::{missing, Column, ColumnSpec, Row, DEVICE_COLUMNS};
use super::reconciler::RowReconciler;
use super::report::{AppliedRecord, RowOutcome};
use super::resolver::EntityResolver;
use crate::db::{ImportTx, StoreResult};
use crate::defaults::{DEFAULT_DEVICE_TYPE, DEFAULT_HARDWARE_TYPE};
use crate::types::{Customer, Device, DeviceFields, ImportKind, ImportedFields};

pub struct DeviceReconciler;

/// Validated cells of a device row
struct DeviceRow<'a> {
    id: Option<i64>,
    device_name: &'a str,
    customer_name: &'a str,
    unit_start_position: Option<i32>,
    unit_end_position: Option<i32>,
}

fn check_unit_order(start: Option<i32>, end: Option<i32>) -> Result<(), String> {
    match (start, end) {
        (Some(start), Some(end)) if start > end => Err(format!(
            "ユニット開始位置({start})がユニット終了位置({end})より大きくなっています"
        )),
        _ => Ok(()),
    }
}

fn validate<'a>(row: &Row<'a>) -> Result<DeviceRow<'a>, String> {
    let device_name = row.get(Column::DeviceName).ok_or_else(|| missing(Column::DeviceName))?;
    let customer_name = row.get(Column::CustomerName).ok_or_else(|| missing(Column::CustomerName))?;
    let id = row.id()?;
    let unit_start_position = row.position(Column::UnitStartPosition)?;
    let unit_end_position = row.position(Column::UnitEndPosition)?;

    check_unit_order(unit_start_position, unit_end_position)?;

    Ok(DeviceRow {
        id,
        device_name,
        customer_name,
        unit_start_position,
        unit_end_position,
    })
}

fn applied(device: &Device, customer: &Customer) -> AppliedRecord {
    AppliedRecord {
        id: device.id,
        fields: ImportedFields::Device {
            customer_id: customer.id,
            customer_name: customer.customer_name.clone(),
            device_name: device.device_name.clone(),
            rack_number: device.rack_number.clone(),
            unit_start_position: device.unit_start_position,
        },
    }
}

/// Optional text column: a blank cell clears, a missing header keeps the stored value
fn overwrite(row: &Row<'_>, column: Column, current: Option<String>) -> Option<String> {
    if row.has_column(column) {
        row.get(column).map(str::to_string)
    } else {
        current
    }
}

#[async_trait]
impl RowReconciler for DeviceReconciler {
    fn kind(&self) -> ImportKind {
        ImportKind::Device
    }

    fn columns(&self) -> &'static [ColumnSpec] {
        DEVICE_COLUMNS
    }

    async fn reconcile(
        &self,
        tx: &mut dyn ImportTx,
        resolver: &mut EntityResolver,
        row: &Row<'_>,
    ) -> StoreResult<RowOutcome> {
        let input = match validate(row) {
            Ok(input) => input,
            Err(message) => return Ok(RowOutcome::Invalid(message)),
        };

        if let Some(id) = input.id {
            let Some(existing) = tx.find_device(id).await? else {
                return Ok(RowOutcome::NotFound(format!("指定されたID: {id}の機器が存在しません")));
            };
            let customer = resolver.customer(tx, input.customer_name).await?;

            let mut fields = DeviceFields::from(&existing);
            fields.customer_id = customer.id;
            fields.device_name = input.device_name.to_string();
            fields.model = overwrite(row, Column::Model, fields.model);
            fields.rack_number = overwrite(row, Column::RackNumber, fields.rack_number);
            if row.has_column(Column::UnitStartPosition) {
                fields.unit_start_position = input.unit_start_position;
            }
            if row.has_column(Column::UnitEndPosition) {
                fields.unit_end_position = input.unit_end_position;
            }
            if let Some(device_type) = row.get(Column::DeviceType) {
                fields.device_type = device_type.to_string();
            }
            if let Some(hardware_type) = row.get(Column::HardwareType) {
                fields.hardware_type = hardware_type.to_string();
            }

            // a partial update can pair a new cell with the stored counterpart
            if let Err(message) = check_unit_order(fields.unit_start_position, fields.unit_end_position) {
                return Ok(RowOutcome::Invalid(message));
            }

            let device = tx.update_device(id, &fields).await?;
            return Ok(RowOutcome::Updated(applied(&device, &customer)));
        }

        let customer = resolver.customer(tx, input.customer_name).await?;
        let fields = DeviceFields {
            customer_id: customer.id,
            device_name: input.device_name.to_string(),
            model: row.get(Column::Model).map(str::to_string),
            rack_number: row.get(Column::RackNumber).map(str::to_string),
            unit_start_position: input.unit_start_position,
            unit_end_position: input.unit_end_position,
            device_type: row.get(Column::DeviceType).unwrap_or(DEFAULT_DEVICE_TYPE).to_string(),
            hardware_type: row.get(Column::HardwareType).unwrap_or(DEFAULT_HARDWARE_TYPE).to_string(),
        };

        if tx.find_device_by_location(&fields.location_key()).await?.is_some() {
            return Ok(RowOutcome::Duplicate(format!(
                "機器「{}」(顧客: {}、ラック番号: {}、ユニット開始位置: {})はすでに存在します",
                fields.device_name,
                customer.customer_name,
                fields.rack_number.as_deref().unwrap_or("-"),
                fields.unit_start_position.map_or_else(|| "-".to_string(), |u| u.to_string()),
            )));
        }

        let device = tx.create_device(&fields).await?;
        Ok(RowOutcome::Created(applied(&device, &customer)))
    }
}
