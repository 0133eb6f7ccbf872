//! Device database queries

use sqlx::PgConnection;

use crate::types::device::{Device, DeviceFields, DeviceLocationKey};

const DEVICE_COLUMNS: &str = r#"
    id, customer_id, device_name, model, rack_number,
    unit_start_position, unit_end_position, device_type, hardware_type,
    created_at, updated_at
"#;

/// Get device by ID
pub async fn get_device(conn: &mut PgConnection, device_id: i64) -> sqlx::Result<Option<Device>> {
    let sql = format!("SELECT {DEVICE_COLUMNS} FROM devices WHERE id = $1");
    sqlx::query_as::<_, Device>(&sql)
        .bind(device_id)
        .fetch_optional(conn)
        .await
}

/// Find a customer's device by name, oldest first when several racks share it
pub async fn find_device_by_name(
    conn: &mut PgConnection,
    customer_id: i64,
    device_name: &str,
) -> sqlx::Result<Option<Device>> {
    let sql = format!(
        r#"
        SELECT {DEVICE_COLUMNS}
        FROM devices
        WHERE customer_id = $1 AND device_name = $2
        ORDER BY id
        LIMIT 1
        "#
    );
    sqlx::query_as::<_, Device>(&sql)
        .bind(customer_id)
        .bind(device_name)
        .fetch_optional(conn)
        .await
}

/// Find the device occupying the full composite key. NULL rack/unit match NULL.
pub async fn find_device_by_location(
    conn: &mut PgConnection,
    key: &DeviceLocationKey,
) -> sqlx::Result<Option<Device>> {
    let sql = format!(
        r#"
        SELECT {DEVICE_COLUMNS}
        FROM devices
        WHERE customer_id = $1
          AND device_name = $2
          AND rack_number IS NOT DISTINCT FROM $3
          AND unit_start_position IS NOT DISTINCT FROM $4
        "#
    );
    sqlx::query_as::<_, Device>(&sql)
        .bind(key.customer_id)
        .bind(&key.device_name)
        .bind(&key.rack_number)
        .bind(key.unit_start_position)
        .fetch_optional(conn)
        .await
}

/// Create a new device
pub async fn create_device(conn: &mut PgConnection, fields: &DeviceFields) -> sqlx::Result<Device> {
    let sql = format!(
        r#"
        INSERT INTO devices (
            customer_id, device_name, model, rack_number,
            unit_start_position, unit_end_position, device_type, hardware_type,
            created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW(), NOW())
        RETURNING {DEVICE_COLUMNS}
        "#
    );
    sqlx::query_as::<_, Device>(&sql)
        .bind(fields.customer_id)
        .bind(&fields.device_name)
        .bind(&fields.model)
        .bind(&fields.rack_number)
        .bind(fields.unit_start_position)
        .bind(fields.unit_end_position)
        .bind(&fields.device_type)
        .bind(&fields.hardware_type)
        .fetch_one(conn)
        .await
}

/// Overwrite every column of an existing device
pub async fn update_device(
    conn: &mut PgConnection,
    device_id: i64,
    fields: &DeviceFields,
) -> sqlx::Result<Device> {
    let sql = format!(
        r#"
        UPDATE devices SET
            customer_id = $2,
            device_name = $3,
            model = $4,
            rack_number = $5,
            unit_start_position = $6,
            unit_end_position = $7,
            device_type = $8,
            hardware_type = $9,
            updated_at = NOW()
        WHERE id = $1
        RETURNING {DEVICE_COLUMNS}
        "#
    );
    sqlx::query_as::<_, Device>(&sql)
        .bind(device_id)
        .bind(fields.customer_id)
        .bind(&fields.device_name)
        .bind(&fields.model)
        .bind(&fields.rack_number)
        .bind(fields.unit_start_position)
        .bind(fields.unit_end_position)
        .bind(&fields.device_type)
        .bind(&fields.hardware_type)
        .fetch_one(conn)
        .await
}
