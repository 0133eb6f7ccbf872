//! Inspection item queries

use sqlx::PgConnection;

use crate::types::{InspectionItem, InspectionItemName};

pub async fn get_item(conn: &mut PgConnection, id: i64) -> sqlx::Result<Option<InspectionItem>> {
    sqlx::query_as::<_, InspectionItem>(
        r#"
        SELECT id, device_id, item_name_id, item_name, created_at, updated_at
        FROM inspection_items
        WHERE id = $1
        "#
    )
    .bind(id)
    .fetch_optional(conn)
    .await
}

pub async fn find_item_for_device(
    conn: &mut PgConnection,
    device_id: i64,
    item_name_id: i64,
) -> sqlx::Result<Option<InspectionItem>> {
    sqlx::query_as::<_, InspectionItem>(
        r#"
        SELECT id, device_id, item_name_id, item_name, created_at, updated_at
        FROM inspection_items
        WHERE device_id = $1 AND item_name_id = $2
        "#
    )
    .bind(device_id)
    .bind(item_name_id)
    .fetch_optional(conn)
    .await
}

pub async fn create_item(
    conn: &mut PgConnection,
    device_id: i64,
    item_name: &InspectionItemName,
) -> sqlx::Result<InspectionItem> {
    sqlx::query_as::<_, InspectionItem>(
        r#"
        INSERT INTO inspection_items (device_id, item_name_id, item_name, created_at, updated_at)
        VALUES ($1, $2, $3, NOW(), NOW())
        RETURNING id, device_id, item_name_id, item_name, created_at, updated_at
        "#
    )
    .bind(device_id)
    .bind(item_name.id)
    .bind(&item_name.name)
    .fetch_one(conn)
    .await
}

pub async fn update_item(
    conn: &mut PgConnection,
    id: i64,
    device_id: i64,
    item_name: &InspectionItemName,
) -> sqlx::Result<InspectionItem> {
    sqlx::query_as::<_, InspectionItem>(
        r#"
        UPDATE inspection_items SET
            device_id = $2,
            item_name_id = $3,
            item_name = $4,
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, device_id, item_name_id, item_name, created_at, updated_at
        "#
    )
    .bind(id)
    .bind(device_id)
    .bind(item_name.id)
    .bind(&item_name.name)
    .fetch_one(conn)
    .await
}
