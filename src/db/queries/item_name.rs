//! Inspection item-name catalog queries

use sqlx::PgConnection;

use crate::types::InspectionItemName;

pub async fn get_item_name(conn: &mut PgConnection, id: i64) -> sqlx::Result<Option<InspectionItemName>> {
    sqlx::query_as::<_, InspectionItemName>(
        "SELECT id, name, created_at, updated_at FROM inspection_item_names WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(conn)
    .await
}

pub async fn find_item_name_by_name(conn: &mut PgConnection, name: &str) -> sqlx::Result<Option<InspectionItemName>> {
    sqlx::query_as::<_, InspectionItemName>(
        "SELECT id, name, created_at, updated_at FROM inspection_item_names WHERE name = $1",
    )
    .bind(name)
    .fetch_optional(conn)
    .await
}

pub async fn create_item_name(conn: &mut PgConnection, name: &str) -> sqlx::Result<InspectionItemName> {
    sqlx::query_as::<_, InspectionItemName>(
        r#"
        INSERT INTO inspection_item_names (name, created_at, updated_at)
        VALUES ($1, NOW(), NOW())
        RETURNING id, name, created_at, updated_at
        "#
    )
    .bind(name)
    .fetch_one(conn)
    .await
}

/// Rename a catalog entry and keep the legacy `item_name` copies in sync
pub async fn rename_item_name(conn: &mut PgConnection, id: i64, name: &str) -> sqlx::Result<InspectionItemName> {
    let renamed = sqlx::query_as::<_, InspectionItemName>(
        r#"
        UPDATE inspection_item_names SET name = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING id, name, created_at, updated_at
        "#
    )
    .bind(id)
    .bind(name)
    .fetch_one(&mut *conn)
    .await?;

    sqlx::query("UPDATE inspection_items SET item_name = $2, updated_at = NOW() WHERE item_name_id = $1")
        .bind(id)
        .bind(name)
        .execute(conn)
        .await?;

    Ok(renamed)
}
