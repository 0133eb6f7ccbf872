//! Customer database queries

use sqlx::PgConnection;

use crate::types::Customer;

/// Find customer by name. Names are not unique in storage; the oldest match wins.
pub async fn find_customer_by_name(conn: &mut PgConnection, customer_name: &str) -> sqlx::Result<Option<Customer>> {
    sqlx::query_as::<_, Customer>(
        r#"
        SELECT id, customer_name, created_at, updated_at
        FROM customers
        WHERE customer_name = $1
        ORDER BY id
        LIMIT 1
        "#
    )
    .bind(customer_name)
    .fetch_optional(conn)
    .await
}

/// Create a new customer
pub async fn create_customer(conn: &mut PgConnection, customer_name: &str) -> sqlx::Result<Customer> {
    sqlx::query_as::<_, Customer>(
        r#"
        INSERT INTO customers (customer_name, created_at, updated_at)
        VALUES ($1, NOW(), NOW())
        RETURNING id, customer_name, created_at, updated_at
        "#
    )
    .bind(customer_name)
    .fetch_one(conn)
    .await
}
