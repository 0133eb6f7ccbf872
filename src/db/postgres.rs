//! PostgreSQL implementation of the import store

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use super::queries;
use super::store::{ImportStore, ImportTx, StoreResult};
use crate::types::{
    Customer, Device, DeviceFields, DeviceLocationKey, InspectionItem, InspectionItemName,
};

const ROW_SAVEPOINT: &str = "import_row";

/// Import store backed by the worker's connection pool
#[derive(Clone)]
pub struct PgImportStore {
    pool: PgPool,
}

impl PgImportStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ImportStore for PgImportStore {
    async fn begin(&self) -> StoreResult<Box<dyn ImportTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgImportTx { tx }))
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// One open PostgreSQL transaction. Dropping it without commit rolls back.
pub struct PgImportTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl ImportTx for PgImportTx {
    async fn find_customer_by_name(&mut self, customer_name: &str) -> StoreResult<Option<Customer>> {
        Ok(queries::customer::find_customer_by_name(&mut self.tx, customer_name).await?)
    }

    async fn create_customer(&mut self, customer_name: &str) -> StoreResult<Customer> {
        Ok(queries::customer::create_customer(&mut self.tx, customer_name).await?)
    }

    async fn find_device(&mut self, id: i64) -> StoreResult<Option<Device>> {
        Ok(queries::device::get_device(&mut self.tx, id).await?)
    }

    async fn find_device_by_name(&mut self, customer_id: i64, device_name: &str) -> StoreResult<Option<Device>> {
        Ok(queries::device::find_device_by_name(&mut self.tx, customer_id, device_name).await?)
    }

    async fn find_device_by_location(&mut self, key: &DeviceLocationKey) -> StoreResult<Option<Device>> {
        Ok(queries::device::find_device_by_location(&mut self.tx, key).await?)
    }

    async fn create_device(&mut self, fields: &DeviceFields) -> StoreResult<Device> {
        Ok(queries::device::create_device(&mut self.tx, fields).await?)
    }

    async fn update_device(&mut self, id: i64, fields: &DeviceFields) -> StoreResult<Device> {
        Ok(queries::device::update_device(&mut self.tx, id, fields).await?)
    }

    async fn find_item_name(&mut self, id: i64) -> StoreResult<Option<InspectionItemName>> {
        Ok(queries::item_name::get_item_name(&mut self.tx, id).await?)
    }

    async fn find_item_name_by_name(&mut self, name: &str) -> StoreResult<Option<InspectionItemName>> {
        Ok(queries::item_name::find_item_name_by_name(&mut self.tx, name).await?)
    }

    async fn create_item_name(&mut self, name: &str) -> StoreResult<InspectionItemName> {
        Ok(queries::item_name::create_item_name(&mut self.tx, name).await?)
    }

    async fn rename_item_name(&mut self, id: i64, name: &str) -> StoreResult<InspectionItemName> {
        Ok(queries::item_name::rename_item_name(&mut self.tx, id, name).await?)
    }

    async fn find_item(&mut self, id: i64) -> StoreResult<Option<InspectionItem>> {
        Ok(queries::inspection_item::get_item(&mut self.tx, id).await?)
    }

    async fn find_item_for_device(&mut self, device_id: i64, item_name_id: i64) -> StoreResult<Option<InspectionItem>> {
        Ok(queries::inspection_item::find_item_for_device(&mut self.tx, device_id, item_name_id).await?)
    }

    async fn create_item(&mut self, device_id: i64, item_name: &InspectionItemName) -> StoreResult<InspectionItem> {
        Ok(queries::inspection_item::create_item(&mut self.tx, device_id, item_name).await?)
    }

    async fn update_item(&mut self, id: i64, device_id: i64, item_name: &InspectionItemName) -> StoreResult<InspectionItem> {
        Ok(queries::inspection_item::update_item(&mut self.tx, id, device_id, item_name).await?)
    }

    async fn savepoint(&mut self) -> StoreResult<()> {
        sqlx::query(&format!("SAVEPOINT {ROW_SAVEPOINT}"))
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn release_savepoint(&mut self) -> StoreResult<()> {
        sqlx::query(&format!("RELEASE SAVEPOINT {ROW_SAVEPOINT}"))
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn rollback_to_savepoint(&mut self) -> StoreResult<()> {
        // ROLLBACK TO keeps the savepoint alive; release it so rows don't nest
        sqlx::query(&format!("ROLLBACK TO SAVEPOINT {ROW_SAVEPOINT}"))
            .execute(&mut *self.tx)
            .await?;
        sqlx::query(&format!("RELEASE SAVEPOINT {ROW_SAVEPOINT}"))
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
