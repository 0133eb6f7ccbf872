//! Transactional storage seam used by the import engine
//!
//! The import engine only talks to [`ImportStore`] / [`ImportTx`]. The
//! PostgreSQL implementation lives in [`super::postgres`]; tests run against
//! the in-memory store in [`super::memory`].

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{
    Customer, Device, DeviceFields, DeviceLocationKey, InspectionItem, InspectionItemName,
};

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage failure, classified so that expected constraint violations can be
/// reported per row while infrastructure faults abort the batch
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Constraint and validation violations belong to the row that caused
    /// them; anything else is fatal for the batch.
    pub fn is_row_scoped(&self) -> bool {
        matches!(self, StoreError::UniqueViolation { .. } | StoreError::Validation(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        let classified = err.as_database_error().and_then(|db| {
            let code = db.code()?;
            match code.as_ref() {
                "23505" => Some(StoreError::UniqueViolation {
                    constraint: db.constraint().unwrap_or("unknown").to_string(),
                }),
                // class 22 data exceptions, class 23 integrity violations and
                // index rows too large all stem from one row's values
                c if c.starts_with("22") || c.starts_with("23") || c == "54000" => {
                    Some(StoreError::Validation(db.message().to_string()))
                }
                _ => None,
            }
        });
        classified.unwrap_or(StoreError::Database(err))
    }
}

/// Opens one transaction per import call
#[async_trait]
pub trait ImportStore: Send + Sync {
    async fn begin(&self) -> StoreResult<Box<dyn ImportTx>>;

    /// Cheap round-trip used by the health check
    async fn ping(&self) -> StoreResult<()>;
}

/// Every read and write of one import, scoped to a single transaction
#[async_trait]
pub trait ImportTx: Send {
    // Customers
    async fn find_customer_by_name(&mut self, customer_name: &str) -> StoreResult<Option<Customer>>;
    async fn create_customer(&mut self, customer_name: &str) -> StoreResult<Customer>;

    // Devices
    async fn find_device(&mut self, id: i64) -> StoreResult<Option<Device>>;
    async fn find_device_by_name(&mut self, customer_id: i64, device_name: &str) -> StoreResult<Option<Device>>;
    async fn find_device_by_location(&mut self, key: &DeviceLocationKey) -> StoreResult<Option<Device>>;
    async fn create_device(&mut self, fields: &DeviceFields) -> StoreResult<Device>;
    async fn update_device(&mut self, id: i64, fields: &DeviceFields) -> StoreResult<Device>;

    // Item-name catalog
    async fn find_item_name(&mut self, id: i64) -> StoreResult<Option<InspectionItemName>>;
    async fn find_item_name_by_name(&mut self, name: &str) -> StoreResult<Option<InspectionItemName>>;
    async fn create_item_name(&mut self, name: &str) -> StoreResult<InspectionItemName>;
    /// Renames a catalog entry and re-syncs the denormalized name on its items
    async fn rename_item_name(&mut self, id: i64, name: &str) -> StoreResult<InspectionItemName>;

    // Inspection items
    async fn find_item(&mut self, id: i64) -> StoreResult<Option<InspectionItem>>;
    async fn find_item_for_device(&mut self, device_id: i64, item_name_id: i64) -> StoreResult<Option<InspectionItem>>;
    async fn create_item(&mut self, device_id: i64, item_name: &InspectionItemName) -> StoreResult<InspectionItem>;
    async fn update_item(&mut self, id: i64, device_id: i64, item_name: &InspectionItemName) -> StoreResult<InspectionItem>;

    // Row-level isolation
    async fn savepoint(&mut self) -> StoreResult<()>;
    async fn release_savepoint(&mut self) -> StoreResult<()>;
    async fn rollback_to_savepoint(&mut self) -> StoreResult<()>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;
    async fn rollback(self: Box<Self>) -> StoreResult<()>;
}
