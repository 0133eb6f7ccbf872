//! In-memory import store for tests
//!
//! Mirrors the PostgreSQL schema's constraints (composite device key, unique
//! catalog names, one item name per device) and adds fault injection so the
//! commit/rollback paths of the import engine can be exercised without a
//! database.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use super::store::{ImportStore, ImportTx, StoreError, StoreResult};
use crate::types::{
    Customer, Device, DeviceFields, DeviceLocationKey, InspectionItem, InspectionItemName,
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    last_id: i64,
    customers: BTreeMap<i64, Customer>,
    devices: BTreeMap<i64, Device>,
    item_names: BTreeMap<i64, InspectionItemName>,
    items: BTreeMap<i64, InspectionItem>,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn insert_customer(&mut self, customer_name: &str) -> StoreResult<Customer> {
        if customer_name.is_empty() {
            return Err(StoreError::Validation("customer_name must not be empty".into()));
        }
        let now = Utc::now();
        let customer = Customer {
            id: self.next_id(),
            customer_name: customer_name.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.customers.insert(customer.id, customer.clone());
        Ok(customer)
    }

    fn check_device(&self, id: Option<i64>, fields: &DeviceFields) -> StoreResult<()> {
        if fields.device_name.is_empty() {
            return Err(StoreError::Validation("device_name must not be empty".into()));
        }
        if !self.customers.contains_key(&fields.customer_id) {
            return Err(StoreError::Validation(format!("customer {} does not exist", fields.customer_id)));
        }
        if let (Some(start), Some(end)) = (fields.unit_start_position, fields.unit_end_position) {
            if start > end {
                return Err(StoreError::Validation("devices_unit_order".into()));
            }
        }
        let key = fields.location_key();
        let taken = self
            .devices
            .values()
            .any(|d| Some(d.id) != id && DeviceFields::from(d).location_key() == key);
        if taken {
            return Err(StoreError::UniqueViolation { constraint: "devices_location_unique".into() });
        }
        Ok(())
    }

    fn write_device(&mut self, id: i64, fields: &DeviceFields, created_at: chrono::DateTime<Utc>) -> Device {
        let device = Device {
            id,
            customer_id: fields.customer_id,
            device_name: fields.device_name.clone(),
            model: fields.model.clone(),
            rack_number: fields.rack_number.clone(),
            unit_start_position: fields.unit_start_position,
            unit_end_position: fields.unit_end_position,
            device_type: fields.device_type.clone(),
            hardware_type: fields.hardware_type.clone(),
            created_at,
            updated_at: Utc::now(),
        };
        self.devices.insert(id, device.clone());
        device
    }

    fn insert_device(&mut self, fields: &DeviceFields) -> StoreResult<Device> {
        self.check_device(None, fields)?;
        let id = self.next_id();
        Ok(self.write_device(id, fields, Utc::now()))
    }

    fn insert_item_name(&mut self, name: &str) -> StoreResult<InspectionItemName> {
        if name.is_empty() {
            return Err(StoreError::Validation("name must not be empty".into()));
        }
        if self.item_names.values().any(|n| n.name == name) {
            return Err(StoreError::UniqueViolation { constraint: "inspection_item_names_name_unique".into() });
        }
        let now = Utc::now();
        let item_name = InspectionItemName {
            id: self.next_id(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.item_names.insert(item_name.id, item_name.clone());
        Ok(item_name)
    }

    fn check_item(&self, id: Option<i64>, device_id: i64, item_name_id: i64) -> StoreResult<()> {
        if !self.devices.contains_key(&device_id) {
            return Err(StoreError::Validation(format!("device {device_id} does not exist")));
        }
        let taken = self
            .items
            .values()
            .any(|i| Some(i.id) != id && i.device_id == device_id && i.item_name_id == item_name_id);
        if taken {
            return Err(StoreError::UniqueViolation { constraint: "inspection_items_device_item_unique".into() });
        }
        Ok(())
    }

    fn insert_item(&mut self, device_id: i64, item_name: &InspectionItemName) -> StoreResult<InspectionItem> {
        self.check_item(None, device_id, item_name.id)?;
        let now = Utc::now();
        let item = InspectionItem {
            id: self.next_id(),
            device_id,
            item_name_id: item_name.id,
            item_name: item_name.name.clone(),
            created_at: now,
            updated_at: now,
        };
        self.items.insert(item.id, item.clone());
        Ok(item)
    }
}

/// Number of create calls issued against the store, committed or not
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreateCalls {
    pub customers: usize,
    pub devices: usize,
    pub item_names: usize,
    pub items: usize,
}

#[derive(Debug, Default)]
struct Faults {
    fail_commit: bool,
    /// Device creates allowed before the store reports itself unavailable
    device_creates_before_outage: Option<usize>,
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<MemoryState>,
    calls: Mutex<CreateCalls>,
    faults: Mutex<Faults>,
}

/// Shared in-memory database; clones see the same data
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    shared: Arc<Shared>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_customer(&self, customer_name: &str) -> Customer {
        self.shared.state.lock().insert_customer(customer_name).expect("valid seed customer")
    }

    pub fn seed_device(&self, fields: DeviceFields) -> Device {
        self.shared.state.lock().insert_device(&fields).expect("valid seed device")
    }

    pub fn seed_item_name(&self, name: &str) -> InspectionItemName {
        self.shared.state.lock().insert_item_name(name).expect("valid seed item name")
    }

    pub fn seed_item(&self, device_id: i64, item_name: &InspectionItemName) -> InspectionItem {
        self.shared.state.lock().insert_item(device_id, item_name).expect("valid seed item")
    }

    pub fn customers(&self) -> Vec<Customer> {
        self.shared.state.lock().customers.values().cloned().collect()
    }

    pub fn devices(&self) -> Vec<Device> {
        self.shared.state.lock().devices.values().cloned().collect()
    }

    pub fn item_names(&self) -> Vec<InspectionItemName> {
        self.shared.state.lock().item_names.values().cloned().collect()
    }

    pub fn items(&self) -> Vec<InspectionItem> {
        self.shared.state.lock().items.values().cloned().collect()
    }

    pub fn create_calls(&self) -> CreateCalls {
        *self.shared.calls.lock()
    }

    /// Make every following commit fail
    pub fn fail_commit(&self) {
        self.shared.faults.lock().fail_commit = true;
    }

    /// Let `allowed` device creates succeed, then fail as if the connection dropped
    pub fn drop_connection_after_device_creates(&self, allowed: usize) {
        self.shared.faults.lock().device_creates_before_outage = Some(allowed);
    }
}

#[async_trait]
impl ImportStore for MemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn ImportTx>> {
        let working = self.shared.state.lock().clone();
        Ok(Box::new(MemoryTx {
            shared: Arc::clone(&self.shared),
            working,
            savepoint: None,
        }))
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// Snapshot-isolated transaction; the shared state only changes on commit
pub struct MemoryTx {
    shared: Arc<Shared>,
    working: MemoryState,
    savepoint: Option<MemoryState>,
}

#[async_trait]
impl ImportTx for MemoryTx {
    async fn find_customer_by_name(&mut self, customer_name: &str) -> StoreResult<Option<Customer>> {
        Ok(self.working.customers.values().find(|c| c.customer_name == customer_name).cloned())
    }

    async fn create_customer(&mut self, customer_name: &str) -> StoreResult<Customer> {
        self.shared.calls.lock().customers += 1;
        self.working.insert_customer(customer_name)
    }

    async fn find_device(&mut self, id: i64) -> StoreResult<Option<Device>> {
        Ok(self.working.devices.get(&id).cloned())
    }

    async fn find_device_by_name(&mut self, customer_id: i64, device_name: &str) -> StoreResult<Option<Device>> {
        Ok(self
            .working
            .devices
            .values()
            .find(|d| d.customer_id == customer_id && d.device_name == device_name)
            .cloned())
    }

    async fn find_device_by_location(&mut self, key: &DeviceLocationKey) -> StoreResult<Option<Device>> {
        Ok(self.working.devices.values().find(|d| &DeviceFields::from(*d).location_key() == key).cloned())
    }

    async fn create_device(&mut self, fields: &DeviceFields) -> StoreResult<Device> {
        let attempt = {
            let mut calls = self.shared.calls.lock();
            calls.devices += 1;
            calls.devices
        };
        if let Some(allowed) = self.shared.faults.lock().device_creates_before_outage {
            if attempt > allowed {
                return Err(StoreError::Unavailable("connection reset by peer".into()));
            }
        }
        self.working.insert_device(fields)
    }

    async fn update_device(&mut self, id: i64, fields: &DeviceFields) -> StoreResult<Device> {
        let created_at = match self.working.devices.get(&id) {
            Some(device) => device.created_at,
            None => return Err(StoreError::Validation(format!("device {id} does not exist"))),
        };
        self.working.check_device(Some(id), fields)?;
        Ok(self.working.write_device(id, fields, created_at))
    }

    async fn find_item_name(&mut self, id: i64) -> StoreResult<Option<InspectionItemName>> {
        Ok(self.working.item_names.get(&id).cloned())
    }

    async fn find_item_name_by_name(&mut self, name: &str) -> StoreResult<Option<InspectionItemName>> {
        Ok(self.working.item_names.values().find(|n| n.name == name).cloned())
    }

    async fn create_item_name(&mut self, name: &str) -> StoreResult<InspectionItemName> {
        self.shared.calls.lock().item_names += 1;
        self.working.insert_item_name(name)
    }

    async fn rename_item_name(&mut self, id: i64, name: &str) -> StoreResult<InspectionItemName> {
        if self.working.item_names.values().any(|n| n.id != id && n.name == name) {
            return Err(StoreError::UniqueViolation { constraint: "inspection_item_names_name_unique".into() });
        }
        let renamed = {
            let entry = self
                .working
                .item_names
                .get_mut(&id)
                .ok_or_else(|| StoreError::Validation(format!("item name {id} does not exist")))?;
            entry.name = name.to_string();
            entry.updated_at = Utc::now();
            entry.clone()
        };
        for item in self.working.items.values_mut().filter(|i| i.item_name_id == id) {
            item.item_name = name.to_string();
        }
        Ok(renamed)
    }

    async fn find_item(&mut self, id: i64) -> StoreResult<Option<InspectionItem>> {
        Ok(self.working.items.get(&id).cloned())
    }

    async fn find_item_for_device(&mut self, device_id: i64, item_name_id: i64) -> StoreResult<Option<InspectionItem>> {
        Ok(self
            .working
            .items
            .values()
            .find(|i| i.device_id == device_id && i.item_name_id == item_name_id)
            .cloned())
    }

    async fn create_item(&mut self, device_id: i64, item_name: &InspectionItemName) -> StoreResult<InspectionItem> {
        self.shared.calls.lock().items += 1;
        self.working.insert_item(device_id, item_name)
    }

    async fn update_item(&mut self, id: i64, device_id: i64, item_name: &InspectionItemName) -> StoreResult<InspectionItem> {
        self.working.check_item(Some(id), device_id, item_name.id)?;
        let item = self
            .working
            .items
            .get_mut(&id)
            .ok_or_else(|| StoreError::Validation(format!("inspection item {id} does not exist")))?;
        item.device_id = device_id;
        item.item_name_id = item_name.id;
        item.item_name = item_name.name.clone();
        item.updated_at = Utc::now();
        Ok(item.clone())
    }

    async fn savepoint(&mut self) -> StoreResult<()> {
        self.savepoint = Some(self.working.clone());
        Ok(())
    }

    async fn release_savepoint(&mut self) -> StoreResult<()> {
        self.savepoint = None;
        Ok(())
    }

    async fn rollback_to_savepoint(&mut self) -> StoreResult<()> {
        let snapshot = self
            .savepoint
            .take()
            .ok_or_else(|| StoreError::Unavailable("no active savepoint".into()))?;
        // ids handed out inside the savepoint stay consumed, like a sequence
        let last_id = self.working.last_id;
        self.working = snapshot;
        self.working.last_id = last_id;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        if self.shared.faults.lock().fail_commit {
            return Err(StoreError::Unavailable("commit failed: connection lost".into()));
        }
        *self.shared.state.lock() = self.working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_uncommitted_writes_are_invisible() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.create_customer("A社").await.unwrap();
        assert!(store.customers().is_empty());

        tx.commit().await.unwrap();
        assert_eq!(store.customers().len(), 1);
    }

    #[tokio::test]
    async fn test_rollback_to_savepoint_discards_row_writes() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.create_customer("keep").await.unwrap();
        tx.savepoint().await.unwrap();
        tx.create_customer("discard").await.unwrap();
        tx.rollback_to_savepoint().await.unwrap();
        tx.commit().await.unwrap();

        let names: Vec<_> = store.customers().into_iter().map(|c| c.customer_name).collect();
        assert_eq!(names, vec!["keep".to_string()]);
        assert_eq!(store.create_calls().customers, 2);
    }

    #[tokio::test]
    async fn test_device_location_is_unique() {
        let store = MemoryStore::new();
        let customer = store.seed_customer("A社");
        let mut fields = DeviceFields::placeholder(customer.id, "web-01");
        fields.rack_number = Some("5".into());
        store.seed_device(fields.clone());

        let mut tx = store.begin().await.unwrap();
        let err = tx.create_device(&fields).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_failed_commit_keeps_previous_state() {
        let store = MemoryStore::new();
        store.fail_commit();
        let mut tx = store.begin().await.unwrap();
        tx.create_item_name("外観確認").await.unwrap();
        assert!(tx.commit().await.is_err());
        assert!(store.item_names().is_empty());
    }
}
