//! Lookup-or-create of master entities by natural key
//!
//! Resolution order per key: request cache, then storage (inside the import
//! transaction), then create. Only distinct keys reach the database.
//!
//! Lookup-then-create is not atomic. Two concurrent imports introducing the
//! same new customer name can both create it; for catalog names the unique
//! constraint rejects the loser's row instead.

use std::hash::Hash;

use async_trait::async_trait;
use tracing::debug;

use super::cache::{CacheCheckpoint, EntityCache};
use crate::db::{ImportTx, StoreResult};
use crate::types::{Customer, Device, DeviceFields, InspectionItemName};

/// A natural key that knows how to find and create its entity
#[async_trait]
pub trait NaturalKey: Eq + Hash + Clone + Send + Sync {
    type Entity: Clone + Send;

    const ENTITY: &'static str;

    async fn find(&self, tx: &mut dyn ImportTx) -> StoreResult<Option<Self::Entity>>;
    async fn create(&self, tx: &mut dyn ImportTx) -> StoreResult<Self::Entity>;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CustomerKey(pub String);

#[async_trait]
impl NaturalKey for CustomerKey {
    type Entity = Customer;
    const ENTITY: &'static str = "customer";

    async fn find(&self, tx: &mut dyn ImportTx) -> StoreResult<Option<Customer>> {
        tx.find_customer_by_name(&self.0).await
    }

    async fn create(&self, tx: &mut dyn ImportTx) -> StoreResult<Customer> {
        tx.create_customer(&self.0).await
    }
}

/// Device looked up by owner and name only; created bare when absent
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceKey {
    pub customer_id: i64,
    pub device_name: String,
}

#[async_trait]
impl NaturalKey for DeviceKey {
    type Entity = Device;
    const ENTITY: &'static str = "device";

    async fn find(&self, tx: &mut dyn ImportTx) -> StoreResult<Option<Device>> {
        tx.find_device_by_name(self.customer_id, &self.device_name).await
    }

    async fn create(&self, tx: &mut dyn ImportTx) -> StoreResult<Device> {
        tx.create_device(&DeviceFields::placeholder(self.customer_id, &self.device_name)).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemNameKey(pub String);

#[async_trait]
impl NaturalKey for ItemNameKey {
    type Entity = InspectionItemName;
    const ENTITY: &'static str = "item_name";

    async fn find(&self, tx: &mut dyn ImportTx) -> StoreResult<Option<InspectionItemName>> {
        tx.find_item_name_by_name(&self.0).await
    }

    async fn create(&self, tx: &mut dyn ImportTx) -> StoreResult<InspectionItemName> {
        tx.create_item_name(&self.0).await
    }
}

async fn resolve_or_create<K: NaturalKey>(
    cache: &mut EntityCache<K, K::Entity>,
    tx: &mut dyn ImportTx,
    key: K,
) -> StoreResult<K::Entity> {
    if let Some(entity) = cache.get(&key) {
        return Ok(entity.clone());
    }

    let entity = match key.find(tx).await? {
        Some(found) => found,
        None => {
            debug!("Creating {} for unseen natural key", K::ENTITY);
            key.create(tx).await?
        }
    };
    cache.insert(key, entity.clone());
    Ok(entity)
}

/// Snapshot of all caches at the start of a row
#[derive(Debug, Clone, Copy)]
pub struct ResolverCheckpoint {
    customers: CacheCheckpoint,
    devices: CacheCheckpoint,
    item_names: CacheCheckpoint,
}

/// Resolver owning the caches of one import call
#[derive(Debug, Default)]
pub struct EntityResolver {
    customers: EntityCache<CustomerKey, Customer>,
    devices: EntityCache<DeviceKey, Device>,
    item_names: EntityCache<ItemNameKey, InspectionItemName>,
}

impl EntityResolver {
    pub async fn customer(&mut self, tx: &mut dyn ImportTx, customer_name: &str) -> StoreResult<Customer> {
        resolve_or_create(&mut self.customers, tx, CustomerKey(customer_name.to_string())).await
    }

    pub async fn device(&mut self, tx: &mut dyn ImportTx, customer: &Customer, device_name: &str) -> StoreResult<Device> {
        let key = DeviceKey {
            customer_id: customer.id,
            device_name: device_name.to_string(),
        };
        resolve_or_create(&mut self.devices, tx, key).await
    }

    pub async fn item_name(&mut self, tx: &mut dyn ImportTx, name: &str) -> StoreResult<InspectionItemName> {
        resolve_or_create(&mut self.item_names, tx, ItemNameKey(name.to_string())).await
    }

    /// Entities currently cached across all natural keys
    pub fn cached_entities(&self) -> usize {
        self.customers.len() + self.devices.len() + self.item_names.len()
    }

    pub fn checkpoint(&self) -> ResolverCheckpoint {
        ResolverCheckpoint {
            customers: self.customers.checkpoint(),
            devices: self.devices.checkpoint(),
            item_names: self.item_names.checkpoint(),
        }
    }

    pub fn rollback_to(&mut self, checkpoint: ResolverCheckpoint) {
        self.customers.rollback_to(checkpoint.customers);
        self.devices.rollback_to(checkpoint.devices);
        self.item_names.rollback_to(checkpoint.item_names);
    }
}
