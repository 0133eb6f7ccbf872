//! Device types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::defaults::{DEFAULT_DEVICE_TYPE, DEFAULT_HARDWARE_TYPE};

/// Device entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: i64,
    pub customer_id: i64,
    pub device_name: String,
    pub model: Option<String>,
    pub rack_number: Option<String>,
    pub unit_start_position: Option<i32>,
    pub unit_end_position: Option<i32>,
    pub device_type: String,
    pub hardware_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `(customer, device name, rack, start unit)` - at most one device per key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceLocationKey {
    pub customer_id: i64,
    pub device_name: String,
    pub rack_number: Option<String>,
    pub unit_start_position: Option<i32>,
}

/// Values written when creating or overwriting a device
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceFields {
    pub customer_id: i64,
    pub device_name: String,
    pub model: Option<String>,
    pub rack_number: Option<String>,
    pub unit_start_position: Option<i32>,
    pub unit_end_position: Option<i32>,
    pub device_type: String,
    pub hardware_type: String,
}

impl DeviceFields {
    /// Bare device as created when an inspection-item row names an unknown device
    pub fn placeholder(customer_id: i64, device_name: &str) -> Self {
        Self {
            customer_id,
            device_name: device_name.to_string(),
            model: None,
            rack_number: None,
            unit_start_position: None,
            unit_end_position: None,
            device_type: DEFAULT_DEVICE_TYPE.to_string(),
            hardware_type: DEFAULT_HARDWARE_TYPE.to_string(),
        }
    }

    pub fn location_key(&self) -> DeviceLocationKey {
        DeviceLocationKey {
            customer_id: self.customer_id,
            device_name: self.device_name.clone(),
            rack_number: self.rack_number.clone(),
            unit_start_position: self.unit_start_position,
        }
    }
}

impl From<&Device> for DeviceFields {
    fn from(device: &Device) -> Self {
        Self {
            customer_id: device.customer_id,
            device_name: device.device_name.clone(),
            model: device.model.clone(),
            rack_number: device.rack_number.clone(),
            unit_start_position: device.unit_start_position,
            unit_end_position: device.unit_end_position,
            device_type: device.device_type.clone(),
            hardware_type: device.hardware_type.clone(),
        }
    }
}
