/// Device type given to devices created without an explicit type
pub const DEFAULT_DEVICE_TYPE: &str = "サーバー";

/// Hardware type given to devices created without an explicit type
pub const DEFAULT_HARDWARE_TYPE: &str = "物理";

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
