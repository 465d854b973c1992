pub mod device_profiles;
pub mod fetcher;
pub mod oid;
pub mod v2c;
pub mod value;

pub use device_profiles::{DeviceDetector, DeviceInfo};
pub use fetcher::{Columns, FetchError, FetchMode, SnmpFetcher, TableFetcher};
pub use oid::{join_oid, parse_oid};
pub use v2c::SnmpClientV2c;

/// sysObjectID: `system` + `.2.0`
pub const SYSTEM_OID: &str = ".1.3.6.1.2.1.1";
pub const SYS_OBJECT_ID_SUFFIX: &str = ".2.0";
