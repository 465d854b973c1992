pub mod snmpv2c;

pub use snmpv2c::Snmpv2c;
