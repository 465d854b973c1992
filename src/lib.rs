//! Опрос PDU по SNMP: корреляция табличных обходов, типизированное
//! декодирование, классификация состояния и сводки для мониторинга.

pub mod classify;
pub mod collector;
pub mod config;
pub mod decode;
pub mod formatter;
pub mod handlers;
pub mod models;
pub mod pipeline;
pub mod registry;
pub mod routes;
pub mod snmp;

pub use classify::{Severity, ThresholdRule};
pub use collector::{CheckResult, DevicePoller, DeviceReport, SectionOutcome};
pub use registry::{Registry, SectionKind};
pub use snmp::{Columns, FetchError, FetchMode, TableFetcher};
