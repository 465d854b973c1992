use super::{DecodeError, FieldKind, FieldMap, render_float};
use crate::classify::Observed;
use crate::registry::SectionKind;

/// Общее состояние PDU: идентификация и суммарная нагрузка
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceStatus {
    pub model: String,
    pub firmware: String,
    pub load_state: i64,
    pub current: f64,
    pub voltage: f64,
    pub power: f64,
}

impl DeviceStatus {
    pub const FIELDS: &'static [(&'static str, FieldKind)] = &[
        ("model", FieldKind::Text),
        ("firmware", FieldKind::Text),
        ("load_state", FieldKind::Int),
        ("current", FieldKind::Float),
        ("voltage", FieldKind::Float),
        ("power", FieldKind::Float),
    ];

    fn from_fields(fields: &FieldMap) -> Result<Self, DecodeError> {
        Ok(Self {
            model: fields.text("model")?,
            firmware: fields.text("firmware")?,
            load_state: fields.int("load_state")?,
            current: fields.float("current")?,
            voltage: fields.float("voltage")?,
            power: fields.float("power")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhaseReading {
    pub index: usize,
    pub current: f64,
    pub voltage: f64,
}

impl PhaseReading {
    pub const FIELDS: &'static [(&'static str, FieldKind)] =
        &[("current", FieldKind::Float), ("voltage", FieldKind::Float)];
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutletReading {
    pub index: usize,
    pub name: String,
    pub state: i64,
    pub current: f64,
}

impl OutletReading {
    pub const FIELDS: &'static [(&'static str, FieldKind)] = &[
        ("name", FieldKind::Text),
        ("state", FieldKind::Int),
        ("current", FieldKind::Float),
    ];

    /// Имя состояния розетки по PowerNet-MIB: off(1), on(2)
    pub fn state_name(&self) -> String {
        match self.state {
            1 => "off".to_string(),
            2 => "on".to_string(),
            other => format!("unknown({})", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnvReading {
    pub index: usize,
    pub temperature: i64,
    pub humidity: i64,
}

impl EnvReading {
    pub const FIELDS: &'static [(&'static str, FieldKind)] =
        &[("temperature", FieldKind::Int), ("humidity", FieldKind::Int)];
}

/// Все активные аварии устройства одной записью
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlarmSet {
    pub alarms: Vec<String>,
}

impl AlarmSet {
    pub const FIELDS: &'static [(&'static str, FieldKind)] = &[("description", FieldKind::Text)];

    pub fn from_rows<'a>(rows: impl IntoIterator<Item = &'a FieldMap>) -> Result<Self, DecodeError> {
        let alarms = rows
            .into_iter()
            .map(|fields| fields.text("description"))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { alarms })
    }
}

/// Типизированная запись раздела
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Device(DeviceStatus),
    Phase(PhaseReading),
    Outlet(OutletReading),
    Environment(EnvReading),
    Alarms(AlarmSet),
}

impl Record {
    /// Собирает запись строки таблицы. Раздел аварий агрегируется
    /// отдельно через [`AlarmSet::from_rows`], здесь он даёт набор из одной аварии.
    pub fn from_fields(kind: SectionKind, index: usize, fields: &FieldMap) -> Result<Self, DecodeError> {
        Ok(match kind {
            SectionKind::Device => Record::Device(DeviceStatus::from_fields(fields)?),
            SectionKind::Phases => Record::Phase(PhaseReading {
                index,
                current: fields.float("current")?,
                voltage: fields.float("voltage")?,
            }),
            SectionKind::Outlets => Record::Outlet(OutletReading {
                index,
                name: fields.text("name")?,
                state: fields.int("state")?,
                current: fields.float("current")?,
            }),
            SectionKind::Environment => Record::Environment(EnvReading {
                index,
                temperature: fields.int("temperature")?,
                humidity: fields.int("humidity")?,
            }),
            SectionKind::Alarms => Record::Alarms(AlarmSet::from_rows([fields])?),
        })
    }

    /// Значение для подстановки в шаблон сводки
    pub fn placeholder(&self, name: &str) -> Option<String> {
        match self {
            Record::Device(d) => match name {
                "model" => Some(d.model.clone()),
                "firmware" => Some(d.firmware.clone()),
                "load_state" => Some(d.load_state.to_string()),
                "current" => Some(render_float(d.current)),
                "voltage" => Some(render_float(d.voltage)),
                "power" => Some(render_float(d.power)),
                _ => None,
            },
            Record::Phase(p) => match name {
                "index" => Some(p.index.to_string()),
                "current" => Some(render_float(p.current)),
                "voltage" => Some(render_float(p.voltage)),
                _ => None,
            },
            Record::Outlet(o) => match name {
                "index" => Some(o.index.to_string()),
                "name" => Some(o.name.clone()),
                "state" => Some(o.state.to_string()),
                "state_name" => Some(o.state_name()),
                "current" => Some(render_float(o.current)),
                _ => None,
            },
            Record::Environment(e) => match name {
                "index" => Some(e.index.to_string()),
                "temperature" => Some(e.temperature.to_string()),
                "humidity" => Some(e.humidity.to_string()),
                _ => None,
            },
            Record::Alarms(a) => match name {
                "count" => Some(a.alarms.len().to_string()),
                "alarms" => Some(a.alarms.join("; ")),
                _ => None,
            },
        }
    }
}

/// Подстановки сверх полей схемы, доступные шаблонам раздела
pub fn extra_placeholders(kind: SectionKind) -> &'static [&'static str] {
    match kind {
        SectionKind::Device => &[],
        SectionKind::Phases | SectionKind::Environment => &["index"],
        SectionKind::Outlets => &["index", "state_name"],
        SectionKind::Alarms => &["count", "alarms"],
    }
}

impl Observed for Record {
    fn code(&self, field: &str) -> Option<i64> {
        match (self, field) {
            (Record::Device(d), "load_state") => Some(d.load_state),
            (Record::Outlet(o), "state") => Some(o.state),
            (Record::Environment(e), "temperature") => Some(e.temperature),
            (Record::Environment(e), "humidity") => Some(e.humidity),
            _ => None,
        }
    }

    fn value(&self, field: &str) -> Option<f64> {
        match (self, field) {
            (Record::Device(d), "current") => Some(d.current),
            (Record::Device(d), "voltage") => Some(d.voltage),
            (Record::Device(d), "power") => Some(d.power),
            (Record::Phase(p), "current") => Some(p.current),
            (Record::Phase(p), "voltage") => Some(p.voltage),
            (Record::Outlet(o), "current") => Some(o.current),
            _ => self.code(field).map(|code| code as f64),
        }
    }

    fn active_count(&self) -> Option<usize> {
        match self {
            Record::Alarms(a) => Some(a.alarms.len()),
            _ => None,
        }
    }
}
