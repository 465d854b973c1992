use serde::Deserialize;

/// Тело запроса на опрос PDU по SNMPv2c
#[derive(Debug, Deserialize)]
pub struct Snmpv2c {
    pub ip: String,
    /// Если не указан, берётся из настроек
    #[serde(default)]
    pub community: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
}

impl Snmpv2c {
    /// Адрес агента с портом
    pub fn target(&self) -> String {
        let ip = self.ip.trim();
        match self.port {
            Some(port) if ip.contains(':') => format!("[{}]:{}", ip.trim_matches(['[', ']']), port),
            Some(port) => format!("{}:{}", ip, port),
            None => crate::config::with_default_port(ip),
        }
    }
}
