use serde::{Deserialize, Serialize};

/// Базовые настройки приложения
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Настройки подключения
    pub connection: ConnectionSettings,
    /// Настройки аутентификации
    pub auth: AuthSettings,
    /// Периодический опрос
    pub polling: PollingSettings,
    /// HTTP режим
    pub server: ServerSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionSettings {
    /// Таймаут для SNMP операций одного раздела (секунды)
    pub timeout: u64,
    /// Количество повторов при ошибках
    pub retries: u32,
    /// max-repetitions для GETBULK
    pub max_repetitions: u32,
    /// Предел строк одной колонки
    pub max_rows: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    /// Настройки SNMPv2c
    pub v2c: SnmpV2cSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnmpV2cSettings {
    /// Community string
    pub community: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingSettings {
    /// Интервал между циклами (секунды), 0 — один цикл
    pub interval: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Адрес HTTP сервера; без него сервер не запускается
    pub listen: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            connection: ConnectionSettings {
                timeout: 10,
                retries: 2,
                max_repetitions: 10,
                max_rows: 256,
            },
            auth: AuthSettings {
                v2c: SnmpV2cSettings {
                    community: "public".to_string(),
                },
            },
            polling: PollingSettings { interval: 0 },
            server: ServerSettings { listen: None },
        }
    }
}
