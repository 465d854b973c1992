use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

pub mod profile;
pub mod settings;

pub use profile::{Profile, SectionProfile};
pub use settings::Settings;

/// Стандартный порт SNMP агента
pub const DEFAULT_SNMP_PORT: u16 = 161;

/// Главная конфигурация приложения
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// SNMP профиль устройства
    pub profile: Profile,
    /// Базовые настройки
    pub settings: Settings,
}

impl AppConfig {
    /// Загружает конфигурацию из YAML файла
    pub fn load(profile_path: impl AsRef<Path>) -> Result<Self> {
        let path = profile_path.as_ref();
        let path = path
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("Путь к профилю не в UTF-8: {}", path.display()))?;
        let profile = Profile::load(path)?;

        Ok(Self {
            profile,
            settings: Settings::default(),
        })
    }

    /// Конфигурация со встроенным профилем APC rPDU2
    pub fn builtin() -> Result<Self> {
        Ok(Self {
            profile: Profile::builtin()?,
            settings: Settings::default(),
        })
    }

    /// Получает target из переменной окружения или использует по умолчанию
    pub fn get_target(&self) -> String {
        with_default_port(&env::var("SNMP_TARGET").unwrap_or_else(|_| "127.0.0.1".to_string()))
    }

    /// Получает timeout из переменной окружения или из настроек
    pub fn get_timeout(&self) -> u64 {
        env::var("SNMP_TIMEOUT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(self.settings.connection.timeout)
    }

    /// Получает community для SNMPv2c
    pub fn get_community(&self) -> Vec<u8> {
        env::var("SNMP_COMMUNITY")
            .unwrap_or_else(|_| self.settings.auth.v2c.community.clone())
            .into_bytes()
    }

    /// Интервал опроса в секундах, 0 — один цикл
    pub fn get_poll_interval(&self) -> u64 {
        env::var("PDU_POLL_INTERVAL")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(self.settings.polling.interval)
    }

    /// Адрес HTTP сервера, если он включён
    pub fn get_listen_addr(&self) -> Option<String> {
        env::var("PDU_LISTEN")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| self.settings.server.listen.clone())
    }

    pub fn debug_config(&self) {
        tracing::info!(
            profile = %self.profile.name,
            snmp_target = %self.get_target(),
            timeout_secs = self.get_timeout(),
            sections = self.profile.sections.len(),
            "конфигурация SNMP"
        );
    }
}

/// Добавляет порт 161, если он не указан
pub fn with_default_port(target: &str) -> String {
    let target = target.trim();
    let has_port = match target.rsplit_once(':') {
        // IPv6 без скобок содержит ':' но не порт
        Some((host, port)) => !host.contains(':') && port.parse::<u16>().is_ok(),
        None => false,
    };
    let bracketed_v6_with_port = target.starts_with('[') && target.contains("]:");

    if has_port || bracketed_v6_with_port {
        target.to_string()
    } else if target.contains(':') && !target.starts_with('[') {
        format!("[{}]:{}", target, DEFAULT_SNMP_PORT)
    } else {
        format!("{}:{}", target, DEFAULT_SNMP_PORT)
    }
}
