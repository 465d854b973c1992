use serde::{Deserialize, Serialize};
use std::future::Future;
use tokio::time::{Duration, timeout};

use super::oid::{join_oid, parse_oid};
use super::v2c::SnmpClientV2c;
use crate::config::AppConfig;

/// Колонки раздела: по одной последовательности значений на суффикс
pub type Columns = Vec<Vec<String>>;

/// Как запрашивать колонки раздела
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// GET скалярных экземпляров (`.0` или конкретный индекс)
    Get,
    /// WALK табличной колонки
    #[default]
    Walk,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("устройство недоступно: {0}")]
    Unreachable(String),

    #[error("TIMEOUT после {0} с")]
    Timeout(u64),

    #[error("OID PARSE ERROR: {0}")]
    InvalidOid(String),

    #[error("SNMP ERROR: {0}")]
    Request(String),

    #[error("устройство не опознано: нет значения {0}")]
    NotDetected(String),

    #[error("опрос раздела прерван: {0}")]
    Aborted(String),
}

impl FetchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout(_))
    }

    fn is_retryable(&self) -> bool {
        matches!(
            self,
            FetchError::Unreachable(_) | FetchError::Timeout(_) | FetchError::Request(_)
        )
    }
}

/// Источник сырых SNMP данных.
///
/// Возвращает по одной упорядоченной последовательности на каждый суффикс,
/// строки выровнены по порядку таблицы устройства.
pub trait TableFetcher: Send + Sync {
    fn fetch(
        &self,
        base_oid: &str,
        suffixes: &[String],
        mode: FetchMode,
    ) -> impl Future<Output = Result<Columns, FetchError>> + Send;
}

/// SNMPv2c реализация: отдельная сессия на каждый запрос раздела,
/// так что разделы можно опрашивать параллельно
#[derive(Debug, Clone)]
pub struct SnmpFetcher {
    target: String,
    community: Vec<u8>,
    timeout: Duration,
    retries: u32,
    max_repetitions: u32,
    max_rows: usize,
}

impl SnmpFetcher {
    pub fn from_config(config: &AppConfig, target: &str, community: Vec<u8>) -> Self {
        let connection = &config.settings.connection;
        Self {
            target: target.to_string(),
            community,
            timeout: Duration::from_secs(config.get_timeout()),
            retries: connection.retries,
            max_repetitions: connection.max_repetitions,
            max_rows: connection.max_rows,
        }
    }

    async fn fetch_once(
        &self,
        base_oid: &str,
        suffixes: &[String],
        mode: FetchMode,
    ) -> Result<Columns, FetchError> {
        let mut client = SnmpClientV2c::new(&self.target, &self.community)
            .await
            .map_err(|e| FetchError::Unreachable(format!("{:#}", e)))?;

        let mut columns = Vec::with_capacity(suffixes.len());
        for suffix in suffixes {
            let oid_str = join_oid(base_oid, suffix);
            let oid = parse_oid(&oid_str).map_err(|_| FetchError::InvalidOid(oid_str.clone()))?;

            let column: Vec<String> = match mode {
                FetchMode::Get => client
                    .get(&oid)
                    .await
                    .map_err(|e| FetchError::Request(format!("{:#}", e)))?
                    .into_iter()
                    .collect(),
                FetchMode::Walk => client
                    .walk(&oid, self.max_repetitions, self.max_rows)
                    .await
                    .map_err(|e| FetchError::Request(format!("{:#}", e)))?
                    .into_iter()
                    .map(|(_, value)| value)
                    .collect(),
            };
            columns.push(column);
        }

        Ok(columns)
    }
}

impl TableFetcher for SnmpFetcher {
    fn fetch(
        &self,
        base_oid: &str,
        suffixes: &[String],
        mode: FetchMode,
    ) -> impl Future<Output = Result<Columns, FetchError>> + Send {
        let limit = self.timeout;
        with_retries(self.retries, &self.target, base_oid, move || async move {
            match timeout(limit, self.fetch_once(base_oid, suffixes, mode)).await {
                Ok(result) => result,
                Err(_) => Err(FetchError::Timeout(limit.as_secs())),
            }
        })
    }
}

/// Повторяет запрос до `retries` раз, пока ошибка допускает повтор
pub async fn with_retries<T, Fut, Op>(
    retries: u32,
    device: &str,
    base_oid: &str,
    mut op: Op,
) -> Result<T, FetchError>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Err(e) if e.is_retryable() && attempt < retries => {
                attempt += 1;
                tracing::debug!(device, base_oid, attempt, error = %e, "повтор SNMP запроса");
            }
            other => return other,
        }
    }
}
