use anyhow::{Context, Result, bail};
use snmp2::Oid;

/// Парсит OID вида `.1.3.6.1...` (ведущая точка допускается)
pub fn parse_oid(s: &str) -> Result<Oid<'static>> {
    let parts: Result<Vec<u64>, _> = s
        .trim()
        .split('.')
        .filter(|p| !p.is_empty())
        .map(|p| p.parse::<u64>())
        .collect();

    let parts = parts.context(format!("Невалидный OID: {}", s))?;
    if parts.is_empty() {
        bail!("Пустой OID: '{}'", s);
    }
    Oid::from(&parts).map_err(|e| anyhow::anyhow!("Не удалось создать Oid из '{}': {:?}", s, e))
}

/// Склеивает базовый OID раздела и суффикс колонки
pub fn join_oid(base: &str, suffix: &str) -> String {
    let base = base.trim().trim_end_matches('.');
    let suffix = suffix.trim().trim_start_matches('.');
    if suffix.is_empty() {
        base.to_string()
    } else {
        format!("{}.{}", base, suffix)
    }
}
