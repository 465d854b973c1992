use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::classify::{Severity, ThresholdRule};
use crate::decode::FieldSpec;
use crate::formatter::summary::Template;
use crate::registry::SectionKind;
use crate::snmp::FetchMode;

/// Встроенный профиль APC rPDU2
const BUILTIN_PROFILE: &str = include_str!("../../profiles/apc-rpdu2.yaml");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub name: String, // Название профиля, например "apc-rpdu2"
    /// OID, который должен отвечать, чтобы устройство считалось поддерживаемым
    #[serde(default)]
    pub detect: Option<String>,
    pub sections: Vec<SectionProfile>,
}

/// Раздел профиля в том виде, как он записан в YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionProfile {
    pub kind: SectionKind,
    pub base_oid: String,
    #[serde(default)]
    pub mode: FetchMode,
    pub columns: Vec<FieldSpec>,
    pub rule: ThresholdRule,
    pub label: Template,
    pub summary: Template,
    #[serde(default)]
    pub summary_by_severity: BTreeMap<Severity, Template>,
}

impl Profile {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Не удалось прочитать файл: {}", path))?;

        Self::parse(&content)
    }

    pub fn builtin() -> Result<Self> {
        Self::parse(BUILTIN_PROFILE).context("Встроенный профиль повреждён")
    }

    fn parse(content: &str) -> Result<Self> {
        let profile: Profile =
            serde_yml::from_str(content).context("Не удалось распарсить YAML")?;

        if profile.sections.is_empty() {
            anyhow::bail!("Профиль '{}' пустой", profile.name);
        }

        Ok(profile)
    }
}
