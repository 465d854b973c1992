//! Реестр разделов: собирается один раз из профиля при старте и дальше
//! только читается. Все проверки профиля делаются здесь, чтобы опрос
//! работал с заведомо согласованными схемами, правилами и шаблонами.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::classify::ThresholdRule;
use crate::config::{Profile, SectionProfile};
use crate::decode::records::extra_placeholders;
use crate::decode::{AlarmSet, DeviceStatus, EnvReading, FieldKind, FieldSpec, OutletReading, PhaseReading};
use crate::formatter::summary::{SummaryTemplates, Template};
use crate::snmp::{FetchMode, join_oid, parse_oid};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Device,
    Phases,
    Outlets,
    Environment,
    Alarms,
}

/// Как строки таблицы превращаются в записи
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Одна запись на устройство, берётся первая строка
    Singleton,
    /// Запись на каждую строку
    Table,
    /// Все строки сворачиваются в одну запись
    Aggregate,
}

impl SectionKind {
    pub fn name(self) -> &'static str {
        match self {
            SectionKind::Device => "device",
            SectionKind::Phases => "phases",
            SectionKind::Outlets => "outlets",
            SectionKind::Environment => "environment",
            SectionKind::Alarms => "alarms",
        }
    }

    pub fn shape(self) -> Shape {
        match self {
            SectionKind::Device => Shape::Singleton,
            SectionKind::Alarms => Shape::Aggregate,
            SectionKind::Phases | SectionKind::Outlets | SectionKind::Environment => Shape::Table,
        }
    }

    /// Поля, которые схема раздела должна объявить
    pub fn fields(self) -> &'static [(&'static str, FieldKind)] {
        match self {
            SectionKind::Device => DeviceStatus::FIELDS,
            SectionKind::Phases => PhaseReading::FIELDS,
            SectionKind::Outlets => OutletReading::FIELDS,
            SectionKind::Environment => EnvReading::FIELDS,
            SectionKind::Alarms => AlarmSet::FIELDS,
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Проверенное описание раздела: схема, правило и шаблоны
#[derive(Debug, Clone)]
pub struct SectionDef {
    pub kind: SectionKind,
    pub base_oid: String,
    pub mode: FetchMode,
    pub columns: Vec<FieldSpec>,
    pub rule: ThresholdRule,
    pub label: Template,
    pub summary: SummaryTemplates,
}

impl SectionDef {
    pub fn suffixes(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.oid.clone()).collect()
    }

    pub fn shape(&self) -> Shape {
        self.kind.shape()
    }

    pub fn from_profile(section: &SectionProfile) -> Result<Self> {
        let kind = section.kind;
        parse_oid(&section.base_oid)?;

        if section.columns.is_empty() {
            bail!("раздел '{}': нет колонок", kind);
        }

        let mut names = HashSet::new();
        for column in &section.columns {
            if !names.insert(column.name.as_str()) {
                bail!("раздел '{}': колонка '{}' объявлена дважды", kind, column.name);
            }
            parse_oid(&join_oid(&section.base_oid, &column.oid))?;

            if let Some(divisor) = column.divide_by {
                if column.kind != FieldKind::Float {
                    bail!(
                        "раздел '{}': divide_by допустим только для float, колонка '{}' имеет тип {}",
                        kind,
                        column.name,
                        column.kind
                    );
                }
                if !divisor.is_finite() || divisor == 0.0 {
                    bail!("раздел '{}': недопустимый делитель {} у '{}'", kind, divisor, column.name);
                }
            }
        }

        for (name, expected) in kind.fields() {
            match section.columns.iter().find(|c| c.name == *name) {
                Some(column) if column.kind == *expected => {}
                Some(column) => bail!(
                    "раздел '{}': колонка '{}' должна быть {}, а не {}",
                    kind,
                    name,
                    expected,
                    column.kind
                ),
                None => bail!("раздел '{}': нет обязательной колонки '{}'", kind, name),
            }
        }
        if let Some(extra) = section
            .columns
            .iter()
            .find(|c| !kind.fields().iter().any(|(name, _)| *name == c.name))
        {
            bail!("раздел '{}': неизвестная колонка '{}'", kind, extra.name);
        }

        validate_rule(kind, &section.rule, &section.columns)?;

        let summary = SummaryTemplates {
            default: section.summary.clone(),
            by_severity: section.summary_by_severity.clone(),
        };
        for template in summary.all() {
            for name in template.placeholders() {
                let known = names.contains(name)
                    || extra_placeholders(kind).iter().any(|extra| *extra == name)
                    || name == "severity";
                if !known {
                    bail!(
                        "раздел '{}': шаблон '{}' ссылается на неизвестное поле '{}'",
                        kind,
                        template.source(),
                        name
                    );
                }
            }
        }
        for name in section.label.placeholders() {
            if !names.contains(name) && name != "index" {
                bail!(
                    "раздел '{}': метка '{}' ссылается на неизвестное поле '{}'",
                    kind,
                    section.label.source(),
                    name
                );
            }
        }

        Ok(Self {
            kind,
            base_oid: section.base_oid.clone(),
            mode: section.mode,
            columns: section.columns.clone(),
            rule: section.rule.clone(),
            label: section.label.clone(),
            summary,
        })
    }
}

fn validate_rule(kind: SectionKind, rule: &ThresholdRule, columns: &[FieldSpec]) -> Result<()> {
    let column_kind = |field: &str| columns.iter().find(|c| c.name == field).map(|c| c.kind);

    match rule {
        ThresholdRule::Enumerated { field, .. } => {
            if column_kind(field) != Some(FieldKind::Int) {
                bail!("раздел '{}': правило enumerated требует int-колонку '{}'", kind, field);
            }
        }
        ThresholdRule::Banded { field, bands } => {
            if !matches!(column_kind(field), Some(FieldKind::Int | FieldKind::Float)) {
                bail!("раздел '{}': правило banded требует числовую колонку '{}'", kind, field);
            }
            if bands.is_empty() {
                bail!("раздел '{}': у правила banded нет полос", kind);
            }
            let bounds: Vec<f64> = bands.iter().filter_map(|b| b.max).collect();
            if bounds.windows(2).any(|w| w[0] >= w[1]) {
                bail!("раздел '{}': границы полос должны возрастать", kind);
            }
        }
        ThresholdRule::Presence { .. } => {
            if kind.shape() != Shape::Aggregate {
                bail!("раздел '{}': правило presence применимо только к авариям", kind);
            }
        }
        ThresholdRule::Fixed { .. } => {}
    }
    Ok(())
}

/// Набор разделов профиля в порядке объявления
#[derive(Debug, Clone)]
pub struct Registry {
    profile: String,
    detect: Option<String>,
    sections: Vec<Arc<SectionDef>>,
}

impl Registry {
    pub fn from_profile(profile: &Profile) -> Result<Self> {
        if profile.sections.is_empty() {
            bail!("профиль '{}' не содержит разделов", profile.name);
        }
        if let Some(detect) = &profile.detect {
            parse_oid(detect)?;
        }

        let mut seen = HashSet::new();
        let mut sections = Vec::with_capacity(profile.sections.len());
        for section in &profile.sections {
            if !seen.insert(section.kind) {
                bail!("профиль '{}': раздел '{}' объявлен дважды", profile.name, section.kind);
            }
            sections.push(Arc::new(SectionDef::from_profile(section)?));
        }

        Ok(Self {
            profile: profile.name.clone(),
            detect: profile.detect.clone(),
            sections,
        })
    }

    pub fn profile_name(&self) -> &str {
        &self.profile
    }

    /// OID, по наличию которого устройство считается поддерживаемым
    pub fn detect_oid(&self) -> Option<&str> {
        self.detect.as_deref()
    }

    pub fn sections(&self) -> &[Arc<SectionDef>] {
        &self.sections
    }

    pub fn get(&self, kind: SectionKind) -> Option<&SectionDef> {
        self.sections.iter().find(|s| s.kind == kind).map(Arc::as_ref)
    }
}
