use serde::Serialize;

use crate::classify::Severity;
use crate::decode::DecodeError;
use crate::registry::SectionKind;
use crate::snmp::{DeviceInfo, FetchError};

/// Результат проверки одной записи
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    /// Стабильное имя сущности, например "Phase 1" или "Outlet: web-01"
    pub label: String,
    pub severity: Severity,
    pub summary: String,
}

/// Запись, которую не удалось декодировать в этом цикле
#[derive(Debug, Clone, PartialEq)]
pub struct RecordFailure {
    pub label: String,
    pub index: usize,
    pub error: DecodeError,
}

/// Итог одного раздела за цикл
#[derive(Debug, Clone, PartialEq)]
pub struct SectionOutcome {
    pub kind: SectionKind,
    /// Ошибка получения данных; при ней записей нет
    pub fetch_error: Option<FetchError>,
    /// Сущности, присутствующие на устройстве (для инвентаризации сервисов)
    pub labels: Vec<String>,
    pub results: Vec<CheckResult>,
    pub failures: Vec<RecordFailure>,
}

impl SectionOutcome {
    pub fn empty(kind: SectionKind) -> Self {
        Self {
            kind,
            fetch_error: None,
            labels: Vec::new(),
            results: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Раздел отсутствует в этом цикле
    pub fn absent(kind: SectionKind, error: FetchError) -> Self {
        Self {
            fetch_error: Some(error),
            ..Self::empty(kind)
        }
    }
}

/// Полный результат опроса устройства
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceReport {
    pub target: String,
    pub profile: String,
    pub device: DeviceInfo,
    pub sections: Vec<SectionOutcome>,
}

impl DeviceReport {
    pub fn results(&self) -> impl Iterator<Item = &CheckResult> {
        self.sections.iter().flat_map(|s| s.results.iter())
    }

    /// Худшее состояние цикла. Если ни один раздел не получен, результат
    /// недостоверен и считается UNKNOWN; недекодированная запись поднимает
    /// состояние минимум до UNKNOWN.
    pub fn overall_severity(&self) -> Severity {
        if !self.sections.is_empty() && self.sections.iter().all(|s| s.fetch_error.is_some()) {
            return Severity::Unknown;
        }
        let worst = Severity::worst(self.results().map(|r| r.severity));
        if self.has_failures() {
            Severity::worst([worst, Severity::Unknown])
        } else {
            worst
        }
    }

    pub fn has_failures(&self) -> bool {
        self.sections.iter().any(|s| !s.failures.is_empty())
    }
}
