use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Итог оценки одной записи
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Ok,
    Warn,
    Crit,
    Unknown,
}

impl Severity {
    /// Вес для выбора худшего состояния: CRIT > UNKNOWN > WARN > OK
    fn rank(self) -> u8 {
        match self {
            Severity::Ok => 0,
            Severity::Warn => 1,
            Severity::Unknown => 2,
            Severity::Crit => 3,
        }
    }

    /// Код возврата в стиле monitoring-плагинов
    pub fn exit_code(self) -> u8 {
        match self {
            Severity::Ok => 0,
            Severity::Warn => 1,
            Severity::Crit => 2,
            Severity::Unknown => 3,
        }
    }

    /// Худшее из состояний; пустой набор считается OK
    pub fn worst(states: impl IntoIterator<Item = Severity>) -> Severity {
        states
            .into_iter()
            .max_by_key(|s| s.rank())
            .unwrap_or(Severity::Ok)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Ok => "OK",
            Severity::Warn => "WARN",
            Severity::Crit => "CRIT",
            Severity::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// То, что правило может спросить у декодированной записи.
/// `None` означает, что у записи нет такого значения.
pub trait Observed {
    fn code(&self, field: &str) -> Option<i64>;
    fn value(&self, field: &str) -> Option<f64>;
    fn active_count(&self) -> Option<usize>;
}

/// Полоса порогового правила; без `max` совпадает с любым значением
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band {
    #[serde(default)]
    pub max: Option<f64>,
    pub severity: Severity,
}

/// Правило классификации для типа проверки
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ThresholdRule {
    /// Код состояния -> severity; неизвестный код -> UNKNOWN
    Enumerated {
        field: String,
        codes: BTreeMap<i64, Severity>,
    },
    /// Полосы по возрастанию, первая с `value <= max` выигрывает
    Banded { field: String, bands: Vec<Band> },
    /// Есть активные элементы -> `active`, нет -> OK
    Presence {
        #[serde(default = "default_active")]
        active: Severity,
    },
    Fixed { severity: Severity },
}

fn default_active() -> Severity {
    Severity::Crit
}

impl ThresholdRule {
    /// Поле записи, на которое смотрит правило
    pub fn field(&self) -> Option<&str> {
        match self {
            ThresholdRule::Enumerated { field, .. } | ThresholdRule::Banded { field, .. } => {
                Some(field)
            }
            ThresholdRule::Presence { .. } | ThresholdRule::Fixed { .. } => None,
        }
    }

    pub fn classify(&self, record: &dyn Observed) -> Severity {
        match self {
            ThresholdRule::Enumerated { field, codes } => {
                let Some(code) = record.code(field) else {
                    return Severity::Unknown;
                };
                match codes.get(&code) {
                    Some(severity) => *severity,
                    None => {
                        tracing::debug!(field = %field, code, "код состояния отсутствует в таблице");
                        Severity::Unknown
                    }
                }
            }
            ThresholdRule::Banded { field, bands } => match record.value(field) {
                Some(value) if value.is_finite() => classify_banded(bands, value),
                _ => Severity::Unknown,
            },
            ThresholdRule::Presence { active } => match record.active_count() {
                Some(0) => Severity::Ok,
                Some(_) => *active,
                None => Severity::Unknown,
            },
            ThresholdRule::Fixed { severity } => *severity,
        }
    }
}

fn classify_banded(bands: &[Band], value: f64) -> Severity {
    bands
        .iter()
        .find(|band| band.max.is_none_or(|max| value <= max))
        .or_else(|| bands.last())
        .map(|band| band.severity)
        .unwrap_or(Severity::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Probe {
        code: Option<i64>,
        value: Option<f64>,
        count: Option<usize>,
    }

    impl Observed for Probe {
        fn code(&self, _field: &str) -> Option<i64> {
            self.code
        }
        fn value(&self, _field: &str) -> Option<f64> {
            self.value
        }
        fn active_count(&self) -> Option<usize> {
            self.count
        }
    }

    fn code(code: i64) -> Probe {
        Probe { code: Some(code), value: None, count: None }
    }

    fn value(value: f64) -> Probe {
        Probe { code: None, value: Some(value), count: None }
    }

    fn load_state_rule() -> ThresholdRule {
        ThresholdRule::Enumerated {
            field: "load_state".into(),
            codes: BTreeMap::from([
                (1, Severity::Ok),
                (2, Severity::Warn),
                (3, Severity::Crit),
                (4, Severity::Crit),
            ]),
        }
    }

    fn temperature_rule() -> ThresholdRule {
        ThresholdRule::Banded {
            field: "temperature".into(),
            bands: vec![
                Band { max: Some(40.0), severity: Severity::Ok },
                Band { max: Some(50.0), severity: Severity::Warn },
                Band { max: None, severity: Severity::Crit },
            ],
        }
    }

    #[test]
    fn load_state_codes() {
        let rule = load_state_rule();
        assert_eq!(rule.classify(&code(1)), Severity::Ok);
        assert_eq!(rule.classify(&code(2)), Severity::Warn);
        assert_eq!(rule.classify(&code(3)), Severity::Crit);
        assert_eq!(rule.classify(&code(4)), Severity::Crit);
        assert_eq!(rule.classify(&code(99)), Severity::Unknown);
    }

    #[test]
    fn temperature_bands_are_inclusive_upper_bounds() {
        let rule = temperature_rule();
        assert_eq!(rule.classify(&value(40.0)), Severity::Ok);
        assert_eq!(rule.classify(&value(40.5)), Severity::Warn);
        assert_eq!(rule.classify(&value(41.0)), Severity::Warn);
        assert_eq!(rule.classify(&value(50.0)), Severity::Warn);
        assert_eq!(rule.classify(&value(51.0)), Severity::Crit);
        assert_eq!(rule.classify(&value(-10.0)), Severity::Ok);
    }

    #[test]
    fn value_above_all_bounds_takes_last_band() {
        let rule = ThresholdRule::Banded {
            field: "humidity".into(),
            bands: vec![
                Band { max: Some(60.0), severity: Severity::Ok },
                Band { max: Some(80.0), severity: Severity::Warn },
            ],
        };
        assert_eq!(rule.classify(&value(95.0)), Severity::Warn);
    }

    #[test]
    fn presence_counts() {
        let rule = ThresholdRule::Presence { active: Severity::Crit };
        let none = Probe { code: None, value: None, count: Some(0) };
        let three = Probe { code: None, value: None, count: Some(3) };
        assert_eq!(rule.classify(&none), Severity::Ok);
        assert_eq!(rule.classify(&three), Severity::Crit);
    }

    #[test]
    fn missing_inputs_are_unknown() {
        let empty = Probe { code: None, value: None, count: None };
        assert_eq!(load_state_rule().classify(&empty), Severity::Unknown);
        assert_eq!(temperature_rule().classify(&empty), Severity::Unknown);
        assert_eq!(
            ThresholdRule::Presence { active: Severity::Crit }.classify(&empty),
            Severity::Unknown
        );
        assert_eq!(temperature_rule().classify(&value(f64::NAN)), Severity::Unknown);
        assert_eq!(
            ThresholdRule::Fixed { severity: Severity::Ok }.classify(&empty),
            Severity::Ok
        );
    }

    #[test]
    fn worst_prefers_crit_over_unknown() {
        assert_eq!(
            Severity::worst([Severity::Ok, Severity::Unknown, Severity::Warn]),
            Severity::Unknown
        );
        assert_eq!(
            Severity::worst([Severity::Unknown, Severity::Crit]),
            Severity::Crit
        );
        assert_eq!(Severity::worst([]), Severity::Ok);
        assert_eq!(Severity::Unknown.exit_code(), 3);
    }

    #[test]
    fn rule_from_yaml() {
        let yaml = "type: enumerated\nfield: load_state\ncodes:\n  1: OK\n  2: WARN\n";
        let rule: ThresholdRule = serde_yml::from_str(yaml).unwrap();
        assert_eq!(rule.classify(&code(2)), Severity::Warn);
        assert_eq!(rule.field(), Some("load_state"));

        let yaml = "type: presence\n";
        let rule: ThresholdRule = serde_yml::from_str(yaml).unwrap();
        assert_eq!(rule, ThresholdRule::Presence { active: Severity::Crit });
    }
}
