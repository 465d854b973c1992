//! Декодирование сырых строк SNMP в типизированные поля.
//!
//! Схема раздела — упорядоченный список колонок. Ошибка в одном поле
//! делает непригодной только свою запись: подстановки значений по умолчанию нет.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::collector::correlate::Row;

pub mod records;

pub use records::{AlarmSet, DeviceStatus, EnvReading, OutletReading, PhaseReading, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Int,
    Float,
    Text,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FieldKind::Int => "int",
            FieldKind::Float => "float",
            FieldKind::Text => "text",
        })
    }
}

/// Описание одной колонки раздела
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    /// Суффикс OID колонки относительно базового OID раздела
    pub oid: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    /// Делитель для float, например 10 для десятых долей ампера
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub divide_by: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Int(_) => FieldKind::Int,
            FieldValue::Float(_) => FieldKind::Float,
            FieldValue::Text(_) => FieldKind::Text,
        }
    }

    /// Строковое представление для сводок
    pub fn render(&self) -> String {
        match self {
            FieldValue::Int(v) => v.to_string(),
            FieldValue::Float(v) => render_float(*v),
            FieldValue::Text(v) => v.clone(),
        }
    }
}

/// Кратчайшая точная запись числа; у целых значений остаётся `.0`
pub fn render_float(value: f64) -> String {
    let text = value.to_string();
    if text.contains('.') || !value.is_finite() {
        text
    } else {
        format!("{}.0", text)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("поле '{field}': '{raw}' не является целым числом")]
    InvalidInt { field: String, raw: String },

    #[error("поле '{field}': '{raw}' не является конечным числом")]
    InvalidFloat { field: String, raw: String },

    #[error("поле '{field}': нет значения в строке таблицы")]
    MissingColumn { field: String },

    #[error("поле '{field}' отсутствует в записи")]
    MissingField { field: String },

    #[error("поле '{field}' имеет тип {actual}, ожидался {expected}")]
    WrongType {
        field: String,
        expected: FieldKind,
        actual: FieldKind,
    },
}

/// Декодированные поля одной строки в порядке схемы
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldMap {
    fields: Vec<(String, FieldValue)>,
}

impl FieldMap {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    fn require(&self, name: &str) -> Result<&FieldValue, DecodeError> {
        self.get(name).ok_or_else(|| DecodeError::MissingField {
            field: name.to_string(),
        })
    }

    fn wrong_type(name: &str, expected: FieldKind, actual: &FieldValue) -> DecodeError {
        DecodeError::WrongType {
            field: name.to_string(),
            expected,
            actual: actual.kind(),
        }
    }

    pub fn int(&self, name: &str) -> Result<i64, DecodeError> {
        match self.require(name)? {
            FieldValue::Int(v) => Ok(*v),
            other => Err(Self::wrong_type(name, FieldKind::Int, other)),
        }
    }

    pub fn float(&self, name: &str) -> Result<f64, DecodeError> {
        match self.require(name)? {
            FieldValue::Float(v) => Ok(*v),
            other => Err(Self::wrong_type(name, FieldKind::Float, other)),
        }
    }

    pub fn text(&self, name: &str) -> Result<String, DecodeError> {
        match self.require(name)? {
            FieldValue::Text(v) => Ok(v.clone()),
            other => Err(Self::wrong_type(name, FieldKind::Text, other)),
        }
    }
}

/// Декодирует одно сырое значение по описанию колонки
pub fn decode_field(spec: &FieldSpec, raw: &str) -> Result<FieldValue, DecodeError> {
    match spec.kind {
        FieldKind::Int => raw
            .trim()
            .parse::<i64>()
            .map(FieldValue::Int)
            .map_err(|_| DecodeError::InvalidInt {
                field: spec.name.clone(),
                raw: raw.to_string(),
            }),
        FieldKind::Float => {
            let value = raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| DecodeError::InvalidFloat {
                    field: spec.name.clone(),
                    raw: raw.to_string(),
                })?;
            Ok(FieldValue::Float(match spec.divide_by {
                Some(divisor) => value / divisor,
                None => value,
            }))
        }
        FieldKind::Text => Ok(FieldValue::Text(raw.to_string())),
    }
}

/// Декодирует строку таблицы целиком; первая же ошибка поля возвращается наверх
pub fn decode_row(schema: &[FieldSpec], row: &Row) -> Result<FieldMap, DecodeError> {
    let mut fields = Vec::with_capacity(schema.len());

    for (position, spec) in schema.iter().enumerate() {
        let raw = row
            .values
            .get(position)
            .ok_or_else(|| DecodeError::MissingColumn {
                field: spec.name.clone(),
            })?;
        fields.push((spec.name.clone(), decode_field(spec, raw)?));
    }

    Ok(FieldMap { fields })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, kind: FieldKind, divide_by: Option<f64>) -> FieldSpec {
        FieldSpec {
            name: name.to_string(),
            oid: ".1".to_string(),
            kind,
            divide_by,
        }
    }

    fn row(values: &[&str]) -> Row {
        Row {
            index: 1,
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    #[test]
    fn decodes_each_type() {
        assert_eq!(
            decode_field(&spec("state", FieldKind::Int, None), " 2 ").unwrap(),
            FieldValue::Int(2)
        );
        assert_eq!(
            decode_field(&spec("voltage", FieldKind::Float, None), "230.5").unwrap(),
            FieldValue::Float(230.5)
        );
        assert_eq!(
            decode_field(&spec("name", FieldKind::Text, None), "").unwrap(),
            FieldValue::Text(String::new())
        );
        assert_eq!(
            decode_field(&spec("name", FieldKind::Text, None), " rack A ").unwrap(),
            FieldValue::Text(" rack A ".to_string())
        );
    }

    #[test]
    fn deciamps_are_scaled_to_amps() {
        let current = spec("current", FieldKind::Float, Some(10.0));
        assert_eq!(decode_field(&current, "125").unwrap(), FieldValue::Float(12.5));
    }

    #[test]
    fn malformed_values_fail() {
        let err = decode_field(&spec("state", FieldKind::Int, None), "on").unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidInt {
                field: "state".into(),
                raw: "on".into()
            }
        );
        assert!(decode_field(&spec("state", FieldKind::Int, None), "2.5").is_err());
        assert!(decode_field(&spec("current", FieldKind::Float, None), "12,5").is_err());
        assert!(decode_field(&spec("current", FieldKind::Float, None), "NaN").is_err());
        assert!(decode_field(&spec("current", FieldKind::Float, None), "inf").is_err());
        assert!(decode_field(&spec("current", FieldKind::Float, None), "").is_err());
    }

    #[test]
    fn decode_row_is_deterministic() {
        let schema = vec![
            spec("name", FieldKind::Text, None),
            spec("state", FieldKind::Int, None),
            spec("current", FieldKind::Float, Some(10.0)),
        ];
        let raw = row(&["web-01", "2", "37"]);

        let first = decode_row(&schema, &raw).unwrap();
        let second = decode_row(&schema, &raw).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.text("name").unwrap(), "web-01");
        assert_eq!(first.int("state").unwrap(), 2);
        assert!((first.float("current").unwrap() - 3.7).abs() < 1e-9);
        let names: Vec<_> = first.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["name", "state", "current"]);
    }

    #[test]
    fn short_row_and_wrong_type() {
        let schema = vec![spec("a", FieldKind::Int, None), spec("b", FieldKind::Int, None)];
        assert_eq!(
            decode_row(&schema, &row(&["1"])).unwrap_err(),
            DecodeError::MissingColumn { field: "b".into() }
        );

        let fields = decode_row(&schema, &row(&["1", "2"])).unwrap();
        assert!(matches!(
            fields.text("a"),
            Err(DecodeError::WrongType { expected: FieldKind::Text, .. })
        ));
        assert!(matches!(fields.int("c"), Err(DecodeError::MissingField { .. })));
    }

    #[test]
    fn float_renders_without_losing_digits() {
        assert_eq!(FieldValue::Float(230.0).render(), "230.0");
        assert_eq!(FieldValue::Float(1725.0).render(), "1725.0");
        assert_eq!(FieldValue::Float(12.5).render(), "12.5");
        assert_eq!(FieldValue::Float(0.04).render(), "0.04");
        assert_eq!(FieldValue::Float(12.34).render(), "12.34");
        assert_eq!(FieldValue::Float(230.45).render(), "230.45");
        assert_eq!(FieldValue::Float(0.0).render(), "0.0");
        assert_eq!(FieldValue::Int(41).render(), "41");
    }

    #[test]
    fn scaled_float_renders_exactly() {
        let current = spec("current", FieldKind::Float, Some(10.0));
        let value = decode_field(&current, "37").unwrap();
        assert_eq!(value.render(), "3.7");
        let value = decode_field(&current, "1234").unwrap();
        assert_eq!(value.render(), "123.4");
    }
}
