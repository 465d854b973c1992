//! Обработка одного раздела за цикл:
//! колонки -> строки -> типизированные записи -> severity -> сводка.
//!
//! Функции чистые: одинаковые колонки дают одинаковый [`SectionOutcome`].

use tracing::{debug, warn};

use crate::collector::correlate::{Row, correlate};
use crate::collector::{CheckResult, RecordFailure, SectionOutcome};
use crate::decode::{AlarmSet, DecodeError, Record, decode_row};
use crate::formatter::summary::format_summary;
use crate::registry::{SectionDef, Shape};
use crate::snmp::{Columns, FetchError};

/// Обрабатывает данные раздела. Ошибка получения даёт раздел без записей,
/// ошибка декодирования выбрасывает только свою запись.
pub fn evaluate_section(def: &SectionDef, fetched: Result<Columns, FetchError>) -> SectionOutcome {
    let columns = match fetched {
        Ok(columns) => columns,
        Err(error) => {
            warn!(section = %def.kind, error = %error, "раздел пропущен в этом цикле");
            return SectionOutcome::absent(def.kind, error);
        }
    };

    let missing = missing_instance(def, &columns);
    let rows = rows_for(def, columns);
    let mut outcome = SectionOutcome::empty(def.kind);

    match def.shape() {
        Shape::Aggregate => {
            let label = aggregate_label(def);
            outcome.labels.push(label.clone());

            let decoded = rows
                .iter()
                .map(|row| decode_row(&def.columns, row))
                .collect::<Result<Vec<_>, _>>()
                .and_then(|fields| AlarmSet::from_rows(&fields));
            match decoded {
                Ok(set) => outcome.results.push(check(def, label, &Record::Alarms(set))),
                Err(error) => record_failure(&mut outcome, def, label, 1, error),
            }
        }
        Shape::Singleton | Shape::Table => match missing {
            Some((row, error)) => {
                let label = row_label(def, &row);
                outcome.labels.push(label.clone());
                record_failure(&mut outcome, def, label, row.index, error);
            }
            None => {
                for (row, label) in rows.iter().zip(row_labels(def, &rows)) {
                    outcome.labels.push(label.clone());

                    let record = decode_row(&def.columns, row)
                        .and_then(|fields| Record::from_fields(def.kind, row.index, &fields));
                    match record {
                        Ok(record) => outcome.results.push(check(def, label, &record)),
                        Err(error) => record_failure(&mut outcome, def, label, row.index, error),
                    }
                }
            }
        },
    }

    debug!(
        section = %def.kind,
        results = outcome.results.len(),
        failures = outcome.failures.len(),
        "раздел обработан"
    );
    outcome
}

/// Метки сущностей раздела без классификации
pub fn discover(def: &SectionDef, columns: Columns) -> Vec<String> {
    match def.shape() {
        Shape::Aggregate => vec![aggregate_label(def)],
        Shape::Singleton | Shape::Table => row_labels(def, &rows_for(def, columns)),
    }
}

/// Скаляр без экземпляра на устройстве: строка из того, что пришло,
/// и имя первой пустой колонки
fn missing_instance(def: &SectionDef, columns: &Columns) -> Option<(Row, DecodeError)> {
    if def.shape() != Shape::Singleton {
        return None;
    }
    let position = (0..def.columns.len())
        .find(|&i| columns.get(i).is_none_or(|column| column.is_empty()))?;

    let values = (0..def.columns.len())
        .map(|i| {
            columns
                .get(i)
                .and_then(|column| column.first())
                .cloned()
                .unwrap_or_default()
        })
        .collect();
    let error = DecodeError::MissingColumn {
        field: def.columns[position].name.clone(),
    };
    Some((Row { index: 1, values }, error))
}

fn rows_for(def: &SectionDef, columns: Columns) -> Vec<Row> {
    let lengths: Vec<usize> = columns.iter().map(Vec::len).collect();
    let mut rows = correlate(columns);

    if lengths.iter().any(|len| *len != rows.len()) {
        debug!(section = %def.kind, ?lengths, rows = rows.len(), "колонки разной длины, лишние строки отброшены");
    }
    if def.shape() == Shape::Singleton {
        rows.truncate(1);
    }
    rows
}

fn check(def: &SectionDef, label: String, record: &Record) -> CheckResult {
    let severity = def.rule.classify(record);
    CheckResult {
        label,
        severity,
        summary: format_summary(record, severity, &def.summary),
    }
}

fn record_failure(
    outcome: &mut SectionOutcome,
    def: &SectionDef,
    label: String,
    index: usize,
    error: DecodeError,
) {
    warn!(section = %def.kind, label = %label, index, error = %error, "запись не декодирована");
    outcome.failures.push(RecordFailure { label, index, error });
}

/// Метка строки из сырых значений; пустое текстовое значение заменяется индексом
pub fn row_label(def: &SectionDef, row: &Row) -> String {
    def.label.render(|name| {
        if name == "index" {
            return Some(row.index.to_string());
        }
        let position = def.columns.iter().position(|c| c.name == name)?;
        let raw = row.values.get(position)?.trim();
        Some(if raw.is_empty() {
            row.index.to_string()
        } else {
            raw.to_string()
        })
    })
}

/// Метки строк раздела; совпадающие метки уточняются индексом строки
pub fn row_labels(def: &SectionDef, rows: &[Row]) -> Vec<String> {
    let labels: Vec<String> = rows.iter().map(|row| row_label(def, row)).collect();
    labels
        .iter()
        .zip(rows)
        .map(|(label, row)| {
            if labels.iter().filter(|other| *other == label).count() > 1 {
                format!("{} ({})", label, row.index)
            } else {
                label.clone()
            }
        })
        .collect()
}

fn aggregate_label(def: &SectionDef) -> String {
    def.label.render(|name| (name == "index").then(|| "1".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Severity;
    use crate::config::Profile;
    use crate::registry::{Registry, SectionKind};

    fn registry() -> Registry {
        Registry::from_profile(&Profile::builtin().unwrap()).unwrap()
    }

    fn cols(columns: &[&[&str]]) -> Columns {
        columns
            .iter()
            .map(|c| c.iter().map(|v| v.to_string()).collect())
            .collect()
    }

    #[test]
    fn device_summary_and_load_state() {
        let registry = registry();
        let def = registry.get(SectionKind::Device).unwrap();
        let outcome = evaluate_section(
            def,
            Ok(cols(&[&["AP8853"], &["v6.9.6"], &["2"], &["7.5"], &["230"], &["1725"]])),
        );

        assert_eq!(outcome.labels, ["PDU Global Status"]);
        assert_eq!(
            outcome.results,
            [CheckResult {
                label: "PDU Global Status".into(),
                severity: Severity::Warn,
                summary: "AP8853 | FW: v6.9.6 | Power: 1725.0W (7.5A, 230.0V)".into(),
            }]
        );
    }

    #[test]
    fn unmapped_load_state_is_unknown() {
        let registry = registry();
        let def = registry.get(SectionKind::Device).unwrap();
        let outcome = evaluate_section(
            def,
            Ok(cols(&[&["AP8853"], &["v6.9.6"], &["99"], &["7.5"], &["230"], &["1725"]])),
        );
        assert_eq!(outcome.results[0].severity, Severity::Unknown);
    }

    #[test]
    fn phases_truncate_to_shortest_column() {
        let registry = registry();
        let def = registry.get(SectionKind::Phases).unwrap();
        let outcome = evaluate_section(
            def,
            Ok(cols(&[&["12.1", "11.8", "9.0"], &["231", "229"]])),
        );

        assert_eq!(outcome.labels, ["Phase 1", "Phase 2"]);
        assert_eq!(
            outcome.results[1].summary,
            "Phase Voltage: 229.0V | Current: 11.8A"
        );
        assert!(outcome.results.iter().all(|r| r.severity == Severity::Ok));
    }

    #[test]
    fn malformed_outlet_is_isolated() {
        let registry = registry();
        let def = registry.get(SectionKind::Outlets).unwrap();
        let outcome = evaluate_section(
            def,
            Ok(cols(&[&["web-01", "db-02"], &["2", "2"], &["125", "n/a"]])),
        );

        assert_eq!(outcome.labels, ["Outlet: web-01", "Outlet: db-02"]);
        assert_eq!(
            outcome.results,
            [CheckResult {
                label: "Outlet: web-01".into(),
                severity: Severity::Ok,
                summary: "Outlet web-01: on | Current: 12.5A".into(),
            }]
        );
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].label, "Outlet: db-02");
        assert_eq!(outcome.failures[0].index, 2);
        assert!(matches!(
            outcome.failures[0].error,
            DecodeError::InvalidFloat { .. }
        ));
    }

    #[test]
    fn outlet_off_warns_and_blank_name_uses_index() {
        let registry = registry();
        let def = registry.get(SectionKind::Outlets).unwrap();
        let outcome = evaluate_section(def, Ok(cols(&[&["", "spare"], &["1", "5"], &["0", "0"]])));

        assert_eq!(outcome.labels, ["Outlet: 1", "Outlet: spare"]);
        assert_eq!(outcome.results[0].severity, Severity::Warn);
        assert_eq!(outcome.results[0].summary, "Outlet : off | Current: 0.0A");
        assert_eq!(outcome.results[1].severity, Severity::Unknown);
        assert_eq!(outcome.results[1].summary, "Outlet spare: unknown(5) | Current: 0.0A");
    }

    #[test]
    fn temperature_boundaries() {
        let registry = registry();
        let def = registry.get(SectionKind::Environment).unwrap();
        let outcome = evaluate_section(def, Ok(cols(&[&["40", "41", "51"], &["30", "31", "32"]])));

        let states: Vec<_> = outcome.results.iter().map(|r| r.severity).collect();
        assert_eq!(states, [Severity::Ok, Severity::Warn, Severity::Crit]);
        assert_eq!(outcome.results[2].label, "Env Sensor 3");
        assert_eq!(outcome.results[2].summary, "Temp: 51°C | Humidity: 32%");
    }

    #[test]
    fn alarms_present_and_absent() {
        let registry = registry();
        let def = registry.get(SectionKind::Alarms).unwrap();

        let busy = evaluate_section(
            def,
            Ok(cols(&[&["Overload", "Low voltage", "Sensor lost"]])),
        );
        assert_eq!(busy.results.len(), 1);
        assert_eq!(busy.results[0].severity, Severity::Crit);
        assert!(busy.results[0].summary.contains("3 active alarm(s)"));

        let quiet = evaluate_section(def, Ok(cols(&[&[]])));
        assert_eq!(
            quiet.results,
            [CheckResult {
                label: "PDU Alarms".into(),
                severity: Severity::Ok,
                summary: "No active alarms".into(),
            }]
        );
    }

    #[test]
    fn fetch_error_gives_no_records() {
        let registry = registry();
        let def = registry.get(SectionKind::Environment).unwrap();
        let outcome = evaluate_section(def, Err(FetchError::Timeout(10)));

        assert!(outcome.results.is_empty());
        assert!(outcome.labels.is_empty());
        assert_eq!(outcome.fetch_error, Some(FetchError::Timeout(10)));
    }

    #[test]
    fn evaluation_is_idempotent() {
        let registry = registry();
        let def = registry.get(SectionKind::Outlets).unwrap();
        let data = cols(&[&["a", "b"], &["2", "1"], &["10", "x"]]);

        let first = evaluate_section(def, Ok(data.clone()));
        let second = evaluate_section(def, Ok(data));
        assert_eq!(first, second);
    }

    #[test]
    fn duplicate_outlet_names_get_index() {
        let registry = registry();
        let def = registry.get(SectionKind::Outlets).unwrap();
        let data = cols(&[&["web", "db", "web"], &["2", "2", "2"], &["10", "10", "10"]]);

        let outcome = evaluate_section(def, Ok(data.clone()));
        assert_eq!(outcome.labels, ["Outlet: web (1)", "Outlet: db", "Outlet: web (3)"]);
        let labels: Vec<_> = outcome.results.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, outcome.labels);
        assert_eq!(outcome.results[2].summary, "Outlet web: on | Current: 1.0A");
        assert_eq!(discover(def, data), outcome.labels);
    }

    #[test]
    fn missing_device_scalar_is_a_failure() {
        let registry = registry();
        let def = registry.get(SectionKind::Device).unwrap();
        let outcome = evaluate_section(
            def,
            Ok(cols(&[&["AP8853"], &["v6.9.6"], &["1"], &["7.5"], &[], &["1725"]])),
        );

        assert!(outcome.results.is_empty());
        assert_eq!(outcome.labels, ["PDU Global Status"]);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].label, "PDU Global Status");
        assert_eq!(
            outcome.failures[0].error,
            DecodeError::MissingColumn {
                field: "voltage".into()
            }
        );
    }

    #[test]
    fn summary_keeps_reading_precision() {
        let registry = registry();
        let def = registry.get(SectionKind::Phases).unwrap();
        let outcome = evaluate_section(
            def,
            Ok(cols(&[&["0.04", "12.34"], &["230.45", "231"]])),
        );

        assert_eq!(outcome.results[0].summary, "Phase Voltage: 230.45V | Current: 0.04A");
        assert_eq!(outcome.results[1].summary, "Phase Voltage: 231.0V | Current: 12.34A");
    }

    #[test]
    fn discovery_lists_present_entities() {
        let registry = registry();
        let outlets = registry.get(SectionKind::Outlets).unwrap();
        assert_eq!(
            discover(outlets, cols(&[&["a", "b"], &["2", "2"], &["1", "1"]])),
            ["Outlet: a", "Outlet: b"]
        );

        let device = registry.get(SectionKind::Device).unwrap();
        assert!(discover(device, cols(&[&[], &[], &[], &[], &[], &[]])).is_empty());

        let alarms = registry.get(SectionKind::Alarms).unwrap();
        assert_eq!(discover(alarms, cols(&[&[]])), ["PDU Alarms"]);
    }
}
