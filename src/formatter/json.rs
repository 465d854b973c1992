use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classify::Severity;
use crate::collector::{CheckResult, DeviceReport, SectionOutcome};

/// JSON структура для отдачи мониторингу
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceReportJson {
    pub target: String,
    pub profile: String,
    pub device_type: String,
    pub device_description: String,
    pub timestamp: String,
    pub severity: Severity,
    pub summary: ReportSummary,
    pub sections: Vec<SectionJson>,
    pub errors: Vec<ErrorInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_sections: usize,
    pub successful_sections: usize,
    pub total_results: usize,
    pub failed_records: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionJson {
    pub name: String,
    pub status: String, // "success" | "error" | "timeout"
    pub labels: Vec<String>,
    pub results: Vec<ResultJson>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultJson {
    pub label: String,
    pub severity: Severity,
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub item_type: String, // "section" | "record"
    pub item_name: String,
    pub error_message: String,
}

/// JSON форматтер для результатов опроса
pub struct JsonFormatter;

impl JsonFormatter {
    /// Конвертирует результат опроса в JSON структуру с текущим временем
    pub fn format_report(report: &DeviceReport) -> DeviceReportJson {
        Self::format_report_at(report, Utc::now())
    }

    pub fn format_report_at(report: &DeviceReport, at: DateTime<Utc>) -> DeviceReportJson {
        let successful_sections = report
            .sections
            .iter()
            .filter(|s| s.fetch_error.is_none())
            .count();

        let summary = ReportSummary {
            total_sections: report.sections.len(),
            successful_sections,
            total_results: report.results().count(),
            failed_records: report.sections.iter().map(|s| s.failures.len()).sum(),
        };

        DeviceReportJson {
            target: report.target.clone(),
            profile: report.profile.clone(),
            device_type: report.device.device_type.clone(),
            device_description: report.device.description.clone(),
            timestamp: at.to_rfc3339(),
            severity: report.overall_severity(),
            summary,
            sections: report.sections.iter().map(Self::format_section).collect(),
            errors: Self::extract_errors(report),
        }
    }

    /// Форматирует раздел для JSON
    fn format_section(section: &SectionOutcome) -> SectionJson {
        let status = match &section.fetch_error {
            None => "success",
            Some(error) if error.is_timeout() => "timeout",
            Some(_) => "error",
        };

        SectionJson {
            name: section.kind.name().to_string(),
            status: status.to_string(),
            labels: section.labels.clone(),
            results: section.results.iter().map(Self::format_result).collect(),
        }
    }

    fn format_result(result: &CheckResult) -> ResultJson {
        ResultJson {
            label: result.label.clone(),
            severity: result.severity,
            summary: result.summary.clone(),
        }
    }

    /// Извлекает ошибки из результата
    fn extract_errors(report: &DeviceReport) -> Vec<ErrorInfo> {
        let mut errors = Vec::new();

        for section in &report.sections {
            // Ошибки получения разделов
            if let Some(ref error) = section.fetch_error {
                errors.push(ErrorInfo {
                    item_type: "section".to_string(),
                    item_name: section.kind.name().to_string(),
                    error_message: error.to_string(),
                });
            }

            // Ошибки декодирования записей
            for failure in &section.failures {
                errors.push(ErrorInfo {
                    item_type: "record".to_string(),
                    item_name: failure.label.clone(),
                    error_message: failure.error.to_string(),
                });
            }
        }

        errors
    }

    /// Сериализует результат в JSON строку
    pub fn to_json_string(report: &DeviceReport) -> anyhow::Result<String> {
        let json_report = Self::format_report(report);
        serde_json::to_string_pretty(&json_report)
            .map_err(|e| anyhow::anyhow!("Ошибка сериализации в JSON: {}", e))
    }

    /// Сериализует результат в компактный JSON
    pub fn to_json_compact(report: &DeviceReport) -> anyhow::Result<String> {
        let json_report = Self::format_report(report);
        serde_json::to_string(&json_report)
            .map_err(|e| anyhow::anyhow!("Ошибка сериализации в JSON: {}", e))
    }
}
