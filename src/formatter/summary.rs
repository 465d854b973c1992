use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::classify::Severity;
use crate::decode::Record;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("незакрытая подстановка в шаблоне '{0}'")]
    Unclosed(String),
    #[error("пустая подстановка {{}} в шаблоне '{0}'")]
    EmptyPlaceholder(String),
    #[error("одиночная '}}' в шаблоне '{0}'")]
    StrayBrace(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Field(String),
}

/// Шаблон строки вида `Temp: {temperature}°C`; `{{` и `}}` дают фигурные скобки
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Template {
    source: String,
    parts: Vec<Part>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err(TemplateError::StrayBrace(source.to_string())),
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(c) => name.push(c),
                            None => return Err(TemplateError::Unclosed(source.to_string())),
                        }
                    }
                    let name = name.trim();
                    if name.is_empty() {
                        return Err(TemplateError::EmptyPlaceholder(source.to_string()));
                    }
                    if !literal.is_empty() {
                        parts.push(Part::Literal(std::mem::take(&mut literal)));
                    }
                    parts.push(Part::Field(name.to_string()));
                }
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            parts.push(Part::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            parts,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(|part| match part {
            Part::Field(name) => Some(name.as_str()),
            Part::Literal(_) => None,
        })
    }

    /// Подставляет значения; неизвестная подстановка остаётся как `{name}`
    pub fn render(&self, lookup: impl Fn(&str) -> Option<String>) -> String {
        let mut out = String::with_capacity(self.source.len());
        for part in &self.parts {
            match part {
                Part::Literal(text) => out.push_str(text),
                Part::Field(name) => match lookup(name) {
                    Some(value) => out.push_str(&value),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                },
            }
        }
        out
    }
}

impl TryFrom<String> for Template {
    type Error = TemplateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Template::parse(&value)
    }
}

impl From<Template> for String {
    fn from(template: Template) -> Self {
        template.source
    }
}

/// Шаблоны сводки раздела: основной и переопределения по severity
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryTemplates {
    pub default: Template,
    pub by_severity: BTreeMap<Severity, Template>,
}

impl SummaryTemplates {
    pub fn for_severity(&self, severity: Severity) -> &Template {
        self.by_severity.get(&severity).unwrap_or(&self.default)
    }

    pub fn all(&self) -> impl Iterator<Item = &Template> {
        std::iter::once(&self.default).chain(self.by_severity.values())
    }
}

/// Сводка для записи. Чистая функция: одинаковый вход даёт одинаковую строку.
pub fn format_summary(record: &Record, severity: Severity, templates: &SummaryTemplates) -> String {
    templates.for_severity(severity).render(|name| match name {
        "severity" => Some(severity.to_string()),
        _ => record.placeholder(name),
    })
}
