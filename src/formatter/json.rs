use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::collector::MetricSample;
use crate::error::CollectorError;

/// JSON структура сэмпла
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSampleJson {
    pub name: String,
    pub timestamp: String,
    pub tags: BTreeMap<String, String>,
    pub summary: SampleSummary,
    pub fields: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleSummary {
    pub total_fields: usize,
    /// Поля с префиксом одной из опрошенных баз
    pub database_fields: usize,
    pub databases: Vec<String>,
}

/// JSON описание ошибки цикла
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub kind: String, // "connection" | "tls" | "upgrade" | "auth" | "search" | "malformed_dn"
    pub error_message: String,
    pub timestamp: String,
}

/// JSON форматтер для сэмплов
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn format_sample(sample: &MetricSample) -> MetricSampleJson {
        let prefixes: Vec<String> = sample
            .databases
            .iter()
            .map(|db| format!("{}_", db.to_lowercase()))
            .collect();
        let database_fields = sample
            .fields
            .keys()
            .filter(|k| prefixes.iter().any(|p| k.starts_with(p.as_str())))
            .count();

        MetricSampleJson {
            name: sample.name.clone(),
            timestamp: sample.timestamp.to_rfc3339(),
            tags: sample.tags.clone(),
            summary: SampleSummary {
                total_fields: sample.fields.len(),
                database_fields,
                databases: sample.databases.clone(),
            },
            fields: sample.fields.clone(),
        }
    }

    pub fn format_error(error: &CollectorError) -> ErrorInfo {
        ErrorInfo {
            kind: error.kind().as_str().to_string(),
            error_message: error.detailed(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Сериализует сэмпл в компактный JSON, одна строка на сэмпл
    pub fn to_json_compact(sample: &MetricSample) -> anyhow::Result<String> {
        serde_json::to_string(&Self::format_sample(sample))
            .map_err(|e| anyhow::anyhow!("Ошибка сериализации в JSON: {}", e))
    }
}
