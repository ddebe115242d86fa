use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Имя метрики, под которым уходит каждый сэмпл
pub const SAMPLE_NAME: &str = "ds389";

/// Плоский набор числовых полей одного цикла
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricRecord {
    pub fields: BTreeMap<String, i64>,
    /// Базы, опрошенные в этом цикле
    pub databases: Vec<String>,
}

impl MetricRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Запись с существующим ключом перезаписывает прежнее значение
    pub fn insert(&mut self, name: String, value: i64) {
        self.fields.insert(name, value);
    }

    /// Сливает другую запись в эту; при совпадении ключей побеждает `other`
    pub fn merge(&mut self, other: MetricRecord) {
        self.fields.extend(other.fields);
        for db in other.databases {
            self.add_database(db);
        }
    }

    pub fn add_database(&mut self, db: String) {
        if !self.databases.contains(&db) {
            self.databases.push(db);
        }
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<i64> {
        self.fields.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Готовый к отправке сэмпл: имя, теги сервера и поля
#[derive(Debug, Clone, Serialize)]
pub struct MetricSample {
    pub name: String,
    pub tags: BTreeMap<String, String>,
    pub fields: BTreeMap<String, i64>,
    pub databases: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl MetricSample {
    pub fn new(record: MetricRecord, tags: BTreeMap<String, String>) -> Self {
        Self {
            name: SAMPLE_NAME.to_string(),
            tags,
            fields: record.fields,
            databases: record.databases,
            timestamp: Utc::now(),
        }
    }
}
