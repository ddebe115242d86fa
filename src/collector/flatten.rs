use super::types::MetricRecord;
use crate::ldap::DirectoryEntry;

/// Превращает записи каталога в плоский набор числовых полей.
///
/// Берутся только атрибуты ровно с одним значением, которое парсится как i64.
/// Остальные пропускаются молча.
pub fn flatten(entries: &[DirectoryEntry], name: impl Fn(&str) -> String) -> MetricRecord {
    let mut record = MetricRecord::new();

    for entry in entries {
        for (attr, values) in &entry.attributes {
            let [value] = values.as_slice() else {
                continue;
            };

            if let Ok(v) = value.parse::<i64>() {
                record.insert(name(attr), v);
            }
        }
    }

    record
}

/// Имя атрибута как есть
pub fn identity(attr: &str) -> String {
    attr.to_string()
}

/// Префикс базы: userroot_dbcachehits
pub fn database_prefixed(db: &str) -> impl Fn(&str) -> String {
    let prefix = db.to_lowercase();
    move |attr| format!("{}_{}", prefix, attr)
}
