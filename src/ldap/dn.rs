use regex::Regex;
use std::sync::LazyLock;

use crate::error::CollectorError;

/// DN монитора одной базы: cn=monitor,cn=<db>,cn=ldbm database,cn=plugins,cn=config
static DB_MONITOR_DN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^cn=monitor,cn=(?P<db>[\w-]+),cn=ldbm database,cn=plugins,cn=config$")
        .expect("регулярка DN монитора базы")
});

/// Извлекает имя базы из значения backendmonitordn
pub fn database_from_monitor_dn(dn: &str) -> Result<String, CollectorError> {
    DB_MONITOR_DN
        .captures(dn.trim())
        .and_then(|caps| caps.name("db"))
        .map(|db| db.as_str().to_string())
        .ok_or_else(|| CollectorError::MalformedDn(dn.to_string()))
}

/// Базовый DN для поиска статистики базы
pub fn monitor_dn_for(db: &str) -> String {
    format!("cn=monitor,cn={},cn=ldbm database,cn=plugins,cn=config", db)
}
