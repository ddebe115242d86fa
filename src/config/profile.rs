use serde::{Deserialize, Serialize};

/// Какие базы данных опрашивать
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    /// Список баз для опроса, например ["userRoot"]
    #[serde(alias = "dbtomonitor")]
    pub databases: Vec<String>,
    /// Опрашивать все найденные базы, список выше игнорируется
    #[serde(alias = "alldbmonitor")]
    pub all_databases: bool,
    /// true - искать базы через backendmonitordn, false - брать список как есть
    pub discover: bool,
    /// Шаг со статусом соединений
    pub status: bool,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            databases: vec!["userRoot".to_string()],
            all_databases: false,
            discover: true,
            status: false,
        }
    }
}

impl Profile {
    pub fn monitors(&self, db: &str) -> bool {
        self.all_databases || self.databases.iter().any(|d| d == db)
    }
}
