use tracing::debug;

use super::attributes::{BACKEND_MONITOR_DN_ATTR, DATABASE_ATTRS};
use super::flatten::{database_prefixed, flatten};
use super::types::MetricRecord;
use crate::config::Profile;
use crate::error::CollectorError;
use crate::ldap::dn::monitor_dn_for;
use crate::ldap::{
    DirectoryEntry, DirectorySession, SearchDescriptor, database_from_monitor_dn,
};

/// Модуль для сбора статистики по базам данных
pub struct DatabaseCollector;

impl DatabaseCollector {
    /// Определяет базы для опроса по значениям backendmonitordn.
    ///
    /// Порядок - порядок обнаружения, без повторов. Базы из списка, которых
    /// нет на сервере, просто не попадают в результат.
    pub fn discover<S: AsRef<str>>(
        dns: &[S],
        profile: &Profile,
    ) -> Result<Vec<String>, CollectorError> {
        let mut selected: Vec<String> = Vec::new();

        for dn in dns {
            let db = database_from_monitor_dn(dn.as_ref())?;

            if !profile.monitors(&db) {
                debug!("база {} пропущена", db);
                continue;
            }
            if !selected.contains(&db) {
                selected.push(db);
            }
        }

        Ok(selected)
    }

    /// Берет backendmonitordn из результатов глобального поиска
    pub fn backend_dns(entries: &[DirectoryEntry]) -> Vec<String> {
        entries
            .iter()
            .flat_map(|entry| entry.values(BACKEND_MONITOR_DN_ATTR).iter().cloned())
            .collect()
    }

    /// Список баз согласно режиму профиля
    pub fn select(
        global_entries: &[DirectoryEntry],
        profile: &Profile,
    ) -> Result<Vec<String>, CollectorError> {
        if profile.discover {
            Self::discover(&Self::backend_dns(global_entries)[..], profile)
        } else {
            Ok(profile.databases.clone())
        }
    }

    /// Опрашивает каждую базу и сливает результаты с префиксом имени базы
    pub async fn collect<S: DirectorySession>(
        session: &mut S,
        databases: &[String],
        filter: &str,
    ) -> Result<MetricRecord, CollectorError> {
        let mut record = MetricRecord::new();

        for db in databases {
            let request = SearchDescriptor::new(monitor_dn_for(db), filter, DATABASE_ATTRS);
            let entries = session.search(&request).await?;
            let stats = flatten(&entries, database_prefixed(db));

            debug!("база {}: {} полей", db, stats.len());
            record.merge(stats);
            record.add_database(db.clone());
        }

        Ok(record)
    }
}
