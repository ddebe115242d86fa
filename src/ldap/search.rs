use ldap3::SearchEntry;
use std::collections::BTreeMap;

/// Параметры одного поиска. Область всегда subtree, алиасы не разыменовываются
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchDescriptor {
    pub base: String,
    pub filter: String,
    /// Пустой список - вернуть все атрибуты записи
    pub attributes: Vec<String>,
}

impl SearchDescriptor {
    pub fn new(base: impl Into<String>, filter: impl Into<String>, attributes: &[&str]) -> Self {
        Self {
            base: base.into(),
            filter: filter.into(),
            attributes: attributes.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Запись каталога: DN и значения атрибутов
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub dn: String,
    pub attributes: BTreeMap<String, Vec<String>>,
}

impl DirectoryEntry {
    #[cfg(test)]
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: BTreeMap::new(),
        }
    }

    #[cfg(test)]
    pub fn with_attr(mut self, name: &str, values: &[&str]) -> Self {
        self.attributes.insert(
            name.to_string(),
            values.iter().map(|v| v.to_string()).collect(),
        );
        self
    }

    /// Значения атрибута без учета регистра имени
    pub fn values(&self, name: &str) -> &[String] {
        self.attributes
            .iter()
            .find(|(attr, _)| attr.eq_ignore_ascii_case(name))
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }
}

impl From<SearchEntry> for DirectoryEntry {
    fn from(entry: SearchEntry) -> Self {
        Self {
            dn: entry.dn,
            attributes: entry.attrs.into_iter().collect(),
        }
    }
}
