use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Базовые настройки приложения
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Настройки подключения
    pub connection: ConnectionSettings,
    /// Настройки аутентификации
    pub auth: AuthSettings,
    /// Настройки вывода метрик
    pub output: OutputSettings,
}

/// Режим шифрования в формате конфигурации
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TlsSetting {
    #[default]
    #[serde(alias = "")]
    None,
    Starttls,
    Ldaps,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// URL сервера (ldap:// или ldaps://). Если задан, host/port игнорируются
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    /// Старое имя ключа - `ssl`
    #[serde(alias = "ssl")]
    pub tls: TlsSetting,
    /// То же самое, что `tls: starttls`
    pub starttls: bool,
    pub insecure_skip_verify: bool,
    /// PEM с корневыми сертификатами. Старое имя ключа - `ssl_ca`
    #[serde(alias = "ssl_ca")]
    pub tls_ca: Option<PathBuf>,
    /// Таймаут подключения и каждого поиска (секунды)
    pub timeout: u64,
    pub search_filter: String,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            url: None,
            host: "localhost".to_string(),
            port: 389,
            tls: TlsSetting::None,
            starttls: false,
            insecure_skip_verify: false,
            tls_ca: None,
            timeout: 10,
            search_filter: "(objectClass=extensibleObject)".to_string(),
        }
    }
}

/// Учетные данные для bind. Пустые значения - анонимный доступ
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub bind_dn: String,
    pub bind_password: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Json,
    #[default]
    LineProtocol,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub format: OutputFormat,
}
