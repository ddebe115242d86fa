use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;
use url::Url;

pub mod profile;
pub mod settings;

pub use profile::Profile;
pub use settings::{OutputFormat, Settings, TlsSetting};

use crate::ldap::{ConnectionParams, EncryptionMode, TlsParams};

/// Главная конфигурация приложения
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Какие базы опрашивать
    #[serde(default)]
    pub profile: Profile,
    /// Базовые настройки
    #[serde(flatten)]
    pub settings: Settings,
}

impl AppConfig {
    /// Загружает конфигурацию из YAML файла и применяет переменные окружения
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Не удалось прочитать файл: {}", path.display()))?;

        let mut config = Self::from_yaml(&content)?;
        config.apply_overrides(|key| env::var(key).ok());
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: AppConfig =
            serde_yml::from_str(content).context("Не удалось распарсить YAML")?;
        Ok(config)
    }

    /// Переопределения DS389_URL, DS389_BIND_DN, DS389_BIND_PASSWORD, DS389_TIMEOUT
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let connection = &mut self.settings.connection;
        if let Some(url) = lookup("DS389_URL") {
            connection.url = Some(url);
        }
        if let Some(timeout) = lookup("DS389_TIMEOUT").and_then(|s| s.parse().ok()) {
            connection.timeout = timeout;
        }

        let auth = &mut self.settings.auth;
        if let Some(dn) = lookup("DS389_BIND_DN") {
            auth.bind_dn = dn;
        }
        if let Some(password) = lookup("DS389_BIND_PASSWORD") {
            auth.bind_password = password;
        }
    }

    /// Режим шифрования с учетом URL, `tls` и `starttls`
    pub fn encryption_mode(&self) -> Result<EncryptionMode> {
        let connection = &self.settings.connection;
        let configured = match (connection.tls, connection.starttls) {
            (TlsSetting::Ldaps, true) => bail!("tls: ldaps несовместим с starttls: true"),
            (TlsSetting::Ldaps, false) => EncryptionMode::Ldaps,
            (TlsSetting::Starttls, _) | (TlsSetting::None, true) => EncryptionMode::StartTls,
            (TlsSetting::None, false) => EncryptionMode::None,
        };

        let Some(url) = &connection.url else {
            return Ok(configured);
        };

        let url = Url::parse(url).with_context(|| format!("Невалидный URL: {}", url))?;
        match (url.scheme(), configured) {
            ("ldaps", EncryptionMode::StartTls) => {
                bail!("StartTLS не нужен для ldaps:// URL")
            }
            ("ldaps", _) => Ok(EncryptionMode::Ldaps),
            ("ldap", EncryptionMode::Ldaps) => {
                bail!("tls: ldaps требует ldaps:// URL")
            }
            ("ldap", mode) => Ok(mode),
            (scheme, _) => bail!("Неподдерживаемая схема: {}", scheme),
        }
    }

    /// URL сервера; host/port используются, только если url не задан
    pub fn target_url(&self) -> Result<Url> {
        let connection = &self.settings.connection;
        let mode = self.encryption_mode()?;

        let url = match &connection.url {
            Some(url) => Url::parse(url)?,
            None => Url::parse(&format!(
                "{}://{}:{}",
                mode.scheme(),
                connection.host,
                connection.port
            ))
            .with_context(|| format!("Невалидный адрес: {}:{}", connection.host, connection.port))?,
        };

        if url.host_str().is_none_or(str::is_empty) {
            bail!("В URL нет хоста: {}", url);
        }
        Ok(url)
    }

    pub fn get_timeout(&self) -> Duration {
        Duration::from_secs(self.settings.connection.timeout)
    }

    /// Собирает параметры подключения для одного цикла
    pub fn connection_params(&self) -> Result<ConnectionParams> {
        let connection = &self.settings.connection;
        if connection.timeout == 0 {
            bail!("Таймаут должен быть больше нуля");
        }
        Ok(ConnectionParams {
            url: self.target_url()?,
            encryption: self.encryption_mode()?,
            tls: TlsParams {
                ca_path: connection.tls_ca.clone(),
                insecure_skip_verify: connection.insecure_skip_verify,
            },
            bind_dn: self.settings.auth.bind_dn.clone(),
            bind_password: self.settings.auth.bind_password.clone(),
            timeout: self.get_timeout(),
        })
    }

    pub fn search_filter(&self) -> &str {
        &self.settings.connection.search_filter
    }
}
