use async_trait::async_trait;
use ldap3::{
    DerefAliases, Ldap, LdapConnAsync, LdapConnSettings, LdapError, Scope, SearchEntry,
    SearchOptions,
};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::encryption::{EncryptionMode, TlsParams};
use super::search::{DirectoryEntry, SearchDescriptor};
use super::{Connector, DirectorySession};
use crate::error::CollectorError;

/// Все, что нужно для подключения к серверу
#[derive(Debug, Clone)]
pub struct ConnectionParams {
    pub url: Url,
    pub encryption: EncryptionMode,
    pub tls: TlsParams,
    pub bind_dn: String,
    pub bind_password: String,
    pub timeout: Duration,
}

impl ConnectionParams {
    /// Анонимный доступ, если DN или пароль пустые
    pub fn is_anonymous(&self) -> bool {
        self.bind_dn.is_empty() || self.bind_password.is_empty()
    }

    pub fn host(&self) -> String {
        self.url.host_str().unwrap_or("localhost").to_string()
    }

    pub fn port(&self) -> u16 {
        self.url
            .port()
            .unwrap_or_else(|| self.encryption.default_port())
    }

    /// Теги, идентифицирующие сервер
    pub fn server_tags(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("server".to_string(), self.host()),
            ("port".to_string(), self.port().to_string()),
        ])
    }
}

/// Подключение к серверу через ldap3
pub struct LdapConnector {
    params: ConnectionParams,
}

impl LdapConnector {
    pub fn new(params: ConnectionParams) -> Self {
        Self { params }
    }

    fn settings(&self) -> Result<LdapConnSettings, CollectorError> {
        let mut settings = LdapConnSettings::new()
            .set_conn_timeout(self.params.timeout)
            .set_starttls(self.params.encryption == EncryptionMode::StartTls);

        if self.params.encryption.uses_tls() {
            let connector = self.params.tls.build_connector()?;
            settings = settings
                .set_connector(connector)
                .set_no_tls_verify(self.params.tls.insecure_skip_verify);
        }

        Ok(settings)
    }

    /// Раскладывает ошибку подключения по видам. `Io` значит, что TCP не установлен;
    /// в режиме StartTLS любая другая ошибка относится к обмену StartTLS
    fn classify(&self, err: LdapError) -> CollectorError {
        match (self.params.encryption, err) {
            (_, err @ LdapError::Io { .. }) => self.unreachable(err),
            (EncryptionMode::StartTls, err) => CollectorError::Upgrade { source: err },
            (EncryptionMode::Ldaps, LdapError::NativeTLS { source }) => {
                CollectorError::tls("TLS рукопожатие не удалось", source)
            }
            (_, err) => self.unreachable(err),
        }
    }

    fn unreachable(&self, source: LdapError) -> CollectorError {
        CollectorError::Connection {
            target: self.params.url.to_string(),
            source,
        }
    }
}

#[async_trait]
impl Connector for LdapConnector {
    type Session = LdapSession;

    async fn connect(&self) -> Result<LdapSession, CollectorError> {
        let settings = self.settings()?;

        let (conn, ldap) = LdapConnAsync::with_settings(settings, self.params.url.as_str())
            .await
            .map_err(|e| self.classify(e))?;

        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!("соединение LDAP завершилось с ошибкой: {}", e);
            }
        });

        let mut session = LdapSession {
            ldap,
            timeout: self.params.timeout,
        };

        if self.params.is_anonymous() {
            debug!("анонимный доступ к {}", self.params.url);
            return Ok(session);
        }

        let bound = session
            .ldap
            .with_timeout(self.params.timeout)
            .simple_bind(&self.params.bind_dn, &self.params.bind_password)
            .await
            .and_then(|res| res.success());

        if let Err(e) = bound {
            session.close().await;
            return Err(CollectorError::Auth {
                dn: self.params.bind_dn.clone(),
                source: e,
            });
        }

        debug!("bind от имени '{}' выполнен", self.params.bind_dn);
        Ok(session)
    }
}

/// Открытая сессия; живет один цикл опроса
pub struct LdapSession {
    ldap: Ldap,
    timeout: Duration,
}

#[async_trait]
impl DirectorySession for LdapSession {
    async fn search(
        &mut self,
        request: &SearchDescriptor,
    ) -> Result<Vec<DirectoryEntry>, CollectorError> {
        let (entries, _) = self
            .ldap
            .with_search_options(SearchOptions::new().deref(DerefAliases::Never))
            .with_timeout(self.timeout)
            .search(
                &request.base,
                Scope::Subtree,
                &request.filter,
                request.attributes.clone(),
            )
            .await
            .and_then(|res| res.success())
            .map_err(|source| CollectorError::Search {
                base: request.base.clone(),
                source,
            })?;

        Ok(entries
            .into_iter()
            .map(|entry| DirectoryEntry::from(SearchEntry::construct(entry)))
            .collect())
    }

    async fn close(&mut self) {
        if let Err(e) = self.ldap.unbind().await {
            debug!("unbind не удался: {}", e);
        }
    }
}
