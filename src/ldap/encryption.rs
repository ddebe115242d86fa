use native_tls::{Certificate, TlsConnector};
use std::path::PathBuf;

use crate::error::CollectorError;

/// Режим шифрования, выбирается один раз при подключении
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptionMode {
    None,
    /// Открытое соединение с последующим StartTLS
    StartTls,
    /// TLS с самого начала (ldaps://)
    Ldaps,
}

impl EncryptionMode {
    pub fn uses_tls(&self) -> bool {
        !matches!(self, EncryptionMode::None)
    }

    pub fn scheme(&self) -> &'static str {
        match self {
            EncryptionMode::Ldaps => "ldaps",
            _ => "ldap",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            EncryptionMode::Ldaps => 636,
            _ => 389,
        }
    }
}

/// Параметры проверки сертификата сервера
#[derive(Debug, Clone, Default)]
pub struct TlsParams {
    pub ca_path: Option<PathBuf>,
    pub insecure_skip_verify: bool,
}

impl TlsParams {
    /// Собирает TLS коннектор из CA и флага проверки
    pub fn build_connector(&self) -> Result<TlsConnector, CollectorError> {
        let mut builder = TlsConnector::builder();

        if let Some(path) = &self.ca_path {
            let pem = std::fs::read(path).map_err(|e| {
                CollectorError::tls(format!("не удалось прочитать CA {}", path.display()), e)
            })?;
            let cert = Certificate::from_pem(&pem).map_err(|e| {
                CollectorError::tls(format!("невалидный PEM в {}", path.display()), e)
            })?;
            builder.add_root_certificate(cert);
        }

        if self.insecure_skip_verify {
            builder
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true);
        }

        builder
            .build()
            .map_err(|e| CollectorError::tls("не удалось собрать TLS коннектор", e))
    }
}
