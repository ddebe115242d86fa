use async_trait::async_trait;

use crate::error::CollectorError;

pub mod client;
pub mod dn;
pub mod encryption;
pub mod search;

pub use client::{ConnectionParams, LdapConnector};
pub use dn::database_from_monitor_dn;
pub use encryption::{EncryptionMode, TlsParams};
pub use search::{DirectoryEntry, SearchDescriptor};

/// Сессия с каталогом, только поиск на чтение
#[async_trait]
pub trait DirectorySession: Send {
    async fn search(
        &mut self,
        request: &SearchDescriptor,
    ) -> Result<Vec<DirectoryEntry>, CollectorError>;

    /// Закрывает соединение. Ошибки закрытия только логируются
    async fn close(&mut self);
}

/// Открывает новую сессию на каждый цикл опроса
#[async_trait]
pub trait Connector: Send + Sync {
    type Session: DirectorySession;

    async fn connect(&self) -> Result<Self::Session, CollectorError>;
}
