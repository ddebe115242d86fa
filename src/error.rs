use ldap3::LdapError;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Ошибки цикла опроса. Любая из них прерывает текущий цикл целиком.
#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("не удалось подключиться к {target}")]
    Connection {
        target: String,
        #[source]
        source: LdapError,
    },

    #[error("ошибка настройки TLS: {context}")]
    Tls {
        context: String,
        #[source]
        source: BoxError,
    },

    #[error("не удалось выполнить StartTLS")]
    Upgrade {
        #[source]
        source: LdapError,
    },

    #[error("bind от имени '{dn}' отклонен")]
    Auth {
        dn: String,
        #[source]
        source: LdapError,
    },

    #[error("поиск по '{base}' не удался")]
    Search {
        base: String,
        #[source]
        source: LdapError,
    },

    #[error("неожиданный DN бэкенда: {0}")]
    MalformedDn(String),
}

/// Вид ошибки для внешнего канала отчетов
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Connection,
    Tls,
    Upgrade,
    Auth,
    Search,
    MalformedDn,
}

impl CollectorError {
    pub fn tls(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        CollectorError::Tls {
            context: context.into(),
            source: source.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CollectorError::Connection { .. } => ErrorKind::Connection,
            CollectorError::Tls { .. } => ErrorKind::Tls,
            CollectorError::Upgrade { .. } => ErrorKind::Upgrade,
            CollectorError::Auth { .. } => ErrorKind::Auth,
            CollectorError::Search { .. } => ErrorKind::Search,
            CollectorError::MalformedDn(_) => ErrorKind::MalformedDn,
        }
    }

    /// Сообщение вместе со всей цепочкой причин
    pub fn detailed(&self) -> String {
        let mut message = self.to_string();
        let mut cause = std::error::Error::source(self);
        while let Some(err) = cause {
            message.push_str(": ");
            message.push_str(&err.to_string());
            cause = err.source();
        }
        message
    }
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Connection => "connection",
            ErrorKind::Tls => "tls",
            ErrorKind::Upgrade => "upgrade",
            ErrorKind::Auth => "auth",
            ErrorKind::Search => "search",
            ErrorKind::MalformedDn => "malformed_dn",
        }
    }
}
