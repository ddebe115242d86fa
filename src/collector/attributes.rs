//! Базовые DN и списки атрибутов для фиксированных поисков.

pub const MONITOR_DN: &str = "cn=Monitor";
pub const LDBM_MONITOR_DN: &str = "cn=monitor,cn=ldbm database,cn=plugins,cn=config";

/// Атрибут cn=Monitor со списком DN мониторов баз
pub const BACKEND_MONITOR_DN_ATTR: &str = "backendmonitordn";

/// Глобальная статистика сервера
pub const MONITOR_ATTRS: &[&str] = &[
    "currentconnections",
    "totalconnections",
    "currentconnectionsatmaxthreads",
    "maxthreadsperconnhits",
    "dtablesize",
    "readwaiters",
    "opsinitiated",
    "opscompleted",
    "entriessent",
    "bytessent",
    "anonymousbinds",
    "unauthbinds",
    "simpleauthbinds",
    "strongauthbinds",
    "bindsecurityerrors",
    "inops",
    "readops",
    "compareops",
    "addentryops",
    "removeentryops",
    "modifyentryops",
    "modifyrdnops",
    "listops",
    "searchops",
    "onelevelsearchops",
    "wholesubtreesearchops",
    "referrals",
    "chainings",
    "securityerrors",
    "errors",
    "connections",
    "connectionseq",
    "connectionsinmaxthreads",
    "connectionsmaxthreadscount",
    "bytesrecv",
    "entriesreturned",
    "referralsreturned",
    "masterentries",
    "copyentries",
    "cacheentries",
    "cachehits",
    "slavehits",
    BACKEND_MONITOR_DN_ATTR,
    "connection",
    "version",
];

/// Статистика движка хранения (ldbm)
pub const LDBM_ATTRS: &[&str] = &[
    "dbcachehitratio",
    "dbcachehits",
    "dbcachepagein",
    "dbcachepageout",
    "dbcacheroevict",
    "dbcacherwevict",
    "dbcachetries",
];

/// Для баз запрашиваются все атрибуты
pub const DATABASE_ATTRS: &[&str] = &[];
