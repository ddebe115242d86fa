use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info};

pub mod attributes;
pub mod databases;
pub mod flatten;
pub mod types;

pub use databases::DatabaseCollector;
pub use types::{MetricRecord, MetricSample};

use attributes::{LDBM_ATTRS, LDBM_MONITOR_DN, MONITOR_ATTRS, MONITOR_DN};
use crate::config::{AppConfig, Profile};
use crate::emitter::MetricSink;
use crate::error::CollectorError;
use crate::ldap::{Connector, DirectorySession, LdapConnector, SearchDescriptor};
use flatten::{flatten, identity};

/// Коллектор одного сервера 389 DS
pub struct Ds389Collector<C: Connector = LdapConnector> {
    connector: C,
    profile: Profile,
    filter: String,
    tags: BTreeMap<String, String>,
}

impl Ds389Collector<LdapConnector> {
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let params = config.connection_params()?;
        let tags = params.server_tags();

        Ok(Self::new(
            LdapConnector::new(params),
            config.profile.clone(),
            config.search_filter(),
            tags,
        ))
    }
}

impl<C: Connector> Ds389Collector<C> {
    pub fn new(
        connector: C,
        profile: Profile,
        filter: impl Into<String>,
        tags: BTreeMap<String, String>,
    ) -> Self {
        Self {
            connector,
            profile,
            filter: filter.into(),
            tags,
        }
    }

    /// Полный цикл опроса. Сессия закрывается при любом исходе
    pub async fn collect(&self) -> Result<MetricRecord, CollectorError> {
        let mut session = self.connector.connect().await?;
        let result = self.collect_all(&mut session).await;
        session.close().await;
        result
    }

    /// Цикл опроса с тегами сервера
    pub async fn collect_sample(&self) -> Result<MetricSample, CollectorError> {
        let started = Instant::now();
        let record = self.collect().await?;

        info!(
            "цикл опроса завершен за {:?}, полей: {}",
            started.elapsed(),
            record.len()
        );
        Ok(MetricSample::new(record, self.tags.clone()))
    }

    /// Опрос и отправка: один сэмпл при успехе, один отчет об ошибке при сбое
    pub async fn gather<K: MetricSink>(&self, sink: &mut K) -> anyhow::Result<()> {
        match self.collect_sample().await {
            Ok(sample) => sink.emit(&sample),
            Err(e) => {
                sink.report_error(&e);
                Ok(())
            }
        }
    }

    /// Циклы опроса раз в `period`, пока не завершится `shutdown`.
    ///
    /// `shutdown` создается один раз и проверяется первым на каждой итерации,
    /// так что сигнал, пришедший во время цикла, обрабатывается сразу после него.
    /// Следующий цикл не начнется, пока не закончится текущий.
    pub async fn run_until<K: MetricSink>(
        &self,
        sink: &mut K,
        period: Duration,
        shutdown: impl Future<Output = ()>,
    ) {
        tokio::pin!(shutdown);
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("остановка");
                    return;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.gather(sink).await {
                        error!("не удалось отправить сэмпл: {:#}", e);
                    }
                }
            }
        }
    }

    async fn collect_all(
        &self,
        session: &mut C::Session,
    ) -> Result<MetricRecord, CollectorError> {
        let global = session
            .search(&SearchDescriptor::new(MONITOR_DN, &self.filter, MONITOR_ATTRS))
            .await?;
        let mut record = flatten(&global, identity);
        debug!("cn=Monitor: {} полей", record.len());

        let ldbm = session
            .search(&SearchDescriptor::new(LDBM_MONITOR_DN, &self.filter, LDBM_ATTRS))
            .await?;
        record.merge(flatten(&ldbm, identity));

        let databases = DatabaseCollector::select(&global, &self.profile)?;
        debug!("базы для опроса: {:?}", databases);
        record.merge(DatabaseCollector::collect(session, &databases, &self.filter).await?);

        if self.profile.status {
            record.merge(self.collect_status(session).await?);
        }

        Ok(record)
    }

    /// Статус соединений. Пока ничего не добавляет в запись
    async fn collect_status(
        &self,
        _session: &mut C::Session,
    ) -> Result<MetricRecord, CollectorError> {
        debug!("шаг статуса соединений: нет данных");
        Ok(MetricRecord::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use crate::emitter::WriterSink;
    use crate::error::ErrorKind;
    use crate::ldap::{ConnectionParams, DirectoryEntry, EncryptionMode, TlsParams};
    use async_trait::async_trait;
    use ldap3::LdapError;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tokio::sync::Notify;

    const USER_ROOT_DN: &str = "cn=monitor,cn=userRoot,cn=ldbm database,cn=plugins,cn=config";
    const OTHER_DN: &str = "cn=monitor,cn=other,cn=ldbm database,cn=plugins,cn=config";

    #[derive(Default)]
    struct Journal {
        searches: Vec<SearchDescriptor>,
        closed: usize,
    }

    /// Ответы по базовому DN; отсутствующий DN - ошибка поиска
    struct FakeSession {
        responses: HashMap<String, Vec<DirectoryEntry>>,
        journal: Arc<Mutex<Journal>>,
    }

    #[async_trait]
    impl DirectorySession for FakeSession {
        async fn search(
            &mut self,
            request: &SearchDescriptor,
        ) -> Result<Vec<DirectoryEntry>, CollectorError> {
            self.journal.lock().unwrap().searches.push(request.clone());
            self.responses
                .get(&request.base)
                .cloned()
                .ok_or_else(|| CollectorError::Search {
                    base: request.base.clone(),
                    source: LdapError::from(std::io::Error::other("noSuchObject")),
                })
        }

        async fn close(&mut self) {
            self.journal.lock().unwrap().closed += 1;
        }
    }

    struct FakeConnector {
        responses: HashMap<String, Vec<DirectoryEntry>>,
        refuse: bool,
        journal: Arc<Mutex<Journal>>,
        /// Срабатывает посреди цикла, после установки соединения
        on_connect: Option<Arc<Notify>>,
    }

    impl FakeConnector {
        fn new(responses: HashMap<String, Vec<DirectoryEntry>>) -> Self {
            Self {
                responses,
                refuse: false,
                journal: Arc::default(),
                on_connect: None,
            }
        }
    }

    #[async_trait]
    impl Connector for FakeConnector {
        type Session = FakeSession;

        async fn connect(&self) -> Result<FakeSession, CollectorError> {
            if self.refuse {
                return Err(CollectorError::Connection {
                    target: "ldap://fake".to_string(),
                    source: LdapError::from(std::io::Error::from(
                        std::io::ErrorKind::ConnectionRefused,
                    )),
                });
            }
            if let Some(notify) = &self.on_connect {
                notify.notify_one();
            }
            Ok(FakeSession {
                responses: self.responses.clone(),
                journal: self.journal.clone(),
            })
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        samples: Vec<MetricSample>,
        errors: Vec<ErrorKind>,
    }

    impl MetricSink for RecordingSink {
        fn emit(&mut self, sample: &MetricSample) -> anyhow::Result<()> {
            self.samples.push(sample.clone());
            Ok(())
        }

        fn report_error(&mut self, error: &CollectorError) {
            self.errors.push(error.kind());
        }
    }

    fn server() -> HashMap<String, Vec<DirectoryEntry>> {
        HashMap::from([
            (
                MONITOR_DN.to_string(),
                vec![
                    DirectoryEntry::new("cn=monitor")
                        .with_attr("currentconnections", &["5"])
                        .with_attr("version", &["a", "b"])
                        .with_attr("cachehits", &["10"])
                        .with_attr("backendmonitordn", &[USER_ROOT_DN, OTHER_DN]),
                ],
            ),
            (
                LDBM_MONITOR_DN.to_string(),
                vec![
                    DirectoryEntry::new(LDBM_MONITOR_DN)
                        .with_attr("dbcachehits", &["100"])
                        .with_attr("cachehits", &["11"]),
                ],
            ),
            (
                USER_ROOT_DN.to_string(),
                vec![
                    DirectoryEntry::new(USER_ROOT_DN)
                        .with_attr("dbcachehits", &["42"])
                        .with_attr("currentdncachesize", &["7"])
                        .with_attr("dbfilename-0", &["userRoot/id2entry.db"]),
                ],
            ),
            (
                OTHER_DN.to_string(),
                vec![DirectoryEntry::new(OTHER_DN).with_attr("dbcachehits", &["3"])],
            ),
        ])
    }

    fn profile(databases: &[&str], all: bool) -> Profile {
        Profile {
            databases: databases.iter().map(|d| d.to_string()).collect(),
            all_databases: all,
            ..Profile::default()
        }
    }

    fn collector(connector: FakeConnector, profile: Profile) -> Ds389Collector<FakeConnector> {
        let tags = BTreeMap::from([
            ("server".to_string(), "ds.example.com".to_string()),
            ("port".to_string(), "389".to_string()),
        ]);
        Ds389Collector::new(connector, profile, "(objectClass=*)", tags)
    }

    #[tokio::test]
    async fn full_cycle_merges_all_steps() {
        let connector = FakeConnector::new(server());
        let journal = connector.journal.clone();
        let collector = collector(connector, profile(&["userRoot"], false));

        let mut sink = RecordingSink::default();
        collector.gather(&mut sink).await.unwrap();

        assert!(sink.errors.is_empty());
        assert_eq!(sink.samples.len(), 1);

        let sample = &sink.samples[0];
        assert_eq!(sample.name, "ds389");
        assert_eq!(sample.tags["server"], "ds.example.com");
        assert_eq!(sample.tags["port"], "389");
        assert_eq!(sample.fields["currentconnections"], 5);
        assert!(!sample.fields.contains_key("version"));
        assert!(!sample.fields.contains_key("backendmonitordn"));
        // ldbm пишется после cn=Monitor
        assert_eq!(sample.fields["cachehits"], 11);
        assert_eq!(sample.fields["dbcachehits"], 100);
        assert_eq!(sample.fields["userroot_dbcachehits"], 42);
        assert_eq!(sample.fields["userroot_currentdncachesize"], 7);
        assert!(!sample.fields.contains_key("other_dbcachehits"));

        let journal = journal.lock().unwrap();
        assert_eq!(journal.closed, 1);
        let bases: Vec<&str> = journal.searches.iter().map(|s| s.base.as_str()).collect();
        assert_eq!(bases, vec![MONITOR_DN, LDBM_MONITOR_DN, USER_ROOT_DN]);
        assert!(journal.searches[2].attributes.is_empty());
        assert!(journal.searches[0].attributes.contains(&"backendmonitordn".to_string()));
        assert!(journal.searches.iter().all(|s| s.filter == "(objectClass=*)"));
        assert_eq!(sample.databases, vec!["userRoot"]);
    }

    #[tokio::test]
    async fn shutdown_during_cycle_stops_after_it() {
        let notify = Arc::new(Notify::new());
        let mut connector = FakeConnector::new(server());
        connector.on_connect = Some(notify.clone());
        let journal = connector.journal.clone();
        let collector = collector(connector, profile(&["userRoot"], false));

        let mut sink = RecordingSink::default();
        let period = Duration::from_secs(3600);
        tokio::time::timeout(
            Duration::from_secs(5),
            collector.run_until(&mut sink, period, async move { notify.notified().await }),
        )
        .await
        .expect("цикл не остановился после сигнала");

        assert_eq!(sink.samples.len(), 1);
        assert_eq!(journal.lock().unwrap().closed, 1);
    }

    #[tokio::test]
    async fn shutdown_before_start_skips_polling() {
        let connector = FakeConnector::new(server());
        let journal = connector.journal.clone();
        let collector = collector(connector, profile(&["userRoot"], false));

        let mut sink = RecordingSink::default();
        collector
            .run_until(&mut sink, Duration::from_secs(1), async {})
            .await;

        assert!(sink.samples.is_empty());
        assert!(journal.lock().unwrap().searches.is_empty());
    }

    #[tokio::test]
    async fn monitor_all_polls_every_database() {
        let collector = collector(FakeConnector::new(server()), profile(&[], true));
        let record = collector.collect().await.unwrap();

        assert_eq!(record.get("userroot_dbcachehits"), Some(42));
        assert_eq!(record.get("other_dbcachehits"), Some(3));
    }

    #[tokio::test]
    async fn static_database_list() {
        let mut p = profile(&["other"], false);
        p.discover = false;
        let collector = collector(FakeConnector::new(server()), p);

        let record = collector.collect().await.unwrap();
        assert_eq!(record.get("other_dbcachehits"), Some(3));
        assert_eq!(record.get("userroot_dbcachehits"), None);
    }

    #[tokio::test]
    async fn connect_failure_emits_nothing() {
        let mut connector = FakeConnector::new(server());
        connector.refuse = true;
        let journal = connector.journal.clone();
        let collector = collector(connector, profile(&["userRoot"], false));

        let mut sink = RecordingSink::default();
        collector.gather(&mut sink).await.unwrap();

        assert!(sink.samples.is_empty());
        assert_eq!(sink.errors, vec![ErrorKind::Connection]);
        assert!(journal.lock().unwrap().searches.is_empty());
    }

    #[tokio::test]
    async fn unreachable_server_reports_connection_error() {
        let params = ConnectionParams {
            url: "ldap://127.0.0.1:1".parse().unwrap(),
            encryption: EncryptionMode::None,
            tls: TlsParams::default(),
            bind_dn: String::new(),
            bind_password: String::new(),
            timeout: Duration::from_secs(2),
        };
        let tags = params.server_tags();
        let collector = Ds389Collector::new(
            LdapConnector::new(params),
            Profile::default(),
            "(objectClass=*)",
            tags,
        );

        let mut sink = RecordingSink::default();
        collector.gather(&mut sink).await.unwrap();

        assert!(sink.samples.is_empty());
        assert_eq!(sink.errors, vec![ErrorKind::Connection]);
    }

    #[tokio::test]
    async fn search_failure_aborts_and_closes() {
        let mut responses = server();
        responses.remove(LDBM_MONITOR_DN);
        let connector = FakeConnector::new(responses);
        let journal = connector.journal.clone();
        let collector = collector(connector, profile(&["userRoot"], false));

        let mut sink = RecordingSink::default();
        collector.gather(&mut sink).await.unwrap();

        assert!(sink.samples.is_empty());
        assert_eq!(sink.errors, vec![ErrorKind::Search]);

        let journal = journal.lock().unwrap();
        assert_eq!(journal.closed, 1);
        assert_eq!(journal.searches.len(), 2);
    }

    #[tokio::test]
    async fn missing_static_database_is_search_error() {
        let mut p = profile(&["nope"], false);
        p.discover = false;
        let collector = collector(FakeConnector::new(server()), p);

        let err = collector.collect().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Search);
    }

    #[tokio::test]
    async fn malformed_backend_dn_emits_nothing() {
        let mut responses = server();
        responses.insert(
            MONITOR_DN.to_string(),
            vec![
                DirectoryEntry::new("cn=monitor")
                    .with_attr("currentconnections", &["5"])
                    .with_attr("backendmonitordn", &["cn=monitor,cn=weird,cn=chaining database"]),
            ],
        );
        let connector = FakeConnector::new(responses);
        let journal = connector.journal.clone();
        let collector = collector(connector, profile(&[], true));

        let mut sink = RecordingSink::default();
        collector.gather(&mut sink).await.unwrap();

        assert!(sink.samples.is_empty());
        assert_eq!(sink.errors, vec![ErrorKind::MalformedDn]);
        assert_eq!(journal.lock().unwrap().closed, 1);
    }

    #[tokio::test]
    async fn status_step_adds_nothing() {
        let mut with_status = profile(&["userRoot"], false);
        with_status.status = true;

        let plain = collector(FakeConnector::new(server()), profile(&["userRoot"], false))
            .collect()
            .await
            .unwrap();
        let status = collector(FakeConnector::new(server()), with_status)
            .collect()
            .await
            .unwrap();

        assert_eq!(plain, status);
    }

    #[tokio::test]
    async fn gather_writes_line_protocol() {
        let collector = collector(FakeConnector::new(server()), profile(&["userRoot"], false));
        let mut sink = WriterSink::new(Vec::new(), OutputFormat::LineProtocol);
        collector.gather(&mut sink).await.unwrap();

        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(out.lines().count(), 1);
        assert!(out.starts_with("ds389,port=389,server=ds.example.com "));
        assert!(out.contains("currentconnections=5i"));
    }
}
