//! Lazy connection management for one XA resource manager
//!
//! A [`ConnectionManager`] owns at most one live connection/resource pair
//! and hides the connect/disconnect lifecycle behind two scoped-access
//! primitives, so callers never manage the bracket by hand. 2PC branches
//! make several related calls (start, end, prepare, commit) that must share
//! one physical connection: the first call connects and deliberately leaves
//! the connection open, later calls observe "already connected" and reuse
//! it, and a terminal step disconnects explicitly. A call made outside any
//! bracket gets a transient connection opened and closed around just that
//! call.

use crate::error::{XaError, XaResult};
use crate::xa::{XaConnection, XaConnectionFactory, XaResource};
use parking_lot::Mutex;
use std::sync::Arc;

/// Username/password pair for credentialed connection acquisition
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Everything needed to obtain a connection to one XA resource manager.
/// Immutable after construction.
#[derive(Clone)]
pub struct ResourceManagerHandle {
    factory: Arc<dyn XaConnectionFactory>,
    credentials: Option<Credentials>,
}

impl ResourceManagerHandle {
    /// Handle using the factory's ambient identity.
    pub fn new(factory: Arc<dyn XaConnectionFactory>) -> Self {
        Self {
            factory,
            credentials: None,
        }
    }

    /// Handle authenticating with an explicit credential pair.
    pub fn with_credentials(factory: Arc<dyn XaConnectionFactory>, credentials: Credentials) -> Self {
        Self {
            factory,
            credentials: Some(credentials),
        }
    }

    fn open_connection(&self) -> Result<Box<dyn XaConnection>, crate::xa::ConnectionError> {
        match &self.credentials {
            Some(c) => self.factory.connect_as(&c.username, &c.password),
            None => self.factory.connect(),
        }
    }
}

/// A live connection and the 2PC resource derived from it. Holding both in
/// one struct keeps the pair present-together or absent-together.
struct LiveConnection {
    connection: Box<dyn XaConnection>,
    resource: Box<dyn XaResource>,
}

impl LiveConnection {
    /// Close the physical connection, logging (never failing) on error.
    /// The connection is being abandoned regardless of the close outcome.
    fn close(self) {
        if let Err(e) = self.connection.close() {
            tracing::warn!("Failed to close connection: {}", e);
        }
    }
}

/// Lazy, on-demand connection to one XA resource manager
///
/// The internal mutex serializes state transitions so the manager can live
/// behind `Arc` trait objects, but the single-connection design still
/// assumes one in-flight recovery scan per instance: interleaved scans
/// would close each other's connection.
pub struct ConnectionManager {
    handle: ResourceManagerHandle,
    state: Mutex<Option<LiveConnection>>,
}

impl ConnectionManager {
    pub fn new(handle: ResourceManagerHandle) -> Self {
        Self {
            handle,
            state: Mutex::new(None),
        }
    }

    /// Establish the shared connection. No-op when already connected.
    ///
    /// The connection stays open until [`disconnect`](Self::disconnect);
    /// this is the entry point for multi-call brackets that want later
    /// calls to reuse one physical connection.
    pub fn connect(&self) -> XaResult<()> {
        let mut state = self.state.lock();
        if state.is_none() {
            *state = Some(self.open()?);
        }
        Ok(())
    }

    /// Close the shared connection. No-op when not connected. Close errors
    /// are logged and suppressed; the state is reset to disconnected
    /// regardless.
    pub fn disconnect(&self) {
        if let Some(live) = self.state.lock().take() {
            live.close();
        }
    }

    /// Whether a shared connection is currently open.
    pub fn is_connected(&self) -> bool {
        self.state.lock().is_some()
    }

    /// Run `action` against the 2PC resource, without a return value.
    ///
    /// Already connected: the action runs against the shared resource and
    /// the connection remains open (the owner of the bracket disconnects
    /// later). Not connected: a transient connection is opened for this
    /// call alone and released on every exit path.
    pub fn with_resource(&self, action: impl FnOnce(&dyn XaResource) -> XaResult<()>) -> XaResult<()> {
        self.apply_resource(action)
    }

    /// Run `f` against the 2PC resource and return its result. Same
    /// connection policy as [`with_resource`](Self::with_resource).
    pub fn apply_resource<T>(&self, f: impl FnOnce(&dyn XaResource) -> XaResult<T>) -> XaResult<T> {
        let state = self.state.lock();
        if let Some(live) = state.as_ref() {
            return f(live.resource.as_ref());
        }

        // Transient path: the connection never enters the shared state, so
        // a failing action cannot leak it.
        let live = self.open()?;
        let result = f(live.resource.as_ref());
        live.close();
        result
    }

    /// Open a connection and derive its resource. On any failure the
    /// partially opened connection is closed (close errors ignored) and the
    /// caller sees a retryable unavailability error.
    fn open(&self) -> XaResult<LiveConnection> {
        let connection = self.handle.open_connection().map_err(|e| {
            tracing::warn!("Failed to create connection: {}", e);
            XaError::ResourceManagerUnavailable(e.to_string())
        })?;

        match connection.resource() {
            Ok(resource) => Ok(LiveConnection {
                connection,
                resource,
            }),
            Err(e) => {
                let _ = connection.close();
                tracing::warn!("Failed to derive XA resource from connection: {}", e);
                Err(XaError::ResourceManagerUnavailable(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xa::{
        ConnectionError, EndFlags, PrepareVote, RecoveryScan, StartFlags, XaConnection,
        XaConnectionFactory, XaResource, Xid,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counters {
        connects: AtomicUsize,
        credentialed_connects: AtomicUsize,
        closes: AtomicUsize,
        commits: AtomicUsize,
    }

    struct StubResource {
        counters: Arc<Counters>,
    }

    impl XaResource for StubResource {
        fn start(&self, _xid: &Xid, _flags: StartFlags) -> XaResult<()> {
            Ok(())
        }

        fn end(&self, _xid: &Xid, _flags: EndFlags) -> XaResult<()> {
            Ok(())
        }

        fn prepare(&self, _xid: &Xid) -> XaResult<PrepareVote> {
            Ok(PrepareVote::Commit)
        }

        fn commit(&self, _xid: &Xid, _one_phase: bool) -> XaResult<()> {
            self.counters.commits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn rollback(&self, _xid: &Xid) -> XaResult<()> {
            Ok(())
        }

        fn forget(&self, _xid: &Xid) -> XaResult<()> {
            Ok(())
        }

        fn is_same_rm(&self, _other: &dyn XaResource) -> XaResult<bool> {
            Ok(false)
        }

        fn transaction_timeout(&self) -> XaResult<u64> {
            Ok(0)
        }

        fn set_transaction_timeout(&self, _seconds: u64) -> XaResult<bool> {
            Ok(true)
        }

        fn recover(&self, _scan: RecoveryScan) -> XaResult<Vec<Xid>> {
            Ok(Vec::new())
        }
    }

    struct StubConnection {
        counters: Arc<Counters>,
        fail_resource: bool,
    }

    impl XaConnection for StubConnection {
        fn resource(&self) -> Result<Box<dyn XaResource>, ConnectionError> {
            if self.fail_resource {
                return Err("no resource for you".into());
            }
            Ok(Box::new(StubResource {
                counters: self.counters.clone(),
            }))
        }

        fn close(&self) -> Result<(), ConnectionError> {
            self.counters.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct StubFactory {
        counters: Arc<Counters>,
        fail_connect: bool,
        fail_resource: bool,
    }

    impl StubFactory {
        fn new(counters: Arc<Counters>) -> Self {
            Self {
                counters,
                fail_connect: false,
                fail_resource: false,
            }
        }
    }

    impl XaConnectionFactory for StubFactory {
        fn connect(&self) -> Result<Box<dyn XaConnection>, ConnectionError> {
            if self.fail_connect {
                return Err("connection refused".into());
            }
            self.counters.connects.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(StubConnection {
                counters: self.counters.clone(),
                fail_resource: self.fail_resource,
            }))
        }

        fn connect_as(
            &self,
            _username: &str,
            _password: &str,
        ) -> Result<Box<dyn XaConnection>, ConnectionError> {
            self.counters
                .credentialed_connects
                .fetch_add(1, Ordering::SeqCst);
            self.connect()
        }
    }

    fn manager(factory: StubFactory) -> ConnectionManager {
        ConnectionManager::new(ResourceManagerHandle::new(Arc::new(factory)))
    }

    #[test]
    fn connect_is_idempotent() {
        let counters = Arc::new(Counters::default());
        let manager = manager(StubFactory::new(counters.clone()));

        manager.connect().unwrap();
        manager.connect().unwrap();

        assert!(manager.is_connected());
        assert_eq!(counters.connects.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_connect_leaves_manager_disconnected() {
        let counters = Arc::new(Counters::default());
        let mut factory = StubFactory::new(counters.clone());
        factory.fail_connect = true;
        let manager = manager(factory);

        let err = manager.connect().unwrap_err();
        assert!(matches!(err, XaError::ResourceManagerUnavailable(_)));
        assert!(!manager.is_connected());
    }

    #[test]
    fn failed_resource_derivation_closes_the_connection() {
        let counters = Arc::new(Counters::default());
        let mut factory = StubFactory::new(counters.clone());
        factory.fail_resource = true;
        let manager = manager(factory);

        let err = manager.connect().unwrap_err();
        assert!(matches!(err, XaError::ResourceManagerUnavailable(_)));
        assert!(!manager.is_connected());
        assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn credentials_select_the_credentialed_entry_point() {
        let counters = Arc::new(Counters::default());
        let factory = StubFactory::new(counters.clone());
        let handle = ResourceManagerHandle::with_credentials(
            Arc::new(factory),
            Credentials::new("scott", "tiger"),
        );
        let manager = ConnectionManager::new(handle);

        manager.connect().unwrap();
        assert_eq!(counters.credentialed_connects.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn transient_bracket_releases_on_success_and_failure() {
        let counters = Arc::new(Counters::default());
        let manager = manager(StubFactory::new(counters.clone()));

        manager
            .with_resource(|r| r.commit(&Xid(vec![1]), true))
            .unwrap();
        assert!(!manager.is_connected());
        assert_eq!(counters.commits.load(Ordering::SeqCst), 1);
        assert_eq!(counters.closes.load(Ordering::SeqCst), 1);

        let err = manager
            .with_resource(|_| Err(XaError::OperationFailed("boom".into())))
            .unwrap_err();
        assert!(matches!(err, XaError::OperationFailed(_)));
        assert!(!manager.is_connected());
        assert_eq!(counters.closes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn open_bracket_is_left_untouched_by_scoped_calls() {
        let counters = Arc::new(Counters::default());
        let manager = manager(StubFactory::new(counters.clone()));

        manager.connect().unwrap();
        manager
            .with_resource(|r| r.commit(&Xid(vec![2]), false))
            .unwrap();
        let _ = manager.with_resource(|_| Err(XaError::OperationFailed("boom".into())));

        assert!(manager.is_connected());
        assert_eq!(counters.connects.load(Ordering::SeqCst), 1);
        assert_eq!(counters.closes.load(Ordering::SeqCst), 0);

        manager.disconnect();
        assert!(!manager.is_connected());
        assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn apply_resource_returns_the_delegate_result() {
        let counters = Arc::new(Counters::default());
        let manager = manager(StubFactory::new(counters));

        let vote = manager.apply_resource(|r| r.prepare(&Xid(vec![3]))).unwrap();
        assert_eq!(vote, PrepareVote::Commit);
    }

    #[test]
    fn disconnect_when_not_connected_is_a_noop() {
        let counters = Arc::new(Counters::default());
        let manager = manager(StubFactory::new(counters.clone()));

        manager.disconnect();
        assert_eq!(counters.closes.load(Ordering::SeqCst), 0);
    }
}
