//! Recovery helper exposing a lazily-connected XA resource
//!
//! A [`RecoveryResourceAdapter`] is both a discoverable source of
//! recoverable branches and a two-phase-commit resource in one object: the
//! recovery engine asks it for resources and gets the adapter itself back,
//! then drives the XA contract against it. Every operation delegates
//! through the [`ConnectionManager`], which decides whether the call rides
//! an existing connection or gets a transient one.

use crate::connection::{ConnectionManager, ResourceManagerHandle};
use crate::error::XaResult;
use crate::xa::{EndFlags, PrepareVote, RecoveryScan, StartFlags, XaResource, Xid};

/// One pluggable unit the recovery engine scans for in-doubt branches
pub trait RecoveryHelper: Send + Sync {
    /// Accept opaque engine configuration. Returns whether initialization
    /// succeeded.
    fn initialize(&self, config: &str) -> bool;

    /// The 2PC resources this helper can currently reach. An unreachable
    /// resource manager yields an empty set, not an error; the engine will
    /// retry on its next scan cycle.
    fn xa_resources(&self) -> Vec<&dyn XaResource>;
}

/// Recovery helper backed by one lazily-connected XA resource manager
pub struct RecoveryResourceAdapter {
    connection: ConnectionManager,
}

impl RecoveryResourceAdapter {
    pub fn new(handle: ResourceManagerHandle) -> Self {
        Self {
            connection: ConnectionManager::new(handle),
        }
    }

    /// The underlying connection manager. Callers that open a multi-call
    /// bracket (start/end/prepare sharing one connection) use this to
    /// disconnect once the bracket is done.
    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }
}

impl RecoveryHelper for RecoveryResourceAdapter {
    fn initialize(&self, _config: &str) -> bool {
        true
    }

    fn xa_resources(&self) -> Vec<&dyn XaResource> {
        if !self.connection.is_connected() {
            if let Err(e) = self.connection.connect() {
                tracing::debug!("Resource manager unreachable, nothing to recover: {}", e);
                return Vec::new();
            }
        }
        vec![self]
    }
}

impl XaResource for RecoveryResourceAdapter {
    fn start(&self, xid: &Xid, flags: StartFlags) -> XaResult<()> {
        self.connection.with_resource(|r| r.start(xid, flags))
    }

    fn end(&self, xid: &Xid, flags: EndFlags) -> XaResult<()> {
        self.connection.with_resource(|r| r.end(xid, flags))
    }

    fn prepare(&self, xid: &Xid) -> XaResult<PrepareVote> {
        self.connection.apply_resource(|r| r.prepare(xid))
    }

    fn commit(&self, xid: &Xid, one_phase: bool) -> XaResult<()> {
        self.connection.with_resource(|r| r.commit(xid, one_phase))
    }

    fn rollback(&self, xid: &Xid) -> XaResult<()> {
        self.connection.with_resource(|r| r.rollback(xid))
    }

    fn forget(&self, xid: &Xid) -> XaResult<()> {
        self.connection.with_resource(|r| r.forget(xid))
    }

    fn is_same_rm(&self, other: &dyn XaResource) -> XaResult<bool> {
        self.connection.apply_resource(|r| r.is_same_rm(other))
    }

    fn transaction_timeout(&self) -> XaResult<u64> {
        self.connection.apply_resource(|r| r.transaction_timeout())
    }

    fn set_transaction_timeout(&self, seconds: u64) -> XaResult<bool> {
        self.connection
            .apply_resource(|r| r.set_transaction_timeout(seconds))
    }

    /// Delegates the scan, then releases the shared connection once the
    /// scan is complete. Only an `End`-flagged call signals completion;
    /// `Start` and `Mid` calls must leave the connection open so the scan
    /// keeps its continuity. The disconnect runs whether or not the
    /// delegated call failed.
    fn recover(&self, scan: RecoveryScan) -> XaResult<Vec<Xid>> {
        let result = self.connection.apply_resource(|r| r.recover(scan));
        if scan == RecoveryScan::End {
            self.connection.disconnect();
        }
        result
    }
}
