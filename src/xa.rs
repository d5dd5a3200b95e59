//! XA domain types and collaborator contracts
//!
//! This module defines the types exchanged with an XA resource manager and
//! the traits the rest of the crate is written against: the connection
//! factory, the live connection, and the two-phase-commit resource itself.
//! None of the identifiers or flags are interpreted here; they are carried
//! opaquely between the transaction manager and the resource manager.

use crate::error::XaResult;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;

/// Boxed opaque error produced by factory and connection collaborators
pub type ConnectionError = Box<dyn Error + Send + Sync>;

/// Opaque identifier for one resource manager's branch of a global
/// transaction. Supplied by callers and forwarded unchanged; this crate
/// never constructs or inspects its contents.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Xid(pub Vec<u8>);

impl fmt::Debug for Xid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Xid({} bytes)", self.0.len())
    }
}

/// Position of a recovery-scan call within an enumeration sequence
///
/// A scan may be a single `End`-flagged call, or a `Start`..`Mid`..`End`
/// sequence; only `End` signals that the scan is complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecoveryScan {
    Start,
    Mid,
    End,
}

/// Outcome of the prepare phase for one branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrepareVote {
    /// The branch made no changes; it needs no second phase.
    ReadOnly,
    /// The branch is prepared and will commit on request.
    Commit,
    /// The branch must be rolled back.
    RollbackNeeded,
}

/// Flags accepted by [`XaResource::start`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StartFlags {
    NoFlags,
    Join,
    Resume,
}

/// Flags accepted by [`XaResource::end`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndFlags {
    Success,
    Fail,
    Suspend,
}

/// The two-phase-commit resource contract
///
/// One resource manager endpoint supporting prepare/commit/rollback/recover
/// for distributed transaction branches. Implementations are driven by the
/// transaction manager; this crate both consumes the trait (delegating to
/// the resource derived from a live connection) and provides it (the
/// recovery adapter re-exposes the same contract over a lazy connection).
pub trait XaResource: Send + Sync {
    fn start(&self, xid: &Xid, flags: StartFlags) -> XaResult<()>;

    fn end(&self, xid: &Xid, flags: EndFlags) -> XaResult<()>;

    fn prepare(&self, xid: &Xid) -> XaResult<PrepareVote>;

    fn commit(&self, xid: &Xid, one_phase: bool) -> XaResult<()>;

    fn rollback(&self, xid: &Xid) -> XaResult<()>;

    fn forget(&self, xid: &Xid) -> XaResult<()>;

    /// Whether `other` fronts the same resource manager as this resource.
    fn is_same_rm(&self, other: &dyn XaResource) -> XaResult<bool>;

    /// Currently configured branch timeout, in seconds.
    fn transaction_timeout(&self) -> XaResult<u64>;

    /// Request a branch timeout in seconds; returns whether the resource
    /// manager accepted it.
    fn set_transaction_timeout(&self, seconds: u64) -> XaResult<bool>;

    /// Enumerate in-doubt branches held by the resource manager.
    fn recover(&self, scan: RecoveryScan) -> XaResult<Vec<Xid>>;
}

/// A live physical connection to an XA resource manager
pub trait XaConnection: Send + Sync {
    /// Derive the two-phase-commit resource bound to this connection.
    fn resource(&self) -> Result<Box<dyn XaResource>, ConnectionError>;

    /// Close the physical connection.
    fn close(&self) -> Result<(), ConnectionError>;
}

/// Factory producing connections to one XA resource manager
///
/// Treated as opaque; pooling, if any, lives behind this trait.
pub trait XaConnectionFactory: Send + Sync {
    /// Open a connection using the factory's ambient identity.
    fn connect(&self) -> Result<Box<dyn XaConnection>, ConnectionError>;

    /// Open a connection authenticating with an explicit credential pair.
    fn connect_as(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Box<dyn XaConnection>, ConnectionError>;
}
