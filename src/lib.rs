//! XA transaction-recovery coordination over lazy connections
//!
//! This crate is the adapter layer between a generic two-phase-commit
//! resource manager and a transaction manager's recovery subsystem. It
//! manages lazy, on-demand connections to an XA resource manager so the
//! recovery engine can enumerate and resolve in-doubt branches after a
//! crash or restart, even when no active application transaction exists.
//!
//! Three components, leaves first:
//!
//! - [`ConnectionManager`] owns the lazy connection/resource pair and the
//!   scoped-access primitives that guarantee connect-before-use and
//!   release-after-use on transient connections.
//! - [`RecoveryResourceAdapter`] implements both the recovery-helper and
//!   the 2PC resource contracts over one connection manager, including the
//!   end-of-scan disconnect policy.
//! - [`RecoveryRegistrar`] binds an injected recovery engine to the host
//!   lifecycle and registers helpers with its recovery module.

pub mod connection;
pub mod error;
pub mod recovery;
pub mod registrar;
pub mod xa;

pub use connection::{ConnectionManager, Credentials, ResourceManagerHandle};
pub use error::{RecoveryError, RecoveryResult, XaError, XaResult};
pub use recovery::{RecoveryHelper, RecoveryResourceAdapter};
pub use registrar::{RecoveryModule, RecoveryRegistrar, RecoveryService};
pub use xa::{
    EndFlags, PrepareVote, RecoveryScan, StartFlags, XaConnection, XaConnectionFactory,
    XaResource, Xid,
};
