//! Registration of resource provider manifests.
//!
//! [`Registrar`] drives the ordered sequence of upserts that make a manifest
//! visible on a control plane: the provider, each resource type and API
//! version, and finally the location that references them. Every remote call
//! goes through [`with_retry`], which absorbs optimistic-concurrency
//! conflicts with exponential backoff while honouring the run's [`Context`].
//!
//! The control plane itself is reached through the store traits in
//! [`store`]; [`InMemoryControlPlane`] implements them for tests and dry runs.

pub mod context;
pub mod error;
pub mod memory;
pub mod progress;
pub mod registrar;
pub mod retry;
pub mod store;

pub use context::{Cancellation, Context};
pub use error::{Error, Result};
pub use memory::{Call, CallKind, InMemoryControlPlane};
pub use progress::{NoProgress, Progress, ProgressEvent};
pub use registrar::{LocationAggregate, Registrar};
pub use retry::{InvalidRetryPolicy, RetryError, RetryNotice, RetryPolicy, is_conflict, with_retry};
pub use store::{ControlPlane, LocationStore, ProviderStore, RemoteError, TypeStore, VersionStore};
