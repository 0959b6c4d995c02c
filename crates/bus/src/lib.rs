//! In-process publish/subscribe with priority-ordered, synchronous delivery.
//!
//! Listeners register handlers for concrete event types; posting an event runs
//! every matching handler on the caller's thread, lowest [`Priority`] first,
//! ties in registration order.
//!
//! # Layout
//!
//! - [`RegistrationTable`]: per-type sorted handler lists, published through
//!   `arc-swap` so posting never takes a lock.
//! - [`EventBus`]: the façade. Keeps a per-listener index next to the table and
//!   updates both under one gate.
//! - [`Discovery`]: turns a [`Listener`]'s manifest into handler descriptors.
//! - [`Diagnostics`]: where the bus reports malformed handlers and handler
//!   failures. Defaults to `tracing`.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use herald_bus::{EventBus, Priority};
//!
//! struct Ping;
//!
//! let bus = EventBus::new();
//! let owner = Arc::new(());
//! bus.subscribe(&owner, Priority::NORMAL, |_: &Ping| Ok(()));
//! bus.post(&Ping);
//! bus.unregister(&owner);
//! ```

mod bus;
pub mod diagnostics;
mod discovery;
mod dispatch;
mod error;
mod event;
mod listener;
mod options;
mod table;
mod target;

pub use bus::{EventBus, EventBusBuilder};
pub use diagnostics::{Diagnostics, Report, TracingDiagnostics};
pub use discovery::{Discovery, HandlerDescriptor, ManifestDiscovery};
pub use error::{ConfigError, TargetRejected};
pub use event::{EventKind, Priority};
pub use listener::{HandlerMethod, Handlers, Listener, ListenerKey};
pub use options::BusOptions;
pub use table::{Registration, RegistrationTable, Snapshot, TableEdit};
pub use target::{HandlerResult, Target};
