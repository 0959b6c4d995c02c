//! The bus façade: registration bookkeeping and posting.

use std::any::Any;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap as HashMap;

use crate::diagnostics::{Diagnostics, Report, TracingDiagnostics};
use crate::discovery::{Discovery, ManifestDiscovery};
use crate::dispatch::dispatch;
use crate::event::{EventKind, Priority};
use crate::listener::{Listener, ListenerKey};
use crate::options::BusOptions;
use crate::table::{Registration, RegistrationTable, Snapshot};
use crate::target::{HandlerResult, Target};

/// Registrations owned by one listener.
struct ListenerEntry {
	/// Holds the listener alive so its key stays unique while registered.
	_keepalive: Arc<dyn Any + Send + Sync>,
	registrations: Vec<Arc<Registration>>,
}

type ListenerIndex = HashMap<ListenerKey, ListenerEntry>;

/// Synchronous, priority-ordered event bus.
///
/// Posting reads an immutable snapshot and never waits on registration.
/// Registration and unregistration serialize on a single gate that guards the
/// listener index and every table write.
pub struct EventBus {
	table: RegistrationTable,
	gate: Mutex<ListenerIndex>,
	discovery: Arc<dyn Discovery>,
	diagnostics: Arc<dyn Diagnostics>,
	options: BusOptions,
}

impl EventBus {
	/// Creates a bus with default options, logging through `tracing`.
	pub fn new() -> Self {
		Self::builder().build()
	}

	pub fn with_diagnostics(diagnostics: Arc<dyn Diagnostics>) -> Self {
		Self::builder().diagnostics(diagnostics).build()
	}

	pub fn builder() -> EventBusBuilder {
		EventBusBuilder::default()
	}

	#[inline]
	pub fn options(&self) -> &BusOptions {
		&self.options
	}

	/// Registers every handler `listener` declares.
	///
	/// Malformed handlers are reported and skipped. All accepted handlers are
	/// published together. Returns how many were registered.
	pub fn register<L: Listener>(&self, listener: &Arc<L>) -> usize {
		let key = ListenerKey::of(listener);
		let found = self.discovery.discover(
			key,
			Arc::clone(listener) as Arc<dyn Listener>,
			self.diagnostics.as_ref(),
		);
		let registrations = found
			.into_iter()
			.map(|d| {
				Arc::new(Registration::new(key, d.event, d.priority, d.target).with_method(d.method))
			})
			.collect();
		self.record(key, listener, registrations)
	}

	/// Registers a single target for `kind` on behalf of `listener`.
	///
	/// # Panics
	///
	/// Panics if `target` was built for a different event kind than `kind`.
	pub fn register_handler<L>(&self, listener: &Arc<L>, kind: EventKind, priority: Priority, target: Target)
	where
		L: Any + Send + Sync,
	{
		assert_eq!(
			target.accepts(),
			kind,
			"target for `{}` registered under `{}`",
			target.accepts(),
			kind
		);
		let key = ListenerKey::of(listener);
		let registration = Arc::new(Registration::new(key, kind, priority, target));
		self.record(key, listener, vec![registration]);
	}

	/// Typed shorthand for [`register_handler`](Self::register_handler).
	pub fn subscribe<L, E, F>(&self, listener: &Arc<L>, priority: Priority, handler: F)
	where
		L: Any + Send + Sync,
		E: Any,
		F: Fn(&E) -> HandlerResult + Send + Sync + 'static,
	{
		self.register_handler(listener, EventKind::of::<E>(), priority, Target::new(handler));
	}

	fn record<L>(&self, key: ListenerKey, listener: &Arc<L>, registrations: Vec<Arc<Registration>>) -> usize
	where
		L: Any + Send + Sync,
	{
		let count = registrations.len();
		if count == 0 {
			return 0;
		}

		{
			let mut index = self.gate.lock();
			let mut edit = self.table.edit();
			for registration in &registrations {
				edit.insert(Arc::clone(registration));
			}
			edit.commit();

			index
				.entry(key)
				.or_insert_with(|| ListenerEntry {
					_keepalive: Arc::clone(listener) as Arc<dyn Any + Send + Sync>,
					registrations: Vec::new(),
				})
				.registrations
				.extend(registrations);
		}

		self.diagnostics.report(&Report::Registered {
			listener: key.type_name(),
			count,
		});
		count
	}

	/// Removes every registration owned by `listener`.
	///
	/// Unknown and already unregistered listeners are a no-op. Returns how
	/// many registrations were removed.
	pub fn unregister<L: ?Sized>(&self, listener: &Arc<L>) -> usize {
		let key = ListenerKey::of(listener);
		let count = {
			let mut index = self.gate.lock();
			let Some(entry) = index.remove(&key) else {
				return 0;
			};
			let mut edit = self.table.edit();
			for registration in &entry.registrations {
				edit.remove(registration);
			}
			edit.commit();
			entry.registrations.len()
		};

		self.diagnostics.report(&Report::Unregistered {
			listener: key.type_name(),
			count,
		});
		count
	}

	/// Delivers `event` to every handler registered for its exact type.
	pub fn post<E: Any>(&self, event: &E) {
		self.post_dyn(event);
	}

	/// Like [`post`](Self::post) for an event whose type is erased.
	pub fn post_dyn(&self, event: &dyn Any) {
		let snapshot = self.table.snapshot_by_id((*event).type_id());
		if snapshot.is_empty() {
			return;
		}
		dispatch(&snapshot, event, self.diagnostics.as_ref(), self.options.catch_panics);
	}

	/// Current handlers for `E`, in dispatch order.
	pub fn handlers<E: Any>(&self) -> Snapshot {
		self.table.snapshot(EventKind::of::<E>())
	}

	pub fn snapshot(&self, kind: EventKind) -> Snapshot {
		self.table.snapshot(kind)
	}

	pub fn handler_count(&self, kind: EventKind) -> usize {
		self.table.count(kind)
	}

	pub fn listener_count(&self) -> usize {
		self.gate.lock().len()
	}

	pub fn is_registered<L: ?Sized>(&self, listener: &Arc<L>) -> bool {
		self.gate.lock().contains_key(&ListenerKey::of(listener))
	}
}

impl Default for EventBus {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Debug for EventBus {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("EventBus")
			.field("name", &self.options.name)
			.field("table", &self.table)
			.finish_non_exhaustive()
	}
}

/// Builder for [`EventBus`].
#[derive(Default)]
pub struct EventBusBuilder {
	options: BusOptions,
	discovery: Option<Arc<dyn Discovery>>,
	diagnostics: Option<Arc<dyn Diagnostics>>,
}

impl EventBusBuilder {
	pub fn options(mut self, options: BusOptions) -> Self {
		self.options = options;
		self
	}

	pub fn discovery(mut self, discovery: Arc<dyn Discovery>) -> Self {
		self.discovery = Some(discovery);
		self
	}

	pub fn diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
		self.diagnostics = Some(diagnostics);
		self
	}

	pub fn build(self) -> EventBus {
		let diagnostics = self
			.diagnostics
			.unwrap_or_else(|| Arc::new(TracingDiagnostics::new(self.options.name.clone())));
		EventBus {
			table: RegistrationTable::new(),
			gate: Mutex::new(ListenerIndex::default()),
			discovery: self.discovery.unwrap_or_else(|| Arc::new(ManifestDiscovery)),
			diagnostics,
			options: self.options,
		}
	}
}
