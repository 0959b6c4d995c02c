//! Listener identity and handler manifests.

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::event::{EventKind, Priority};
use crate::target::{HandlerResult, Target};

/// Identity of a listener object.
///
/// Two keys are equal only if they were taken from the same `Arc` allocation.
/// The bus keeps registered listeners alive, so a key cannot be reused by a
/// different listener while it is still registered.
#[derive(Clone, Copy)]
pub struct ListenerKey {
	addr: usize,
	type_name: &'static str,
}

impl ListenerKey {
	pub fn of<L: ?Sized>(listener: &Arc<L>) -> Self {
		Self {
			addr: Arc::as_ptr(listener) as *const () as usize,
			type_name: std::any::type_name::<L>(),
		}
	}

	/// Type name of the listener, for diagnostics.
	#[inline]
	pub fn type_name(&self) -> &'static str {
		self.type_name
	}
}

impl PartialEq for ListenerKey {
	fn eq(&self, other: &Self) -> bool {
		self.addr == other.addr
	}
}

impl Eq for ListenerKey {}

impl Hash for ListenerKey {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.addr.hash(state);
	}
}

impl fmt::Debug for ListenerKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}@{:#x}", self.type_name, self.addr)
	}
}

/// An object that declares its own handlers.
///
/// The manifest is read once per [`EventBus::register`](crate::EventBus::register)
/// call. Each returned method is bound to `self`.
///
/// ```
/// use std::sync::Arc;
/// use herald_bus::{HandlerMethod, HandlerResult, Handlers, Listener, Priority};
///
/// struct Ping;
/// struct Audit;
///
/// impl Audit {
/// 	fn on_ping(&self, _: &Ping) -> HandlerResult {
/// 		Ok(())
/// 	}
/// }
///
/// impl Listener for Audit {
/// 	fn handlers(self: Arc<Self>) -> Vec<HandlerMethod> {
/// 		Handlers::bind(self).on("on_ping", Priority::HIGH, Self::on_ping).build()
/// 	}
/// }
/// ```
pub trait Listener: Any + Send + Sync {
	fn handlers(self: Arc<Self>) -> Vec<HandlerMethod>;
}

type MethodFn = dyn Fn(&dyn Any) -> HandlerResult + Send + Sync;

/// One handler candidate declared by a listener.
///
/// Only single-parameter methods can be subscribed; discovery drops the rest.
/// The parameter list is fixed at construction so a method's declared kinds
/// always match what its closure expects.
#[derive(Clone)]
pub struct HandlerMethod {
	pub name: Cow<'static, str>,
	pub priority: Priority,
	params: Vec<EventKind>,
	invoke: Arc<MethodFn>,
}

impl HandlerMethod {
	/// A method whose shape is only known at runtime.
	pub fn dynamic<F>(
		name: impl Into<Cow<'static, str>>,
		priority: Priority,
		params: Vec<EventKind>,
		invoke: F,
	) -> Self
	where
		F: Fn(&dyn Any) -> HandlerResult + Send + Sync + 'static,
	{
		Self {
			name: name.into(),
			priority,
			params,
			invoke: Arc::new(invoke),
		}
	}

	/// Event kinds the method takes, in order.
	#[inline]
	pub fn params(&self) -> &[EventKind] {
		&self.params
	}

	#[inline]
	pub fn arity(&self) -> usize {
		self.params.len()
	}

	/// Converts the method into a target for its single parameter.
	///
	/// Returns `None` unless the method takes exactly one parameter.
	pub fn into_target(self) -> Option<Target> {
		let [kind] = self.params.as_slice() else {
			return None;
		};
		let invoke = self.invoke;
		Some(Target::erased(*kind, move |event| invoke(event)))
	}
}

impl fmt::Debug for HandlerMethod {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("HandlerMethod")
			.field("name", &self.name)
			.field("priority", &self.priority)
			.field("params", &self.params)
			.finish_non_exhaustive()
	}
}

/// Builder for a listener's manifest.
pub struct Handlers<L> {
	this: Arc<L>,
	methods: Vec<HandlerMethod>,
}

impl<L: Send + Sync + 'static> Handlers<L> {
	pub fn bind(this: Arc<L>) -> Self {
		Self {
			this,
			methods: Vec::new(),
		}
	}

	/// Declares a typed method taking one event.
	pub fn on<E, F>(mut self, name: &'static str, priority: Priority, method: F) -> Self
	where
		E: Any,
		F: Fn(&L, &E) -> HandlerResult + Send + Sync + 'static,
	{
		let this = Arc::clone(&self.this);
		let kind = EventKind::of::<E>();
		self.methods.push(HandlerMethod::dynamic(name, priority, vec![kind], move |event| {
			// Only reachable through a target that accepts `kind`.
			let Some(event) = event.downcast_ref::<E>() else {
				unreachable!("method for `{}` called with another event type", kind.name());
			};
			method(&*this, event)
		}));
		self
	}

	/// Declares a method with a runtime parameter list.
	pub fn dynamic<F>(
		mut self,
		name: impl Into<Cow<'static, str>>,
		priority: Priority,
		params: Vec<EventKind>,
		invoke: F,
	) -> Self
	where
		F: Fn(&L, &dyn Any) -> HandlerResult + Send + Sync + 'static,
	{
		let this = Arc::clone(&self.this);
		self.methods.push(HandlerMethod::dynamic(name, priority, params, move |event| {
			invoke(&*this, event)
		}));
		self
	}

	pub fn build(self) -> Vec<HandlerMethod> {
		self.methods
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicUsize, Ordering};

	use super::*;

	struct Ping;
	struct Pong;
	struct Probe;

	#[test]
	fn keys_follow_allocation_identity() {
		let a = Arc::new(Probe);
		let b = Arc::new(Probe);
		assert_eq!(ListenerKey::of(&a), ListenerKey::of(&a.clone()));
		assert_ne!(ListenerKey::of(&a), ListenerKey::of(&b));
		assert!(ListenerKey::of(&a).type_name().ends_with("Probe"));
	}

	#[test]
	fn single_param_method_becomes_target() {
		let methods = Handlers::bind(Arc::new(Probe))
			.on("on_ping", Priority::LOW, |_: &Probe, _: &Ping| Ok(()))
			.build();
		assert_eq!(methods.len(), 1);
		assert_eq!(methods[0].arity(), 1);

		let target = methods[0].clone().into_target().unwrap();
		assert_eq!(target.accepts(), EventKind::of::<Ping>());
		assert!(target.invoke(EventKind::of::<Ping>(), &Ping).unwrap().is_ok());
	}

	#[test]
	fn typed_method_is_not_called_with_other_events() {
		let calls = Arc::new(AtomicUsize::new(0));
		let seen = calls.clone();
		let methods = Handlers::bind(Arc::new(Probe))
			.on("on_ping", Priority::NORMAL, move |_: &Probe, _: &Ping| {
				seen.fetch_add(1, Ordering::SeqCst);
				Ok(())
			})
			.build();
		assert_eq!(methods[0].params(), [EventKind::of::<Ping>()]);

		let target = methods[0].clone().into_target().unwrap();
		assert!(target.invoke(EventKind::of::<Pong>(), &Pong).is_err());
		assert_eq!(calls.load(Ordering::SeqCst), 0);

		assert!(target.invoke(EventKind::of::<Ping>(), &Ping).unwrap().is_ok());
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn multi_param_method_has_no_target() {
		let methods = Handlers::bind(Arc::new(Probe))
			.dynamic(
				"on_pair",
				Priority::NORMAL,
				vec![EventKind::of::<Ping>(), EventKind::of::<Pong>()],
				|_, _| Ok(()),
			)
			.build();
		assert_eq!(methods[0].arity(), 2);
		assert!(methods[0].clone().into_target().is_none());
	}
}
