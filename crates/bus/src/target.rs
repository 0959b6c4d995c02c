//! Type-erased handler targets.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::TargetRejected;
use crate::event::EventKind;

/// Outcome of a single handler invocation.
pub type HandlerResult = anyhow::Result<()>;

type ErasedFn = dyn Fn(&dyn Any) -> HandlerResult + Send + Sync;

/// Invocable bound to one event kind.
///
/// Cloning is cheap; clones share the underlying closure.
#[derive(Clone)]
pub struct Target {
	accepts: EventKind,
	call: Arc<ErasedFn>,
}

impl Target {
	/// Wraps a typed closure.
	pub fn new<E, F>(f: F) -> Self
	where
		E: Any,
		F: Fn(&E) -> HandlerResult + Send + Sync + 'static,
	{
		let accepts = EventKind::of::<E>();
		Self {
			accepts,
			call: Arc::new(move |event: &dyn Any| {
				// `invoke` has already matched the concrete type against `accepts`.
				let Some(event) = event.downcast_ref::<E>() else {
					unreachable!("target for `{}` called with another event type", accepts.name());
				};
				f(event)
			}),
		}
	}

	/// Wraps a closure that receives the event still erased.
	///
	/// `accepts` is trusted: the closure is only called with events of that kind.
	pub fn erased<F>(accepts: EventKind, f: F) -> Self
	where
		F: Fn(&dyn Any) -> HandlerResult + Send + Sync + 'static,
	{
		Self {
			accepts,
			call: Arc::new(f),
		}
	}

	#[inline]
	pub fn accepts(&self) -> EventKind {
		self.accepts
	}

	/// Invokes the target with `event`, described by `kind`.
	///
	/// The outer `Err` is a structural mismatch; the inner result is the
	/// handler's own outcome.
	pub fn invoke(&self, kind: EventKind, event: &dyn Any) -> Result<HandlerResult, TargetRejected> {
		if !self.accepts.matches(event) {
			return Err(TargetRejected {
				expected: self.accepts.name(),
				actual: kind.name(),
			});
		}
		Ok((self.call)(event))
	}
}

impl fmt::Debug for Target {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Target").field("accepts", &self.accepts).finish_non_exhaustive()
	}
}
