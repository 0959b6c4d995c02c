//! Ordered delivery of one event to a snapshot of registrations.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::diagnostics::{Diagnostics, Report};
use crate::table::Registration;

/// Invokes every registration in `snapshot`, in order, on the calling thread.
///
/// Handler errors are reported and skipped. Panics are reported and skipped
/// when `catch_panics` is set, otherwise they unwind into the caller. A target
/// that rejects the event type panics: it was registered under the wrong kind.
pub(crate) fn dispatch(
	snapshot: &[Arc<Registration>],
	event: &dyn Any,
	diagnostics: &dyn Diagnostics,
	catch_panics: bool,
) {
	for registration in snapshot {
		let outcome = if catch_panics {
			match panic::catch_unwind(AssertUnwindSafe(|| {
				registration.target.invoke(registration.event, event)
			})) {
				Ok(outcome) => outcome,
				Err(payload) => {
					diagnostics.report(&Report::HandlerPanicked {
						event: registration.event.name(),
						listener: registration.listener.type_name(),
						method: registration.method.as_deref(),
						message: panic_message(payload.as_ref()),
					});
					continue;
				}
			}
		} else {
			registration.target.invoke(registration.event, event)
		};

		match outcome {
			Ok(Ok(())) => {}
			Ok(Err(error)) => diagnostics.report(&Report::HandlerFailed {
				event: registration.event.name(),
				listener: registration.listener.type_name(),
				method: registration.method.as_deref(),
				error: &error,
			}),
			Err(rejected) => panic!("{rejected}"),
		}
	}
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
	if let Some(s) = payload.downcast_ref::<&'static str>() {
		s
	} else if let Some(s) = payload.downcast_ref::<String>() {
		s.as_str()
	} else {
		"<non-string panic payload>"
	}
}
