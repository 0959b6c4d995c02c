//! Event type tags and dispatch priorities.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Type tag naming the concrete event type a handler subscribes to.
///
/// Equality is by [`TypeId`]; the name is carried for diagnostics only.
#[derive(Clone, Copy)]
pub struct EventKind {
	id: TypeId,
	name: &'static str,
}

impl EventKind {
	/// Tag for the concrete type `E`.
	#[inline]
	pub fn of<E: Any>() -> Self {
		Self {
			id: TypeId::of::<E>(),
			name: std::any::type_name::<E>(),
		}
	}

	#[inline]
	pub fn id(&self) -> TypeId {
		self.id
	}

	#[inline]
	pub fn name(&self) -> &'static str {
		self.name
	}

	/// Returns `true` if `event` is exactly of this kind.
	#[inline]
	pub fn matches(&self, event: &dyn Any) -> bool {
		(*event).type_id() == self.id
	}
}

impl PartialEq for EventKind {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
	}
}

impl Eq for EventKind {}

impl Hash for EventKind {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.id.hash(state);
	}
}

impl fmt::Debug for EventKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("EventKind").field(&self.name).finish()
	}
}

impl fmt::Display for EventKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name)
	}
}

/// Dispatch ordering key. Lower values run earlier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(pub i8);

impl Priority {
	pub const LOWEST: Self = Self(-64);
	pub const LOW: Self = Self(-32);
	pub const NORMAL: Self = Self(0);
	pub const HIGH: Self = Self(32);
	pub const HIGHEST: Self = Self(64);

	#[inline]
	pub const fn get(self) -> i8 {
		self.0
	}
}

impl From<i8> for Priority {
	fn from(value: i8) -> Self {
		Self(value)
	}
}

impl fmt::Display for Priority {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}
