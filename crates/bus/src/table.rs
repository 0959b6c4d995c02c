//! Priority-ordered registration table with lock-free snapshots.
//!
//! The table publishes one immutable map from event type to a sorted slice of
//! registrations through an [`ArcSwap`]. Readers load the current map without
//! locking. Writers build a modified copy and swap it in, so a reader either
//! sees the map from before a write or the map from after it.
//!
//! Writers publish with `compare_and_swap`. A writer that loses the race
//! replays its changes onto the map that won and tries again, so concurrent
//! writes are never dropped.

use std::any::TypeId;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use rustc_hash::FxHashMap as HashMap;

use crate::event::{EventKind, Priority};
use crate::listener::ListenerKey;
use crate::target::Target;

/// One subscription: a target bound to an event kind at a priority.
///
/// Registrations are compared by identity (`Arc::ptr_eq`), never by value.
pub struct Registration {
	pub listener: ListenerKey,
	pub event: EventKind,
	pub priority: Priority,
	pub method: Option<Cow<'static, str>>,
	pub target: Target,
}

impl Registration {
	pub fn new(listener: ListenerKey, event: EventKind, priority: Priority, target: Target) -> Self {
		Self {
			listener,
			event,
			priority,
			method: None,
			target,
		}
	}

	pub fn with_method(mut self, method: impl Into<Cow<'static, str>>) -> Self {
		self.method = Some(method.into());
		self
	}
}

impl fmt::Debug for Registration {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Registration")
			.field("listener", &self.listener)
			.field("event", &self.event)
			.field("priority", &self.priority)
			.field("method", &self.method)
			.finish_non_exhaustive()
	}
}

/// Immutable, sorted view of the registrations for one event kind.
pub type Snapshot = Arc<[Arc<Registration>]>;

type EventMap = HashMap<TypeId, Snapshot>;

pub struct RegistrationTable {
	published: ArcSwap<EventMap>,
}

impl RegistrationTable {
	pub fn new() -> Self {
		Self {
			published: ArcSwap::from_pointee(EventMap::default()),
		}
	}

	/// Current registrations for `kind`, ascending by priority.
	///
	/// Never blocks. The result may miss a write that completes concurrently.
	#[inline]
	pub fn snapshot(&self, kind: EventKind) -> Snapshot {
		self.snapshot_by_id(kind.id())
	}

	#[inline]
	pub(crate) fn snapshot_by_id(&self, id: TypeId) -> Snapshot {
		self.published.load().get(&id).cloned().unwrap_or_else(empty)
	}

	/// Inserts one registration after existing entries of equal priority.
	pub fn insert(&self, registration: Arc<Registration>) {
		let mut edit = self.edit();
		edit.insert(registration);
		edit.commit();
	}

	/// Removes exactly `registration`. Returns `false` if it was not present.
	pub fn remove(&self, registration: &Arc<Registration>) -> bool {
		let mut removed = false;
		self.published.rcu(|cur| {
			let mut map = (**cur).clone();
			removed = remove_exact(&mut map, registration);
			map
		});
		removed
	}

	/// Stages several changes to publish in one swap.
	pub fn edit(&self) -> TableEdit<'_> {
		let base = self.published.load_full();
		TableEdit {
			table: self,
			staged: (*base).clone(),
			base,
			changes: Vec::new(),
		}
	}

	/// Number of registrations for `kind`.
	pub fn count(&self, kind: EventKind) -> usize {
		self.published.load().get(&kind.id()).map_or(0, |seq| seq.len())
	}

	/// Total number of registrations across all kinds.
	pub fn len(&self) -> usize {
		self.published.load().values().map(|seq| seq.len()).sum()
	}

	pub fn is_empty(&self) -> bool {
		self.published.load().is_empty()
	}

	/// Event kinds that currently have at least one registration.
	pub fn kinds(&self) -> Vec<EventKind> {
		self.published.load().values().map(|seq| seq[0].event).collect()
	}
}

impl Default for RegistrationTable {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Debug for RegistrationTable {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RegistrationTable")
			.field("kinds", &self.published.load().len())
			.field("registrations", &self.len())
			.finish()
	}
}

/// Pending changes against one copy of the table.
///
/// Nothing is visible to readers until [`commit`](Self::commit). Dropping the
/// edit discards it.
pub struct TableEdit<'a> {
	table: &'a RegistrationTable,
	base: Arc<EventMap>,
	staged: EventMap,
	changes: Vec<Change>,
}

enum Change {
	Insert(Arc<Registration>),
	Remove(Arc<Registration>),
}

impl Change {
	fn apply(&self, map: &mut EventMap) {
		match self {
			Change::Insert(registration) => insert_sorted(map, Arc::clone(registration)),
			Change::Remove(registration) => {
				remove_exact(map, registration);
			}
		}
	}
}

impl TableEdit<'_> {
	pub fn insert(&mut self, registration: Arc<Registration>) {
		insert_sorted(&mut self.staged, Arc::clone(&registration));
		self.changes.push(Change::Insert(registration));
	}

	pub fn remove(&mut self, registration: &Arc<Registration>) -> bool {
		if !remove_exact(&mut self.staged, registration) {
			return false;
		}
		self.changes.push(Change::Remove(Arc::clone(registration)));
		true
	}

	/// Publishes the staged map. A no-op if nothing changed.
	///
	/// If another writer published since [`RegistrationTable::edit`], the
	/// recorded changes are replayed onto its map before retrying.
	pub fn commit(self) {
		if self.changes.is_empty() {
			return;
		}
		let published = &self.table.published;
		let mut cur = self.base;
		let mut next = Arc::new(self.staged);
		loop {
			let prev = published.compare_and_swap(&cur, next);
			if Arc::ptr_eq(&*prev, &cur) {
				return;
			}
			cur = Arc::clone(&*prev);
			let mut map = (*cur).clone();
			for change in &self.changes {
				change.apply(&mut map);
			}
			next = Arc::new(map);
		}
	}
}

/// Inserts after existing entries of equal priority.
fn insert_sorted(map: &mut EventMap, registration: Arc<Registration>) {
	let id = registration.event.id();
	let next = match map.get(&id) {
		Some(current) => {
			let index = current.partition_point(|r| r.priority <= registration.priority);
			let mut next = Vec::with_capacity(current.len() + 1);
			next.extend_from_slice(&current[..index]);
			next.push(registration);
			next.extend_from_slice(&current[index..]);
			Snapshot::from(next)
		}
		None => Snapshot::from([registration]),
	};
	map.insert(id, next);
}

/// Removes exactly `registration`, dropping the kind once it is empty.
fn remove_exact(map: &mut EventMap, registration: &Arc<Registration>) -> bool {
	let id = registration.event.id();
	let Some(current) = map.get(&id) else {
		return false;
	};
	let Some(index) = current.iter().position(|r| Arc::ptr_eq(r, registration)) else {
		return false;
	};

	if current.len() == 1 {
		map.remove(&id);
	} else {
		let mut next = Vec::with_capacity(current.len() - 1);
		next.extend_from_slice(&current[..index]);
		next.extend_from_slice(&current[index + 1..]);
		map.insert(id, Snapshot::from(next));
	}
	true
}

fn empty() -> Snapshot {
	Arc::from([])
}

#[cfg(test)]
mod tests;
