use proptest::prelude::*;

use super::*;

struct Ping;
struct Pong;
struct Owner;

fn owner() -> ListenerKey {
	thread_local! {
		static OWNER: Arc<Owner> = Arc::new(Owner);
	}
	OWNER.with(ListenerKey::of)
}

fn reg<E: 'static>(priority: i8, tag: &'static str) -> Arc<Registration> {
	Arc::new(
		Registration::new(owner(), EventKind::of::<E>(), Priority(priority), Target::new(|_: &E| Ok(())))
			.with_method(tag),
	)
}

fn tags(seq: &Snapshot) -> Vec<&str> {
	seq.iter().map(|r| r.method.as_deref().unwrap_or("")).collect()
}

#[test]
fn empty_table_snapshot_is_empty() {
	let table = RegistrationTable::new();
	assert!(table.snapshot(EventKind::of::<Ping>()).is_empty());
	assert!(table.is_empty());
	assert_eq!(table.len(), 0);
}

#[test]
fn insert_orders_by_priority() {
	let table = RegistrationTable::new();
	table.insert(reg::<Ping>(10, "a"));
	table.insert(reg::<Ping>(-5, "b"));
	table.insert(reg::<Ping>(3, "c"));

	let seq = table.snapshot(EventKind::of::<Ping>());
	assert_eq!(tags(&seq), ["b", "c", "a"]);
}

#[test]
fn equal_priority_keeps_insertion_order() {
	let table = RegistrationTable::new();
	table.insert(reg::<Ping>(0, "first"));
	table.insert(reg::<Ping>(5, "late"));
	table.insert(reg::<Ping>(0, "second"));
	table.insert(reg::<Ping>(0, "third"));

	let seq = table.snapshot(EventKind::of::<Ping>());
	assert_eq!(tags(&seq), ["first", "second", "third", "late"]);
}

#[test]
fn kinds_are_kept_apart() {
	let table = RegistrationTable::new();
	table.insert(reg::<Ping>(0, "ping"));
	table.insert(reg::<Pong>(0, "pong"));

	assert_eq!(table.count(EventKind::of::<Ping>()), 1);
	assert_eq!(table.count(EventKind::of::<Pong>()), 1);
	assert_eq!(table.len(), 2);

	let mut kinds = table.kinds();
	kinds.sort_by_key(|k| k.name());
	assert_eq!(kinds.len(), 2);
}

#[test]
fn remove_matches_identity_not_value() {
	let table = RegistrationTable::new();
	let a = reg::<Ping>(0, "same");
	let b = reg::<Ping>(0, "same");
	table.insert(a.clone());
	table.insert(b.clone());

	assert!(table.remove(&a));
	let seq = table.snapshot(EventKind::of::<Ping>());
	assert_eq!(seq.len(), 1);
	assert!(Arc::ptr_eq(&seq[0], &b));
}

#[test]
fn remove_last_entry_drops_kind() {
	let table = RegistrationTable::new();
	let a = reg::<Ping>(0, "a");
	table.insert(a.clone());

	assert!(table.remove(&a));
	assert!(table.is_empty());
	assert!(table.kinds().is_empty());
}

#[test]
fn remove_missing_is_noop() {
	let table = RegistrationTable::new();
	let kept = reg::<Ping>(0, "kept");
	let stranger = reg::<Ping>(0, "stranger");
	table.insert(kept.clone());

	assert!(!table.remove(&stranger));
	assert!(table.remove(&kept));
	assert!(!table.remove(&kept));
	assert!(!table.remove(&reg::<Pong>(0, "other-kind")));
}

#[test]
fn old_snapshot_survives_writes() {
	let table = RegistrationTable::new();
	let a = reg::<Ping>(0, "a");
	table.insert(a.clone());

	let before = table.snapshot(EventKind::of::<Ping>());
	table.insert(reg::<Ping>(-1, "b"));
	table.remove(&a);

	assert_eq!(tags(&before), ["a"]);
	assert_eq!(tags(&table.snapshot(EventKind::of::<Ping>())), ["b"]);
}

#[test]
fn edit_publishes_once_on_commit() {
	let table = RegistrationTable::new();
	let mut edit = table.edit();
	edit.insert(reg::<Ping>(1, "x"));
	edit.insert(reg::<Ping>(0, "y"));

	assert!(table.snapshot(EventKind::of::<Ping>()).is_empty());
	edit.commit();
	assert_eq!(tags(&table.snapshot(EventKind::of::<Ping>())), ["y", "x"]);
}

#[test]
fn dropped_edit_is_discarded() {
	let table = RegistrationTable::new();
	{
		let mut edit = table.edit();
		edit.insert(reg::<Ping>(0, "never"));
	}
	assert!(table.is_empty());
}

#[test]
fn concurrent_inserts_are_all_kept() {
	const THREADS: usize = 8;
	const PER_THREAD: usize = 500;

	let table = Arc::new(RegistrationTable::new());
	let workers: Vec<_> = (0..THREADS)
		.map(|t| {
			let table = Arc::clone(&table);
			std::thread::spawn(move || {
				for i in 0..PER_THREAD {
					table.insert(reg::<Ping>(((t * 31 + i) % 256) as u8 as i8, "w"));
				}
			})
		})
		.collect();
	for worker in workers {
		worker.join().expect("writer panicked");
	}

	let seq = table.snapshot(EventKind::of::<Ping>());
	assert_eq!(seq.len(), THREADS * PER_THREAD);
	assert!(seq.windows(2).all(|w| w[0].priority <= w[1].priority));
}

#[test]
fn concurrent_edits_replay_onto_latest_map() {
	const THREADS: usize = 4;
	const ROUNDS: usize = 200;

	let table = Arc::new(RegistrationTable::new());
	let kept: Vec<_> = (0..THREADS).map(|t| reg::<Pong>(t as i8, "kept")).collect();
	for r in &kept {
		table.insert(r.clone());
	}

	let workers: Vec<_> = (0..THREADS)
		.map(|_| {
			let table = Arc::clone(&table);
			std::thread::spawn(move || {
				for round in 0..ROUNDS {
					let a = reg::<Ping>((round % 7) as i8, "a");
					let b = reg::<Ping>(-((round % 5) as i8), "b");
					let mut edit = table.edit();
					edit.insert(a.clone());
					edit.insert(b.clone());
					edit.commit();

					let mut edit = table.edit();
					assert!(edit.remove(&a));
					edit.commit();
				}
			})
		})
		.collect();
	for worker in workers {
		worker.join().expect("writer panicked");
	}

	assert_eq!(table.count(EventKind::of::<Ping>()), THREADS * ROUNDS);
	let pongs = table.snapshot(EventKind::of::<Pong>());
	assert_eq!(pongs.len(), THREADS);
	for (got, want) in pongs.iter().zip(&kept) {
		assert!(Arc::ptr_eq(got, want));
	}
}

proptest! {
	#[test]
	fn snapshot_is_sorted_and_stable(priorities in prop::collection::vec(any::<i8>(), 0..64)) {
		let table = RegistrationTable::new();
		let inserted: Vec<_> = priorities
			.iter()
			.map(|&p| {
				let r = reg::<Ping>(p, "p");
				table.insert(r.clone());
				r
			})
			.collect();

		let seq = table.snapshot(EventKind::of::<Ping>());
		prop_assert_eq!(seq.len(), inserted.len());

		let mut expected = inserted.clone();
		expected.sort_by_key(|r| r.priority);
		for (got, want) in seq.iter().zip(&expected) {
			prop_assert!(Arc::ptr_eq(got, want));
		}
	}

	#[test]
	fn removals_preserve_order_of_survivors(
		priorities in prop::collection::vec(any::<i8>(), 1..48),
		drop_mask in prop::collection::vec(any::<bool>(), 48),
	) {
		let table = RegistrationTable::new();
		let inserted: Vec<_> = priorities.iter().map(|&p| reg::<Ping>(p, "p")).collect();
		for r in &inserted {
			table.insert(r.clone());
		}

		let mut survivors = Vec::new();
		for (r, &gone) in inserted.iter().zip(&drop_mask) {
			if gone {
				prop_assert!(table.remove(r));
			} else {
				survivors.push(r.clone());
			}
		}
		survivors.sort_by_key(|r| r.priority);

		let seq = table.snapshot(EventKind::of::<Ping>());
		prop_assert_eq!(seq.len(), survivors.len());
		for (got, want) in seq.iter().zip(&survivors) {
			prop_assert!(Arc::ptr_eq(got, want));
		}
		prop_assert_eq!(table.is_empty(), survivors.is_empty());
	}
}
