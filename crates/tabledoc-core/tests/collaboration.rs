//! Two sessions sharing one grid through replicated sequences.

use std::cell::RefCell;
use std::collections::BTreeSet;

use pretty_assertions::assert_eq;
use tabledoc_core::{
    ActorId, CellRange, CellValue, ChangeEvent, Document, IntervalHandle, Marker, MemorySequence,
    Sequence, SequenceError, TableConfig, TableError, Version,
};

const ALICE: ActorId = ActorId(1);
const BOB: ActorId = ActorId(2);

type Doc = Document<MemorySequence>;

/// Alice creates the default grid; Bob opens a replica of it.
fn pair() -> (Doc, Doc) {
    let mut alice = Document::create(MemorySequence::new(ALICE), &TableConfig::default()).unwrap();
    // The replica starts from the populated state, so the setup ops are not shipped.
    alice.sequence_mut().take_outbound();
    let replica = alice.sequence().fork(BOB);
    let bob = Document::open(replica, &TableConfig::default()).unwrap();
    (alice, bob)
}

/// Ship every op `from` has issued so far to `to`, without reconciling.
fn ship(from: &mut Doc, to: &mut Doc) -> usize {
    let ops = from.sequence_mut().take_outbound();
    let count = ops.len();
    for op in ops {
        to.sequence_mut().apply_remote(op).unwrap();
    }
    count
}

#[test]
fn test_open_does_not_write() {
    let (_, mut bob) = pair();
    let version = bob.sequence().version();
    assert_eq!(bob.num_rows().unwrap(), 7);
    assert_eq!(bob.num_cols().unwrap(), 8);
    assert!(bob.sequence_mut().take_outbound().is_empty());
    assert_eq!(bob.sequence().version(), version);
}

#[test]
fn test_remote_write_refreshes_every_cell() {
    let (mut alice, mut bob) = pair();
    bob.set_cell_text(0, 0, "=D4+1").unwrap();
    assert_eq!(bob.evaluate_cell(0, 0).unwrap(), CellValue::Number(1.0));

    alice.set_cell_text(3, 3, "9").unwrap();
    ship(&mut alice, &mut bob);

    let report = bob.reconcile().unwrap();
    assert_eq!(report.remote, 2);
    assert_eq!(report.refreshed, 56);
    assert_eq!(bob.get_cell_text(3, 3).unwrap(), "9");
    assert_eq!(bob.evaluate_cell(0, 0).unwrap(), CellValue::Number(10.0));

    let report = alice.reconcile().unwrap();
    assert_eq!(report.remote, 0);
    assert_eq!(report.refreshed, 0);
}

#[test]
fn test_writes_converge_both_ways() {
    let (mut alice, mut bob) = pair();
    alice.set_cell_text(0, 0, "5").unwrap();
    ship(&mut alice, &mut bob);
    bob.reconcile().unwrap();

    bob.set_cell_text(0, 1, "=A1*2").unwrap();
    ship(&mut bob, &mut alice);
    alice.reconcile().unwrap();

    assert_eq!(alice.evaluate_cell(0, 1).unwrap(), CellValue::Number(10.0));
    assert_eq!(bob.evaluate_cell(0, 1).unwrap(), CellValue::Number(10.0));
    let left: Vec<&str> = alice.sequence().values().collect();
    let right: Vec<&str> = bob.sequence().values().collect();
    assert_eq!(left, right);
}

#[test]
fn test_remote_row_insert_moves_local_range() {
    let (mut alice, mut bob) = pair();
    bob.create_range("block", 0, 0, 1, 1).unwrap();

    alice.insert_rows(0, 2).unwrap();
    assert_eq!(ship(&mut alice, &mut bob), 16);
    bob.reconcile().unwrap();

    assert_eq!(bob.num_rows().unwrap(), 9);
    assert_eq!(bob.get_range("block").unwrap(), CellRange::new(2, 0, 3, 1));
}

#[test]
fn test_remote_column_insert_reshapes_replica() {
    let (mut alice, mut bob) = pair();
    alice.set_cell_text(1, 1, "b2").unwrap();
    alice.insert_cols(0, 1).unwrap();
    ship(&mut alice, &mut bob);

    let report = bob.reconcile().unwrap();
    assert_eq!(report.refreshed, 63);
    assert_eq!(bob.num_cols().unwrap(), 9);
    assert_eq!(bob.get_cell_text(1, 2).unwrap(), "b2");
}

#[test]
fn test_partial_row_is_a_structural_violation_until_resync() {
    let (mut alice, mut bob) = pair();
    alice.insert_rows(7, 1).unwrap();
    let mut ops = alice.sequence_mut().take_outbound();
    let rest = ops.split_off(3);
    for op in ops {
        bob.sequence_mut().apply_remote(op).unwrap();
    }

    assert!(matches!(
        bob.reconcile(),
        Err(TableError::StructuralViolation { length: 59, cols: 8 })
    ));
    assert!(matches!(bob.num_rows(), Err(TableError::StructuralViolation { .. })));
    assert!(bob.get_cell_text(0, 0).is_err());

    for op in rest {
        bob.sequence_mut().apply_remote(op).unwrap();
    }
    let report = bob.reconcile().unwrap();
    assert_eq!(report.refreshed, 64);
    assert_eq!(bob.num_rows().unwrap(), 8);
}

#[test]
fn test_remote_batch_is_refreshed_once() {
    let (mut alice, mut bob) = pair();
    for col in 0..8 {
        alice.set_cell_text(0, col, &col.to_string()).unwrap();
    }
    ship(&mut alice, &mut bob);

    let report = bob.reconcile().unwrap();
    assert_eq!(report.remote, 16);
    assert_eq!(report.refreshed, 56);
    assert_eq!(bob.evaluate_formula("=SUM(A1:H1)"), CellValue::Number(28.0));
}

#[test]
fn test_ranges_are_shared_between_sessions() {
    let (mut alice, mut bob) = pair();
    alice.create_range("totals", 0, 0, 1, 1).unwrap();
    assert_eq!(ship(&mut alice, &mut bob), 1);

    let report = bob.reconcile().unwrap();
    assert_eq!(report.remote, 1);
    assert_eq!(report.refreshed, 0);
    assert_eq!(bob.range_labels(), vec!["totals".to_string()]);
    assert_eq!(bob.get_range("totals").unwrap(), CellRange::new(0, 0, 1, 1));

    alice.insert_rows(0, 1).unwrap();
    ship(&mut alice, &mut bob);
    bob.reconcile().unwrap();
    assert_eq!(bob.get_range("totals").unwrap(), CellRange::new(1, 0, 2, 1));
}

#[test]
fn test_remote_range_removal_is_seen() {
    let (mut alice, mut bob) = pair();
    alice.create_range("totals", 2, 2, 3, 3).unwrap();
    ship(&mut alice, &mut bob);
    bob.reconcile().unwrap();

    bob.remove_range("totals").unwrap();
    ship(&mut bob, &mut alice);
    alice.reconcile().unwrap();
    assert!(matches!(
        alice.get_range("totals"),
        Err(TableError::RangeNotFound(label)) if label == "totals"
    ));
    assert!(alice.range_labels().is_empty());
}

/// Replica that remembers every position read through it.
struct RecordingSequence {
    inner: MemorySequence,
    reads: RefCell<Vec<usize>>,
}

impl Sequence for RecordingSequence {
    fn local_actor(&self) -> ActorId {
        self.inner.local_actor()
    }

    fn version(&self) -> Version {
        self.inner.version()
    }

    fn length(&self, at: Version) -> Result<usize, SequenceError> {
        self.inner.length(at)
    }

    fn get_at(&self, position: usize, at: Version) -> Result<Marker, SequenceError> {
        self.reads.borrow_mut().push(position);
        self.inner.get_at(position, at)
    }

    fn insert_at(
        &mut self,
        position: usize,
        marker: Marker,
        actor: ActorId,
    ) -> Result<(), SequenceError> {
        self.inner.insert_at(position, marker, actor)
    }

    fn delete_range(
        &mut self,
        start: usize,
        end: usize,
        actor: ActorId,
    ) -> Result<(), SequenceError> {
        self.inner.delete_range(start, end, actor)
    }

    fn stride(&self) -> usize {
        self.inner.stride()
    }

    fn set_stride(&mut self, cols: usize, actor: ActorId) -> Result<(), SequenceError> {
        self.inner.set_stride(cols, actor)
    }

    fn create_tracked_interval(
        &mut self,
        handle: &IntervalHandle,
        start: usize,
        end: usize,
        actor: ActorId,
    ) -> Result<(), SequenceError> {
        self.inner.create_tracked_interval(handle, start, end, actor)
    }

    fn resolve_tracked_interval(
        &self,
        handle: &IntervalHandle,
    ) -> Result<(usize, usize), SequenceError> {
        self.inner.resolve_tracked_interval(handle)
    }

    fn release_tracked_interval(
        &mut self,
        handle: &IntervalHandle,
        actor: ActorId,
    ) -> Result<(), SequenceError> {
        self.inner.release_tracked_interval(handle, actor)
    }

    fn tracked_intervals(&self) -> Vec<IntervalHandle> {
        self.inner.tracked_intervals()
    }

    fn drain_changes(&mut self) -> Vec<ChangeEvent> {
        self.inner.drain_changes()
    }
}

#[test]
fn test_remote_write_reloads_every_cell_from_the_sequence() {
    let mut alice = Document::create(MemorySequence::new(ALICE), &TableConfig::default()).unwrap();
    alice.sequence_mut().take_outbound();
    let replica = RecordingSequence {
        inner: alice.sequence().fork(BOB),
        reads: RefCell::new(Vec::new()),
    };
    let mut bob = Document::open(replica, &TableConfig::default()).unwrap();

    alice.set_cell_text(3, 3, "9").unwrap();
    for op in alice.sequence_mut().take_outbound() {
        bob.sequence_mut().inner.apply_remote(op).unwrap();
    }
    bob.sequence().reads.borrow_mut().clear();

    let report = bob.reconcile().unwrap();
    assert_eq!(report.refreshed, 56);
    let read: BTreeSet<usize> = bob.sequence().reads.borrow().iter().copied().collect();
    assert_eq!(read, (0..56).collect::<BTreeSet<_>>());
    assert_eq!(bob.get_cell_text(3, 3).unwrap(), "9");
}
