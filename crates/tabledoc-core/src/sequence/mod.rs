//! The ordered marker sequence a grid document is laid over.
//!
//! [`Sequence`] is the seam to the collaborative store: it owns ordering,
//! merging and propagation of edits, and hands back ordered change
//! notifications tagged with the actor that produced them. The document only
//! ever asks it for lengths, markers and the shared collection of tracked
//! intervals.

mod memory;

pub use memory::MemorySequence;

use std::fmt;

use thiserror::Error;

/// Identity of the session that originated an edit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(pub u64);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor-{}", self.0)
    }
}

/// Logical version of the sequence. Every applied op advances it by one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Version(pub u64);

impl Version {
    pub fn next(self) -> Version {
        Version(self.0 + 1)
    }
}

/// One grid cell's worth of sequence content.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Marker {
    pub value: String,
}

impl Marker {
    pub fn new(value: impl Into<String>) -> Self {
        Marker {
            value: value.into(),
        }
    }
}

/// Label of an interval the sequence keeps anchored to content.
///
/// Intervals live in a collection shared by every replica, so two sessions
/// naming the same label address the same interval.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntervalHandle(String);

impl IntervalHandle {
    pub fn new(label: impl Into<String>) -> Self {
        IntervalHandle(label.into())
    }

    pub fn label(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IntervalHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single mutation of the sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SequenceOp {
    Insert { position: usize, marker: Marker },
    /// Removes the half-open range `start..end`.
    Delete { start: usize, end: usize },
    SetStride { cols: usize },
    /// Anchors `handle` on the markers at inclusive positions `start` and
    /// `end`, replacing any interval already under that label.
    TrackInterval {
        handle: IntervalHandle,
        start: usize,
        end: usize,
    },
    ReleaseInterval { handle: IntervalHandle },
}

impl SequenceOp {
    /// Whether applying the op can change any marker's content or position.
    pub fn touches_content(&self) -> bool {
        matches!(
            self,
            SequenceOp::Insert { .. } | SequenceOp::Delete { .. } | SequenceOp::SetStride { .. }
        )
    }
}

/// An op together with the actor that issued it, as exchanged between replicas.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaggedOp {
    pub actor: ActorId,
    pub op: SequenceOp,
}

/// Notification that an op has been applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Version reached by applying `op`.
    pub version: Version,
    pub actor: ActorId,
    pub op: SequenceOp,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SequenceError {
    #[error("position {position} is out of bounds for length {length}")]
    PositionOutOfBounds { position: usize, length: usize },

    #[error("range {start}..{end} is invalid for length {length}")]
    InvalidRange {
        start: usize,
        end: usize,
        length: usize,
    },

    #[error("version {requested:?} is older than the applied version {current:?}")]
    VersionUnavailable { requested: Version, current: Version },

    #[error("unknown tracked interval '{0}'")]
    UnknownInterval(IntervalHandle),

    #[error("tracked interval '{0}' lost its anchors")]
    DetachedInterval(IntervalHandle),
}

/// The collaborative ordered sequence, seen from one session.
///
/// Reads take the version they are performed against. Mutations take the
/// actor they are attributed to; every applied mutation, local or remote,
/// is reported once through [`Sequence::drain_changes`] in application order.
pub trait Sequence {
    /// Actor identity of the session this handle belongs to.
    fn local_actor(&self) -> ActorId;

    /// Version reached by the most recently applied op.
    fn version(&self) -> Version;

    fn length(&self, at: Version) -> Result<usize, SequenceError>;

    fn get_at(&self, position: usize, at: Version) -> Result<Marker, SequenceError>;

    /// Insert `marker` so that it ends up at `position` (`0..=length`).
    fn insert_at(
        &mut self,
        position: usize,
        marker: Marker,
        actor: ActorId,
    ) -> Result<(), SequenceError>;

    /// Remove the half-open range `start..end`.
    fn delete_range(&mut self, start: usize, end: usize, actor: ActorId)
    -> Result<(), SequenceError>;

    /// Shared column-count counter.
    fn stride(&self) -> usize;

    fn set_stride(&mut self, cols: usize, actor: ActorId) -> Result<(), SequenceError>;

    /// Anchor the shared interval `handle` on the markers currently at
    /// `start` and `end` (both inclusive positions). An interval already
    /// under that label is replaced.
    fn create_tracked_interval(
        &mut self,
        handle: &IntervalHandle,
        start: usize,
        end: usize,
        actor: ActorId,
    ) -> Result<(), SequenceError>;

    /// Current positions of an interval's anchors.
    fn resolve_tracked_interval(
        &self,
        handle: &IntervalHandle,
    ) -> Result<(usize, usize), SequenceError>;

    fn release_tracked_interval(
        &mut self,
        handle: &IntervalHandle,
        actor: ActorId,
    ) -> Result<(), SequenceError>;

    /// Labels of every shared interval, sorted.
    fn tracked_intervals(&self) -> Vec<IntervalHandle>;

    /// Take every change notification not yet delivered, oldest first.
    fn drain_changes(&mut self) -> Vec<ChangeEvent>;
}
