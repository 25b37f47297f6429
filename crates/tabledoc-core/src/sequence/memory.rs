//! In-memory [`Sequence`] replica.
//!
//! Holds the marker list of one session. Local mutations are applied
//! immediately and queued as outbound [`TaggedOp`]s; ops from other sessions
//! arrive through [`MemorySequence::apply_remote`] in the order the transport
//! delivers them. Merging concurrent ops is not attempted: every replica is
//! expected to see the same total order.
//!
//! Tracked intervals are part of the replicated state: creating or releasing
//! one is an op like any other and reaches every session.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use super::{
    ActorId, ChangeEvent, IntervalHandle, Marker, Sequence, SequenceError, SequenceOp, TaggedOp,
    Version,
};

type SlotId = u64;

#[derive(Clone, Debug)]
struct Slot {
    id: SlotId,
    marker: Marker,
}

#[derive(Clone, Copy, Debug)]
struct Interval {
    start: SlotId,
    end: SlotId,
}

#[derive(Debug)]
pub struct MemorySequence {
    actor: ActorId,
    slots: Vec<Slot>,
    next_slot: SlotId,
    stride: usize,
    version: Version,
    intervals: BTreeMap<IntervalHandle, Interval>,
    changes: Vec<ChangeEvent>,
    outbound: Vec<TaggedOp>,
}

impl MemorySequence {
    pub fn new(actor: ActorId) -> Self {
        MemorySequence {
            actor,
            slots: Vec::new(),
            next_slot: 0,
            stride: 0,
            version: Version::default(),
            intervals: BTreeMap::new(),
            changes: Vec::new(),
            outbound: Vec::new(),
        }
    }

    /// Copy the current content into a new session for `actor`.
    ///
    /// Pending notifications and outbound ops stay behind.
    pub fn fork(&self, actor: ActorId) -> Self {
        MemorySequence {
            actor,
            slots: self.slots.clone(),
            next_slot: self.next_slot,
            stride: self.stride,
            version: self.version,
            intervals: self.intervals.clone(),
            changes: Vec::new(),
            outbound: Vec::new(),
        }
    }

    /// Apply an op received from another session.
    ///
    /// Ops carrying this session's own actor are echoes of local writes that
    /// were applied when issued; they are acknowledged and skipped.
    pub fn apply_remote(&mut self, op: TaggedOp) -> Result<(), SequenceError> {
        if op.actor == self.actor {
            trace!(actor = %op.actor, "skipping echo of local op");
            return Ok(());
        }
        self.validate(&op.op)?;
        self.apply(op.actor, op.op);
        Ok(())
    }

    /// Take the ops issued locally since the last call, oldest first.
    pub fn take_outbound(&mut self) -> Vec<TaggedOp> {
        std::mem::take(&mut self.outbound)
    }

    /// Marker values in sequence order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|slot| slot.marker.value.as_str())
    }

    fn check_version(&self, at: Version) -> Result<(), SequenceError> {
        if at < self.version {
            return Err(SequenceError::VersionUnavailable {
                requested: at,
                current: self.version,
            });
        }
        Ok(())
    }

    fn validate(&self, op: &SequenceOp) -> Result<(), SequenceError> {
        let length = self.slots.len();
        match op {
            SequenceOp::Insert { position, .. } if *position > length => {
                Err(SequenceError::PositionOutOfBounds {
                    position: *position,
                    length,
                })
            }
            SequenceOp::Delete { start, end } if start > end || *end > length => {
                Err(SequenceError::InvalidRange {
                    start: *start,
                    end: *end,
                    length,
                })
            }
            SequenceOp::TrackInterval { start, end, .. } if *start >= length || *end >= length => {
                Err(SequenceError::InvalidRange {
                    start: *start,
                    end: *end,
                    length,
                })
            }
            SequenceOp::ReleaseInterval { handle } if !self.intervals.contains_key(handle) => {
                Err(SequenceError::UnknownInterval(handle.clone()))
            }
            _ => Ok(()),
        }
    }

    fn apply(&mut self, actor: ActorId, op: SequenceOp) {
        match &op {
            SequenceOp::Insert { position, marker } => {
                let id = self.next_slot;
                self.next_slot += 1;
                self.slots.insert(
                    *position,
                    Slot {
                        id,
                        marker: marker.clone(),
                    },
                );
            }
            SequenceOp::Delete { start, end } => {
                let removed: Vec<SlotId> = self.slots.drain(*start..*end).map(|s| s.id).collect();
                self.rebind_anchors(&removed, *start);
            }
            SequenceOp::SetStride { cols } => {
                self.stride = *cols;
            }
            SequenceOp::TrackInterval { handle, start, end } => {
                let interval = Interval {
                    start: self.slots[*start].id,
                    end: self.slots[*end].id,
                };
                if self.intervals.insert(handle.clone(), interval).is_some() {
                    debug!(%handle, "tracked interval replaced");
                }
            }
            SequenceOp::ReleaseInterval { handle } => {
                self.intervals.remove(handle);
            }
        }

        self.version = self.version.next();
        trace!(version = self.version.0, %actor, ?op, "op applied");
        self.changes.push(ChangeEvent {
            version: self.version,
            actor,
            op,
        });
    }

    /// Move anchors off removed slots: onto the marker now preceding the gap,
    /// or the one following it when the gap starts the sequence.
    fn rebind_anchors(&mut self, removed: &[SlotId], gap: usize) {
        if removed.is_empty() || self.intervals.is_empty() {
            return;
        }
        let replacement = gap
            .checked_sub(1)
            .and_then(|i| self.slots.get(i))
            .or_else(|| self.slots.get(gap))
            .map(|slot| slot.id);
        let Some(replacement) = replacement else {
            debug!("sequence emptied; tracked intervals detached");
            return;
        };

        for interval in self.intervals.values_mut() {
            if removed.contains(&interval.start) {
                interval.start = replacement;
            }
            if removed.contains(&interval.end) {
                interval.end = replacement;
            }
        }
    }

    fn local(&mut self, op: SequenceOp, actor: ActorId) -> Result<(), SequenceError> {
        self.validate(&op)?;
        self.outbound.push(TaggedOp {
            actor,
            op: op.clone(),
        });
        self.apply(actor, op);
        Ok(())
    }

    fn slot_position(&self, id: SlotId) -> Option<usize> {
        self.slots.iter().position(|slot| slot.id == id)
    }
}

impl Sequence for MemorySequence {
    fn local_actor(&self) -> ActorId {
        self.actor
    }

    fn version(&self) -> Version {
        self.version
    }

    fn length(&self, at: Version) -> Result<usize, SequenceError> {
        self.check_version(at)?;
        Ok(self.slots.len())
    }

    fn get_at(&self, position: usize, at: Version) -> Result<Marker, SequenceError> {
        self.check_version(at)?;
        self.slots
            .get(position)
            .map(|slot| slot.marker.clone())
            .ok_or(SequenceError::PositionOutOfBounds {
                position,
                length: self.slots.len(),
            })
    }

    fn insert_at(
        &mut self,
        position: usize,
        marker: Marker,
        actor: ActorId,
    ) -> Result<(), SequenceError> {
        self.local(SequenceOp::Insert { position, marker }, actor)
    }

    fn delete_range(
        &mut self,
        start: usize,
        end: usize,
        actor: ActorId,
    ) -> Result<(), SequenceError> {
        self.local(SequenceOp::Delete { start, end }, actor)
    }

    fn stride(&self) -> usize {
        self.stride
    }

    fn set_stride(&mut self, cols: usize, actor: ActorId) -> Result<(), SequenceError> {
        self.local(SequenceOp::SetStride { cols }, actor)
    }

    fn create_tracked_interval(
        &mut self,
        handle: &IntervalHandle,
        start: usize,
        end: usize,
        actor: ActorId,
    ) -> Result<(), SequenceError> {
        let op = SequenceOp::TrackInterval {
            handle: handle.clone(),
            start,
            end,
        };
        self.local(op, actor)
    }

    fn resolve_tracked_interval(
        &self,
        handle: &IntervalHandle,
    ) -> Result<(usize, usize), SequenceError> {
        let interval = self
            .intervals
            .get(handle)
            .ok_or_else(|| SequenceError::UnknownInterval(handle.clone()))?;
        match (
            self.slot_position(interval.start),
            self.slot_position(interval.end),
        ) {
            (Some(start), Some(end)) => Ok((start, end)),
            _ => Err(SequenceError::DetachedInterval(handle.clone())),
        }
    }

    fn release_tracked_interval(
        &mut self,
        handle: &IntervalHandle,
        actor: ActorId,
    ) -> Result<(), SequenceError> {
        let op = SequenceOp::ReleaseInterval {
            handle: handle.clone(),
        };
        self.local(op, actor)
    }

    fn tracked_intervals(&self) -> Vec<IntervalHandle> {
        self.intervals.keys().cloned().collect()
    }

    fn drain_changes(&mut self) -> Vec<ChangeEvent> {
        std::mem::take(&mut self.changes)
    }
}
