//! Reacting to change notifications from the sequence.

use tabledoc_engine::{CellOrigin, CellStorage};
use tracing::{debug, warn};

use super::bridge::EvalBridge;
use super::{Document, Mode};
use crate::error::Result;
use crate::sequence::Sequence;

/// What a call to [`Document::reconcile`] saw and did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Notifications for this session's own writes.
    pub local: usize,
    /// Notifications for writes by other actors.
    pub remote: usize,
    /// Cells re-pulled into the formula engine. Zero unless the document is
    /// live and a remote op changed markers or the stride.
    pub refreshed: usize,
}

impl<Q: Sequence> Document<Q> {
    /// Drain pending change notifications.
    ///
    /// Notifications stamped with the local actor are echoes of writes the
    /// formula engine already knows about. If any notification came from
    /// another actor and changed content, every cell of the current grid is
    /// re-pulled into the engine as an external update, once for the whole
    /// drained batch. Remote range edits need no refresh.
    ///
    /// Before the document is live the notifications describe the grid it is
    /// being built from, and are dropped.
    pub fn reconcile(&mut self) -> Result<Reconciliation> {
        let changes = self.sequence.drain_changes();
        let local = changes
            .iter()
            .filter(|change| change.actor == self.actor)
            .count();
        let mut report = Reconciliation {
            local,
            remote: changes.len() - local,
            refreshed: 0,
        };

        if self.mode != Mode::Live {
            debug!(mode = ?self.mode, dropped = changes.len(), "changes dropped before live");
            return Ok(report);
        }

        let content_changed = changes
            .iter()
            .any(|change| change.actor != self.actor && change.op.touches_content());
        if content_changed {
            if let Some(last) = changes.last() {
                debug!(
                    remote = report.remote,
                    version = last.version.0,
                    "remote changes received"
                );
            }
            report.refreshed = self.refresh_all().inspect_err(|err| {
                warn!(%err, "grid is not in a consistent state; waiting for resync");
            })?;
        }
        Ok(report)
    }

    /// Resize the formula engine to the current grid and push every cell's
    /// text into it as an external update.
    pub(crate) fn refresh_all(&mut self) -> Result<usize> {
        let shape = self.shape()?;
        self.workbook.resize(shape.num_rows(), shape.num_cols());

        let mut bridge = EvalBridge::new(&mut self.sequence, self.actor, self.mode);
        for row in 0..shape.num_rows() {
            for col in 0..shape.num_cols() {
                let text = bridge.load_cell_text(row, col)?;
                self.workbook
                    .set_cell_text(row, col, &text, CellOrigin::External, &mut bridge)?;
            }
        }
        debug!(cells = shape.len(), "grid refreshed");
        Ok(shape.len())
    }
}
