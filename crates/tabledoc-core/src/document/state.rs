use tabledoc_engine::Workbook;
use tracing::{debug, info};

use super::bridge::EvalBridge;
use crate::config::TableConfig;
use crate::error::{Result, TableError};
use crate::grid::GridIndex;
use crate::sequence::{ActorId, Marker, Sequence};

/// Lifecycle of a document.
///
/// Writes coming out of the formula engine reach the sequence only in
/// `Live`; everything before that is the document building itself from, or
/// into, the sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Populating a brand-new sequence with empty cells.
    Initializing,
    /// Bootstrapping the formula engine from sequence content.
    Syncing,
    Live,
}

/// UI-agnostic grid document over a collaborative sequence.
pub struct Document<Q: Sequence> {
    pub(crate) sequence: Q,
    /// Identity stamped on every local write.
    pub(crate) actor: ActorId,
    pub(crate) mode: Mode,
    pub(crate) workbook: Workbook,
}

impl<Q: Sequence> Document<Q> {
    /// Create a new document in an empty sequence: `config.rows × config.cols`
    /// empty cells.
    pub fn create(sequence: Q, config: &TableConfig) -> Result<Self> {
        config.validate()?;
        let length = sequence.length(sequence.version())?;
        if length != 0 {
            return Err(TableError::AlreadyPopulated { length });
        }

        let mut doc = Document::new(sequence, Mode::Initializing, config);
        doc.populate(config.cols, config.cell_count()?)?;
        // Population is not an edit anyone needs to react to.
        let discarded = doc.reconcile()?;
        debug!(actor = %doc.actor, ?discarded, "grid populated");

        doc.bootstrap()?;
        info!(actor = %doc.actor, rows = config.rows, cols = config.cols, "document created");
        Ok(doc)
    }

    /// Open a document over a sequence that already holds a grid.
    pub fn open(mut sequence: Q, config: &TableConfig) -> Result<Self> {
        config.validate()?;
        let mut doc = Document::new(sequence, Mode::Syncing, config);
        let backlog = doc.reconcile()?;
        doc.bootstrap()?;
        let shape = doc.shape()?;
        info!(
            actor = %doc.actor,
            backlog = backlog.local + backlog.remote,
            rows = shape.num_rows(),
            cols = shape.num_cols(),
            "document opened"
        );
        Ok(doc)
    }

    fn new(sequence: Q, mode: Mode, config: &TableConfig) -> Self {
        Document {
            actor: sequence.local_actor(),
            sequence,
            mode,
            workbook: Workbook::with_max_operations(0, 0, config.max_operations),
        }
    }

    /// Lay `cells` empty markers into the sequence with stride `cols`.
    fn populate(&mut self, cols: usize, cells: usize) -> Result<()> {
        debug_assert_eq!(self.mode, Mode::Initializing);
        self.sequence.set_stride(cols, self.actor)?;
        for _ in 0..cells {
            self.sequence.insert_at(0, Marker::default(), self.actor)?;
        }
        Ok(())
    }

    /// Load every cell into the formula engine. The engine writes each cell
    /// back while it loads; the bridge drops those writes until `Live`.
    fn bootstrap(&mut self) -> Result<()> {
        self.mode = Mode::Syncing;
        let shape = self.shape()?;
        self.workbook.resize(shape.num_rows(), shape.num_cols());

        let mut bridge = EvalBridge::new(&mut self.sequence, self.actor, self.mode);
        self.workbook.init(&mut bridge)?;

        self.mode = Mode::Live;
        Ok(())
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn actor(&self) -> ActorId {
        self.actor
    }

    /// The backing sequence, e.g. to exchange ops with other sessions.
    pub fn sequence(&self) -> &Q {
        &self.sequence
    }

    /// Mutable access for transports delivering remote ops. Call
    /// [`Document::reconcile`] afterwards.
    pub fn sequence_mut(&mut self) -> &mut Q {
        &mut self.sequence
    }

    pub fn into_sequence(self) -> Q {
        self.sequence
    }

    /// Current grid shape, recomputed from the sequence.
    pub fn shape(&self) -> Result<GridIndex> {
        GridIndex::from_sequence(&self.sequence)
    }

    pub fn num_rows(&self) -> Result<usize> {
        Ok(self.shape()?.num_rows())
    }

    pub fn num_cols(&self) -> Result<usize> {
        Ok(self.shape()?.num_cols())
    }
}
