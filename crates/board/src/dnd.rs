use db::types::TaskStatus;
use uuid::Uuid;

/// A position inside the board: a status column and an index within it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragLocation {
    pub column: TaskStatus,
    pub index: usize,
}

/// Raw drag completion as reported by whatever drag layer the UI uses.
/// `destination` is `None` when the drag was cancelled outside any column.
#[derive(Debug, Clone)]
pub struct DragEnd {
    pub task_id: Uuid,
    pub source: DragLocation,
    pub destination: Option<DragLocation>,
}

/// The mutation a valid drop resolves to. `index` is carried through for a
/// future within-column ordering scheme; only `status` is persisted today.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskMove {
    pub task_id: Uuid,
    pub status: TaskStatus,
    pub index: usize,
}

/// Maps a drag completion to the mutation it implies. Cancelled drops and
/// drops back onto the source position resolve to nothing.
pub fn reconcile(drag: &DragEnd) -> Option<TaskMove> {
    let destination = drag.destination.as_ref()?;
    if *destination == drag.source {
        return None;
    }
    Some(TaskMove {
        task_id: drag.task_id,
        status: destination.column.clone(),
        index: destination.index,
    })
}

/// Drag lifecycle: idle → dragging → (dropped-valid | dropped-invalid) → idle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        task_id: Uuid,
        source: DragLocation,
    },
}

impl DragState {
    pub fn begin(&mut self, task_id: Uuid, source: DragLocation) {
        *self = DragState::Dragging { task_id, source };
    }

    /// Finishes the drag, returning the implied mutation for a valid drop.
    /// Always returns the state machine to idle.
    pub fn finish(&mut self, destination: Option<DragLocation>) -> Option<TaskMove> {
        let state = std::mem::take(self);
        let DragState::Dragging { task_id, source } = state else {
            return None;
        };
        reconcile(&DragEnd {
            task_id,
            source,
            destination,
        })
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self, DragState::Dragging { .. })
    }
}
