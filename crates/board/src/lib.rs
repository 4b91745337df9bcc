pub mod api;
pub mod dnd;
pub mod error;
pub mod form;
pub mod state;

pub use api::{HttpTaskApi, TaskApi};
pub use dnd::{DragEnd, DragLocation, DragState, TaskMove, reconcile};
pub use error::BoardError;
pub use form::TaskDraft;
pub use state::TaskBoard;
