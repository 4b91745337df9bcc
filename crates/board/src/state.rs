use db::models::task::{Task, UpdateTask};
use db::types::TaskStatus;
use uuid::Uuid;

use crate::{
    api::TaskApi,
    dnd::{DragEnd, reconcile},
    error::BoardError,
    form::TaskDraft,
};

/// The board's single source of truth on the client. All mutation goes
/// through the five operations below; board-mutation failures either leave
/// the collection untouched (create/update) or restore it with a full
/// authoritative reload (delete/move) instead of patching back individual
/// optimistic edits.
pub struct TaskBoard<A: TaskApi> {
    api: A,
    tasks: Vec<Task>,
    loading: bool,
    editing: Option<Uuid>,
    saving: bool,
}

impl<A: TaskApi> TaskBoard<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            tasks: Vec::new(),
            loading: true,
            editing: None,
            saving: false,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Column view: tasks of one status, in current collection order.
    pub fn column(&self, status: &TaskStatus) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| task.status == *status)
            .collect()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn editing(&self) -> Option<Uuid> {
        self.editing
    }

    pub fn begin_edit(&mut self, id: Uuid) {
        self.editing = Some(id);
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Replaces the whole collection with the server's view.
    pub async fn load(&mut self) -> Result<(), BoardError> {
        let result = self.api.list_tasks().await;
        self.loading = false;
        self.tasks = result?;
        Ok(())
    }

    /// Validates and submits the form; on success the server-returned task
    /// (with its assigned id and order) is appended. On failure the
    /// collection is untouched and the form stays retryable.
    pub async fn create(&mut self, draft: &TaskDraft) -> Result<Uuid, BoardError> {
        if self.saving {
            return Err(BoardError::SaveInFlight);
        }
        let payload = draft.to_create()?;

        self.saving = true;
        let result = self.api.create_task(&payload).await;
        self.saving = false;

        let task = result?;
        let id = task.id;
        self.tasks.push(task);
        Ok(id)
    }

    /// Submits an edit; on success the matching task is replaced in place.
    pub async fn update(&mut self, id: Uuid, draft: &TaskDraft) -> Result<(), BoardError> {
        if self.saving {
            return Err(BoardError::SaveInFlight);
        }
        let payload = draft.to_update()?;

        self.saving = true;
        let result = self.api.update_task(id, &payload).await;
        self.saving = false;

        let updated = result?;
        for task in &mut self.tasks {
            if task.id == updated.id {
                *task = updated;
                break;
            }
        }
        self.editing = None;
        Ok(())
    }

    /// Removes the task optimistically, then confirms with the server. Call
    /// only after the user confirmed the deletion interactively. On failure
    /// the collection is reloaded wholesale to match the server.
    pub async fn delete(&mut self, id: Uuid) -> Result<(), BoardError> {
        self.tasks.retain(|task| task.id != id);

        if let Err(err) = self.api.delete_task(id).await {
            tracing::warn!("Failed to delete task {}: {}; reloading", id, err);
            self.reload_after_failure().await;
            return Err(err);
        }
        Ok(())
    }

    /// Applies a drag completion. Invalid or same-position drops are no-ops
    /// (no request, no mutation). A valid drop rewrites the task's status
    /// locally before the network call resolves; only the status is
    /// persisted — within-column order is left to natural array order and no
    /// recomputed sort_order is written on drag (known gap, kept
    /// deliberately). On failure the collection is reloaded wholesale.
    pub async fn move_task(&mut self, drag: DragEnd) -> Result<(), BoardError> {
        let Some(task_move) = reconcile(&drag) else {
            return Ok(());
        };

        let Some(task) = self.tasks.iter_mut().find(|t| t.id == task_move.task_id) else {
            tracing::warn!("Dragged task {} is no longer on the board", task_move.task_id);
            return Ok(());
        };
        task.status = task_move.status.clone();

        let payload = UpdateTask::status_only(task_move.status);
        if let Err(err) = self.api.update_task(task_move.task_id, &payload).await {
            tracing::warn!(
                "Failed to move task {}: {}; reloading",
                task_move.task_id,
                err
            );
            self.reload_after_failure().await;
            return Err(err);
        }
        Ok(())
    }

    async fn reload_after_failure(&mut self) {
        if let Err(err) = self.load().await {
            tracing::warn!("Reload after failed mutation also failed: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    };

    use async_trait::async_trait;
    use chrono::Utc;
    use db::models::task::CreateTask;
    use db::types::TaskPriority;

    use super::*;
    use crate::dnd::DragLocation;

    fn task(title: &str, status: TaskStatus) -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: title.to_string(),
            description: None,
            status,
            priority: TaskPriority::Medium,
            due_date: None,
            sort_order: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn draft(title: &str) -> TaskDraft {
        TaskDraft {
            title: title.to_string(),
            ..TaskDraft::default()
        }
    }

    /// Scripted server double: holds the authoritative task list and can be
    /// told to fail individual operations.
    #[derive(Default)]
    struct MockApi {
        server: Mutex<Vec<Task>>,
        fail_update: AtomicBool,
        fail_delete: AtomicBool,
        calls: Mutex<Vec<&'static str>>,
        last_update: Mutex<Option<UpdateTask>>,
    }

    impl MockApi {
        fn with_tasks(tasks: Vec<Task>) -> Self {
            Self {
                server: Mutex::new(tasks),
                ..Self::default()
            }
        }

        fn failure() -> BoardError {
            BoardError::Api {
                status: 500,
                message: "scripted failure".to_string(),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl TaskApi for &MockApi {
        async fn list_tasks(&self) -> Result<Vec<Task>, BoardError> {
            self.calls.lock().unwrap().push("list");
            Ok(self.server.lock().unwrap().clone())
        }

        async fn create_task(&self, payload: &CreateTask) -> Result<Task, BoardError> {
            self.calls.lock().unwrap().push("create");
            let mut created = task(&payload.title, payload.status.clone().unwrap_or_default());
            created.description = payload.description.clone();
            created.priority = payload.priority.clone().unwrap_or_default();
            self.server.lock().unwrap().push(created.clone());
            Ok(created)
        }

        async fn update_task(&self, id: Uuid, payload: &UpdateTask) -> Result<Task, BoardError> {
            self.calls.lock().unwrap().push("update");
            *self.last_update.lock().unwrap() = Some(payload.clone());
            if self.fail_update.load(Ordering::SeqCst) {
                return Err(MockApi::failure());
            }
            let mut server = self.server.lock().unwrap();
            let existing = server
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or(BoardError::Api {
                    status: 404,
                    message: "Task not found".to_string(),
                })?;
            if let Some(title) = &payload.title {
                existing.title = title.clone();
            }
            if let Some(status) = &payload.status {
                existing.status = status.clone();
            }
            if let Some(priority) = &payload.priority {
                existing.priority = priority.clone();
            }
            Ok(existing.clone())
        }

        async fn delete_task(&self, id: Uuid) -> Result<(), BoardError> {
            self.calls.lock().unwrap().push("delete");
            if self.fail_delete.load(Ordering::SeqCst) {
                return Err(MockApi::failure());
            }
            self.server.lock().unwrap().retain(|t| t.id != id);
            Ok(())
        }
    }

    #[tokio::test]
    async fn load_replaces_collection_and_clears_loading() {
        let api = MockApi::with_tasks(vec![task("a", TaskStatus::Todo)]);
        let mut board = TaskBoard::new(&api);
        assert!(board.is_loading());

        board.load().await.unwrap();
        assert!(!board.is_loading());
        assert_eq!(board.tasks().len(), 1);
        assert_eq!(board.tasks()[0].title, "a");
    }

    #[tokio::test]
    async fn create_appends_exactly_one_server_assigned_task() {
        let api = MockApi::default();
        let mut board = TaskBoard::new(&api);
        board.load().await.unwrap();

        let id = board.create(&draft("new task")).await.unwrap();

        assert_eq!(board.tasks().len(), 1);
        assert_eq!(board.tasks()[0].id, id);
        assert!(api.server.lock().unwrap().iter().any(|t| t.id == id));
        assert!(!board.is_saving());
    }

    #[tokio::test]
    async fn blank_title_is_rejected_before_any_request() {
        let api = MockApi::default();
        let mut board = TaskBoard::new(&api);

        let err = board.create(&draft("   ")).await.unwrap_err();
        assert!(matches!(err, BoardError::Form(_)));
        assert_eq!(api.call_count(), 0);
        assert!(board.tasks().is_empty());
        assert!(!board.is_saving());
    }

    #[tokio::test]
    async fn create_while_saving_is_blocked() {
        let api = MockApi::default();
        let mut board = TaskBoard::new(&api);
        board.saving = true;

        let err = board.create(&draft("queued")).await.unwrap_err();
        assert!(matches!(err, BoardError::SaveInFlight));
        assert_eq!(api.call_count(), 0);
    }

    #[tokio::test]
    async fn update_replaces_exactly_one_task() {
        let existing = task("old", TaskStatus::Todo);
        let other = task("other", TaskStatus::Todo);
        let api = MockApi::with_tasks(vec![existing.clone(), other.clone()]);
        let mut board = TaskBoard::new(&api);
        board.load().await.unwrap();
        board.begin_edit(existing.id);

        board.update(existing.id, &draft("renamed")).await.unwrap();

        assert_eq!(board.tasks().len(), 2);
        let renamed: Vec<_> = board
            .tasks()
            .iter()
            .filter(|t| t.title == "renamed")
            .collect();
        assert_eq!(renamed.len(), 1);
        assert_eq!(renamed[0].id, existing.id);
        assert_eq!(board.editing(), None);
    }

    #[tokio::test]
    async fn failed_update_leaves_collection_unchanged() {
        let existing = task("stable", TaskStatus::Todo);
        let api = MockApi::with_tasks(vec![existing.clone()]);
        let mut board = TaskBoard::new(&api);
        board.load().await.unwrap();
        api.fail_update.store(true, Ordering::SeqCst);

        let err = board.update(existing.id, &draft("renamed")).await.unwrap_err();
        assert!(matches!(err, BoardError::Api { .. }));
        assert_eq!(board.tasks()[0].title, "stable");
        assert!(!board.is_saving());
    }

    #[tokio::test]
    async fn delete_removes_exactly_one_task() {
        let doomed = task("doomed", TaskStatus::Todo);
        let kept = task("kept", TaskStatus::Done);
        let api = MockApi::with_tasks(vec![doomed.clone(), kept.clone()]);
        let mut board = TaskBoard::new(&api);
        board.load().await.unwrap();

        board.delete(doomed.id).await.unwrap();

        assert_eq!(board.tasks().len(), 1);
        assert_eq!(board.tasks()[0].id, kept.id);
        assert!(!api.server.lock().unwrap().iter().any(|t| t.id == doomed.id));
    }

    #[tokio::test]
    async fn failed_delete_restores_server_state_via_reload() {
        let survivor = task("survivor", TaskStatus::Todo);
        let api = MockApi::with_tasks(vec![survivor.clone()]);
        let mut board = TaskBoard::new(&api);
        board.load().await.unwrap();
        api.fail_delete.store(true, Ordering::SeqCst);

        let err = board.delete(survivor.id).await.unwrap_err();
        assert!(matches!(err, BoardError::Api { .. }));

        // The optimistic removal must not linger.
        assert_eq!(board.tasks().len(), 1);
        assert_eq!(board.tasks()[0].id, survivor.id);
    }

    #[tokio::test]
    async fn same_position_drop_issues_no_request() {
        let pinned = task("pinned", TaskStatus::Todo);
        let api = MockApi::with_tasks(vec![pinned.clone()]);
        let mut board = TaskBoard::new(&api);
        board.load().await.unwrap();
        let calls_before = api.call_count();

        board
            .move_task(DragEnd {
                task_id: pinned.id,
                source: DragLocation {
                    column: TaskStatus::Todo,
                    index: 0,
                },
                destination: Some(DragLocation {
                    column: TaskStatus::Todo,
                    index: 0,
                }),
            })
            .await
            .unwrap();

        assert_eq!(api.call_count(), calls_before);
        assert_eq!(board.tasks()[0].status, TaskStatus::Todo);
    }

    #[tokio::test]
    async fn move_rewrites_status_and_sends_only_status() {
        let moved = task("moved", TaskStatus::Todo);
        let api = MockApi::with_tasks(vec![moved.clone()]);
        let mut board = TaskBoard::new(&api);
        board.load().await.unwrap();

        board
            .move_task(DragEnd {
                task_id: moved.id,
                source: DragLocation {
                    column: TaskStatus::Todo,
                    index: 0,
                },
                destination: Some(DragLocation {
                    column: TaskStatus::Done,
                    index: 0,
                }),
            })
            .await
            .unwrap();

        assert_eq!(board.tasks()[0].status, TaskStatus::Done);
        assert_eq!(board.column(&TaskStatus::Todo).len(), 0);
        assert_eq!(board.column(&TaskStatus::Done).len(), 1);

        let payload = api.last_update.lock().unwrap().clone().unwrap();
        assert_eq!(payload.status, Some(TaskStatus::Done));
        assert_eq!(payload.title, None);
        assert_eq!(payload.priority, None);
        assert_eq!(payload.due_date, None);
    }

    #[tokio::test]
    async fn failed_move_reverts_via_reload() {
        let stuck = task("stuck", TaskStatus::Todo);
        let api = MockApi::with_tasks(vec![stuck.clone()]);
        let mut board = TaskBoard::new(&api);
        board.load().await.unwrap();
        api.fail_update.store(true, Ordering::SeqCst);

        let err = board
            .move_task(DragEnd {
                task_id: stuck.id,
                source: DragLocation {
                    column: TaskStatus::Todo,
                    index: 0,
                },
                destination: Some(DragLocation {
                    column: TaskStatus::Done,
                    index: 0,
                }),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BoardError::Api { .. }));

        // Server never accepted the move, so the reload restores Todo.
        assert_eq!(board.tasks()[0].status, TaskStatus::Todo);
    }
}
