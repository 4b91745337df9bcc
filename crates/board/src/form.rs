use chrono::NaiveDate;
use db::models::task::{CreateTask, UpdateTask};
use db::types::{TaskPriority, TaskStatus};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("Title is required")]
    EmptyTitle,
    #[error("Invalid due date: {0}")]
    InvalidDueDate(String),
}

/// Raw form input as collected from the user. Validation happens on
/// submit, before any request is issued.
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: String,
}

impl TaskDraft {
    fn title_trimmed(&self) -> Result<String, FormError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(FormError::EmptyTitle);
        }
        Ok(title.to_string())
    }

    fn description_or_none(&self) -> Option<String> {
        let description = self.description.trim();
        if description.is_empty() {
            None
        } else {
            Some(self.description.clone())
        }
    }

    fn due_date_parsed(&self) -> Result<Option<NaiveDate>, FormError> {
        let raw = self.due_date.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        // Past dates are allowed; only the format is checked.
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| FormError::InvalidDueDate(raw.to_string()))
    }

    pub fn to_create(&self) -> Result<CreateTask, FormError> {
        Ok(CreateTask {
            title: self.title_trimmed()?,
            description: self.description_or_none(),
            status: Some(self.status.clone()),
            priority: Some(self.priority.clone()),
            due_date: self.due_date_parsed()?,
        })
    }

    pub fn to_update(&self) -> Result<UpdateTask, FormError> {
        Ok(UpdateTask {
            title: Some(self.title_trimmed()?),
            description: Some(self.description.clone()),
            status: Some(self.status.clone()),
            priority: Some(self.priority.clone()),
            due_date: self.due_date_parsed()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_title_is_rejected() {
        let draft = TaskDraft::default();
        assert_eq!(draft.to_create().unwrap_err(), FormError::EmptyTitle);

        let draft = TaskDraft {
            title: "   ".to_string(),
            ..TaskDraft::default()
        };
        assert_eq!(draft.to_update().unwrap_err(), FormError::EmptyTitle);
    }

    #[test]
    fn title_is_trimmed_on_submit() {
        let draft = TaskDraft {
            title: " Buy milk ".to_string(),
            ..TaskDraft::default()
        };
        assert_eq!(draft.to_create().unwrap().title, "Buy milk");
    }

    #[test]
    fn defaults_are_todo_and_medium() {
        let draft = TaskDraft {
            title: "t".to_string(),
            ..TaskDraft::default()
        };
        let payload = draft.to_create().unwrap();
        assert_eq!(payload.status, Some(TaskStatus::Todo));
        assert_eq!(payload.priority, Some(TaskPriority::Medium));
        assert_eq!(payload.description, None);
        assert_eq!(payload.due_date, None);
    }

    #[test]
    fn due_date_accepts_iso_and_past_dates() {
        let draft = TaskDraft {
            title: "t".to_string(),
            due_date: "2020-02-29".to_string(),
            ..TaskDraft::default()
        };
        assert_eq!(
            draft.to_create().unwrap().due_date,
            NaiveDate::from_ymd_opt(2020, 2, 29)
        );
    }

    #[test]
    fn malformed_due_date_is_rejected() {
        let draft = TaskDraft {
            title: "t".to_string(),
            due_date: "tomorrow".to_string(),
            ..TaskDraft::default()
        };
        assert_eq!(
            draft.to_create().unwrap_err(),
            FormError::InvalidDueDate("tomorrow".to_string())
        );
    }
}
