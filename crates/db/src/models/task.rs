use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use crate::types::{TaskPriority, TaskStatus};

use crate::{entities::task, models::ids};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDate>,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<NaiveDate>,
}

impl CreateTask {
    pub fn from_title(title: String) -> Self {
        Self {
            title,
            description: None,
            status: None,
            priority: None,
            due_date: None,
        }
    }
}

/// Partial update payload. Omitted fields keep their current value; an empty
/// `description` clears it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<NaiveDate>,
}

impl UpdateTask {
    pub fn status_only(status: TaskStatus) -> Self {
        Self {
            title: None,
            description: None,
            status: Some(status),
            priority: None,
            due_date: None,
        }
    }
}

impl Task {
    async fn from_model<C: ConnectionTrait>(db: &C, model: task::Model) -> Result<Self, DbErr> {
        let user_uuid = ids::user_uuid_by_id(db, model.user_id)
            .await?
            .ok_or(DbErr::RecordNotFound("User not found".to_string()))?;

        Ok(Self {
            id: model.uuid,
            user_id: user_uuid,
            title: model.title,
            description: model.description,
            status: model.status,
            priority: model.priority,
            due_date: model.due_date,
            sort_order: model.sort_order,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }

    /// All tasks of a user, stable within each status column by
    /// (sort_order, insertion order).
    pub async fn find_for_user<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
    ) -> Result<Vec<Self>, DbErr> {
        let user_row_id = ids::user_id_by_uuid(db, user_id)
            .await?
            .ok_or(DbErr::RecordNotFound("User not found".to_string()))?;

        let models = task::Entity::find()
            .filter(task::Column::UserId.eq(user_row_id))
            .order_by_asc(task::Column::SortOrder)
            .order_by_asc(task::Column::Id)
            .all(db)
            .await?;

        let mut tasks = Vec::with_capacity(models.len());
        for model in models {
            tasks.push(Self::from_model(db, model).await?);
        }
        Ok(tasks)
    }

    /// Ownership-checked lookup. A task owned by another user is
    /// indistinguishable from a missing one.
    pub async fn find_for_user_by_id<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, DbErr> {
        let user_row_id = match ids::user_id_by_uuid(db, user_id).await? {
            Some(id) => id,
            None => return Ok(None),
        };

        let record = task::Entity::find()
            .filter(task::Column::Uuid.eq(id))
            .filter(task::Column::UserId.eq(user_row_id))
            .one(db)
            .await?;

        match record {
            Some(model) => Ok(Some(Self::from_model(db, model).await?)),
            None => Ok(None),
        }
    }

    async fn next_sort_order<C: ConnectionTrait>(
        db: &C,
        user_row_id: i64,
        status: &TaskStatus,
    ) -> Result<i64, DbErr> {
        let max: Option<Option<i64>> = task::Entity::find()
            .select_only()
            .column_as(task::Column::SortOrder.max(), "max_sort_order")
            .filter(task::Column::UserId.eq(user_row_id))
            .filter(task::Column::Status.eq(status.clone()))
            .into_tuple()
            .one(db)
            .await?;

        Ok(max.flatten().map_or(0, |max| max + 1))
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        data: &CreateTask,
        task_id: Uuid,
    ) -> Result<Self, DbErr> {
        let user_row_id = ids::user_id_by_uuid(db, user_id)
            .await?
            .ok_or(DbErr::RecordNotFound("User not found".to_string()))?;

        let status = data.status.clone().unwrap_or_default();
        let sort_order = Self::next_sort_order(db, user_row_id, &status).await?;

        let now = Utc::now();
        let active = task::ActiveModel {
            uuid: Set(task_id),
            user_id: Set(user_row_id),
            title: Set(data.title.clone()),
            description: Set(data.description.clone()),
            status: Set(status),
            priority: Set(data.priority.clone().unwrap_or_default()),
            due_date: Set(data.due_date),
            sort_order: Set(sort_order),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active.insert(db).await?;
        Self::from_model(db, model).await
    }

    pub async fn update<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        id: Uuid,
        title: String,
        description: Option<String>,
        status: TaskStatus,
        priority: TaskPriority,
        due_date: Option<NaiveDate>,
    ) -> Result<Self, DbErr> {
        let user_row_id = ids::user_id_by_uuid(db, user_id)
            .await?
            .ok_or(DbErr::RecordNotFound("User not found".to_string()))?;

        let record = task::Entity::find()
            .filter(task::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound("Task not found".to_string()))?;

        if record.user_id != user_row_id {
            return Err(DbErr::RecordNotFound("Task not found".to_string()));
        }

        let mut active: task::ActiveModel = record.into();
        active.title = Set(title);
        active.description = Set(description);
        active.status = Set(status);
        active.priority = Set(priority);
        active.due_date = Set(due_date);
        active.updated_at = Set(Utc::now());

        let updated = active.update(db).await?;
        Self::from_model(db, updated).await
    }

    pub async fn delete<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<u64, DbErr> {
        let user_row_id = match ids::user_id_by_uuid(db, user_id).await? {
            Some(id) => id,
            None => return Ok(0),
        };

        let result = task::Entity::delete_many()
            .filter(task::Column::Uuid.eq(id))
            .filter(task::Column::UserId.eq(user_row_id))
            .exec(db)
            .await?;

        Ok(result.rows_affected)
    }
}
