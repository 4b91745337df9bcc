use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    entities::task,
    models::ids,
    types::{TaskPriority, TaskStatus},
};

/// Number of calendar days covered by the completion trend, inclusive of
/// the reference day.
pub const COMPLETION_TREND_DAYS: u64 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityBreakdown {
    pub low: u64,
    pub medium: u64,
    pub high: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCompletion {
    pub date: NaiveDate,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStats {
    pub total: u64,
    pub todo: u64,
    pub in_progress: u64,
    pub done: u64,
    pub completion_rate: u32,
    pub by_priority: PriorityBreakdown,
    pub recent_completed: Vec<DailyCompletion>,
}

impl TaskStats {
    /// Read-side aggregation for the dashboard. `today` is the reference
    /// date in the fixed reporting timezone (UTC); the trend covers the
    /// trailing seven calendar days ending on it, zero-filled.
    pub async fn compute<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        today: NaiveDate,
    ) -> Result<Self, DbErr> {
        let user_row_id = ids::user_id_by_uuid(db, user_id)
            .await?
            .ok_or(DbErr::RecordNotFound("User not found".to_string()))?;

        let total = count_tasks(db, user_row_id, None, None).await?;
        let todo = count_tasks(db, user_row_id, Some(TaskStatus::Todo), None).await?;
        let in_progress = count_tasks(db, user_row_id, Some(TaskStatus::InProgress), None).await?;
        let done = count_tasks(db, user_row_id, Some(TaskStatus::Done), None).await?;

        let completion_rate = if total > 0 {
            ((done as f64 / total as f64) * 100.0).round() as u32
        } else {
            0
        };

        let by_priority = PriorityBreakdown {
            low: count_tasks(db, user_row_id, None, Some(TaskPriority::Low)).await?,
            medium: count_tasks(db, user_row_id, None, Some(TaskPriority::Medium)).await?,
            high: count_tasks(db, user_row_id, None, Some(TaskPriority::High)).await?,
        };

        let recent_completed = completion_trend(db, user_row_id, today).await?;

        Ok(Self {
            total,
            todo,
            in_progress,
            done,
            completion_rate,
            by_priority,
            recent_completed,
        })
    }
}

async fn count_tasks<C: ConnectionTrait>(
    db: &C,
    user_row_id: i64,
    status: Option<TaskStatus>,
    priority: Option<TaskPriority>,
) -> Result<u64, DbErr> {
    let mut query = task::Entity::find().filter(task::Column::UserId.eq(user_row_id));
    if let Some(status) = status {
        query = query.filter(task::Column::Status.eq(status));
    }
    if let Some(priority) = priority {
        query = query.filter(task::Column::Priority.eq(priority));
    }
    query.count(db).await
}

async fn completion_trend<C: ConnectionTrait>(
    db: &C,
    user_row_id: i64,
    today: NaiveDate,
) -> Result<Vec<DailyCompletion>, DbErr> {
    let window_start = today
        .checked_sub_days(Days::new(COMPLETION_TREND_DAYS - 1))
        .ok_or(DbErr::Custom("Trend window underflows calendar".to_string()))?;
    let window_start_at: DateTime<Utc> =
        window_start.and_time(NaiveTime::MIN).and_utc();

    let completed_at: Vec<DateTime<Utc>> = task::Entity::find()
        .select_only()
        .column(task::Column::UpdatedAt)
        .filter(task::Column::UserId.eq(user_row_id))
        .filter(task::Column::Status.eq(TaskStatus::Done))
        .filter(task::Column::UpdatedAt.gte(window_start_at))
        .into_tuple()
        .all(db)
        .await?;

    let mut trend: Vec<DailyCompletion> = (0..COMPLETION_TREND_DAYS)
        .filter_map(|offset| window_start.checked_add_days(Days::new(offset)))
        .map(|date| DailyCompletion { date, count: 0 })
        .collect();

    for timestamp in completed_at {
        let date = timestamp.date_naive();
        if let Some(entry) = trend.iter_mut().find(|entry| entry.date == date) {
            entry.count += 1;
        }
    }

    Ok(trend)
}

#[cfg(test)]
mod tests {
    use sea_orm::{ActiveModelTrait, Database, Set};
    use sea_orm_migration::MigratorTrait;

    use super::*;
    use crate::models::{
        task::{CreateTask, Task},
        user::{CreateUser, User},
    };

    async fn setup_db() -> sea_orm::DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    async fn create_user(db: &sea_orm::DatabaseConnection) -> Uuid {
        let user_id = Uuid::new_v4();
        User::create(
            db,
            &CreateUser {
                name: "Stats".to_string(),
                email: "stats@example.com".to_string(),
                api_token: None,
            },
            user_id,
        )
        .await
        .unwrap();
        user_id
    }

    async fn create_task(
        db: &sea_orm::DatabaseConnection,
        user_id: Uuid,
        status: TaskStatus,
        priority: TaskPriority,
    ) -> Task {
        Task::create(
            db,
            user_id,
            &CreateTask {
                title: "t".to_string(),
                description: None,
                status: Some(status),
                priority: Some(priority),
                due_date: None,
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap()
    }

    async fn backdate(db: &sea_orm::DatabaseConnection, task: &Task, updated_at: DateTime<Utc>) {
        let record = crate::entities::task::Entity::find()
            .filter(crate::entities::task::Column::Uuid.eq(task.id))
            .one(db)
            .await
            .unwrap()
            .unwrap();
        let mut active: crate::entities::task::ActiveModel = record.into();
        active.updated_at = Set(updated_at);
        active.update(db).await.unwrap();
    }

    #[tokio::test]
    async fn aggregates_counts_and_completion_rate() {
        let db = setup_db().await;
        let user_id = create_user(&db).await;

        // 10 tasks: TODO x3, IN_PROGRESS x4, DONE x3; LOW x5, MEDIUM x3, HIGH x2.
        let mix = [
            (TaskStatus::Todo, TaskPriority::Low),
            (TaskStatus::Todo, TaskPriority::Low),
            (TaskStatus::Todo, TaskPriority::Low),
            (TaskStatus::InProgress, TaskPriority::Low),
            (TaskStatus::InProgress, TaskPriority::Low),
            (TaskStatus::InProgress, TaskPriority::Medium),
            (TaskStatus::InProgress, TaskPriority::Medium),
            (TaskStatus::Done, TaskPriority::Medium),
            (TaskStatus::Done, TaskPriority::High),
            (TaskStatus::Done, TaskPriority::High),
        ];
        for (status, priority) in mix {
            create_task(&db, user_id, status, priority).await;
        }

        let today = Utc::now().date_naive();
        let stats = TaskStats::compute(&db, user_id, today).await.unwrap();

        assert_eq!(stats.total, 10);
        assert_eq!(stats.todo, 3);
        assert_eq!(stats.in_progress, 4);
        assert_eq!(stats.done, 3);
        assert_eq!(stats.completion_rate, 30);
        assert_eq!(
            stats.by_priority,
            PriorityBreakdown {
                low: 5,
                medium: 3,
                high: 2
            }
        );
    }

    #[tokio::test]
    async fn empty_board_has_zero_completion_rate() {
        let db = setup_db().await;
        let user_id = create_user(&db).await;

        let stats = TaskStats::compute(&db, user_id, Utc::now().date_naive())
            .await
            .unwrap();
        assert_eq!(stats.total, 0);
        assert_eq!(stats.completion_rate, 0);
    }

    #[tokio::test]
    async fn completion_rate_rounds_to_nearest_percent() {
        let db = setup_db().await;
        let user_id = create_user(&db).await;

        // 1 done of 3 total: 33.33… rounds to 33.
        create_task(&db, user_id, TaskStatus::Done, TaskPriority::Medium).await;
        create_task(&db, user_id, TaskStatus::Todo, TaskPriority::Medium).await;
        create_task(&db, user_id, TaskStatus::Todo, TaskPriority::Medium).await;

        let stats = TaskStats::compute(&db, user_id, Utc::now().date_naive())
            .await
            .unwrap();
        assert_eq!(stats.completion_rate, 33);
    }

    #[tokio::test]
    async fn trend_is_seven_days_zero_filled_and_chronological() {
        let db = setup_db().await;
        let user_id = create_user(&db).await;
        let today = Utc::now().date_naive();

        let done = create_task(&db, user_id, TaskStatus::Done, TaskPriority::Low).await;
        let two_days_ago = today.checked_sub_days(Days::new(2)).unwrap();
        backdate(
            &db,
            &done,
            two_days_ago.and_time(NaiveTime::MIN).and_utc(),
        )
        .await;

        // Completed outside the window: must not appear.
        let stale = create_task(&db, user_id, TaskStatus::Done, TaskPriority::Low).await;
        let ten_days_ago = today.checked_sub_days(Days::new(10)).unwrap();
        backdate(
            &db,
            &stale,
            ten_days_ago.and_time(NaiveTime::MIN).and_utc(),
        )
        .await;

        let stats = TaskStats::compute(&db, user_id, today).await.unwrap();
        let trend = &stats.recent_completed;

        assert_eq!(trend.len(), 7);
        for pair in trend.windows(2) {
            assert!(pair[0].date < pair[1].date);
        }
        assert_eq!(trend.last().unwrap().date, today);
        for entry in trend {
            let expected = if entry.date == two_days_ago { 1 } else { 0 };
            assert_eq!(entry.count, expected, "date {}", entry.date);
        }
    }

    #[tokio::test]
    async fn trend_ignores_unfinished_tasks_in_window() {
        let db = setup_db().await;
        let user_id = create_user(&db).await;
        let today = Utc::now().date_naive();

        create_task(&db, user_id, TaskStatus::InProgress, TaskPriority::Low).await;

        let stats = TaskStats::compute(&db, user_id, today).await.unwrap();
        assert!(stats.recent_completed.iter().all(|entry| entry.count == 0));
    }
}
