/// Task model, hierarchy operations, filtered listing, and the routine
/// reset sweep
///
/// Tasks are the core entity of FamSync. Every task belongs to exactly one
/// family; a task may have a parent (making it a subtask) and carries an
/// optional assignee, an optional due date, a status, a priority, a routine
/// flag, and a set of family-scoped tags.
///
/// # Hierarchy
///
/// The parent/child relationship is a plain adjacency: `parent_id` points
/// at another row of the same table and cascades on delete. The read path
/// materializes exactly one level, a task and its direct children. Deeper
/// chains can exist in the data model but are never traversed recursively.
///
/// A subtask always inherits its parent's family: the write path forces
/// `family_id` (and `parent_id`) from the parent row no matter what the
/// request carried, so a subtask can never land in a different family than
/// its parent.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('pending', 'in_progress', 'completed');
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     family_id UUID NOT NULL REFERENCES families(id) ON DELETE CASCADE,
///     assignee_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     created_by_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     due_date DATE,
///     status task_status NOT NULL DEFAULT 'pending',
///     priority task_priority NOT NULL DEFAULT 'medium',
///     is_routine BOOLEAN NOT NULL DEFAULT FALSE,
///     parent_id UUID REFERENCES tasks(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

use crate::models::tag::Tag;
use crate::models::user::{User, UserSummary};

/// Task progress state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started
    Pending,

    /// Being worked on
    InProgress,

    /// Done (routine tasks return to Pending on the next sweep)
    Completed,
}

impl TaskStatus {
    /// Converts status to its wire/database string
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    /// Converts priority to its wire/database string
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

/// Task row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Title
    pub title: String,

    /// Optional free-text description
    pub description: Option<String>,

    /// Owning family
    pub family_id: Uuid,

    /// Assigned member (nulled if the user is deleted)
    pub assignee_id: Option<Uuid>,

    /// Creator (nulled if the user is deleted)
    pub created_by_id: Option<Uuid>,

    /// Optional due date
    pub due_date: Option<NaiveDate>,

    /// Progress state
    pub status: TaskStatus,

    /// Priority
    pub priority: TaskPriority,

    /// Whether the task recurs (reset to pending by the routine sweep)
    pub is_routine: bool,

    /// Parent task, when this is a subtask
    pub parent_id: Option<Uuid>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

fn default_status() -> TaskStatus {
    TaskStatus::Pending
}

fn default_priority() -> TaskPriority {
    TaskPriority::Medium
}

/// Input for creating a top-level task
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTask {
    /// Title
    pub title: String,

    /// Optional description
    #[serde(default)]
    pub description: Option<String>,

    /// Owning family
    pub family_id: Uuid,

    /// Optional assignee
    #[serde(default)]
    pub assignee_id: Option<Uuid>,

    /// Optional due date (ISO-8601 date; malformed input is rejected at
    /// deserialization, never silently dropped)
    #[serde(default)]
    pub due_date: Option<NaiveDate>,

    /// Initial status (defaults to pending)
    #[serde(default = "default_status")]
    pub status: TaskStatus,

    /// Priority (defaults to medium)
    #[serde(default = "default_priority")]
    pub priority: TaskPriority,

    /// Routine flag
    #[serde(default)]
    pub is_routine: bool,

    /// Tag ids to attach; ids that don't exist in the task's family are
    /// dropped without error
    #[serde(default)]
    pub tag_ids: Option<Vec<Uuid>>,
}

/// Input for creating a subtask
///
/// Carries no `family_id` or `parent_id`, both are forced from the parent
/// task on the write path.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSubtask {
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub assignee_id: Option<Uuid>,

    #[serde(default)]
    pub due_date: Option<NaiveDate>,

    #[serde(default = "default_status")]
    pub status: TaskStatus,

    #[serde(default = "default_priority")]
    pub priority: TaskPriority,

    #[serde(default)]
    pub is_routine: bool,

    #[serde(default)]
    pub tag_ids: Option<Vec<Uuid>>,
}

/// Deserializes a field that distinguishes "absent" from "explicitly null"
///
/// Absent fields stay `None`; a present field (including `null`) becomes
/// `Some(inner)`. Partial updates use this to tell "leave untouched" apart
/// from "clear the value".
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Partial update for a task
///
/// Absent fields are untouched. Nullable fields (`description`, `due_date`,
/// `assignee_id`, `parent_id`) accept an explicit `null` to clear. When
/// `tag_ids` is present, even as an empty list, the full tag association
/// set is replaced, re-validated against the task's family.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTask {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<NaiveDate>>,

    #[serde(default)]
    pub status: Option<TaskStatus>,

    #[serde(default)]
    pub priority: Option<TaskPriority>,

    #[serde(default, deserialize_with = "double_option")]
    pub assignee_id: Option<Option<Uuid>>,

    #[serde(default)]
    pub is_routine: Option<bool>,

    #[serde(default, deserialize_with = "double_option")]
    pub parent_id: Option<Option<Uuid>>,

    #[serde(default)]
    pub tag_ids: Option<Vec<Uuid>>,
}

/// Filter predicate for task listings
///
/// All filters are conjunctive (AND). The tag filter matches tasks carrying
/// at least one of the given tag ids (OR within the set). The same
/// predicate drives both the page query and the count query, so reported
/// totals never drift from what an unpaginated fetch would return.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Only tasks assigned to this user
    pub assignee_id: Option<Uuid>,

    /// Only tasks in this status
    pub status: Option<TaskStatus>,

    /// Only routine (or only non-routine) tasks
    pub is_routine: Option<bool>,

    /// Only tasks due on or before this date
    pub due_before: Option<NaiveDate>,

    /// Only tasks due on or after this date
    pub due_after: Option<NaiveDate>,

    /// Only tasks carrying at least one of these tags
    pub tag_ids: Option<Vec<Uuid>>,
}

const TASK_COLUMNS: &str = "id, title, description, family_id, assignee_id, created_by_id, \
                            due_date, status, priority, is_routine, parent_id, \
                            created_at, updated_at";

/// Appends the filter predicate to a query ending in `WHERE family_id = $1`
fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &TaskFilter) {
    if let Some(assignee_id) = filter.assignee_id {
        qb.push(" AND assignee_id = ").push_bind(assignee_id);
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(is_routine) = filter.is_routine {
        qb.push(" AND is_routine = ").push_bind(is_routine);
    }
    if let Some(due_before) = filter.due_before {
        qb.push(" AND due_date <= ").push_bind(due_before);
    }
    if let Some(due_after) = filter.due_after {
        qb.push(" AND due_date >= ").push_bind(due_after);
    }
    if let Some(tag_ids) = &filter.tag_ids {
        if !tag_ids.is_empty() {
            // Has-any-of semantics; EXISTS keeps each task a single row even
            // when several of the requested tags match
            qb.push(
                " AND EXISTS (SELECT 1 FROM task_tags tt \
                 WHERE tt.task_id = tasks.id AND tt.tag_id = ANY(",
            )
            .push_bind(tag_ids.clone())
            .push("))");
        }
    }
}

impl Task {
    /// Creates a task and attaches its tags in one transaction
    ///
    /// Supplied tag ids are narrowed to tags that exist and belong to the
    /// task's family; non-matching ids are silently dropped rather than
    /// rejected.
    pub async fn create_with_tags(
        pool: &PgPool,
        data: CreateTask,
        created_by_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (title, description, family_id, assignee_id, created_by_id,
                               due_date, status, priority, is_routine, parent_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NULL)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.family_id)
        .bind(data.assignee_id)
        .bind(created_by_id)
        .bind(data.due_date)
        .bind(data.status)
        .bind(data.priority)
        .bind(data.is_routine)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(tag_ids) = &data.tag_ids {
            let valid = Tag::filter_ids_for_family(&mut *tx, tag_ids, data.family_id).await?;
            attach_tags(&mut tx, task.id, &valid).await?;
        }

        tx.commit().await?;
        Ok(task)
    }

    /// Creates subtasks under a parent, all in one transaction
    ///
    /// Every subtask inherits `family_id` and `parent_id` from the parent
    /// row regardless of the request payload. A failure on any item rolls
    /// back the whole batch, the caller never observes a partial batch.
    pub async fn create_subtasks(
        pool: &PgPool,
        parent: &Task,
        inputs: Vec<CreateSubtask>,
        created_by_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut created = Vec::with_capacity(inputs.len());

        for input in inputs {
            let task = sqlx::query_as::<_, Task>(&format!(
                r#"
                INSERT INTO tasks (title, description, family_id, assignee_id, created_by_id,
                                   due_date, status, priority, is_routine, parent_id)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                RETURNING {TASK_COLUMNS}
                "#
            ))
            .bind(&input.title)
            .bind(&input.description)
            .bind(parent.family_id)
            .bind(input.assignee_id)
            .bind(created_by_id)
            .bind(input.due_date)
            .bind(input.status)
            .bind(input.priority)
            .bind(input.is_routine)
            .bind(parent.id)
            .fetch_one(&mut *tx)
            .await?;

            if let Some(tag_ids) = &input.tag_ids {
                let valid =
                    Tag::filter_ids_for_family(&mut *tx, tag_ids, parent.family_id).await?;
                attach_tags(&mut tx, task.id, &valid).await?;
            }

            created.push(task);
        }

        tx.commit().await?;
        Ok(created)
    }

    /// Applies a partial update, replacing the tag set when requested
    ///
    /// Base-field update and tag replacement share one transaction; a
    /// failure at any step leaves the task unchanged.
    pub async fn update_with_tags(
        pool: &PgPool,
        task: &Task,
        patch: UpdateTask,
    ) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let mut qb = QueryBuilder::<Postgres>::new("UPDATE tasks SET updated_at = NOW()");

        if let Some(title) = patch.title {
            qb.push(", title = ").push_bind(title);
        }
        if let Some(description) = patch.description {
            qb.push(", description = ").push_bind(description);
        }
        if let Some(due_date) = patch.due_date {
            qb.push(", due_date = ").push_bind(due_date);
        }
        if let Some(status) = patch.status {
            qb.push(", status = ").push_bind(status);
        }
        if let Some(priority) = patch.priority {
            qb.push(", priority = ").push_bind(priority);
        }
        if let Some(assignee_id) = patch.assignee_id {
            qb.push(", assignee_id = ").push_bind(assignee_id);
        }
        if let Some(is_routine) = patch.is_routine {
            qb.push(", is_routine = ").push_bind(is_routine);
        }
        if let Some(parent_id) = patch.parent_id {
            qb.push(", parent_id = ").push_bind(parent_id);
        }

        qb.push(" WHERE id = ").push_bind(task.id);
        qb.push(&format!(" RETURNING {TASK_COLUMNS}"));

        let updated = qb.build_query_as::<Task>().fetch_one(&mut *tx).await?;

        if let Some(tag_ids) = &patch.tag_ids {
            sqlx::query("DELETE FROM task_tags WHERE task_id = $1")
                .bind(task.id)
                .execute(&mut *tx)
                .await?;

            let valid = Tag::filter_ids_for_family(&mut *tx, tag_ids, task.family_id).await?;
            attach_tags(&mut tx, task.id, &valid).await?;
        }

        tx.commit().await?;
        Ok(updated)
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Deletes a task (subtasks and tag associations cascade away)
    ///
    /// # Returns
    ///
    /// True if the task existed and was deleted
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists a family's tasks with filters and pagination
    pub async fn list_by_family(
        pool: &PgPool,
        family_id: Uuid,
        filter: &TaskFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        Self::list_inner(pool, family_id, filter, false, limit, offset).await
    }

    /// Counts a family's tasks under the same filter predicate as
    /// [`Task::list_by_family`], ignoring pagination
    pub async fn count_by_family(
        pool: &PgPool,
        family_id: Uuid,
        filter: &TaskFilter,
    ) -> Result<i64, sqlx::Error> {
        Self::count_inner(pool, family_id, filter, false).await
    }

    /// Lists a family's root tasks (no parent) with filters and pagination
    pub async fn list_roots_by_family(
        pool: &PgPool,
        family_id: Uuid,
        filter: &TaskFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        Self::list_inner(pool, family_id, filter, true, limit, offset).await
    }

    /// Counts a family's root tasks under the same filter predicate
    pub async fn count_roots_by_family(
        pool: &PgPool,
        family_id: Uuid,
        filter: &TaskFilter,
    ) -> Result<i64, sqlx::Error> {
        Self::count_inner(pool, family_id, filter, true).await
    }

    async fn list_inner(
        pool: &PgPool,
        family_id: Uuid,
        filter: &TaskFilter,
        roots_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE family_id = "
        ));
        qb.push_bind(family_id);
        if roots_only {
            qb.push(" AND parent_id IS NULL");
        }
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY created_at DESC");
        qb.push(" LIMIT ").push_bind(limit);
        qb.push(" OFFSET ").push_bind(offset);

        qb.build_query_as::<Task>().fetch_all(pool).await
    }

    async fn count_inner(
        pool: &PgPool,
        family_id: Uuid,
        filter: &TaskFilter,
        roots_only: bool,
    ) -> Result<i64, sqlx::Error> {
        let mut qb =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM tasks WHERE family_id = ");
        qb.push_bind(family_id);
        if roots_only {
            qb.push(" AND parent_id IS NULL");
        }
        push_filters(&mut qb, filter);

        qb.build_query_scalar::<i64>().fetch_one(pool).await
    }

    /// Resets every completed routine task back to pending
    ///
    /// One bulk update; returns the number of rows flipped. Runs best-effort
    /// at startup and on demand via the admin endpoint, periodic execution
    /// is an external scheduler's job.
    pub async fn reset_completed_routines(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET status = 'pending', updated_at = NOW()
            WHERE is_routine = TRUE AND status = 'completed'
            "#,
        )
        .execute(pool)
        .await?;

        let count = result.rows_affected();
        info!(count, "Reset completed routine tasks to pending");
        Ok(count)
    }
}

/// Inserts task_tags rows for the given (already validated) tag ids
async fn attach_tags(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    task_id: Uuid,
    tag_ids: &[Uuid],
) -> Result<(), sqlx::Error> {
    if tag_ids.is_empty() {
        return Ok(());
    }

    sqlx::query("INSERT INTO task_tags (task_id, tag_id) SELECT $1, UNNEST($2::uuid[])")
        .bind(task_id)
        .bind(tag_ids)
        .execute(&mut **tx)
        .await?;

    Ok(())
}

/// A subtask in a read response: the task row plus eagerly-fetched
/// assignee, creator, and tags, but no further nesting
#[derive(Debug, Clone, Serialize)]
pub struct SubtaskDetail {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub family_id: Uuid,
    pub assignee_id: Option<Uuid>,
    pub created_by_id: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub is_routine: bool,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub assignee: Option<UserSummary>,
    pub created_by: Option<UserSummary>,
    pub tags: Vec<Tag>,
}

/// A task in a read response: the task row plus eagerly-fetched assignee,
/// creator, tags, and direct subtasks
///
/// This transfer structure is the read contract of the task API. It is
/// assembled from a fixed set of batched queries (tasks, children, tags,
/// users), the shape of the response is decided here, not by whatever a
/// row loader happened to pull in.
#[derive(Debug, Clone, Serialize)]
pub struct TaskDetail {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub family_id: Uuid,
    pub assignee_id: Option<Uuid>,
    pub created_by_id: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub is_routine: bool,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub assignee: Option<UserSummary>,
    pub created_by: Option<UserSummary>,
    pub tags: Vec<Tag>,
    pub subtasks: Vec<SubtaskDetail>,
}

#[derive(sqlx::FromRow)]
struct TaskTagRow {
    task_id: Uuid,
    id: Uuid,
    name: String,
    color: Option<String>,
    family_id: Uuid,
}

impl TaskDetail {
    /// Loads one task with relations and direct subtasks
    pub async fn load(pool: &PgPool, task_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let Some(task) = Task::find_by_id(pool, task_id).await? else {
            return Ok(None);
        };

        let mut details = Self::from_tasks(pool, vec![task]).await?;
        Ok(details.pop())
    }

    /// Assembles read responses for a set of tasks with four batched
    /// queries: direct children, tag associations, and user summaries
    ///
    /// Order of the input tasks is preserved.
    pub async fn from_tasks(pool: &PgPool, tasks: Vec<Task>) -> Result<Vec<Self>, sqlx::Error> {
        if tasks.is_empty() {
            return Ok(Vec::new());
        }

        let parent_ids: Vec<Uuid> = tasks.iter().map(|t| t.id).collect();

        let children = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE parent_id = ANY($1) ORDER BY created_at ASC"
        ))
        .bind(&parent_ids)
        .fetch_all(pool)
        .await?;

        let mut all_ids = parent_ids.clone();
        all_ids.extend(children.iter().map(|t| t.id));

        let tag_rows = sqlx::query_as::<_, TaskTagRow>(
            r#"
            SELECT tt.task_id AS task_id, t.id AS id, t.name AS name,
                   t.color AS color, t.family_id AS family_id
            FROM task_tags tt
            JOIN tags t ON t.id = tt.tag_id
            WHERE tt.task_id = ANY($1)
            ORDER BY t.name ASC
            "#,
        )
        .bind(&all_ids)
        .fetch_all(pool)
        .await?;

        let mut tags_by_task: HashMap<Uuid, Vec<Tag>> = HashMap::new();
        for row in tag_rows {
            tags_by_task.entry(row.task_id).or_default().push(Tag {
                id: row.id,
                name: row.name,
                color: row.color,
                family_id: row.family_id,
            });
        }

        let mut user_ids: Vec<Uuid> = tasks
            .iter()
            .chain(children.iter())
            .flat_map(|t| [t.assignee_id, t.created_by_id])
            .flatten()
            .collect();
        user_ids.sort();
        user_ids.dedup();

        let users = User::summaries_by_ids(pool, &user_ids).await?;

        let mut children_by_parent: HashMap<Uuid, Vec<Task>> = HashMap::new();
        for child in children {
            if let Some(parent_id) = child.parent_id {
                children_by_parent.entry(parent_id).or_default().push(child);
            }
        }

        Ok(tasks
            .into_iter()
            .map(|task| {
                let subtasks = children_by_parent
                    .remove(&task.id)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|sub| subtask_detail(sub, &users, &mut tags_by_task))
                    .collect();

                let assignee = task.assignee_id.and_then(|id| users.get(&id).cloned());
                let created_by = task.created_by_id.and_then(|id| users.get(&id).cloned());
                let tags = tags_by_task.remove(&task.id).unwrap_or_default();

                TaskDetail {
                    id: task.id,
                    title: task.title,
                    description: task.description,
                    family_id: task.family_id,
                    assignee_id: task.assignee_id,
                    created_by_id: task.created_by_id,
                    due_date: task.due_date,
                    status: task.status,
                    priority: task.priority,
                    is_routine: task.is_routine,
                    parent_id: task.parent_id,
                    created_at: task.created_at,
                    updated_at: task.updated_at,
                    assignee,
                    created_by,
                    tags,
                    subtasks,
                }
            })
            .collect())
    }
}

fn subtask_detail(
    task: Task,
    users: &HashMap<Uuid, UserSummary>,
    tags_by_task: &mut HashMap<Uuid, Vec<Tag>>,
) -> SubtaskDetail {
    let assignee = task.assignee_id.and_then(|id| users.get(&id).cloned());
    let created_by = task.created_by_id.and_then(|id| users.get(&id).cloned());
    let tags = tags_by_task.remove(&task.id).unwrap_or_default();

    SubtaskDetail {
        id: task.id,
        title: task.title,
        description: task.description,
        family_id: task.family_id,
        assignee_id: task.assignee_id,
        created_by_id: task.created_by_id,
        due_date: task.due_date,
        status: task.status,
        priority: task.priority,
        is_routine: task.is_routine,
        parent_id: task.parent_id,
        created_at: task.created_at,
        updated_at: task.updated_at,
        assignee,
        created_by,
        tags,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str() {
        assert_eq!(TaskStatus::Pending.as_str(), "pending");
        assert_eq!(TaskStatus::InProgress.as_str(), "in_progress");
        assert_eq!(TaskStatus::Completed.as_str(), "completed");
    }

    #[test]
    fn test_priority_as_str() {
        assert_eq!(TaskPriority::Low.as_str(), "low");
        assert_eq!(TaskPriority::Medium.as_str(), "medium");
        assert_eq!(TaskPriority::High.as_str(), "high");
    }

    #[test]
    fn test_status_serde_roundtrip() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");

        let status: TaskStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(status, TaskStatus::Completed);
    }

    #[test]
    fn test_create_task_defaults() {
        let input: CreateTask = serde_json::from_str(
            r#"{"title": "Buy milk", "family_id": "4f5c2f4a-0000-0000-0000-000000000001"}"#,
        )
        .unwrap();

        assert_eq!(input.status, TaskStatus::Pending);
        assert_eq!(input.priority, TaskPriority::Medium);
        assert!(!input.is_routine);
        assert!(input.tag_ids.is_none());
    }

    #[test]
    fn test_update_task_absent_vs_null() {
        // Absent field: leave untouched
        let patch: UpdateTask = serde_json::from_str("{}").unwrap();
        assert!(patch.description.is_none());
        assert!(patch.due_date.is_none());

        // Explicit null: clear the value
        let patch: UpdateTask =
            serde_json::from_str(r#"{"description": null, "due_date": null}"#).unwrap();
        assert_eq!(patch.description, Some(None));
        assert_eq!(patch.due_date, Some(None));

        // Present value: set it
        let patch: UpdateTask =
            serde_json::from_str(r#"{"description": "updated", "due_date": "2025-06-01"}"#)
                .unwrap();
        assert_eq!(patch.description, Some(Some("updated".to_string())));
        assert_eq!(
            patch.due_date,
            Some(NaiveDate::from_ymd_opt(2025, 6, 1))
        );
    }

    #[test]
    fn test_update_task_rejects_malformed_date() {
        // Malformed dates fail deserialization outright instead of
        // degrading to "no due date"
        let result = serde_json::from_str::<UpdateTask>(r#"{"due_date": "not-a-date"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_update_task_empty_tag_list_is_present() {
        let patch: UpdateTask = serde_json::from_str(r#"{"tag_ids": []}"#).unwrap();
        assert_eq!(patch.tag_ids, Some(vec![]));
    }

    #[test]
    fn test_task_filter_default_is_unfiltered() {
        let filter = TaskFilter::default();
        assert!(filter.assignee_id.is_none());
        assert!(filter.status.is_none());
        assert!(filter.is_routine.is_none());
        assert!(filter.due_before.is_none());
        assert!(filter.due_after.is_none());
        assert!(filter.tag_ids.is_none());
    }

    // Hierarchy, filtering, and routine-reset behavior are exercised
    // against a real database in tests/
}
