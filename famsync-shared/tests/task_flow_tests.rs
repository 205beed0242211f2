/// Integration tests for task hierarchy, filtering, tag scoping, partial
/// updates, and the routine reset sweep
///
/// These tests require a running PostgreSQL database (see tests/common).

mod common;

use chrono::NaiveDate;
use famsync_shared::models::family::Family;
use famsync_shared::models::tag::{CreateTag, Tag};
use famsync_shared::models::task::{
    CreateSubtask, CreateTask, Task, TaskDetail, TaskFilter, TaskPriority, TaskStatus, UpdateTask,
};
use sqlx::PgPool;
use uuid::Uuid;

fn task_input(family_id: Uuid, title: &str) -> CreateTask {
    CreateTask {
        title: title.to_string(),
        description: None,
        family_id,
        assignee_id: None,
        due_date: None,
        status: TaskStatus::Pending,
        priority: TaskPriority::Medium,
        is_routine: false,
        tag_ids: None,
    }
}

fn subtask_input(title: &str) -> CreateSubtask {
    CreateSubtask {
        title: title.to_string(),
        description: None,
        assignee_id: None,
        due_date: None,
        status: TaskStatus::Pending,
        priority: TaskPriority::Medium,
        is_routine: false,
        tag_ids: None,
    }
}

async fn make_tag(pool: &PgPool, family_id: Uuid, name: &str) -> Tag {
    Tag::create(
        pool,
        CreateTag {
            name: name.to_string(),
            color: None,
            family_id,
        },
    )
    .await
    .expect("Tag creation should succeed")
}

#[tokio::test]
async fn test_subtask_inherits_parent_family() {
    let pool = require_db!();
    let user = common::create_test_user(&pool).await;
    let family = Family::create_with_admin(&pool, "Hierarchy Family", user.id)
        .await
        .unwrap();

    let parent = Task::create_with_tags(&pool, task_input(family.id, "Parent"), user.id)
        .await
        .unwrap();

    let created = Task::create_subtasks(&pool, &parent, vec![subtask_input("Child")], user.id)
        .await
        .unwrap();

    assert_eq!(created.len(), 1);
    assert_eq!(created[0].family_id, family.id);
    assert_eq!(created[0].parent_id, Some(parent.id));
}

#[tokio::test]
async fn test_bulk_subtasks_created_together() {
    let pool = require_db!();
    let user = common::create_test_user(&pool).await;
    let family = Family::create_with_admin(&pool, "Bulk Family", user.id)
        .await
        .unwrap();

    let parent = Task::create_with_tags(&pool, task_input(family.id, "Parent"), user.id)
        .await
        .unwrap();

    let inputs = vec![
        subtask_input("Step 1"),
        subtask_input("Step 2"),
        subtask_input("Step 3"),
    ];
    let created = Task::create_subtasks(&pool, &parent, inputs, user.id)
        .await
        .unwrap();

    assert_eq!(created.len(), 3);
    assert!(created.iter().all(|t| t.parent_id == Some(parent.id)));
    assert!(created.iter().all(|t| t.family_id == family.id));

    let detail = TaskDetail::load(&pool, parent.id)
        .await
        .unwrap()
        .expect("Parent should load");
    assert_eq!(detail.subtasks.len(), 3);
}

#[tokio::test]
async fn test_foreign_family_tags_are_dropped() {
    let pool = require_db!();
    let user = common::create_test_user(&pool).await;
    let home = Family::create_with_admin(&pool, "Home", user.id).await.unwrap();
    let other = Family::create_with_admin(&pool, "Other", user.id).await.unwrap();

    let home_tag = make_tag(&pool, home.id, "errands").await;
    let other_tag = make_tag(&pool, other.id, "foreign").await;

    let mut input = task_input(home.id, "Tagged task");
    input.tag_ids = Some(vec![home_tag.id, other_tag.id]);

    let task = Task::create_with_tags(&pool, input, user.id).await.unwrap();

    let detail = TaskDetail::load(&pool, task.id).await.unwrap().unwrap();
    let attached: Vec<Uuid> = detail.tags.iter().map(|t| t.id).collect();

    // The in-family tag survives; the foreign id is dropped without error
    assert_eq!(attached, vec![home_tag.id]);
}

#[tokio::test]
async fn test_tag_filter_is_inclusive_or() {
    let pool = require_db!();
    let user = common::create_test_user(&pool).await;
    let family = Family::create_with_admin(&pool, "Filter Family", user.id)
        .await
        .unwrap();

    let tag_a = make_tag(&pool, family.id, "a").await;
    let tag_b = make_tag(&pool, family.id, "b").await;

    let mut with_a = task_input(family.id, "has A");
    with_a.tag_ids = Some(vec![tag_a.id]);
    let mut with_b = task_input(family.id, "has B");
    with_b.tag_ids = Some(vec![tag_b.id]);
    let mut with_both = task_input(family.id, "has A and B");
    with_both.tag_ids = Some(vec![tag_a.id, tag_b.id]);
    let untagged = task_input(family.id, "untagged");

    for input in [with_a, with_b, with_both, untagged] {
        Task::create_with_tags(&pool, input, user.id).await.unwrap();
    }

    let filter = TaskFilter {
        tag_ids: Some(vec![tag_a.id, tag_b.id]),
        ..Default::default()
    };

    let tasks = Task::list_by_family(&pool, family.id, &filter, 100, 0)
        .await
        .unwrap();
    let count = Task::count_by_family(&pool, family.id, &filter)
        .await
        .unwrap();

    // Tagged {A}, {B}, {A,B} match; untagged doesn't. A task with both
    // tags counts once.
    assert_eq!(tasks.len(), 3);
    assert_eq!(count, 3);
}

#[tokio::test]
async fn test_count_matches_unpaginated_total() {
    let pool = require_db!();
    let user = common::create_test_user(&pool).await;
    let family = Family::create_with_admin(&pool, "Count Family", user.id)
        .await
        .unwrap();

    for i in 0..7 {
        let mut input = task_input(family.id, &format!("Task {}", i));
        if i % 2 == 0 {
            input.status = TaskStatus::Completed;
        }
        Task::create_with_tags(&pool, input, user.id).await.unwrap();
    }

    let filter = TaskFilter {
        status: Some(TaskStatus::Completed),
        ..Default::default()
    };

    let all = Task::list_by_family(&pool, family.id, &filter, i64::MAX, 0)
        .await
        .unwrap();
    let total = Task::count_by_family(&pool, family.id, &filter)
        .await
        .unwrap();

    assert_eq!(all.len() as i64, total);
    assert_eq!(total, 4);

    // A small page reports the same total
    let page = Task::list_by_family(&pool, family.id, &filter, 2, 0)
        .await
        .unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(
        Task::count_by_family(&pool, family.id, &filter).await.unwrap(),
        4
    );
}

#[tokio::test]
async fn test_root_listing_excludes_subtasks() {
    let pool = require_db!();
    let user = common::create_test_user(&pool).await;
    let family = Family::create_with_admin(&pool, "Roots Family", user.id)
        .await
        .unwrap();

    let root = Task::create_with_tags(&pool, task_input(family.id, "Root"), user.id)
        .await
        .unwrap();
    Task::create_subtasks(&pool, &root, vec![subtask_input("Sub")], user.id)
        .await
        .unwrap();

    let filter = TaskFilter::default();
    let roots = Task::list_roots_by_family(&pool, family.id, &filter, 100, 0)
        .await
        .unwrap();
    let root_count = Task::count_roots_by_family(&pool, family.id, &filter)
        .await
        .unwrap();

    assert_eq!(roots.len(), 1);
    assert_eq!(root_count, 1);
    assert_eq!(roots[0].id, root.id);

    // Flat listing sees both
    let all_count = Task::count_by_family(&pool, family.id, &filter)
        .await
        .unwrap();
    assert_eq!(all_count, 2);

    // The root carries its child in the read representation
    let details = TaskDetail::from_tasks(&pool, roots).await.unwrap();
    assert_eq!(details[0].subtasks.len(), 1);
    assert_eq!(details[0].subtasks[0].title, "Sub");
}

#[tokio::test]
async fn test_partial_update_semantics() {
    let pool = require_db!();
    let user = common::create_test_user(&pool).await;
    let family = Family::create_with_admin(&pool, "Update Family", user.id)
        .await
        .unwrap();

    let mut input = task_input(family.id, "Original title");
    input.description = Some("original description".to_string());
    input.due_date = NaiveDate::from_ymd_opt(2025, 6, 1);
    let task = Task::create_with_tags(&pool, input, user.id).await.unwrap();

    // Absent fields stay untouched
    let patch = UpdateTask {
        status: Some(TaskStatus::InProgress),
        ..Default::default()
    };
    let updated = Task::update_with_tags(&pool, &task, patch).await.unwrap();
    assert_eq!(updated.status, TaskStatus::InProgress);
    assert_eq!(updated.title, "Original title");
    assert_eq!(updated.description.as_deref(), Some("original description"));
    assert_eq!(updated.due_date, NaiveDate::from_ymd_opt(2025, 6, 1));

    // Explicit null clears nullable fields
    let patch = UpdateTask {
        description: Some(None),
        due_date: Some(None),
        ..Default::default()
    };
    let cleared = Task::update_with_tags(&pool, &updated, patch).await.unwrap();
    assert!(cleared.description.is_none());
    assert!(cleared.due_date.is_none());
    assert_eq!(cleared.title, "Original title");
}

#[tokio::test]
async fn test_update_replaces_tag_set() {
    let pool = require_db!();
    let user = common::create_test_user(&pool).await;
    let family = Family::create_with_admin(&pool, "Retag Family", user.id)
        .await
        .unwrap();

    let tag_a = make_tag(&pool, family.id, "keep").await;
    let tag_b = make_tag(&pool, family.id, "drop").await;

    let mut input = task_input(family.id, "Retagged");
    input.tag_ids = Some(vec![tag_a.id, tag_b.id]);
    let task = Task::create_with_tags(&pool, input, user.id).await.unwrap();

    // Present tag_ids replaces the whole association set
    let patch = UpdateTask {
        tag_ids: Some(vec![tag_a.id]),
        ..Default::default()
    };
    Task::update_with_tags(&pool, &task, patch).await.unwrap();

    let detail = TaskDetail::load(&pool, task.id).await.unwrap().unwrap();
    let attached: Vec<Uuid> = detail.tags.iter().map(|t| t.id).collect();
    assert_eq!(attached, vec![tag_a.id]);

    // An empty list strips every tag
    let patch = UpdateTask {
        tag_ids: Some(vec![]),
        ..Default::default()
    };
    Task::update_with_tags(&pool, &task, patch).await.unwrap();

    let detail = TaskDetail::load(&pool, task.id).await.unwrap().unwrap();
    assert!(detail.tags.is_empty());
}

#[tokio::test]
async fn test_routine_reset_flips_exactly_the_completed_routines() {
    let pool = require_db!();
    let user = common::create_test_user(&pool).await;
    let family = Family::create_with_admin(&pool, "Routine Family", user.id)
        .await
        .unwrap();

    // Flush any completed routines left behind by earlier runs so the
    // counts below are exact
    Task::reset_completed_routines(&pool).await.unwrap();

    for i in 0..3 {
        let mut input = task_input(family.id, &format!("Routine {}", i));
        input.is_routine = true;
        input.status = TaskStatus::Completed;
        Task::create_with_tags(&pool, input, user.id).await.unwrap();
    }

    // Completed but not routine: must not be touched
    let mut plain_done = task_input(family.id, "One-off done");
    plain_done.status = TaskStatus::Completed;
    let plain_done = Task::create_with_tags(&pool, plain_done, user.id)
        .await
        .unwrap();

    // Routine but still pending: must not be touched
    let mut routine_pending = task_input(family.id, "Routine pending");
    routine_pending.is_routine = true;
    Task::create_with_tags(&pool, routine_pending, user.id)
        .await
        .unwrap();

    let flipped = Task::reset_completed_routines(&pool).await.unwrap();
    assert_eq!(flipped, 3);

    let untouched = Task::find_by_id(&pool, plain_done.id).await.unwrap().unwrap();
    assert_eq!(untouched.status, TaskStatus::Completed);

    // Immediately sweeping again finds nothing
    let second = Task::reset_completed_routines(&pool).await.unwrap();
    assert_eq!(second, 0);
}

#[tokio::test]
async fn test_delete_task_cascades_to_subtasks() {
    let pool = require_db!();
    let user = common::create_test_user(&pool).await;
    let family = Family::create_with_admin(&pool, "Cascade Family", user.id)
        .await
        .unwrap();

    let parent = Task::create_with_tags(&pool, task_input(family.id, "Parent"), user.id)
        .await
        .unwrap();
    let children = Task::create_subtasks(&pool, &parent, vec![subtask_input("Sub")], user.id)
        .await
        .unwrap();

    assert!(Task::delete(&pool, parent.id).await.unwrap());

    assert!(Task::find_by_id(&pool, parent.id).await.unwrap().is_none());
    assert!(Task::find_by_id(&pool, children[0].id)
        .await
        .unwrap()
        .is_none());
}
