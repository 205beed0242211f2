/// Tag model and database operations
///
/// Tags are family-scoped labels attached to tasks through the `task_tags`
/// join table. A tag name is unique within its family.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tags (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(100) NOT NULL,
///     color VARCHAR(20),
///     family_id UUID NOT NULL REFERENCES families(id) ON DELETE CASCADE,
///     CONSTRAINT uq_tag_name_family UNIQUE (name, family_id)
/// );
///
/// CREATE TABLE task_tags (
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     tag_id UUID NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
///     PRIMARY KEY (task_id, tag_id)
/// );
/// ```

use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// Tag model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tag {
    /// Unique tag ID
    pub id: Uuid,

    /// Tag name, unique per family
    pub name: String,

    /// Optional display color (e.g. "#f44336")
    pub color: Option<String>,

    /// Owning family
    pub family_id: Uuid,
}

/// Input for creating a new tag
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTag {
    /// Tag name
    pub name: String,

    /// Optional display color
    pub color: Option<String>,

    /// Owning family
    pub family_id: Uuid,
}

/// Input for updating a tag
///
/// `color` uses the double-Option pattern: `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct UpdateTag {
    /// New name
    pub name: Option<String>,

    /// New color (`Some(None)` clears it)
    pub color: Option<Option<String>>,
}

const TAG_COLUMNS: &str = "id, name, color, family_id";

impl Tag {
    /// Creates a new tag
    ///
    /// Accepts any executor so family creation can seed default tags inside
    /// its transaction.
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        data: CreateTag,
    ) -> Result<Self, sqlx::Error> {
        let tag = sqlx::query_as::<_, Tag>(
            r#"
            INSERT INTO tags (name, color, family_id)
            VALUES ($1, $2, $3)
            RETURNING id, name, color, family_id
            "#,
        )
        .bind(data.name)
        .bind(data.color)
        .bind(data.family_id)
        .fetch_one(executor)
        .await?;

        Ok(tag)
    }

    /// Finds a tag by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let tag = sqlx::query_as::<_, Tag>(&format!(
            "SELECT {TAG_COLUMNS} FROM tags WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(tag)
    }

    /// Lists all tags belonging to a family
    pub async fn list_by_family(pool: &PgPool, family_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let tags = sqlx::query_as::<_, Tag>(&format!(
            "SELECT {TAG_COLUMNS} FROM tags WHERE family_id = $1 ORDER BY name ASC"
        ))
        .bind(family_id)
        .fetch_all(pool)
        .await?;

        Ok(tags)
    }

    /// Updates a tag
    ///
    /// # Returns
    ///
    /// The updated tag if found, None otherwise
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTag,
    ) -> Result<Option<Self>, sqlx::Error> {
        // An empty patch is a no-op read
        if data.name.is_none() && data.color.is_none() {
            return Self::find_by_id(pool, id).await;
        }

        let mut qb = sqlx::QueryBuilder::<sqlx::Postgres>::new("UPDATE tags SET ");
        let mut fields = qb.separated(", ");

        if let Some(name) = data.name {
            fields.push("name = ").push_bind_unseparated(name);
        }
        if let Some(color) = data.color {
            fields.push("color = ").push_bind_unseparated(color);
        }

        qb.push(" WHERE id = ").push_bind(id);
        qb.push(" RETURNING id, name, color, family_id");

        let tag = qb.build_query_as::<Tag>().fetch_optional(pool).await?;

        Ok(tag)
    }

    /// Deletes a tag
    ///
    /// Associated `task_tags` rows cascade away.
    ///
    /// # Returns
    ///
    /// True if the tag existed and was deleted
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Narrows a candidate tag-id set to ids that exist AND belong to the
    /// given family
    ///
    /// Ids that don't match are dropped without error, the task write paths
    /// attach only the surviving ids, so a task can never reference a tag
    /// from another family.
    pub async fn filter_ids_for_family<'e>(
        executor: impl PgExecutor<'e>,
        candidate_ids: &[Uuid],
        family_id: Uuid,
    ) -> Result<Vec<Uuid>, sqlx::Error> {
        if candidate_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM tags WHERE id = ANY($1) AND family_id = $2",
        )
        .bind(candidate_ids)
        .bind(family_id)
        .fetch_all(executor)
        .await?;

        Ok(ids.into_iter().map(|(id,)| id).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_tag_default_is_empty() {
        let update = UpdateTag::default();
        assert!(update.name.is_none());
        assert!(update.color.is_none());
    }

    #[test]
    fn test_tag_serialization() {
        let tag = Tag {
            id: Uuid::new_v4(),
            name: "Shopping".to_string(),
            color: Some("#4caf50".to_string()),
            family_id: Uuid::new_v4(),
        };

        let json = serde_json::to_value(&tag).unwrap();
        assert_eq!(json["name"], "Shopping");
        assert_eq!(json["color"], "#4caf50");
    }

    // Family-scoping tests for filter_ids_for_family require a database;
    // see tests/
}
