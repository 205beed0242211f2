/// Family and membership models and database operations
///
/// A family is the tenant boundary: tasks, tags, and memberships are all
/// scoped to one. Deleting a family cascades to all three. Membership links
/// one user to one family with a free-text role (e.g. "parent", "child")
/// and an admin flag, and is unique per (user, family).
///
/// # Schema
///
/// ```sql
/// CREATE TABLE families (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE family_members (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     family_id UUID NOT NULL REFERENCES families(id) ON DELETE CASCADE,
///     role VARCHAR(50) NOT NULL,
///     is_admin BOOLEAN NOT NULL DEFAULT FALSE,
///     joined_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT uq_user_family UNIQUE (user_id, family_id)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use famsync_shared::models::family::{Family, FamilyMember};
/// # use sqlx::PgPool;
/// # use uuid::Uuid;
/// # async fn example(pool: PgPool, user_id: Uuid) -> Result<(), sqlx::Error> {
/// // Creator becomes the family's first admin, default tags are seeded
/// let family = Family::create_with_admin(&pool, "Tanaka Household", user_id).await?;
///
/// assert!(FamilyMember::is_member(&pool, user_id, family.id).await?);
/// assert!(FamilyMember::is_admin(&pool, user_id, family.id).await?);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::tag::{CreateTag, Tag};
use crate::models::user::UserSummary;

/// Tags seeded into every new family
///
/// (name, color) pairs; colors follow the web client's palette.
pub const DEFAULT_TAGS: &[(&str, &str)] = &[
    ("Important", "#f44336"),
    ("Shopping", "#4caf50"),
    ("Housework", "#3f51b5"),
    ("Childcare", "#ff9800"),
    ("Work", "#9c27b0"),
    ("Hobby", "#00bcd4"),
];

/// Role given to the user who creates a family
const CREATOR_ROLE: &str = "parent";

/// Family model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Family {
    /// Unique family ID
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// When the family was created
    pub created_at: DateTime<Utc>,

    /// When the family was last updated
    pub updated_at: DateTime<Utc>,
}

/// Membership row linking a user to a family
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FamilyMember {
    /// Unique membership ID
    pub id: Uuid,

    /// Member user
    pub user_id: Uuid,

    /// Family
    pub family_id: Uuid,

    /// Free-text role, e.g. "parent" or "child"
    pub role: String,

    /// Whether the member administers the family
    pub is_admin: bool,

    /// When the membership was created
    pub joined_at: DateTime<Utc>,
}

/// Membership with the member's public user profile attached
///
/// The read contract for member listings: the user summary is fetched
/// eagerly in the same query, never lazily per row.
#[derive(Debug, Clone, Serialize)]
pub struct MemberWithUser {
    pub id: Uuid,
    pub user_id: Uuid,
    pub family_id: Uuid,
    pub role: String,
    pub is_admin: bool,
    pub joined_at: DateTime<Utc>,
    pub user: UserSummary,
}

impl Family {
    /// Creates a family, its first (admin) membership, and the default tag
    /// set in one transaction
    ///
    /// The creator joins with role "parent" and the admin flag set. If any
    /// step fails the whole operation rolls back, a family is never left
    /// without an admin or without its default tags.
    pub async fn create_with_admin(
        pool: &PgPool,
        name: &str,
        creator_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let family = sqlx::query_as::<_, Family>(
            r#"
            INSERT INTO families (name)
            VALUES ($1)
            RETURNING id, name, created_at, updated_at
            "#,
        )
        .bind(name)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO family_members (user_id, family_id, role, is_admin)
            VALUES ($1, $2, $3, TRUE)
            "#,
        )
        .bind(creator_id)
        .bind(family.id)
        .bind(CREATOR_ROLE)
        .execute(&mut *tx)
        .await?;

        for (tag_name, color) in DEFAULT_TAGS {
            Tag::create(
                &mut *tx,
                CreateTag {
                    name: tag_name.to_string(),
                    color: Some(color.to_string()),
                    family_id: family.id,
                },
            )
            .await?;
        }

        tx.commit().await?;

        Ok(family)
    }

    /// Finds a family by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let family = sqlx::query_as::<_, Family>(
            "SELECT id, name, created_at, updated_at FROM families WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(family)
    }

    /// Lists the families a user belongs to
    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let families = sqlx::query_as::<_, Family>(
            r#"
            SELECT f.id, f.name, f.created_at, f.updated_at
            FROM families f
            JOIN family_members fm ON f.id = fm.family_id
            WHERE fm.user_id = $1
            ORDER BY f.created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(families)
    }

    /// Renames a family
    ///
    /// # Returns
    ///
    /// The updated family if found, None otherwise
    pub async fn update_name(
        pool: &PgPool,
        id: Uuid,
        name: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let family = sqlx::query_as::<_, Family>(
            r#"
            UPDATE families
            SET name = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(name)
        .fetch_optional(pool)
        .await?;

        Ok(family)
    }
}

impl FamilyMember {
    /// Checks if a user belongs to a family (any role)
    pub async fn is_member(
        pool: &PgPool,
        user_id: Uuid,
        family_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM family_members
                WHERE user_id = $1 AND family_id = $2
            )
            "#,
        )
        .bind(user_id)
        .bind(family_id)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Checks if a user administers a family
    pub async fn is_admin(
        pool: &PgPool,
        user_id: Uuid,
        family_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM family_members
                WHERE user_id = $1 AND family_id = $2 AND is_admin = TRUE
            )
            "#,
        )
        .bind(user_id)
        .bind(family_id)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Inserts a membership row
    ///
    /// # Errors
    ///
    /// Returns an error on a duplicate (user, family) pair or a missing
    /// user/family (constraint violations).
    pub async fn insert(
        pool: &PgPool,
        user_id: Uuid,
        family_id: Uuid,
        role: &str,
        is_admin: bool,
    ) -> Result<Self, sqlx::Error> {
        let member = sqlx::query_as::<_, FamilyMember>(
            r#"
            INSERT INTO family_members (user_id, family_id, role, is_admin)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, family_id, role, is_admin, joined_at
            "#,
        )
        .bind(user_id)
        .bind(family_id)
        .bind(role)
        .bind(is_admin)
        .fetch_one(pool)
        .await?;

        Ok(member)
    }

    /// Deletes a membership
    ///
    /// # Returns
    ///
    /// True if a membership existed and was removed
    pub async fn delete(
        pool: &PgPool,
        user_id: Uuid,
        family_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM family_members WHERE user_id = $1 AND family_id = $2")
                .bind(user_id)
                .bind(family_id)
                .execute(pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists a family's members with their user profiles attached
    pub async fn list_with_users(
        pool: &PgPool,
        family_id: Uuid,
    ) -> Result<Vec<MemberWithUser>, sqlx::Error> {
        #[derive(sqlx::FromRow)]
        struct Row {
            id: Uuid,
            user_id: Uuid,
            family_id: Uuid,
            role: String,
            is_admin: bool,
            joined_at: DateTime<Utc>,
            u_id: Uuid,
            u_email: String,
            u_first_name: String,
            u_last_name: String,
            u_avatar_url: Option<String>,
            u_is_active: bool,
            u_created_at: DateTime<Utc>,
            u_updated_at: DateTime<Utc>,
        }

        let rows = sqlx::query_as::<_, Row>(
            r#"
            SELECT fm.id, fm.user_id, fm.family_id, fm.role, fm.is_admin, fm.joined_at,
                   u.id AS u_id, u.email AS u_email, u.first_name AS u_first_name,
                   u.last_name AS u_last_name, u.avatar_url AS u_avatar_url,
                   u.is_active AS u_is_active, u.created_at AS u_created_at,
                   u.updated_at AS u_updated_at
            FROM family_members fm
            JOIN users u ON u.id = fm.user_id
            WHERE fm.family_id = $1
            ORDER BY fm.joined_at ASC
            "#,
        )
        .bind(family_id)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| MemberWithUser {
                id: r.id,
                user_id: r.user_id,
                family_id: r.family_id,
                role: r.role,
                is_admin: r.is_admin,
                joined_at: r.joined_at,
                user: UserSummary {
                    id: r.u_id,
                    email: r.u_email,
                    first_name: r.u_first_name,
                    last_name: r.u_last_name,
                    avatar_url: r.u_avatar_url,
                    is_active: r.u_is_active,
                    created_at: r.u_created_at,
                    updated_at: r.u_updated_at,
                },
            })
            .collect())
    }
}
