/// Integration tests for families and memberships
///
/// These tests require a running PostgreSQL database (see tests/common).

mod common;

use famsync_shared::models::family::{Family, FamilyMember, DEFAULT_TAGS};
use famsync_shared::models::tag::Tag;

#[tokio::test]
async fn test_create_family_seeds_admin_and_default_tags() {
    let pool = require_db!();
    let creator = common::create_test_user(&pool).await;

    let family = Family::create_with_admin(&pool, "Integration Household", creator.id)
        .await
        .expect("Family creation should succeed");

    assert!(FamilyMember::is_member(&pool, creator.id, family.id)
        .await
        .unwrap());
    assert!(FamilyMember::is_admin(&pool, creator.id, family.id)
        .await
        .unwrap());

    let tags = Tag::list_by_family(&pool, family.id).await.unwrap();
    assert_eq!(tags.len(), DEFAULT_TAGS.len());
    assert!(tags.iter().all(|t| t.family_id == family.id));
}

#[tokio::test]
async fn test_add_then_remove_member_flips_is_member() {
    let pool = require_db!();
    let creator = common::create_test_user(&pool).await;
    let joiner = common::create_test_user(&pool).await;

    let family = Family::create_with_admin(&pool, "Membership Family", creator.id)
        .await
        .unwrap();

    assert!(!FamilyMember::is_member(&pool, joiner.id, family.id)
        .await
        .unwrap());

    FamilyMember::insert(&pool, joiner.id, family.id, "child", false)
        .await
        .expect("Insert should succeed");

    assert!(FamilyMember::is_member(&pool, joiner.id, family.id)
        .await
        .unwrap());
    assert!(!FamilyMember::is_admin(&pool, joiner.id, family.id)
        .await
        .unwrap());

    let removed = FamilyMember::delete(&pool, joiner.id, family.id)
        .await
        .unwrap();
    assert!(removed);

    assert!(!FamilyMember::is_member(&pool, joiner.id, family.id)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_duplicate_membership_rejected() {
    let pool = require_db!();
    let creator = common::create_test_user(&pool).await;

    let family = Family::create_with_admin(&pool, "Duplicate Family", creator.id)
        .await
        .unwrap();

    // Creator already holds a membership from create_with_admin
    let result = FamilyMember::insert(&pool, creator.id, family.id, "parent", true).await;
    assert!(result.is_err(), "Unique (user, family) must be enforced");
}

#[tokio::test]
async fn test_list_families_by_user() {
    let pool = require_db!();
    let user = common::create_test_user(&pool).await;

    let f1 = Family::create_with_admin(&pool, "First Family", user.id)
        .await
        .unwrap();
    let f2 = Family::create_with_admin(&pool, "Second Family", user.id)
        .await
        .unwrap();

    let families = Family::list_by_user(&pool, user.id).await.unwrap();
    let ids: Vec<_> = families.iter().map(|f| f.id).collect();

    assert_eq!(families.len(), 2);
    assert!(ids.contains(&f1.id));
    assert!(ids.contains(&f2.id));
}

#[tokio::test]
async fn test_member_listing_includes_user_profiles() {
    let pool = require_db!();
    let creator = common::create_test_user(&pool).await;
    let joiner = common::create_test_user(&pool).await;

    let family = Family::create_with_admin(&pool, "Listing Family", creator.id)
        .await
        .unwrap();
    FamilyMember::insert(&pool, joiner.id, family.id, "child", false)
        .await
        .unwrap();

    let members = FamilyMember::list_with_users(&pool, family.id)
        .await
        .unwrap();

    assert_eq!(members.len(), 2);
    let joined = members
        .iter()
        .find(|m| m.user_id == joiner.id)
        .expect("Joiner should be listed");
    assert_eq!(joined.user.email, joiner.email);
    assert_eq!(joined.role, "child");
}
