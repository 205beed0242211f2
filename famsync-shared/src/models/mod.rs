/// Database models for FamSync
///
/// This module contains all database models and their data-access
/// operations. Each model owns the SQL that touches its table; reads that
/// cross tables return explicit, eagerly-fetched transfer structures (see
/// `task::TaskDetail`) rather than lazily-loaded rows.
///
/// # Models
///
/// - `user`: User accounts
/// - `family`: Families and family memberships
/// - `task`: Tasks, subtasks, filtering, and the routine-reset sweep
/// - `tag`: Family-scoped tags
/// - `refresh_token`: Persisted, revocable refresh tokens

pub mod family;
pub mod refresh_token;
pub mod tag;
pub mod task;
pub mod user;
