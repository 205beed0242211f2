/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Session lifecycle (register, login, refresh, logout)
/// - `users`: Profile endpoints
/// - `families`: Family CRUD and membership management
/// - `tasks`: Task CRUD, root listing, and subtask creation
/// - `tags`: Tag CRUD
/// - `admin`: Maintenance triggers

pub mod admin;
pub mod auth;
pub mod families;
pub mod health;
pub mod tags;
pub mod tasks;
pub mod users;
