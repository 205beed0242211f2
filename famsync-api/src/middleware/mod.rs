/// Custom middleware for the API server
///
/// - `security`: security-related response headers

pub mod security;
