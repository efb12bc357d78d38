pub mod app;
pub mod application;
pub mod grant;
pub mod installation;
pub mod token;
pub mod user;

/// Split a space-separated scope column into its individual scopes.
pub fn split_scopes(scopes: &str) -> Vec<String> {
    scopes.split_whitespace().map(|s| s.to_string()).collect()
}
