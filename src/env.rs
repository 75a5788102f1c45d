/// Environment variable names used by this crate for convenient
/// configuration of the formatter from microservices.
///
/// These are purely helpers; the core formatter stays decoupled from
/// environment access.

/// Logical service name stamped into every record's `s` field.
pub const LOG_SERVICE_NAME_ENV: &str = "LOG_SERVICE_NAME";

/// Deployment environment stamped into every record's `e` field,
/// e.g. `production` or `staging`.
pub const LOG_ENVIRONMENT_ENV: &str = "LOG_ENVIRONMENT";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
