use serde::Deserialize;

/// Sentry error reporting settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SentryConfig {
    /// DSN of the Sentry project receiving fatal listener errors.
    pub dsn: String,
}
