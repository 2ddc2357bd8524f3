use thiserror::Error;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("telemetry error: {0}")]
    Telemetry(String),
    #[error("database error: {0}")]
    Database(String),
    #[error("server error: {0}")]
    Server(String),
}

impl InfraError {
    pub fn telemetry(message: impl Into<String>) -> Self {
        Self::Telemetry(message.into())
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database(message.into())
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::Server(message.into())
    }
}
