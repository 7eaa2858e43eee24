use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("authorization was not completed: {0}")]
    AuthorizationFailed(String),

    #[error("token endpoint error: {0}")]
    TokenEndpoint(String),

    #[error("token storage error: {0}")]
    Storage(String),

    #[error("http error: {0}")]
    Http(String),
}

#[derive(Debug, thiserror::Error)]
pub enum OnairError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("network error: {0}")]
    Network(String),

    #[error("gateway error: {0}")]
    Gateway(String),

    #[error("{0}")]
    Other(String),
}
