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
pub enum DisplayError {
    #[error("a container is required to mount display surfaces")]
    MissingContainer,

    #[error("missing collaborator: {0}")]
    MissingCollaborator(&'static str),

    #[error("surface creation failed: {0}")]
    SurfaceCreation(String),

    #[error("display has been torn down")]
    Disposed,
}

#[derive(Debug, thiserror::Error)]
pub enum GuestViewError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Display(#[from] DisplayError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}
