use chainkit_common::{
    artifacts::ArtifactError, params::ParamError, toolkit_config::ConfigError,
};

#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("Argument error: {0}")]
    Argument(String),
    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactError),
    #[error("Params error: {0}")]
    Params(#[from] ParamError),
    #[error("Config error: {0}")]
    Config(String),
    #[error("Transaction error: {0}")]
    Transaction(String),
    #[error("Verification error: {0}")]
    Verification(String),
}

impl From<ConfigError> for TaskError {
    fn from(err: ConfigError) -> Self {
        TaskError::Config(err.to_string())
    }
}
