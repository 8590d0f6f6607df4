pub type CuelineResult<T> = Result<T, CuelineError>;

#[derive(thiserror::Error, Debug)]
pub enum CuelineError {
    #[error("out of range: {0}")]
    OutOfRange(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl CuelineError {
    pub fn out_of_range(msg: impl Into<String>) -> Self {
        Self::OutOfRange(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}
