use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Scenario error: {0}")]
    Scenario(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ClassifierError {
    pub fn invalid_argument<T>(msg: impl Into<String>) -> Result<T> {
        Err(ClassifierError::InvalidArgument(msg.into()))
    }
}

pub type Result<T> = std::result::Result<T, ClassifierError>;

#[macro_export]
macro_rules! classifier_error {
    (invalid_argument, $($arg:tt)*) => {
        $crate::error::ClassifierError::InvalidArgument(format!($($arg)*))
    };
    (scenario, $($arg:tt)*) => {
        $crate::error::ClassifierError::Scenario(format!($($arg)*))
    };
    (internal, $($arg:tt)*) => {
        $crate::error::ClassifierError::Internal(format!($($arg)*))
    };
}
