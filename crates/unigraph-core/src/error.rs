use thiserror::Error;

/// Settings could not be loaded.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

/// A wide-integer literal that could not be coerced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WideIntError {
    #[error("Invalid BigInt literal {input:?}: {reason}")]
    Malformed { input: String, reason: String },

    #[error("BigInt literal {input:?} does not fit in 64 bits")]
    OutOfRange { input: String },
}
