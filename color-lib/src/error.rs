use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ColorError {
    #[error("unknown color model '{0}'")]
    UnknownModel(String),

    #[error("'{0}' is not a #rrggbb color")]
    InvalidHex(String),
}
