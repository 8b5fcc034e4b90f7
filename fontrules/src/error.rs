use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("Custom object table is full")]
    CustomObjectOverflow,
    #[error("'{0}' is not a known match target")]
    BadMatchKind(String),
    #[error("'{0}' is not a known qualifier")]
    BadQualifier(String),
    #[error("'{0}' is not a known edit mode")]
    BadEditOp(String),
    #[error("'{0}' is not a known comparison")]
    BadCompare(String),
    #[error("'{0}' is not a known binding")]
    BadBinding(String),
}
