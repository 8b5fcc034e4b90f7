use smol_str::SmolStr;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("No object is named '{0}'")]
    UnknownObject(SmolStr),
    #[error("No constant is named '{0}'")]
    UnknownConstant(SmolStr),
    #[error("Unparsable value '{value}' for '{object}'")]
    BadValue { object: SmolStr, value: String },
    #[error("Unparsable charset fragment '{0}'")]
    BadCharSet(String),
    #[error("Codepoint {0:#x} is out of range")]
    CodepointOutOfRange(u32),
    #[error("Malformed pattern string at '{0}'")]
    BadName(String),
}
