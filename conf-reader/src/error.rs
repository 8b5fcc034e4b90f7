use std::{io, path::PathBuf};

use smol_str::SmolStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfError {
    #[error("Error parsing XML in '{path}': '{source}'")]
    Xml {
        path: String,
        #[source]
        source: quick_xml::Error,
    },
    #[error("Error parsing XML attribute in '{path}': '{source}'")]
    XmlAttribute {
        path: String,
        #[source]
        source: quick_xml::events::attributes::AttrError,
    },
    #[error("Couldn't read '{path}': '{source}'")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Unknown element <{element}> in '{path}'")]
    UnknownElement { element: SmolStr, path: String },
    #[error("<{element}> missing required attribute '{attr}'")]
    MissingAttribute {
        element: SmolStr,
        attr: &'static str,
    },
    #[error("Bad attribute on <{element}>: {source}")]
    BadAttribute {
        element: SmolStr,
        #[source]
        source: fontrules::Error,
    },
    #[error("<{element}> does not accept '{text}'")]
    BadValue { element: SmolStr, text: String },
    #[error("<{element}> expects {expected} child value(s), got {got}")]
    WrongArgCount {
        element: SmolStr,
        expected: usize,
        got: usize,
    },
    #[error("<{element}> is not valid inside <{parent}>")]
    Misplaced { element: SmolStr, parent: SmolStr },
    #[error("Include file '{0}' does not exist")]
    IncludeMissing(PathBuf),
    #[error("Cannot edit custom object '{object}' while scanning")]
    ScanCustomEdit { object: SmolStr },
    #[error(transparent)]
    Value(#[from] fontpat::Error),
    #[error(transparent)]
    Rule(#[from] fontrules::Error),
}
