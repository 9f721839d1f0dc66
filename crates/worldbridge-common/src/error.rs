use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum BridgeError {
    IoError(std::io::Error),
    /// The host reports a data version this adapter was not built for.
    VersionMismatch { expected: i32, found: i32 },
    /// A host internal the binding relies on could not be located.
    MissingBinding(String),
    UnsupportedTagKind(String),
    UnsupportedPropertyKind {
        block: String,
        property: String,
        kind: String,
    },
    UnknownBlockType(String),
    UnknownProperty { block: String, property: String },
    IllegalPropertyValue { property: String, value: String },
    MalformedList(String),
    UnsupportedSideEffect(String),
    RegenFailed(String),
    ConfigError(String),
}

impl BridgeError {
    /// Fatal errors mean the adapter cannot serve this host release at all.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BridgeError::VersionMismatch { .. }
                | BridgeError::MissingBinding(_)
                | BridgeError::UnsupportedTagKind(_)
                | BridgeError::UnsupportedPropertyKind { .. }
        )
    }
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeError::IoError(err) => write!(f, "IO error: {}", err),
            BridgeError::VersionMismatch { expected, found } => write!(
                f,
                "Version mismatch: adapter expects data version {}, host reports {}",
                expected, found
            ),
            BridgeError::MissingBinding(name) => {
                write!(f, "Missing host binding: {}", name)
            }
            BridgeError::UnsupportedTagKind(kind) => {
                write!(f, "Unsupported tag kind: {}", kind)
            }
            BridgeError::UnsupportedPropertyKind {
                block,
                property,
                kind,
            } => write!(
                f,
                "Adapter needs an update to support property {} of {} (kind {})",
                property, block, kind
            ),
            BridgeError::UnknownBlockType(block) => write!(f, "Unknown block type: {}", block),
            BridgeError::UnknownProperty { block, property } => {
                write!(f, "Block {} has no property {}", block, property)
            }
            BridgeError::IllegalPropertyValue { property, value } => write!(
                f,
                "Illegal value {} for property {}",
                value, property
            ),
            BridgeError::MalformedList(msg) => write!(f, "Malformed list tag: {}", msg),
            BridgeError::UnsupportedSideEffect(effect) => {
                write!(f, "Side effect not supported by this host: {}", effect)
            }
            BridgeError::RegenFailed(msg) => write!(f, "Regeneration failed: {}", msg),
            BridgeError::ConfigError(msg) => write!(f, "Config error: {}", msg),
        }
    }
}

impl Error for BridgeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BridgeError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for BridgeError {
    fn from(err: std::io::Error) -> Self {
        BridgeError::IoError(err)
    }
}
