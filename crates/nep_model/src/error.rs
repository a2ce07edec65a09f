use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Duplicate {kind} name '{name}'")]
    DuplicateName { kind: &'static str, name: String },

    #[error("Empty {kind} name")]
    EmptyName { kind: &'static str },

    #[error("Unknown dimension id {0}")]
    UnknownDimension(usize),

    #[error("Unknown variable id {0}")]
    UnknownVariable(usize),

    #[error("Dimension '{name}' already exists with length {existing}, requested {requested}")]
    DimensionLengthMismatch {
        name: String,
        existing: usize,
        requested: usize,
    },

    #[error(
        "Attribute '{name}' has {bytes} value bytes, not a multiple of its {element_size}-byte element"
    )]
    AttributeLength {
        name: String,
        bytes: usize,
        element_size: usize,
    },
}

pub type Result<T> = std::result::Result<T, ModelError>;
