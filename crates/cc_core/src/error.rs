use std::fmt;

#[derive(Debug)]
pub enum CoreError {
    Validation(String),
    NotFound(String),
    InvalidParameter(String),
    InsufficientBalance { requested: f64, available: f64 },
}

#[derive(Debug)]
pub enum EngineError {
    InvalidStage { expected: &'static str, found: &'static str },
    SelectionRequired(&'static str),
    InvalidSelection(String),
    InvalidEvent(String),
    NothingToUndo,
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CoreError::Validation(msg) => write!(f, "Validation error: {}", msg),
            CoreError::NotFound(msg) => write!(f, "Not found: {}", msg),
            CoreError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            CoreError::InsufficientBalance { requested, available } => {
                write!(
                    f,
                    "Insufficient balance: requested {:.2}, available {:.2}",
                    requested, available
                )
            }
        }
    }
}

impl std::error::Error for CoreError {}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EngineError::InvalidStage { expected, found } => {
                write!(f, "Invalid stage: expected {}, found {}", expected, found)
            }
            EngineError::SelectionRequired(slot) => {
                write!(f, "Selection required: {}", slot)
            }
            EngineError::InvalidSelection(msg) => write!(f, "Invalid selection: {}", msg),
            EngineError::InvalidEvent(msg) => write!(f, "Invalid ball event: {}", msg),
            EngineError::NothingToUndo => write!(f, "Nothing to undo in this over"),
        }
    }
}

impl std::error::Error for EngineError {}

pub type Result<T> = std::result::Result<T, CoreError>;
pub type EngineResult<T> = std::result::Result<T, EngineError>;
