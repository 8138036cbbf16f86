//! Persistence: the entire application state serialized as one
//! checksummed, compressed blob under a fixed file name.

pub mod error;
pub mod format;
pub mod manager;

pub use error::SaveError;
pub use format::{current_timestamp, AppSave};
pub use manager::{SaveManager, DATA_FILE_NAME};

/// Current save format version.
pub const SAVE_VERSION: u32 = 1;
