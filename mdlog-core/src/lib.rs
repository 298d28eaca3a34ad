pub mod config;
pub mod entry;
pub mod error;
pub mod record;
pub mod timestamp;

pub use config::ServerConfig;
pub use entry::{LogEntry, LOG_FILE_NAME, UNRESOLVED_MARKER};
pub use error::{ErrorKind, MdlogError};
pub use record::LogRecord;
