pub mod appender;

pub use appender::LogAppender;
