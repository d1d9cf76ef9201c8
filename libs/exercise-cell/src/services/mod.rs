pub mod analytics;
pub mod progress;
pub mod streak;
