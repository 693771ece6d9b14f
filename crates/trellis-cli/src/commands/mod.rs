pub mod discover;
pub mod missing;
