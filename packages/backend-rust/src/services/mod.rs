pub mod achievement_check;
pub mod progress;
