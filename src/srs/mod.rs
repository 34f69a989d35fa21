pub mod sm2;

pub use sm2::{calculate_sm2, review_message, Sm2Result, Sm2State, DEFAULT_EASE_FACTOR, MAX_INTERVAL};
