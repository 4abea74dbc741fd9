// UI and formatting module

pub mod formatters;
pub mod prompts;

// Re-export commonly used items for cleaner imports
pub use formatters::{format_bool, format_group, format_tier, format_time, format_value, pad};
pub use prompts::{bold, dimmed, error, heading, info, success, warn};
