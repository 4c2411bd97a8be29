//! Event handlers that react to application events.

pub mod json_lines;
