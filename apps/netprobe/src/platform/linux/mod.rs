//! Linux-specific functionality
//!
//! - Network link classification from `/sys/class/net`

pub mod network;
