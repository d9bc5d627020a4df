//! Lookup input handling.
//!
//! Client-side validation of user-entered IP addresses and hostnames.
//! Rejected input never reaches the network.

pub mod validate;

pub use validate::{is_valid_hostname, is_valid_ipv4, is_valid_ipv6, IpKind};
