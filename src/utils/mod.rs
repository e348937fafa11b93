//! Utility functions and helpers.

pub mod html;
pub mod http;
pub mod log_file;
pub mod url;

#[cfg(test)]
pub(crate) mod test_server;
