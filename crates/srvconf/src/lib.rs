//! Command-line tools for server configuration files.
//!
//! - `srvconf-check`: report undeclared variables and invalid values
//!
//! # Example Usage
//!
//! ```bash
//! srvconf-check --root . src/main/liberty/config/server.xml
//! srvconf-check --format json --unknown-keys
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cmd;
pub mod report;
