//! Base types and error handling.
//!
//! Foundational types shared by every layer:
//! - [`NetError`]: the crate-wide error taxonomy
//! - [`Host`]: textual node+service endpoint descriptor
//! - [`init`]/[`shutdown`]: process-wide socket-library lifecycle

pub mod error;
pub mod host;
pub mod init;

pub use error::NetError;
pub use host::Host;
pub use init::{init, shutdown};
