//! Command handlers module.
//!
//! - `io.rs`: CSV export and import

mod io;

pub use io::{cmd_export, cmd_import};
