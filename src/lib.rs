//! fdiff - line and directory diffing
//!
//! The crate is split into three layers:
//!
//! - `diff`: Myers' shortest edit script over line sequences
//! - `ignore`: gitignore-style exclusion rule chains
//! - `folder`: recursive directory tree comparison
//!
//! The library never touches presentation concerns; the `fdiff` binary is a
//! thin driver around these modules.

pub mod diff;
pub mod folder;
pub mod ignore;
