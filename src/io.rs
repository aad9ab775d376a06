//! Input/output.

pub mod binary;
pub mod util;
