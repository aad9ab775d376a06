//! Golden-data generation for 3D affine and projective matrix math.
//!
//! Every supported geometric operation has a [`FixtureKind`] with a fixed
//! binary [`schema`](schema::FixtureSchema). For each kind, random inputs are
//! drawn, the reference result is computed in double precision and the
//! input/output pair is appended to a fixture file that other matrix
//! implementations can be validated against.

#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]
#![warn(clippy::cast_lossless)]

#[macro_use]
mod macros;

pub mod config;
pub mod generate;
pub mod io;
pub mod kind;
pub mod record;
pub mod reference;
pub mod sample;
pub mod schema;
pub mod verify;

pub use kind::FixtureKind;
pub use record::FixtureRecord;
