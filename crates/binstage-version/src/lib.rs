//! Version parsing, precedence ordering, and constraint matching for release indexes.
//!
//! # Model
//!
//! - [`Version`]: numeric segments, an optional prerelease label, and optional
//!   build metadata (`1.9.8`, `0.15.0-rc2`, `1.9.8+ent.hsm`)
//! - [`Constraints`]: a comma-separated set of operator constraints
//!   (`>= 1.0.0, < 1.0.10`, `~> 1.3`)
//!
//! Build metadata participates in identity (`1.9.8 != 1.9.8+ent.hsm`) but not in
//! precedence, so [`Version`] does not implement `Ord`. Use
//! [`Version::cmp_precedence`] for ordering.

pub use self::constraint::{Constraint, Constraints, Operator};
pub use self::error::{Error, Result};
pub use self::version::Version;

mod constraint;
mod error;
mod version;
