//! Content verification primitives for downloaded releases.
//!
//! A release publishes a checksum manifest (`<hex digest>  <filename>` per
//! artifact) and a detached signature over the manifest's exact bytes. Trust
//! flows in two steps:
//!
//! 1. [`PublicKey::verify_detached`] authenticates the manifest bytes against
//!    an OpenPGP or Ed25519 key.
//! 2. [`ChecksumManifest::digest_for`] yields the authenticated digest that the
//!    artifact's [`Sha256Hasher`] output must equal.
//!
//! # Example
//!
//! ```
//! use binstage_verify::{ChecksumManifest, Hasher, Sha256Hasher};
//!
//! let data = b"hello world";
//! let line = format!("{}  hello.zip\n", hex::encode(Sha256Hasher::digest(data)));
//! let manifest = ChecksumManifest::parse(line.as_bytes()).unwrap();
//!
//! let mut hasher = Sha256Hasher::new();
//! hasher.update(&data[..5]);
//! hasher.update(&data[5..]);
//! assert_eq!(&hasher.finalize(), manifest.digest_for("hello.zip").unwrap());
//! ```

pub use self::error::{Result, VerifyError};
pub use self::hasher::{Hasher, Sha256Hasher};
pub use self::manifest::ChecksumManifest;
pub use self::signature::PublicKey;

mod error;
mod hasher;
mod manifest;
mod signature;
