//! Streaming digest verification for downloaded artifacts.
//!
//! Hashes data incrementally as it moves through a download pipeline, so the
//! bytes are touched once for both hashing and writing.
//!
//! # Example
//!
//! ```
//! use updraft_verify::{DigestTransform, Sha256Hasher};
//!
//! let data = b"hello world";
//! let expected = hex::encode(Sha256Hasher::digest(data));
//!
//! let mut transform = DigestTransform::sha256(expected);
//! let forwarded = transform.update(data);
//! assert_eq!(forwarded, data);
//!
//! transform.finish().unwrap();
//! ```

pub use self::encoding::Encoding;
pub use self::error::{Result, VerificationError};
pub use self::hasher::{Algorithm, AnyHasher, Hasher, Sha256Hasher, Sha512Hasher};
pub use self::transform::DigestTransform;

mod encoding;
mod error;
mod hasher;
mod transform;
