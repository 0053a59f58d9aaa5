use std::fmt;

use sha2::Digest;

pub trait Hasher: Send {
    fn update(&mut self, data: &[u8]);
    fn finalize(self) -> Vec<u8>;
}

pub struct Sha256Hasher(sha2::Sha256);

impl Hasher for Sha256Hasher {
    fn update(&mut self, data: &[u8]) { self.0.update(data); }
    fn finalize(self) -> Vec<u8> { self.0.finalize().to_vec() }
}

impl Default for Sha256Hasher {
    fn default() -> Self { Self::new() }
}

impl Sha256Hasher {
    pub fn new() -> Self { Self(sha2::Sha256::new()) }

    pub fn digest(data: &[u8]) -> Vec<u8> { sha2::Sha256::digest(data).to_vec() }
}

pub struct Sha512Hasher(sha2::Sha512);

impl Hasher for Sha512Hasher {
    fn update(&mut self, data: &[u8]) { self.0.update(data); }
    fn finalize(self) -> Vec<u8> { self.0.finalize().to_vec() }
}

impl Default for Sha512Hasher {
    fn default() -> Self { Self::new() }
}

impl Sha512Hasher {
    pub fn new() -> Self { Self(sha2::Sha512::new()) }

    pub fn digest(data: &[u8]) -> Vec<u8> { sha2::Sha512::digest(data).to_vec() }
}

/// Digest algorithms accepted for artifact verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    Sha256,
    Sha512,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Sha256 => "sha256",
            Algorithm::Sha512 => "sha512",
        }
    }

    /// Digest length in bytes.
    pub fn digest_length(&self) -> usize {
        match self {
            Algorithm::Sha256 => 32,
            Algorithm::Sha512 => 64,
        }
    }

    pub fn hasher(&self) -> AnyHasher {
        match self {
            Algorithm::Sha256 => AnyHasher::Sha256(Sha256Hasher::new()),
            Algorithm::Sha512 => AnyHasher::Sha512(Sha512Hasher::new()),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Runtime-selected hasher.
pub enum AnyHasher {
    Sha256(Sha256Hasher),
    Sha512(Sha512Hasher),
}

impl Hasher for AnyHasher {
    fn update(&mut self, data: &[u8]) {
        match self {
            AnyHasher::Sha256(h) => h.update(data),
            AnyHasher::Sha512(h) => h.update(data),
        }
    }

    fn finalize(self) -> Vec<u8> {
        match self {
            AnyHasher::Sha256(h) => h.finalize(),
            AnyHasher::Sha512(h) => h.finalize(),
        }
    }
}
