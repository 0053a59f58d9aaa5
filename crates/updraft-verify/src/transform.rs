use crate::{Algorithm, AnyHasher, Encoding, Hasher, Result, VerificationError};

/// Pass-through stage that hashes every byte it forwards.
///
/// Only the running hash state is held, never the data, so the transform can
/// sit in a streaming pipeline without adding buffering. At end-of-stream
/// [`finish`](Self::finish) encodes the digest and, unless disabled, compares
/// it against the expected value.
pub struct DigestTransform {
    expected:           String,
    algorithm:          Algorithm,
    encoding:           Encoding,
    hasher:             Option<AnyHasher>,
    actual:             Option<String>,
    validate_on_finish: bool,
}

impl DigestTransform {
    pub fn new(expected: impl Into<String>, algorithm: Algorithm, encoding: Encoding) -> Self {
        Self {
            expected: expected.into(),
            algorithm,
            encoding,
            hasher: Some(algorithm.hasher()),
            actual: None,
            validate_on_finish: true,
        }
    }

    /// sha256 compared as lowercase hex.
    pub fn sha256(expected: impl Into<String>) -> Self {
        Self::new(expected, Algorithm::Sha256, Encoding::Hex)
    }

    /// sha512 with the encoding inferred from the expected value.
    pub fn sha512(expected: impl Into<String>) -> Self {
        let expected = expected.into();
        let encoding = Encoding::detect_sha512(&expected);
        Self::new(expected, Algorithm::Sha512, encoding)
    }

    #[must_use]
    pub fn validate_on_finish(mut self, validate: bool) -> Self {
        self.validate_on_finish = validate;
        self
    }

    /// Feeds `chunk` into the hash and hands it back untouched.
    pub fn update<'a>(&mut self, chunk: &'a [u8]) -> &'a [u8] {
        if let Some(hasher) = self.hasher.as_mut() {
            hasher.update(chunk);
        }
        chunk
    }

    pub fn finish(&mut self) -> Result<()> {
        if let Some(hasher) = self.hasher.take() {
            self.actual = Some(self.encoding.encode(&hasher.finalize()));
        }
        if self.validate_on_finish {
            self.validate()
        } else {
            Ok(())
        }
    }

    pub fn validate(&self) -> Result<()> {
        let actual = self.actual.as_deref().ok_or(VerificationError::NotFinished)?;
        if actual != self.expected {
            return Err(VerificationError::Mismatch {
                algorithm: self.algorithm,
                expected:  self.expected.clone(),
                actual:    actual.to_string(),
            });
        }
        Ok(())
    }

    /// Encoded digest, available once [`finish`](Self::finish) ran.
    pub fn actual(&self) -> Option<&str> { self.actual.as_deref() }

    pub fn expected(&self) -> &str { &self.expected }

    pub fn algorithm(&self) -> Algorithm { self.algorithm }

    pub fn encoding(&self) -> Encoding { self.encoding }
}
