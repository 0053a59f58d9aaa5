use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Text encoding of a finalized digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Hex,
    Base64,
}

impl Encoding {
    pub fn encode(&self, digest: &[u8]) -> String {
        match self {
            Encoding::Hex => hex::encode(digest),
            Encoding::Base64 => STANDARD.encode(digest),
        }
    }

    /// Guesses how an expected sha512 value was written.
    ///
    /// A 128-character value is hex unless it contains `+`, `=` or `Z`,
    /// none of which appear in lowercase hex. Anything else is base64.
    pub fn detect_sha512(expected: &str) -> Self {
        let looks_hex = expected.len() == 128
            && !expected.contains('+')
            && !expected.contains('Z')
            && !expected.contains('=');
        if looks_hex { Encoding::Hex } else { Encoding::Base64 }
    }
}
