//! Digest algorithms and incremental accumulators

use crate::error::Error;
use crate::Result;
use digest::DynDigest;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// A supported message digest algorithm
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Deserialize)]
#[serde(try_from = "String")]
#[allow(non_camel_case_types)]
pub enum DigestAlgorithm {
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
    Sha512_224,
    Sha512_256,
    Sha3_224,
    Sha3_256,
    Sha3_384,
    Sha3_512,
    Blake3,
}

impl DigestAlgorithm {
    /// Every supported algorithm, in canonical order
    pub const ALL: [DigestAlgorithm; 13] = [
        DigestAlgorithm::Md5,
        DigestAlgorithm::Sha1,
        DigestAlgorithm::Sha224,
        DigestAlgorithm::Sha256,
        DigestAlgorithm::Sha384,
        DigestAlgorithm::Sha512,
        DigestAlgorithm::Sha512_224,
        DigestAlgorithm::Sha512_256,
        DigestAlgorithm::Sha3_224,
        DigestAlgorithm::Sha3_256,
        DigestAlgorithm::Sha3_384,
        DigestAlgorithm::Sha3_512,
        DigestAlgorithm::Blake3,
    ];

    /// Canonical lowercase name
    pub fn name(&self) -> &'static str {
        match self {
            DigestAlgorithm::Md5 => "md5",
            DigestAlgorithm::Sha1 => "sha1",
            DigestAlgorithm::Sha224 => "sha224",
            DigestAlgorithm::Sha256 => "sha256",
            DigestAlgorithm::Sha384 => "sha384",
            DigestAlgorithm::Sha512 => "sha512",
            DigestAlgorithm::Sha512_224 => "sha512_224",
            DigestAlgorithm::Sha512_256 => "sha512_256",
            DigestAlgorithm::Sha3_224 => "sha3_224",
            DigestAlgorithm::Sha3_256 => "sha3_256",
            DigestAlgorithm::Sha3_384 => "sha3_384",
            DigestAlgorithm::Sha3_512 => "sha3_512",
            DigestAlgorithm::Blake3 => "blake3",
        }
    }

    /// Hierarchical tag components the digest is recorded under
    pub fn tag_components(&self) -> &'static [&'static str] {
        match self {
            DigestAlgorithm::Md5 => &["MD5"],
            DigestAlgorithm::Sha1 => &["SHA", "1"],
            DigestAlgorithm::Sha224 => &["SHA", "2", "224"],
            DigestAlgorithm::Sha256 => &["SHA", "2", "256"],
            DigestAlgorithm::Sha384 => &["SHA", "2", "384"],
            DigestAlgorithm::Sha512 => &["SHA", "2", "512"],
            DigestAlgorithm::Sha512_224 => &["SHA", "2", "512", "224"],
            DigestAlgorithm::Sha512_256 => &["SHA", "2", "512", "256"],
            DigestAlgorithm::Sha3_224 => &["SHA", "3", "224"],
            DigestAlgorithm::Sha3_256 => &["SHA", "3", "256"],
            DigestAlgorithm::Sha3_384 => &["SHA", "3", "384"],
            DigestAlgorithm::Sha3_512 => &["SHA", "3", "512"],
            DigestAlgorithm::Blake3 => &["BLAKE", "3"],
        }
    }

    /// Digest size in bytes
    pub fn output_len(&self) -> usize {
        match self {
            DigestAlgorithm::Md5 => 16,
            DigestAlgorithm::Sha1 => 20,
            DigestAlgorithm::Sha224 | DigestAlgorithm::Sha512_224 | DigestAlgorithm::Sha3_224 => {
                28
            }
            DigestAlgorithm::Sha256
            | DigestAlgorithm::Sha512_256
            | DigestAlgorithm::Sha3_256
            | DigestAlgorithm::Blake3 => 32,
            DigestAlgorithm::Sha384 | DigestAlgorithm::Sha3_384 => 48,
            DigestAlgorithm::Sha512 | DigestAlgorithm::Sha3_512 => 64,
        }
    }

    /// Fresh accumulator for this algorithm
    pub fn accumulator(&self) -> Accumulator {
        let inner: Box<dyn DynDigest + Send> = match self {
            DigestAlgorithm::Md5 => Box::new(md5::Md5::default()),
            DigestAlgorithm::Sha1 => Box::new(sha1::Sha1::default()),
            DigestAlgorithm::Sha224 => Box::new(sha2::Sha224::default()),
            DigestAlgorithm::Sha256 => Box::new(sha2::Sha256::default()),
            DigestAlgorithm::Sha384 => Box::new(sha2::Sha384::default()),
            DigestAlgorithm::Sha512 => Box::new(sha2::Sha512::default()),
            DigestAlgorithm::Sha512_224 => Box::new(sha2::Sha512_224::default()),
            DigestAlgorithm::Sha512_256 => Box::new(sha2::Sha512_256::default()),
            DigestAlgorithm::Sha3_224 => Box::new(sha3::Sha3_224::default()),
            DigestAlgorithm::Sha3_256 => Box::new(sha3::Sha3_256::default()),
            DigestAlgorithm::Sha3_384 => Box::new(sha3::Sha3_384::default()),
            DigestAlgorithm::Sha3_512 => Box::new(sha3::Sha3_512::default()),
            DigestAlgorithm::Blake3 => {
                return Accumulator {
                    algorithm: *self,
                    state: State::Blake3(Box::new(blake3::Hasher::new())),
                }
            }
        };

        Accumulator {
            algorithm: *self,
            state: State::Dyn(inner),
        }
    }

    /// Digest a fully materialized buffer
    pub fn digest(&self, data: &[u8]) -> Digest {
        let mut acc = self.accumulator();
        acc.update(data);
        acc.finalize()
    }
}

impl FromStr for DigestAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        DigestAlgorithm::ALL
            .iter()
            .copied()
            .find(|alg| alg.name() == normalized)
            .ok_or_else(|| Error::UnsupportedDigest(s.to_string()))
    }
}

impl TryFrom<String> for DigestAlgorithm {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parse a list of algorithm names, dropping repeats but keeping first-seen order
pub fn parse_selection<S: AsRef<str>>(names: &[S]) -> Result<Vec<DigestAlgorithm>> {
    let mut selected = Vec::with_capacity(names.len());
    for name in names {
        let alg: DigestAlgorithm = name.as_ref().parse()?;
        if !selected.contains(&alg) {
            selected.push(alg);
        }
    }
    Ok(selected)
}

/// A finalized digest
#[derive(Clone, Hash, Eq, PartialEq)]
pub struct Digest {
    algorithm: DigestAlgorithm,
    bytes: Vec<u8>,
}

impl Digest {
    /// Algorithm that produced this digest
    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Raw digest bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Lowercase hex encoding
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({}:{})", self.algorithm, self.to_hex())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.algorithm, self.to_hex())
    }
}

enum State {
    Dyn(Box<dyn DynDigest + Send>),
    Blake3(Box<blake3::Hasher>),
}

/// Sequential accumulator for one algorithm, fed chunk by chunk
pub struct Accumulator {
    algorithm: DigestAlgorithm,
    state: State,
}

impl Accumulator {
    /// Update the digest with more data
    pub fn update(&mut self, data: &[u8]) {
        match &mut self.state {
            State::Dyn(inner) => inner.update(data),
            State::Blake3(inner) => {
                inner.update(data);
            }
        }
    }

    /// Finalize and return the digest
    pub fn finalize(self) -> Digest {
        let bytes = match self.state {
            State::Dyn(inner) => inner.finalize().into_vec(),
            State::Blake3(inner) => inner.finalize().as_bytes().to_vec(),
        };
        Digest {
            algorithm: self.algorithm,
            bytes,
        }
    }
}
