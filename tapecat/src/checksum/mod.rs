//! File checksums.
//!
//! A file may carry several checksums of different types. Two blobs agree
//! only if they hold exactly the same set of types and every value matches.
//!
//! ## Textual form
//!
//! A blob is written as a comma-separated list of `TYPE:HEX` pairs, for
//! example `ADLER32:0a0b0c0d,MD5:d41d8cd98f00b204e9800998ecf8427e`. Type
//! names are case-insensitive and hexadecimal values may carry a `0x`
//! prefix. Values of the 32-bit types may be shorter than 8 digits and are
//! then zero-padded on the left.


use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use displaydoc::Display;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{de, ser::SerializeMap, Deserialize, Serialize};

use crate::error::{TapecatError, TapecatResult};

lazy_static! {
    static ref CHECKSUM_REGEX: Regex =
        Regex::new(r"^([A-Za-z0-9]+):(?:0[xX])?([0-9A-Fa-f]+)$").unwrap();
}

/// A checksum algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChecksumType {
    Adler32,
    Crc32,
    Crc32c,
    Md5,
    Sha1,
}

/// A set of checksums of one file, at most one per type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChecksumBlob {
    checksums: BTreeMap<ChecksumType, Vec<u8>>,
}

/// A checksum error.
#[derive(Debug, Display)]
pub enum Error {
    /// Checksum type "{0}" is not supported.
    UnsupportedChecksumType(String),

    /// Malformed checksum "{0}", expected TYPE:HEX.
    MalformedChecksum(String),

    /// Invalid hexadecimal checksum value: {0}
    InvalidHex(hex::FromHexError),

    /// Invalid length for {typ} checksum: expected {expected} bytes, got {actual}.
    InvalidValueLength {
        typ: ChecksumType,
        expected: usize,
        actual: usize,
    },

    /// The blob holds more than one {0} checksum.
    DuplicateChecksumType(ChecksumType),

    /// Checksum type mismatch: expected [{expected}], got [{actual}].
    TypeMismatch { expected: String, actual: String },

    /// {typ} checksum mismatch: expected {expected}, got {actual}.
    ValueMismatch {
        typ: ChecksumType,
        expected: String,
        actual: String,
    },
}

impl ChecksumType {
    /// Returns the canonical name of the checksum type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Adler32 => "ADLER32",
            Self::Crc32 => "CRC32",
            Self::Crc32c => "CRC32C",
            Self::Md5 => "MD5",
            Self::Sha1 => "SHA1",
        }
    }

    /// Returns the length of a value of this type, in bytes.
    pub fn value_len(&self) -> usize {
        match self {
            Self::Adler32 | Self::Crc32 | Self::Crc32c => 4,
            Self::Md5 => 16,
            Self::Sha1 => 20,
        }
    }
}

impl FromStr for ChecksumType {
    type Err = TapecatError;

    fn from_str(s: &str) -> TapecatResult<Self> {
        match s.to_ascii_uppercase().as_str() {
            "ADLER32" => Ok(Self::Adler32),
            "CRC32" => Ok(Self::Crc32),
            "CRC32C" => Ok(Self::Crc32c),
            "MD5" => Ok(Self::Md5),
            "SHA1" => Ok(Self::Sha1),
            _ => Err(Error::UnsupportedChecksumType(s.to_owned()).into()),
        }
    }
}

impl Display for ChecksumType {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ChecksumBlob {
    /// Creates an empty blob.
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience function to create a blob holding a single Adler-32 checksum.
    pub fn adler32(value: u32) -> Self {
        let mut checksums = BTreeMap::new();
        checksums.insert(ChecksumType::Adler32, value.to_be_bytes().to_vec());
        Self { checksums }
    }

    /// Adds a checksum, replacing any existing one of the same type.
    pub fn insert(&mut self, typ: ChecksumType, value: Vec<u8>) -> TapecatResult<()> {
        if value.len() != typ.value_len() {
            return Err(Error::InvalidValueLength {
                typ,
                expected: typ.value_len(),
                actual: value.len(),
            }
            .into());
        }

        self.checksums.insert(typ, value);
        Ok(())
    }

    /// Adds a checksum given in hexadecimal.
    pub fn insert_hex(&mut self, typ: ChecksumType, value: &str) -> TapecatResult<()> {
        let value = value
            .strip_prefix("0x")
            .or_else(|| value.strip_prefix("0X"))
            .unwrap_or(value);

        let padded;
        let value = if value.len() < typ.value_len() * 2 && typ.value_len() == 4 {
            padded = format!("{:0>8}", value);
            padded.as_str()
        } else {
            value
        };

        let bytes = hex::decode(value).map_err(Error::InvalidHex)?;
        self.insert(typ, bytes)
    }

    /// Returns the value of a checksum type, if present.
    pub fn get(&self, typ: ChecksumType) -> Option<&[u8]> {
        self.checksums.get(&typ).map(|v| v.as_slice())
    }

    /// Returns the checksum types in the blob, in a stable order.
    pub fn types(&self) -> impl Iterator<Item = ChecksumType> + '_ {
        self.checksums.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.checksums.is_empty()
    }

    pub fn len(&self) -> usize {
        self.checksums.len()
    }

    /// Checks that another blob describes the same contents as this one.
    ///
    /// `self` holds the expected checksums. The type sets are compared
    /// first, so a blob carrying an extra or a missing type is a type
    /// mismatch even when the common values agree.
    pub fn validate(&self, actual: &Self) -> TapecatResult<()> {
        if !self.types().eq(actual.types()) {
            return Err(Error::TypeMismatch {
                expected: self.type_list(),
                actual: actual.type_list(),
            }
            .into());
        }

        for (typ, expected) in &self.checksums {
            let value = &actual.checksums[typ];
            if value != expected {
                return Err(Error::ValueMismatch {
                    typ: *typ,
                    expected: hex::encode(expected),
                    actual: hex::encode(value),
                }
                .into());
            }
        }

        Ok(())
    }

    fn type_list(&self) -> String {
        self.types()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl Display for ChecksumBlob {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let mut first = true;
        for (typ, value) in &self.checksums {
            if !first {
                f.write_str(",")?;
            }
            write!(f, "{}:{}", typ, hex::encode(value))?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for ChecksumBlob {
    type Err = TapecatError;

    fn from_str(s: &str) -> TapecatResult<Self> {
        let mut blob = Self::new();
        if s.is_empty() {
            return Ok(blob);
        }

        for part in s.split(',') {
            let captures = CHECKSUM_REGEX
                .captures(part.trim())
                .ok_or_else(|| Error::MalformedChecksum(part.to_owned()))?;

            let typ: ChecksumType = captures[1].parse()?;
            if blob.checksums.contains_key(&typ) {
                return Err(Error::DuplicateChecksumType(typ).into());
            }

            blob.insert_hex(typ, &captures[2])?;
        }

        Ok(blob)
    }
}

impl Serialize for ChecksumBlob {
    /// Serializes the blob into a map of type names to hexadecimal values.
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.checksums.len()))?;
        for (typ, value) in &self.checksums {
            map.serialize_entry(typ.as_str(), &hex::encode(value))?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ChecksumBlob {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        use de::Error;

        let raw = BTreeMap::<String, String>::deserialize(deserializer)?;
        let mut blob = Self::new();
        for (typ, value) in raw {
            let typ: ChecksumType = typ.parse().map_err(|e| Error::custom(format!("{}", e)))?;
            blob.insert_hex(typ, &value)
                .map_err(|e| Error::custom(format!("{}", e)))?;
        }

        Ok(blob)
    }
}
