// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use thiserror::Error;

use crate::sui_serde::{Hex, Readable};

#[cfg(test)]
#[path = "unit_tests/base_types_tests.rs"]
mod base_types_tests;

pub const SUI_ADDRESS_LENGTH: usize = 32;
pub const OBJECT_DIGEST_LENGTH: usize = 32;

/// 0x2
pub const SUI_FRAMEWORK_PACKAGE_ID: ObjectID = ObjectID::from_single_byte(2);

#[derive(Eq, PartialEq, Clone, Debug, Error)]
pub enum ObjectIDParseError {
    #[error("Hex literal has {len} digits, at most {max} are allowed")]
    HexLiteralTooLong { len: usize, max: usize },
    #[error("Hex literal is empty")]
    EmptyHexLiteral,
    #[error("Invalid hex literal {literal:?}: {reason}")]
    InvalidHex { literal: String, reason: String },
}

/// Decode a `0x`-prefixed (or bare) hex literal into a fixed width array,
/// left padding short literals with zeros the way `0x2` means the framework.
pub(crate) fn decode_padded_hex<const N: usize>(
    literal: &str,
) -> Result<[u8; N], ObjectIDParseError> {
    let digits = literal.strip_prefix("0x").unwrap_or(literal);
    if digits.is_empty() {
        return Err(ObjectIDParseError::EmptyHexLiteral);
    }
    if digits.len() > N * 2 {
        return Err(ObjectIDParseError::HexLiteralTooLong {
            len: digits.len(),
            max: N * 2,
        });
    }
    let padded = format!("{:0>width$}", digits, width = N * 2);
    let mut out = [0u8; N];
    hex::decode_to_slice(&padded, &mut out).map_err(|e| ObjectIDParseError::InvalidHex {
        literal: literal.to_string(),
        reason: e.to_string(),
    })?;
    Ok(out)
}

#[serde_as]
#[derive(Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Hash, Default, Serialize, Deserialize)]
pub struct SuiAddress(#[serde_as(as = "Readable<Hex, _>")] [u8; SUI_ADDRESS_LENGTH]);

impl SuiAddress {
    pub const ZERO: Self = Self([0u8; SUI_ADDRESS_LENGTH]);

    pub const fn new(bytes: [u8; SUI_ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn random_for_testing_only() -> Self {
        Self(rand::thread_rng().gen())
    }

    pub fn to_inner(self) -> [u8; SUI_ADDRESS_LENGTH] {
        self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl AsRef<[u8]> for SuiAddress {
    fn as_ref(&self) -> &[u8] {
        &self.0[..]
    }
}

impl TryFrom<&[u8]> for SuiAddress {
    type Error = ObjectIDParseError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; SUI_ADDRESS_LENGTH] =
            bytes.try_into().map_err(|_| ObjectIDParseError::InvalidHex {
                literal: hex::encode(bytes),
                reason: format!("expected {SUI_ADDRESS_LENGTH} bytes, got {}", bytes.len()),
            })?;
        Ok(Self(arr))
    }
}

impl From<ObjectID> for SuiAddress {
    fn from(id: ObjectID) -> Self {
        Self(id.into_bytes())
    }
}

impl FromStr for SuiAddress {
    type Err = ObjectIDParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_padded_hex(s).map(Self)
    }
}

impl fmt::Display for SuiAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for SuiAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

#[serde_as]
#[derive(Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Hash, Default, Serialize, Deserialize)]
pub struct ObjectID(#[serde_as(as = "Readable<Hex, _>")] [u8; SUI_ADDRESS_LENGTH]);

impl ObjectID {
    pub const ZERO: Self = Self([0u8; SUI_ADDRESS_LENGTH]);

    pub const fn new(bytes: [u8; SUI_ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn random() -> Self {
        Self::random_from_rng(&mut rand::thread_rng())
    }

    pub fn random_from_rng<R: rand::RngCore>(rng: &mut R) -> Self {
        let mut bytes = [0u8; SUI_ADDRESS_LENGTH];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub const fn from_single_byte(byte: u8) -> Self {
        let mut bytes = [0u8; SUI_ADDRESS_LENGTH];
        bytes[SUI_ADDRESS_LENGTH - 1] = byte;
        Self(bytes)
    }

    pub const fn into_bytes(self) -> [u8; SUI_ADDRESS_LENGTH] {
        self.0
    }

    /// Accepts both the padded and the short form, with or without `0x`.
    pub fn from_hex_literal(literal: &str) -> Result<Self, ObjectIDParseError> {
        decode_padded_hex(literal).map(Self)
    }

    pub fn to_hex_literal(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl From<SuiAddress> for ObjectID {
    fn from(address: SuiAddress) -> Self {
        Self(address.to_inner())
    }
}

impl FromStr for ObjectID {
    type Err = ObjectIDParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex_literal(s)
    }
}

impl fmt::Display for ObjectID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex_literal())
    }
}

impl fmt::Debug for ObjectID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex_literal())
    }
}

#[derive(
    Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Hash, Default, Debug, Serialize, Deserialize,
)]
pub struct SequenceNumber(u64);

impl SequenceNumber {
    pub const MIN: SequenceNumber = SequenceNumber(u64::MIN);

    pub const fn new() -> Self {
        SequenceNumber(0)
    }

    pub const fn from_u64(u: u64) -> Self {
        SequenceNumber(u)
    }

    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

#[serde_as]
#[derive(Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Hash, Default, Serialize, Deserialize)]
pub struct ObjectDigest(#[serde_as(as = "Readable<Hex, _>")] [u8; OBJECT_DIGEST_LENGTH]);

impl ObjectDigest {
    pub const MIN: ObjectDigest = ObjectDigest([u8::MIN; OBJECT_DIGEST_LENGTH]);

    pub const fn new(digest: [u8; OBJECT_DIGEST_LENGTH]) -> Self {
        Self(digest)
    }
}

impl fmt::Debug for ObjectDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "o#{}", hex::encode(self.0))
    }
}

pub type ObjectRef = (ObjectID, SequenceNumber, ObjectDigest);

pub fn random_object_ref() -> ObjectRef {
    (
        ObjectID::random(),
        SequenceNumber::new(),
        ObjectDigest::new([0; 32]),
    )
}
