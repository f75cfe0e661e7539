//! Strongly-typed identifiers used by the command protocol.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CommandError;

/// Stable logical name of a mutable shared resource.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId(String);

/// Encoded identity of a protocol party (the origin of a command).
///
/// The canonical encoding is lowercase ASCII alphanumerics plus `-` and `_`,
/// at most [`PartyAddress::MAX_LEN`] characters. Authenticity is not checked
/// here; that belongs to the channel that delivered the command.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PartyAddress(String);

/// Correlation identifier of the network request that carries a command.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RequestCid(String);

macro_rules! impl_str_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl TryFrom<String> for $t {
            type Error = CommandError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::validate(&value)
                    .map_err(|reason| CommandError::malformed(format!("{}: {}", $name, reason)))?;
                Ok(Self(value))
            }
        }

        impl FromStr for $t {
            type Err = CommandError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::try_from(s.to_string())
            }
        }
    };
}

impl_str_newtype!(ObjectId, "ObjectId");
impl_str_newtype!(PartyAddress, "PartyAddress");
impl_str_newtype!(RequestCid, "RequestCid");

impl ObjectId {
    pub fn new(id: impl Into<String>) -> Result<Self, CommandError> {
        Self::try_from(id.into())
    }

    fn validate(value: &str) -> Result<(), &'static str> {
        if value.is_empty() {
            return Err("object id cannot be empty");
        }
        Ok(())
    }
}

impl PartyAddress {
    pub const MAX_LEN: usize = 64;

    /// Decode a party identity from its canonical string form.
    pub fn from_encoded_str(encoded: &str) -> Result<Self, CommandError> {
        encoded.parse()
    }

    fn validate(value: &str) -> Result<(), &'static str> {
        if value.is_empty() {
            return Err("encoding cannot be empty");
        }
        if value.len() > Self::MAX_LEN {
            return Err("encoding is too long");
        }
        let canonical = value
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_');
        if !canonical {
            return Err("encoding is not canonical");
        }
        Ok(())
    }
}

/// Namespace for name-based (UUIDv5) request ids.
const CID_NAMESPACE: Uuid = Uuid::from_u128(0x6f0c_5e1a_2b7d_4c3e_9a41_d2f8_07b3_5c19);

impl RequestCid {
    pub fn new(cid: impl Into<String>) -> Result<Self, CommandError> {
        Self::try_from(cid.into())
    }

    /// Derive a cid from a command type tag and its canonical content.
    ///
    /// Identical inputs always produce the same cid, so a resent command keeps
    /// its correlation id.
    pub fn derive(command_type: &str, content: &[u8]) -> Self {
        let mut name = Vec::with_capacity(command_type.len() + 1 + content.len());
        name.extend_from_slice(command_type.as_bytes());
        name.push(0);
        name.extend_from_slice(content);
        Self(Uuid::new_v5(&CID_NAMESPACE, &name).to_string())
    }

    fn validate(value: &str) -> Result<(), &'static str> {
        if value.trim().is_empty() {
            return Err("cid cannot be empty");
        }
        Ok(())
    }
}

/// Version token of one immutable snapshot of a shared object.
///
/// Versions are opaque: they are compared for equality (and ordered only so
/// they can live in sorted sets), never used arithmetically. On the wire a
/// version is either a JSON integer (any `i64`, negatives included) or a JSON
/// string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Version {
    Number(i64),
    Token(String),
}

impl core::fmt::Display for Version {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Version::Number(n) => write!(f, "{n}"),
            Version::Token(t) => f.write_str(t),
        }
    }
}

impl From<i64> for Version {
    fn from(value: i64) -> Self {
        Version::Number(value)
    }
}

impl From<&str> for Version {
    fn from(value: &str) -> Self {
        Version::Token(value.to_string())
    }
}

impl From<String> for Version {
    fn from(value: String) -> Self {
        Version::Token(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn party_address_round_trips_through_its_encoding() {
        let addr = PartyAddress::from_encoded_str("lbr1p7ujcndcl7nudzwt8fglhx6wxn08kgs5tm6mz4").unwrap();
        let again = PartyAddress::from_encoded_str(addr.as_str()).unwrap();
        assert_eq!(addr, again);
    }

    #[test]
    fn party_address_rejects_non_canonical_encodings() {
        let too_long = "a".repeat(65);
        for bad in ["", "UPPER", "has space", "caf\u{e9}", too_long.as_str()] {
            let err = PartyAddress::from_encoded_str(bad).unwrap_err();
            match err {
                CommandError::MalformedData(_) => {}
                other => panic!("Expected MalformedData for {bad:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn party_address_deserialization_validates() {
        let ok: PartyAddress = serde_json::from_str("\"vasp-a\"").unwrap();
        assert_eq!(ok.as_str(), "vasp-a");
        assert!(serde_json::from_str::<PartyAddress>("\"Vasp A\"").is_err());
    }

    #[test]
    fn object_id_cannot_be_empty() {
        assert!(ObjectId::new("").is_err());
        assert_eq!(ObjectId::new("payment-1").unwrap().as_str(), "payment-1");
    }

    #[test]
    fn versions_serialize_as_plain_numbers_or_strings() {
        assert_eq!(serde_json::to_string(&Version::from(5)).unwrap(), "5");
        assert_eq!(serde_json::to_string(&Version::from("v_a")).unwrap(), "\"v_a\"");

        let n: Version = serde_json::from_str("12").unwrap();
        let t: Version = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(n, Version::Number(12));
        assert_eq!(t, Version::Token("abc".to_string()));

        assert!(serde_json::from_str::<Version>("1.5").is_err());
        assert!(serde_json::from_str::<Version>("{}").is_err());
    }

    #[test]
    fn negative_integer_versions_are_accepted() {
        let v: Version = serde_json::from_str("-3").unwrap();
        assert_eq!(v, Version::Number(-3));
        assert_eq!(serde_json::to_string(&v).unwrap(), "-3");
        assert_eq!(v.to_string(), "-3");
    }

    #[test]
    fn derived_cids_are_deterministic_and_content_sensitive() {
        let a = RequestCid::derive("Payment", b"{\"x\":1}");
        let b = RequestCid::derive("Payment", b"{\"x\":1}");
        let c = RequestCid::derive("Payment", b"{\"x\":2}");
        let d = RequestCid::derive("Refund", b"{\"x\":1}");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }
}
