//! Server address validation
//!
//! Server and application addresses are public keys rendered as exactly
//! [`SERVER_ADDRESS_LEN`] hexadecimal characters. Anything else is rejected
//! client-side, before any connect or registration is attempted.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of hexadecimal characters in a server address.
pub const SERVER_ADDRESS_LEN: usize = 66;

/// Number of key bytes behind a server address.
pub const SERVER_ADDRESS_BYTES: usize = SERVER_ADDRESS_LEN / 2;

/// Reasons an address string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// Input was not exactly [`SERVER_ADDRESS_LEN`] characters long.
    #[error("server address must be {expected} hexadecimal characters, got {actual}")]
    InvalidLength {
        /// Required length
        expected: usize,
        /// Length of the rejected input
        actual: usize,
    },

    /// Input contained a character outside `[0-9a-fA-F]`.
    #[error("server address contains non-hexadecimal character {character:?} at position {position}")]
    InvalidCharacter {
        /// Offending character
        character: char,
        /// Zero-based character position
        position: usize,
    },
}

/// A validated 66-character hexadecimal server address.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServerAddress(String);

impl ServerAddress {
    /// Validate user input. Surrounding whitespace is ignored.
    pub fn parse(input: &str) -> Result<Self, AddressError> {
        let trimmed = input.trim();
        let actual = trimmed.chars().count();
        if actual != SERVER_ADDRESS_LEN {
            return Err(AddressError::InvalidLength {
                expected: SERVER_ADDRESS_LEN,
                actual,
            });
        }

        if trimmed.len() != SERVER_ADDRESS_LEN {
            // Multi-byte characters; hex would report byte offsets.
            return Err(first_non_hex(trimmed));
        }

        match hex::decode(trimmed) {
            Ok(_) => Ok(Self(trimmed.to_string())),
            Err(hex::FromHexError::InvalidHexCharacter { c, index }) => {
                Err(AddressError::InvalidCharacter {
                    character: c,
                    position: index,
                })
            }
            Err(_) => Err(first_non_hex(trimmed)),
        }
    }

    /// Address of a raw compressed key.
    pub fn from_key_bytes(bytes: &[u8; SERVER_ADDRESS_BYTES]) -> Self {
        Self(hex::encode(bytes))
    }

    /// The address exactly as it was entered (after trimming).
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Raw key bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        hex::decode(&self.0).unwrap_or_default()
    }

    /// Short form for logs: first and last six characters.
    pub fn abbreviated(&self) -> String {
        let s = &self.0;
        format!("{}…{}", &s[..6], &s[s.len() - 6..])
    }
}

fn first_non_hex(input: &str) -> AddressError {
    let (position, character) = input
        .chars()
        .enumerate()
        .find(|(_, c)| !c.is_ascii_hexdigit())
        .unwrap_or((0, '?'));
    AddressError::InvalidCharacter {
        character,
        position,
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ServerAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ServerAddress {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ServerAddress> for String {
    fn from(address: ServerAddress) -> Self {
        address.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn key_bytes_render_as_lowercase_hex() {
        let mut bytes = [0xab; SERVER_ADDRESS_BYTES];
        bytes[0] = 0x02;
        let address = ServerAddress::from_key_bytes(&bytes);
        assert_eq!(address.as_str(), sample());
        assert_eq!(address.to_bytes(), bytes.to_vec());
    }

    fn sample() -> String {
        format!("02{}", "ab".repeat(32))
    }

    #[test]
    fn accepts_66_hex_characters() {
        let address = ServerAddress::parse(&sample()).unwrap();
        assert_eq!(address.as_str().len(), SERVER_ADDRESS_LEN);
        assert_eq!(address.to_bytes().len(), 33);
    }

    #[test]
    fn accepts_mixed_case_and_trims() {
        let input = format!("  {}  ", "aB".repeat(33));
        let address = ServerAddress::parse(&input).unwrap();
        assert_eq!(address.as_str(), "aB".repeat(33));
    }

    #[test]
    fn rejects_short_and_long_input() {
        assert_eq!(
            ServerAddress::parse("abc"),
            Err(AddressError::InvalidLength {
                expected: 66,
                actual: 3
            })
        );
        let long = "a".repeat(67);
        assert!(matches!(
            ServerAddress::parse(&long),
            Err(AddressError::InvalidLength { actual: 67, .. })
        ));
    }

    #[test]
    fn rejects_non_hex_character_with_position() {
        let mut input = sample();
        input.replace_range(10..11, "g");
        assert_eq!(
            ServerAddress::parse(&input),
            Err(AddressError::InvalidCharacter {
                character: 'g',
                position: 10
            })
        );
    }

    #[test]
    fn rejects_multibyte_characters() {
        let input = format!("é{}", "a".repeat(65));
        assert!(matches!(
            ServerAddress::parse(&input),
            Err(AddressError::InvalidCharacter { character: 'é', .. })
        ));
    }

    #[test]
    fn multibyte_position_counts_characters() {
        let input = format!("{}éé{}", "a".repeat(4), "b".repeat(60));
        assert_eq!(
            ServerAddress::parse(&input),
            Err(AddressError::InvalidCharacter {
                character: 'é',
                position: 4
            })
        );
    }

    #[test]
    fn serde_round_trip_validates() {
        let json = serde_json::to_string(&ServerAddress::parse(&sample()).unwrap()).unwrap();
        let back: ServerAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back.as_str(), sample());
        assert!(serde_json::from_str::<ServerAddress>("\"nothex\"").is_err());
    }

    proptest! {
        #[test]
        fn any_66_hex_string_is_valid(s in "[0-9a-fA-F]{66}") {
            prop_assert!(ServerAddress::parse(&s).is_ok());
        }

        #[test]
        fn wrong_length_is_always_rejected(s in "[0-9a-f]{0,65}|[0-9a-f]{67,80}") {
            let rejected = matches!(
                ServerAddress::parse(&s),
                Err(AddressError::InvalidLength { .. })
            );
            prop_assert!(rejected);
        }

        #[test]
        fn any_non_hex_character_is_rejected(prefix in "[0-9a-f]{0,65}", bad in "[g-zG-Z_!]") {
            let mut s = prefix.clone();
            s.push_str(&bad);
            while s.len() < SERVER_ADDRESS_LEN {
                s.push('0');
            }
            let rejected = matches!(
                ServerAddress::parse(&s),
                Err(AddressError::InvalidCharacter { position, .. }) if position == prefix.len()
            );
            prop_assert!(rejected);
        }
    }
}
