// ── Entity tokens ──
//
// Route-safe stand-ins for numeric ids: standard base64 of the decimal
// string (`42` -> `NDI=`). Purely cosmetic. Anyone can decode a token, so
// it must never be treated as an access control boundary.

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Standard alphabet, padded on encode, padding optional on decode.
const ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Opaque textual token for an entity id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityToken(String);

impl EntityToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The id this token stands for.
    pub fn id(&self) -> u64 {
        // Construction already proved the token decodes.
        decode(&self.0).unwrap_or_default()
    }
}

impl fmt::Display for EntityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EntityToken {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode(s).map(encode)
    }
}

impl TryFrom<String> for EntityToken {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<EntityToken> for String {
    fn from(token: EntityToken) -> Self {
        token.0
    }
}

impl From<u64> for EntityToken {
    fn from(id: u64) -> Self {
        encode(id)
    }
}

/// Encode a numeric id.
pub fn encode(id: u64) -> EntityToken {
    EntityToken(ENGINE.encode(id.to_string()))
}

/// Encode an id given as text. Fails unless `raw` is a non-negative integer.
pub fn encode_str(raw: &str) -> Result<EntityToken, CoreError> {
    raw.trim()
        .parse::<u64>()
        .map(encode)
        .map_err(|_| CoreError::InvalidInput(format!("'{raw}' is not an integer id")))
}

/// Decode a token back into its id.
pub fn decode(token: &str) -> Result<u64, CoreError> {
    let invalid = || CoreError::InvalidToken(token.to_owned());

    let bytes = ENGINE.decode(token.trim()).map_err(|_| invalid())?;
    let text = String::from_utf8(bytes).map_err(|_| invalid())?;
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    text.parse().map_err(|_| invalid())
}

/// Accept either a raw numeric id or a token.
///
/// Tokens always start with `M` or `N` (base64 of an ASCII digit), so a
/// string made only of digits is unambiguously an id.
pub fn parse_id_or_token(raw: &str) -> Result<u64, CoreError> {
    let raw = raw.trim();
    if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
        return raw
            .parse()
            .map_err(|_| CoreError::InvalidInput(format!("id '{raw}' is out of range")));
    }
    decode(raw)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        for id in [0, 1, 42, 1_000_000, u64::MAX] {
            assert_eq!(decode(encode(id).as_str()).unwrap(), id);
        }
    }

    #[test]
    fn matches_browser_btoa() {
        assert_eq!(encode(42).as_str(), "NDI=");
        assert_eq!(encode(1).as_str(), "MQ==");
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(matches!(decode("not-valid"), Err(CoreError::InvalidToken(_))));
        // valid base64, but not digits
        assert!(matches!(decode("aGVsbG8="), Err(CoreError::InvalidToken(_))));
        assert!(matches!(decode(""), Err(CoreError::InvalidToken(_))));
    }

    #[test]
    fn missing_padding_is_tolerated() {
        assert_eq!(decode("MQ").unwrap(), 1);
    }

    #[test]
    fn encode_str_rejects_non_integers() {
        assert_eq!(encode_str(" 7 ").unwrap(), encode(7));
        assert!(matches!(encode_str("seven"), Err(CoreError::InvalidInput(_))));
        assert!(matches!(encode_str("-3"), Err(CoreError::InvalidInput(_))));
    }

    #[test]
    fn id_or_token() {
        assert_eq!(parse_id_or_token("42").unwrap(), 42);
        assert_eq!(parse_id_or_token("NDI=").unwrap(), 42);
        assert!(parse_id_or_token("nope!").is_err());
    }

    #[test]
    fn token_serde_validates() {
        let token: EntityToken = serde_json::from_str("\"NDI=\"").unwrap();
        assert_eq!(token.id(), 42);
        assert!(serde_json::from_str::<EntityToken>("\"zzz\"").is_err());
    }
}
