use core::fmt;
use std::fmt::Display;
use std::str::FromStr;

use hex::FromHex;
use quickcheck::Arbitrary;
use serde::{Deserialize, Serialize};

/// A [`serde`]-compatible wrapper around a hex-encoded byte sequence (of
/// arbitrary length) with `0x` prefix. Parsing and deserializing from hex
/// strings without the `0x` prefix is also allowed.
///
/// You should generally try to avoid using this type directly, and instead
/// alias it to something more descriptive for its intended use case, possibly
/// by enforcing a specific length.
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::From)]
pub struct HexString<T>(pub T);

impl<T: ToOwned> HexString<T> {
    pub fn owned(&self) -> HexString<T::Owned>
    where
        T: ToOwned,
    {
        HexString(self.0.to_owned())
    }
}

impl<T: AsRef<[u8]>> HexString<T> {
    /// The raw bytes behind the hex representation.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl<T: AsRef<[u8]>> Display for HexString<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0.as_ref()))
    }
}

impl<T: AsRef<[u8]>> Serialize for HexString<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(&self)
    }
}

impl<T: FromHex> FromStr for HexString<T> {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // The `0x` prefix is optional.
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        FromHex::from_hex(stripped)
            .map(Self)
            .map_err(|_| "invalid hex string")
    }
}

impl<'a, T: FromHex> Deserialize<'a> for HexString<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'a>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl<T: Arbitrary> Arbitrary for HexString<T> {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        Self(T::arbitrary(g))
    }
}

#[cfg(test)]
mod tests {
    use quickcheck_macros::quickcheck;

    use super::*;

    #[quickcheck]
    fn serde_roundtrip(hex_string: HexString<Vec<u8>>) -> bool {
        let json = serde_json::to_string(&hex_string).unwrap();
        let hex_string2: HexString<Vec<u8>> = serde_json::from_str(&json).unwrap();

        hex_string == hex_string2
    }

    #[quickcheck]
    fn always_starts_with_0x(hex_string: HexString<Vec<u8>>) -> bool {
        hex_string.to_string().starts_with("0x")
    }

    #[test]
    fn decodable_without_0x() {
        let hex_string: HexString<Vec<u8>> = "deadbeef".parse().unwrap();
        assert_eq!(hex_string.to_string(), "0xdeadbeef");
    }

    #[quickcheck]
    fn from_str_roundtrip(hex_string: HexString<Vec<u8>>) -> bool {
        let string = hex_string.to_string();
        let hex_string2: HexString<Vec<u8>> = string.parse().unwrap();

        hex_string == hex_string2
    }

    #[test]
    fn fixed_width_rejects_wrong_length() {
        assert!("0xdeadbeef".parse::<HexString<[u8; 32]>>().is_err());
    }
}
