use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

const MIN_ADDRESS_LEN: usize = 32;
const MAX_ADDRESS_LEN: usize = 44;

/// Base58 account address identifying a token mint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssetAddress(String);

impl AssetAddress {
    /// Parse and validate an address. Base58 is case-sensitive, so no normalization
    /// beyond trimming is applied.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyAddress);
        }

        let len = trimmed.chars().count();
        if !(MIN_ADDRESS_LEN..=MAX_ADDRESS_LEN).contains(&len) {
            return Err(ValidationError::AddressLength {
                len,
                min: MIN_ADDRESS_LEN,
                max: MAX_ADDRESS_LEN,
            });
        }

        for (index, ch) in trimmed.chars().enumerate() {
            if !is_base58(ch) {
                return Err(ValidationError::AddressInvalidChar { ch, index });
            }
        }

        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_base58(ch: char) -> bool {
    ch.is_ascii_alphanumeric() && !matches!(ch, '0' | 'O' | 'I' | 'l')
}

impl Display for AssetAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for AssetAddress {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AssetAddress> for String {
    fn from(value: AssetAddress) -> Self {
        value.0
    }
}
