//! SMPP-style phone number addressing.
//!
//! A raw address string is classified into an [`AddressedPhoneNumber`]:
//! the stored digits plus a [`TypeOfNumber`] and a [`NumberingPlanIndicator`].
//! [`PhoneNumberClassifier`] implements the classification rules;
//! [`PhoneNumberTranslator`] applies them for one [`AddressRole`] and enforces
//! what that role accepts.

use serde::{Deserialize, Serialize};

mod classifier;
mod translator;

pub use classifier::{ClassifierRules, PhoneNumberClassifier};
pub use translator::PhoneNumberTranslator;

/// Type of number (SMPP `addr_ton`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeOfNumber {
    /// Unknown format (short codes, malformed input).
    Unknown,
    /// International format, country calling code included.
    International,
    /// National format.
    National,
    /// Alphanumeric sender ID.
    Alphanumeric,
}

impl TypeOfNumber {
    /// SMPP v3.4 wire value.
    pub fn smpp_value(self) -> u8 {
        match self {
            Self::Unknown => 0x00,
            Self::International => 0x01,
            Self::National => 0x02,
            Self::Alphanumeric => 0x05,
        }
    }
}

/// Numbering plan indicator (SMPP `addr_npi`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NumberingPlanIndicator {
    /// Unknown plan.
    Unknown,
    /// ISDN/telephone numbering plan (E.163/E.164).
    IsdnTelephone,
}

impl NumberingPlanIndicator {
    /// SMPP v3.4 wire value.
    pub fn smpp_value(self) -> u8 {
        match self {
            Self::Unknown => 0x00,
            Self::IsdnTelephone => 0x01,
        }
    }
}

/// A classified address.
///
/// Alphanumeric numbers always carry [`NumberingPlanIndicator::Unknown`];
/// well-formed numeric numbers carry [`NumberingPlanIndicator::IsdnTelephone`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AddressedPhoneNumber {
    /// Stored address. International numbers are kept without the leading `+`.
    pub number: String,
    /// Type of number.
    pub type_of_number: TypeOfNumber,
    /// Numbering plan indicator.
    pub npi: NumberingPlanIndicator,
}

impl AddressedPhoneNumber {
    /// Build an addressed number.
    pub fn new(
        number: impl Into<String>,
        type_of_number: TypeOfNumber,
        npi: NumberingPlanIndicator,
    ) -> Self {
        Self {
            number: number.into(),
            type_of_number,
            npi,
        }
    }
}

impl std::fmt::Display for AddressedPhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.type_of_number {
            TypeOfNumber::International => write!(f, "+{}", self.number),
            _ => f.write_str(&self.number),
        }
    }
}

/// Which side of the message an address belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressRole {
    /// The originating address.
    Sender,
    /// A destination address.
    Recipient,
}

impl std::fmt::Display for AddressRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sender => f.write_str("sender"),
            Self::Recipient => f.write_str("recipient"),
        }
    }
}

/// Address rejected for its role.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressingError {
    /// Alphanumeric IDs are not deliverable in this role.
    #[error("alphanumeric address '{number}' is not allowed as {role}")]
    AlphanumericNotAllowed {
        /// Role the address was used in.
        role: AddressRole,
        /// The offending address.
        number: String,
    },
    /// The message has no recipient.
    #[error("message has no recipient")]
    NoRecipients,
    /// Empty address.
    #[error("empty {role} address")]
    Empty {
        /// Role the address was used in.
        role: AddressRole,
    },
}
