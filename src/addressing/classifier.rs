//! Raw address classification.
//!
//! Rules are evaluated in priority order; the first that applies wins:
//! 1. alphanumeric sender ID (letters, digits, spaces; at least one
//!    non-digit; at most `max_alphanumeric_len` characters)
//! 2. `+` prefix: international
//! 3. short code (at most `max_short_code_len` digits) when international
//!    normalization is off
//! 4. national, rewritten to international when normalization is on and the
//!    number starts with the trunk prefix
//!
//! Anything without digits that is not an alphanumeric ID is malformed and
//! classified `UNKNOWN`/`UNKNOWN` with the input left unchanged.

use serde::Deserialize;

use super::{AddressedPhoneNumber, NumberingPlanIndicator, TypeOfNumber};

const DEFAULT_MAX_ALPHANUMERIC_LEN: usize = 11;
const DEFAULT_MAX_SHORT_CODE_LEN: usize = 5;
const DEFAULT_TRUNK_PREFIX: &str = "0";

/// Per-role classification settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClassifierRules {
    /// Accept alphanumeric IDs for this role.
    pub allow_alphanumeric: bool,
    /// Pass short codes through as `UNKNOWN`.
    pub short_code: bool,
    /// Rewrite national numbers to international form.
    pub international: bool,
    /// Country calling code used for the rewrite (digits only, e.g. `"33"`).
    pub country_code: Option<String>,
    /// National trunk prefix replaced by the country code.
    pub trunk_prefix: String,
    /// Longest accepted alphanumeric ID.
    pub max_alphanumeric_len: usize,
    /// Longest number treated as a short code.
    pub max_short_code_len: usize,
}

impl Default for ClassifierRules {
    fn default() -> Self {
        Self {
            allow_alphanumeric: false,
            short_code: false,
            international: false,
            country_code: None,
            trunk_prefix: DEFAULT_TRUNK_PREFIX.to_owned(),
            max_alphanumeric_len: DEFAULT_MAX_ALPHANUMERIC_LEN,
            max_short_code_len: DEFAULT_MAX_SHORT_CODE_LEN,
        }
    }
}

impl ClassifierRules {
    /// Sender defaults: alphanumeric IDs and short codes pass through,
    /// national numbers stay national.
    pub fn sender() -> Self {
        Self {
            allow_alphanumeric: true,
            short_code: true,
            ..Self::default()
        }
    }

    /// Recipient defaults: national numbers are normalized to international
    /// form using `country_code`.
    pub fn recipient(country_code: impl Into<String>) -> Self {
        Self {
            international: true,
            country_code: Some(country_code.into()),
            ..Self::default()
        }
    }

    /// Set the country calling code.
    #[must_use]
    pub fn with_country_code(mut self, country_code: impl Into<String>) -> Self {
        self.country_code = Some(country_code.into());
        self
    }

    /// Enable or disable international normalization.
    #[must_use]
    pub fn with_international(mut self, enabled: bool) -> Self {
        self.international = enabled;
        self
    }

    /// Check the rules are usable.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem when normalization is enabled
    /// without a numeric country code.
    pub fn validate(&self) -> Result<(), String> {
        if !self.international {
            return Ok(());
        }
        match self.country_code.as_deref() {
            Some(code) if !code.is_empty() && code.chars().all(|c| c.is_ascii_digit()) => Ok(()),
            Some(code) => Err(format!("country code '{code}' must be digits only")),
            None => Err("international normalization requires a country code".to_owned()),
        }
    }
}

/// Stateless classifier applying one set of [`ClassifierRules`].
#[derive(Debug, Clone)]
pub struct PhoneNumberClassifier {
    rules: ClassifierRules,
}

impl PhoneNumberClassifier {
    /// Create a classifier.
    pub fn new(rules: ClassifierRules) -> Self {
        Self { rules }
    }

    /// The rules in use.
    pub fn rules(&self) -> &ClassifierRules {
        &self.rules
    }

    /// Classify a raw address. Total: malformed input still yields a tuple.
    pub fn classify(&self, raw: &str) -> AddressedPhoneNumber {
        let trimmed = raw.trim();

        if self.is_alphanumeric_id(trimmed) {
            return AddressedPhoneNumber::new(
                trimmed,
                TypeOfNumber::Alphanumeric,
                NumberingPlanIndicator::Unknown,
            );
        }

        if let Some(rest) = trimmed.strip_prefix('+') {
            return match numeric_digits(rest) {
                Some(digits) => AddressedPhoneNumber::new(
                    digits,
                    TypeOfNumber::International,
                    NumberingPlanIndicator::IsdnTelephone,
                ),
                None => malformed(trimmed),
            };
        }

        let Some(digits) = numeric_digits(trimmed) else {
            return malformed(trimmed);
        };

        if self.rules.short_code
            && !self.rules.international
            && digits.len() <= self.rules.max_short_code_len
        {
            return AddressedPhoneNumber::new(
                digits,
                TypeOfNumber::Unknown,
                NumberingPlanIndicator::Unknown,
            );
        }

        if let Some(international) = self.to_international(&digits) {
            return AddressedPhoneNumber::new(
                international,
                TypeOfNumber::International,
                NumberingPlanIndicator::IsdnTelephone,
            );
        }

        AddressedPhoneNumber::new(
            digits,
            TypeOfNumber::National,
            NumberingPlanIndicator::IsdnTelephone,
        )
    }

    fn is_alphanumeric_id(&self, value: &str) -> bool {
        !value.is_empty()
            && value.chars().count() <= self.rules.max_alphanumeric_len
            && value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == ' ')
            && value.chars().any(|c| !c.is_ascii_digit())
    }

    fn to_international(&self, digits: &str) -> Option<String> {
        if !self.rules.international || self.rules.trunk_prefix.is_empty() {
            return None;
        }
        let country_code = self.rules.country_code.as_deref()?;
        let national = digits.strip_prefix(self.rules.trunk_prefix.as_str())?;
        if national.is_empty() {
            return None;
        }
        Some(format!("{country_code}{national}"))
    }
}

fn malformed(raw: &str) -> AddressedPhoneNumber {
    AddressedPhoneNumber::new(raw, TypeOfNumber::Unknown, NumberingPlanIndicator::Unknown)
}

/// Digits of `value` with common separators dropped; `None` when `value`
/// contains anything else or has no digit at all.
fn numeric_digits(value: &str) -> Option<String> {
    let mut digits = String::with_capacity(value.len());
    for c in value.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
        } else if !matches!(c, ' ' | '-' | '.' | '(' | ')') {
            return None;
        }
    }
    (!digits.is_empty()).then_some(digits)
}
