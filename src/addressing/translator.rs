//! Role-aware address translation.

use tracing::debug;

use crate::message::PhoneNumber;

use super::{
    AddressRole, AddressedPhoneNumber, AddressingError, ClassifierRules, PhoneNumberClassifier,
    TypeOfNumber,
};

/// Classifies addresses for one role and rejects forms the role cannot use.
#[derive(Debug, Clone)]
pub struct PhoneNumberTranslator {
    role: AddressRole,
    classifier: PhoneNumberClassifier,
}

impl PhoneNumberTranslator {
    /// Translator for `role` using `rules`.
    pub fn new(role: AddressRole, rules: ClassifierRules) -> Self {
        Self {
            role,
            classifier: PhoneNumberClassifier::new(rules),
        }
    }

    /// Sender translator with [`ClassifierRules::sender`].
    pub fn sender() -> Self {
        Self::new(AddressRole::Sender, ClassifierRules::sender())
    }

    /// Recipient translator with [`ClassifierRules::recipient`].
    pub fn recipient(country_code: impl Into<String>) -> Self {
        Self::new(AddressRole::Recipient, ClassifierRules::recipient(country_code))
    }

    /// The role this translator serves.
    pub fn role(&self) -> AddressRole {
        self.role
    }

    /// Classify a raw address for this role.
    ///
    /// # Errors
    ///
    /// Returns [`AddressingError`] for empty input, or for alphanumeric IDs
    /// when the role does not accept them.
    pub fn translate_raw(&self, raw: &str) -> Result<AddressedPhoneNumber, AddressingError> {
        if raw.trim().is_empty() {
            return Err(AddressingError::Empty { role: self.role });
        }
        let addressed = self.classifier.classify(raw);
        self.check(addressed)
    }

    /// Translate a message address. Already classified addresses are checked
    /// against the role but not reclassified.
    ///
    /// # Errors
    ///
    /// See [`PhoneNumberTranslator::translate_raw`].
    pub fn translate(
        &self,
        number: &PhoneNumber,
    ) -> Result<AddressedPhoneNumber, AddressingError> {
        let addressed = match number {
            PhoneNumber::Raw(raw) => self.translate_raw(raw)?,
            PhoneNumber::Addressed(addressed) => self.check(addressed.clone())?,
        };
        debug!(
            role = %self.role,
            input = %number,
            number = %addressed.number,
            ton = ?addressed.type_of_number,
            npi = ?addressed.npi,
            "phone number classified"
        );
        Ok(addressed)
    }

    fn check(
        &self,
        addressed: AddressedPhoneNumber,
    ) -> Result<AddressedPhoneNumber, AddressingError> {
        if addressed.type_of_number == TypeOfNumber::Alphanumeric
            && !self.classifier.rules().allow_alphanumeric
        {
            return Err(AddressingError::AlphanumericNotAllowed {
                role: self.role,
                number: addressed.number,
            });
        }
        Ok(addressed)
    }
}
