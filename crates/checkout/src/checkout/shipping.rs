//! Shipping form validation.
//!
//! The form is plain strings the way a UI binds them; [`ShippingForm::validate`]
//! turns it into an already-valid [`ShippingInfo`] or a full set of
//! field-keyed errors (all invalid fields reported at once, not just the
//! first). Checkout only ever stores the validated form.

use serde::{Deserialize, Serialize};

use bazaar_core::Phone;

/// Expected length of a postal code.
const POSTAL_CODE_DIGITS: usize = 10;

// =============================================================================
// Shipping method
// =============================================================================

/// How the order should be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShippingMethod {
    /// Regular post.
    #[default]
    Standard,
    /// Courier delivery.
    Express,
}

impl ShippingMethod {
    /// Wire value for quote and order requests.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Express => "express",
        }
    }
}

// =============================================================================
// Form errors
// =============================================================================

/// A shipping form field, for keying validation messages to inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingField {
    FirstName,
    LastName,
    Phone,
    Province,
    City,
    Address,
    PostalCode,
}

/// One field's validation message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Which input the message belongs to.
    pub field: ShippingField,
    /// Message to show next to the input.
    pub message: String,
}

/// All validation failures for a submitted form.
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("shipping form has {} invalid field(s)", .fields.len())]
pub struct ShippingFormErrors {
    /// One entry per invalid field.
    pub fields: Vec<FieldError>,
}

impl ShippingFormErrors {
    fn push(&mut self, field: ShippingField, message: impl Into<String>) {
        self.fields.push(FieldError {
            field,
            message: message.into(),
        });
    }

    /// Whether any field failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The message for a specific field, if it failed.
    #[must_use]
    pub fn message_for(&self, field: ShippingField) -> Option<&str> {
        self.fields
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }
}

// =============================================================================
// Form and validated info
// =============================================================================

/// A saved address from the user's profile.
///
/// Address CRUD lives with the profile service; checkout only consumes one
/// to pre-fill the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedAddress {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub province: String,
    pub city: String,
    pub address: String,
    pub postal_code: String,
}

/// The shipping form as the UI binds it: raw strings, no guarantees.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingForm {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub province: String,
    pub city: String,
    pub address: String,
    pub postal_code: String,
    pub method: ShippingMethod,
}

impl ShippingForm {
    /// Overwrite the typed-in fields with a saved address.
    ///
    /// Selecting a saved address always wins over whatever was in progress;
    /// the chosen shipping method is kept.
    pub fn apply_address(&mut self, saved: &SavedAddress) {
        self.first_name = saved.first_name.clone();
        self.last_name = saved.last_name.clone();
        self.phone = saved.phone.clone();
        self.province = saved.province.clone();
        self.city = saved.city.clone();
        self.address = saved.address.clone();
        self.postal_code = saved.postal_code.clone();
    }

    /// Validate every field and produce a [`ShippingInfo`].
    ///
    /// # Errors
    ///
    /// Returns [`ShippingFormErrors`] with one entry per invalid field;
    /// valid fields are never reported.
    pub fn validate(&self) -> Result<ShippingInfo, ShippingFormErrors> {
        let mut errors = ShippingFormErrors::default();

        let first_name = self.first_name.trim();
        if first_name.is_empty() {
            errors.push(ShippingField::FirstName, "first name is required");
        }

        let last_name = self.last_name.trim();
        if last_name.is_empty() {
            errors.push(ShippingField::LastName, "last name is required");
        }

        let phone = match Phone::parse(self.phone.trim()) {
            Ok(phone) => Some(phone),
            Err(e) => {
                errors.push(ShippingField::Phone, e.to_string());
                None
            }
        };

        let province = self.province.trim();
        if province.is_empty() {
            errors.push(ShippingField::Province, "province is required");
        }

        let city = self.city.trim();
        if city.is_empty() {
            errors.push(ShippingField::City, "city is required");
        }

        let address = self.address.trim();
        if address.is_empty() {
            errors.push(ShippingField::Address, "street address is required");
        }

        let postal_code = self.postal_code.trim();
        if postal_code.len() != POSTAL_CODE_DIGITS
            || !postal_code.chars().all(|c| c.is_ascii_digit())
        {
            errors.push(
                ShippingField::PostalCode,
                format!("postal code must be {POSTAL_CODE_DIGITS} digits"),
            );
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        // All checks passed, phone is necessarily Some here.
        let Some(phone) = phone else {
            return Err(errors);
        };

        Ok(ShippingInfo {
            first_name: first_name.to_owned(),
            last_name: last_name.to_owned(),
            phone,
            province: province.to_owned(),
            city: city.to_owned(),
            address: address.to_owned(),
            postal_code: postal_code.to_owned(),
            method: self.method,
        })
    }
}

/// Validated shipping data, as stored by the checkout session and sent with
/// the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingInfo {
    pub first_name: String,
    pub last_name: String,
    pub phone: Phone,
    pub province: String,
    pub city: String,
    pub address: String,
    pub postal_code: String,
    pub method: ShippingMethod,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid_form() -> ShippingForm {
        ShippingForm {
            first_name: "Sara".to_owned(),
            last_name: "Ahmadi".to_owned(),
            phone: "09123456789".to_owned(),
            province: "Tehran".to_owned(),
            city: "Tehran".to_owned(),
            address: "Valiasr St 12".to_owned(),
            postal_code: "1234567890".to_owned(),
            method: ShippingMethod::Standard,
        }
    }

    #[test]
    fn test_valid_form_passes() {
        let info = valid_form().validate().unwrap();
        assert_eq!(info.first_name, "Sara");
        assert_eq!(info.phone.as_str(), "09123456789");
        assert_eq!(info.method, ShippingMethod::Standard);
    }

    #[test]
    fn test_fields_are_trimmed() {
        let mut form = valid_form();
        form.first_name = "  Sara  ".to_owned();
        form.postal_code = " 1234567890 ".to_owned();
        let info = form.validate().unwrap();
        assert_eq!(info.first_name, "Sara");
        assert_eq!(info.postal_code, "1234567890");
    }

    #[test]
    fn test_all_failures_reported_at_once() {
        let form = ShippingForm::default();
        let errors = form.validate().unwrap_err();

        assert_eq!(errors.fields.len(), 7);
        assert!(errors.message_for(ShippingField::FirstName).is_some());
        assert!(errors.message_for(ShippingField::Phone).is_some());
        assert!(errors.message_for(ShippingField::PostalCode).is_some());
    }

    #[test]
    fn test_bad_phone_keyed_to_phone_field() {
        let mut form = valid_form();
        form.phone = "02123456789".to_owned();
        let errors = form.validate().unwrap_err();

        assert_eq!(errors.fields.len(), 1);
        assert_eq!(
            errors.message_for(ShippingField::Phone),
            Some("phone number must start with 09")
        );
    }

    #[test]
    fn test_postal_code_must_be_ten_digits() {
        let mut form = valid_form();
        form.postal_code = "12345".to_owned();
        assert!(form.validate().is_err());

        form.postal_code = "12345abcde".to_owned();
        assert!(form.validate().is_err());
    }

    #[test]
    fn test_apply_address_overrides_typed_fields() {
        let mut form = valid_form();
        form.method = ShippingMethod::Express;
        form.apply_address(&SavedAddress {
            first_name: "Reza".to_owned(),
            last_name: "Karimi".to_owned(),
            phone: "09351112233".to_owned(),
            province: "Isfahan".to_owned(),
            city: "Isfahan".to_owned(),
            address: "Chaharbagh Ave 4".to_owned(),
            postal_code: "9876543210".to_owned(),
        });

        assert_eq!(form.first_name, "Reza");
        assert_eq!(form.province, "Isfahan");
        // Shipping method is a checkout choice, not part of the address.
        assert_eq!(form.method, ShippingMethod::Express);

        let info = form.validate().unwrap();
        assert_eq!(info.phone.as_str(), "09351112233");
    }

    #[test]
    fn test_method_round_trips_lowercase() {
        assert_eq!(ShippingMethod::Standard.as_str(), "standard");
        let json = serde_json::to_string(&ShippingMethod::Express).unwrap();
        assert_eq!(json, "\"express\"");
    }
}
