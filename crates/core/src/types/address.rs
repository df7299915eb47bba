//! Shipping address used as both the payment billing contact and the
//! fulfillment recipient.

use serde::{Deserialize, Serialize};

use super::email::Email;

/// Errors from [`ShippingAddress::validate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    /// A required field is missing or blank.
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    /// Country code is not a 2-letter uppercase ISO 3166-1 code.
    #[error("invalid country code: {0}")]
    InvalidCountryCode(String),
}

/// A customer shipping address.
///
/// State is required because the fulfillment providers require it for rate
/// calculation in countries that have states; providers that don't need it
/// ignore it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub first_name: String,
    pub last_name: String,
    pub address1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    /// 2-letter uppercase ISO 3166-1 country code.
    pub country: String,
    pub email: Email,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl ShippingAddress {
    /// Validate required fields and the country code shape.
    ///
    /// # Errors
    ///
    /// Returns the first failing field; callers surface it as a bad request.
    pub fn validate(&self) -> Result<(), AddressError> {
        let required: [(&'static str, &str); 6] = [
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
            ("address1", &self.address1),
            ("city", &self.city),
            ("state", &self.state),
            ("postalCode", &self.postal_code),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(AddressError::MissingField(name));
            }
        }

        if self.country.len() != 2 || !self.country.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(AddressError::InvalidCountryCode(self.country.clone()));
        }

        Ok(())
    }

    /// Full recipient name for provider payloads.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> ShippingAddress {
        ShippingAddress {
            first_name: "Ada".to_owned(),
            last_name: "Lovelace".to_owned(),
            address1: "1 Analytical Way".to_owned(),
            address2: None,
            city: "London".to_owned(),
            state: "LND".to_owned(),
            postal_code: "EC1A 1BB".to_owned(),
            country: "GB".to_owned(),
            email: Email::parse("ada@example.com").unwrap(),
            phone: None,
        }
    }

    #[test]
    fn valid_address_passes() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn blank_state_is_rejected() {
        let mut addr = sample();
        addr.state = "  ".to_owned();
        assert_eq!(
            addr.validate(),
            Err(AddressError::MissingField("state"))
        );
    }

    #[test]
    fn lowercase_country_is_rejected() {
        let mut addr = sample();
        addr.country = "gb".to_owned();
        assert!(matches!(
            addr.validate(),
            Err(AddressError::InvalidCountryCode(_))
        ));
    }

    #[test]
    fn full_name_joins_parts() {
        assert_eq!(sample().full_name(), "Ada Lovelace");
    }

    #[test]
    fn serde_uses_camel_case() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("firstName").is_some());
        assert!(json.get("postalCode").is_some());
        assert!(json.get("address2").is_none());
    }
}
