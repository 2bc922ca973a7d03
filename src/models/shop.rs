use std::fmt;

use serde::{Deserialize, Serialize};

/// A tenant's domain, e.g. "shop1.example". Keys the durable token store.
///
/// Parsing lowercases the input and accepts only hostname characters, so a
/// `ShopDomain` can be placed in a URL or a `Location` header as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShopDomain(String);

impl ShopDomain {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let domain = raw.trim().to_ascii_lowercase();
        if domain.is_empty() || domain.len() > 253 {
            return Err(format!("Invalid shop domain length: '{}'", raw));
        }
        if !domain.contains('.') {
            return Err(format!("Shop domain must contain a dot: '{}'", raw));
        }
        let valid_labels = domain.split('.').all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-')
        });
        if !valid_labels {
            return Err(format!("Invalid shop domain: '{}'", raw));
        }
        Ok(ShopDomain(domain))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShopDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ShopDomain {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ShopDomain::parse(&value)
    }
}

impl From<ShopDomain> for String {
    fn from(value: ShopDomain) -> Self {
        value.0
    }
}
