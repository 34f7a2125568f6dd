//! Customer records and the alphabetic customer code.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{
    CUSTOMER_CODE_ALPHABET, CUSTOMER_CODE_BASE, CUSTOMER_CODE_LENGTH, MAX_CUSTOMER_CODES,
};
use crate::errors::{DeskError, Result};
use crate::impl_domain_status_conversions;

/* -------------------------------------------------------------------------- */
/* Customer code */
/* -------------------------------------------------------------------------- */

/// Four lowercase letters encoding a base-26 number, most significant first.
///
/// `aaaa` is zero and `zzzz` is the last value of the space. Lexicographic
/// order of the string equals numeric order of the value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CustomerCode(String);

impl CustomerCode {
    /// The first code of the space (`aaaa`).
    pub fn first() -> Self {
        Self("a".repeat(CUSTOMER_CODE_LENGTH))
    }

    /// Parse a stored code. Surrounding whitespace and upper case are
    /// tolerated; anything else that is not four letters is rejected.
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = raw.trim().to_ascii_lowercase();
        if normalized.len() != CUSTOMER_CODE_LENGTH
            || !normalized.bytes().all(|b| b.is_ascii_lowercase())
        {
            return Err(DeskError::InvalidCode(raw.to_string()));
        }
        Ok(Self(normalized))
    }

    /// Encode a numeric value, failing when it lies outside the code space.
    pub fn from_value(value: u32) -> Result<Self> {
        if value >= MAX_CUSTOMER_CODES {
            return Err(DeskError::CodeSpaceExhausted);
        }

        let alphabet = CUSTOMER_CODE_ALPHABET.as_bytes();
        let mut chars = vec![alphabet[0]; CUSTOMER_CODE_LENGTH];
        let mut remaining = value;
        for slot in chars.iter_mut().rev() {
            *slot = alphabet[(remaining % CUSTOMER_CODE_BASE) as usize];
            remaining /= CUSTOMER_CODE_BASE;
        }

        String::from_utf8(chars)
            .map(Self)
            .map_err(|e| DeskError::Internal(format!("customer code encoding: {e}")))
    }

    /// Decoded numeric value of the code.
    pub fn value(&self) -> u32 {
        self.0
            .bytes()
            .fold(0, |acc, b| acc * CUSTOMER_CODE_BASE + u32::from(b - b'a'))
    }

    /// The code immediately after this one.
    pub fn next(&self) -> Result<Self> {
        Self::from_value(self.value() + 1)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CustomerCode {
    type Error = DeskError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<CustomerCode> for String {
    fn from(code: CustomerCode) -> Self {
        code.0
    }
}

/* -------------------------------------------------------------------------- */
/* Customer */
/* -------------------------------------------------------------------------- */

/// Persisted customer row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub code: CustomerCode,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Customer {
    /// Current value of a tracked field.
    pub fn field(&self, field: CustomerField) -> Option<&str> {
        match field {
            CustomerField::Name => Some(self.name.as_str()),
            CustomerField::Email => self.email.as_deref(),
            CustomerField::Phone => self.phone.as_deref(),
            CustomerField::Address => self.address.as_deref(),
        }
    }
}

/// Contact data for a customer that does not exist yet.
///
/// Built from a form submission or from a calendar candidate; the code is
/// assigned by the allocator at insert time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl NewCustomer {
    /// Build a record with every field trimmed and blanks dropped.
    pub fn normalized(
        name: &str,
        email: Option<&str>,
        phone: Option<&str>,
        address: Option<&str>,
    ) -> Self {
        Self {
            name: name.trim().to_string(),
            email: non_blank(email),
            phone: non_blank(phone),
            address: non_blank(address),
        }
    }

    pub fn field(&self, field: CustomerField) -> Option<&str> {
        match field {
            CustomerField::Name => Some(self.name.as_str()),
            CustomerField::Email => self.email.as_deref(),
            CustomerField::Phone => self.phone.as_deref(),
            CustomerField::Address => self.address.as_deref(),
        }
    }
}

/// Trim a value and map empty strings to `None`.
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

/* -------------------------------------------------------------------------- */
/* Tracked fields */
/* -------------------------------------------------------------------------- */

/// Customer columns that a calendar sync may overwrite. `code` is absent on
/// purpose: it never changes after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerField {
    Name,
    Email,
    Phone,
    Address,
}

impl CustomerField {
    pub const ALL: [Self; 4] = [Self::Name, Self::Email, Self::Phone, Self::Address];

    /// Column name in the `customers` table.
    pub fn column(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Address => "address",
        }
    }
}

impl_domain_status_conversions!(CustomerField {
    Name => "name",
    Email => "email",
    Phone => "phone",
    Address => "address",
});

/// A single column change computed by the reconciliation step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: CustomerField,
    pub value: Option<String>,
}
