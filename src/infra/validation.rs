//! Utilities for validating constraints on types.

use serde::{Deserialize, Deserializer};
use validator::{Validate, ValidationError, ValidationErrors};

/// A type that cannot be instatiated without validating the value within.
/// That is, if you have a [`Valid<T>`], `T` is guaranteed to be valid.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Valid<T> {
    value: T,
}

impl<T> Valid<T> {
    /// Constructs a new validated value.
    pub fn new(value: T) -> Result<Valid<T>, ValidationErrors>
    where
        T: Validate,
    {
        value.validate().map(|_| Valid { value })
    }

    /// Returns a reference to the validated value.
    pub fn inner(&self) -> &T {
        &self.value
    }

    /// Returns the validated value.
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> AsRef<T> for Valid<T> {
    fn as_ref(&self) -> &T {
        &self.value
    }
}

impl<'de, T: Deserialize<'de> + Validate> Deserialize<'de> for Valid<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value: T = T::deserialize(deserializer)?;
        Valid::new(value).map_err(|e| serde::de::Error::custom(e.to_string()))
    }
}

/// Fails on strings that are empty or only whitespace.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Deserializes an optional string, treating blank strings as absent.
///
/// Used for partial updates where a blank value means "leave unchanged".
pub fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.trim().is_empty()))
}
