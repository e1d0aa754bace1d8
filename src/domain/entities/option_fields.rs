use serde::{Deserialize, Deserializer};

/// Represents optional field semantics in PATCH requests.
///
/// - `Unchanged` → key absent from the body
/// - `SetToNull` → key present with `null`
/// - `SetToValue` → key present with a value
///
/// Containing structs must use `#[serde(default)]` so absent keys fall back
/// to `Unchanged`.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionField<T> {
    Unchanged,
    SetToNull,
    SetToValue(T),
}

impl<T> Default for OptionField<T> {
    fn default() -> Self {
        OptionField::Unchanged
    }
}

impl<'de, T> Deserialize<'de> for OptionField<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<T>::deserialize(deserializer)?.into())
    }
}

impl<T> From<Option<T>> for OptionField<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => OptionField::SetToValue(v),
            None => OptionField::SetToNull,
        }
    }
}

impl<T> OptionField<T> {
    /// Convert to nested option:
    /// - `None` → unchanged
    /// - `Some(None)` → set null
    /// - `Some(Some(T))` → set to value
    pub fn into_option(self) -> Option<Option<T>> {
        match self {
            Self::Unchanged => None,
            Self::SetToNull => Some(None),
            Self::SetToValue(v) => Some(Some(v)),
        }
    }

    pub fn map_value<U, F: FnOnce(T) -> U>(self, f: F) -> OptionField<U> {
        match self {
            Self::Unchanged => OptionField::Unchanged,
            Self::SetToNull => OptionField::SetToNull,
            Self::SetToValue(v) => OptionField::SetToValue(f(v)),
        }
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }

    /// Writes the patch into a nullable target.
    pub fn apply(self, target: &mut Option<T>) {
        if let Some(value) = self.into_option() {
            *target = value;
        }
    }

    /// Writes the patch into a required target. `null` is reported back as
    /// `Err(())` so the caller can name the offending field.
    pub fn apply_required(self, target: &mut T) -> Result<(), ()> {
        match self {
            Self::Unchanged => Ok(()),
            Self::SetToNull => Err(()),
            Self::SetToValue(v) => {
                *target = v;
                Ok(())
            }
        }
    }
}

impl OptionField<String> {
    /// Trims the value; a blank string clears the field.
    pub fn trimmed(self) -> OptionField<String> {
        match self.map_value(|s| s.trim().to_string()) {
            OptionField::SetToValue(s) if s.is_empty() => OptionField::SetToNull,
            other => other,
        }
    }
}
