use serde::{Serialize, Serializer};
use std::fmt;

/// A place that trips can point at.
///
/// The `id` is assigned by the remote API for preloaded records and drawn
/// at random for manually added ones. `picture` holds raw image bytes and
/// is filled in after the record itself has been stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Destination {
    pub id: i64,
    pub city: String,
    pub country: String,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_picture_len"
    )]
    pub picture: Option<Vec<u8>>,
}

impl Destination {
    pub fn new(id: i64, city: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            id,
            city: city.into(),
            country: country.into(),
            picture: None,
        }
    }

    pub fn with_picture(mut self, picture: Vec<u8>) -> Self {
        self.picture = Some(picture);
        self
    }

    /// Case-insensitive match on the city name. An empty query matches everything.
    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.trim();
        query.is_empty() || self.city.to_lowercase().contains(&query.to_lowercase())
    }

    /// Checks the fields a user must fill in when adding or editing.
    pub fn validate(&self) -> Result<(), String> {
        if self.city.trim().is_empty() || self.country.trim().is_empty() {
            return Err("City and country are required".to_string());
        }
        Ok(())
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.city)?;
        writeln!(f, "{}", "=".repeat(self.city.chars().count()))?;
        writeln!(f, "ID: {}", self.id)?;
        writeln!(f, "Country: {}", self.country)?;
        match &self.picture {
            Some(bytes) => writeln!(f, "Picture: {} bytes", bytes.len())?,
            None => writeln!(f, "Picture: none")?,
        }
        Ok(())
    }
}

/// JSON output reports the picture size rather than dumping the bytes.
fn serialize_picture_len<S: Serializer>(
    picture: &Option<Vec<u8>>,
    s: S,
) -> Result<S::Ok, S::Error> {
    match picture {
        Some(bytes) => s.serialize_some(&bytes.len()),
        None => s.serialize_none(),
    }
}
