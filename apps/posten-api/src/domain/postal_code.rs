use serde::{Deserialize, Serialize};
use std::fmt;

/// Norwegian postal code value object
///
/// # Invariants
/// - Exactly four ASCII digits
/// - Is immutable after construction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PostalCode(String);

impl PostalCode {
    /// Parses a postal code from a route segment such as `4321` or `4321.json`
    ///
    /// The digits are read as an integer and re-rendered zero-padded to four
    /// places, so `1` becomes `0001` and `00042` becomes `0042`.
    ///
    /// # Returns
    /// * `Ok(PostalCode)` - If the segment names a four-digit code
    /// * `Err(String)` - If the segment is not a postal code
    ///
    /// # Example
    /// ```
    /// use posten_api::domain::postal_code::PostalCode;
    ///
    /// let code = PostalCode::from_segment("321.json").expect("valid code");
    /// assert_eq!(code.as_str(), "0321");
    /// ```
    pub fn from_segment(segment: &str) -> Result<Self, String> {
        let digits = segment.strip_suffix(".json").unwrap_or(segment);

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("Invalid postal code: {}", segment));
        }

        let trimmed = digits.trim_start_matches('0');
        if trimmed.len() > 4 {
            return Err(format!("Invalid postal code: {}", segment));
        }

        Ok(PostalCode(format!("{:0>4}", trimmed)))
    }

    /// Returns the postal code as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
