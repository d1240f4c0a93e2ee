//! Success/error envelope returned by every use case.
//!
//! Wire shape:
//! - `{ "success": true,  "data": <T> }`
//! - `{ "success": false, "error": "<message>" }`

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// Used when a failure carries no message of its own.
pub const DEFAULT_FAILURE: &str = "operation failed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope<T> {
    Ok(T),
    Fail(String),
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Envelope::Ok(data)
    }

    /// Failure envelope. The message is never empty.
    pub fn fail(error: impl Into<String>) -> Self {
        let error = error.into();
        if error.trim().is_empty() {
            Envelope::Fail(DEFAULT_FAILURE.to_string())
        } else {
            Envelope::Fail(error)
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Envelope::Ok(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Envelope::Ok(d) => Some(d),
            Envelope::Fail(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Envelope::Ok(_) => None,
            Envelope::Fail(e) => Some(e),
        }
    }
}

impl<T: Serialize> Serialize for Envelope<T> {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        let mut st = s.serialize_struct("Envelope", 2)?;
        match self {
            Envelope::Ok(data) => {
                st.serialize_field("success", &true)?;
                st.serialize_field("data", data)?;
            }
            Envelope::Fail(error) => {
                st.serialize_field("success", &false)?;
                st.serialize_field("error", error)?;
            }
        }
        st.end()
    }
}
