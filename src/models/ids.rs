use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ApiError;

/// Maximum length of a poster or image id.
pub const MAX_ID_LEN: usize = 64;

fn is_valid_id(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= MAX_ID_LEN
        && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

fn random_suffix() -> String {
    use rand::Rng;
    rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(16)
        .map(char::from)
        .collect()
}

/// Identifier of a stored poster (`poster_` + 16 alphanumerics when generated).
///
/// Ids become file names, so only `[A-Za-z0-9_-]{1,64}` is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PosterId(String);

impl PosterId {
    pub fn generate() -> Self {
        Self(format!("poster_{}", random_suffix()))
    }

    pub fn parse(s: &str) -> Result<Self, ApiError> {
        if is_valid_id(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(ApiError::InvalidId(s.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifier of an uploaded image (`image_` + 16 alphanumerics).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImageId(String);

impl ImageId {
    pub fn generate() -> Self {
        Self(format!("image_{}", random_suffix()))
    }

    pub fn parse(s: &str) -> Result<Self, ApiError> {
        if is_valid_id(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(ApiError::InvalidId(s.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

macro_rules! id_conversions {
    ($ty:ident) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $ty {
            type Error = ApiError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::parse(&s)
            }
        }

        impl From<$ty> for String {
            fn from(id: $ty) -> String {
                id.0
            }
        }
    };
}

id_conversions!(PosterId);
id_conversions!(ImageId);
