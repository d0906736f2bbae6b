//! Opaque sub-configurations handed through to collaborators.
//!
//! The service itself does not interpret these beyond passing them to the
//! lifecycle actions that own the corresponding connections.

use serde::{Serialize, Serializer};

/// Database and cache connection targets.
///
/// Serialized with only the URL scheme, since URLs may embed credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DbConfig {
    #[serde(serialize_with = "scheme_only")]
    pub database_url: Option<String>,
    #[serde(serialize_with = "scheme_only")]
    pub cache_url: Option<String>,
}

fn scheme_only<S: Serializer>(url: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    match url {
        None => serializer.serialize_none(),
        Some(url) => match url.split_once("://") {
            Some((scheme, _)) => serializer.serialize_some(&format!("{scheme}://***")),
            None => serializer.serialize_some("***"),
        },
    }
}

impl DbConfig {
    pub(crate) fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Self {
        Self {
            database_url: lookup("DATABASE_URL").filter(|v| !v.trim().is_empty()),
            cache_url: lookup("REDIS_URL").filter(|v| !v.trim().is_empty()),
        }
    }
}

/// Token verification settings.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct AuthConfig {
    #[serde(skip)]
    pub jwt_secret: Option<String>,
    pub jwt_algorithm: String,
}

impl AuthConfig {
    pub const DEFAULT_ALGORITHM: &'static str = "HS256";

    pub(crate) fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Self {
        Self {
            jwt_secret: lookup("JWT_SECRET").filter(|v| !v.is_empty()),
            jwt_algorithm: lookup("JWT_ALGORITHM")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| Self::DEFAULT_ALGORITHM.to_string()),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            jwt_algorithm: Self::DEFAULT_ALGORITHM.to_string(),
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .field("jwt_algorithm", &self.jwt_algorithm)
            .finish()
    }
}
