//! Wire types of the batch lookup endpoint.
//!
//! Request body:
//! ```json
//! { "articles": ["Lisbon", "Rio_de_Janeiro"], "images": "yes", "locale": "es" }
//! ```
//! `images` and `description` are enabled only by the exact string `"yes"`.
//! `idioma` is accepted as an alias of `locale`.

use crate::errors::LookupError;
use crate::locale::Locale;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Value a mode flag must carry to be considered set.
pub const FLAG_ENABLED: &str = "yes";

/// The lookup a batch request asks for. Exactly one runs per request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LookupMode {
    /// Report the titles that have no interlanguage link to the target language
    ExistenceCheck,
    /// Resolve a thumbnail URL per title
    ImageFetch,
    /// Resolve a short description per title
    DescriptionFetch,
}

impl LookupMode {
    /// Images win over descriptions; with neither flag set the batch is an
    /// existence check.
    pub fn select(images: bool, description: bool) -> Self {
        match (images, description) {
            (true, _) => LookupMode::ImageFetch,
            (false, true) => LookupMode::DescriptionFetch,
            (false, false) => LookupMode::ExistenceCheck,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            LookupMode::ExistenceCheck => "existence",
            LookupMode::ImageFetch => "images",
            LookupMode::DescriptionFetch => "descriptions",
        }
    }
}

/// A validated batch request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchRequest {
    pub articles: Vec<String>,
    pub mode: LookupMode,
    pub locale: Locale,
}

impl BatchRequest {
    /// Parses and validates a raw request body.
    ///
    /// A body that is not JSON at all is reported as [`LookupError::MalformedBody`];
    /// a JSON body with a missing or mistyped `articles` field is an
    /// [`LookupError::InvalidRequest`].
    pub fn from_slice(body: &[u8]) -> Result<Self, LookupError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| LookupError::MalformedBody(e.to_string()))?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<Self, LookupError> {
        let articles = match value.get("articles") {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| item.as_str().map(str::to_owned))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| {
                    LookupError::InvalidRequest("articles must only contain strings".into())
                })?,
            Some(_) => {
                return Err(LookupError::InvalidRequest(
                    "articles must be an array".into(),
                ));
            }
            None => return Err(LookupError::InvalidRequest("articles is required".into())),
        };

        let flag = |name: &str| value.get(name).and_then(Value::as_str) == Some(FLAG_ENABLED);
        let locale = value
            .get("locale")
            .or_else(|| value.get("idioma"))
            .and_then(Value::as_str);

        Ok(BatchRequest {
            articles,
            mode: LookupMode::select(flag("images"), flag("description")),
            locale: Locale::from_code(locale),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleImage {
    pub title: String,
    pub image: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleDescription {
    pub title: String,
    pub description: String,
}

/// Body of every non-2xx response carrying a message
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
