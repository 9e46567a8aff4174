//! Typed view of the JSON envelope returned for every query.
//!
//! ```json
//! { "_text": "...", "msg_id": "...",
//!   "outcomes": [ { "_text": "...", "confidence": 0.98, "intent": "..." } ] }
//! ```

use crate::error::WitError;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

/// One interpretation of a query. Outcomes keep the order the service ranked them in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    #[serde(rename = "_text", default, deserialize_with = "null_as_default")]
    pub text: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub confidence: f32,

    #[serde(default, deserialize_with = "null_as_default")]
    pub intent: String,
}

/// The full response for one query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    #[serde(rename = "_text", default, deserialize_with = "null_as_default")]
    pub text: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub msg_id: String,

    #[serde(default, deserialize_with = "outcome_objects")]
    pub outcomes: Vec<Outcome>,
}

impl QueryResult {
    /// Deserialize a raw payload. Missing or `null` fields take their empty value.
    ///
    /// The envelope and every outcome must be JSON objects.
    pub fn parse(payload: impl AsRef<[u8]>) -> Result<Self, WitError> {
        let envelope: Map<String, Value> = serde_json::from_slice(payload.as_ref())?;
        let result = serde_json::from_value(Value::Object(envelope))?;
        Ok(result)
    }

    /// A result is usable when it carries text and at least one outcome.
    pub fn is_valid(&self) -> bool {
        !self.text.is_empty() && !self.outcomes.is_empty()
    }

    pub fn primary(&self) -> Option<&Outcome> {
        self.outcomes.first()
    }

    /// Validate and split off the primary outcome.
    pub fn into_primary(self) -> Result<(Self, Outcome), WitError> {
        if !self.is_valid() {
            return Err(WitError::InvalidResult);
        }
        let primary = self.outcomes[0].clone();
        Ok((self, primary))
    }
}

impl FromStr for QueryResult {
    type Err = WitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `serde`'s derived struct visitor also accepts positional arrays, so each
/// outcome goes through a map first.
fn outcome_objects<'de, D>(deserializer: D) -> Result<Vec<Outcome>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Map<String, Value>>>::deserialize(deserializer)?.unwrap_or_default();
    raw.into_iter()
        .map(|outcome| serde_json::from_value(Value::Object(outcome)).map_err(D::Error::custom))
        .collect()
}
