use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::StdError;

/// Free-form configuration passed through to the container.
///
/// Merging is shallow: a key present in the incoming map replaces the
/// existing value, keys absent from it are kept.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Properties {
    #[serde(flatten)]
    pub(crate) values: BTreeMap<String, serde_json::Value>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T>(&self, key: impl AsRef<str>) -> Result<T, StdError>
    where
        T: DeserializeOwned,
    {
        Ok(serde_json::from_value(
            self.values
                .get(key.as_ref())
                .cloned()
                .unwrap_or(serde_json::Value::Null),
        )?)
    }

    pub fn get_raw(&self, key: impl AsRef<str>) -> Option<&serde_json::Value> {
        self.values.get(key.as_ref())
    }

    pub fn set<T>(&mut self, key: impl Into<String>, value: T) -> Result<(), StdError>
    where
        T: Serialize,
    {
        self.values.insert(key.into(), serde_json::to_value(value)?);
        Ok(())
    }

    pub fn with<T>(mut self, key: impl Into<String>, value: T) -> Result<Self, StdError>
    where
        T: Serialize,
    {
        self.set(key, value)?;
        Ok(self)
    }

    pub fn merge_from(&mut self, other: Self) {
        self.values.extend(other.values);
    }

    pub fn contains_key(&self, key: impl AsRef<str>) -> bool {
        self.values.contains_key(key.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &serde_json::Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn parse<T>(text: T) -> Result<Self, StdError>
    where
        T: AsRef<str>,
    {
        Ok(serde_json::from_str(text.as_ref())?)
    }

    pub async fn parse_file(path: impl AsRef<Path>) -> Result<Self, StdError> {
        let text = tokio::fs::read_to_string(path).await?;
        Self::parse(text)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

impl<K> FromIterator<(K, serde_json::Value)> for Properties
where
    K: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, serde_json::Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
