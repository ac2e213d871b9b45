use serde::{Deserialize, Deserializer};
use serde_json::value::RawValue;

/// Reads `null` as the type's zero value, the way the panel's Go clients do.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Keeps an explicit `null` as raw text so it can be told apart from an
/// absent key (which stays `None` through `#[serde(default)]`).
pub(crate) fn present_raw<'de, D>(deserializer: D) -> Result<Option<Box<RawValue>>, D::Error>
where
    D: Deserializer<'de>,
{
    Box::<RawValue>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "null_as_default")]
        name: String,
        #[serde(default, deserialize_with = "null_as_default")]
        tls: i64,
        #[serde(default, deserialize_with = "present_raw")]
        settings: Option<Box<RawValue>>,
    }

    #[test]
    fn null_scalars_read_as_zero() {
        let sample: Sample = serde_json::from_str(r#"{"name":null,"tls":null}"#).unwrap();
        assert_eq!(sample.name, "");
        assert_eq!(sample.tls, 0);
        assert!(sample.settings.is_none());
    }

    #[test]
    fn explicit_null_is_kept_apart_from_absent() {
        let sample: Sample = serde_json::from_str(r#"{"settings":null}"#).unwrap();
        assert_eq!(sample.settings.unwrap().get(), "null");
    }
}
