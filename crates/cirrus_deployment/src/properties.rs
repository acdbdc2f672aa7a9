//! Encoding of property values exchanged with the engine.
//!
//! Property values are plain JSON with two reserved shapes:
//!
//! - the string [`UNKNOWN_VALUE`] stands for a value that is not known yet,
//! - an object whose [`SECRET_SIG_KEY`] entry is [`SECRET_SIG`] wraps a
//!   secret in its `value` entry.
//!
//! Anything richer (assets, resource references) is out of scope.

use std::collections::{BTreeMap, BTreeSet};

use cirrus_monitor::types::Properties;
use cirrus_output::{Output, OutputData, OutputError, ResourceId};
use cirrus_resource::UNKNOWN_VALUE;
use futures::future;
use serde_json::{Map, Value};

/// Key marking an object as a special value.
pub const SECRET_SIG_KEY: &str = "4dabf18193072939515e22adb298388d";

/// Signature identifying a secret.
pub const SECRET_SIG: &str = "1b47061264138c4ac30d75fd1eb44270";

/// Input properties of a resource or function call, by name.
pub type Inputs = BTreeMap<String, Output<Value>>;

/// Inputs after every output has resolved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SerializedInputs {
    /// Encoded property values.
    pub properties: Properties,
    /// Resources each property was derived from.
    pub property_dependencies: BTreeMap<String, BTreeSet<ResourceId>>,
    /// Union of every property's dependencies.
    pub dependencies: BTreeSet<ResourceId>,
    /// Whether any property is unknown.
    pub has_unknowns: bool,
    /// Whether any property is secret.
    pub has_secrets: bool,
}

/// Waits for every input and encodes the results.
///
/// Unknown values become [`UNKNOWN_VALUE`]. Secrets are wrapped when
/// `keep_secrets` is set and sent in the clear otherwise.
///
/// # Errors
///
/// Returns the first error among the inputs.
pub async fn serialize_inputs(
    inputs: &Inputs,
    keep_secrets: bool,
) -> Result<SerializedInputs, OutputError> {
    let resolved = future::try_join_all(inputs.iter().map(|(name, output)| async move {
        Ok::<_, OutputError>((name.clone(), output.data().await?))
    }))
    .await?;

    let mut serialized = SerializedInputs::default();
    for (name, data) in resolved {
        let (value, is_secret, resources) = data.into_parts();

        serialized.has_unknowns |= value.is_none();
        serialized.has_secrets |= is_secret;
        serialized.dependencies.extend(resources.iter().copied());

        let encoded = value.unwrap_or_else(|| Value::String(UNKNOWN_VALUE.to_string()));
        let encoded = if is_secret && keep_secrets {
            wrap_secret(encoded)
        } else {
            encoded
        };

        serialized.properties.insert(name.clone(), encoded);
        serialized.property_dependencies.insert(name, resources);
    }
    Ok(serialized)
}

/// Wraps `value` in a secret envelope.
#[must_use]
pub fn wrap_secret(value: Value) -> Value {
    let mut envelope = Map::new();
    envelope.insert(SECRET_SIG_KEY.to_string(), Value::String(SECRET_SIG.to_string()));
    envelope.insert("value".to_string(), value);
    Value::Object(envelope)
}

/// Decodes one property value.
///
/// A value containing an unknown anywhere is unknown as a whole; a value
/// containing a secret anywhere is secret as a whole, with the envelopes
/// removed.
#[must_use]
pub fn decode_value(value: Value) -> OutputData<Value> {
    let mut is_secret = false;
    match decode(value, &mut is_secret) {
        Some(value) => OutputData::known(value, is_secret),
        None => OutputData::unknown(is_secret),
    }
}

fn decode(value: Value, is_secret: &mut bool) -> Option<Value> {
    match value {
        Value::String(s) if s == UNKNOWN_VALUE => None,
        Value::Array(items) => {
            let mut decoded = Vec::with_capacity(items.len());
            let mut known = true;
            for item in items {
                match decode(item, is_secret) {
                    Some(item) => decoded.push(item),
                    None => known = false,
                }
            }
            known.then_some(Value::Array(decoded))
        }
        Value::Object(mut object) => {
            if object.get(SECRET_SIG_KEY).and_then(Value::as_str) == Some(SECRET_SIG) {
                *is_secret = true;
                let inner = object.remove("value").unwrap_or(Value::Null);
                return decode(inner, is_secret);
            }

            let mut decoded = Map::with_capacity(object.len());
            let mut known = true;
            for (key, item) in object {
                match decode(item, is_secret) {
                    Some(item) => {
                        decoded.insert(key, item);
                    }
                    None => known = false,
                }
            }
            known.then_some(Value::Object(decoded))
        }
        other => Some(other),
    }
}

/// Decodes every property of a response.
#[must_use]
pub fn deserialize_properties(properties: Properties) -> BTreeMap<String, OutputData<Value>> {
    properties
        .into_iter()
        .map(|(name, value)| (name, decode_value(value)))
        .collect()
}

/// Collapses decoded properties into one object.
///
/// The result is known only if every property is, and secret if any is.
#[must_use]
pub fn collect_properties(
    properties: BTreeMap<String, OutputData<Value>>,
) -> OutputData<Properties> {
    let (names, data): (Vec<_>, Vec<_>) = properties.into_iter().unzip();
    OutputData::collect(data).map(|values| names.into_iter().zip(values).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn serializes_known_unknown_and_secret() {
        let bucket = ResourceId::new(40);
        let mut inputs = Inputs::new();
        inputs.insert("acl".into(), Output::known(json!("private")));
        inputs.insert("arn".into(), Output::unknown().with_dependency(bucket));
        inputs.insert("password".into(), Output::secret(json!("hunter2")));

        let serialized = serialize_inputs(&inputs, true).await.unwrap();

        assert_eq!(serialized.properties["acl"], json!("private"));
        assert_eq!(serialized.properties["arn"], json!(UNKNOWN_VALUE));
        assert_eq!(
            serialized.properties["password"],
            json!({ SECRET_SIG_KEY: SECRET_SIG, "value": "hunter2" })
        );
        assert!(serialized.has_unknowns);
        assert!(serialized.has_secrets);
        assert_eq!(serialized.dependencies, BTreeSet::from([bucket]));
        assert!(serialized.property_dependencies["acl"].is_empty());
        assert_eq!(serialized.property_dependencies["arn"], BTreeSet::from([bucket]));
    }

    #[tokio::test]
    async fn secrets_are_plain_without_keep_secrets() {
        let mut inputs = Inputs::new();
        inputs.insert("token".into(), Output::secret(json!("t")));

        let serialized = serialize_inputs(&inputs, false).await.unwrap();
        assert_eq!(serialized.properties["token"], json!("t"));
        assert!(serialized.has_secrets);
    }

    #[tokio::test]
    async fn failed_input_fails_serialization() {
        let mut inputs = Inputs::new();
        inputs.insert("ok".into(), Output::known(json!(1)));
        inputs.insert("bad".into(), Output::failed(OutputError::failed("nope")));

        let err = serialize_inputs(&inputs, true).await.unwrap_err();
        assert_eq!(err, OutputError::failed("nope"));
    }

    #[test]
    fn decodes_nested_shapes() {
        let plain = decode_value(json!({ "a": [1, 2] }));
        assert_eq!(plain.value(), Some(&json!({ "a": [1, 2] })));
        assert!(!plain.is_secret());

        let nested_unknown = decode_value(json!({ "a": [1, UNKNOWN_VALUE] }));
        assert!(!nested_unknown.is_known());

        let nested_secret = decode_value(json!({
            "db": { SECRET_SIG_KEY: SECRET_SIG, "value": { "user": "admin" } }
        }));
        assert!(nested_secret.is_secret());
        assert_eq!(
            nested_secret.value(),
            Some(&json!({ "db": { "user": "admin" } }))
        );
    }

    #[test]
    fn secret_unknown_stays_secret() {
        let data = decode_value(json!({ SECRET_SIG_KEY: SECRET_SIG, "value": UNKNOWN_VALUE }));
        assert!(!data.is_known());
        assert!(data.is_secret());
    }

    #[test]
    fn wrap_then_decode_recovers_value() {
        let data = decode_value(wrap_secret(json!(42)));
        assert_eq!(data, OutputData::known(json!(42), true));
    }

    #[test]
    fn collect_properties_merges_flags() {
        let mut properties = BTreeMap::new();
        properties.insert("a".to_string(), OutputData::known(json!(1), false));
        properties.insert("b".to_string(), OutputData::known(json!(2), true));

        let collected = collect_properties(properties);
        assert!(collected.is_secret());
        assert_eq!(
            collected.value().map(|p| Value::Object(p.clone())),
            Some(json!({ "a": 1, "b": 2 }))
        );
    }
}
