//! Per-field configuration merging.
//!
//! Different options merge differently. Request-identity options (`url`,
//! `params`, `data`) belong to a single call and are never inherited from
//! defaults; `headers` accumulate through a deep merge; everything else lets the
//! per-call value win. The assignment lives in a lookup table, see
//! [`strategy_for`].

use serde_json::{Map, Value};
use std::collections::BTreeSet;

use crate::config::{keys, ConfigValue, RequestConfig};
use crate::kind::Kind;

/// How one option combines a base value with an override value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Override value if set, otherwise the base value
    OverrideWins,
    /// Override value if set, otherwise the option is left unset
    OverrideOnly,
    /// Deep merge when both values are plain objects, otherwise
    /// [`MergeStrategy::OverrideWinsDefaultBase`]
    DeepMergeIfBothObjects,
    /// Override value if set (null included), otherwise the base value
    OverrideWinsDefaultBase,
}

/// Options with a strategy other than [`MergeStrategy::OverrideWins`].
const STRATEGIES: &[(&str, MergeStrategy)] = &[
    (keys::URL, MergeStrategy::OverrideOnly),
    (keys::PARAMS, MergeStrategy::OverrideOnly),
    (keys::DATA, MergeStrategy::OverrideOnly),
    (keys::HEADERS, MergeStrategy::DeepMergeIfBothObjects),
    (keys::AUTH, MergeStrategy::OverrideWinsDefaultBase),
];

/// Strategy assigned to option `key`.
#[must_use]
pub fn strategy_for(key: &str) -> MergeStrategy {
    STRATEGIES
        .iter()
        .find(|(name, _)| *name == key)
        .map_or(MergeStrategy::OverrideWins, |(_, strategy)| *strategy)
}

impl MergeStrategy {
    /// Combine `base` and `overrides` for one option. `None` means unset.
    #[must_use]
    pub fn apply(
        self,
        base: Option<&ConfigValue>,
        overrides: Option<&ConfigValue>,
    ) -> Option<ConfigValue> {
        match self {
            Self::OverrideWins | Self::OverrideWinsDefaultBase => overrides.or(base).cloned(),
            Self::OverrideOnly => overrides.cloned(),
            Self::DeepMergeIfBothObjects => match (base, overrides) {
                (Some(ConfigValue::Json(base)), Some(ConfigValue::Json(overrides)))
                    if base.is_plain_object() && overrides.is_plain_object() =>
                {
                    Some(ConfigValue::Json(deep_merge(base, overrides)))
                }
                _ => Self::OverrideWinsDefaultBase.apply(base, overrides),
            },
        }
    }
}

/// Merge per-call `overrides` over `base`.
///
/// Neither input is modified. A missing `overrides` behaves like an empty
/// configuration, so the result is still passed through every option's
/// strategy.
#[must_use]
pub fn merge_config(base: &RequestConfig, overrides: Option<&RequestConfig>) -> RequestConfig {
    let empty = RequestConfig::new();
    let overrides = overrides.unwrap_or(&empty);

    let names: BTreeSet<&str> = base.keys().chain(overrides.keys()).collect();

    let mut merged = RequestConfig::new();
    for key in names {
        if let Some(value) = strategy_for(key).apply(base.get(key), overrides.get(key)) {
            merged.set(key, value);
        }
    }
    merged
}

/// Recursively merge two JSON values.
///
/// Nested keys holding plain objects on both sides are merged; any other
/// override value replaces the base value wholesale. Non-object inputs
/// yield a copy of `overrides`.
#[must_use]
pub fn deep_merge(base: &Value, overrides: &Value) -> Value {
    match (base, overrides) {
        (Value::Object(base), Value::Object(overrides)) => {
            let mut merged: Map<String, Value> = base.clone();
            for (key, value) in overrides {
                let next = match merged.get(key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        deep_merge(existing, value)
                    }
                    _ => value.clone(),
                };
                merged.insert(key.clone(), next);
            }
            Value::Object(merged)
        }
        (_, overrides) => overrides.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn json_of(config: &RequestConfig, key: &str) -> Option<Value> {
        config.get(key).and_then(ConfigValue::to_json)
    }

    #[test]
    fn test_strategy_table() {
        assert_eq!(strategy_for("url"), MergeStrategy::OverrideOnly);
        assert_eq!(strategy_for("params"), MergeStrategy::OverrideOnly);
        assert_eq!(strategy_for("data"), MergeStrategy::OverrideOnly);
        assert_eq!(strategy_for("headers"), MergeStrategy::DeepMergeIfBothObjects);
        assert_eq!(strategy_for("auth"), MergeStrategy::OverrideWinsDefaultBase);
        assert_eq!(strategy_for("timeout"), MergeStrategy::OverrideWins);
        assert_eq!(strategy_for("method"), MergeStrategy::OverrideWins);
        assert_eq!(strategy_for("somethingElse"), MergeStrategy::OverrideWins);
    }

    #[test]
    fn test_missing_override_equals_empty_override() {
        let defaults = RequestConfig::defaults();
        assert_eq!(merge_config(&defaults, None), defaults);
        assert_eq!(merge_config(&defaults, Some(&RequestConfig::new())), defaults);
    }

    #[test]
    fn test_request_options_are_not_inherited() {
        let local_defaults = RequestConfig::new()
            .with_url("__sample url__")
            .with(keys::PARAMS, json!("__sample params__"))
            .with_data(json!({"foo": true}));

        let merged = merge_config(&local_defaults, Some(&RequestConfig::new()));
        assert!(merged.url().is_none());
        assert!(merged.get(keys::PARAMS).is_none());
        assert!(merged.data().is_none());
    }

    #[test]
    fn test_request_options_from_override() {
        let merged = merge_config(
            &RequestConfig::new().with_url("/old"),
            Some(&RequestConfig::new().with_url("/new")),
        );
        assert_eq!(merged.url(), Some("/new"));
    }

    #[test]
    fn test_auth_from_override_when_base_unset() {
        let merged = merge_config(
            &RequestConfig::new(),
            Some(&RequestConfig::new().with_auth("foo", "test")),
        );
        assert_eq!(
            json_of(&merged, keys::AUTH),
            Some(json!({"username": "foo", "password": "test"}))
        );
    }

    #[test]
    fn test_auth_is_replaced_wholesale() {
        let merged = merge_config(
            &RequestConfig::new().with(
                keys::AUTH,
                json!({"username": "foo", "password": "test", "extra": 1}),
            ),
            Some(&RequestConfig::new().with_auth("baz", "foobar")),
        );
        assert_eq!(
            json_of(&merged, keys::AUTH),
            Some(json!({"username": "baz", "password": "foobar"}))
        );
    }

    #[test]
    fn test_auth_inherited_from_base() {
        let merged = merge_config(
            &RequestConfig::new().with_auth("foo", "test"),
            Some(&RequestConfig::new().with_url("/x")),
        );
        assert_eq!(merged.auth().map(|auth| auth.username), Some("foo".to_string()));
    }

    #[test]
    fn test_non_object_headers_override() {
        let base = RequestConfig::new().with_headers(json!({
            "common": { "Accept": "application/json, text/plain, */*" }
        }));
        let merged = merge_config(&base, Some(&RequestConfig::new().with_headers(Value::Null)));
        assert_eq!(merged.to_json(), json!({ "headers": null }));
    }

    #[test]
    fn test_headers_deep_merge() {
        let base = RequestConfig::new().with_headers(json!({
            "common": { "Accept": "a", "X-Base": "1" },
            "post": { "Content-Type": "form" }
        }));
        let overrides = RequestConfig::new().with_headers(json!({
            "common": { "Accept": "b" },
            "X-Call": "2"
        }));

        let merged = merge_config(&base, Some(&overrides));
        assert_eq!(
            merged.headers(),
            Some(&json!({
                "common": { "Accept": "b", "X-Base": "1" },
                "post": { "Content-Type": "form" },
                "X-Call": "2"
            }))
        );
    }

    #[test]
    fn test_headers_object_over_non_object_base() {
        let merged = merge_config(
            &RequestConfig::new().with_headers(json!("bogus")),
            Some(&RequestConfig::new().with_headers(json!({"A": "1"}))),
        );
        assert_eq!(merged.headers(), Some(&json!({"A": "1"})));
    }

    #[test]
    fn test_deep_merge_replaces_arrays_and_null() {
        let merged = deep_merge(
            &json!({"a": [1, 2], "b": {"c": 1}, "d": {"e": 1}}),
            &json!({"a": [3], "b": null, "d": {"f": 2}}),
        );
        assert_eq!(merged, json!({"a": [3], "b": null, "d": {"e": 1, "f": 2}}));
    }

    #[test]
    fn test_merged_result_is_independent() {
        let base = RequestConfig::defaults();
        let mut merged = merge_config(&base, None);
        merged.set(keys::HEADERS, json!({"changed": true}));
        assert_eq!(
            base.headers().unwrap()["common"]["Accept"],
            json!("application/json, text/plain, */*")
        );
    }

    #[test]
    fn test_timeout_override_keeps_other_fields() {
        let defaults = RequestConfig::defaults();
        let overrides = RequestConfig::new().with_timeout(Duration::from_millis(123));
        let merged = merge_config(&defaults, Some(&overrides));
        assert_eq!(merged.timeout(), Some(Duration::from_millis(123)));
        for key in defaults.keys().filter(|key| *key != keys::TIMEOUT) {
            assert_eq!(merged.get(key), defaults.get(key), "field {key}");
        }
    }

    #[test]
    fn test_later_override_wins() {
        let base = RequestConfig::new()
            .with_method("get")
            .with_timeout(Duration::from_secs(1));
        let mid = RequestConfig::new().with_method("put");
        let last = RequestConfig::new()
            .with_method("delete")
            .with_timeout(Duration::from_secs(3));

        let chained = merge_config(&merge_config(&base, Some(&mid)), Some(&last));
        let direct = merge_config(&base, Some(&last));
        assert_eq!(chained.method(), direct.method());
        assert_eq!(chained.timeout(), direct.timeout());
    }

    #[test]
    fn test_unknown_keys_carry_through() {
        let merged = merge_config(
            &RequestConfig::new().with("custom", json!(1)),
            Some(&RequestConfig::new().with("other", json!(2))),
        );
        assert_eq!(json_of(&merged, "custom"), Some(json!(1)));
        assert_eq!(json_of(&merged, "other"), Some(json!(2)));
    }

    #[test]
    fn test_params_serializer_override_wins() {
        let base = RequestConfig::new().with_params_serializer(|_| "base".to_string());
        let merged = merge_config(&base, None);
        assert!(merged.params_serializer().is_some());
        assert_eq!(merged.params_serializer(), base.params_serializer());
    }
}
