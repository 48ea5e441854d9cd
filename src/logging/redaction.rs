//! Sensitive data redaction for log contexts
//!
//! Keys are matched case-insensitively by substring after separators
//! (`_`, `-`, space, `.`) are stripped, so `api_key`, `apiKey` and `API-KEY`
//! all match the `apikey` entry. A matching key has its whole value replaced,
//! whatever its type. Arrays and scalar leaves pass through unchanged.

use serde_json::Value;

use super::entry::Context;

/// Replacement string for redacted values
pub const REDACTED: &str = "[REDACTED]";

/// Deny-list of sensitive key fragments, already normalized
pub const SENSITIVE_KEYS: &[&str] = &[
    "mnemonic",
    "seed",
    "privatekey",
    "xprv",
    "password",
    "passphrase",
    "passcode",
    "secret",
    "token",
    "apikey",
    "authorization",
    "credential",
    "paymenthash",
    "preimage",
    "invoice",
    "bolt11",
    "macaroon",
];

fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' ' | '.'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Check whether a context key names sensitive data
pub fn is_sensitive_key(key: &str) -> bool {
    let normalized = normalize_key(key);
    SENSITIVE_KEYS
        .iter()
        .any(|fragment| normalized.contains(fragment))
}

/// Redact a context mapping, recursing into nested mappings
pub fn redact(context: Context) -> Context {
    context
        .into_iter()
        .map(|(key, value)| {
            let value = if is_sensitive_key(&key) {
                Value::String(REDACTED.to_string())
            } else {
                match value {
                    Value::Object(nested) => Value::Object(redact(nested)),
                    other => other,
                }
            };
            (key, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx(value: Value) -> Context {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_sensitive_key_variants() {
        assert!(is_sensitive_key("password"));
        assert!(is_sensitive_key("PASSWORD"));
        assert!(is_sensitive_key("apiKey"));
        assert!(is_sensitive_key("api_key"));
        assert!(is_sensitive_key("API-KEY"));
        assert!(is_sensitive_key("private key"));
        assert!(is_sensitive_key("paymentHash"));
        assert!(is_sensitive_key("walletMnemonic"));
        assert!(is_sensitive_key("refresh_token"));

        assert!(!is_sensitive_key("name"));
        assert!(!is_sensitive_key("amount"));
        assert!(!is_sensitive_key("method"));
    }

    #[test]
    fn test_redacts_top_level() {
        let redacted = redact(ctx(json!({"seed": "abandon abandon", "amount": 1000})));
        assert_eq!(redacted, ctx(json!({"seed": "[REDACTED]", "amount": 1000})));
    }

    #[test]
    fn test_redacts_nested_any_depth() {
        let redacted = redact(ctx(json!({
            "user": {"apiKey": "abc", "name": "bob"},
            "deep": {"a": {"b": {"preimage": "00ff"}}}
        })));
        assert_eq!(
            redacted,
            ctx(json!({
                "user": {"apiKey": "[REDACTED]", "name": "bob"},
                "deep": {"a": {"b": {"preimage": "[REDACTED]"}}}
            }))
        );
    }

    #[test]
    fn test_matched_subtree_replaced_whole() {
        let redacted = redact(ctx(json!({"secrets": {"inner": 1, "other": [1, 2]}})));
        assert_eq!(redacted, ctx(json!({"secrets": "[REDACTED]"})));
    }

    #[test]
    fn test_arrays_pass_through() {
        let redacted = redact(ctx(json!({"items": [{"password": "x"}, 2]})));
        assert_eq!(redacted, ctx(json!({"items": [{"password": "x"}, 2]})));
    }

    #[test]
    fn test_key_order_preserved() {
        let redacted = redact(ctx(json!({"z": 1, "token": "t", "a": 2})));
        let keys: Vec<&str> = redacted.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z", "token", "a"]);
    }
}
