use serde_json::Value;

/// Unify line endings, collapse whitespace runs to one space, trim.
pub fn normalize_text(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    unified.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Equality used for conflict detection. Strings compare normalized,
/// everything else structurally.
pub fn values_equivalent(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::String(x), Value::String(y)) => x == y || normalize_text(x) == normalize_text(y),
        _ => a == b,
    }
}

/// Length in characters. Non-string values count their compact JSON form.
pub fn value_len(value: &Value) -> usize {
    match value {
        Value::String(s) => s.chars().count(),
        other => other.to_string().chars().count(),
    }
}
