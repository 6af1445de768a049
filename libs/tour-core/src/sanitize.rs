use serde_json::Value;
use tracing::debug;

/// Strips object keys that a document store would read as operators
/// (`$gt`, `$where`, ...) or as nested paths (`a.b`), at any depth.
pub fn strip_operator_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(key, _)| {
                    let keep = !key.starts_with('$') && !key.contains('.');
                    if !keep {
                        debug!("dropping operator-like key from request body: {}", key);
                    }
                    keep
                })
                .map(|(key, value)| (key, strip_operator_keys(value)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_operator_keys).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn removes_nested_operator_keys() {
        let body = json!({
            "name": "The Park Camper",
            "price": {"$gt": 0},
            "a.b": 1,
            "images": [{"$where": "sleep(100)", "src": "x.jpg"}]
        });
        assert_eq!(
            strip_operator_keys(body),
            json!({"name": "The Park Camper", "price": {}, "images": [{"src": "x.jpg"}]})
        );
    }

    #[test]
    fn leaves_scalars_alone() {
        assert_eq!(strip_operator_keys(json!("$gt")), json!("$gt"));
    }
}
