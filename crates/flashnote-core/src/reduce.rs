//! Argument reduction.
//!
//! Collapses the ordered values of one enqueue call into the single payload
//! that gets stored.

use serde_json::Value;

use crate::ArgumentStyle;

/// String form of a value for joining: strings render bare, anything else
/// as its compact JSON text.
fn join_form(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Reduce one enqueue call's values to the payload to store.
///
/// Pure; never touches the session. An empty `values` slice reduces to
/// `Null` (or an empty string/sequence for `Join`/`Array`).
pub fn reduce_arguments(style: ArgumentStyle, separator: &str, values: &[Value]) -> Value {
    match style {
        ArgumentStyle::Single => values.first().cloned().unwrap_or(Value::Null),
        ArgumentStyle::Join => Value::String(
            values
                .iter()
                .map(join_form)
                .collect::<Vec<_>>()
                .join(separator),
        ),
        ArgumentStyle::Array => Value::Array(values.to_vec()),
        ArgumentStyle::Auto => {
            if values.len() == 1 {
                values[0].clone()
            } else {
                Value::Array(values.to_vec())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_keeps_first_value() {
        let payload = reduce_arguments(ArgumentStyle::Single, "", &[json!("a"), json!("b")]);
        assert_eq!(payload, json!("a"));
    }

    #[test]
    fn single_of_nothing_is_null() {
        assert_eq!(reduce_arguments(ArgumentStyle::Single, "", &[]), Value::Null);
    }

    #[test]
    fn join_concatenates_with_separator() {
        let payload = reduce_arguments(
            ArgumentStyle::Join,
            ",",
            &[json!("x"), json!("y"), json!("z")],
        );
        assert_eq!(payload, json!("x,y,z"));
    }

    #[test]
    fn join_default_separator_is_empty() {
        let payload = reduce_arguments(ArgumentStyle::Join, "", &[json!("x"), json!("y")]);
        assert_eq!(payload, json!("xy"));
    }

    #[test]
    fn join_renders_non_strings_as_json() {
        let payload = reduce_arguments(
            ArgumentStyle::Join,
            " ",
            &[json!("count:"), json!(3), json!(true)],
        );
        assert_eq!(payload, json!("count: 3 true"));
    }

    #[test]
    fn array_always_wraps() {
        let payload = reduce_arguments(ArgumentStyle::Array, "", &[json!("only")]);
        assert_eq!(payload, json!(["only"]));
    }

    #[test]
    fn auto_unwraps_a_lone_value() {
        assert_eq!(
            reduce_arguments(ArgumentStyle::Auto, "", &[json!("only")]),
            json!("only")
        );
        assert_eq!(
            reduce_arguments(ArgumentStyle::Auto, "", &[json!("a"), json!("b")]),
            json!(["a", "b"])
        );
    }
}
