//! Row and context types shared between the pipeline and its collaborators.

use serde_json::{Map, Value};

/// A single result row: column name to normalized scalar value.
///
/// Values are already normalized by the relational adapter: arbitrary-precision
/// decimals become JSON numbers, date/time values become ISO-8601 strings, and
/// everything else passes through unchanged.
pub type Row = Map<String, Value>;

/// Prior-conversation context loaded once at request start.
///
/// An empty map means "no previous conversation". The pipeline never mutates
/// the context; it only reads it for classification and query rewriting.
pub type MemoryContext = Map<String, Value>;

/// Render a memory context for inclusion in a prompt.
///
/// Returns `None` when the context is empty or carries nothing serializable,
/// so callers can skip the gateway round-trip entirely.
pub fn serialize_context(context: &MemoryContext) -> Option<String> {
    if context.is_empty() {
        return None;
    }
    match serde_json::to_string_pretty(context) {
        Ok(s) if s != "{}" => Some(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context_with(key: &str, value: Value) -> MemoryContext {
        let mut ctx = Map::new();
        ctx.insert(key.to_string(), value);
        ctx
    }

    #[test]
    fn test_serialize_empty_context_is_none() {
        assert!(serialize_context(&Map::new()).is_none());
    }

    #[test]
    fn test_serialize_context_with_content() {
        let ctx = context_with("last_query", json!("good reviews"));
        let s = serialize_context(&ctx).unwrap();
        assert!(s.contains("last_query"));
        assert!(s.contains("good reviews"));
    }

    #[test]
    fn test_serialize_context_nested() {
        let ctx = context_with("turns", json!([{"q": "top products", "a": "..."}]));
        let s = serialize_context(&ctx).unwrap();
        assert!(s.contains("top products"));
    }

    #[test]
    fn test_row_round_trip() {
        let mut row = Row::new();
        row.insert("avg_score".to_string(), json!(4.5));
        row.insert("order_date".to_string(), json!("2018-03-01T00:00:00+00:00"));
        let encoded = serde_json::to_string(&row).unwrap();
        let decoded: Row = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, row);
    }
}
