//! Range query helpers for prefix scans.

/// Calculate the exclusive end bound for a prefix range query.
///
/// Given prefix "conv-001:", returns "conv-001;" (next ASCII char after ':').
/// This allows efficient range scans: range(prefix..end_prefix)
pub fn prefix_end_bound(prefix: &str) -> String {
    if prefix.is_empty() {
        return String::new();
    }

    let mut bytes = prefix.as_bytes().to_vec();
    if let Some(last) = bytes.last_mut() {
        *last = last.saturating_add(1);
    }

    String::from_utf8(bytes).unwrap_or_else(|_| format!("{}\x7F", prefix))
}

/// Create a prefix range for redb queries.
pub fn prefix_range(prefix: &str) -> (String, String) {
    (prefix.to_string(), prefix_end_bound(prefix))
}

/// Escape one segment of a `:`-joined composite key.
///
/// The output never contains `:`, so distinct segment tuples always map to
/// distinct keys and prefixes.
pub fn key_segment(segment: &str) -> String {
    segment.replace('%', "%25").replace(':', "%3A")
}

/// Zero-padded timestamp so that lexical order equals time order.
pub fn sortable_timestamp(timestamp_ms: i64) -> String {
    format!("{:020}", timestamp_ms.max(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_end_bound() {
        assert_eq!(prefix_end_bound("conv:"), "conv;");
        assert_eq!(prefix_end_bound("conv:user:"), "conv:user;");
        assert_eq!(prefix_end_bound(""), "");
    }

    #[test]
    fn test_key_segment_escapes_separator() {
        assert_eq!(key_segment("conv-1"), "conv-1");
        assert_eq!(key_segment("a:b"), "a%3Ab");
        assert_eq!(key_segment("50%:"), "50%25%3A");
        assert_ne!(
            format!("{}:{}", key_segment("a:b"), key_segment("c")),
            format!("{}:{}", key_segment("a"), key_segment("b:c"))
        );
    }

    #[test]
    fn test_sortable_timestamp_orders_lexically() {
        assert!(sortable_timestamp(9) < sortable_timestamp(10));
        assert_eq!(sortable_timestamp(-5), sortable_timestamp(0));
        assert_eq!(sortable_timestamp(42).len(), 20);
    }
}
