//! Operation ordering helpers.
//!
//! An operation is ordered either *explicitly* (a non-negative `order` attribute) or *implicitly* (the integer formed
//! by the trailing decimal digits of its member name). Explicit order always wins.

/// Parse the implicit order carried by a member name.
///
/// ## Parameters
/// - `name`: the member name, e.g. `delete1` or `insert_row_007`.
///
/// ## Returns
/// - `Some(n)`: the value of the longest trailing run of ASCII digits.
/// - `None`: the name does not end in a digit, or the digits do not fit in a `u32`.
///
/// ## Examples
/// ```rust
/// use dbsetup_core::trailing_order;
///
/// assert_eq!(trailing_order("op2"), Some(2));
/// assert_eq!(trailing_order("insert_007"), Some(7));
/// assert_eq!(trailing_order("deleteAll"), None);
/// ```
pub fn trailing_order(name: &str) -> Option<u32> {
    let digits_start = name
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(idx, _)| idx)?;
    name[digits_start..].parse().ok()
}

/// Combine an explicit order attribute with an implicit order.
///
/// ## Parameters
/// - `explicit`: the raw `order` attribute; any negative value means "not given".
/// - `implicit`: the implicit order computed by [`trailing_order`].
///
/// ## Returns
/// - The explicit order when it is `>= 0`, otherwise the implicit order, otherwise `None`.
///
/// ## Examples
/// ```rust
/// use dbsetup_core::effective_order;
///
/// assert_eq!(effective_order(3, Some(9)), Some(3));
/// assert_eq!(effective_order(-1, Some(9)), Some(9));
/// assert_eq!(effective_order(-1, None), None);
/// ```
pub fn effective_order(explicit: i32, implicit: Option<u32>) -> Option<u32> {
    u32::try_from(explicit).ok().or(implicit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_order_single_digit() {
        assert_eq!(trailing_order("op1"), Some(1));
    }

    #[test]
    fn test_trailing_order_multi_digit() {
        assert_eq!(trailing_order("insert1234"), Some(1234));
    }

    #[test]
    fn test_trailing_order_leading_zeros() {
        assert_eq!(trailing_order("op007"), Some(7));
    }

    #[test]
    fn test_trailing_order_only_trailing_run_counts() {
        assert_eq!(trailing_order("v2_insert10"), Some(10));
        assert_eq!(trailing_order("v2_insert"), None);
    }

    #[test]
    fn test_trailing_order_no_digits() {
        assert_eq!(trailing_order("deleteAll"), None);
        assert_eq!(trailing_order(""), None);
    }

    #[test]
    fn test_trailing_order_all_digits() {
        assert_eq!(trailing_order("42"), Some(42));
    }

    #[test]
    fn test_trailing_order_overflow_is_none() {
        assert_eq!(trailing_order("op99999999999"), None);
    }

    #[test]
    fn test_trailing_order_non_ascii_prefix() {
        assert_eq!(trailing_order("éinsert3"), Some(3));
    }

    #[test]
    fn test_effective_order_explicit_wins() {
        assert_eq!(effective_order(0, Some(5)), Some(0));
    }

    #[test]
    fn test_effective_order_negative_falls_back() {
        assert_eq!(effective_order(-1, Some(5)), Some(5));
        assert_eq!(effective_order(-42, Some(5)), Some(5));
    }

    #[test]
    fn test_effective_order_unresolvable() {
        assert_eq!(effective_order(-1, None), None);
    }
}
