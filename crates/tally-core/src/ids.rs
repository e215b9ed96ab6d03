//! # Identifiers
//!
//! Order and bill identifiers.
//!
//! ```text
//! Order id:  ORD1760264700            ORD + unix seconds
//! Bill id:   INV20251012104500AB12    INV + local timestamp + 4 random chars
//! ```
//!
//! Both formats are parsed by external reporting tools, so they stay fixed.
//! Order numbers strictly increase: when the clock has not moved past the
//! last number issued (same second, or the clock stepped backwards), the
//! next one is `last + 1`. The store keeps `last` on disk so separate
//! processes never hand out the same id.

use chrono::NaiveDateTime;
use uuid::Uuid;

/// Prefix of every order id.
pub const ORDER_ID_PREFIX: &str = "ORD";

/// Prefix of every bill id.
pub const BILL_ID_PREFIX: &str = "INV";

/// Characters a bill id suffix is drawn from.
const BILL_SUFFIX_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Next order number given the clock and the last number issued, if any.
///
/// ## Example
/// ```rust
/// use tally_core::ids::next_order_number;
///
/// assert_eq!(next_order_number(1_760_000_000, None), 1_760_000_000);
/// assert_eq!(next_order_number(1_760_000_000, Some(1_760_000_000)), 1_760_000_001);
/// assert_eq!(next_order_number(1_760_000_009, Some(1_760_000_000)), 1_760_000_009);
/// ```
pub fn next_order_number(now_secs: i64, last: Option<i64>) -> i64 {
    match last {
        Some(last) => now_secs.max(last.saturating_add(1)),
        None => now_secs,
    }
}

/// `ORD<number>`.
pub fn order_id(number: i64) -> String {
    format!("{}{}", ORDER_ID_PREFIX, number)
}

/// Number part of an `ORD<number>` id; `None` for anything else.
pub fn parse_order_id(id: &str) -> Option<i64> {
    let digits = id.trim().strip_prefix(ORDER_ID_PREFIX)?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Builds a bill id for the given local timestamp.
///
/// The four suffix characters are drawn from `A-Z0-9`.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use tally_core::ids::bill_id;
///
/// let at = NaiveDate::from_ymd_opt(2025, 10, 12).unwrap().and_hms_opt(10, 45, 0).unwrap();
/// let id = bill_id(at);
/// assert!(id.starts_with("INV20251012104500"));
/// assert_eq!(id.len(), 21);
/// ```
pub fn bill_id(at: NaiveDateTime) -> String {
    let suffix: String = Uuid::new_v4()
        .as_bytes()
        .iter()
        .take(4)
        .map(|b| BILL_SUFFIX_ALPHABET[usize::from(*b) % BILL_SUFFIX_ALPHABET.len()] as char)
        .collect();
    format!("{}{}{}", BILL_ID_PREFIX, at.format("%Y%m%d%H%M%S"), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_order_numbers_follow_the_clock() {
        assert_eq!(next_order_number(1_760_000_000, None), 1_760_000_000);
        assert_eq!(
            next_order_number(1_760_000_005, Some(1_760_000_000)),
            1_760_000_005
        );
    }

    #[test]
    fn test_order_numbers_never_repeat_within_a_second() {
        let first = next_order_number(1_760_000_000, None);
        let second = next_order_number(1_760_000_000, Some(first));
        let third = next_order_number(1_759_999_990, Some(second));

        assert_eq!(order_id(first), "ORD1760000000");
        assert_eq!(order_id(second), "ORD1760000001");
        assert_eq!(order_id(third), "ORD1760000002");
    }

    #[test]
    fn test_parse_order_id() {
        assert_eq!(parse_order_id("ORD1760000000"), Some(1_760_000_000));
        assert_eq!(parse_order_id(" ORD7 "), Some(7));
        assert_eq!(parse_order_id("ORD"), None);
        assert_eq!(parse_order_id("ORD-5"), None);
        assert_eq!(parse_order_id("INV1"), None);
        assert_eq!(parse_order_id("ORD99999999999999999999"), None);
    }

    #[test]
    fn test_bill_id_format() {
        let at = NaiveDate::from_ymd_opt(2025, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        let id = bill_id(at);

        assert!(id.starts_with("INV20250102030405"));
        let suffix = &id[17..];
        assert_eq!(suffix.len(), 4);
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_bill_suffix_uses_letters_beyond_hex() {
        let at = NaiveDate::from_ymd_opt(2025, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();

        // 200 ids draw 800 suffix characters; hex-only output would never
        // produce G-Z.
        let beyond_hex = (0..200)
            .flat_map(|_| bill_id(at)[17..].chars().collect::<Vec<_>>())
            .any(|c| ('G'..='Z').contains(&c));
        assert!(beyond_hex);
    }
}
