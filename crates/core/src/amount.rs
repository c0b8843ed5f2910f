//! Token amount scaling and display formatting.

pub use alloy_primitives::U256;

/// Decimals assumed when a token does not report its precision.
pub const DEFAULT_DECIMALS: u8 = 18;

/// Parse a raw integer amount as returned by explorers and RPC nodes.
pub fn parse_raw(value: &str) -> Option<U256> {
    let digits = value.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    U256::from_str_radix(digits, 10).ok()
}

/// Parse a decimals field, falling back to [`DEFAULT_DECIMALS`].
pub fn parse_decimals(value: &str) -> u8 {
    value.trim().parse::<u8>().unwrap_or(DEFAULT_DECIMALS)
}

/// Nearest `f64` to a 256-bit integer.
pub fn to_f64(value: U256) -> f64 {
    value
        .as_limbs()
        .iter()
        .rev()
        .fold(0.0, |acc, &limb| acc * 18_446_744_073_709_551_616.0 + limb as f64)
}

/// Scale a raw integer amount by `10^decimals`.
///
/// The integer part is split off exactly before converting, so whole-token
/// amounts keep full `f64` precision at any magnitude.
pub fn scale(raw: U256, decimals: u8) -> f64 {
    let divisor = 10f64.powi(decimals as i32);
    match U256::from(10u8).checked_pow(U256::from(decimals)) {
        Some(unit) => {
            let (whole, frac) = raw.div_rem(unit);
            to_f64(whole) + to_f64(frac) / divisor
        }
        None => to_f64(raw) / divisor,
    }
}

/// Human-readable amount from the explorer's string fields.
///
/// Integers are scaled by `decimals`. Values written with a decimal point
/// or exponent are read as already-scaled decimals. Anything else is 0.
pub fn human_amount(value: &str, decimals: u8) -> f64 {
    let value = value.trim();
    if let Some(raw) = parse_raw(value) {
        return scale(raw, decimals);
    }

    let parsed = value.parse::<f64>().ok().filter(|v| v.is_finite());
    if value.contains(['.', 'e', 'E']) {
        parsed.unwrap_or(0.0)
    } else if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
        // wider than 256 bits
        parsed.map_or(0.0, |v| v / 10f64.powi(decimals as i32))
    } else {
        0.0
    }
}

/// Format with a fixed number of decimals and `,` thousands separators,
/// e.g. `1234567.891` at precision 2 becomes `1,234,567.89`.
pub fn format_grouped(value: f64, precision: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let fixed = format!("{:.*}", precision, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(fixed.len() + int_part.len() / 3 + 1);
    if value.is_sign_negative() && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        grouped.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_one_token_with_18_decimals() {
        let amount = human_amount("1000000000000000000", 18);
        assert_eq!(format_grouped(amount, 6), "1.000000");
    }

    #[test]
    fn test_scaling_is_deterministic() {
        let first = format_grouped(human_amount("123456789012345678901", 18), 6);
        for _ in 0..10 {
            assert_eq!(format_grouped(human_amount("123456789012345678901", 18), 6), first);
        }
        assert_eq!(first, "123.456789");
    }

    #[test]
    fn test_scale_respects_decimals() {
        assert_eq!(scale(U256::from(1_500_000u64), 6), 1.5);
        assert_eq!(scale(U256::from(42u64), 0), 42.0);
    }

    #[test]
    fn test_amounts_wider_than_u128_are_scaled() {
        let amount = human_amount("1000000000000000000000000000000000000000", 18);
        assert!((amount - 1e21).abs() / 1e21 < 1e-12, "got {}", amount);

        let raw = U256::MAX;
        let expected = 1.157920892373162e59;
        assert!((scale(raw, 18) - expected).abs() / expected < 1e-12);
    }

    #[test]
    fn test_scale_beyond_u256_unit() {
        // 10^78 does not fit, so the whole value is converted at once
        let amount = scale(U256::from(10u64).checked_pow(U256::from(77u64)).unwrap(), 80);
        assert!((amount - 0.001).abs() < 1e-15);
    }

    #[test]
    fn test_to_f64_spans_limbs() {
        assert_eq!(to_f64(U256::ZERO), 0.0);
        assert_eq!(to_f64(U256::from(u64::MAX) + U256::from(1u64)), 18_446_744_073_709_551_616.0);
    }

    #[test]
    fn test_human_amount_fallbacks() {
        assert_eq!(human_amount("2.5", 18), 2.5);
        assert_eq!(human_amount("", 18), 0.0);
        assert_eq!(human_amount("garbage", 18), 0.0);
        assert_eq!(human_amount("NaN", 18), 0.0);
        assert_eq!(human_amount("1e3", 18), 1000.0);
        assert_eq!(human_amount(" 1000000 ", 6), 1.0);
    }

    #[test]
    fn test_parse_decimals_default() {
        assert_eq!(parse_decimals("6"), 6);
        assert_eq!(parse_decimals(""), DEFAULT_DECIMALS);
        assert_eq!(parse_decimals("-1"), DEFAULT_DECIMALS);
    }

    #[test]
    fn test_format_grouped() {
        assert_eq!(format_grouped(1_234_567.891, 2), "1,234,567.89");
        assert_eq!(format_grouped(999.0, 2), "999.00");
        assert_eq!(format_grouped(1000.0, 0), "1,000");
        assert_eq!(format_grouped(0.0, 6), "0.000000");
        assert_eq!(format_grouped(-12_345.5, 1), "-12,345.5");
        assert_eq!(format_grouped(-0.0000001, 2), "0.00");
    }
}
