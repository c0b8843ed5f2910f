//! EVM account addresses.

use crate::error::{CoreError, CoreResult};
use std::str::FromStr;

pub use alloy_primitives::Address;

/// Parse a `0x`-prefixed address from configuration.
///
/// Case is ignored; EIP-55 checksums are not enforced because explorer
/// APIs return lowercase and mixed-case forms interchangeably.
pub fn parse_address(s: &str) -> CoreResult<Address> {
    let trimmed = s.trim();
    let hex_part = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(|| CoreError::InvalidAddress(s.to_string()))?;

    Address::from_str(hex_part).map_err(|_| CoreError::InvalidAddress(s.to_string()))
}

/// Whether a raw address string from an API response is `watched`.
/// Empty or malformed input never matches.
pub fn address_matches(watched: &Address, raw: &str) -> bool {
    parse_address(raw).is_ok_and(|addr| addr == *watched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CHECKSUMMED: &str = "0xE307F534EEc7256331C347Ad73E7A08446F1d7a7";

    #[test]
    fn test_parse_ignores_case() {
        let addr = parse_address(CHECKSUMMED).unwrap();
        assert_eq!(parse_address(&CHECKSUMMED.to_lowercase()).unwrap(), addr);
        assert_eq!(parse_address(&format!("  {}\n", CHECKSUMMED)).unwrap(), addr);
        assert!(addr.to_string().eq_ignore_ascii_case(CHECKSUMMED));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse_address("").is_err());
        assert!(parse_address("e307f534eec7256331c347ad73e7a08446f1d7a7").is_err());
        assert!(parse_address("0x1234").is_err());
        assert!(parse_address("0xZZ07f534eec7256331c347ad73e7a08446f1d7a7").is_err());
        assert_eq!(
            parse_address("0x1234").unwrap_err(),
            CoreError::InvalidAddress("0x1234".to_string())
        );
    }

    #[test]
    fn test_matches_is_case_insensitive() {
        let addr = parse_address(CHECKSUMMED).unwrap();
        assert!(address_matches(&addr, CHECKSUMMED));
        assert!(address_matches(&addr, &CHECKSUMMED.to_lowercase()));
        assert!(address_matches(&addr, &CHECKSUMMED.to_uppercase().replacen("0X", "0x", 1)));
        assert!(!address_matches(&addr, ""));
        assert!(!address_matches(&addr, "0x000Ae314E2A2172a039B26378814C252734f556A"));
    }
}
