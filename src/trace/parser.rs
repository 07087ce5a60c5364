//! Parser for `<rw> <hex-address>` trace lines.

use std::fmt;
use std::num::IntErrorKind;

use super::models::TraceRecord;

/// Reasons a trace line can be rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The line did not split into exactly two whitespace-separated tokens.
    WrongTokenCount { found: usize },
    /// The address token is not valid hexadecimal.
    InvalidAddress { token: String },
    /// The address token is valid hexadecimal but wider than 64 bits.
    AddressOverflow { token: String },
    /// The access kind token is not a read or write marker.
    UnknownAccessKind { token: String },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::WrongTokenCount { found } => {
                write!(f, "expected 2 whitespace-separated tokens, found {found}")
            }
            ParseError::InvalidAddress { token } => {
                write!(f, "invalid hexadecimal address '{token}'")
            }
            ParseError::AddressOverflow { token } => {
                write!(f, "address '{token}' does not fit in 64 bits")
            }
            ParseError::UnknownAccessKind { token } => {
                write!(f, "unknown access kind '{token}', expected r or w")
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse one trace line into its access kind and address.
///
/// The address is read as base 16, with an optional `0x`/`0X` prefix.
pub fn parse_line(line: &str) -> Result<TraceRecord, ParseError> {
    let mut tokens = line.split_whitespace();
    let (rw, addr) = match (tokens.next(), tokens.next(), tokens.next()) {
        (Some(rw), Some(addr), None) => (rw, addr),
        _ => {
            return Err(ParseError::WrongTokenCount {
                found: line.split_whitespace().count(),
            })
        }
    };

    let digits = addr
        .strip_prefix("0x")
        .or_else(|| addr.strip_prefix("0X"))
        .unwrap_or(addr);
    let addr = u64::from_str_radix(digits, 16).map_err(|e| match e.kind() {
        // Overflow can be reported before a later non-hex digit is seen
        IntErrorKind::PosOverflow if digits.bytes().all(|b| b.is_ascii_hexdigit()) => {
            ParseError::AddressOverflow {
                token: addr.to_string(),
            }
        }
        _ => ParseError::InvalidAddress {
            token: addr.to_string(),
        },
    })?;

    Ok(TraceRecord {
        rw: rw.to_string(),
        addr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_read() {
        let record = parse_line("R 3e8").unwrap();
        assert_eq!(record.rw, "R");
        assert_eq!(record.addr, 1000);
    }

    #[test]
    fn test_parse_trailing_newline_and_tabs() {
        let record = parse_line("w\t7fff5a3c\r\n").unwrap();
        assert_eq!(record.rw, "w");
        assert_eq!(record.addr, 0x7fff_5a3c);
    }

    #[test]
    fn test_parse_uppercase_hex() {
        assert_eq!(parse_line("R 3FFFFFFF").unwrap().addr, 1_073_741_823);
    }

    #[test]
    fn test_parse_full_width_address() {
        let record = parse_line("r ffffffffffffffff").unwrap();
        assert_eq!(record.addr, u64::MAX);
    }

    #[test]
    fn test_single_token_rejected() {
        assert_eq!(
            parse_line("R"),
            Err(ParseError::WrongTokenCount { found: 1 })
        );
    }

    #[test]
    fn test_empty_line_rejected() {
        assert_eq!(parse_line(""), Err(ParseError::WrongTokenCount { found: 0 }));
    }

    #[test]
    fn test_three_tokens_rejected() {
        assert_eq!(
            parse_line("R 10 extra"),
            Err(ParseError::WrongTokenCount { found: 3 })
        );
    }

    #[test]
    fn test_prefixed_address() {
        assert_eq!(parse_line("R 0x3e8").unwrap().addr, 1000);
        assert_eq!(parse_line("W 0X3E8").unwrap().addr, 1000);
    }

    #[test]
    fn test_bare_prefix_rejected() {
        assert_eq!(
            parse_line("R 0x"),
            Err(ParseError::InvalidAddress {
                token: "0x".to_string()
            })
        );
    }

    #[test]
    fn test_wide_address_overflows() {
        assert_eq!(
            parse_line("R 1ffffffffffffffff"),
            Err(ParseError::AddressOverflow {
                token: "1ffffffffffffffff".to_string()
            })
        );
    }

    #[test]
    fn test_wide_non_hex_is_invalid() {
        assert!(matches!(
            parse_line("R 1ffffffffffffffffzz"),
            Err(ParseError::InvalidAddress { .. })
        ));
    }

    #[test]
    fn test_non_hex_address_rejected() {
        let err = parse_line("W zz").unwrap_err();
        assert_eq!(err.to_string(), "invalid hexadecimal address 'zz'");
    }
}
