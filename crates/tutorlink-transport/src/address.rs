//! Host endpoint addresses: `ip:port` for IPv4 names, `[ip]:port` for IPv6.

use std::fmt;
use std::str::FromStr;

/// A parse failure for an [`Address`]. Never yields a partial address.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    /// No `:` separating host from port.
    #[error("missing ':' before the port")]
    MissingPort,

    /// An IPv6 literal opened with `[` but never closed.
    #[error("missing closing ']' in IPv6 address")]
    UnclosedBracket,

    /// The port was not a number.
    #[error("failed to parse port ({0})")]
    BadPort(String),

    /// The port was numeric but outside `[0, 65535]`.
    #[error("port out of range ({0})")]
    PortOutOfRange(i64),
}

/// A `host:port` endpoint, immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    host: String,
    port: u16,
    ipv6: bool,
}

impl Address {
    /// Builds an address from explicit fields. A host containing `:`
    /// is taken to be an IPv6 literal.
    pub fn new(host: impl Into<String>, port: u16) -> Address {
        let host = host.into();
        let ipv6 = host.contains(':');
        Address { host, port, ipv6 }
    }

    /// Parses the textual form.
    ///
    /// A leading `[` starts an IPv6 literal: the host is everything up
    /// to the matching `]`, and the port follows the next `:`. Any
    /// other text splits on the first `:` into host and port.
    pub fn parse(text: &str) -> Result<Address, AddressError> {
        if let Some(rest) = text.strip_prefix('[') {
            let end = rest.find(']').ok_or(AddressError::UnclosedBracket)?;
            let host = &rest[..end];
            let after = &rest[end + 1..];
            let port_text = after
                .strip_prefix(':')
                .ok_or(AddressError::MissingPort)?;
            Ok(Address {
                host: host.to_string(),
                port: parse_port(port_text)?,
                ipv6: true,
            })
        } else {
            let sep = text.find(':').ok_or(AddressError::MissingPort)?;
            Ok(Address {
                host: text[..sep].to_string(),
                port: parse_port(&text[sep + 1..])?,
                ipv6: false,
            })
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn is_ipv6(&self) -> bool {
        self.ipv6
    }
}

fn parse_port(text: &str) -> Result<u16, AddressError> {
    let value: i64 = text
        .parse()
        .map_err(|_| AddressError::BadPort(text.to_string()))?;
    u16::try_from(value).map_err(|_| AddressError::PortOutOfRange(value))
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ipv6 {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::parse(s)
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ipv4() {
        let a = Address::parse("192.168.0.1:23432").unwrap();
        assert_eq!(a.host(), "192.168.0.1");
        assert_eq!(a.port(), 23432);
        assert!(!a.is_ipv6());
    }

    #[test]
    fn test_parse_hostname() {
        let a = Address::parse("example.org:80").unwrap();
        assert_eq!(a.host(), "example.org");
        assert_eq!(a.port(), 80);
        assert!(!a.is_ipv6());
    }

    #[test]
    fn test_parse_ipv6() {
        let a = Address::parse("[2001:db8::1]:443").unwrap();
        assert_eq!(a.host(), "2001:db8::1");
        assert_eq!(a.port(), 443);
        assert!(a.is_ipv6());
    }

    #[test]
    fn test_round_trip_ipv4_and_ipv6() {
        for text in ["10.0.0.2:0", "[::1]:65535", "host.local:9"] {
            let a = Address::parse(text).unwrap();
            assert_eq!(Address::parse(&a.to_string()).unwrap(), a);
            assert_eq!(a.to_string(), text);
        }
    }

    #[test]
    fn test_new_infers_ipv6_from_host() {
        assert!(Address::new("::1", 1).is_ipv6());
        assert!(!Address::new("127.0.0.1", 1).is_ipv6());
        assert_eq!(Address::new("::1", 80).to_string(), "[::1]:80");
    }

    #[test]
    fn test_port_out_of_range() {
        assert_eq!(
            Address::parse("a:65536"),
            Err(AddressError::PortOutOfRange(65536))
        );
        assert_eq!(
            Address::parse("a:-1"),
            Err(AddressError::PortOutOfRange(-1))
        );
        assert_eq!(
            Address::parse("[::1]:99999"),
            Err(AddressError::PortOutOfRange(99999))
        );
    }

    #[test]
    fn test_port_boundaries_accepted() {
        assert_eq!(Address::parse("a:0").unwrap().port(), 0);
        assert_eq!(Address::parse("a:65535").unwrap().port(), 65535);
    }

    #[test]
    fn test_non_numeric_port() {
        assert!(matches!(
            Address::parse("a:http"),
            Err(AddressError::BadPort(_))
        ));
    }

    #[test]
    fn test_malformed_input() {
        assert_eq!(Address::parse("nocolon"), Err(AddressError::MissingPort));
        assert_eq!(
            Address::parse("[::1"),
            Err(AddressError::UnclosedBracket)
        );
        assert_eq!(Address::parse("[::1]80"), Err(AddressError::MissingPort));
    }

    #[test]
    fn test_unbracketed_ipv6_splits_on_first_colon() {
        // Without brackets the first ':' separates host and port, so a
        // bare IPv6 literal fails on the port.
        assert!(matches!(
            Address::parse("2001:db8::1"),
            Err(AddressError::BadPort(_))
        ));
    }

    #[test]
    fn test_from_str() {
        let a: Address = "127.0.0.1:23432".parse().unwrap();
        assert_eq!(a.port(), 23432);
    }
}
