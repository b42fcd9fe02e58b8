//! Address identifier classification
//!
//! An elastic address is referenced either by its literal (classic
//! addressing) or by an opaque allocation/association id (pool addressing).
//! The two forms use different parameter keys and different response
//! fields, so every operation classifies first and routes from there.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Classified address reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressRef {
    /// Dotted-quad literal, with the text as given
    V4(Ipv4Addr, String),
    /// IPv6 literal, with the text as given
    V6(Ipv6Addr, String),
    /// `eipalloc-...` / `eipassoc-...` style opaque id
    Pool(String),
}

/// Which identifier a lookup response is matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchField {
    PublicIp,
    AllocationId,
}

impl AddressRef {
    /// Total classification: literal syntax first, everything else is a pool id
    pub fn classify(id: &str) -> Self {
        if let Ok(v4) = id.parse::<Ipv4Addr>() {
            return Self::V4(v4, id.to_string());
        }
        if let Ok(v6) = id.parse::<Ipv6Addr>() {
            return Self::V6(v6, id.to_string());
        }
        Self::Pool(id.to_string())
    }

    /// The identifier exactly as the caller passed it; this is what goes
    /// on the wire
    pub fn as_str(&self) -> &str {
        match self {
            Self::V4(_, literal) | Self::V6(_, literal) => literal,
            Self::Pool(id) => id,
        }
    }

    pub fn is_literal(&self) -> bool {
        !matches!(self, Self::Pool(_))
    }

    /// Key used by associate/release style calls
    pub fn key(&self) -> &'static str {
        if self.is_literal() {
            "PublicIp"
        } else {
            "AllocationId"
        }
    }

    /// Key used by disassociate, where a pool id names the association
    pub fn disassociate_key(&self) -> &'static str {
        if self.is_literal() {
            "PublicIp"
        } else {
            "AssociationId"
        }
    }

    /// Indexed key used by describe calls (`PublicIp.1` / `AllocationId.1`)
    pub fn lookup_key(&self) -> String {
        format!("{}.1", self.key())
    }

    pub fn match_field(&self) -> MatchField {
        if self.is_literal() {
            MatchField::PublicIp
        } else {
            MatchField::AllocationId
        }
    }
}

impl fmt::Display for AddressRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dotted_quad_is_classic() {
        let addr = AddressRef::classify("203.0.113.25");
        assert!(matches!(addr, AddressRef::V4(..)));
        assert_eq!(addr.key(), "PublicIp");
        assert_eq!(addr.disassociate_key(), "PublicIp");
        assert_eq!(addr.lookup_key(), "PublicIp.1");
        assert_eq!(addr.match_field(), MatchField::PublicIp);
    }

    #[test]
    fn test_ipv6_literal_is_classic() {
        let addr = AddressRef::classify("2001:db8::1");
        assert!(matches!(addr, AddressRef::V6(..)));
        assert_eq!(addr.key(), "PublicIp");
    }

    #[test]
    fn test_opaque_id_is_pool() {
        let addr = AddressRef::classify("eipalloc-0a1b2c3d");
        assert_eq!(addr, AddressRef::Pool("eipalloc-0a1b2c3d".to_string()));
        assert_eq!(addr.key(), "AllocationId");
        assert_eq!(addr.disassociate_key(), "AssociationId");
        assert_eq!(addr.lookup_key(), "AllocationId.1");
        assert_eq!(addr.match_field(), MatchField::AllocationId);
    }

    #[test]
    fn test_near_literals_are_pool_ids() {
        for id in ["10.0.0", "10.0.0.256", "1.2.3.4.5", "", " 10.0.0.1"] {
            assert!(!AddressRef::classify(id).is_literal(), "{id:?}");
        }
    }

    #[test]
    fn test_display_round_trips_the_literal() {
        assert_eq!(AddressRef::classify("198.51.100.7").to_string(), "198.51.100.7");
        assert_eq!(AddressRef::classify("eipalloc-1").to_string(), "eipalloc-1");
    }

    #[test]
    fn test_ipv6_literal_is_not_normalized() {
        let addr = AddressRef::classify("2001:DB8:0:0:0:0:0:1");
        assert!(matches!(addr, AddressRef::V6(ip, _) if ip == "2001:db8::1".parse::<Ipv6Addr>().unwrap()));
        assert_eq!(addr.as_str(), "2001:DB8:0:0:0:0:0:1");
        assert_eq!(addr.to_string(), "2001:DB8:0:0:0:0:0:1");
    }
}
