use serde::{Deserialize, Serialize};

/// Classified purpose of the latest user message.
///
/// Derived per request by the intent router and never persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    Order,
    Billing,
    Support,
}

impl Intent {
    pub const ALL: [Intent; 3] = [Intent::Order, Intent::Billing, Intent::Support];

    /// Parse classifier output. Trims whitespace and uppercases before
    /// the membership check; anything outside the enumerated set is
    /// `None` and the caller decides the fallback.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ORDER" => Some(Self::Order),
            "BILLING" => Some(Self::Billing),
            "SUPPORT" => Some(Self::Support),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Order => "ORDER",
            Self::Billing => "BILLING",
            Self::Support => "SUPPORT",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::Intent;

    #[test]
    fn parses_exact_category_names() {
        assert_eq!(Intent::parse("ORDER"), Some(Intent::Order));
        assert_eq!(Intent::parse("BILLING"), Some(Intent::Billing));
        assert_eq!(Intent::parse("SUPPORT"), Some(Intent::Support));
    }

    #[test]
    fn parse_normalizes_case_and_whitespace() {
        assert_eq!(Intent::parse("  order \n"), Some(Intent::Order));
        assert_eq!(Intent::parse("Billing"), Some(Intent::Billing));
    }

    #[test]
    fn parse_rejects_everything_else() {
        assert_eq!(Intent::parse(""), None);
        assert_eq!(Intent::parse("ORDERS"), None);
        assert_eq!(Intent::parse("The intent is ORDER."), None);
        assert_eq!(Intent::parse("REFUND"), None);
    }
}
