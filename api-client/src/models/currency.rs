use rust_decimal::Decimal;
use std::fmt;

/// The account owner's display currency.
///
/// Profiles default to rupees; any other preference is treated as US dollars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Currency {
    #[default]
    Pkr,
    Usd,
}

impl Currency {
    /// Currency from a profile preference; missing or blank means `pkr`.
    pub fn from_preference(preference: Option<&str>) -> Self {
        match preference.map(str::trim) {
            None | Some("") => Currency::Pkr,
            Some(code) if code.eq_ignore_ascii_case("pkr") => Currency::Pkr,
            Some(_) => Currency::Usd,
        }
    }

    /// Lower-case code sent when creating payment sessions.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Pkr => "pkr",
            Currency::Usd => "usd",
        }
    }

    /// Upper-case ISO code, as gateway widgets want it.
    pub fn iso_code(&self) -> &'static str {
        match self {
            Currency::Pkr => "PKR",
            Currency::Usd => "USD",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Pkr => "Rs ",
            Currency::Usd => "$",
        }
    }

    /// `Rs 120.50`, `$9.00`.
    pub fn format(&self, amount: Decimal) -> String {
        format!("{}{:.2}", self.symbol(), amount)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn defaults_to_rupees() {
        let currency = Currency::from_preference(None);
        assert_eq!(currency, Currency::Pkr);
        assert_eq!(currency.symbol(), "Rs ");
        assert_eq!(Currency::from_preference(Some("  ")), Currency::Pkr);
        assert_eq!(Currency::from_preference(Some("PKR")), Currency::Pkr);
    }

    #[test]
    fn other_preferences_are_dollars() {
        let currency = Currency::from_preference(Some("USD"));
        assert_eq!(currency.code(), "usd");
        assert_eq!(currency.iso_code(), "USD");
        assert_eq!(Currency::from_preference(Some("eur")), Currency::Usd);
        assert_eq!(
            currency.format(Decimal::from_str("103.4").unwrap()),
            "$103.40"
        );
    }
}
