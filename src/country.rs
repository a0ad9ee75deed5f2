//! Country data model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Currencies known to the countries schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    #[serde(rename = "GBP")]
    Gbp,
    #[serde(rename = "EUR")]
    Eur,
    #[serde(rename = "PLN")]
    Pln,
}

impl Currency {
    /// ISO 4217 code as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gbp => "GBP",
            Self::Eur => "EUR",
            Self::Pln => "PLN",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptive data for one country.
///
/// Records are loaded once at startup and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    /// Country name, the lookup key
    pub name: String,
    /// Number of inhabitants
    pub population: u64,
    /// Capital city
    pub capital: String,
    /// Official currency
    pub currency: Currency,
}

impl Country {
    pub fn new(
        name: impl Into<String>,
        population: u64,
        capital: impl Into<String>,
        currency: Currency,
    ) -> Self {
        Self {
            name: name.into(),
            population,
            capital: capital.into(),
            currency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_codes() {
        assert_eq!(Currency::Gbp.as_str(), "GBP");
        assert_eq!(Currency::Eur.to_string(), "EUR");
        assert_eq!(Currency::Pln.as_str(), "PLN");
    }

    #[test]
    fn test_country_json_shape() {
        let country = Country::new("Spain", 46_704_314, "Madrid", Currency::Eur);
        let json = serde_json::to_value(&country).unwrap();
        assert_eq!(json["name"], "Spain");
        assert_eq!(json["population"], 46_704_314);
        assert_eq!(json["capital"], "Madrid");
        assert_eq!(json["currency"], "EUR");
    }

    #[test]
    fn test_unknown_currency_rejected() {
        let yaml = "name: Atlantis\npopulation: 1\ncapital: Poseidonia\ncurrency: ORI\n";
        assert!(serde_yaml::from_str::<Country>(yaml).is_err());
    }
}
