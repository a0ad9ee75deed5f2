//! In-memory country lookup.

use crate::country::{Country, Currency};
use crate::error::ServiceError;
use std::collections::HashMap;

/// Read-only store of countries keyed by exact name.
#[derive(Debug, Clone)]
pub struct CountryRepository {
    countries: HashMap<String, Country>,
}

impl CountryRepository {
    /// Build a repository from an explicit list of records.
    ///
    /// Fails if two records share a name.
    pub fn from_records(records: impl IntoIterator<Item = Country>) -> Result<Self, ServiceError> {
        let mut countries = HashMap::new();
        for country in records {
            if countries.contains_key(&country.name) {
                return Err(ServiceError::DuplicateCountry(country.name));
            }
            countries.insert(country.name.clone(), country);
        }
        Ok(Self { countries })
    }

    /// The built-in data set.
    pub fn builtin() -> Self {
        Self::from_records(builtin_records()).expect("built-in data set has unique names")
    }

    /// Look up a country by name.
    ///
    /// Matching is exact and case-sensitive. Unknown or empty names yield `None`.
    pub fn find(&self, name: &str) -> Option<&Country> {
        self.countries.get(name)
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    /// Names of all loaded countries, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.countries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

fn builtin_records() -> Vec<Country> {
    vec![
        Country::new("Spain", 46_704_314, "Madrid", Currency::Eur),
        Country::new("Poland", 38_186_860, "Warsaw", Currency::Pln),
        Country::new("United Kingdom", 63_705_000, "London", Currency::Gbp),
    ]
}

impl Default for CountryRepository {
    fn default() -> Self {
        Self::builtin()
    }
}
