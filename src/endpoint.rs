//! Country lookup endpoint and its messages.

use crate::country::Country;
use crate::error::{Fault, FaultCode};
use crate::parser::Payload;
use crate::repository::CountryRepository;
use crate::router::{OperationKey, RouteTable};
use crate::writer::xml_escape;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Local name of the request payload root.
pub const GET_COUNTRY_REQUEST: &str = "getCountryRequest";
/// Local name of the response payload root.
pub const GET_COUNTRY_RESPONSE: &str = "getCountryResponse";

/// Lookup request carrying a country name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetCountryRequest {
    pub name: String,
}

impl GetCountryRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Bind a parsed SOAP payload. `name` is required, but may be empty.
    pub fn from_payload(payload: &Payload) -> Result<Self, Fault> {
        let name = payload.field("name").ok_or_else(|| {
            Fault::new(
                FaultCode::MissingRequiredElement,
                format!("{} requires a name element", payload.name.local_name),
            )
        })?;
        Ok(Self::new(name))
    }
}

/// Lookup response; `country` is `None` for unknown names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetCountryResponse {
    pub country: Option<Country>,
}

impl GetCountryResponse {
    /// Render the response payload element in the given namespace.
    pub fn to_xml(&self, namespace: &str) -> String {
        let ns = xml_escape(namespace);
        match &self.country {
            Some(country) => format!(
                "<ns2:{root} xmlns:ns2=\"{ns}\"><ns2:country>\
                 <ns2:name>{name}</ns2:name>\
                 <ns2:population>{population}</ns2:population>\
                 <ns2:capital>{capital}</ns2:capital>\
                 <ns2:currency>{currency}</ns2:currency>\
                 </ns2:country></ns2:{root}>",
                root = GET_COUNTRY_RESPONSE,
                ns = ns,
                name = xml_escape(&country.name),
                population = country.population,
                capital = xml_escape(&country.capital),
                currency = country.currency,
            ),
            None => format!("<ns2:{} xmlns:ns2=\"{}\"/>", GET_COUNTRY_RESPONSE, ns),
        }
    }
}

/// Answers country lookups from a repository.
#[derive(Debug, Clone)]
pub struct CountryEndpoint {
    repository: Arc<CountryRepository>,
}

impl CountryEndpoint {
    pub fn new(repository: Arc<CountryRepository>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &CountryRepository {
        &self.repository
    }

    /// Look up the requested country. Unknown and empty names give an empty response.
    pub fn handle(&self, request: &GetCountryRequest) -> GetCountryResponse {
        let country = self.repository.find(&request.name).cloned();
        debug!(name = %request.name, found = country.is_some(), "Country lookup");
        GetCountryResponse { country }
    }

    /// Register the SOAP operations of this endpoint under `namespace`.
    pub fn register(self: Arc<Self>, routes: &mut RouteTable, namespace: &str) {
        let endpoint = self;
        let response_ns = namespace.to_string();
        routes.route(
            OperationKey::new(namespace, GET_COUNTRY_REQUEST),
            move |payload| {
                let request = GetCountryRequest::from_payload(payload)?;
                Ok(endpoint.handle(&request).to_xml(&response_ns))
            },
        );
    }
}
