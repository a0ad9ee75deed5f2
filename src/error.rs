//! Error types for the countries web service.

use crate::parser::SoapVersion;
use crate::writer::xml_escape;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Startup and configuration errors.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Duplicate country in data set: {0}")]
    DuplicateCountry(String),

    #[error("Invalid bind address: {0}")]
    InvalidBindAddress(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Codes carried in the detail of a SOAP fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaultCode {
    /// Invalid XML syntax or encoding
    InvalidXml,
    /// Root element is not a SOAP envelope
    MissingEnvelope,
    /// Envelope without a Body element
    MissingBody,
    /// Body without a payload element
    MissingPayload,
    /// Body nesting deeper than allowed
    BodyDepthExceeded,
    /// DOCTYPE detected (XXE)
    DoctypeDetected,
    /// Entity declaration detected (XXE)
    ExternalEntityDetected,
    /// Payload lacks a required element
    MissingRequiredElement,
    /// No operation registered for the payload root
    NoEndpointMapping,
    /// Invalid content type
    InvalidContentType,
    /// Body too large
    BodyTooLarge,
}

impl FaultCode {
    /// Get the string code for this fault.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidXml => "INVALID_XML",
            Self::MissingEnvelope => "MISSING_ENVELOPE",
            Self::MissingBody => "MISSING_BODY",
            Self::MissingPayload => "MISSING_PAYLOAD",
            Self::BodyDepthExceeded => "BODY_DEPTH_EXCEEDED",
            Self::DoctypeDetected => "DOCTYPE_DETECTED",
            Self::ExternalEntityDetected => "EXTERNAL_ENTITY_DETECTED",
            Self::MissingRequiredElement => "MISSING_REQUIRED_ELEMENT",
            Self::NoEndpointMapping => "NO_ENDPOINT_MAPPING",
            Self::InvalidContentType => "INVALID_CONTENT_TYPE",
            Self::BodyTooLarge => "BODY_TOO_LARGE",
        }
    }

    /// HTTP status for a fault with this code.
    ///
    /// Transport-level codes have dedicated statuses. Everything else follows
    /// the SOAP HTTP binding: 500 for SOAP 1.1, 400 (Sender) for SOAP 1.2.
    pub fn http_status(&self, version: SoapVersion) -> u16 {
        match self {
            Self::NoEndpointMapping => 404,
            Self::BodyTooLarge => 413,
            Self::InvalidContentType => 415,
            _ => match version {
                SoapVersion::Soap11 => 500,
                SoapVersion::Soap12 => 400,
            },
        }
    }
}

/// A request-level failure reported to the caller as a SOAP fault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fault {
    /// Fault code
    pub code: FaultCode,
    /// Human-readable message
    pub message: String,
}

impl Fault {
    pub fn new(code: FaultCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Fault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for Fault {}

/// Render a SOAP Fault envelope for the given faults.
pub fn soap_fault_response(faults: &[Fault], version: SoapVersion) -> String {
    match version {
        SoapVersion::Soap11 => soap_11_fault(faults),
        SoapVersion::Soap12 => soap_12_fault(faults),
    }
}

fn fault_reason(faults: &[Fault]) -> String {
    faults
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn fault_details(faults: &[Fault]) -> String {
    faults
        .iter()
        .map(|f| {
            format!(
                "          <cws:fault code=\"{}\">{}</cws:fault>",
                f.code.as_str(),
                xml_escape(&f.message)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn soap_11_fault(faults: &[Fault]) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    <soap:Fault>
      <faultcode>soap:Client</faultcode>
      <faultstring>{}</faultstring>
      <detail>
        <cws:faults xmlns:cws="urn:countries-ws:faults">
{}
        </cws:faults>
      </detail>
    </soap:Fault>
  </soap:Body>
</soap:Envelope>"#,
        xml_escape(&fault_reason(faults)),
        fault_details(faults)
    )
}

fn soap_12_fault(faults: &[Fault]) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<soap:Envelope xmlns:soap="http://www.w3.org/2003/05/soap-envelope">
  <soap:Body>
    <soap:Fault>
      <soap:Code>
        <soap:Value>soap:Sender</soap:Value>
      </soap:Code>
      <soap:Reason>
        <soap:Text xml:lang="en">{}</soap:Text>
      </soap:Reason>
      <soap:Detail>
        <cws:faults xmlns:cws="urn:countries-ws:faults">
{}
        </cws:faults>
      </soap:Detail>
    </soap:Fault>
  </soap:Body>
</soap:Envelope>"#,
        xml_escape(&fault_reason(faults)),
        fault_details(faults)
    )
}
