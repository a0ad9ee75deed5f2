//! SOAP message dispatcher.
//!
//! Takes a raw HTTP request body, checks it against the transport limits,
//! parses the envelope, routes the payload and wraps the result (or a fault)
//! in a response envelope.

use crate::config::SettingsConfig;
use crate::error::{soap_fault_response, Fault, FaultCode};
use crate::parser::{parse_soap_action, parse_soap_envelope, SoapVersion};
use crate::router::RouteTable;
use crate::writer::soap_envelope;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// A rendered SOAP response ready to go on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapResponse {
    /// HTTP status code
    pub status: u16,
    /// Content-Type header value
    pub content_type: &'static str,
    /// Envelope XML
    pub body: String,
}

impl SoapResponse {
    pub fn is_fault(&self) -> bool {
        self.status != 200
    }
}

/// Request counters for health reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchMetrics {
    pub requests_processed: u64,
    pub faults_returned: u64,
}

/// Routes SOAP messages to registered operations.
pub struct MessageDispatcher {
    settings: SettingsConfig,
    routes: RouteTable,
    requests_processed: AtomicU64,
    faults_returned: AtomicU64,
}

impl MessageDispatcher {
    pub fn new(settings: SettingsConfig, routes: RouteTable) -> Self {
        Self {
            settings,
            routes,
            requests_processed: AtomicU64::new(0),
            faults_returned: AtomicU64::new(0),
        }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn metrics(&self) -> DispatchMetrics {
        DispatchMetrics {
            requests_processed: self.requests_processed.load(Ordering::Relaxed),
            faults_returned: self.faults_returned.load(Ordering::Relaxed),
        }
    }

    pub fn max_body_size(&self) -> usize {
        self.settings.max_body_size
    }

    /// Answer a request whose body could not be read within `max_body_size`.
    pub fn reject_oversized(&self, content_type: Option<&str>) -> SoapResponse {
        self.requests_processed.fetch_add(1, Ordering::Relaxed);
        self.fault_response(
            Fault::new(
                FaultCode::BodyTooLarge,
                format!(
                    "Request body exceeds maximum {}",
                    self.settings.max_body_size
                ),
            ),
            SoapVersion::from_content_type(content_type),
        )
    }

    /// Check if Content-Type is valid for SOAP.
    fn is_valid_content_type(&self, content_type: Option<&str>) -> bool {
        match content_type {
            Some(ct) => {
                let ct_lower = ct.to_lowercase();
                self.settings
                    .allowed_content_types
                    .iter()
                    .any(|allowed| ct_lower.contains(&allowed.to_lowercase()))
            }
            None => false,
        }
    }

    /// Process one SOAP request.
    pub fn dispatch(
        &self,
        content_type: Option<&str>,
        soap_action: Option<&str>,
        body: &[u8],
    ) -> SoapResponse {
        self.requests_processed.fetch_add(1, Ordering::Relaxed);

        debug!(
            content_type = ?content_type,
            soap_action = ?soap_action.map(parse_soap_action),
            body_size = body.len(),
            "Processing SOAP request"
        );

        let fallback_version = SoapVersion::from_content_type(content_type);

        if !self.is_valid_content_type(content_type) {
            return self.fault_response(
                Fault::new(
                    FaultCode::InvalidContentType,
                    format!("Unsupported content type {:?}", content_type.unwrap_or("")),
                ),
                fallback_version,
            );
        }

        if body.len() > self.settings.max_body_size {
            return self.fault_response(
                Fault::new(
                    FaultCode::BodyTooLarge,
                    format!(
                        "Request body size {} exceeds maximum {}",
                        body.len(),
                        self.settings.max_body_size
                    ),
                ),
                fallback_version,
            );
        }

        let envelope = match parse_soap_envelope(body, self.settings.max_body_depth) {
            Ok(envelope) => envelope,
            Err(fault) => return self.fault_response(fault, fallback_version),
        };
        let version = envelope.version;

        let payload = match envelope.payload {
            Some(payload) => payload,
            None => {
                return self.fault_response(
                    Fault::new(FaultCode::MissingPayload, "SOAP Body has no payload element"),
                    version,
                )
            }
        };

        match self.routes.dispatch(&payload) {
            Ok(response_payload) => {
                debug!(operation = %payload.name, "SOAP request handled");
                SoapResponse {
                    status: 200,
                    content_type: version.content_type(),
                    body: soap_envelope(version, &response_payload),
                }
            }
            Err(fault) => self.fault_response(fault, version),
        }
    }

    fn fault_response(&self, fault: Fault, version: SoapVersion) -> SoapResponse {
        self.faults_returned.fetch_add(1, Ordering::Relaxed);
        warn!(code = fault.code.as_str(), message = %fault.message, "Returning SOAP fault");

        SoapResponse {
            status: fault.code.http_status(version),
            content_type: version.content_type(),
            body: soap_fault_response(&[fault], version),
        }
    }
}
