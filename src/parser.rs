//! SOAP envelope parsing.
//!
//! Uses quick-xml which is safe against XXE by default (doesn't expand entities).

use crate::error::{Fault, FaultCode};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;
use std::fmt;

/// SOAP namespace URIs.
pub const SOAP_11_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub const SOAP_12_NS: &str = "http://www.w3.org/2003/05/soap-envelope";

/// SOAP versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoapVersion {
    /// SOAP 1.1 (namespace: http://schemas.xmlsoap.org/soap/envelope/)
    Soap11,
    /// SOAP 1.2 (namespace: http://www.w3.org/2003/05/soap-envelope)
    Soap12,
}

impl SoapVersion {
    pub fn from_namespace(ns: &str) -> Option<Self> {
        match ns {
            SOAP_11_NS => Some(Self::Soap11),
            SOAP_12_NS => Some(Self::Soap12),
            _ => None,
        }
    }

    /// Best guess from the HTTP Content-Type, used before the envelope is parsed.
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        match content_type {
            Some(ct) if ct.to_lowercase().contains("application/soap+xml") => Self::Soap12,
            _ => Self::Soap11,
        }
    }

    pub fn namespace(&self) -> &'static str {
        match self {
            Self::Soap11 => SOAP_11_NS,
            Self::Soap12 => SOAP_12_NS,
        }
    }

    /// Content-Type for responses in this version.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Soap11 => "text/xml; charset=utf-8",
            Self::Soap12 => "application/soap+xml; charset=utf-8",
        }
    }
}

/// Namespace-qualified element name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    /// Namespace URI (if bound)
    pub namespace: Option<String>,
    /// Element local name
    pub local_name: String,
}

impl QualifiedName {
    pub fn new(namespace: Option<&str>, local_name: &str) -> Self {
        Self {
            namespace: namespace.map(String::from),
            local_name: local_name.to_string(),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local_name),
            None => f.write_str(&self.local_name),
        }
    }
}

/// Parsed SOAP envelope.
#[derive(Debug, Clone)]
pub struct SoapEnvelope {
    /// Detected SOAP version
    pub version: SoapVersion,
    /// Envelope carries a Header element
    pub has_header: bool,
    /// First element inside Body
    pub payload: Option<Payload>,
}

/// The message payload: the first element child of the SOAP Body.
#[derive(Debug, Clone)]
pub struct Payload {
    pub name: QualifiedName,
    /// Simple-content children in document order
    pub fields: Vec<PayloadField>,
}

impl Payload {
    /// Text of the first field with this local name in the payload root's namespace.
    pub fn field(&self, local_name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name.local_name == local_name && f.name.namespace == self.name.namespace)
            .map(|f| f.value.as_str())
    }
}

/// A child of the payload root holding text only.
#[derive(Debug, Clone)]
pub struct PayloadField {
    pub name: QualifiedName,
    pub value: String,
}

struct OpenField {
    name: QualifiedName,
    value: String,
    nested: bool,
}

/// Tracks where the reader currently is inside the envelope.
struct ParseState {
    max_body_depth: u32,
    depth: u32,
    version: Option<SoapVersion>,
    has_header: bool,
    has_body: bool,
    in_body: bool,
    payload: Option<Payload>,
    payload_open: bool,
    field: Option<OpenField>,
}

impl ParseState {
    fn new(max_body_depth: u32) -> Self {
        Self {
            max_body_depth,
            depth: 0,
            version: None,
            has_header: false,
            has_body: false,
            in_body: false,
            payload: None,
            payload_open: false,
            field: None,
        }
    }

    fn enter(&mut self, name: QualifiedName) -> Result<(), Fault> {
        self.depth += 1;

        match self.depth {
            1 => {
                let version = name
                    .namespace
                    .as_deref()
                    .and_then(SoapVersion::from_namespace)
                    .filter(|_| name.local_name == "Envelope")
                    .ok_or_else(|| {
                        Fault::new(
                            FaultCode::MissingEnvelope,
                            format!("Root element {} is not a SOAP Envelope", name),
                        )
                    })?;
                self.version = Some(version);
            }
            2 => {
                let in_soap_ns = name.namespace.as_deref() == self.version.map(|v| v.namespace());
                if in_soap_ns && name.local_name == "Header" {
                    self.has_header = true;
                } else if in_soap_ns && name.local_name == "Body" {
                    self.has_body = true;
                    self.in_body = true;
                }
            }
            depth if self.in_body => {
                let body_depth = depth - 2;
                if body_depth > self.max_body_depth {
                    return Err(Fault::new(
                        FaultCode::BodyDepthExceeded,
                        format!(
                            "Body nesting depth {} exceeds maximum {}",
                            body_depth, self.max_body_depth
                        ),
                    ));
                }

                match depth {
                    3 => {
                        if self.payload.is_none() {
                            self.payload = Some(Payload {
                                name,
                                fields: Vec::new(),
                            });
                            self.payload_open = true;
                        }
                    }
                    4 if self.payload_open => {
                        self.field = Some(OpenField {
                            name,
                            value: String::new(),
                            nested: false,
                        });
                    }
                    _ => {
                        if let Some(field) = self.field.as_mut() {
                            field.nested = true;
                        }
                    }
                }
            }
            _ => {}
        }

        Ok(())
    }

    fn leave(&mut self) {
        match self.depth {
            2 if self.in_body => self.in_body = false,
            3 if self.payload_open => self.payload_open = false,
            4 => {
                if let (Some(field), Some(payload)) = (self.field.take(), self.payload.as_mut()) {
                    if !field.nested {
                        payload.fields.push(PayloadField {
                            name: field.name,
                            value: field.value,
                        });
                    }
                }
            }
            _ => {}
        }
        self.depth = self.depth.saturating_sub(1);
    }

    fn text(&mut self, text: &str) {
        if let Some(field) = self.field.as_mut() {
            if !field.nested {
                field.value.push_str(text);
            }
        }
    }

    fn finish(self) -> Result<SoapEnvelope, Fault> {
        if self.depth != 0 {
            return Err(Fault::new(
                FaultCode::InvalidXml,
                "Unexpected end of document: unclosed elements",
            ));
        }

        let version = self.version.ok_or_else(|| {
            Fault::new(
                FaultCode::MissingEnvelope,
                "No valid SOAP Envelope found with recognized namespace",
            )
        })?;

        if !self.has_body {
            return Err(Fault::new(
                FaultCode::MissingBody,
                "SOAP Envelope has no Body element",
            ));
        }

        Ok(SoapEnvelope {
            version,
            has_header: self.has_header,
            payload: self.payload,
        })
    }
}

/// Parse raw bytes as SOAP envelope.
pub fn parse_soap_envelope(data: &[u8], max_body_depth: u32) -> Result<SoapEnvelope, Fault> {
    let xml_str = std::str::from_utf8(data)
        .map_err(|e| Fault::new(FaultCode::InvalidXml, format!("Invalid UTF-8: {}", e)))?;

    check_xxe_patterns(xml_str)?;

    let mut reader = NsReader::from_str(xml_str);
    let mut state = ParseState::new(max_body_depth);

    loop {
        match reader.read_resolved_event() {
            Ok((resolved, Event::Start(ref e))) => {
                state.enter(qualified_name(&resolved, e))?;
            }

            Ok((resolved, Event::Empty(ref e))) => {
                state.enter(qualified_name(&resolved, e))?;
                state.leave();
            }

            Ok((_, Event::End(_))) => state.leave(),

            Ok((_, Event::Text(ref e))) => {
                let text = e.unescape().map_err(|err| {
                    Fault::new(FaultCode::InvalidXml, format!("XML parse error: {}", err))
                })?;
                state.text(&text);
            }

            Ok((_, Event::CData(ref e))) => {
                let text = std::str::from_utf8(e).map_err(|err| {
                    Fault::new(FaultCode::InvalidXml, format!("Invalid UTF-8 in CDATA: {}", err))
                })?;
                state.text(text);
            }

            Ok((_, Event::DocType(_))) => {
                return Err(Fault::new(
                    FaultCode::DoctypeDetected,
                    "DOCTYPE declarations are not allowed",
                ));
            }

            Ok((_, Event::Eof)) => break,

            Err(e) => {
                return Err(Fault::new(
                    FaultCode::InvalidXml,
                    format!("XML parse error: {}", e),
                ));
            }

            _ => {}
        }
    }

    state.finish()
}

/// Check for XXE attack patterns.
fn check_xxe_patterns(xml: &str) -> Result<(), Fault> {
    if xml.contains("<!DOCTYPE") || xml.contains("<!doctype") {
        return Err(Fault::new(
            FaultCode::DoctypeDetected,
            "DOCTYPE declarations are not allowed",
        ));
    }

    if xml.contains("<!ENTITY") || xml.contains("<!entity") {
        return Err(Fault::new(
            FaultCode::ExternalEntityDetected,
            "Entity declarations are not allowed",
        ));
    }

    Ok(())
}

fn qualified_name(resolved: &ResolveResult, e: &BytesStart) -> QualifiedName {
    let namespace = match resolved {
        ResolveResult::Bound(Namespace(ns)) => std::str::from_utf8(ns).ok(),
        _ => None,
    };
    let local_name = e.local_name();
    QualifiedName::new(
        namespace,
        std::str::from_utf8(local_name.as_ref()).unwrap_or(""),
    )
}

/// Extract SOAPAction from HTTP header value (removes quotes).
pub fn parse_soap_action(header_value: &str) -> String {
    header_value.trim().trim_matches('"').to_string()
}
