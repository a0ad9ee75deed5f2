//! SOAP response envelope rendering.

use crate::parser::SoapVersion;

/// Wrap a payload fragment in a SOAP envelope of the given version.
pub fn soap_envelope(version: SoapVersion, payload: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<SOAP-ENV:Envelope xmlns:SOAP-ENV="{}"><SOAP-ENV:Header/><SOAP-ENV:Body>{}</SOAP-ENV:Body></SOAP-ENV:Envelope>"#,
        version.namespace(),
        payload
    )
}

/// Escape text for use in element content and attribute values.
pub fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{SOAP_11_NS, SOAP_12_NS};

    #[test]
    fn test_envelope_uses_request_version() {
        let env = soap_envelope(SoapVersion::Soap11, "<x/>");
        assert!(env.contains(SOAP_11_NS));
        assert!(env.contains("<SOAP-ENV:Body><x/></SOAP-ENV:Body>"));

        let env = soap_envelope(SoapVersion::Soap12, "<x/>");
        assert!(env.contains(SOAP_12_NS));
    }

    #[test]
    fn test_xml_escape() {
        assert_eq!(xml_escape("Bosnia & Herzegovina"), "Bosnia &amp; Herzegovina");
        assert_eq!(xml_escape("<'\">"), "&lt;&apos;&quot;&gt;");
    }
}
