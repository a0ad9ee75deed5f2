//! Integration tests for the countries-ws crate.
//!
//! These tests exercise the public API surface end-to-end, combining
//! configuration, parsing, routing and the HTTP router together.

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use countries_ws::config::{ServiceConfig, SettingsConfig, COUNTRIES_NS};
use countries_ws::dispatcher::MessageDispatcher;
use countries_ws::endpoint::{CountryEndpoint, GetCountryRequest};
use countries_ws::error::FaultCode;
use countries_ws::parser::{parse_soap_envelope, SOAP_11_NS, SOAP_12_NS};
use countries_ws::repository::CountryRepository;
use countries_ws::router::RouteTable;
use countries_ws::{build_app, Country, Currency};
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

// ============================================================================
// Helpers
// ============================================================================

fn get_country_envelope(soap_ns: &str, name: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<soapenv:Envelope xmlns:soapenv="{}"
                  xmlns:gs="http://raidencentral.com/countries">
  <soapenv:Header/>
  <soapenv:Body>
    <gs:getCountryRequest>
      <gs:name>{}</gs:name>
    </gs:getCountryRequest>
  </soapenv:Body>
</soapenv:Envelope>"#,
        soap_ns, name
    )
}

fn builtin_dispatcher() -> MessageDispatcher {
    let endpoint = Arc::new(CountryEndpoint::new(Arc::new(CountryRepository::builtin())));
    let mut routes = RouteTable::new();
    endpoint.register(&mut routes, COUNTRIES_NS);
    MessageDispatcher::new(SettingsConfig::default(), routes)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Option<String>, String) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, content_type, String::from_utf8(body.to_vec()).unwrap())
}

fn soap_post(uri: &str, content_type: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, content_type)
        .header("SOAPAction", "\"\"")
        .body(Body::from(body))
        .unwrap()
}

// ============================================================================
// Lookup contract
// ============================================================================

#[test]
fn test_every_builtin_country_resolves_to_its_record() {
    let repo = CountryRepository::builtin();
    let expected = [
        Country::new("Spain", 46_704_314, "Madrid", Currency::Eur),
        Country::new("Poland", 38_186_860, "Warsaw", Currency::Pln),
        Country::new("United Kingdom", 63_705_000, "London", Currency::Gbp),
    ];
    for country in &expected {
        assert_eq!(repo.find(&country.name), Some(country));
    }
    assert_eq!(repo.len(), expected.len());
}

#[test]
fn test_unknown_and_case_variant_names_are_not_found() {
    let endpoint = CountryEndpoint::new(Arc::new(CountryRepository::builtin()));
    for name in ["Atlantis", "spain", "SPAIN", "United kingdom", "", " Spain"] {
        let response = endpoint.handle(&GetCountryRequest::new(name));
        assert!(response.country.is_none(), "{:?} should not resolve", name);
    }
}

// ============================================================================
// End-to-end: dispatcher
// ============================================================================

#[test]
fn test_e2e_soap_11_lookup() {
    let dispatcher = builtin_dispatcher();
    let response = dispatcher.dispatch(
        Some("text/xml; charset=utf-8"),
        None,
        get_country_envelope(SOAP_11_NS, "Spain").as_bytes(),
    );

    assert_eq!(response.status, 200);

    // The response is itself a well-formed envelope carrying the country.
    let envelope = parse_soap_envelope(response.body.as_bytes(), 20).unwrap();
    let payload = envelope.payload.unwrap();
    assert_eq!(payload.name.local_name, "getCountryResponse");
    assert_eq!(payload.name.namespace.as_deref(), Some(COUNTRIES_NS));
    assert!(response.body.contains(
        "<ns2:country><ns2:name>Spain</ns2:name><ns2:population>46704314</ns2:population>\
         <ns2:capital>Madrid</ns2:capital><ns2:currency>EUR</ns2:currency></ns2:country>"
    ));
}

#[test]
fn test_e2e_dispatch_is_idempotent() {
    let dispatcher = builtin_dispatcher();
    let body = get_country_envelope(SOAP_12_NS, "Poland");
    let first = dispatcher.dispatch(Some("application/soap+xml"), None, body.as_bytes());
    let second = dispatcher.dispatch(Some("application/soap+xml"), None, body.as_bytes());
    assert_eq!(first, second);
}

#[test]
fn test_e2e_escaped_name_matches_record() {
    let repo = CountryRepository::from_records(vec![Country::new(
        "Bosnia & Herzegovina",
        3_300_000,
        "Sarajevo",
        Currency::Eur,
    )])
    .unwrap();
    let endpoint = Arc::new(CountryEndpoint::new(Arc::new(repo)));
    let mut routes = RouteTable::new();
    endpoint.register(&mut routes, COUNTRIES_NS);
    let dispatcher = MessageDispatcher::new(SettingsConfig::default(), routes);

    let response = dispatcher.dispatch(
        Some("text/xml"),
        None,
        get_country_envelope(SOAP_11_NS, "Bosnia &amp; Herzegovina").as_bytes(),
    );
    assert_eq!(response.status, 200);
    assert!(response
        .body
        .contains("<ns2:name>Bosnia &amp; Herzegovina</ns2:name>"));
}

#[test]
fn test_e2e_xxe_payload_rejected() {
    let dispatcher = builtin_dispatcher();
    let body = r#"<?xml version="1.0"?>
<!DOCTYPE foo [<!ENTITY xxe SYSTEM "file:///etc/passwd">]>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">
  <soapenv:Body>
    <gs:getCountryRequest xmlns:gs="http://raidencentral.com/countries">
      <gs:name>&xxe;</gs:name>
    </gs:getCountryRequest>
  </soapenv:Body>
</soapenv:Envelope>"#;

    let response = dispatcher.dispatch(Some("text/xml"), None, body.as_bytes());
    assert_eq!(response.status, 500);
    assert!(response.body.contains(FaultCode::DoctypeDetected.as_str()));
    assert!(!response.body.contains("root:"));
}

#[test]
fn test_e2e_wrong_namespace_is_unmapped() {
    let dispatcher = builtin_dispatcher();
    let body = format!(
        r#"<s:Envelope xmlns:s="{}"><s:Body><getCountryRequest xmlns="http://spring.io/guides/gs-producing-web-service"><name>Spain</name></getCountryRequest></s:Body></s:Envelope>"#,
        SOAP_11_NS
    );
    let response = dispatcher.dispatch(Some("text/xml"), None, body.as_bytes());
    assert_eq!(response.status, 404);
    assert!(response.body.contains(FaultCode::NoEndpointMapping.as_str()));
}

#[test]
fn test_e2e_empty_name_is_not_found() {
    let dispatcher = builtin_dispatcher();
    let body = format!(
        r#"<soapenv:Envelope xmlns:soapenv="{}" xmlns:gs="{}"><soapenv:Body><gs:getCountryRequest><gs:name/></gs:getCountryRequest></soapenv:Body></soapenv:Envelope>"#,
        SOAP_11_NS, COUNTRIES_NS
    );
    let response = dispatcher.dispatch(Some("text/xml"), None, body.as_bytes());

    assert_eq!(response.status, 200);
    assert!(response
        .body
        .contains("<ns2:getCountryResponse xmlns:ns2=\"http://raidencentral.com/countries\"/>"));

    let response = dispatcher.dispatch(Some("text/xml"), None, get_country_envelope(SOAP_11_NS, "").as_bytes());
    assert_eq!(response.status, 200);
    assert!(!response.body.contains("<ns2:country>"));
}

#[test]
fn test_e2e_truncated_envelope_rejected() {
    let dispatcher = builtin_dispatcher();
    let full = get_country_envelope(SOAP_11_NS, "Spain");
    let cut = &full[..full.find("</gs:getCountryRequest>").unwrap()];

    let response = dispatcher.dispatch(Some("text/xml"), None, cut.as_bytes());
    assert_eq!(response.status, 500);
    assert!(response.body.contains(FaultCode::InvalidXml.as_str()));
    assert!(!response.body.contains("Madrid"));
}

#[test]
fn test_e2e_name_from_other_namespace_not_bound() {
    let dispatcher = builtin_dispatcher();
    let body = format!(
        r#"<s:Envelope xmlns:s="{}"><s:Body><gs:getCountryRequest xmlns:gs="{}"><x:name xmlns:x="urn:other">Spain</x:name></gs:getCountryRequest></s:Body></s:Envelope>"#,
        SOAP_11_NS, COUNTRIES_NS
    );
    let response = dispatcher.dispatch(Some("text/xml"), None, body.as_bytes());
    assert_eq!(response.status, 500);
    assert!(response.body.contains(FaultCode::MissingRequiredElement.as_str()));
    assert!(!response.body.contains("Madrid"));
}

// ============================================================================
// End-to-end: HTTP router
// ============================================================================

#[tokio::test]
async fn test_http_soap_lookup() {
    let app = build_app(&ServiceConfig::default()).unwrap();
    let (status, content_type, body) = send(
        app,
        soap_post("/ws", "text/xml; charset=utf-8", get_country_envelope(SOAP_11_NS, "United Kingdom")),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("text/xml; charset=utf-8"));
    assert!(body.contains("<ns2:capital>London</ns2:capital>"));
    assert!(body.contains("<ns2:currency>GBP</ns2:currency>"));
}

#[tokio::test]
async fn test_http_soap_under_sub_path() {
    let app = build_app(&ServiceConfig::default()).unwrap();
    let (status, content_type, body) = send(
        app,
        soap_post("/ws/countries", "application/soap+xml", get_country_envelope(SOAP_12_NS, "Atlantis")),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        content_type.as_deref(),
        Some("application/soap+xml; charset=utf-8")
    );
    assert!(body.contains("<ns2:getCountryResponse xmlns:ns2=\"http://raidencentral.com/countries\"/>"));
}

#[tokio::test]
async fn test_http_soap_fault_status() {
    let app = build_app(&ServiceConfig::default()).unwrap();
    let (status, _, body) = send(
        app,
        soap_post("/ws", "application/json", get_country_envelope(SOAP_11_NS, "Spain")),
    )
    .await;

    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(body.contains("INVALID_CONTENT_TYPE"));
}

#[tokio::test]
async fn test_http_empty_name_is_not_found() {
    let app = build_app(&ServiceConfig::default()).unwrap();
    let (status, _, body) = send(
        app,
        soap_post("/ws", "text/xml", get_country_envelope(SOAP_11_NS, "")),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<ns2:getCountryResponse xmlns:ns2=\"http://raidencentral.com/countries\"/>"));
}

#[tokio::test]
async fn test_http_oversized_body_is_fault() {
    let config = ServiceConfig {
        settings: SettingsConfig {
            max_body_size: 256,
            ..Default::default()
        },
        ..Default::default()
    };
    let app = build_app(&config).unwrap();

    let padding = "x".repeat(4096);
    let body = get_country_envelope(SOAP_11_NS, &format!("Spain{}", padding));
    let (status, content_type, response) =
        send(app.clone(), soap_post("/ws", "text/xml", body)).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(content_type.as_deref(), Some("text/xml; charset=utf-8"));
    assert!(response.contains(FaultCode::BodyTooLarge.as_str()));

    // The JSON rendition is bounded by the same limit.
    let request = Request::builder()
        .method("POST")
        .uri("/api/getCountry")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(format!(r#"{{"name":"{}"}}"#, padding)))
        .unwrap();
    let (status, _, _) = send(app, request).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_http_get_on_soap_path_not_allowed() {
    let app = build_app(&ServiceConfig::default()).unwrap();
    let request = Request::builder().uri("/ws").body(Body::empty()).unwrap();
    let (status, _, _) = send(app, request).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_http_json_lookup() {
    let app = build_app(&ServiceConfig::default()).unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/api/getCountry")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"name":"Spain"}"#))
        .unwrap();
    let (status, _, body) = send(app.clone(), request).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["country"]["capital"], "Madrid");
    assert_eq!(json["country"]["currency"], "EUR");
    assert_eq!(json["country"]["population"], 46_704_314);

    let request = Request::builder()
        .method("POST")
        .uri("/api/getCountry")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"name":"Atlantis"}"#))
        .unwrap();
    let (status, _, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json, serde_json::json!({ "country": null }));
}

#[tokio::test]
async fn test_http_json_missing_name_rejected_by_transport() {
    let app = build_app(&ServiceConfig::default()).unwrap();
    let request = Request::builder()
        .method("POST")
        .uri("/api/getCountry")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let (status, _, _) = send(app, request).await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_http_health() {
    let app = build_app(&ServiceConfig::default()).unwrap();
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, _, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["countries"], 3);
    assert_eq!(json["requests_processed"], 0);
}

#[tokio::test]
async fn test_http_health_counts_soap_requests_only() {
    let app = build_app(&ServiceConfig::default()).unwrap();

    send(
        app.clone(),
        soap_post("/ws", "text/xml", get_country_envelope(SOAP_11_NS, "Spain")),
    )
    .await;
    send(
        app.clone(),
        soap_post("/ws", "application/json", get_country_envelope(SOAP_11_NS, "Spain")),
    )
    .await;
    let json_request = Request::builder()
        .method("POST")
        .uri("/api/getCountry")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"name":"Spain"}"#))
        .unwrap();
    send(app.clone(), json_request).await;

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (_, _, body) = send(app, request).await;
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["requests_processed"], 2);
    assert_eq!(json["faults_returned"], 1);
}

#[tokio::test]
async fn test_http_configured_path_and_data_set() {
    let config = ServiceConfig::from_yaml(
        r#"
server:
  path: "/soap"
service:
  namespace: "urn:example:countries"
countries:
  - { name: Portugal, population: 10300000, capital: Lisbon, currency: EUR }
"#,
    )
    .unwrap();
    let app = build_app(&config).unwrap();

    let body = format!(
        r#"<s:Envelope xmlns:s="{}"><s:Body><c:getCountryRequest xmlns:c="urn:example:countries"><c:name>Portugal</c:name></c:getCountryRequest></s:Body></s:Envelope>"#,
        SOAP_11_NS
    );
    let (status, _, response) = send(app.clone(), soap_post("/soap", "text/xml", body)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(response.contains("xmlns:ns2=\"urn:example:countries\""));
    assert!(response.contains("<ns2:capital>Lisbon</ns2:capital>"));

    let (status, _, _) = send(
        app,
        soap_post("/ws", "text/xml", get_country_envelope(SOAP_11_NS, "Spain")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
