//! Client operations against stand-in Tika servers.

mod common;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, put};
use common::{last_request, serve, serve_fixed};
use tika::{Client, RecursiveContentType, TikaError, Translator, XTIKA_CONTENT};

#[tokio::test]
async fn test_parse_sends_document_to_tika_endpoint() {
    let (url, log) = serve_fixed(StatusCode::OK, "test value").await;
    let client = Client::new(url);

    let text = client.parse("test body").await.unwrap();
    assert_eq!(text, "test value");

    let request = last_request(&log);
    assert_eq!(request.method, "PUT");
    assert_eq!(request.path, "/tika");
    assert_eq!(request.body, b"test body");
}

#[tokio::test]
async fn test_operations_use_expected_method_and_path() {
    let (url, log) = serve_fixed(StatusCode::OK, "ok").await;
    let client = Client::new(url);

    client.detect("body").await.unwrap();
    assert_eq!(last_request(&log).path, "/detect/stream");

    client.language("body").await.unwrap();
    assert_eq!(last_request(&log).path, "/language/stream");

    client.language_string("bonjour").await.unwrap();
    let request = last_request(&log);
    assert_eq!(request.path, "/language/string");
    assert_eq!(request.body, b"bonjour");

    client.meta("body").await.unwrap();
    assert_eq!(last_request(&log).path, "/meta");

    client.meta_field("body", "Content-Type").await.unwrap();
    assert_eq!(last_request(&log).path, "/meta/Content-Type");

    client.version().await.unwrap();
    let request = last_request(&log);
    assert_eq!(request.method, "GET");
    assert_eq!(request.path, "/version");
    assert!(request.body.is_empty());

    client
        .translate("hola", &Translator::Lingo24, "es", "en")
        .await
        .unwrap();
    let request = last_request(&log);
    assert_eq!(request.method, "POST");
    assert_eq!(
        request.path,
        "/translate/all/org.apache.tika.language.translate.Lingo24Translator/es/en"
    );

    assert_eq!(log.lock().len(), 7);
}

#[tokio::test]
async fn test_server_error_carries_status_and_body() {
    let (url, _log) = serve_fixed(StatusCode::INTERNAL_SERVER_ERROR, "java.lang.IllegalStateException: boom").await;
    let client = Client::new(url);

    let err = client.parse("body").await.unwrap_err();
    assert_eq!(err.status_code(), Some(500));
    let client_err = err.as_client_error().unwrap();
    assert_eq!(client_err.body, "java.lang.IllegalStateException: boom");
    assert!(err.to_string().contains("boom"));

    let err = client.call(None, "GET", "/version", None).await.unwrap_err();
    assert!(matches!(err, TikaError::Client(ref e) if e.status_code == 500));
}

#[tokio::test]
async fn test_parse_recursive_returns_content_in_document_order() {
    let (url, log) = serve_fixed(
        StatusCode::OK,
        r#"[{"X-TIKA:content":"a"},{"Content-Type":"image/png"},{"X-TIKA:content":["b"]}]"#,
    )
    .await;
    let client = Client::new(url);

    let contents = client.parse_recursive("body").await.unwrap();
    assert_eq!(contents, vec!["a", "b"]);
    assert_eq!(last_request(&log).path, "/rmeta/text");
}

#[tokio::test]
async fn test_meta_recursive_normalizes_fields() {
    let (url, _log) = serve_fixed(
        StatusCode::OK,
        r#"[{"X-TIKA:content":"a","k":["v1","v2"]},{"X-TIKA:content":"b","empty":[]}]"#,
    )
    .await;
    let client = Client::new(url);

    let documents = client.meta_recursive("body").await.unwrap();
    assert_eq!(documents.len(), 2);
    assert_eq!(documents[0].get(XTIKA_CONTENT), Some(&["a".to_string()][..]));
    assert_eq!(
        documents[0].get("k"),
        Some(&["v1".to_string(), "v2".to_string()][..])
    );
    assert_eq!(documents[1].get("empty"), Some(&[][..]));
}

#[tokio::test]
async fn test_meta_recursive_rejects_unexpected_shape() {
    let (url, _log) = serve_fixed(StatusCode::OK, r#"[{"X-TIKA:content":"a"},{"pages":3}]"#).await;
    let client = Client::new(url);

    let err = client.meta_recursive("body").await.unwrap_err();
    assert!(matches!(err, TikaError::Decoding { .. }), "{:?}", err);
    assert!(err.to_string().contains("pages"), "{}", err);
}

#[tokio::test]
async fn test_meta_recursive_type_selects_endpoint() {
    let (url, log) = serve_fixed(StatusCode::OK, "[]").await;
    let client = Client::new(url);

    let cases = [
        (RecursiveContentType::Xml, "/rmeta"),
        (RecursiveContentType::Text, "/rmeta/text"),
        (RecursiveContentType::Html, "/rmeta/html"),
        (RecursiveContentType::Ignore, "/rmeta/ignore"),
    ];
    for (content_type, path) in cases {
        let documents = client.meta_recursive_type("body", content_type).await.unwrap();
        assert!(documents.is_empty());
        assert_eq!(last_request(&log).path, path);
    }
}

#[tokio::test]
async fn test_parsers_decodes_tree_and_requests_json() {
    let body = r#"{
        "name": "org.apache.tika.parser.DefaultParser",
        "composite": true,
        "children": [
            {"name": "org.apache.tika.parser.pdf.PDFParser", "supportedTypes": ["application/pdf"]},
            {"name": "org.apache.tika.parser.txt.TXTParser", "decorated": true}
        ]
    }"#;
    let (url, log) = serve_fixed(StatusCode::OK, body).await;
    let client = Client::new(url);

    let parser = client.parsers().await.unwrap();
    assert_eq!(parser.name, "org.apache.tika.parser.DefaultParser");
    assert!(parser.composite);
    assert!(!parser.decorated);
    assert_eq!(parser.children.len(), 2);
    assert_eq!(parser.children[0].supported_types, vec!["application/pdf"]);
    assert!(parser.children[1].decorated);
    assert!(parser.children[1].children.is_empty());

    let request = last_request(&log);
    assert_eq!(request.path, "/parsers/details");
    assert_eq!(request.accept.as_deref(), Some("application/json"));
}

#[tokio::test]
async fn test_parsers_rejects_top_level_array() {
    let (url, _log) = serve_fixed(StatusCode::OK, r#"["test"]"#).await;
    let client = Client::new(url);

    let err = client.parsers().await.unwrap_err();
    assert!(matches!(err, TikaError::Decoding { .. }), "{:?}", err);
}

#[tokio::test]
async fn test_detectors_and_mime_types() {
    let router = Router::new()
        .route(
            "/detectors",
            get(|| async {
                r#"{"name":"org.apache.tika.detect.DefaultDetector","composite":true,
                    "children":[{"name":"org.apache.tika.mime.MimeTypes"}]}"#
            }),
        )
        .route(
            "/mime-types",
            get(|| async {
                r#"{"application/pdf":{"alias":["application/x-pdf"],"supertype":"application/octet-stream"},
                    "text/plain":{}}"#
            }),
        );
    let client = Client::new(serve(router).await);

    let detector = client.detectors().await.unwrap();
    assert_eq!(detector.iter().count(), 2);
    assert!(!detector.children[0].composite);

    let registry = client.mime_types().await.unwrap();
    let pdf = &registry["application/pdf"];
    assert_eq!(pdf.alias, vec!["application/x-pdf"]);
    assert_eq!(pdf.supertype.as_deref(), Some("application/octet-stream"));
    assert!(registry["text/plain"].alias.is_empty());
    assert_eq!(registry["text/plain"].supertype, None);
}

#[tokio::test]
async fn test_mime_types_rejects_invalid_json() {
    let (url, _log) = serve_fixed(StatusCode::OK, "not json").await;
    let client = Client::new(url);

    let err = client.mime_types().await.unwrap_err();
    assert!(matches!(err, TikaError::Decoding { .. }), "{:?}", err);
}

#[tokio::test]
async fn test_parse_stream_copies_body() {
    let router = Router::new().route("/tika", put(|body: String| async move { body.to_uppercase() }));
    let client = Client::new(serve(router).await);

    let mut stream = client.parse_stream("streamed content").await.unwrap();
    let mut out: Vec<u8> = Vec::new();
    let written = stream.copy_to(&mut out).await.unwrap();
    assert_eq!(written, 16);
    assert_eq!(out, b"STREAMED CONTENT");
}

#[tokio::test]
async fn test_translate_stream_reads_text() {
    let (url, log) = serve_fixed(StatusCode::OK, "hello").await;
    let client = Client::new(url);

    let stream = client
        .translate_stream("hola", &Translator::Custom("com.example.MyTranslator".to_string()), "es", "en")
        .await
        .unwrap();
    assert_eq!(stream.text().await.unwrap(), "hello");
    assert_eq!(last_request(&log).path, "/translate/all/com.example.MyTranslator/es/en");
}

#[tokio::test]
async fn test_parse_stream_error_is_reported_before_streaming() {
    let (url, _log) = serve_fixed(StatusCode::UNPROCESSABLE_ENTITY, "unsupported").await;
    let client = Client::new(url);

    let err = client.parse_stream("body").await.unwrap_err();
    assert_eq!(err.status_code(), Some(422));
}

#[tokio::test]
async fn test_concurrent_calls_share_one_client() {
    let (url, log) = serve_fixed(StatusCode::OK, "1.14").await;
    let client = Client::new(url);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let client = client.clone();
        handles.push(tokio::spawn(async move { client.version().await }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), "1.14");
    }
    assert_eq!(log.lock().len(), 8);
}

#[tokio::test]
async fn test_unreadable_error_body_still_reports_status() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    // Promises more body than it sends, then hangs up.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = vec![0u8; 4096];
        let _ = socket.read(&mut request).await;
        socket
            .write_all(b"HTTP/1.1 500 Internal Server Error\r\ncontent-length: 100\r\n\r\npartial")
            .await
            .unwrap();
    });

    let client = Client::new(format!("http://{}", addr));
    let err = client.version().await.unwrap_err();
    let client_err = err.as_client_error().expect("status preserved");
    assert_eq!(client_err.status_code, 500);
    assert!(client_err.body.is_empty(), "{:?}", client_err.body);
}
