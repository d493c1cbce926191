use axum::{
    body::Body,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures_util::stream;
use site_gate::{
    models::UserRecord,
    rewrite::{BannerInjector, decorate_authorized, inject_banner, is_html},
};

const BANNER: &str = "<div id=\"identity-bar\">hi</div>";

/// Feeds `chunks` through a fresh injector and concatenates the output.
fn run(chunks: &[&str]) -> (String, bool) {
    let mut injector = BannerInjector::new(BANNER);
    let mut out = Vec::new();
    for chunk in chunks {
        out.extend_from_slice(&injector.push(Bytes::copy_from_slice(chunk.as_bytes())));
    }
    (String::from_utf8(out).unwrap(), injector.injected())
}

fn user() -> UserRecord {
    UserRecord {
        id: "10000000002".to_string(),
        surname: "Brandt".to_string(),
        active: 1,
        groups: vec!["staff".to_string()],
    }
}

async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// --- BannerInjector ---

#[test]
fn test_banner_follows_body_tag() {
    let (html, injected) = run(&["<html><head></head><body><p>x</p></body></html>"]);

    assert!(injected);
    assert_eq!(
        html,
        format!("<html><head></head><body>{BANNER}<p>x</p></body></html>")
    );
}

#[test]
fn test_every_split_point_gives_the_same_output() {
    let doc = "<html><head><title>t</title></head><BODY class=\"a>b\" data-x='1'>\n<h1>x</h1></BODY></html>";
    let expected = doc.replacen("data-x='1'>", &format!("data-x='1'>{BANNER}"), 1);

    for split in 0..=doc.len() {
        let (head, tail) = doc.split_at(split);
        let (html, injected) = run(&[head, tail]);
        assert!(injected, "split at {split}");
        assert_eq!(html, expected, "split at {split}");
    }
}

#[test]
fn test_byte_by_byte_stream() {
    let doc = "<body>content</body>";
    let chunks: Vec<String> = doc.chars().map(|c| c.to_string()).collect();
    let chunk_refs: Vec<&str> = chunks.iter().map(String::as_str).collect();

    let (html, injected) = run(&chunk_refs);

    assert!(injected);
    assert_eq!(html, format!("<body>{BANNER}content</body>"));
}

#[test]
fn test_lookalike_tags_are_skipped() {
    let (html, _) = run(&["<bodyguard>no</bodyguard><body>yes"]);

    assert_eq!(html, format!("<bodyguard>no</bodyguard><body>{BANNER}yes"));
}

#[test]
fn test_only_first_body_gets_banner() {
    let (html, _) = run(&["<body>a</body><body>b"]);

    assert_eq!(html, format!("<body>{BANNER}a</body><body>b"));
}

#[test]
fn test_document_without_body_is_untouched() {
    let (html, injected) = run(&["<p>fragment", " only <bo"]);

    assert!(!injected);
    assert_eq!(html, "<p>fragment only <bo");
}

#[test]
fn test_body_in_comment_is_not_the_body_tag() {
    let (html, _) = run(&["<!-- <body> --><!doctype html><body id=real>x"]);

    assert_eq!(
        html,
        format!("<!-- <body> --><!doctype html><body id=real>{BANNER}x")
    );
}

#[test]
fn test_body_in_script_and_style_is_skipped() {
    let doc = concat!(
        "<head><style>p::before{content:\"<body>\"}</style>",
        "<SCRIPT type=module>if (a<b) document.write('<body>');</Script >",
        "</head><body>x"
    );

    let (html, injected) = run(&[doc]);

    assert!(injected);
    assert_eq!(html.matches(BANNER).count(), 1);
    assert!(html.ends_with(&format!("</head><body>{BANNER}x")));
}

#[test]
fn test_body_in_attribute_value_is_skipped() {
    let (html, _) = run(&["<meta content=\"<body>\"><body>x"]);

    assert_eq!(html, format!("<meta content=\"<body>\"><body>{BANNER}x"));
}

#[test]
fn test_markup_lookalikes_at_every_split_point() {
    let doc = "<head><!-- layout: <body> wrapper --><script>var s='<body>';</script></head><body class=x><p>hi</p>";
    let expected = doc.replacen("<body class=x>", &format!("<body class=x>{BANNER}"), 1);

    for split in 0..=doc.len() {
        let (head, tail) = doc.split_at(split);
        let (html, injected) = run(&[head, tail]);
        assert!(injected, "split at {split}");
        assert_eq!(html, expected, "split at {split}");
    }
}

#[test]
fn test_unterminated_comment_swallows_later_body() {
    let (html, injected) = run(&["<!-- <body>", " still comment <body>"]);

    assert!(!injected);
    assert_eq!(html, "<!-- <body> still comment <body>");
}

// --- Response rewrite ---

#[test]
fn test_is_html_detects_charset_variants() {
    let html = ([(header::CONTENT_TYPE, "Text/HTML; charset=utf-8")], "x").into_response();
    let json = ([(header::CONTENT_TYPE, "application/json")], "{}").into_response();

    assert!(is_html(&html));
    assert!(!is_html(&json));
    assert!(!is_html(&StatusCode::NO_CONTENT.into_response()));
}

#[tokio::test]
async fn test_inject_banner_over_chunked_body() {
    let chunks = vec![
        Ok::<_, std::io::Error>(Bytes::from_static(b"<html><bo")),
        Ok(Bytes::from_static(b"dy lang=\"en\"")),
        Ok(Bytes::from_static(b"><main>page</main></body></html>")),
    ];
    let body = Body::from_stream(stream::iter(chunks));

    let out = axum::body::to_bytes(inject_banner(body, BANNER), usize::MAX)
        .await
        .unwrap();

    assert_eq!(
        out,
        format!("<html><body lang=\"en\">{BANNER}<main>page</main></body></html>")
    );
}

#[tokio::test]
async fn test_decorate_html_adds_banner_and_headers() {
    let response = (
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        "<html><body><p>report</p></body></html>",
    )
        .into_response();

    let decorated = decorate_authorized(response, &user());

    assert_eq!(decorated.headers()["x-auth-user"], "10000000002");
    assert_eq!(decorated.headers()["x-auth-status"], "authorized");
    assert!(decorated.headers().get(header::CONTENT_LENGTH).is_none());

    let html = body_string(decorated).await;
    let after_body = html.split_once("<body>").unwrap().1;
    assert!(after_body.starts_with("<div class=\"id-bar\" id=\"identity-bar\">"));
    assert!(after_body.contains("Logged in as: <strong>Brandt</strong>"));
    assert!(after_body.ends_with("<p>report</p></body></html>"));
}

#[tokio::test]
async fn test_decorate_skips_user_header_for_unrepresentable_id() {
    let response = ([(header::CONTENT_TYPE, "text/html")], "<body>page").into_response();
    let odd = UserRecord {
        id: "1000\n0002".to_string(),
        ..user()
    };

    let decorated = decorate_authorized(response, &odd);

    assert!(decorated.headers().get("x-auth-user").is_none());
    assert_eq!(decorated.headers()["x-auth-status"], "authorized");
    assert!(body_string(decorated).await.contains("identity-bar"));
}

#[tokio::test]
async fn test_decorate_leaves_json_byte_identical() {
    let payload = r#"{"body":"<body>not html</body>"}"#;
    let response = ([(header::CONTENT_TYPE, "application/json")], payload).into_response();

    let decorated = decorate_authorized(response, &user());

    assert!(decorated.headers().get("x-auth-user").is_none());
    assert_eq!(body_string(decorated).await, payload);
}
