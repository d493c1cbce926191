use axum::{
    body::Body,
    http::{HeaderValue, header},
    response::Response,
};
use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;

use crate::{models::UserRecord, templates};

/// Longest tag name the scanner needs to tell apart (`script`).
const NAME_CAP: usize = 6;

/// BannerInjector
///
/// Push-based scanner that copies an HTML byte stream through unchanged, except
/// that `banner` is emitted right after the `>` closing the first `<body ...>`
/// start tag. The scan follows enough of the HTML tokenizer to skip comments,
/// declarations, quoted attribute values and script or style content, so a
/// `<body>` mentioned in any of those is not mistaken for the real one. All
/// state lives between bytes, so chunk boundaries may fall anywhere and nothing
/// is ever held back.
pub struct BannerInjector {
    banner: Bytes,
    state: ScanState,
}

/// Elements whose content is not markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RawKind {
    Script,
    Style,
}

impl RawKind {
    fn end_tag(self) -> &'static [u8] {
        match self {
            RawKind::Script => b"</script",
            RawKind::Style => b"</style",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// Text between tags.
    Data,
    /// After `<`, reading the tag name. Only the first `NAME_CAP` bytes are
    /// kept; `len` saturates one past that so longer names match nothing.
    TagOpen { name: [u8; NAME_CAP], len: usize },
    /// After `<!`, counting the dashes of a comment opener.
    MarkupDecl { dashes: u8 },
    /// Inside `<!-- ... -->`, counting trailing dashes.
    Comment { dashes: u8 },
    /// Doctype, processing instruction or other `<!...>`. Ends at `>`.
    Bogus,
    /// Any tag other than the body start tag.
    InTag {
        quote: Option<u8>,
        raw: Option<RawKind>,
    },
    /// Inside the body start tag, looking for its closing `>`.
    InBodyTag { quote: Option<u8> },
    /// Script or style content; `matched` bytes of the end tag seen so far.
    RawText { kind: RawKind, matched: usize },
    /// Banner written; everything else passes straight through.
    Done,
}

impl ScanState {
    fn tag_open() -> Self {
        ScanState::TagOpen {
            name: [0; NAME_CAP],
            len: 0,
        }
    }

    /// Advances by one byte. Returns true when the banner belongs right after it.
    fn step(&mut self, b: u8) -> bool {
        match *self {
            ScanState::Data => {
                if b == b'<' {
                    *self = Self::tag_open();
                }
            }
            ScanState::TagOpen { mut name, len } => {
                if len == 0 {
                    *self = match b {
                        b'!' => ScanState::MarkupDecl { dashes: 0 },
                        b'?' => ScanState::Bogus,
                        b'/' => ScanState::InTag {
                            quote: None,
                            raw: None,
                        },
                        b'<' => Self::tag_open(),
                        _ if b.is_ascii_alphabetic() => {
                            name[0] = b.to_ascii_lowercase();
                            ScanState::TagOpen { name, len: 1 }
                        }
                        _ => ScanState::Data,
                    };
                } else if is_tag_delimiter(b) {
                    let tag = if len <= NAME_CAP { &name[..len] } else { &[][..] };
                    *self = match tag {
                        b"body" => ScanState::InBodyTag { quote: None },
                        b"script" => ScanState::InTag {
                            quote: None,
                            raw: Some(RawKind::Script),
                        },
                        b"style" => ScanState::InTag {
                            quote: None,
                            raw: Some(RawKind::Style),
                        },
                        _ => ScanState::InTag {
                            quote: None,
                            raw: None,
                        },
                    };
                    // The delimiter may be the closing `>`.
                    return self.step(b);
                } else {
                    if len < NAME_CAP {
                        name[len] = b.to_ascii_lowercase();
                    }
                    *self = ScanState::TagOpen {
                        name,
                        len: (len + 1).min(NAME_CAP + 1),
                    };
                }
            }
            ScanState::MarkupDecl { dashes } => {
                *self = match b {
                    b'-' if dashes == 0 => ScanState::MarkupDecl { dashes: 1 },
                    b'-' => ScanState::Comment { dashes: 0 },
                    b'>' => ScanState::Data,
                    _ => ScanState::Bogus,
                };
            }
            ScanState::Comment { dashes } => {
                *self = match b {
                    b'-' => ScanState::Comment {
                        dashes: (dashes + 1).min(2),
                    },
                    b'>' if dashes == 2 => ScanState::Data,
                    _ => ScanState::Comment { dashes: 0 },
                };
            }
            ScanState::Bogus => {
                if b == b'>' {
                    *self = ScanState::Data;
                }
            }
            ScanState::InTag { quote, raw } => match quote {
                Some(q) if b == q => *self = ScanState::InTag { quote: None, raw },
                Some(_) => {}
                None if b == b'"' || b == b'\'' => {
                    *self = ScanState::InTag {
                        quote: Some(b),
                        raw,
                    }
                }
                None if b == b'>' => {
                    *self = match raw {
                        Some(kind) => ScanState::RawText { kind, matched: 0 },
                        None => ScanState::Data,
                    }
                }
                None => {}
            },
            ScanState::InBodyTag { quote } => match quote {
                Some(q) if b == q => *self = ScanState::InBodyTag { quote: None },
                Some(_) => {}
                None if b == b'"' || b == b'\'' => {
                    *self = ScanState::InBodyTag { quote: Some(b) }
                }
                None if b == b'>' => {
                    *self = ScanState::Done;
                    return true;
                }
                None => {}
            },
            ScanState::RawText { kind, matched } => {
                let end = kind.end_tag();
                if matched == end.len() && is_tag_delimiter(b) {
                    *self = ScanState::InTag {
                        quote: None,
                        raw: None,
                    };
                    return self.step(b);
                }
                let continues = matched < end.len() && b.to_ascii_lowercase() == end[matched];
                let matched = if continues {
                    matched + 1
                } else {
                    usize::from(b == b'<')
                };
                *self = ScanState::RawText { kind, matched };
            }
            ScanState::Done => {}
        }
        false
    }
}

impl BannerInjector {
    pub fn new(banner: impl Into<Bytes>) -> Self {
        Self {
            banner: banner.into(),
            state: ScanState::Data,
        }
    }

    /// True once the banner has been written.
    pub fn injected(&self) -> bool {
        self.state == ScanState::Done
    }

    /// push
    ///
    /// Feeds the next chunk and returns it, with the banner spliced in if the
    /// body start tag closes inside it.
    pub fn push(&mut self, chunk: Bytes) -> Bytes {
        if self.state == ScanState::Done {
            return chunk;
        }

        let state = &mut self.state;
        let Some(at) = chunk.iter().position(|&b| state.step(b)) else {
            return chunk;
        };

        let mut out = BytesMut::with_capacity(chunk.len() + self.banner.len());
        out.extend_from_slice(&chunk[..=at]);
        out.extend_from_slice(&self.banner);
        out.extend_from_slice(&chunk[at + 1..]);
        out.freeze()
    }
}

fn is_tag_delimiter(b: u8) -> bool {
    b == b'>' || b == b'/' || b.is_ascii_whitespace()
}

/// is_html
///
/// Matches the downstream `content-type` against `text/html`.
pub fn is_html(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("text/html"))
}

/// decorate_authorized
///
/// Applies the authorized-response rewrite: HTML bodies get the identity bar
/// streamed in and two `x-auth-*` headers; anything else is returned untouched.
pub fn decorate_authorized(response: Response, user: &UserRecord) -> Response {
    if !is_html(&response) {
        return response;
    }

    let banner = templates::identity_bar(&user.surname);
    let (mut parts, body) = response.into_parts();

    // The injected banner changes the length.
    parts.headers.remove(header::CONTENT_LENGTH);

    match HeaderValue::from_str(&user.id) {
        Ok(value) => {
            parts.headers.insert("x-auth-user", value);
        }
        Err(_) => {
            tracing::warn!(
                user_id = ?user.id,
                "user id is not a valid header value, omitting x-auth-user"
            );
        }
    }
    parts
        .headers
        .insert("x-auth-status", HeaderValue::from_static("authorized"));

    Response::from_parts(parts, inject_banner(body, banner))
}

/// inject_banner
///
/// Wraps `body` in a stream running [`BannerInjector`] chunk by chunk.
pub fn inject_banner(body: Body, banner: impl Into<Bytes>) -> Body {
    let mut injector = BannerInjector::new(banner);
    let mut upstream = body.into_data_stream();

    let stream = async_stream::stream! {
        while let Some(chunk) = upstream.next().await {
            match chunk {
                Ok(bytes) => {
                    let out = injector.push(bytes);
                    if !out.is_empty() {
                        yield Ok::<Bytes, axum::Error>(out);
                    }
                }
                Err(err) => {
                    yield Err(err);
                    return;
                }
            }
        }
    };

    Body::from_stream(stream)
}
