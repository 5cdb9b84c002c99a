use crate::Headers;
use serde::Serialize;

/// A decoded SSDP datagram.
///
/// Classification follows the raw text: anything mentioning `M-SEARCH` is a
/// search, anything else mentioning `NOTIFY` is a notification, and an HTTP
/// status line makes a search response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SsdpMessage {
    Search(SearchRequest),
    Notify(Notification),
    Response(SearchResponse),
    Unknown(Headers),
}

impl SsdpMessage {
    pub fn parse(text: &str) -> Self {
        let headers = Headers::parse(text);
        if text.contains("M-SEARCH") {
            Self::Search(SearchRequest::from(headers))
        } else if text.contains("NOTIFY") {
            Self::Notify(Notification::from(headers))
        } else if text.starts_with("HTTP/") {
            Self::Response(SearchResponse::from(headers))
        } else {
            Self::Unknown(headers)
        }
    }

    /// All headers of the message, including those with a typed field.
    pub fn headers(&self) -> &Headers {
        match self {
            Self::Search(inner) => &inner.headers,
            Self::Notify(inner) => &inner.headers,
            Self::Response(inner) => &inner.headers,
            Self::Unknown(headers) => headers,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchRequest {
    pub search_target: Option<String>,
    pub man: Option<String>,
    pub mx: Option<u32>,
    pub headers: Headers,
}

impl From<Headers> for SearchRequest {
    fn from(headers: Headers) -> Self {
        Self {
            search_target: owned(&headers, "st"),
            man: owned(&headers, "man"),
            mx: headers.get("mx").and_then(|mx| mx.parse().ok()),
            headers,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationSubType {
    Alive,
    Byebye,
    Other(String),
}

impl From<&str> for NotificationSubType {
    fn from(value: &str) -> Self {
        match value {
            "ssdp:alive" => Self::Alive,
            "ssdp:byebye" => Self::Byebye,
            other => Self::Other(other.to_owned()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub notification_type: Option<String>,
    pub sub_type: Option<NotificationSubType>,
    pub usn: Option<String>,
    pub location: Option<String>,
    pub server: Option<String>,
    pub max_age: Option<u32>,
    pub headers: Headers,
}

impl From<Headers> for Notification {
    fn from(headers: Headers) -> Self {
        Self {
            notification_type: owned(&headers, "nt"),
            sub_type: headers.get("nts").map(NotificationSubType::from),
            usn: owned(&headers, "usn"),
            location: owned(&headers, "location"),
            server: owned(&headers, "server"),
            max_age: headers.get("cache-control").and_then(parse_max_age),
            headers,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResponse {
    pub search_target: Option<String>,
    pub usn: Option<String>,
    pub location: Option<String>,
    pub server: Option<String>,
    pub max_age: Option<u32>,
    pub headers: Headers,
}

impl From<Headers> for SearchResponse {
    fn from(headers: Headers) -> Self {
        Self {
            search_target: owned(&headers, "st"),
            usn: owned(&headers, "usn"),
            location: owned(&headers, "location"),
            server: owned(&headers, "server"),
            max_age: headers.get("cache-control").and_then(parse_max_age),
            headers,
        }
    }
}

/// Extracts the seconds of `max-age` from a `CACHE-CONTROL` value.
///
/// Spaces around `=` are accepted, as in `max-age = 1800`.
pub fn parse_max_age(cache_control: &str) -> Option<u32> {
    cache_control.split(',').find_map(|directive| {
        let (name, value) = directive.split_once('=')?;
        if name.trim().eq_ignore_ascii_case("max-age") {
            value.trim().parse().ok()
        } else {
            None
        }
    })
}

fn owned(headers: &Headers, name: &str) -> Option<String> {
    headers.get(name).map(str::to_owned)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_search() {
        let message = SsdpMessage::parse(
            "M-SEARCH * HTTP/1.1\r\nHOST: 239.255.255.250:1900\r\nMAN: \"ssdp:discover\"\r\nMX: 3\r\nST: ssdp:all\r\nUSER-AGENT: test\r\n\r\n",
        );

        if let SsdpMessage::Search(search) = message {
            assert_eq!(search.search_target.as_deref(), Some("ssdp:all"));
            assert_eq!(search.man.as_deref(), Some("\"ssdp:discover\""));
            assert_eq!(search.mx, Some(3));
            assert_eq!(search.headers.get("user-agent"), Some("test"));
        } else {
            panic!("Expecting `Search`");
        }
    }

    #[test]
    fn parse_byebye() {
        let message = SsdpMessage::parse(
            "NOTIFY * HTTP/1.1\r\nNT: urn:x\r\nNTS: ssdp:byebye\r\nUSN: id::urn:x\r\n\r\n",
        );

        if let SsdpMessage::Notify(notification) = message {
            assert_eq!(notification.sub_type, Some(NotificationSubType::Byebye));
            assert_eq!(notification.usn.as_deref(), Some("id::urn:x"));
            assert_eq!(notification.location, None);
            assert_eq!(notification.max_age, None);
        } else {
            panic!("Expecting `Notify`");
        }
    }

    #[test]
    fn parse_response() {
        let message = SsdpMessage::parse(
            "HTTP/1.1 200 OK\r\nCACHE-CONTROL: max-age = 1800\r\nEXT:\r\nST: upnp:rootdevice\r\n\r\n",
        );

        if let SsdpMessage::Response(response) = message {
            assert_eq!(response.max_age, Some(1800));
            assert_eq!(response.search_target.as_deref(), Some("upnp:rootdevice"));
            assert_eq!(response.headers.get("ext"), Some(""));
        } else {
            panic!("Expecting `Response`");
        }
    }

    #[test]
    fn search_wins_over_notify() {
        let message = SsdpMessage::parse("M-SEARCH * HTTP/1.1\r\nX-NOTE: NOTIFY\r\n\r\n");
        assert!(matches!(message, SsdpMessage::Search(_)));
    }

    #[test]
    fn unknown_keeps_headers() {
        let message = SsdpMessage::parse("hello world\r\nFOO: bar\r\n");

        assert_eq!(message.headers().get("foo"), Some("bar"));
        assert!(matches!(message, SsdpMessage::Unknown(_)));
    }

    #[test]
    fn max_age_variants() {
        assert_eq!(parse_max_age("max-age=900"), Some(900));
        assert_eq!(parse_max_age("no-cache, MAX-AGE = 60"), Some(60));
        assert_eq!(parse_max_age("max-age = soon"), None);
        assert_eq!(parse_max_age("no-cache"), None);
    }
}
