//! Synthesized responses for when neither origin nor cache can answer

use serde_json::{Value, json};
use time::format_description::well_known::Rfc3339;

use super::classify::strip_query;
use super::entry::CachedResponse;

const OFFLINE_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Offline</title>
<style>
body { font-family: system-ui, sans-serif; max-width: 32rem; margin: 4rem auto; padding: 0 1rem; color: #222; }
h1 { font-size: 1.5rem; }
li { margin: 0.25rem 0; }
button { margin-top: 1rem; padding: 0.5rem 1rem; }
</style>
</head>
<body>
<h1>You are offline</h1>
<p>The prediction server cannot be reached right now. These features still work from cache:</p>
<ul>
<li>Previously viewed pages</li>
<li>Recent prediction results</li>
<li>Saved number sets</li>
<li>Cached statistics</li>
</ul>
<p>New predictions need a connection and will be available once you are back online.</p>
<button onclick="location.reload()">Try again</button>
</body>
</html>
"#;

/// API paths with a canned payload that keeps the UI partly usable
fn canned_api_data(path: &str) -> Option<Value> {
    match path {
        "/api/statistics" => Some(json!({
            "total_draws": 0,
            "most_frequent": [],
            "least_frequent": [],
            "last_updated": null,
        })),
        "/api/health" => Some(json!({
            "status": "offline",
        })),
        _ => None,
    }
}

/// True when the Accept header lists `text/html`
pub fn accepts_html(accept: Option<&str>) -> bool {
    let Some(accept) = accept else {
        return false;
    };

    accept.split(',').any(|part| {
        part.trim()
            .parse::<mime::Mime>()
            .is_ok_and(|m| m.type_() == mime::TEXT && m.subtype() == mime::HTML)
    })
}

pub fn offline_page() -> CachedResponse {
    CachedResponse::new(
        200,
        vec![
            (
                "content-type".to_string(),
                mime::TEXT_HTML_UTF_8.to_string(),
            ),
            ("cache-control".to_string(), "no-store".to_string()),
        ],
        OFFLINE_PAGE,
    )
}

/// JSON payload marked `offline: true`; canned data for known endpoints,
/// otherwise a 503 error body
pub fn api_fallback(path_and_query: &str) -> CachedResponse {
    let path = strip_query(path_and_query);
    let timestamp = time::OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default();

    let (status, body) = match canned_api_data(path) {
        Some(data) => (
            200,
            json!({
                "success": true,
                "offline": true,
                "data": data,
                "timestamp": timestamp,
            }),
        ),
        None => (
            503,
            json!({
                "success": false,
                "offline": true,
                "error": "Network unavailable and no cached response",
                "timestamp": timestamp,
            }),
        ),
    };

    CachedResponse::new(
        status,
        vec![
            (
                "content-type".to_string(),
                mime::APPLICATION_JSON.to_string(),
            ),
            ("cache-control".to_string(), "no-store".to_string()),
        ],
        body.to_string(),
    )
}

pub fn unavailable() -> CachedResponse {
    CachedResponse::new(
        503,
        vec![
            (
                "content-type".to_string(),
                mime::TEXT_PLAIN_UTF_8.to_string(),
            ),
            ("cache-control".to_string(), "no-store".to_string()),
        ],
        "Offline: resource unavailable",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json_body(response: &CachedResponse) -> Value {
        serde_json::from_slice(&response.body).unwrap()
    }

    #[test]
    fn test_accepts_html() {
        assert!(accepts_html(Some(
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"
        )));
        assert!(accepts_html(Some("text/html")));
        assert!(!accepts_html(Some("application/json")));
        assert!(!accepts_html(Some("*/*")));
        assert!(!accepts_html(Some("not a mime")));
        assert!(!accepts_html(None));
    }

    #[test]
    fn test_offline_page() {
        let page = offline_page();
        assert_eq!(page.status, 200);
        assert!(page.header("content-type").unwrap().starts_with("text/html"));
        assert!(std::str::from_utf8(&page.body).unwrap().contains("You are offline"));
    }

    #[test]
    fn test_api_fallback_unknown_endpoint() {
        let response = api_fallback("/api/predictions?x=1");
        assert_eq!(response.status, 503);

        let body = json_body(&response);
        assert_eq!(body["success"], false);
        assert_eq!(body["offline"], true);
        assert!(body["error"].is_string());
    }

    #[test]
    fn test_api_fallback_canned_statistics() {
        let response = api_fallback("/api/statistics?range=all");
        assert_eq!(response.status, 200);

        let body = json_body(&response);
        assert_eq!(body["success"], true);
        assert_eq!(body["offline"], true);
        assert_eq!(body["data"]["total_draws"], 0);
    }

    #[test]
    fn test_unavailable() {
        let response = unavailable();
        assert_eq!(response.status, 503);
        assert_eq!(response.body, "Offline: resource unavailable");
        assert!(response.header("content-type").unwrap().starts_with("text/plain"));
    }
}
