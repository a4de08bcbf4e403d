//! Reproducible `curl` invocations for captured requests.

use axum::http::{header, HeaderMap, Method};

use crate::http::request::{RequestSnapshot, X_REQUEST_ID};

const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Scheme the client used to reach the proxy.
///
/// The listener speaks plain HTTP, so an encrypted hop can only be learned
/// from a terminating load balancer's `X-Forwarded-Proto`.
pub fn inferred_scheme(headers: &HeaderMap) -> &'static str {
    let encrypted = headers
        .get(X_FORWARDED_PROTO)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(',').next().unwrap_or("").trim().eq_ignore_ascii_case("https"))
        .unwrap_or(false);
    if encrypted {
        "https"
    } else {
        "http"
    }
}

/// Render `snapshot` as a shell command that replays it.
///
/// The URL is rebuilt from the Host header and the original path and query.
/// Every header the client sent becomes one `-H` flag with its values
/// comma-joined; the body is attached for every method except GET.
pub fn to_curl(snapshot: &RequestSnapshot) -> String {
    let host = snapshot
        .headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| snapshot.uri.authority().map(|a| a.as_str()))
        .unwrap_or("localhost");
    let path_and_query = snapshot
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let url = format!("{}://{}{}", inferred_scheme(&snapshot.headers), host, path_and_query);

    let mut cmd = format!("curl -X {} {}", snapshot.method, quote(&url));

    for name in snapshot.headers.keys() {
        if snapshot.request_id_generated && name.as_str() == X_REQUEST_ID {
            continue;
        }
        let values: Vec<String> = snapshot
            .headers
            .get_all(name)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .collect();
        cmd.push_str(" -H ");
        cmd.push_str(&quote(&format!("{}: {}", name, values.join(","))));
    }

    if snapshot.method != Method::GET {
        cmd.push_str(" --data ");
        cmd.push_str(&quote(&String::from_utf8_lossy(&snapshot.body)));
    }

    cmd
}

/// Single-quote `s` for a POSIX shell.
fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Version};
    use bytes::Bytes;

    fn snapshot(method: Method, headers: &[(&'static str, &'static str)], body: &'static str) -> RequestSnapshot {
        let mut map = HeaderMap::new();
        for (k, v) in headers {
            map.append(*k, HeaderValue::from_static(*v));
        }
        RequestSnapshot::new(
            method,
            "/api/user/42?full=1".parse().unwrap(),
            Version::HTTP_11,
            map,
            Bytes::from_static(body.as_bytes()),
        )
    }

    #[test]
    fn test_post_includes_headers_and_body() {
        let s = snapshot(
            Method::POST,
            &[("host", "svc.local:18080"), ("accept", "a"), ("accept", "b")],
            r#"{"a":1}"#,
        );
        assert_eq!(
            to_curl(&s),
            r#"curl -X POST 'http://svc.local:18080/api/user/42?full=1' -H 'host: svc.local:18080' -H 'accept: a,b' --data '{"a":1}'"#
        );
    }

    #[test]
    fn test_get_omits_body() {
        let s = snapshot(Method::GET, &[("host", "svc.local")], "ignored");
        let cmd = to_curl(&s);
        assert!(cmd.starts_with("curl -X GET 'http://svc.local/api/user/42?full=1'"));
        assert!(!cmd.contains("--data"));
    }

    #[test]
    fn test_delete_keeps_empty_body() {
        let s = snapshot(Method::DELETE, &[("host", "svc.local")], "");
        assert!(to_curl(&s).ends_with("--data ''"));
    }

    #[test]
    fn test_https_inferred_from_forwarded_proto() {
        let s = snapshot(
            Method::GET,
            &[("host", "svc.local"), ("x-forwarded-proto", "https")],
            "",
        );
        assert!(to_curl(&s).starts_with("curl -X GET 'https://svc.local/"));
    }

    #[test]
    fn test_proxy_assigned_request_id_omitted() {
        let assigned = snapshot(Method::GET, &[("host", "svc"), ("x-request-id", "abc")], "")
            .with_generated_request_id(true);
        assert_eq!(to_curl(&assigned), "curl -X GET 'http://svc/api/user/42?full=1' -H 'host: svc'");

        let sent = snapshot(Method::GET, &[("host", "svc"), ("x-request-id", "abc")], "");
        assert!(to_curl(&sent).ends_with("-H 'x-request-id: abc'"));
    }

    #[test]
    fn test_single_quotes_escaped() {
        let s = snapshot(Method::PUT, &[("host", "h")], "it's");
        assert!(to_curl(&s).ends_with(r#"--data 'it'\''s'"#));
    }
}
