use reqwest::Url;
use tracing::warn;

const LOCAL_PORT: u16 = 8082;

/// Normalizes a user-supplied Traccar address into `scheme://host[:port][/path]` without a
/// trailing slash. Local servers default to plain http on Traccar's port. Blank or unparseable
/// input falls back to `default`.
pub fn normalize_base_url(value: &str, default: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return default.trim().trim_end_matches('/').to_string();
    }

    let with_scheme = if has_scheme(trimmed) {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    };

    let mut url = match Url::parse(&with_scheme) {
        Ok(url) => url,
        Err(e) => {
            warn!("⚠️ Unable to normalize Traccar URL '{}', using the default: {}", trimmed, e);
            return default.trim().trim_end_matches('/').to_string();
        }
    };

    let is_local = matches!(url.host_str(), Some("localhost") | Some("127.0.0.1"));
    if is_local && url.port().is_none() {
        // Only fails for URLs that cannot carry a port, which were rejected by the parser already
        let _ = url.set_port(Some(LOCAL_PORT));
    }
    if is_local && url.scheme() == "https" {
        let _ = url.set_scheme("http");
    }

    url.set_query(None);
    url.set_fragment(None);
    let path = url.path().trim_end_matches('/').to_string();
    url.set_path(&path);

    url.to_string().trim_end_matches('/').to_string()
}

fn has_scheme(value: &str) -> bool {
    let Some((scheme, _)) = value.split_once("://") else {
        return false;
    };

    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
