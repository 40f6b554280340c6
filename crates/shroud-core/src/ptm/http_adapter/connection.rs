use reqwest::Url;

use crate::error::CoreError;
use crate::types::EncryptedPayloadReference;

pub(super) fn parse_connection(connection: &str) -> Result<Url, CoreError> {
    let parsed = Url::parse(connection).map_err(|e| {
        CoreError::InvalidConfig(format!(
            "invalid connection `{connection}`: expected HTTP(S) URL ({e})"
        ))
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(CoreError::InvalidConfig(format!(
            "unsupported connection scheme `{other}`; expected http or https"
        ))),
    }
}

/// Append `segments` to the base URL path, percent-encoding each one.
pub(super) fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, CoreError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| CoreError::InvalidConfig(format!("connection `{base}` cannot be a base")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

pub(super) fn transaction_url(
    base: &Url,
    reference: &EncryptedPayloadReference,
    raw: bool,
) -> Result<Url, CoreError> {
    let mut url = endpoint(base, &["transaction", &reference.to_base64()])?;
    if raw {
        url.query_pairs_mut().append_pair("isRaw", "true");
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_connection_http_url() {
        let parsed = parse_connection("http://127.0.0.1:9101").expect("should parse");
        assert_eq!(parsed.as_str(), "http://127.0.0.1:9101/");
    }

    #[test]
    fn parse_connection_invalid_scheme() {
        let err = parse_connection("ftp://example.com").expect_err("must reject ftp");
        assert!(err.to_string().contains("unsupported connection scheme"));
    }

    #[test]
    fn parse_connection_rejects_garbage() {
        let err = parse_connection("not a url").expect_err("must reject");
        assert!(err.to_string().contains("expected HTTP(S) URL"));
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let base = parse_connection("https://ptm.internal/tessera/").expect("should parse");
        let url = endpoint(&base, &["upcheck"]).expect("should build");
        assert_eq!(url.as_str(), "https://ptm.internal/tessera/upcheck");
    }

    #[test]
    fn transaction_url_escapes_base64_slashes() {
        let base = parse_connection("http://localhost:9101").expect("should parse");
        let reference = EncryptedPayloadReference::from_array([0xff; 64]);

        let url = transaction_url(&base, &reference, false).expect("should build");
        let key = reference.to_base64();
        assert!(key.contains('/'));
        assert_eq!(
            url.as_str(),
            format!("http://localhost:9101/transaction/{}", key.replace('/', "%2F"))
        );

        let raw = transaction_url(&base, &reference, true).expect("should build");
        assert_eq!(raw.query(), Some("isRaw=true"));
    }
}
