//! OAuth 1.0a request signing (HMAC-SHA1).

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ring::hmac;
use ring::rand::{SecureRandom, SystemRandom};

/// Consumer and token credentials of a Twitter app user.
#[derive(Clone)]
pub struct OAuth1Credentials {
    /// App consumer key.
    pub consumer_key: String,
    /// App consumer secret.
    pub consumer_secret: String,
    /// User access token.
    pub token: String,
    /// User access token secret.
    pub token_secret: String,
}

impl fmt::Debug for OAuth1Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuth1Credentials")
            .field("consumer_key", &self.consumer_key)
            .finish_non_exhaustive()
    }
}

/// RFC 3986 percent-encoding: everything except `A-Z a-z 0-9 - . _ ~`.
pub(crate) fn percent_encode(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

/// `METHOD&url&sorted-params`, each part percent-encoded.
pub(crate) fn signature_base_string(method: &str, url: &str, params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    encoded.sort();

    let joined = encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        percent_encode(url),
        percent_encode(&joined)
    )
}

/// Base64 HMAC-SHA1 of the base string.
pub(crate) fn sign(base_string: &str, consumer_secret: &str, token_secret: &str) -> String {
    let key = format!("{}&{}", percent_encode(consumer_secret), percent_encode(token_secret));
    let key = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, key.as_bytes());
    STANDARD.encode(hmac::sign(&key, base_string.as_bytes()).as_ref())
}

fn nonce() -> String {
    let mut bytes = [0u8; 16];
    // SystemRandom only fails if the OS RNG is unavailable.
    if SystemRandom::new().fill(&mut bytes).is_err() {
        let now = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
        return format!("{now:x}");
    }
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

impl OAuth1Credentials {
    /// `Authorization` header for a request. `url` excludes the query;
    /// `query` holds the decoded query (and form body) parameters.
    pub fn authorization_header(&self, method: &str, url: &str, query: &[(String, String)]) -> String {
        self.authorization_header_with(method, url, query, &nonce(), chrono::Utc::now().timestamp())
    }

    pub(crate) fn authorization_header_with(
        &self,
        method: &str,
        url: &str,
        query: &[(String, String)],
        nonce: &str,
        timestamp: i64,
    ) -> String {
        let mut oauth = vec![
            ("oauth_consumer_key".to_string(), self.consumer_key.clone()),
            ("oauth_nonce".to_string(), nonce.to_string()),
            ("oauth_signature_method".to_string(), "HMAC-SHA1".to_string()),
            ("oauth_timestamp".to_string(), timestamp.to_string()),
            ("oauth_token".to_string(), self.token.clone()),
            ("oauth_version".to_string(), "1.0".to_string()),
        ];

        let mut params = oauth.clone();
        params.extend(query.iter().cloned());
        let base = signature_base_string(method, url, &params);
        oauth.push((
            "oauth_signature".to_string(),
            sign(&base, &self.consumer_secret, &self.token_secret),
        ));
        oauth.sort();

        let fields = oauth
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
            .collect::<Vec<_>>()
            .join(", ");
        format!("OAuth {fields}")
    }
}
