use axum::http::{header::AUTHORIZATION, HeaderMap};
use base64ct::{Base64, Encoding};

/// `name`/`pass` pair carried by an `Authorization: Basic ...` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub name: String,
    pub pass: String,
}

impl Credentials {
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
        Self::parse(value)
    }

    /// Parses a header value. The scheme is case-insensitive and the password
    /// may itself contain `:`.
    pub fn parse(value: &str) -> Option<Self> {
        let (scheme, encoded) = value.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return None;
        }
        let decoded = Base64::decode_vec(encoded.trim()).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (name, pass) = decoded.split_once(':')?;
        Some(Self {
            name: name.to_string(),
            pass: pass.to_string(),
        })
    }

    /// Header value for these credentials.
    #[cfg(test)]
    pub fn encode(&self) -> String {
        format!(
            "Basic {}",
            Base64::encode_string(format!("{}:{}", self.name, self.pass).as_bytes())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn creds(name: &str, pass: &str) -> Credentials {
        Credentials {
            name: name.into(),
            pass: pass.into(),
        }
    }

    #[test]
    fn parses_a_basic_header() {
        let parsed = Credentials::parse("Basic am9lQHNtaXRoLmNvbTpqb2VwYXNzd29yZA==");
        assert_eq!(parsed, Some(creds("joe@smith.com", "joepassword")));
    }

    #[test]
    fn scheme_is_case_insensitive() {
        let header = creds("a@b.co", "pw").encode().replacen("Basic", "bAsIc", 1);
        assert_eq!(Credentials::parse(&header), Some(creds("a@b.co", "pw")));
    }

    #[test]
    fn password_keeps_everything_after_the_first_colon() {
        let header = creds("a@b.co", "p:a:ss").encode();
        assert_eq!(Credentials::parse(&header).unwrap().pass, "p:a:ss");
    }

    #[test]
    fn rejects_malformed_values() {
        assert_eq!(Credentials::parse("Bearer abc.def.ghi"), None);
        assert_eq!(Credentials::parse("Basic"), None);
        assert_eq!(Credentials::parse("Basic !!!not-base64!!!"), None);
        // "nocolon"
        assert_eq!(Credentials::parse("Basic bm9jb2xvbg=="), None);
    }

    #[test]
    fn reads_from_header_map() {
        let mut headers = HeaderMap::new();
        assert_eq!(Credentials::from_headers(&headers), None);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&creds("x@y.io", "secretpw").encode()).unwrap(),
        );
        assert_eq!(Credentials::from_headers(&headers), Some(creds("x@y.io", "secretpw")));
    }
}
