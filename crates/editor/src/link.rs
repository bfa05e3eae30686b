use url::Url;

const HTTP: &str = "http://";
const HTTPS: &str = "https://";

fn has_prefix_ignore_case(s: &str, prefix: &str) -> bool {
    s.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Prefixes `https://` unless the URL already names http or https.
/// Protocol-relative `//host` URLs only get the scheme.
pub fn with_protocol(href: &str) -> String {
    if has_prefix_ignore_case(href, HTTP) || has_prefix_ignore_case(href, HTTPS) {
        href.to_string()
    } else if href.starts_with("//") {
        format!("https:{href}")
    } else {
        format!("{HTTPS}{href}")
    }
}

/// Whether `text` is a well-formed absolute or protocol-relative
/// (`//host/...`) URL with a host.
///
/// The host must be `localhost`, an IP address, or a dotted domain whose
/// last label has at least two characters.
pub fn is_url(text: &str) -> bool {
    if text.is_empty() || text.chars().any(char::is_whitespace) {
        return false;
    }
    let parsed = match text.strip_prefix("//") {
        Some("") => return false,
        Some(_) => Url::parse(&format!("https:{text}")),
        None => {
            let Some((scheme, rest)) = text.split_once("://") else {
                return false;
            };
            if scheme.is_empty() || rest.is_empty() {
                return false;
            }
            Url::parse(text)
        }
    };
    let Ok(url) = parsed else {
        return false;
    };

    match url.host() {
        Some(url::Host::Domain(domain)) => {
            let domain = domain.trim_end_matches('.');
            if domain.eq_ignore_ascii_case("localhost") {
                return true;
            }
            match domain.rsplit_once('.') {
                Some((name, tld)) => !name.is_empty() && tld.chars().count() >= 2,
                None => false,
            }
        }
        Some(url::Host::Ipv4(_)) | Some(url::Host::Ipv6(_)) => true,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_is_added_once() {
        assert_eq!(with_protocol("example.com"), "https://example.com");
        assert_eq!(with_protocol("http://example.com"), "http://example.com");
        assert_eq!(with_protocol("HTTPS://example.com"), "HTTPS://example.com");
        assert_eq!(with_protocol("ftp://x.org"), "https://ftp://x.org");
        assert_eq!(with_protocol(""), "https://");
        assert_eq!(with_protocol("//cdn.example.com/a"), "https://cdn.example.com/a");
    }

    #[test]
    fn url_shapes() {
        assert!(is_url("https://example.com"));
        assert!(is_url("http://foo.com"));
        assert!(is_url("https://sub.example.co.uk/path?q=1#frag"));
        assert!(is_url("http://localhost:3000/posts"));
        assert!(is_url("http://127.0.0.1:8080"));
        assert!(is_url("//cdn.example.com/a.png"));

        assert!(!is_url("https://not a url"));
        assert!(!is_url("example.com"));
        assert!(!is_url("https://"));
        assert!(!is_url("https://example"));
        assert!(!is_url("https://example.c"));
        assert!(!is_url("mailto:someone@example.com"));
        assert!(!is_url(""));
        assert!(!is_url("//"));
        assert!(!is_url("//example"));
        assert!(!is_url("/posts/12"));
    }
}
