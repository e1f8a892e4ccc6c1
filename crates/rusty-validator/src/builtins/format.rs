// File: src/builtins/format.rs
// Purpose: Well-known string formats (addresses, identifiers, colors, encodings)

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use chrono::format::{parse, ParseErrorKind, Parsed, StrftimeItems};
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::{Uuid, Variant};

use super::string::text;
use super::{rule, Builtin};
use crate::field_level::FieldLevel;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap()
});

static HTTP_URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").unwrap()
});

static URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.\-]*:(?://[^/?#\s]+\S*|///\S+|[^/\s]\S*)$").unwrap()
});

static URI_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[a-zA-Z][a-zA-Z0-9+.\-]*:\S+|/\S*)$").unwrap()
});

static HEXCOLOR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$").unwrap()
});

static E164_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+[1-9]?[0-9]{7,14}$").unwrap());

static BASE64_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[A-Za-z0-9+/]{4})*(?:[A-Za-z0-9+/]{2}==|[A-Za-z0-9+/]{3}=|[A-Za-z0-9+/]{4})$").unwrap()
});

static SEMVER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^(0|[1-9]\d*)\.(0|[1-9]\d*)\.(0|[1-9]\d*)",
        r"(?:-((?:0|[1-9]\d*|\d*[a-zA-Z-][0-9a-zA-Z-]*)(?:\.(?:0|[1-9]\d*|\d*[a-zA-Z-][0-9a-zA-Z-]*))*))?",
        r"(?:\+([0-9a-zA-Z-]+(?:\.[0-9a-zA-Z-]+)*))?$",
    ))
    .unwrap()
});

pub(super) fn rules() -> Vec<Builtin> {
    vec![
        rule("email", |fl: &FieldLevel<'_>| text(fl, |s| EMAIL_REGEX.is_match(s))),
        rule("url", |fl: &FieldLevel<'_>| text(fl, |s| URL_REGEX.is_match(s))),
        rule("http_url", |fl: &FieldLevel<'_>| text(fl, |s| HTTP_URL_REGEX.is_match(s))),
        rule("uri", |fl: &FieldLevel<'_>| text(fl, |s| URI_REGEX.is_match(s))),
        rule("uuid", |fl: &FieldLevel<'_>| text(fl, |s| parse_uuid(s).is_some())),
        rule("uuid4", |fl: &FieldLevel<'_>| text(fl, is_uuid4)),
        rule("ip", |fl: &FieldLevel<'_>| text(fl, |s| s.parse::<IpAddr>().is_ok())),
        rule("ipv4", |fl: &FieldLevel<'_>| text(fl, |s| s.parse::<Ipv4Addr>().is_ok())),
        rule("ipv6", |fl: &FieldLevel<'_>| text(fl, |s| s.parse::<Ipv6Addr>().is_ok())),
        rule("cidr", |fl: &FieldLevel<'_>| text(fl, is_cidr)),
        rule("mac", |fl: &FieldLevel<'_>| text(fl, is_mac)),
        rule("hexcolor", |fl: &FieldLevel<'_>| text(fl, |s| HEXCOLOR_REGEX.is_match(s))),
        rule("rgb", |fl: &FieldLevel<'_>| text(fl, |s| is_rgb(s, "rgb", false))),
        rule("rgba", |fl: &FieldLevel<'_>| text(fl, |s| is_rgb(s, "rgba", true))),
        rule("hsl", |fl: &FieldLevel<'_>| text(fl, |s| is_hsl(s, "hsl", false))),
        rule("hsla", |fl: &FieldLevel<'_>| text(fl, |s| is_hsl(s, "hsla", true))),
        rule("e164", |fl: &FieldLevel<'_>| text(fl, |s| E164_REGEX.is_match(s))),
        rule("base64", |fl: &FieldLevel<'_>| text(fl, |s| BASE64_REGEX.is_match(s))),
        rule("json", |fl: &FieldLevel<'_>| text(fl, |s| serde_json::from_str::<serde_json::Value>(s).is_ok())),
        rule("datetime", |fl: &FieldLevel<'_>| text(fl, |s| is_datetime(s, &fl.param()))),
        rule("semver", |fl: &FieldLevel<'_>| text(fl, |s| SEMVER_REGEX.is_match(s))),
    ]
}

/// Hyphenated form only
fn parse_uuid(s: &str) -> Option<Uuid> {
    if s.len() != 36 {
        return None;
    }
    Uuid::try_parse(s).ok()
}

fn is_uuid4(s: &str) -> bool {
    parse_uuid(s).is_some_and(|id| id.get_version_num() == 4 && id.get_variant() == Variant::RFC4122)
}

fn is_cidr(s: &str) -> bool {
    let Some((addr, prefix)) = s.split_once('/') else {
        return false;
    };
    let Ok(prefix) = prefix.parse::<u8>() else {
        return false;
    };

    match addr.parse::<IpAddr>() {
        Ok(IpAddr::V4(_)) => prefix <= 32,
        Ok(IpAddr::V6(_)) => prefix <= 128,
        Err(_) => false,
    }
}

/// 48, 64 or 160-bit hardware addresses in colon, hyphen or dot notation
fn is_mac(s: &str) -> bool {
    let is_hex_group = |group: &str, width: usize| group.len() == width && group.bytes().all(|b| b.is_ascii_hexdigit());

    let (separator, width, counts): (char, usize, [usize; 3]) = if s.contains(':') {
        (':', 2, [6, 8, 20])
    } else if s.contains('-') {
        ('-', 2, [6, 8, 20])
    } else if s.contains('.') {
        ('.', 4, [3, 4, 10])
    } else {
        return false;
    };

    let groups: Vec<&str> = s.split(separator).collect();
    counts.contains(&groups.len()) && groups.iter().all(|g| is_hex_group(g, width))
}

/// Comma-separated arguments of `name(...)`
fn color_args<'s>(s: &'s str, name: &str) -> Option<Vec<&'s str>> {
    let inner = s.strip_prefix(name)?.strip_prefix('(')?.strip_suffix(')')?;
    Some(inner.split(',').map(str::trim).collect())
}

fn is_alpha_channel(s: &str) -> bool {
    s.parse::<f64>().is_ok_and(|a| (0.0..=1.0).contains(&a))
}

fn is_percent(s: &str) -> bool {
    s.strip_suffix('%')
        .and_then(|n| n.parse::<u8>().ok())
        .is_some_and(|n| n <= 100)
}

fn is_rgb(s: &str, name: &str, with_alpha: bool) -> bool {
    let Some(args) = color_args(s, name) else {
        return false;
    };
    let channels = if with_alpha { 4 } else { 3 };
    if args.len() != channels {
        return false;
    }

    let (colors, alpha) = args.split_at(3);
    let all_bytes = colors.iter().all(|c| c.parse::<u8>().is_ok());
    let all_percent = colors.iter().all(|c| is_percent(c));

    (all_bytes || all_percent) && alpha.iter().all(|a| is_alpha_channel(a))
}

fn is_hsl(s: &str, name: &str, with_alpha: bool) -> bool {
    let Some(args) = color_args(s, name) else {
        return false;
    };
    let channels = if with_alpha { 4 } else { 3 };
    if args.len() != channels {
        return false;
    }

    args[0].parse::<u16>().is_ok_and(|hue| hue <= 360)
        && is_percent(args[1])
        && is_percent(args[2])
        && args[3..].iter().all(|a| is_alpha_channel(a))
}

/// Parses `s` with a strftime `layout`; layouts without a full date only
/// check the fields they name
fn is_datetime(s: &str, layout: &str) -> bool {
    let mut parsed = Parsed::new();
    if parse(&mut parsed, s, StrftimeItems::new(layout)).is_err() {
        return false;
    }

    match parsed.to_naive_date() {
        Ok(_) => true,
        Err(err) => err.kind() == ParseErrorKind::NotEnough,
    }
}

#[cfg(test)]
mod tests {
    use crate::validator::Validator;

    fn passes(tag: &str, value: &str) -> bool {
        Validator::new().var(&value.to_string(), tag).is_ok()
    }

    #[test]
    fn test_email() {
        assert!(passes("email", "user@example.com"));
        assert!(!passes("email", "user@"));
        assert!(!passes("email", "plainaddress"));
    }

    #[test]
    fn test_urls() {
        assert!(passes("url", "https://example.com/path?q=1"));
        assert!(passes("url", "mailto:someone@example.com"));
        assert!(passes("url", "file:///tmp/report.txt"));
        assert!(!passes("url", "example.com"));
        assert!(passes("http_url", "http://example.com"));
        assert!(!passes("http_url", "ftp://example.com"));
        assert!(passes("uri", "/relative/path"));
        assert!(!passes("uri", "relative"));
    }

    #[test]
    fn test_uuid() {
        assert!(passes("uuid", "a987fbc9-4bed-3078-cf07-9141ba07c9f3"));
        assert!(!passes("uuid", "a987fbc94bed3078cf079141ba07c9f3"));
        assert!(passes("uuid4", "57b73598-8764-4ad0-a76a-679bb6640eb1"));
        assert!(!passes("uuid4", "a987fbc9-4bed-3078-cf07-9141ba07c9f3"));
    }

    #[test]
    fn test_network_addresses() {
        assert!(passes("ip", "10.0.0.1"));
        assert!(passes("ip", "::1"));
        assert!(!passes("ipv4", "::1"));
        assert!(passes("ipv6", "2001:db8::ff00:42:8329"));
        assert!(passes("cidr", "192.168.0.0/16"));
        assert!(!passes("cidr", "192.168.0.0/33"));
        assert!(passes("mac", "01:23:45:67:89:ab"));
        assert!(passes("mac", "0123.4567.89ab"));
        assert!(!passes("mac", "01:23:45-67:89:ab"));
    }

    #[test]
    fn test_colors() {
        assert!(passes("hexcolor", "#fff"));
        assert!(!passes("hexcolor", "#ffff0"));
        assert!(passes("rgb", "rgb(255, 0, 12)"));
        assert!(passes("rgb", "rgb(10%, 50%, 100%)"));
        assert!(!passes("rgb", "rgb(256, 0, 0)"));
        assert!(passes("rgba", "rgba(0, 0, 0, 0.5)"));
        assert!(!passes("rgba", "rgba(0, 0, 0, 2)"));
        assert!(passes("hsl", "hsl(360, 100%, 50%)"));
        assert!(passes("hsla", "hsla(20, 10%, 5%, 1)"));
        assert!(passes("iscolor", "hsl(0, 0%, 0%)"));
        assert!(!passes("iscolor", "blue"));
    }

    #[test]
    fn test_encodings() {
        assert!(passes("e164", "+14155552671"));
        assert!(!passes("e164", "4155552671"));
        assert!(passes("base64", "aGVsbG8="));
        assert!(!passes("base64", "aGVsbG8"));
        assert!(passes("json", r#"{"a": [1, 2]}"#));
        assert!(!passes("json", "{a: 1}"));
        assert!(passes("semver", "1.2.3-beta.1+build.5"));
        assert!(!passes("semver", "01.2.3"));
    }

    #[test]
    fn test_datetime() {
        assert!(passes("datetime=%Y-%m-%d", "2024-02-29"));
        assert!(!passes("datetime=%Y-%m-%d", "2023-02-30"));
        assert!(!passes("datetime=%Y-%m-%d", "29/02/2024"));
        assert!(passes("datetime=%H:%M", "23:59"));
    }
}
