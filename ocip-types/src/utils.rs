//! Name and value utilities shared by the codec, the registry, and callers.

use nom::{
    bytes::complete::tag,
    character::complete::{alpha1, digit1},
    combinator::{all_consuming, map, map_res, opt},
    sequence::{preceded, tuple},
    IResult,
};
use rand::{seq::SliceRandom, Rng};
use thiserror::Error;

/// Convert a wire-form name to snake_case.
///
/// Underscores are inserted at lower→upper and acronym→word boundaries
/// (`XMLParser` becomes `xml_parser`), whitespace runs collapse to a single
/// underscore, and the result is lowercased. Other separators (`line/port`)
/// pass through untouched.
pub fn to_snake(name: &str) -> String {
    let chars: Vec<char> = name.trim().chars().collect();
    let mut out = String::with_capacity(chars.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_whitespace() {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            continue;
        }

        if c.is_ascii_uppercase() && !out.is_empty() && !out.ends_with('_') {
            let prev = chars[i - 1];
            let acronym_end = prev.is_ascii_uppercase()
                && chars.get(i + 1).is_some_and(|next| next.is_ascii_lowercase());
            if prev.is_ascii_lowercase() || prev.is_ascii_digit() || acronym_end {
                out.push('_');
            }
        }

        out.push(c.to_ascii_lowercase());
    }

    out
}

/// Convert a snake_case name to camelCase: tokenize on `_`, keep the first
/// token, capitalize the rest.
pub fn to_camel(name: &str) -> String {
    let mut parts = name.split('_');
    let mut out = String::with_capacity(name.len());

    if let Some(first) = parts.next() {
        out.push_str(first);
    }
    for part in parts {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(&chars.as_str().to_lowercase());
        }
    }

    out
}

/// A command name decomposed into its version components.
///
/// `UserGetRequest23V2` parses as base `UserGetRequest`, major `23`,
/// service pack `0`, version `2`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ParsedVersion<'a> {
    pub base: &'a str,
    pub major: u32,
    pub service_pack: u32,
    pub version: u32,
}

impl ParsedVersion<'_> {
    /// Ordering key: `(major, service_pack, version)`, compared
    /// lexicographically.
    pub fn key(&self) -> (u32, u32, u32) {
        (self.major, self.service_pack, self.version)
    }
}

#[derive(Clone, Debug, Eq, Error, Hash, PartialEq)]
#[error("`{0}` is not a versioned command name")]
pub struct InvalidVersion(pub String);

fn number(input: &str) -> IResult<&str, u32> {
    map_res(digit1, str::parse)(input)
}

fn version_name(input: &str) -> IResult<&str, ParsedVersion<'_>> {
    map(
        tuple((
            alpha1,
            opt(number),
            opt(preceded(tag("sp"), number)),
            opt(preceded(tag("V"), number)),
        )),
        |(base, major, service_pack, version)| ParsedVersion {
            base,
            major: major.unwrap_or(0),
            service_pack: service_pack.unwrap_or(0),
            version: version.unwrap_or(0),
        },
    )(input)
}

/// Parse a command name of the form `base [major] [sp<patch>] [V<version>]`.
pub fn parse_version(name: &str) -> Result<ParsedVersion<'_>, InvalidVersion> {
    all_consuming(version_name)(name)
        .map(|(_, parsed)| parsed)
        .map_err(|_| InvalidVersion(name.to_owned()))
}

/// Among `names` whose base matches, return the one with the highest
/// `(major, service_pack, version)` key.
pub fn highest_version<'a, I>(base: &str, names: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    names
        .into_iter()
        .filter_map(|name| {
            let parsed = parse_version(name).ok()?;
            (parsed.base == base).then_some((parsed.key(), name))
        })
        .max_by_key(|(key, _)| *key)
        .map(|(_, name)| name)
}

/// Strip outer quotes and surrounding whitespace from a phone number.
pub fn normalise_phone_number(phone: &str) -> String {
    let trimmed = phone.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| {
            trimmed
                .strip_prefix('\'')
                .and_then(|s| s.strip_suffix('\''))
        })
        .unwrap_or(trimmed);

    unquoted.trim().to_owned()
}

fn split_trailing_digits(s: &str) -> Option<(&str, u64)> {
    let start = s
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)?;
    let (prefix, digits) = s.split_at(start);
    Some((prefix, digits.parse().ok()?))
}

/// Expand a range string like `+1-4072383011 - +1-4072383013` into the
/// individual numbers it covers. Inputs that do not look like a range come
/// back as a single-element list.
pub fn expand_phone_range(range: &str) -> Vec<String> {
    let Some((start, end)) = range.split_once(" - ") else {
        return vec![range.to_owned()];
    };
    if end.contains(" - ") {
        return vec![range.to_owned()];
    }

    let Some((prefix, first)) = split_trailing_digits(start.trim()) else {
        return vec![range.to_owned()];
    };
    let Some((_, last)) = split_trailing_digits(end.trim()) else {
        return vec![range.to_owned()];
    };

    (first..=last).map(|n| format!("{prefix}{n}")).collect()
}

#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
#[error("password length must be at least 8, got {0}")]
pub struct PasswordLength(pub usize);

const LOWER: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const UPPER: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";
const SYMBOLS: &[u8] = b"!@#$%&*-_=+";

fn pick(rng: &mut impl Rng, set: &[u8]) -> u8 {
    set[rng.gen_range(0..set.len())]
}

/// Generate a random password meeting the BroadWorks policy: at least eight
/// characters with one of each of lowercase, uppercase, digit, and symbol.
pub fn generate_secure(length: usize) -> Result<String, PasswordLength> {
    if length < 8 {
        return Err(PasswordLength(length));
    }

    let mut rng = rand::thread_rng();
    let misc: Vec<u8> = [LOWER, UPPER, SYMBOLS].concat();

    let mut password = vec![
        pick(&mut rng, LOWER),
        pick(&mut rng, UPPER),
        pick(&mut rng, DIGITS),
        pick(&mut rng, SYMBOLS),
    ];
    password.extend((0..length - 4).map(|_| pick(&mut rng, &misc)));
    password.shuffle(&mut rng);

    Ok(password.into_iter().map(char::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_snake() {
        let tests = [
            ("CamelCase", "camel_case"),
            ("XMLParser", "xml_parser"),
            ("Some Name Here", "some_name_here"),
            ("deviceName", "device_name"),
            ("endpointType", "endpoint_type"),
            ("line/port", "line/port"),
            ("UserGetRequest23V2", "user_get_request23_v2"),
            ("  padded  ", "padded"),
            ("", ""),
        ];

        for (test, expected) in tests {
            let got = to_snake(test);
            assert_eq!(expected, got);
        }
    }

    #[test]
    fn test_to_camel() {
        let tests = [
            ("service_pack_name", "servicePackName"),
            ("user_id", "userId"),
            ("device_name", "deviceName"),
            ("line/port", "line/port"),
            ("single", "single"),
            ("", ""),
        ];

        for (test, expected) in tests {
            let got = to_camel(test);
            assert_eq!(expected, got);
        }
    }

    #[test]
    fn test_parse_version() {
        let tests = [
            (
                "UserGetRequest23V2",
                Ok(ParsedVersion {
                    base: "UserGetRequest",
                    major: 23,
                    service_pack: 0,
                    version: 2,
                }),
            ),
            (
                "LoginRequest14sp4",
                Ok(ParsedVersion {
                    base: "LoginRequest",
                    major: 14,
                    service_pack: 4,
                    version: 0,
                }),
            ),
            (
                "AuthenticationRequest",
                Ok(ParsedVersion {
                    base: "AuthenticationRequest",
                    major: 0,
                    service_pack: 0,
                    version: 0,
                }),
            ),
            (
                "LoginRequest22V5",
                Ok(ParsedVersion {
                    base: "LoginRequest",
                    major: 22,
                    service_pack: 0,
                    version: 5,
                }),
            ),
            ("", Err(InvalidVersion(String::new()))),
            ("123", Err(InvalidVersion("123".into()))),
            (
                "UserGet-Request",
                Err(InvalidVersion("UserGet-Request".into())),
            ),
            (
                "UserGetRequest23V2x",
                Err(InvalidVersion("UserGetRequest23V2x".into())),
            ),
        ];

        for (test, expected) in tests {
            let got = parse_version(test);
            assert_eq!(expected, got);
        }
    }

    #[test]
    fn test_highest_version() {
        let names = [
            "UserGetRequest22",
            "UserGetRequest23",
            "UserGetRequest23V2",
            "UserModifyRequest22",
        ];

        assert_eq!(
            Some("UserGetRequest23V2"),
            highest_version("UserGetRequest", names)
        );
        assert_eq!(
            Some("UserModifyRequest22"),
            highest_version("UserModifyRequest", names)
        );
        assert_eq!(None, highest_version("GroupGetRequest", names));
    }

    #[test]
    fn test_service_pack_orders_below_version() {
        let names = ["LoginRequest14sp4", "LoginRequest22V5", "LoginRequest22"];
        assert_eq!(Some("LoginRequest22V5"), highest_version("LoginRequest", names));
    }

    #[test]
    fn test_normalise_phone_number() {
        let tests = [
            ("\"+1-4072383011\"", "+1-4072383011"),
            ("  '+1-4072383011'  ", "+1-4072383011"),
            ("+1-4072383011", "+1-4072383011"),
            ("", ""),
            ("  ", ""),
        ];

        for (test, expected) in tests {
            let got = normalise_phone_number(test);
            assert_eq!(expected, got);
        }
    }

    #[test]
    fn test_expand_phone_range() {
        let got = expand_phone_range("+1-4072383011 - +1-4072383013");
        assert_eq!(
            vec!["+1-4072383011", "+1-4072383012", "+1-4072383013"],
            got
        );

        assert_eq!(vec!["+1-4072383011"], expand_phone_range("+1-4072383011"));
        assert_eq!(vec!["a - b"], expand_phone_range("a - b"));
    }

    #[test]
    fn test_generate_secure() {
        assert_eq!(Err(PasswordLength(4)), generate_secure(4));

        let password = generate_secure(16).unwrap();
        assert_eq!(16, password.len());
        assert!(password.chars().any(|c| c.is_ascii_lowercase()));
        assert!(password.chars().any(|c| c.is_ascii_uppercase()));
        assert!(password.chars().any(|c| c.is_ascii_digit()));
        assert!(password.chars().any(|c| SYMBOLS.contains(&(c as u8))));
    }
}
