//! Grammar-driven classifiers for user-entered text.
//!
//! Every function here is pure: it reads a string and either accepts it
//! (optionally returning a normalized display form) or rejects it.

use std::fmt;

use crate::pattern;

const INTEGER_FORMAT: &str = r"^-?[0-9]+$";
const POSTAL_CODE_FORMAT: &str = r"^([A-Za-z][0-9][A-Za-z])\s*([0-9][A-Za-z][0-9])$";
const PHONE_FORMAT: &str = r"^[^0-9]*([0-9]{3})[^0-9]*([0-9]{3})[^0-9]*([0-9]{4})[^0-9]*$";
const DOMAIN_NAME_CHARS: &str = r"^[A-Za-z0-9_.\-]+$";
const QUOTED_LOCAL_PART: &str = r#"^"[^\x00-\x1f"\x7f-\xff]*"$"#;
const UNQUOTED_LOCAL_PART: &str = r#"^[^\x00-\x1f "(),:;<>@\[\\\]\x7f-\xff]+$"#;
const BRACKETED_IP_LITERAL: &str =
    r"^\[([0-9]{1,3})\.([0-9]{1,3})\.([0-9]{1,3})\.([0-9]{1,3})\]$";
const BARE_IP_LITERAL: &str = r"^([0-9]{1,3})\.([0-9]{1,3})\.([0-9]{1,3})\.([0-9]{1,3})$";
const PATH_CHARS: &str = r"^[A-Za-z0-9_/]+$";
const EXTENSION_CHARS: &str = r"^[A-Za-z0-9_]*$";
const ANCHOR_CHARS: &str = r"^[^\x00-\x1f #\x7f-\xff]*$";

/// Historical top-level domains accepted as the final label of a domain name.
///
/// `kgkh` is kept as a single entry to match the list the forms were
/// originally deployed with.
pub const DOMAIN_SUFFIXES: &[&str] = &[
    "ac", "ad", "ae", "aero", "af", "ag", "ai", "al", "am", "an", "ao", "aq", "ar", "arpa", "as",
    "at", "au", "aw", "az", "ba", "bb", "bd", "be", "bf", "bg", "bh", "bi", "biz", "bj", "bm",
    "bn", "bo", "br", "bs", "bt", "bv", "bw", "by", "bz", "ca", "cc", "cf", "cg", "ch", "ci",
    "ck", "cl", "cm", "cn", "co", "com", "coop", "cr", "cs", "cu", "cv", "cx", "cy", "cz", "de",
    "dj", "dk", "dm", "do", "dz", "ec", "edu", "ee", "eg", "eh", "er", "es", "et", "fi", "firm",
    "fj", "fk", "fm", "fo", "fr", "fx", "ga", "gb", "gd", "ge", "gf", "gh", "gi", "gl", "gm",
    "gn", "gov", "gp", "gq", "gr", "gs", "gt", "gu", "gw", "gy", "hk", "hm", "hn", "hr", "ht",
    "hu", "id", "ie", "il", "in", "info", "int", "io", "iq", "ir", "is", "it", "jm", "jo", "jp",
    "ke", "kgkh", "ki", "km", "kn", "kp", "kr", "kw", "ky", "kz", "la", "lc", "li", "lk", "lr",
    "ls", "lt", "lu", "lv", "ly", "ma", "mc", "md", "mg", "mh", "mil", "mk", "ml", "mm", "mn",
    "mo", "mp", "mq", "mr", "ms", "mt", "mu", "museum", "mv", "mw", "mx", "my", "mz", "na",
    "nato", "name", "nc", "ne", "net", "nf", "ng", "ni", "nl", "no", "nom", "np", "nr", "nt",
    "nu", "nz", "om", "org", "pa", "pe", "pf", "pg", "ph", "pk", "pl", "pm", "pn", "pr", "pro",
    "pt", "pw", "py", "qa", "re", "ro", "ru", "rw", "sa", "sb", "sc", "sd", "se", "sg", "sh",
    "si", "sj", "sk", "sl", "sm", "sn", "so", "sr", "st", "store", "su", "sv", "sy", "sz", "tc",
    "td", "tf", "tg", "th", "tj", "tk", "tm", "tn", "to", "tp", "tr", "tt", "tv", "tw", "tz",
    "ua", "ug", "uk", "um", "us", "uy", "uz", "va", "vc", "ve", "vg", "vi", "vn", "vu", "web",
    "wf", "ws", "ye", "yt", "yu", "za", "zm", "zr", "zw",
];

/// Inclusive bounds for [`parse_bounded_integer`]; either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntegerBounds {
    pub lower: Option<i64>,
    pub upper: Option<i64>,
}

impl IntegerBounds {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn between(lower: i64, upper: i64) -> Self {
        Self {
            lower: Some(lower),
            upper: Some(upper),
        }
    }

    pub fn at_least(lower: i64) -> Self {
        Self {
            lower: Some(lower),
            upper: None,
        }
    }

    pub fn at_most(upper: i64) -> Self {
        Self {
            lower: None,
            upper: Some(upper),
        }
    }

    fn contains(&self, number: i64) -> bool {
        self.lower.is_none_or(|lower| number >= lower)
            && self.upper.is_none_or(|upper| number <= upper)
    }
}

/// Why a classifier refused its input. `Display` is the message shown to
/// the person filling in the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    NotAnInteger,
    IntegerOutOfRange {
        lower: Option<i64>,
        upper: Option<i64>,
    },
    NotAPostalCode,
    NotAPhoneNumber,
    NotAnEmailAddress,
    NotAWebsiteAddress,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnInteger => write!(f, "That's not an integer!"),
            Self::IntegerOutOfRange {
                lower: Some(lower),
                upper: Some(upper),
            } => write!(f, "Please enter an integer from {lower} to {upper}."),
            Self::IntegerOutOfRange {
                lower: Some(lower),
                upper: None,
            } => write!(f, "Please enter an integer no less than {lower}."),
            Self::IntegerOutOfRange {
                lower: None,
                upper: Some(upper),
            } => write!(f, "Please enter an integer no greater than {upper}."),
            Self::IntegerOutOfRange {
                lower: None,
                upper: None,
            } => write!(f, "Please enter an integer."),
            Self::NotAPostalCode => write!(f, "That's not a postal code!"),
            Self::NotAPhoneNumber => write!(
                f,
                "That's not a phone number!\n\nDid you forget to include the area code?"
            ),
            Self::NotAnEmailAddress => write!(f, "That's not an e-mail address!"),
            Self::NotAWebsiteAddress => write!(f, "That's not a website address!"),
        }
    }
}

impl std::error::Error for Rejection {}

/// Parses an optionally negative run of ASCII digits and checks it against
/// `bounds`. An empty string counts as zero.
///
/// Magnitudes beyond `i64` saturate before the bound check, so an enormous
/// value is still reported as out of range rather than as malformed.
pub fn parse_bounded_integer(text: &str, bounds: IntegerBounds) -> Result<i64, Rejection> {
    if text.is_empty() {
        return Ok(0);
    }
    if !pattern::matches(INTEGER_FORMAT, text) {
        return Err(Rejection::NotAnInteger);
    }

    let number = text.parse::<i64>().unwrap_or(if text.starts_with('-') {
        i64::MIN
    } else {
        i64::MAX
    });

    if bounds.contains(number) {
        Ok(number)
    } else {
        Err(Rejection::IntegerOutOfRange {
            lower: bounds.lower,
            upper: bounds.upper,
        })
    }
}

/// Canadian postal code, normalized to `A1A 1A1`. Empty input is returned
/// unchanged.
pub fn parse_postal_code(text: &str) -> Result<String, Rejection> {
    if text.is_empty() {
        return Ok(String::new());
    }
    let captures = pattern::captures(POSTAL_CODE_FORMAT, text).ok_or(Rejection::NotAPostalCode)?;
    match (captures.get(1), captures.get(2)) {
        (Some(forward), Some(local)) => Ok(format!(
            "{} {}",
            forward.to_ascii_uppercase(),
            local.to_ascii_uppercase()
        )),
        _ => Err(Rejection::NotAPostalCode),
    }
}

/// Ten-digit phone number with any non-digit separators, normalized to
/// `(###) ###-####`. Empty input is returned unchanged.
pub fn parse_phone_number(text: &str) -> Result<String, Rejection> {
    if text.is_empty() {
        return Ok(String::new());
    }
    let captures = pattern::captures(PHONE_FORMAT, text).ok_or(Rejection::NotAPhoneNumber)?;
    match (captures.get(1), captures.get(2), captures.get(3)) {
        (Some(area), Some(exchange), Some(line)) => Ok(format!("({area}) {exchange}-{line}")),
        _ => Err(Rejection::NotAPhoneNumber),
    }
}

/// Checks dotted IP components against `0..=255`.
///
/// The scan starts at index 1: slot 0 is reserved for the whole literal when
/// the list comes straight from a pattern match, and is never inspected.
pub fn is_ip_component_list_valid<S: AsRef<str>>(components: &[S]) -> bool {
    components.iter().skip(1).all(|component| {
        let component = component.as_ref();
        !component.is_empty()
            && component.bytes().all(|b| b.is_ascii_digit())
            && component.parse::<u32>().is_ok_and(|value| value <= 255)
    })
}

pub fn is_domain_name_valid(text: &str) -> bool {
    if !pattern::matches(DOMAIN_NAME_CHARS, text) {
        return false;
    }
    if text.starts_with('.') || text.ends_with('.') || text.contains("..") {
        return false;
    }

    let Some((_, suffix)) = text.rsplit_once('.') else {
        return false;
    };
    DOMAIN_SUFFIXES
        .iter()
        .any(|known| known.eq_ignore_ascii_case(suffix))
}

/// `local@domain`, where the domain is either a bracketed dotted IP literal
/// or a domain name with a known suffix.
pub fn is_email_address_valid(text: &str) -> bool {
    let Some((local, domain)) = text.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() {
        return false;
    }

    if !pattern::matches(QUOTED_LOCAL_PART, local) && !pattern::matches(UNQUOTED_LOCAL_PART, local)
    {
        return false;
    }

    match pattern::captures(BRACKETED_IP_LITERAL, domain) {
        Some(octets) => is_ip_component_list_valid(&octets.to_vec()),
        None => is_domain_name_valid(domain),
    }
}

/// `domain[/path[.extension][#anchor]]` without a scheme.
pub fn is_website_address_valid(text: &str) -> bool {
    let (domain, page) = text.split_once('/').unwrap_or((text, ""));
    if domain.is_empty() {
        return false;
    }

    let domain_ok = match pattern::captures(BARE_IP_LITERAL, domain) {
        Some(octets) => is_ip_component_list_valid(&octets.to_vec()),
        None => is_domain_name_valid(domain),
    };
    if !domain_ok {
        return false;
    }
    if page.is_empty() {
        return true;
    }

    let (location, anchor) = page.split_once('#').unwrap_or((page, ""));
    let (path, extension) = location.rsplit_once('.').unwrap_or((location, ""));

    pattern::matches(PATH_CHARS, path)
        && !path.contains("//")
        && pattern::matches(EXTENSION_CHARS, extension)
        && pattern::matches(ANCHOR_CHARS, anchor)
}
