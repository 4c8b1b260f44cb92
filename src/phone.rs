// 📱 Phone numbers - local mobile validation and international normalization

use std::fmt;

/// Calling code prepended to every outbound number
pub const COUNTRY_CODE: &str = "91";

/// Digits in a local mobile number
pub const LOCAL_DIGITS: usize = 10;

/// Leading digits of valid local mobile numbers
pub const MOBILE_PREFIXES: [char; 4] = ['6', '7', '8', '9'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MobileRejection {
    NonDigit,
    WrongLength(usize),
    BadPrefix(char),
}

impl fmt::Display for MobileRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MobileRejection::NonDigit => write!(f, "only digits are allowed"),
            MobileRejection::WrongLength(n) => {
                write!(f, "expected {} digits, got {}", LOCAL_DIGITS, n)
            }
            MobileRejection::BadPrefix(c) => {
                write!(f, "mobile numbers cannot start with {}", c)
            }
        }
    }
}

/// True when `s` is exactly ten ASCII digits
pub fn is_local_number(s: &str) -> bool {
    s.len() == LOCAL_DIGITS && s.bytes().all(|b| b.is_ascii_digit())
}

/// Validate a mobile number typed into the inline editor.
///
/// Returns the trimmed value. Empty is accepted and means "clear the number".
pub fn validate_mobile(input: &str) -> Result<String, MobileRejection> {
    let value = input.trim();
    if value.is_empty() {
        return Ok(String::new());
    }

    if !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(MobileRejection::NonDigit);
    }

    if value.len() != LOCAL_DIGITS {
        return Err(MobileRejection::WrongLength(value.len()));
    }

    // Safe: length checked above
    let first = value.chars().next().unwrap_or('0');
    if !MOBILE_PREFIXES.contains(&first) {
        return Err(MobileRejection::BadPrefix(first));
    }

    Ok(value.to_string())
}

/// Normalize any stored number into `<country code><10 digits>`.
///
/// Non-digits are stripped. A 12-digit value that already carries the
/// country code loses it and gets it back exactly once.
pub fn to_international(raw: &str) -> Result<String, MobileRejection> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    let local = if digits.len() == LOCAL_DIGITS + COUNTRY_CODE.len()
        && digits.starts_with(COUNTRY_CODE)
    {
        &digits[COUNTRY_CODE.len()..]
    } else {
        digits.as_str()
    };

    if local.len() != LOCAL_DIGITS {
        return Err(MobileRejection::WrongLength(local.len()));
    }

    Ok(format!("{}{}", COUNTRY_CODE, local))
}
