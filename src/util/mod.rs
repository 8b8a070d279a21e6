//! Small shared helpers: humanized units, lenient parsing, and the
//! string-or-array / string-or-number shapes the archive.org APIs produce.

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer};

/// Unit prefix table: `(scale, symbol)`, ordered largest first.
pub type PrefixTable = &'static [(f64, &'static str)];

/// SI prefixes, used for file sizes (`12.3M`, `1.51G`).
pub const SI_PREFIXES: PrefixTable = &[
    (1e12, "T"),
    (1e9, "G"),
    (1e6, "M"),
    (1e3, "k"),
    (1.0, ""),
    (1e-3, "m"),
    (1e-6, "\u{b5}"),
    (1e-9, "n"),
    (1e-12, "p"),
];

/// Decimal prefixes for counts, where 1e9 reads as billions (`2.4B`).
pub const DEC_PREFIXES: PrefixTable = &[
    (1e12, "T"),
    (1e9, "B"),
    (1e6, "M"),
    (1e3, "k"),
    (1.0, ""),
];

/// Formats a value to three significant digits against a prefix table,
/// trimming trailing zeros (`1234567` -> `1.23M`, `1500` -> `1.5k`).
pub fn format_unit(value: f64, prefixes: PrefixTable) -> String {
    if value == 0.0 || !value.is_finite() {
        return "0".to_string();
    }
    let abs = value.abs();
    let (scale, symbol) = prefixes
        .iter()
        .find(|(scale, _)| {
            let scaled = abs / scale;
            (1.0..1e3).contains(&scaled)
        })
        .or_else(|| prefixes.last())
        .copied()
        .unwrap_or((1.0, ""));
    let formatted = trim_zeros(&to_precision_3(value / scale));
    format!("{formatted}{symbol}")
}

/// Humanized item/media count (`DEC_PREFIXES`).
pub fn format_count(count: u64) -> String {
    format_unit(count as f64, DEC_PREFIXES)
}

/// Humanized byte size (`SI_PREFIXES`).
pub fn format_size(bytes: u64) -> String {
    format_unit(bytes as f64, SI_PREFIXES)
}

/// Renders with three significant digits (fixed notation).
fn to_precision_3(value: f64) -> String {
    let int_digits = value.abs().log10().floor() as i32 + 1;
    let decimals = (3 - int_digits).max(0) as usize;
    format!("{value:.decimals$}")
}

fn trim_zeros(formatted: &str) -> &str {
    if !formatted.contains('.') {
        return formatted;
    }
    formatted.trim_end_matches('0').trim_end_matches('.')
}

/// Never-fail page-number parse: leading integer prefix of the input, or 1.
/// `Some("42abc")` parses as 42, like the lenient parsers legacy clients
/// were served by.
pub fn parse_page(raw: Option<&str>) -> i64 {
    let Some(raw) = raw else { return 1 };
    let trimmed = raw.trim();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let prefix: String = digits.chars().take_while(char::is_ascii_digit).collect();
    match prefix.parse::<i64>() {
        Ok(value) => sign * value,
        Err(_) => 1,
    }
}

/// Deserializes archive.org metadata fields that arrive as either a single
/// string or an array of strings. Missing and null both become empty.
pub fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    let parsed = Option::<OneOrMany>::deserialize(deserializer)?;
    Ok(match parsed {
        Some(OneOrMany::One(value)) => vec![value],
        Some(OneOrMany::Many(values)) => values,
        None => Vec::new(),
    })
}

/// Deserializes numeric fields the metadata API serves as strings
/// (`"size": "123456"`) or plain numbers. Unparseable strings become `None`.
pub fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u64),
        Str(String),
    }

    let parsed = Option::<Raw>::deserialize(deserializer)?;
    Ok(match parsed {
        Some(Raw::Num(value)) => Some(value),
        Some(Raw::Str(value)) => value.trim().parse().ok(),
        None => None,
    })
}

/// Parses a 14-digit Wayback CDX timestamp (`YYYYMMDDHHMMSS`).
pub fn parse_wayback_timestamp(timestamp: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(timestamp, "%Y%m%d%H%M%S").ok()
}

/// `YYYY-MM-DD` for a Wayback timestamp, or `None` if it does not parse.
pub fn wayback_date(timestamp: &str) -> Option<String> {
    parse_wayback_timestamp(timestamp).map(|dt| dt.format("%Y-%m-%d").to_string())
}

/// Decodes the HTML entities that show up in item descriptions: the common
/// named set plus numeric (`&#123;` / `&#x1F4A9;`) references. Unknown
/// entities pass through untouched.
pub fn decode_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];
        // Entity names are short; a distant semicolon is not one.
        let decoded = tail
            .find(';')
            .filter(|&end| (1..=10).contains(&end))
            .and_then(|end| decode_entity(&tail[..end]).map(|ch| (ch, end)));
        match decoded {
            Some((ch, end)) => {
                out.push(ch);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    if let Some(code) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
        return u32::from_str_radix(code, 16).ok().and_then(char::from_u32);
    }
    if let Some(code) = name.strip_prefix('#') {
        return code.parse::<u32>().ok().and_then(char::from_u32);
    }
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        "ndash" => Some('\u{2013}'),
        "mdash" => Some('\u{2014}'),
        "copy" => Some('\u{a9}'),
        _ => None,
    }
}
