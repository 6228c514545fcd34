// src/domain/address.rs

/// Separator between key parts, e.g. `100|main st|austin|tx|78701`.
pub const KEY_DELIMITER: &str = "|";

/// Address keys longer than this are trusted enough to group listings on.
pub const SUBSTANTIAL_KEY_LEN: usize = 10;

/// USPS-style abbreviations for street suffixes and directionals.
const STREET_ABBREVIATIONS: &[(&str, &str)] = &[
    ("street", "st"),
    ("str", "st"),
    ("avenue", "ave"),
    ("av", "ave"),
    ("road", "rd"),
    ("drive", "dr"),
    ("lane", "ln"),
    ("boulevard", "blvd"),
    ("court", "ct"),
    ("circle", "cir"),
    ("place", "pl"),
    ("parkway", "pkwy"),
    ("highway", "hwy"),
    ("terrace", "ter"),
    ("trail", "trl"),
    ("cove", "cv"),
    ("square", "sq"),
    ("north", "n"),
    ("south", "s"),
    ("east", "e"),
    ("west", "w"),
    ("northeast", "ne"),
    ("northwest", "nw"),
    ("southeast", "se"),
    ("southwest", "sw"),
];

const UNIT_MARKERS: &[&str] = &["unit", "apt", "apartment", "ste", "suite", "#"];

/// Lower-case, punctuation to spaces, collapse whitespace.
fn clean(part: &str) -> String {
    part.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn clean_street_name(name: &str) -> String {
    clean(name)
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(|t| {
            STREET_ABBREVIATIONS
                .iter()
                .find(|(long, _)| *long == t)
                .map(|(_, short)| *short)
                .unwrap_or(t)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn clean_unit(unit: &str) -> String {
    let cleaned = clean(unit);
    let tokens: Vec<&str> = cleaned
        .split(' ')
        .filter(|t| !t.is_empty() && !UNIT_MARKERS.contains(t))
        .collect();
    if tokens.is_empty() {
        String::new()
    } else {
        format!("unit {}", tokens.join(" "))
    }
}

fn clean_postal_code(postal: &str) -> String {
    postal.chars().filter(char::is_ascii_digit).take(5).collect()
}

fn opt(s: Option<&str>) -> &str {
    s.unwrap_or("")
}

fn present(s: Option<&str>) -> Option<&str> {
    s.filter(|v| !v.trim().is_empty())
}

/// Builds the comparable key from discrete address components.
///
/// Empty components are left out rather than replaced with placeholders, so a
/// sparse address yields a short key. Never fails.
pub fn create_address_key(
    street_number: Option<&str>,
    street_name: Option<&str>,
    unit: Option<&str>,
    city: Option<&str>,
    state: Option<&str>,
    postal_code: Option<&str>,
) -> String {
    let parts = [
        clean(opt(street_number)),
        clean_street_name(opt(street_name)),
        clean_unit(opt(unit)),
        clean(opt(city)),
        clean(opt(state)),
        clean_postal_code(opt(postal_code)),
    ];

    parts
        .iter()
        .filter(|p| !p.is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(KEY_DELIMITER)
}

/// Components recovered from a single unparsed address line.
#[derive(Debug, Default, PartialEq)]
struct ParsedStreet {
    number: Option<String>,
    name: Option<String>,
    unit: Option<String>,
}

fn parse_street_line(line: &str) -> ParsedStreet {
    let mut tokens: Vec<&str> = line.split_whitespace().collect();
    let mut parsed = ParsedStreet::default();

    if let Some(first) = tokens.first() {
        if first.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            parsed.number = Some(first.to_string());
            tokens.remove(0);
        }
    }

    let unit_at = tokens.iter().position(|t| {
        let lower = t.to_lowercase();
        lower.starts_with('#') || UNIT_MARKERS.contains(&lower.trim_end_matches('.'))
    });

    if let Some(idx) = unit_at {
        let unit = tokens[idx..].join(" ");
        if !unit.trim().is_empty() {
            parsed.unit = Some(unit);
        }
        tokens.truncate(idx);
    }

    if !tokens.is_empty() {
        parsed.name = Some(tokens.join(" "));
    }
    parsed
}

/// Splits a trailing "TX 78701" segment into state and postal code.
fn parse_state_zip(segment: &str) -> (Option<String>, Option<String>) {
    let mut state = None;
    let mut postal = None;
    for token in segment.split_whitespace() {
        if token.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            postal.get_or_insert_with(|| token.to_string());
        } else if state.is_none() {
            state = Some(token.to_string());
        }
    }
    (state, postal)
}

/// Builds a key from a single unparsed address such as
/// `"100 Main St #4, Austin, TX 78701"`.
///
/// Explicit `city`/`state`/`postal_code` arguments win over what can be read
/// from the string. The result matches [`create_address_key`] for the same
/// address given as components.
pub fn create_address_key_from_string(
    unparsed_address: Option<&str>,
    city: Option<&str>,
    state: Option<&str>,
    postal_code: Option<&str>,
) -> String {
    let raw = opt(unparsed_address);
    let segments: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let street = segments.first().map(|s| parse_street_line(s)).unwrap_or_default();
    let parsed_city = segments.get(1).copied();
    let (parsed_state, parsed_postal) = segments
        .get(2)
        .map(|s| parse_state_zip(s))
        .unwrap_or((None, None));

    create_address_key(
        street.number.as_deref(),
        street.name.as_deref(),
        street.unit.as_deref(),
        present(city).or(parsed_city),
        present(state).or(parsed_state.as_deref()),
        present(postal_code).or(parsed_postal.as_deref()),
    )
}

/// Number of non-empty parts in a key.
pub fn key_part_count(key: &str) -> usize {
    key.split(KEY_DELIMITER).filter(|p| !p.is_empty()).count()
}

/// Whether a key is long enough to group listings on without an MLS number.
pub fn is_substantial_key(key: &str) -> bool {
    key.trim().len() > SUBSTANTIAL_KEY_LEN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_variants_share_a_key() {
        let a = create_address_key(Some("100"), Some("Main St"), None, Some("Austin"), Some("TX"), Some("78701"));
        let b = create_address_key(Some("100"), Some("Main Street"), None, Some("AUSTIN"), Some("tx"), Some("78701-1234"));
        assert_eq!(a, "100|main st|austin|tx|78701");
        assert_eq!(a, b);
    }

    #[test]
    fn empty_components_are_omitted() {
        assert_eq!(create_address_key(None, None, None, Some("Austin"), None, None), "austin");
        assert_eq!(create_address_key(Some(""), Some("  "), Some(""), None, None, None), "");
    }

    #[test]
    fn unit_markers_collapse() {
        let a = create_address_key(Some("5"), Some("Oak Ave"), Some("Apt. 4B"), Some("Reno"), Some("NV"), None);
        let b = create_address_key(Some("5"), Some("Oak Avenue"), Some("#4b"), Some("Reno"), Some("NV"), None);
        assert_eq!(a, "5|oak ave|unit 4b|reno|nv");
        assert_eq!(a, b);
    }

    #[test]
    fn string_form_matches_component_form() {
        let from_parts = create_address_key(Some("100"), Some("Main St"), None, Some("Austin"), Some("TX"), Some("78701"));
        let from_string = create_address_key_from_string(Some("100 Main Street, Austin, TX 78701"), None, None, None);
        assert_eq!(from_parts, from_string);
    }

    #[test]
    fn string_form_reads_unit_and_prefers_explicit_args() {
        let key = create_address_key_from_string(
            Some("12 N Lamar Blvd Unit 310, Wrongtown, ZZ 00000"),
            Some("Austin"),
            Some("TX"),
            Some("78703"),
        );
        assert_eq!(key, "12|n lamar blvd|unit 310|austin|tx|78703");
    }

    #[test]
    fn blank_explicit_args_fall_back_to_the_string() {
        let key = create_address_key_from_string(
            Some("100 Main St, Austin, TX 78701"),
            Some("  "),
            Some(""),
            None,
        );
        assert_eq!(key, "100|main st|austin|tx|78701");
    }

    #[test]
    fn string_form_never_fails_on_garbage() {
        assert_eq!(create_address_key_from_string(None, None, None, None), "");
        assert_eq!(create_address_key_from_string(Some(",,,"), None, None, None), "");
        let key = create_address_key_from_string(Some("#"), Some("Austin"), None, None);
        assert_eq!(key, "austin");
    }

    #[test]
    fn substantial_threshold() {
        assert!(!is_substantial_key("austin|tx"));
        assert!(!is_substantial_key("0123456789"));
        assert!(is_substantial_key("100|main st|austin"));
        assert_eq!(key_part_count("100|main st|austin"), 3);
        assert_eq!(key_part_count(""), 0);
    }
}
