//! Pattern-based extraction of claim fields from a free-text description.
//!
//! Every field is looked up independently and a miss simply leaves the field
//! empty, so [`extract_query_details`] has no failure mode.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::models::{Gender, QueryDetails};

const MAX_AGE: u32 = 120;

static AGE_YEARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,3})\s*-?\s*(?:years?|yrs?|y/?o|y)\b").expect("Invalid age regex")
});

static AGE_GENDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,3})\s*-?\s*(?:female|male|woman|man|f|m)\b")
        .expect("Invalid age regex")
});

static AGE_AGED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\baged?\s+(\d{1,3})\b").expect("Invalid age regex"));

static GENDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[^a-zA-Z'’])(female|male|woman|man|f|m)\b")
        .expect("Invalid gender regex")
});

static POLICY_MONTHS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,3})\s*-?\s*months?\b").expect("Invalid policy duration regex")
});

static NAMED_PLACE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:[A-Z][a-zA-Z]+\s+)+(?i:city|hospital)\b").expect("Invalid location regex")
});

const CITIES: &[&str] = &[
    "New Delhi",
    "Navi Mumbai",
    "Mumbai",
    "Delhi",
    "Pune",
    "Bangalore",
    "Bengaluru",
    "Chennai",
    "Kolkata",
    "Hyderabad",
    "Ahmedabad",
    "Jaipur",
    "Lucknow",
    "Surat",
    "Kanpur",
    "Nagpur",
    "Indore",
    "Thane",
    "Bhopal",
    "Visakhapatnam",
    "Patna",
    "Vadodara",
    "Ghaziabad",
    "Ludhiana",
    "Agra",
    "Nashik",
    "Noida",
    "Gurgaon",
    "Gurugram",
    "Chandigarh",
    "Kochi",
    "Coimbatore",
    "Mysore",
    "Goa",
];

static CITY: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives = CITIES
        .iter()
        .map(|city| regex::escape(city))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b({})\b", alternatives)).expect("Invalid city regex")
});

const PROCEDURE_KEYWORDS: &[&str] = &[
    "surgery",
    "surgeries",
    "operation",
    "procedure",
    "treatment",
    "therapy",
    "care",
    "maternity",
    "pregnancy",
    "childbirth",
    "delivery",
    "cardiac",
    "dental",
    "fracture",
    "transplant",
    "dialysis",
    "chemotherapy",
    "angioplasty",
    "bypass",
    "cataract",
    "hospitalization",
    "hospitalisation",
    "accident",
];

/// Words that may follow a keyword and still belong to the procedure name.
const PROCEDURE_TRAILERS: &[&str] = &[
    "care",
    "surgery",
    "operation",
    "procedure",
    "treatment",
    "therapy",
    "checkup",
    "replacement",
    "repair",
    "delivery",
];

/// Words that end the descriptive prefix of a procedure.
const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "in", "at", "on", "for", "of", "with", "and", "or", "to", "from", "by",
    "my", "his", "her", "their", "our", "under", "after", "during", "before", "old", "year",
    "years", "month", "months", "policy", "insurance", "male", "female", "man", "woman", "m",
    "f", "is", "was", "had", "has", "have", "need", "needs", "require", "requires", "required",
    "undergoing", "underwent", "undergo", "claim", "claims", "patient", "got", "get", "needed",
];

/// Qualifiers kept in front of a procedure even past the prefix limit, since
/// the waiting-period rules read them from the procedure.
const CONDITION_MARKERS: &[&str] = &["pre-existing", "preexisting", "chronic"];

/// A number followed by one of these describes the policy, not the claimant.
const POLICY_WORDS: &[&str] = &["policy", "plan", "insurance", "cover", "coverage"];

const MAX_PREFIX_WORDS: usize = 2;
const MAX_TRAILER_WORDS: usize = 2;

/// Pulls age, gender, procedure, location and policy duration out of `text`.
pub fn extract_query_details(text: &str) -> QueryDetails {
    let details = QueryDetails {
        age: extract_age(text),
        gender: extract_gender(text),
        procedure: extract_procedure(text),
        location: extract_location(text),
        policy_duration_months: extract_policy_duration(text),
    };

    debug!(?details, "Extracted query details");
    details
}

pub fn extract_age(text: &str) -> Option<u32> {
    [&*AGE_YEARS, &*AGE_GENDER, &*AGE_AGED]
        .into_iter()
        .filter_map(|re| {
            re.captures_iter(text).find_map(|caps| {
                let group = caps.get(1)?;
                if describes_policy(&text[caps.get(0)?.end()..]) {
                    return None;
                }
                let age = group.as_str().parse::<u32>().ok()?;
                (age <= MAX_AGE).then_some((group.start(), age))
            })
        })
        .min_by_key(|(start, _)| *start)
        .map(|(_, age)| age)
}

fn describes_policy(rest: &str) -> bool {
    let (word, rest) = next_word(rest);
    let word = if word.eq_ignore_ascii_case("old") {
        next_word(rest).0
    } else {
        word
    };
    contains_ignore_case(POLICY_WORDS, word)
}

/// Splits off the alphabetic word that starts `text`, skipping spaces and hyphens.
fn next_word(text: &str) -> (&str, &str) {
    let text = text.trim_start_matches(|c: char| c == '-' || c.is_whitespace());
    let end = text.find(|c: char| !c.is_alphabetic()).unwrap_or(text.len());
    text.split_at(end)
}

pub fn extract_gender(text: &str) -> Option<Gender> {
    let token = GENDER.captures(text)?.get(1)?.as_str().to_ascii_lowercase();
    match token.as_str() {
        "m" | "male" | "man" => Some(Gender::Male),
        _ => Some(Gender::Female),
    }
}

pub fn extract_policy_duration(text: &str) -> Option<u32> {
    POLICY_MONTHS
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

pub fn extract_location(text: &str) -> Option<String> {
    if let Some(found) = CITY.find(text) {
        let canonical = CITIES
            .iter()
            .find(|city| city.eq_ignore_ascii_case(found.as_str()))
            .map(|city| city.to_string())
            .unwrap_or_else(|| found.as_str().to_string());
        return Some(canonical);
    }

    NAMED_PLACE
        .find(text)
        .map(|m| m.as_str().split_whitespace().collect::<Vec<_>>().join(" "))
}

pub fn extract_procedure(text: &str) -> Option<String> {
    for clause in text.split([',', ';', '.', '\n', '(', ')']) {
        let words: Vec<&str> = clause
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '-'))
            .filter(|w| !w.is_empty())
            .collect();

        let Some(index) = words.iter().position(|w| is_keyword(w)) else {
            continue;
        };

        let mut start = index;
        while start > 0 && index - start < MAX_PREFIX_WORDS && is_descriptor(words[start - 1]) {
            start -= 1;
        }
        start -= condition_marker_len(&words[..start]);

        let mut end = index + 1;
        while end < words.len()
            && end - index <= MAX_TRAILER_WORDS
            && contains_ignore_case(PROCEDURE_TRAILERS, words[end])
        {
            end += 1;
        }

        return Some(words[start..end].join(" "));
    }
    None
}

/// How many words at the end of `words` form a pre-existing or chronic marker.
fn condition_marker_len(words: &[&str]) -> usize {
    match words {
        [.., pre, existing]
            if pre.eq_ignore_ascii_case("pre") && existing.eq_ignore_ascii_case("existing") =>
        {
            2
        }
        [.., last] if contains_ignore_case(CONDITION_MARKERS, last) => 1,
        _ => 0,
    }
}

fn is_keyword(word: &str) -> bool {
    contains_ignore_case(PROCEDURE_KEYWORDS, word)
}

fn is_descriptor(word: &str) -> bool {
    word.chars().all(|c| c.is_alphabetic() || c == '-')
        && !word.starts_with('-')
        && !contains_ignore_case(STOP_WORDS, word)
}

fn contains_ignore_case(list: &[&str], word: &str) -> bool {
    list.iter().any(|entry| entry.eq_ignore_ascii_case(word))
}
