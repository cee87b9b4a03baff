//! Small text helpers shared by the pages.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Parses the backend's timestamps: RFC 3339, or naive ISO 8601 taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// `dd/mm/yyyy HH:MM`; `-` when absent; the raw text when unparseable.
pub fn format_datetime(raw: Option<&str>) -> String {
    match raw.filter(|r| !r.trim().is_empty()) {
        None => "-".to_string(),
        Some(r) => parse_timestamp(r)
            .map(|dt| dt.format("%d/%m/%Y %H:%M").to_string())
            .unwrap_or_else(|| r.to_string()),
    }
}

/// `HH:MM`, used under each chat bubble.
pub fn format_time(raw: Option<&str>) -> String {
    raw.and_then(parse_timestamp)
        .map(|dt| dt.format("%H:%M").to_string())
        .unwrap_or_default()
}

/// Portuguese relative time: `há 2 dia(s)`, `há 3 hora(s)`, `agora mesmo`.
pub fn relative_time(raw: Option<&str>, now: DateTime<Utc>) -> String {
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        return "-".to_string();
    };
    let Some(then) = parse_timestamp(raw) else {
        return raw.to_string();
    };

    let elapsed = now - then;
    if elapsed.num_days() > 0 {
        format!("há {} dia(s)", elapsed.num_days())
    } else if elapsed.num_hours() > 0 {
        format!("há {} hora(s)", elapsed.num_hours())
    } else if elapsed.num_minutes() > 0 {
        format!("há {} minuto(s)", elapsed.num_minutes())
    } else {
        "agora mesmo".to_string()
    }
}

/// First and last initials, uppercased. `?` for an empty name.
pub fn initials(name: &str) -> String {
    let parts: Vec<&str> = name.split_whitespace().collect();
    let first = |s: &str| s.chars().next().map(|c| c.to_uppercase().collect::<String>());
    match parts.as_slice() {
        [] => "?".to_string(),
        [only] => first(*only).unwrap_or_default(),
        [head, .., tail] => format!(
            "{}{}",
            first(*head).unwrap_or_default(),
            first(*tail).unwrap_or_default()
        ),
    }
}

pub fn first_name(name: &str) -> &str {
    name.split_whitespace().next().unwrap_or("")
}

/// Cuts `text` to `max` characters, marking the cut with `...`.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max).collect();
    cut.push_str("...");
    cut
}

/// Groups thousands with `.`, e.g. `1234567` → `1.234.567`.
pub fn format_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}
