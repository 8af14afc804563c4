//! Pure helpers turning free-text labels and timestamps into safe names.

use chrono::{DateTime, Datelike, TimeZone};
use std::fmt::Display;
use std::time::Duration;

/// Characters that are illegal in file names or path segments on common platforms.
const ILLEGAL: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Replacement used when a label sanitizes to nothing.
pub const UNTITLED: &str = "Untitled";

/// Strip illegal characters, collapse whitespace runs to one space and trim.
///
/// Returns [`UNTITLED`] when nothing is left.
///
/// - `"A/B:C"` → `"ABC"`
/// - `"  Math \t 101 "` → `"Math 101"`
/// - `""` → `"Untitled"`
pub fn sanitize(label: &str) -> String {
    let stripped: String = label.chars().filter(|c| !ILLEGAL.contains(c)).collect();
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.is_empty() {
        UNTITLED.to_string()
    } else {
        collapsed
    }
}

/// Zero-padded `YYYY-MM-DD_HH-MM` in the time zone of `instant`.
pub fn format_timestamp<Tz>(instant: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    instant.format("%Y-%m-%d_%H-%M").to_string()
}

/// `"{class} - {topic} - {stamp}.{ext}"` with both labels sanitized.
pub fn build_filename(class_name: &str, topic: &str, stamp: &str, ext: &str) -> String {
    format!(
        "{} - {} - {}.{}",
        sanitize(class_name),
        sanitize(topic),
        stamp,
        ext.trim_start_matches('.')
    )
}

/// Academic semester folder name, e.g. `2024_Spring`.
pub fn semester_label<Tz: TimeZone>(date: &DateTime<Tz>, term: &str) -> String {
    format!("{}_{}", date.year(), term)
}

/// Human title for an index record, e.g. `Lecture 1/3/2024`.
pub fn lecture_title<Tz: TimeZone>(date: &DateTime<Tz>) -> String {
    format!("Lecture {}/{}/{}", date.day(), date.month(), date.year())
}

/// `MM:SS` display string; minutes keep counting past 59.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
