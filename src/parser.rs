use log::{debug, warn};
use regex::Captures;

use crate::{
    metadata::{FrameCollection, MetadataField},
    pattern::{CompiledPattern, DurationFormat, Placeholder},
};

/// A match that was dropped because a numeric capture could not be converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub index: usize,
    pub field: MetadataField,
    pub text: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MatchOptions {
    /// Number records 1, 2, 3... when the pattern has no track placeholder.
    pub auto_track_numbers: bool,
}

pub fn match_header(pattern: &CompiledPattern, text: &str) -> Option<FrameCollection> {
    match_header_with(pattern, text, |_| {})
}

pub fn match_header_with<F>(
    pattern: &CompiledPattern,
    text: &str,
    mut on_skip: F,
) -> Option<FrameCollection>
where
    F: FnMut(&SkippedRecord),
{
    let caps = pattern.regex()?.captures(text)?;
    match to_frames(pattern, &caps, 0) {
        Ok(frames) => Some(frames),
        Err(skipped) => {
            warn!("Header skipped: {} '{}' is not a number", skipped.field, skipped.text);
            on_skip(&skipped);
            None
        }
    }
}

pub fn match_tracks(pattern: &CompiledPattern, text: &str) -> Vec<FrameCollection> {
    match_tracks_with(pattern, text, MatchOptions::default(), |_| {})
}

/// Collects one record per non-overlapping match, in document order.
/// Records with an unconvertible numeric capture are reported to `on_skip`
/// and left out.
pub fn match_tracks_with<F>(
    pattern: &CompiledPattern,
    text: &str,
    options: MatchOptions,
    mut on_skip: F,
) -> Vec<FrameCollection>
where
    F: FnMut(&SkippedRecord),
{
    let Some(regex) = pattern.regex() else {
        return vec![];
    };
    let numbering = options.auto_track_numbers && !pattern.has_field(&MetadataField::Track);
    let mut records = vec![];
    for (index, caps) in regex.captures_iter(text).enumerate() {
        match to_frames(pattern, &caps, index) {
            Ok(mut frames) => {
                if numbering {
                    frames.set_number(MetadataField::Track, records.len() as u32 + 1);
                }
                records.push(frames);
            }
            Err(skipped) => {
                warn!(
                    "Record {} skipped: {} '{}' is not a number",
                    index, skipped.field, skipped.text
                );
                on_skip(&skipped);
            }
        }
    }
    debug!(
        "Pattern '{}' matched {} records",
        pattern.source(),
        records.len()
    );
    records
}

/// Durations of the records in order, 0 where a record has none.
pub fn track_durations(records: &[FrameCollection]) -> Vec<u32> {
    records.iter().map(|x| x.duration().unwrap_or(0)).collect()
}

/// Converts `M+:SS` to seconds.
pub fn parse_minutes_seconds(text: &str) -> Option<u32> {
    let (minutes, seconds) = text.trim().split_once(':')?;
    let minutes: u32 = minutes.trim().parse().ok()?;
    let seconds: u32 = seconds.trim().parse().ok()?;
    minutes.checked_mul(60)?.checked_add(seconds)
}

fn parse_duration(text: &str, format: DurationFormat) -> Option<u32> {
    match format {
        DurationFormat::MinutesSeconds => parse_minutes_seconds(text),
        DurationFormat::Seconds => text.trim().parse().ok(),
        DurationFormat::Auto => {
            if text.contains(':') {
                parse_minutes_seconds(text)
            } else {
                text.trim().parse().ok()
            }
        }
    }
}

fn to_frames(
    pattern: &CompiledPattern,
    caps: &Captures,
    index: usize,
) -> Result<FrameCollection, SkippedRecord> {
    let mut frames = FrameCollection::new();
    for capture in pattern.captures() {
        let Some(text) = caps.get(capture.group).map(|x| x.as_str()) else {
            continue;
        };
        if text.is_empty() {
            continue;
        }
        let skipped = |field: MetadataField| SkippedRecord {
            index,
            field,
            text: text.to_owned(),
        };
        match &capture.placeholder {
            Placeholder::Duration(format) => {
                let seconds = parse_duration(text, *format)
                    .ok_or_else(|| skipped(MetadataField::Duration))?;
                frames.set_number(MetadataField::Duration, seconds);
            }
            Placeholder::Field(field) if field.is_numeric() => {
                let number: u32 = text
                    .trim()
                    .parse()
                    .map_err(|_| skipped(field.clone()))?;
                frames.set_number(field.clone(), number);
            }
            Placeholder::Field(field) => {
                frames.add(field.clone(), text);
            }
        }
    }
    Ok(frames)
}
