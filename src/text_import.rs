use log::debug;

use crate::{
    config::ImportFormat,
    extract::Extraction,
    metadata::{FrameCollection, MetadataField},
    parser::{self, MatchOptions, SkippedRecord},
    pattern::{CompiledPattern, PatternError, Placeholder},
    reconcile::{self, ReconcileOptions, ReconcileReport},
    track_data::TrackDataVector,
};

/// Imports track lists from text with a header and a track pattern.
#[derive(Debug, Clone)]
pub struct TextImporter {
    header: CompiledPattern,
    track: CompiledPattern,
}
impl TextImporter {
    pub fn new(header: &str, track: &str) -> Result<Self, PatternError> {
        Ok(Self {
            header: CompiledPattern::compile(header)?,
            track: CompiledPattern::compile(track)?,
        })
    }
    pub fn from_format(format: &ImportFormat) -> Result<Self, PatternError> {
        Self::new(&format.header, &format.track)
    }
    pub fn header(&self) -> &CompiledPattern {
        &self.header
    }
    pub fn track(&self) -> &CompiledPattern {
        &self.track
    }

    /// Album fields from the first header match and one record per track match.
    /// Records get track numbers 1, 2, 3... when the track pattern has none.
    pub fn parse<F>(&self, text: &str, mut on_skip: F) -> Extraction
    where
        F: FnMut(&SkippedRecord),
    {
        let header = parser::match_header_with(&self.header, text, &mut on_skip);
        let tracks = parser::match_tracks_with(
            &self.track,
            text,
            MatchOptions {
                auto_track_numbers: true,
            },
            &mut on_skip,
        );
        Extraction {
            header: header.filter(|x| !x.is_empty()),
            tracks,
            cover_art_url: None,
        }
    }

    /// Durations listed by the header pattern, for sources that give the
    /// track times in a block separate from the titles.
    pub fn header_durations(&self, text: &str) -> Vec<u32> {
        if !self.header.has_field(&MetadataField::Duration) {
            return vec![];
        }
        let records =
            parser::match_tracks_with(&self.header, text, MatchOptions::default(), |_| {});
        parser::track_durations(&records)
            .into_iter()
            .filter(|&x| x > 0)
            .collect()
    }

    /// Imports `text` into `destination`.
    ///
    /// Returns `None` and leaves the destination alone if the track pattern
    /// finds nothing. Records dropped for unreadable numbers go to `on_skip`.
    pub fn update_track_data<F>(
        &self,
        text: &str,
        destination: &mut TrackDataVector,
        options: ReconcileOptions,
        on_skip: F,
    ) -> Option<ReconcileReport>
    where
        F: FnMut(&SkippedRecord),
    {
        let extraction = self.parse(text, on_skip);
        if extraction.tracks.is_empty() {
            debug!("No tracks found with '{}'", self.track.source());
            return None;
        }
        let report = reconcile::reconcile(
            destination,
            extraction.header.as_ref(),
            &extraction.tracks,
            options,
        );
        let durations = self.header_durations(text);
        if !durations.is_empty() {
            debug!("Using {} durations from the header", durations.len());
            for (entry, duration) in destination.iter_mut().zip(durations) {
                if entry.enabled {
                    entry.import_duration = duration;
                }
            }
        }
        Some(report)
    }
}

/// Replaces placeholders in `format` by the values in `frames`.
///
/// Accepts the same `%{name}` and short code placeholders as patterns,
/// `%%` becomes `%`. Fields that are not set become empty.
pub fn format_frames(format: &str, frames: &FrameCollection) -> String {
    let mut result = String::with_capacity(format.len());
    let mut chars = format.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c != '%' {
            result.push(c);
            continue;
        }
        let placeholder = match chars.peek().copied() {
            Some((_, '%')) => {
                chars.next();
                result.push('%');
                continue;
            }
            Some((start, '{')) => match format[start..].find('}') {
                Some(close) => {
                    let name = &format[start + 1..start + close];
                    while chars.peek().is_some_and(|&(j, _)| j <= start + close) {
                        chars.next();
                    }
                    Some(Placeholder::from_name(name))
                }
                None => None,
            },
            Some((_, code)) => {
                let placeholder = Placeholder::from_code(code);
                if placeholder.is_some() {
                    chars.next();
                }
                placeholder
            }
            None => None,
        };
        match placeholder {
            Some(placeholder) => {
                if let Some(value) = frames.get(&placeholder.field()) {
                    result.push_str(value);
                }
            }
            None => result.push_str(&format[i..i + 1]),
        }
    }
    result
}

/// Fills fields of every enabled entry from text built out of its own fields,
/// e.g. splitting a title of the form "Artist - Title" into two fields.
/// Fields captured by `extraction` overwrite the existing ones.
pub fn import_from_tags(
    source_format: &str,
    extraction: &CompiledPattern,
    destination: &mut TrackDataVector,
) {
    for entry in destination.iter_mut().filter(|x| x.enabled) {
        let text = format_frames(source_format, &entry.frames);
        if let Some(frames) = parser::match_header(extraction, &text) {
            entry.frames.merge(&frames, false);
        }
    }
}
