//! Cursor helpers and the track list state machine for pages whose layout
//! can't be described by one regular expression.

use std::sync::OnceLock;

use regex::Regex;

/// Byte position of `pattern` at or after `from`.
pub fn find_from(text: &str, from: usize, pattern: &str) -> Option<usize> {
    text.get(from..)?.find(pattern).map(|x| x + from)
}

/// Span between the first `open` at or after `from` and the next `close`.
/// Returns the start and end of the enclosed text.
pub fn delimited(text: &str, from: usize, open: &str, close: &str) -> Option<(usize, usize)> {
    let start = find_from(text, from, open)? + open.len();
    let end = find_from(text, start, close)?;
    Some((start, end))
}

pub fn duration_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+):(\d+)").expect("duration regex"))
}

/// First `M:SS` in `text` as seconds.
pub fn find_duration(text: &str) -> Option<u32> {
    let caps = duration_re().captures(text)?;
    let minutes: u32 = caps[1].parse().ok()?;
    let seconds: u32 = caps[2].parse().ok()?;
    minutes.checked_mul(60)?.checked_add(seconds)
}

/// One row read from a track list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackRow {
    pub title: String,
    pub artist: Option<String>,
    pub duration: Option<u32>,
}

/// A markup variant for track lists.
pub trait RowLayout {
    /// Marker that starts every row of this layout.
    fn marker(&self) -> &'static str;
    /// Reads the row at `start`, returning it and the position to continue from.
    /// `None` ends the list.
    fn read_row(&self, text: &str, start: usize) -> Option<(TrackRow, usize)>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Searching,
    InTracks { layout: usize, at: usize },
    Done,
}

/// Walks a track list: probes the layouts in order, commits to the first
/// whose marker occurs, then reads rows of that layout until one is missing.
pub struct TrackListScanner<'a> {
    layouts: &'a [&'a dyn RowLayout],
}
impl<'a> TrackListScanner<'a> {
    pub fn new(layouts: &'a [&'a dyn RowLayout]) -> Self {
        Self { layouts }
    }
    pub fn step(&self, text: &str, state: ScanState) -> (ScanState, Option<TrackRow>) {
        match state {
            ScanState::Searching => {
                let found = self
                    .layouts
                    .iter()
                    .enumerate()
                    .find_map(|(i, layout)| text.find(layout.marker()).map(|at| (i, at)));
                match found {
                    Some((layout, at)) => (ScanState::InTracks { layout, at }, None),
                    None => (ScanState::Done, None),
                }
            }
            ScanState::InTracks { layout, at } => {
                let current = self.layouts[layout];
                match current.read_row(text, at) {
                    Some((row, next)) => {
                        let state = match find_from(text, next, current.marker()) {
                            Some(at) => ScanState::InTracks { layout, at },
                            None => ScanState::Done,
                        };
                        (state, Some(row))
                    }
                    None => (ScanState::Done, None),
                }
            }
            ScanState::Done => (ScanState::Done, None),
        }
    }
    /// Index of the layout that was used and all rows read.
    pub fn scan(&self, text: &str) -> (Option<usize>, Vec<TrackRow>) {
        let mut rows = vec![];
        let mut used = None;
        let mut state = ScanState::Searching;
        loop {
            let (next, row) = self.step(text, state);
            rows.extend(row);
            match (state, next) {
                (_, ScanState::Done) => break,
                (ScanState::InTracks { at: previous, .. }, ScanState::InTracks { at, .. })
                    if at <= previous =>
                {
                    break
                }
                (_, ScanState::InTracks { layout, .. }) => used = Some(layout),
                _ => {}
            }
            state = next;
        }
        (used, rows)
    }
}
