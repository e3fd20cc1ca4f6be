use std::ops::{Deref, DerefMut};

use serde::Serialize;

use crate::metadata::FrameCollection;

/// Metadata for one destination slot together with the durations used to align it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackData {
    pub frames: FrameCollection,
    pub import_duration: u32,
    file_duration: u32,
    pub enabled: bool,
}
impl TrackData {
    /// Entry backed by a local file of the given duration in seconds.
    pub fn new(file_duration: u32) -> Self {
        Self::with_frames(FrameCollection::new(), file_duration)
    }
    pub fn with_frames(frames: FrameCollection, file_duration: u32) -> Self {
        Self {
            frames,
            import_duration: 0,
            file_duration,
            enabled: true,
        }
    }
    /// Entry that only exists because more records were imported than there are files.
    pub fn virtual_entry(frames: FrameCollection, import_duration: u32) -> Self {
        Self {
            frames,
            import_duration,
            file_duration: 0,
            enabled: true,
        }
    }
    pub fn file_duration(&self) -> u32 {
        self.file_duration
    }
    pub fn is_virtual(&self) -> bool {
        self.file_duration == 0
    }
    /// Absolute difference between file and import duration,
    /// `None` unless both are known.
    pub fn time_difference(&self) -> Option<u32> {
        (self.file_duration != 0 && self.import_duration != 0)
            .then(|| self.file_duration.abs_diff(self.import_duration))
    }
    pub fn set_frames(&mut self, frames: FrameCollection, import_duration: u32) {
        self.frames = frames;
        self.import_duration = import_duration;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TrackDataVector {
    tracks: Vec<TrackData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_art_url: Option<String>,
}
impl TrackDataVector {
    pub fn new() -> Self {
        Self::default()
    }
    /// One entry per local file, given their durations in seconds.
    pub fn from_file_durations(durations: &[u32]) -> Self {
        durations.iter().map(|&x| TrackData::new(x)).collect()
    }
    pub fn into_inner(self) -> Vec<TrackData> {
        self.tracks
    }
}
impl Deref for TrackDataVector {
    type Target = Vec<TrackData>;

    fn deref(&self) -> &Vec<TrackData> {
        &self.tracks
    }
}
impl DerefMut for TrackDataVector {
    fn deref_mut(&mut self) -> &mut Vec<TrackData> {
        &mut self.tracks
    }
}
impl From<Vec<TrackData>> for TrackDataVector {
    fn from(tracks: Vec<TrackData>) -> Self {
        Self {
            tracks,
            cover_art_url: None,
        }
    }
}
impl FromIterator<TrackData> for TrackDataVector {
    fn from_iter<T: IntoIterator<Item = TrackData>>(iter: T) -> Self {
        iter.into_iter().collect::<Vec<_>>().into()
    }
}
