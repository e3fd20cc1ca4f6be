use core::fmt;
use std::collections::HashMap;

use itertools::Itertools;
use serde::{ser::SerializeMap, Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone)]
#[serde(rename_all = "lowercase")]
pub enum MetadataField {
    Title,
    Artist,
    Album,
    #[serde(alias = "comments")]
    Comment,
    #[serde(alias = "date")]
    Year,
    #[serde(alias = "track number")]
    Track,
    #[serde(rename = "track total")]
    #[serde(alias = "track count")]
    TrackTotal,
    Genre,
    #[serde(alias = "label")]
    Publisher,
    Performer,
    Conductor,
    Composer,
    #[serde(rename = "album artist")]
    AlbumArtist,
    #[serde(rename = "picture url")]
    PictureUrl,
    Duration,
    #[serde(untagged)]
    Custom(String),
}
impl MetadataField {
    /// Resolves a field by the name users write in patterns and config files.
    /// Names that are not recognized become custom fields.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "title" => Self::Title,
            "artist" => Self::Artist,
            "album" => Self::Album,
            "comment" | "comments" => Self::Comment,
            "year" | "date" => Self::Year,
            "track" | "tracknumber" | "track number" => Self::Track,
            "track-total" | "tracktotal" | "track total" | "tracks-count" => Self::TrackTotal,
            "genre" => Self::Genre,
            "publisher" | "label" => Self::Publisher,
            "performer" => Self::Performer,
            "conductor" => Self::Conductor,
            "composer" => Self::Composer,
            "albumartist" | "album artist" => Self::AlbumArtist,
            "picture-url" | "url" => Self::PictureUrl,
            "duration" => Self::Duration,
            _ => Self::Custom(name.to_owned()),
        }
    }
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Track | Self::TrackTotal | Self::Duration
        )
    }
    pub fn allows_multiple(&self) -> bool {
        matches!(self, Self::Performer | Self::Composer)
    }
}
impl fmt::Display for MetadataField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Title => write!(f, "Title"),
            Self::Artist => write!(f, "Artist"),
            Self::Album => write!(f, "Album"),
            Self::Comment => write!(f, "Comment"),
            Self::Year => write!(f, "Year"),
            Self::Track => write!(f, "Track"),
            Self::TrackTotal => write!(f, "Track Total"),
            Self::Genre => write!(f, "Genre"),
            Self::Publisher => write!(f, "Publisher"),
            Self::Performer => write!(f, "Performer"),
            Self::Conductor => write!(f, "Conductor"),
            Self::Composer => write!(f, "Composer"),
            Self::AlbumArtist => write!(f, "Album Artist"),
            Self::PictureUrl => write!(f, "Picture URL"),
            Self::Duration => write!(f, "Duration"),
            Self::Custom(val) => write!(f, "Custom ({val})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub value: String,
    pub enabled: bool,
    pub changed: bool,
}
impl Frame {
    pub fn new(value: String) -> Self {
        Self {
            value,
            enabled: true,
            changed: false,
        }
    }
    pub fn as_number(&self) -> Option<u32> {
        self.value.trim().parse().ok()
    }
}

/// Metadata of one track or album.
///
/// Fields keep the order they were first set in, lookups go through an index
/// so they don't scan the list. Only fields for which
/// [`MetadataField::allows_multiple`] holds can appear more than once.
#[derive(Debug, Clone, Default)]
pub struct FrameCollection {
    frames: Vec<(MetadataField, Frame)>,
    index: HashMap<MetadataField, Vec<usize>>,
}
impl FrameCollection {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn len(&self) -> usize {
        self.frames.len()
    }
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
    pub fn clear(&mut self) {
        self.frames.clear();
        self.index.clear();
    }
    pub fn contains(&self, field: &MetadataField) -> bool {
        self.index.contains_key(field)
    }
    pub fn get(&self, field: &MetadataField) -> Option<&str> {
        self.frame(field).map(|x| x.value.as_str())
    }
    pub fn get_all(&self, field: &MetadataField) -> Vec<&str> {
        self.index
            .get(field)
            .map(|positions| {
                positions
                    .iter()
                    .map(|&i| self.frames[i].1.value.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }
    pub fn get_number(&self, field: &MetadataField) -> Option<u32> {
        self.frame(field).and_then(Frame::as_number)
    }
    pub fn frame(&self, field: &MetadataField) -> Option<&Frame> {
        self.index
            .get(field)
            .and_then(|positions| positions.first())
            .map(|&i| &self.frames[i].1)
    }
    pub fn frame_mut(&mut self, field: &MetadataField) -> Option<&mut Frame> {
        let i = *self.index.get(field)?.first()?;
        Some(&mut self.frames[i].1)
    }
    /// Sets the single value of a field, dropping any additional values it had.
    pub fn set(&mut self, field: MetadataField, value: impl Into<String>) {
        let value = value.into();
        let positions = self.index.get(&field).cloned().unwrap_or_default();
        match positions.split_first() {
            None => self.push(field, Frame::new(value)),
            Some((&first, extra)) => {
                self.frames[first].1.value = value;
                if !extra.is_empty() {
                    let mut i = 0;
                    self.frames.retain(|_| {
                        let keep = !extra.contains(&i);
                        i += 1;
                        keep
                    });
                    self.reindex();
                }
            }
        }
    }
    pub fn set_number(&mut self, field: MetadataField, value: u32) {
        self.set(field, value.to_string());
    }
    /// Adds another value for fields that can hold several, otherwise behaves like [`Self::set`].
    pub fn add(&mut self, field: MetadataField, value: impl Into<String>) {
        if field.allows_multiple() {
            self.push(field, Frame::new(value.into()));
        } else {
            self.set(field, value);
        }
    }
    pub fn remove(&mut self, field: &MetadataField) -> bool {
        if self.index.remove(field).is_none() {
            return false;
        }
        self.frames.retain(|(f, _)| f != field);
        self.reindex();
        true
    }
    /// Copies the fields of `other` into this collection.
    /// With `only_if_empty`, fields this collection already has are kept.
    pub fn merge(&mut self, other: &FrameCollection, only_if_empty: bool) {
        for field in other.fields() {
            if only_if_empty && self.contains(field) {
                continue;
            }
            self.remove(field);
            for &i in &other.index[field] {
                self.push(field.clone(), other.frames[i].1.clone());
            }
        }
    }
    /// Distinct fields in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = &MetadataField> {
        self.frames
            .iter()
            .enumerate()
            .filter(|(i, (field, _))| self.index[field].first() == Some(i))
            .map(|(_, (field, _))| field)
    }
    pub fn iter(&self) -> impl Iterator<Item = (&MetadataField, &Frame)> {
        self.frames.iter().map(|(k, v)| (k, v))
    }
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&MetadataField, &mut Frame)> {
        self.frames.iter_mut().map(|(k, v)| (&*k, v))
    }

    pub fn title(&self) -> Option<&str> {
        self.get(&MetadataField::Title)
    }
    pub fn artist(&self) -> Option<&str> {
        self.get(&MetadataField::Artist)
    }
    pub fn album(&self) -> Option<&str> {
        self.get(&MetadataField::Album)
    }
    pub fn track(&self) -> Option<u32> {
        self.get_number(&MetadataField::Track)
    }
    pub fn duration(&self) -> Option<u32> {
        self.get_number(&MetadataField::Duration)
    }

    fn push(&mut self, field: MetadataField, frame: Frame) {
        self.index
            .entry(field.clone())
            .or_default()
            .push(self.frames.len());
        self.frames.push((field, frame));
    }
    fn reindex(&mut self) {
        self.index.clear();
        for (i, (field, _)) in self.frames.iter().enumerate() {
            self.index.entry(field.clone()).or_default().push(i);
        }
    }
}
impl PartialEq for FrameCollection {
    fn eq(&self, other: &Self) -> bool {
        self.frames == other.frames
    }
}
impl Eq for FrameCollection {}
impl FromIterator<(MetadataField, String)> for FrameCollection {
    fn from_iter<T: IntoIterator<Item = (MetadataField, String)>>(iter: T) -> Self {
        let mut frames = Self::new();
        for (field, value) in iter {
            frames.add(field, value);
        }
        frames
    }
}
impl Serialize for FrameCollection {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.index.len()))?;
        for field in self.fields() {
            let values = self.get_all(field);
            if values.len() == 1 {
                map.serialize_entry(field, values[0])?;
            } else {
                map.serialize_entry(field, &values)?;
            }
        }
        map.end()
    }
}
impl fmt::Display for FrameCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self
            .iter()
            .map(|(field, frame)| format!("{field}: {}", frame.value))
            .join(", ");
        f.write_str(&text)
    }
}
