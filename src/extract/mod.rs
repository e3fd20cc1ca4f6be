use serde::{Deserialize, Serialize};

use crate::{
    metadata::FrameCollection,
    reconcile::{self, ReconcileOptions, ReconcileReport},
    track_data::TrackDataVector,
};

pub mod amazon;
pub mod gnudb;
pub mod html;
pub mod scanner;

pub use amazon::AmazonExtractor;
pub use gnudb::GnudbExtractor;

/// One album offered by a search page, later used to request its track list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlbumListItem {
    pub text: String,
    pub category: String,
    pub id: String,
}
impl AlbumListItem {
    pub fn new(text: impl Into<String>, category: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            category: category.into(),
            id: id.into(),
        }
    }
}

/// Album fields and track records found in one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub header: Option<FrameCollection>,
    pub tracks: Vec<FrameCollection>,
    pub cover_art_url: Option<String>,
}
impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty() && self.header.as_ref().map_or(true, |x| x.is_empty())
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct ExtractOptions {
    /// Title, artist, album, year, track.
    #[serde(default = "default_true")]
    pub standard_tags: bool,
    /// Publisher, performer, conductor, composer, album artist.
    #[serde(default = "default_true")]
    pub additional_tags: bool,
    #[serde(default = "default_true")]
    pub cover_art: bool,
}
fn default_true() -> bool {
    true
}
impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            standard_tags: true,
            additional_tags: true,
            cover_art: true,
        }
    }
}

pub trait SourceExtractor {
    fn name(&self) -> &'static str;
    /// Albums listed on a search result page.
    fn parse_search_results(&self, text: &str) -> Vec<AlbumListItem>;
    /// Album fields and tracks of one album's detail page or record.
    fn extract(&self, text: &str) -> Extraction;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Gnudb,
    Amazon,
}
impl Source {
    pub fn extractor(self, options: ExtractOptions) -> Box<dyn SourceExtractor> {
        match self {
            Self::Gnudb => Box::new(GnudbExtractor::new(options)),
            Self::Amazon => Box::new(AmazonExtractor::new(options)),
        }
    }
}

/// Applies an extraction to the destination.
///
/// When only album fields were found they go to every enabled entry,
/// otherwise the tracks are reconciled by position.
pub fn import_extraction(
    destination: &mut TrackDataVector,
    extraction: &Extraction,
    options: ReconcileOptions,
) -> ReconcileReport {
    destination.cover_art_url = extraction.cover_art_url.clone();
    if extraction.tracks.is_empty() {
        if let Some(header) = extraction.header.as_ref().filter(|x| !x.is_empty()) {
            reconcile::apply_header(destination, header);
        }
        return ReconcileReport::default();
    }
    reconcile::reconcile(
        destination,
        extraction.header.as_ref(),
        &extraction.tracks,
        options,
    )
}
