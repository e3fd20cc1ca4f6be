use std::{collections::BTreeMap, sync::OnceLock};

use log::debug;
use regex::Regex;

use super::{AlbumListItem, ExtractOptions, Extraction, SourceExtractor};
use crate::{
    genres,
    metadata::{FrameCollection, MetadataField},
};

/// CD frames per second.
const FRAMES_PER_SECOND: u32 = 75;

macro_rules! static_regex {
    ($name:ident, $pattern:expr) => {
        fn $name() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new($pattern).expect(stringify!($name)))
        }
    };
}

static_regex!(line_split_re, r"[\r\n]+");
static_regex!(query_entry_re, r"^([a-z]+)\s+([0-9a-f]+)\s+(.*)$");
static_regex!(page_title_re, r#"<a href="[^"]+/cd/[^"]+"><b>([^<]+)</b></a>"#);
static_regex!(page_id_re, r"Discid: ([a-z]+)[\s/]+([0-9a-f]+)");
static_regex!(
    dtitle_re,
    r"DTITLE=\s*(\S[^\r\n]*\S)\s*/\s*(\S[^\r\n]*\S)(?:[\r\n]|$)"
);
static_regex!(extd_year_re, r"EXTD=[^\r\n]*YEAR:\s*(\d+)\D");
static_regex!(extd_genre_re, r"EXTD=[^\r\n]*ID3G:\s*(\d+)\D");
static_regex!(dyear_re, r"DYEAR=(\d+)");
static_regex!(dgenre_re, r"DGENRE=([^\r\n]+)");
static_regex!(ttitle_re, r"TTITLE(\d+)=([^\r\n]+)");
static_regex!(disc_length_re, r"Disc length:\s*(\d+)");
static_regex!(offset_re, r"#\s*(\d+)");

/// Reads CDDB records as served by gnudb.org.
pub struct GnudbExtractor {
    options: ExtractOptions,
}
impl GnudbExtractor {
    pub fn new(options: ExtractOptions) -> Self {
        Self { options }
    }
}

/// Seconds per track from the frame offsets comment block and the disc length.
pub fn track_durations(text: &str) -> Vec<u32> {
    let Some(disc) = disc_length_re().captures(text) else {
        return vec![];
    };
    let Some(offsets_at) = text.find("Track frame offsets") else {
        return vec![];
    };
    let Some(disc_at) = disc.get(0).map(|x| x.start()) else {
        return vec![];
    };
    let disc_length: u32 = disc[1].parse().unwrap_or(0);
    let offsets = offset_re()
        .captures_iter(text.get(offsets_at..disc_at).unwrap_or_default())
        .filter_map(|caps| caps[1].parse::<u32>().ok())
        .collect::<Vec<_>>();
    let mut durations = offsets
        .windows(2)
        .map(|pair| pair[1].saturating_sub(pair[0]) / FRAMES_PER_SECOND)
        .collect::<Vec<_>>();
    let disc_frames = disc_length.checked_mul(FRAMES_PER_SECOND);
    if let (Some(&last), Some(disc_frames)) = (offsets.last(), disc_frames) {
        durations.push(disc_frames.saturating_sub(last) / FRAMES_PER_SECOND);
    }
    durations
}

fn album_data(text: &str) -> FrameCollection {
    let mut frames = FrameCollection::new();
    if let Some(caps) = dtitle_re().captures(text) {
        frames.set(MetadataField::Artist, &caps[1]);
        frames.set(MetadataField::Album, &caps[2]);
    }
    let year = dyear_re()
        .captures(text)
        .or_else(|| extd_year_re().captures(text));
    if let Some(year) = year.and_then(|caps| caps[1].parse::<u32>().ok()) {
        frames.set_number(MetadataField::Year, year);
    }
    let genre = dgenre_re()
        .captures(text)
        .map(|caps| caps[1].trim().to_owned())
        .or_else(|| {
            extd_genre_re()
                .captures(text)
                .and_then(|caps| caps[1].parse().ok())
                .and_then(genres::name)
                .map(str::to_owned)
        });
    if let Some(genre) = genre.filter(|x| !x.is_empty()) {
        frames.set(MetadataField::Genre, genre);
    }
    frames
}

/// Track titles by number. Long titles are split over several lines with the
/// same number; the list ends at the first missing number.
fn track_titles(text: &str) -> Vec<String> {
    let mut titles = BTreeMap::<usize, String>::new();
    for caps in ttitle_re().captures_iter(text) {
        if let Ok(number) = caps[1].parse() {
            titles.entry(number).or_default().push_str(&caps[2]);
        }
    }
    let mut result = vec![];
    while let Some(title) = titles.remove(&result.len()) {
        result.push(title);
    }
    result
}

impl SourceExtractor for GnudbExtractor {
    fn name(&self) -> &'static str {
        "gnudb.org"
    }

    /// Accepts the `200 Found` query response as well as the search page.
    fn parse_search_results(&self, text: &str) -> Vec<AlbumListItem> {
        let mut items = vec![];
        let mut in_entries = false;
        let mut title = String::new();
        let mut from_page = false;
        for line in line_split_re().split(text) {
            if !in_entries {
                if line.starts_with("200 Found") {
                    in_entries = true;
                } else if line.contains(" albums found:") {
                    in_entries = true;
                    from_page = true;
                }
                continue;
            }
            if from_page {
                if let Some(caps) = page_title_re().captures(line) {
                    title = caps[1].to_owned();
                }
                if let Some(caps) = page_id_re().captures(line) {
                    items.push(AlbumListItem::new(title.clone(), &caps[1], &caps[2]));
                }
            } else {
                if line == "." {
                    break;
                }
                if let Some(caps) = query_entry_re().captures(line) {
                    items.push(AlbumListItem::new(&caps[3], &caps[1], &caps[2]));
                }
            }
        }
        debug!("Found {} albums", items.len());
        items
    }

    fn extract(&self, text: &str) -> Extraction {
        let header = if self.options.standard_tags {
            album_data(text)
        } else {
            FrameCollection::new()
        };
        let mut durations = track_durations(text).into_iter();
        let tracks = track_titles(text)
            .into_iter()
            .enumerate()
            .map(|(i, title)| {
                let mut frames = FrameCollection::new();
                if self.options.standard_tags {
                    frames.set_number(MetadataField::Track, i as u32 + 1);
                    frames.set(MetadataField::Title, title);
                }
                if let Some(duration) = durations.next().filter(|&x| x > 0) {
                    frames.set_number(MetadataField::Duration, duration);
                }
                frames
            })
            .collect::<Vec<_>>();
        debug!("Read {} tracks", tracks.len());
        Extraction {
            header: (!header.is_empty()).then_some(header),
            tracks,
            cover_art_url: None,
        }
    }
}
