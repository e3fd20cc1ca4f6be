use std::sync::OnceLock;

use log::debug;
use regex::Regex;

use super::{
    html::{remove_html, replace_html_entities},
    scanner::{delimited, find_duration, find_from, RowLayout, TrackListScanner, TrackRow},
    AlbumListItem, ExtractOptions, Extraction, SourceExtractor,
};
use crate::metadata::{FrameCollection, MetadataField};

const TITLE_COL: &str = "class=\"titleCol\"";
const RUNTIME_COL: &str = "class=\"runtimeCol\"";
const LIST_ROW: &str = "class=\"listRow";
const POPOVER: &str = "id=\"a-popover-trackTitlePopover";
const POPOVER_DURATION: &str = "<td id=\"dmusic_tracklist_duration";
const ARTIST_COLUMN: &str = "<td>Song Title</td><td>Artist</td>";

fn product_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r#"<a class="[^"]*s-access-detail-page[^"]*"[^>]+title="([^"]+)"[^>]+"#,
            r#"href="[^"]+/(dp|ASIN|images|product|-)/([A-Z0-9]+)[^"]+">"#
        ))
        .expect("product regex")
    })
}

fn next_element_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r">([^<]+)<").expect("element regex"))
}

fn numbered_title_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*\d+\.\s+(.*\S)").expect("numbered title regex"))
}

fn year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{4})").expect("year regex"))
}

fn label_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r">\s*([^<]+)<").expect("label regex"))
}

/// Text between the next `<a` tag at or after `from` and the following `<`.
fn link_text(text: &str, from: usize) -> Option<(usize, usize)> {
    let anchor = find_from(text, from, "<a")?;
    delimited(text, anchor, ">", "<")
}

/// Tabular layout, one row per line, optional artist column and runtime column.
struct TitleColumn {
    has_artist: bool,
}
impl RowLayout for TitleColumn {
    fn marker(&self) -> &'static str {
        TITLE_COL
    }
    fn read_row(&self, text: &str, start: usize) -> Option<(TrackRow, usize)> {
        let end = find_from(text, start, "\n").unwrap_or(text.len());
        let line = &text[start..end];
        let anchor = line.find("<a href=")?;
        let (title_start, title_end) = delimited(line, anchor, ">", "<")?;
        let mut row = TrackRow {
            title: line[title_start..title_end].to_owned(),
            ..TrackRow::default()
        };
        if self.has_artist {
            row.artist = find_from(line, title_end, TITLE_COL)
                .and_then(|col| find_from(line, col, "<a href="))
                .and_then(|anchor| delimited(line, anchor, ">", "<"))
                .map(|(s, e)| line[s..e].to_owned());
        }
        row.duration = find_from(line, title_end, RUNTIME_COL)
            .and_then(|col| delimited(line, col + RUNTIME_COL.len(), ">", "<"))
            .and_then(|(s, e)| find_duration(&line[s..e]));
        Some((row, end))
    }
}

/// Looser layout: `<tr class="listRow..."><td>1. Title</td>`.
struct ListRow;
impl RowLayout for ListRow {
    fn marker(&self) -> &'static str {
        LIST_ROW
    }
    fn read_row(&self, text: &str, start: usize) -> Option<(TrackRow, usize)> {
        let (cell_start, cell_end) = delimited(text, start, "<td>", "</td>")?;
        let caps = numbered_title_re().captures(&text[cell_start..cell_end])?;
        let row = TrackRow {
            title: caps[1].to_owned(),
            ..TrackRow::default()
        };
        Some((row, cell_end))
    }
}

/// Digital music layout with a title popover per track.
struct Popover;
impl RowLayout for Popover {
    fn marker(&self) -> &'static str {
        POPOVER
    }
    fn read_row(&self, text: &str, start: usize) -> Option<(TrackRow, usize)> {
        let (title_start, title_end) = link_text(text, start)?;
        let mut row = TrackRow {
            title: text[title_start..title_end].to_owned(),
            ..TrackRow::default()
        };
        row.duration = find_from(text, title_end, POPOVER_DURATION)
            .and_then(|cell| {
                find_from(text, cell, "</td>").map(|end| text[cell + 1..end].replace(['\r', '\n'], ""))
            })
            .and_then(|cell| find_duration(&cell));
        Some((row, title_end))
    }
}

pub struct AmazonExtractor {
    options: ExtractOptions,
}
impl AmazonExtractor {
    pub fn new(options: ExtractOptions) -> Self {
        Self { options }
    }

    fn parse_title_and_artist(&self, text: &str, header: &mut FrameCollection) {
        let Some(title_tag) = text.find("id=\"productTitle\"") else {
            return;
        };
        let Some((start, mut end)) = delimited(text, title_tag, ">", "<") else {
            return;
        };
        if let Some(bracket) = find_from(text, start, " [").filter(|&x| x < end) {
            end = bracket;
        }
        header.set(
            MetadataField::Album,
            replace_html_entities(&text[start..end]),
        );
        let artist = find_from(text, end, "class=\"author")
            .and_then(|author| find_from(text, author, ">"))
            .and_then(|tag_end| link_text(text, tag_end));
        if let Some((start, end)) = artist {
            header.set(
                MetadataField::Artist,
                replace_html_entities(&text[start..end]),
            );
        }
    }

    /// Reads the product details list; returns the orchestra, which is used as album artist.
    fn parse_details(&self, text: &str, header: &mut FrameCollection) -> Option<String> {
        let details = text.find(">Product Details<")?;
        if self.options.standard_tags {
            let release = find_from(text, details, ">Original Release Date:<")
                .or_else(|| find_from(text, details, ">Audio CD<"));
            let year = release
                .and_then(|at| {
                    let from = at + 10;
                    find_from(text, from, "\n").map(|end| &text[from..end])
                })
                .and_then(|line| year_re().captures(line))
                .map(|caps| caps[1].to_owned());
            if let Some(year) = year {
                header.set(MetadataField::Year, year);
            }
        }
        if !self.options.additional_tags {
            return None;
        }
        let label = find_from(text, details, ">Label:<")
            .and_then(|at| {
                let from = at + ">Label:".len();
                find_from(text, from, "\n").map(|end| &text[from..end])
            })
            .and_then(|line| label_re().captures(line))
            .map(|caps| remove_html(&caps[1]));
        if let Some(label) = label.filter(|x| !x.is_empty()) {
            header.set(MetadataField::Publisher, label);
        }
        let credit = |marker: &str| {
            let at = find_from(text, details, marker)?;
            let from = at + marker.len() - 1;
            let end = find_from(text, from, "</li>")?;
            Some(remove_html(&text[from..end])).filter(|x| !x.is_empty())
        };
        for (marker, field) in [
            (">Performer:<", MetadataField::Performer),
            (">Conductor:<", MetadataField::Conductor),
            (">Composer:<", MetadataField::Composer),
        ] {
            if let Some(value) = credit(marker) {
                header.set(field, value);
            }
        }
        credit(">Orchestra:<")
    }

    fn parse_cover_art(&self, text: &str) -> Option<String> {
        let asin = text.find("id=\"ASIN\"")?;
        let (start, end) = delimited(text, asin, "value=\"", "\"")?;
        Some(format!("http://www.amazon.com/dp/{}", &text[start..end]))
    }
}
impl SourceExtractor for AmazonExtractor {
    fn name(&self) -> &'static str {
        "Amazon"
    }

    fn parse_search_results(&self, text: &str) -> Vec<AlbumListItem> {
        let text = text.replace('\r', "");
        let mut items = vec![];
        let products = product_re().captures_iter(&text).collect::<Vec<_>>();
        for (i, caps) in products.iter().enumerate() {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let limit = products
                .get(i + 1)
                .and_then(|x| x.get(0))
                .map_or(text.len(), |x| x.start());
            let title = replace_html_entities(&caps[1]);
            let artist = find_from(&text, whole.end(), ">by <")
                .filter(|&by| by < limit)
                .and_then(|by| next_element_re().captures(&text[by + 4..limit]))
                .map(|x| replace_html_entities(x[1].trim()));
            let display = match artist {
                Some(artist) => format!("{artist} - {title}"),
                None => title,
            };
            items.push(AlbumListItem::new(display, &caps[2], &caps[3]));
        }
        debug!("Found {} albums", items.len());
        items
    }

    fn extract(&self, text: &str) -> Extraction {
        let mut header = FrameCollection::new();
        if self.options.standard_tags {
            self.parse_title_and_artist(text, &mut header);
        }
        let mut album_artist = self.parse_details(text, &mut header);
        let cover_art_url = if self.options.cover_art {
            self.parse_cover_art(text)
        } else {
            None
        };

        let title_column = TitleColumn {
            has_artist: text.contains(ARTIST_COLUMN),
        };
        let layouts: [&dyn RowLayout; 3] = [&title_column, &ListRow, &Popover];
        let (layout, rows) = TrackListScanner::new(&layouts).scan(text);
        debug!("Track list layout {:?}, {} rows", layout, rows.len());

        let mut tracks = vec![];
        for row in rows.into_iter().filter(|x| !x.title.is_empty()) {
            let mut frames = FrameCollection::new();
            if self.options.standard_tags {
                frames.set(MetadataField::Title, replace_html_entities(&row.title));
                if let Some(artist) = row.artist.as_deref().filter(|x| !x.is_empty()) {
                    frames.set(MetadataField::Artist, replace_html_entities(artist));
                    // various artists: the album artist is the one from the header
                    if album_artist.is_none() {
                        album_artist = header.artist().map(str::to_owned);
                    }
                }
                frames.set_number(MetadataField::Track, tracks.len() as u32 + 1);
            }
            if let Some(duration) = row.duration.filter(|&x| x > 0) {
                frames.set_number(MetadataField::Duration, duration);
            }
            tracks.push(frames);
        }
        if self.options.additional_tags {
            if let Some(album_artist) = album_artist.filter(|x| !x.is_empty()) {
                for frames in &mut tracks {
                    frames.set(MetadataField::AlbumArtist, album_artist.clone());
                }
                if tracks.is_empty() {
                    header.set(MetadataField::AlbumArtist, album_artist);
                }
            }
        }
        Extraction {
            header: (!header.is_empty()).then_some(header),
            tracks,
            cover_art_url,
        }
    }
}
