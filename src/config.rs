use std::{fs::File, io::BufReader, path::Path};

use log::warn;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use crate::{
    pattern::{CompiledPattern, PatternError},
    text_import::TextImporter,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("{0}")]
    Pattern(#[from] PatternError),
    #[error("No import format {0}")]
    MissingFormat(String),
}

pub fn load_yaml<T>(path: &Path) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let yaml: T = serde_yaml::from_reader(reader)?;
    Ok(yaml)
}

/// A named pair of header and track patterns.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ImportFormat {
    pub name: String,
    #[serde(default)]
    pub header: String,
    #[serde(default)]
    pub track: String,
}
impl ImportFormat {
    pub fn new(name: &str, header: &str, track: &str) -> Self {
        Self {
            name: name.to_owned(),
            header: header.to_owned(),
            track: track.to_owned(),
        }
    }
    pub fn compile(&self) -> Result<TextImporter, PatternError> {
        TextImporter::from_format(self)
    }
}

/// Builds text from a track's own fields and extracts other fields from it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TagImportFormat {
    pub name: String,
    pub source: String,
    pub extraction: String,
}
impl TagImportFormat {
    pub fn new(name: &str, source: &str, extraction: &str) -> Self {
        Self {
            name: name.to_owned(),
            source: source.to_owned(),
            extraction: extraction.to_owned(),
        }
    }
    pub fn compile(&self) -> Result<CompiledPattern, PatternError> {
        CompiledPattern::compile(&self.extraction)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportConfig {
    pub formats: Vec<ImportFormat>,
    pub tag_formats: Vec<TagImportFormat>,
    pub selected: usize,
    /// Seconds a file and an imported duration may differ before the entry is flagged.
    pub max_time_difference: u32,
    pub enable_time_difference_check: bool,
}

/// User overrides, every key optional.
#[derive(Deserialize, Default)]
pub struct RawImportConfig {
    #[serde(default)]
    formats: Vec<ImportFormat>,
    #[serde(default)]
    tag_formats: Vec<TagImportFormat>,
    selected: Option<String>,
    max_time_difference: Option<u32>,
    enable_time_difference_check: Option<bool>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        let formats = vec![
            ImportFormat::new(
                "CSV unquoted",
                "",
                r"%{track}(\d+)\t%{title}([^\r\n\t]*)\t%{artist}([^\r\n\t]*)\t%{album}([^\r\n\t]*)\t%{year}(\d+)\t%{genre}([^\r\n\t]*)\t%{comment}([^\r\n\t]*)\t(?:\d+:)?%{duration}(\d+:\d+)",
            ),
            ImportFormat::new(
                "CSV quoted",
                "",
                r#""?%{track}(\d+)"?\t"?%{title}([^\r\n\t"]*)"?\t"?%{artist}([^\r\n\t"]*)"?\t"?%{album}([^\r\n\t"]*)"?\t"?%{year}(\d+)"?\t"?%{genre}([^\r\n\t"]*)"?\t"?%{comment}([^\r\n\t"]*)"?\t"?(?:\d+:)?%{duration}(\d+:\d+)"#,
            ),
            ImportFormat::new(
                "freedb HTML text",
                r"%{artist}(\S[^\r\n/]*\S)\s*/\s*%{album}(\S[^\r\n]*\S)[\r\n]+\s*tracks:\s+\d+.*year:\s*%{year}(\d+)?.*genre:\s*%{genre}(\S[^\r\n]*\S)?[\r\n]",
                r"[\r\n]%{track}(\d+)[\.\s]+%{duration}(\d+:\d+)\s+%{title}(\S[^\r\n]*\S)",
            ),
            ImportFormat::new(
                "freedb HTML source",
                r"<[^>]+>%{artist}([^<\s][^\r\n/]*\S)\s*/\s*%{album}(\S[^\r\n]*[^\s>])<[^>]+>[\r\n]+\s*tracks:\s+\d+.*year:\s*%{year}(\d+)?.*genre:\s*%{genre}(\S[^\r\n>]*\S)?<[^>]+>[\r\n]",
                r"<td[^>]*>\s*%{track}(\d+).</td><td[^>]*>\s*%{duration}(\d+:\d+)</td><td[^>]*>(?:<[^>]+>)?%{title}([^<\r\n]+)",
            ),
            ImportFormat::new("Title", "", r"\s*%{title}(\S[^\r\n]*\S)\s*"),
            ImportFormat::new(
                "Track Title",
                "",
                r"\s*%{track}(\d+)[\.\s]+%{title}(\S[^\r\n]*\S)\s*",
            ),
            ImportFormat::new(
                "Track Title Time",
                "",
                r"\s*%{track}(\d+)[\.\s]+%{title}(\S[^\r\n]*\S)\s+%{duration}(\d+:\d+)\s*",
            ),
            ImportFormat::new("Custom Format", "", ""),
        ];
        let tag_formats = vec![
            TagImportFormat::new("Artist to Album Artist", "%{artist}", "%{albumartist}(.+)"),
            TagImportFormat::new("Album Artist to Artist", "%{albumartist}", "%{artist}(.+)"),
            TagImportFormat::new("Artist to Composer", "%{artist}", "%{composer}(.+)"),
            TagImportFormat::new("Artist to Conductor", "%{artist}", "%{conductor}(.+)"),
            TagImportFormat::new(
                "Track Number from Title",
                "%{title}",
                r"\s*%{track}(\d+)[\.\s]+%{title}(\S.*\S)\s*",
            ),
            TagImportFormat::new("Track Number to Title", "%{track} %{title}", "%{title}(.+)"),
            TagImportFormat::new("Subtitle from Title", "%{title}", "%{subtitle}(.+) - "),
            TagImportFormat::new(
                "Title Annotation to Comment",
                "%{title}",
                r"%{title}(.+) +\(%{comment}((?:Bonus|Remix)[^)]*)\)",
            ),
            TagImportFormat::new("Custom Format", "", ""),
        ];
        Self {
            formats,
            tag_formats,
            selected: 0,
            max_time_difference: 3,
            enable_time_difference_check: true,
        }
    }
}

impl ImportConfig {
    /// Layers user settings over the defaults. Formats with a known name
    /// replace the built-in one, others are added at the end.
    pub fn new(raw: RawImportConfig) -> Self {
        let mut config = Self::default();
        for format in raw.formats {
            match config.formats.iter_mut().find(|x| x.name == format.name) {
                Some(existing) => *existing = format,
                None => config.formats.push(format),
            }
        }
        for format in raw.tag_formats {
            match config.tag_formats.iter_mut().find(|x| x.name == format.name) {
                Some(existing) => *existing = format,
                None => config.tag_formats.push(format),
            }
        }
        if let Some(name) = raw.selected {
            match config.position(&name) {
                Some(index) => config.selected = index,
                None => warn!("Selected import format '{name}' does not exist"),
            }
        }
        if let Some(seconds) = raw.max_time_difference {
            config.max_time_difference = seconds;
        }
        if let Some(check) = raw.enable_time_difference_check {
            config.enable_time_difference_check = check;
        }
        config
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        load_yaml::<RawImportConfig>(path).map(Self::new)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.formats
            .iter()
            .position(|x| x.name.eq_ignore_ascii_case(name))
    }

    pub fn find(&self, name: &str) -> Option<&ImportFormat> {
        self.position(name).map(|x| &self.formats[x])
    }

    pub fn find_tag_format(&self, name: &str) -> Option<&TagImportFormat> {
        self.tag_formats
            .iter()
            .find(|x| x.name.eq_ignore_ascii_case(name))
    }

    pub fn selected_format(&self) -> Option<&ImportFormat> {
        self.formats.get(self.selected)
    }

    pub fn compile(&self, index: usize) -> Result<TextImporter, ConfigError> {
        let format = self
            .formats
            .get(index)
            .ok_or_else(|| ConfigError::MissingFormat(index.to_string()))?;
        Ok(format.compile()?)
    }

    /// Duration tolerance for the mismatch check, `None` when the check is off.
    pub fn tolerance(&self) -> Option<u32> {
        self.enable_time_difference_check
            .then_some(self.max_time_difference)
    }
}
