use regex::Regex;
use thiserror::Error;

use crate::metadata::MetadataField;

#[derive(Error, Debug)]
#[error("Invalid pattern '{pattern}': {reason}")]
pub struct PatternError {
    pub pattern: String,
    pub reason: PatternErrorKind,
}

#[derive(Error, Debug)]
pub enum PatternErrorKind {
    #[error("%{{{name}}} must be followed by a capturing group")]
    MissingSubPattern { name: String },
    #[error("placeholder at {at} is never closed")]
    UnclosedPlaceholder { at: usize },
    #[error("placeholder at {at} has no name")]
    EmptyPlaceholder { at: usize },
    #[error("{0}")]
    InvalidRegex(#[from] regex::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationFormat {
    /// `M+:SS`, converted to seconds
    MinutesSeconds,
    Seconds,
    /// `M+:SS` if the capture has a colon, seconds otherwise
    Auto,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placeholder {
    Field(MetadataField),
    Duration(DurationFormat),
}
impl Placeholder {
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "duration-mm-ss" => Self::Duration(DurationFormat::MinutesSeconds),
            "duration-seconds" => Self::Duration(DurationFormat::Seconds),
            "duration" | "__duration" => Self::Duration(DurationFormat::Auto),
            "file" | "file-path" => Self::Field(MetadataField::Custom(name.trim().to_owned())),
            _ => Self::Field(MetadataField::from_name(name)),
        }
    }
    pub fn from_code(code: char) -> Option<Self> {
        let field = match code {
            's' => MetadataField::Title,
            'l' => MetadataField::Album,
            'a' => MetadataField::Artist,
            'c' => MetadataField::Comment,
            'y' => MetadataField::Year,
            't' => MetadataField::Track,
            'g' => MetadataField::Genre,
            'd' => return Some(Self::Duration(DurationFormat::Auto)),
            _ => return None,
        };
        Some(Self::Field(field))
    }
    pub fn field(&self) -> MetadataField {
        match self {
            Self::Field(field) => field.clone(),
            Self::Duration(_) => MetadataField::Duration,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Capture {
    pub placeholder: Placeholder,
    pub group: usize,
}

/// Executable form of an import pattern.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    source: String,
    regex: Option<Regex>,
    captures: Vec<Capture>,
}
impl CompiledPattern {
    /// Compiles pattern text made of regular expression syntax and placeholders.
    ///
    /// `%{name}` must be directly followed by a capturing group, whose text
    /// becomes the value of the named field. `%s %l %a %c %y %t %g %d` are
    /// short forms of title, album, artist, comment, year, track, genre and
    /// duration, `%%` is a literal percent sign. Everything else is passed to
    /// the regex engine unchanged. Groups are resolved by position, so the same
    /// placeholder may appear several times.
    ///
    /// A blank pattern compiles to one that never matches.
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        let error = |reason| PatternError {
            pattern: pattern.to_owned(),
            reason,
        };
        if pattern.trim().is_empty() {
            return Ok(Self {
                source: pattern.to_owned(),
                regex: None,
                captures: vec![],
            });
        }
        let mut regex_text = String::with_capacity(pattern.len() + 16);
        let mut placeholders = vec![];
        let mut rest = pattern;
        while let Some(percent) = rest.find('%') {
            regex_text.push_str(&rest[..percent]);
            let at = pattern.len() - rest.len() + percent;
            let after = &rest[percent + 1..];
            let (placeholder, name, remaining) = match after.chars().next() {
                Some('%') => {
                    regex_text.push('%');
                    rest = &after[1..];
                    continue;
                }
                Some('{') => {
                    let close = after
                        .find('}')
                        .ok_or_else(|| error(PatternErrorKind::UnclosedPlaceholder { at }))?;
                    let name = &after[1..close];
                    if name.trim().is_empty() {
                        return Err(error(PatternErrorKind::EmptyPlaceholder { at }));
                    }
                    (Placeholder::from_name(name), name, &after[close + 1..])
                }
                Some(code) => match Placeholder::from_code(code) {
                    Some(placeholder) => (placeholder, &after[..1], &after[1..]),
                    None => {
                        regex_text.push('%');
                        rest = after;
                        continue;
                    }
                },
                None => {
                    regex_text.push('%');
                    rest = after;
                    continue;
                }
            };
            if !remaining.starts_with('(') || remaining.starts_with("(?") {
                return Err(error(PatternErrorKind::MissingSubPattern {
                    name: name.to_owned(),
                }));
            }
            let group_name = format!("__ph{}", placeholders.len());
            regex_text.push_str("(?P<");
            regex_text.push_str(&group_name);
            regex_text.push('>');
            placeholders.push((placeholder, group_name));
            rest = &remaining[1..];
        }
        regex_text.push_str(rest);

        let regex = Regex::new(&regex_text)
            .map_err(|err| error(PatternErrorKind::InvalidRegex(err)))?;
        let captures = placeholders
            .into_iter()
            .filter_map(|(placeholder, group_name)| {
                regex
                    .capture_names()
                    .position(|x| x == Some(group_name.as_str()))
                    .map(|group| Capture { placeholder, group })
            })
            .collect();
        Ok(Self {
            source: pattern.to_owned(),
            regex: Some(regex),
            captures,
        })
    }
    pub fn source(&self) -> &str {
        &self.source
    }
    pub fn regex(&self) -> Option<&Regex> {
        self.regex.as_ref()
    }
    pub fn captures(&self) -> &[Capture] {
        &self.captures
    }
    pub fn is_empty(&self) -> bool {
        self.regex.is_none()
    }
    pub fn has_field(&self, field: &MetadataField) -> bool {
        self.captures.iter().any(|x| &x.placeholder.field() == field)
    }
}
