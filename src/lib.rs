pub mod config;
pub mod extract;
pub mod genres;
pub mod matcher;
pub mod metadata;
pub mod parser;
pub mod pattern;
pub mod reconcile;
pub mod text_import;
pub mod track_data;
