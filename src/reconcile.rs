use log::debug;

use crate::{
    metadata::FrameCollection,
    track_data::{TrackData, TrackDataVector},
};

#[derive(Debug, Clone, Copy)]
pub struct ReconcileOptions {
    /// Append records beyond the last destination entry as virtual entries.
    pub allow_growth: bool,
}
impl Default for ReconcileOptions {
    fn default() -> Self {
        Self { allow_growth: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileState {
    Aligning,
    ExtractedExhausted,
    DestinationExhausted,
    Done,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub assigned: usize,
    pub appended: usize,
    pub cleared: usize,
    pub removed: usize,
    pub dropped: usize,
}

/// Merges extracted records into the destination by position.
///
/// Each record is layered over `header` (record fields win) and written to the
/// next enabled destination entry. Records left over when the destination runs
/// out become virtual entries. Destination entries left over when the records
/// run out are removed if they have no file duration and cleared otherwise.
/// Disabled entries are never touched.
pub fn reconcile(
    destination: &mut TrackDataVector,
    header: Option<&FrameCollection>,
    records: &[FrameCollection],
    options: ReconcileOptions,
) -> ReconcileReport {
    let mut report = ReconcileReport::default();
    let mut dest = 0;
    let mut extracted = 0;
    let mut state = ReconcileState::Aligning;
    while state != ReconcileState::Done {
        state = match state {
            ReconcileState::Aligning => {
                while dest < destination.len() && !destination[dest].enabled {
                    dest += 1;
                }
                match (extracted < records.len(), dest < destination.len()) {
                    (false, false) => ReconcileState::Done,
                    (false, true) => ReconcileState::ExtractedExhausted,
                    (true, false) => ReconcileState::DestinationExhausted,
                    (true, true) => {
                        let frames = layer(header, &records[extracted]);
                        let duration = frames.duration().unwrap_or(0);
                        destination[dest].set_frames(frames, duration);
                        report.assigned += 1;
                        dest += 1;
                        extracted += 1;
                        ReconcileState::Aligning
                    }
                }
            }
            ReconcileState::DestinationExhausted => {
                for record in &records[extracted..] {
                    if options.allow_growth {
                        let frames = layer(header, record);
                        let duration = frames.duration().unwrap_or(0);
                        destination.push(TrackData::virtual_entry(frames, duration));
                        report.appended += 1;
                    } else {
                        report.dropped += 1;
                    }
                }
                ReconcileState::Done
            }
            ReconcileState::ExtractedExhausted => {
                while dest < destination.len() {
                    if !destination[dest].enabled {
                        dest += 1;
                    } else if destination[dest].file_duration() == 0 {
                        destination.remove(dest);
                        report.removed += 1;
                    } else {
                        destination[dest].set_frames(FrameCollection::new(), 0);
                        report.cleared += 1;
                        dest += 1;
                    }
                }
                ReconcileState::Done
            }
            ReconcileState::Done => ReconcileState::Done,
        };
    }
    debug!("Reconciled {} records: {:?}", records.len(), report);
    report
}

/// Gives every enabled entry the album fields, for sources that have no track list.
pub fn apply_header(destination: &mut TrackDataVector, header: &FrameCollection) {
    for entry in destination.iter_mut().filter(|x| x.enabled) {
        entry.frames = header.clone();
    }
}

/// Parallel list of flags for entries whose file and import durations differ
/// by more than `tolerance` seconds. Entries missing either duration are never flagged.
pub fn duration_mismatches(destination: &[TrackData], tolerance: u32) -> Vec<bool> {
    destination
        .iter()
        .map(|x| x.time_difference().is_some_and(|diff| diff > tolerance))
        .collect()
}

fn layer(header: Option<&FrameCollection>, record: &FrameCollection) -> FrameCollection {
    let mut frames = record.clone();
    if let Some(header) = header {
        frames.merge(header, true);
    }
    frames
}
