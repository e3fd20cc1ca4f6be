use log::debug;

use crate::track_data::TrackDataVector;

/// Which imported record each entry takes and which entry each record went to.
struct Assignments {
    from: Vec<Option<usize>>,
    to: Vec<Option<usize>>,
}
impl Assignments {
    fn new(len: usize) -> Self {
        Self {
            from: vec![None; len],
            to: vec![None; len],
        }
    }
    fn assign(&mut self, import: usize, entry: usize) {
        self.to[import] = Some(entry);
        self.from[entry] = Some(import);
    }
    fn apply(self, tracks: &mut TrackDataVector) -> bool {
        let Some(from) = self.from.into_iter().collect::<Option<Vec<_>>>() else {
            return false;
        };
        let old = tracks
            .iter()
            .map(|x| (x.frames.clone(), x.import_duration))
            .collect::<Vec<_>>();
        for (entry, import) in tracks.iter_mut().zip(from) {
            let (frames, duration) = &old[import];
            entry.set_frames(frames.clone(), *duration);
        }
        true
    }
}

/// Reorders imported metadata so that each file gets the record whose
/// duration is closest to its own.
///
/// With `diff_check`, entries already within `max_diff` seconds keep their
/// record. Returns `false` and leaves the tracks unchanged if no complete
/// assignment is found.
pub fn match_with_length(tracks: &mut TrackDataVector, diff_check: bool, max_diff: u32) -> bool {
    let len = tracks.len();
    if len == 0 {
        return true;
    }
    let file_len = tracks.iter().map(|x| x.file_duration()).collect::<Vec<_>>();
    let import_len = tracks.iter().map(|x| x.import_duration).collect::<Vec<_>>();
    let mut assignments = Assignments::new(len);
    if diff_check {
        for (i, track) in tracks.iter().enumerate() {
            if track.time_difference().is_some_and(|diff| diff <= max_diff) {
                assignments.assign(i, i);
            }
        }
    }
    let num_files = file_len.iter().filter(|&&x| x > 0).count();
    let num_imports = import_len.iter().filter(|&&x| x > 0).count();

    if num_files <= num_imports {
        // more imports than files, pick an import for every file
        for entry in 0..len {
            if assignments.from[entry].is_some() {
                continue;
            }
            let best = (0..len)
                .filter(|&import| assignments.to[import].is_none())
                .min_by_key(|&import| file_len[entry].abs_diff(import_len[import]));
            match best {
                Some(import) => assignments.assign(import, entry),
                None => {
                    debug!("No match for track {entry}");
                    return false;
                }
            }
        }
    } else {
        // more files than imports, pick a file for every import
        for import in 0..len {
            if assignments.to[import].is_some() {
                continue;
            }
            let best = (0..len)
                .filter(|&entry| assignments.from[entry].is_none())
                .min_by_key(|&entry| file_len[entry].abs_diff(import_len[import]));
            match best {
                Some(entry) => assignments.assign(import, entry),
                None => {
                    debug!("No match for track {import}");
                    return false;
                }
            }
        }
    }
    assignments.apply(tracks)
}

/// Reorders imported metadata so that the record with track number `n`
/// ends up at position `n - 1`. Records without a usable number fill the
/// remaining positions in order.
pub fn match_with_track(tracks: &mut TrackDataVector) -> bool {
    let len = tracks.len();
    if len == 0 {
        return true;
    }
    let wanted = tracks
        .iter()
        .map(|x| {
            x.frames
                .track()
                .filter(|&nr| nr > 0 && nr as usize <= len)
                .map(|nr| nr as usize - 1)
        })
        .collect::<Vec<_>>();
    let mut assignments = Assignments::new(len);
    for (i, position) in wanted.iter().enumerate() {
        if *position == Some(i) {
            assignments.assign(i, i);
        }
    }
    for (i, position) in wanted.iter().enumerate() {
        if let Some(position) = *position {
            if assignments.to[i].is_none() && assignments.from[position].is_none() {
                assignments.assign(i, position);
            }
        }
    }
    let mut unassigned = 0;
    for entry in 0..len {
        if assignments.from[entry].is_some() {
            continue;
        }
        while unassigned < len && assignments.to[unassigned].is_some() {
            unassigned += 1;
        }
        if unassigned == len {
            debug!("No track assigned to {entry}");
            return false;
        }
        assignments.assign(unassigned, entry);
    }
    assignments.apply(tracks)
}
