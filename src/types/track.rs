//! Track type representing one playable audio file.
//!
//! A Track is immutable once loaded. Its play range keeps the `-1` "use
//! default" sentinels exactly as written in the playlist document; they are
//! resolved against the decoded length in [`PlayRange::resolve`] and nowhere
//! else.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::error::{DaemonError, Result};

/// Globally unique track identifier, stable across runs.
pub type TrackId = u64;

/// External identifier routed to a playlist (e.g. the in-game music id).
pub type TargetId = u64;

/// Offset value meaning "start of track" or "end of track".
pub const DEFAULT_OFFSET: i64 = -1;

/// Parses a track or target id written as decimal or `0x`-prefixed hex.
pub fn parse_id(text: &str) -> Option<u64> {
    let text = text.trim();
    match text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

/// Playback window in audio frames, `-1` on either side meaning default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayRange {
    pub start: i64,
    pub end: i64,
}

impl PlayRange {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// The whole track.
    pub fn full() -> Self {
        Self::new(DEFAULT_OFFSET, DEFAULT_OFFSET)
    }

    /// Returns true if neither side overrides the default.
    pub fn is_full(&self) -> bool {
        self.start == DEFAULT_OFFSET && self.end == DEFAULT_OFFSET
    }

    /// Resolves the sentinels against the decoded track length.
    ///
    /// A default start becomes frame 0 and a default end becomes
    /// `total_frames`. The resolved window must be non-empty and must not
    /// run past the end of the track.
    pub fn resolve(&self, track_id: TrackId, total_frames: u64) -> Result<ResolvedRange> {
        let start = u64::try_from(self.start).unwrap_or(0);
        let end = if self.end < 0 {
            total_frames
        } else {
            self.end as u64
        };

        if end <= start || end > total_frames {
            return Err(DaemonError::invalid_play_range(
                track_id,
                start,
                end,
                total_frames,
            ));
        }

        Ok(ResolvedRange { start, end })
    }
}

impl Default for PlayRange {
    fn default() -> Self {
        Self::full()
    }
}

/// Concrete `[start, end)` frame window produced by [`PlayRange::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRange {
    pub start: u64,
    pub end: u64,
}

impl ResolvedRange {
    /// Number of frames in the window.
    pub fn frames(&self) -> u64 {
        self.end - self.start
    }
}

/// Loop points in audio frames. `end > begin` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoopRange {
    pub begin: u64,
    pub end: u64,
}

/// One playable audio entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Unique across the whole catalog.
    pub track_id: TrackId,

    /// Existing, non-symlink regular file, checked when the catalog was built.
    pub file_path: PathBuf,

    /// The path exactly as written in the playlist document, before
    /// resolution against a base directory.
    pub source_path: String,

    /// Playback window with sentinels preserved.
    pub play_range: PlayRange,

    /// Optional loop points.
    pub loop_range: Option<LoopRange>,
}

impl Track {
    /// Returns the descriptor handed to the playback collaborator.
    pub fn descriptor(&self) -> TrackDescriptor {
        TrackDescriptor {
            track_id: self.track_id,
            path: self.file_path.to_string_lossy().into_owned(),
            start_offset: self.play_range.start,
            end_offset: self.play_range.end,
            loop_begin: self.loop_range.map(|l| l.begin),
            loop_end: self.loop_range.map(|l| l.end),
        }
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "id={:#x}, file='{}', range=({}, {})",
            self.track_id,
            self.file_path.display(),
            self.play_range.start,
            self.play_range.end
        )?;
        match self.loop_range {
            Some(l) => write!(f, ", loop=({}, {})", l.begin, l.end),
            None => write!(f, ", loop=none"),
        }
    }
}

/// Flat, serializable view of a selected track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackDescriptor {
    pub track_id: TrackId,
    pub path: String,
    /// `-1` means start of track.
    pub start_offset: i64,
    /// `-1` means end of track.
    pub end_offset: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loop_begin: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loop_end: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn id_parsing() {
        assert_eq!(parse_id("16"), Some(16));
        assert_eq!(parse_id("0x10"), Some(16));
        assert_eq!(parse_id("0XFFFF"), Some(0xffff));
        assert_eq!(parse_id(" 7"), Some(7));
        assert_eq!(parse_id("0x"), None);
        assert_eq!(parse_id("-3"), None);
        assert_eq!(parse_id("ten"), None);
    }

    fn make_track(play_range: PlayRange, loop_range: Option<LoopRange>) -> Track {
        Track {
            track_id: 0x10,
            file_path: PathBuf::from("/music/stage.ogg"),
            source_path: "stage.ogg".to_string(),
            play_range,
            loop_range,
        }
    }

    #[test]
    fn resolve_defaults_to_whole_track() {
        let range = PlayRange::full().resolve(1, 44_100).unwrap();
        assert_eq!(range, ResolvedRange { start: 0, end: 44_100 });
        assert_eq!(range.frames(), 44_100);
    }

    #[test]
    fn resolve_keeps_explicit_offsets() {
        let range = PlayRange::new(100, 200).resolve(1, 1000).unwrap();
        assert_eq!(range, ResolvedRange { start: 100, end: 200 });
    }

    #[test]
    fn resolve_mixed_sentinels() {
        assert_eq!(
            PlayRange::new(-1, 500).resolve(1, 1000).unwrap(),
            ResolvedRange { start: 0, end: 500 }
        );
        assert_eq!(
            PlayRange::new(500, -1).resolve(1, 1000).unwrap(),
            ResolvedRange { start: 500, end: 1000 }
        );
    }

    #[test]
    fn resolve_rejects_empty_window() {
        let err = PlayRange::new(200, 200).resolve(1, 1000).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidPlayRange);

        let err = PlayRange::new(300, 200).resolve(1, 1000).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidPlayRange);

        // start past the end of a short track
        let err = PlayRange::new(5000, -1).resolve(1, 1000).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidPlayRange);
    }

    #[test]
    fn resolve_rejects_end_past_track_length() {
        let err = PlayRange::new(0, 2000).resolve(1, 1000).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidPlayRange);
    }

    #[test]
    fn descriptor_preserves_sentinels() {
        let track = make_track(PlayRange::new(-1, 900), None);
        let desc = track.descriptor();
        assert_eq!(desc.start_offset, -1);
        assert_eq!(desc.end_offset, 900);
        assert_eq!(desc.loop_begin, None);

        let json = serde_json::to_string(&desc).unwrap();
        assert!(!json.contains("loop_begin"));
    }

    #[test]
    fn descriptor_includes_loop_points() {
        let track = make_track(PlayRange::full(), Some(LoopRange { begin: 10, end: 50 }));
        let desc = track.descriptor();
        assert_eq!(desc.loop_begin, Some(10));
        assert_eq!(desc.loop_end, Some(50));
        assert_eq!(desc.path, "/music/stage.ogg");
    }

    #[test]
    fn display_format() {
        let track = make_track(PlayRange::full(), None);
        assert_eq!(
            track.to_string(),
            "id=0x10, file='/music/stage.ogg', range=(-1, -1), loop=none"
        );
    }
}
