//! Playlist document loader.
//!
//! Parses the TOML playlist document into a [`Catalog`]. The document has
//! one reserved section holding every track record and any number of
//! playlist sections:
//!
//! ```toml
//! [musics]
//! musics = [
//!     [1, "battlefield.ogg", -1, -1],
//!     [2, "final_destination.ogg", 0, 2646000, 441000, 2205000],
//! ]
//!
//! [battlefield]
//! musics = [1, 2]
//! target_ids = [0x27, 0x28]
//! ```
//!
//! Loading is all-or-nothing: the first invalid record aborts the load.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use toml::Value;
use tracing::{debug, info, warn};

use crate::error::{DaemonError, ErrorContext, Result};
use crate::types::{LoopRange, PlayRange, PlaylistGroup, TargetId, Track, TrackId, DEFAULT_OFFSET};

use super::path::{check_track_file, find_disallowed_byte, resolve, FileProblem};
use super::Catalog;

/// Reserved section holding the track records.
pub const TRACKS_SECTION: &str = "musics";

/// Field of [`TRACKS_SECTION`] holding the array of track records.
pub const TRACKS_FIELD: &str = "musics";

/// Playlist field listing the track ids to draw from.
pub const POOL_FIELD: &str = "musics";

/// Playlist field listing the routed target ids.
pub const TARGETS_FIELD: &str = "target_ids";

/// Maximum number of elements in a track record.
const MAX_RECORD_LEN: usize = 6;

/// Loads a catalog from document text, resolving relative track paths
/// against the current working directory.
pub fn load(text: &str) -> Result<Catalog> {
    load_with_base(text, None)
}

/// Loads a catalog from a document on disk, resolving relative track paths
/// against the document's directory.
pub fn load_file(path: &Path) -> Result<Catalog> {
    info!("Loading playlist document {}", path.display());
    let text =
        std::fs::read_to_string(path).map_err(|e| DaemonError::config_read_failed(path, e))?;
    load_with_base(&text, path.parent())
}

/// Loads a catalog from document text with an explicit base directory.
pub fn load_with_base(text: &str, base_dir: Option<&Path>) -> Result<Catalog> {
    let table: toml::Table = toml::from_str(text).map_err(DaemonError::config_syntax)?;

    let tracks = load_tracks(&table, base_dir)?;
    info!("Found {} musics", tracks.len());

    let groups = load_groups(&table, &tracks)?;

    let catalog = Catalog::from_parts(tracks, groups);
    info!(
        "Catalog ready: {} musics, {} playlists, {} targets, fingerprint {}",
        catalog.track_count(),
        catalog.group_count(),
        catalog.target_count(),
        catalog.fingerprint()
    );
    Ok(catalog)
}

fn load_tracks(table: &toml::Table, base_dir: Option<&Path>) -> Result<BTreeMap<TrackId, Track>> {
    let section = table
        .get(TRACKS_SECTION)
        .ok_or_else(|| DaemonError::missing_field(TRACKS_SECTION, TRACKS_FIELD))?;
    let section = section.as_table().ok_or_else(|| {
        DaemonError::malformed(ErrorContext::new(TRACKS_SECTION, "", section), "a table")
    })?;

    let records = section
        .get(TRACKS_FIELD)
        .ok_or_else(|| DaemonError::missing_field(TRACKS_SECTION, TRACKS_FIELD))?;
    let records = records.as_array().ok_or_else(|| {
        DaemonError::malformed(
            ErrorContext::new(TRACKS_SECTION, TRACKS_FIELD, records),
            "an array of track records",
        )
    })?;

    let mut tracks = BTreeMap::new();
    for (index, record) in records.iter().enumerate() {
        let track = parse_track(index, record, base_dir)?;

        if tracks.contains_key(&track.track_id) {
            return Err(DaemonError::duplicate_track_id(
                ErrorContext::new(
                    TRACKS_SECTION,
                    format!("{}[{}].id", TRACKS_FIELD, index),
                    track.track_id,
                ),
                track.track_id,
            ));
        }

        debug!("Loaded music {}", track);
        tracks.insert(track.track_id, track);
    }
    Ok(tracks)
}

/// Parses one `[id, path, start, end, (loop_begin, loop_end)?]` record.
///
/// Checks run in a fixed order so that the first failure reported is
/// stable: field types, path characters, the file itself, play offsets,
/// then loop offsets.
fn parse_track(index: usize, record: &Value, base_dir: Option<&Path>) -> Result<Track> {
    let label = format!("{}[{}]", TRACKS_FIELD, index);
    let ctx = |field: &str, value: &dyn std::fmt::Display| {
        ErrorContext::new(TRACKS_SECTION, format!("{}.{}", label, field), value)
    };

    let fields = record.as_array().ok_or_else(|| {
        DaemonError::malformed(
            ErrorContext::new(TRACKS_SECTION, label.clone(), record),
            "an array record",
        )
    })?;
    if fields.len() > MAX_RECORD_LEN {
        return Err(DaemonError::malformed(
            ErrorContext::new(TRACKS_SECTION, label.clone(), record),
            "at most 6 elements",
        ));
    }

    let id_value = required(fields, 0, &label, "id")?;
    let track_id = as_id(id_value).ok_or_else(|| {
        DaemonError::invalid_type(ctx("id", id_value), "a non-negative integer")
    })?;

    let path_value = required(fields, 1, &label, "path")?;
    let raw_path = path_value
        .as_str()
        .ok_or_else(|| DaemonError::invalid_type(ctx("path", path_value), "a string"))?;

    let start_value = required(fields, 2, &label, "start")?;
    let start = start_value
        .as_integer()
        .ok_or_else(|| DaemonError::invalid_type(ctx("start", start_value), "an integer"))?;

    let end_value = required(fields, 3, &label, "end")?;
    let end = end_value
        .as_integer()
        .ok_or_else(|| DaemonError::invalid_type(ctx("end", end_value), "an integer"))?;

    let loop_begin = optional_integer(fields.get(4), || ctx("loop_begin", &fields[4]))?;
    let loop_end = optional_integer(fields.get(5), || ctx("loop_end", &fields[5]))?;

    if let Some(byte) = find_disallowed_byte(raw_path) {
        return Err(DaemonError::invalid_path_character(ctx("path", &raw_path), byte));
    }

    let file_path = resolve(base_dir, raw_path);
    let path_ctx = || ctx("path", &file_path.display());
    match check_track_file(&file_path) {
        Ok(()) => {}
        Err(FileProblem::Missing) => return Err(DaemonError::file_not_found(path_ctx())),
        Err(FileProblem::Symlink) => return Err(DaemonError::symlink_not_supported(path_ctx())),
        Err(FileProblem::NotRegular) => return Err(DaemonError::not_regular_file(path_ctx())),
        Err(FileProblem::Inaccessible(e)) => {
            let err = DaemonError::file_not_found(path_ctx());
            return Err(DaemonError {
                source: Some(Box::new(e)),
                ..err
            });
        }
    }

    // -1 keeps the default; anything else must be a real frame offset.
    if start != DEFAULT_OFFSET && start < 0 {
        return Err(DaemonError::invalid_offset(ctx("start", &start)));
    }
    if end != DEFAULT_OFFSET && end < 0 {
        return Err(DaemonError::invalid_offset(ctx("end", &end)));
    }

    let loop_range = match (loop_begin, loop_end) {
        (None, None) => None,
        (Some(begin), Some(end)) => {
            if begin < 0 {
                return Err(DaemonError::invalid_offset(ctx("loop_begin", &begin)));
            }
            if end < 0 {
                return Err(DaemonError::invalid_offset(ctx("loop_end", &end)));
            }
            if end <= begin {
                return Err(DaemonError::inverted_loop_offsets(
                    ctx("loop_end", &end),
                    begin,
                    end,
                ));
            }
            Some(LoopRange {
                begin: begin as u64,
                end: end as u64,
            })
        }
        (Some(begin), None) => {
            return Err(DaemonError::incomplete_loop_pair(ctx("loop_begin", &begin)))
        }
        (None, Some(end)) => return Err(DaemonError::incomplete_loop_pair(ctx("loop_end", &end))),
    };

    Ok(Track {
        track_id,
        file_path,
        source_path: raw_path.to_string(),
        play_range: PlayRange::new(start, end),
        loop_range,
    })
}

fn required<'a>(fields: &'a [Value], position: usize, label: &str, field: &str) -> Result<&'a Value> {
    fields.get(position).ok_or_else(|| {
        DaemonError::missing_field(TRACKS_SECTION, &format!("{}.{}", label, field))
    })
}

fn load_groups(
    table: &toml::Table,
    tracks: &BTreeMap<TrackId, Track>,
) -> Result<Vec<PlaylistGroup>> {
    let mut groups: Vec<PlaylistGroup> = Vec::new();
    // target id -> name of the playlist that first routed it
    let mut routed: HashMap<TargetId, String> = HashMap::new();

    for (name, node) in table {
        if name == TRACKS_SECTION {
            continue;
        }
        info!("Found playlist: {}", name);

        let section = node.as_table().ok_or_else(|| {
            DaemonError::malformed(ErrorContext::new(name.as_str(), "", node), "a table")
        })?;

        let pool = id_list(name, section, POOL_FIELD)?;
        let targets = id_list(name, section, TARGETS_FIELD)?;

        let mut group = PlaylistGroup::new(name.as_str());

        for target_id in targets {
            if let Some(owner) = routed.get(&target_id) {
                return Err(DaemonError::duplicate_target_id(
                    ErrorContext::new(name.as_str(), TARGETS_FIELD, target_id),
                    target_id,
                    owner,
                ));
            }
            routed.insert(target_id, name.clone());
            group.target_ids.insert(target_id);
        }

        for (index, track_id) in pool.iter().enumerate() {
            if !tracks.contains_key(track_id) {
                return Err(DaemonError::dangling_track_reference(
                    ErrorContext::new(
                        name.as_str(),
                        format!("{}[{}]", POOL_FIELD, index),
                        track_id,
                    ),
                    *track_id,
                ));
            }
        }
        group.track_ids = pool;

        if group.is_empty() {
            warn!("Playlist {} has no musics; its targets will never play", name);
        }
        if group.target_ids.is_empty() {
            warn!("Playlist {} has no target ids; it is unreachable", name);
        }

        info!(
            "Loaded playlist {} ({} musics, {} targets)",
            name,
            group.track_ids.len(),
            group.target_ids.len()
        );
        groups.push(group);
    }

    Ok(groups)
}

/// Reads a required array of non-negative integers from a playlist section.
fn id_list(section_name: &str, section: &toml::Table, field: &str) -> Result<Vec<u64>> {
    let value = section
        .get(field)
        .ok_or_else(|| DaemonError::missing_field(section_name, field))?;
    let items = value.as_array().ok_or_else(|| {
        DaemonError::invalid_type(
            ErrorContext::new(section_name, field, value),
            "an array of integers",
        )
    })?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            as_id(item).ok_or_else(|| {
                DaemonError::invalid_type(
                    ErrorContext::new(section_name, format!("{}[{}]", field, index), item),
                    "a non-negative integer",
                )
            })
        })
        .collect()
}

fn as_id(value: &Value) -> Option<u64> {
    value.as_integer().and_then(|v| u64::try_from(v).ok())
}

fn optional_integer(
    value: Option<&Value>,
    ctx: impl FnOnce() -> ErrorContext,
) -> Result<Option<i64>> {
    match value {
        None => Ok(None),
        Some(v) => v
            .as_integer()
            .map(Some)
            .ok_or_else(|| DaemonError::invalid_type(ctx(), "an integer")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::test_support::Fixture;

    fn single_track(record: &str) -> String {
        format!("[musics]\nmusics = [{}]\n", record)
    }

    #[test]
    fn loads_tracks_and_playlists() {
        let fx = Fixture::new(&["a.ogg", "b.ogg", "c.ogg"]);
        let catalog = fx
            .load(
                r#"
                [musics]
                musics = [
                    [1, "a.ogg", -1, -1],
                    [2, "b.ogg", 0, 1000, 100, 900],
                    [3, "c.ogg", 10, -1],
                ]

                [battlefield]
                musics = [1, 2]
                target_ids = [0x27, 0x28]

                [menu]
                musics = [3]
                target_ids = [0xa]
                "#,
            )
            .unwrap();

        assert_eq!(catalog.track_count(), 3);
        assert_eq!(catalog.group_count(), 2);
        assert_eq!(catalog.target_count(), 3);

        let b = catalog.track(2).unwrap();
        assert_eq!(b.play_range, PlayRange::new(0, 1000));
        assert_eq!(b.loop_range, Some(LoopRange { begin: 100, end: 900 }));
        assert_eq!(b.file_path, fx.dir.path().join("b.ogg"));

        let group = catalog.group_for_target(0x28).unwrap();
        assert_eq!(group.name, "battlefield");
        assert_eq!(group.track_ids, vec![1, 2]);
    }

    #[test]
    fn playlists_keep_document_order() {
        let fx = Fixture::new(&["a.ogg"]);
        let catalog = fx
            .load(
                r#"
                [zeta]
                musics = [1]
                target_ids = [1]

                [musics]
                musics = [[1, "a.ogg", -1, -1]]

                [alpha]
                musics = [1]
                target_ids = [2]
                "#,
            )
            .unwrap();

        let names: Vec<&str> = catalog.groups().iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }

    #[test]
    fn empty_pool_and_no_playlists_are_allowed() {
        let fx = Fixture::new(&["a.ogg"]);
        let catalog = fx
            .load(
                r#"
                [musics]
                musics = [[1, "a.ogg", -1, -1]]

                [silent]
                musics = []
                target_ids = [5]
                "#,
            )
            .unwrap();
        assert!(catalog.group_for_target(5).unwrap().is_empty());

        let catalog = fx.load("[musics]\nmusics = []\n").unwrap();
        assert_eq!(catalog.track_count(), 0);
        assert_eq!(catalog.group_count(), 0);
    }

    #[test]
    fn syntax_error() {
        let fx = Fixture::new(&[]);
        let err = fx.load("[musics\n").unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigSyntax);
    }

    #[test]
    fn missing_tracks_section() {
        let fx = Fixture::new(&[]);
        let err = fx.load("[g]\nmusics = []\ntarget_ids = []\n").unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingField);
        assert_eq!(err.context.unwrap().section, "musics");
    }

    #[test]
    fn record_must_be_array() {
        let fx = Fixture::new(&[]);
        let err = fx.load(&single_track("1")).unwrap_err();
        assert_eq!(err.code, ErrorCode::MalformedSection);
    }

    #[test]
    fn record_too_long() {
        let fx = Fixture::new(&["a.ogg"]);
        let err = fx
            .load(&single_track(r#"[1, "a.ogg", -1, -1, 0, 10, 20]"#))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::MalformedSection);
    }

    #[test]
    fn missing_record_fields() {
        let fx = Fixture::new(&["a.ogg"]);
        let err = fx.load(&single_track(r#"[1, "a.ogg", -1]"#)).unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingField);
        assert_eq!(err.context.unwrap().field, "musics[0].end");
    }

    #[test]
    fn mistyped_record_fields() {
        let fx = Fixture::new(&["a.ogg"]);

        let err = fx.load(&single_track(r#"["1", "a.ogg", -1, -1]"#)).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFieldType);
        assert_eq!(err.context.unwrap().field, "musics[0].id");

        let err = fx.load(&single_track("[-3, \"a.ogg\", -1, -1]")).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFieldType);

        let err = fx.load(&single_track("[1, 7, -1, -1]")).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFieldType);
        assert_eq!(err.context.unwrap().field, "musics[0].path");

        let err = fx.load(&single_track(r#"[1, "a.ogg", 1.5, -1]"#)).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFieldType);

        let err = fx
            .load(&single_track(r#"[1, "a.ogg", -1, -1, "x", 10]"#))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFieldType);
        assert_eq!(err.context.unwrap().field, "musics[0].loop_begin");
    }

    #[test]
    fn disallowed_path_character() {
        let fx = Fixture::new(&[]);
        let err = fx
            .load(&single_track(r#"[1, "bad\tname.ogg", -1, -1]"#))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidPathCharacter);
    }

    #[test]
    fn missing_file() {
        let fx = Fixture::new(&[]);
        let err = fx.load(&single_track(r#"[1, "gone.ogg", -1, -1]"#)).unwrap_err();
        assert_eq!(err.code, ErrorCode::FileNotFound);
        assert!(err.context.unwrap().value.ends_with("gone.ogg"));
    }

    #[test]
    fn directory_is_not_a_track() {
        let fx = Fixture::new(&[]);
        std::fs::create_dir(fx.dir.path().join("folder")).unwrap();
        let err = fx.load(&single_track(r#"[1, "folder", -1, -1]"#)).unwrap_err();
        assert_eq!(err.code, ErrorCode::NotRegularFile);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_track_rejected() {
        let fx = Fixture::new(&["a.ogg"]);
        std::os::unix::fs::symlink(fx.dir.path().join("a.ogg"), fx.dir.path().join("l.ogg"))
            .unwrap();
        let err = fx.load(&single_track(r#"[1, "l.ogg", -1, -1]"#)).unwrap_err();
        assert_eq!(err.code, ErrorCode::SymlinkNotSupported);
    }

    #[test]
    fn negative_offsets_other_than_default() {
        let fx = Fixture::new(&["a.ogg"]);

        let err = fx.load(&single_track(r#"[1, "a.ogg", -1, -5]"#)).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidOffset);
        assert_eq!(err.context.unwrap().field, "musics[0].end");

        let err = fx.load(&single_track(r#"[1, "a.ogg", -2, -1]"#)).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidOffset);
        assert_eq!(err.context.unwrap().field, "musics[0].start");

        let err = fx
            .load(&single_track(r#"[1, "a.ogg", -1, -1, -4, 10]"#))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidOffset);
    }

    #[test]
    fn inverted_play_range_is_left_to_playback() {
        let fx = Fixture::new(&["a.ogg"]);
        let catalog = fx.load(&single_track(r#"[1, "a.ogg", 500, 100]"#)).unwrap();
        assert_eq!(catalog.track(1).unwrap().play_range, PlayRange::new(500, 100));
    }

    #[test]
    fn incomplete_loop_pair() {
        let fx = Fixture::new(&["a.ogg"]);
        let err = fx.load(&single_track(r#"[1, "a.ogg", -1, -1, 50]"#)).unwrap_err();
        assert_eq!(err.code, ErrorCode::IncompleteLoopPair);
    }

    #[test]
    fn inverted_and_equal_loop_offsets() {
        let fx = Fixture::new(&["a.ogg"]);
        let err = fx
            .load(&single_track(r#"[1, "a.ogg", -1, -1, 50, 10]"#))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvertedLoopOffsets);

        let err = fx
            .load(&single_track(r#"[1, "a.ogg", -1, -1, 50, 50]"#))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvertedLoopOffsets);
    }

    #[test]
    fn duplicate_track_id() {
        let fx = Fixture::new(&["a.ogg", "b.ogg"]);
        let err = fx
            .load(
                r#"
                [musics]
                musics = [[7, "a.ogg", -1, -1], [7, "b.ogg", -1, -1]]
                "#,
            )
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateTrackId);
        let ctx = err.context.unwrap();
        assert_eq!(ctx.value, "7");
        assert_eq!(ctx.field, "musics[1].id");
    }

    #[test]
    fn duplicate_target_within_one_playlist() {
        let fx = Fixture::new(&["a.ogg"]);
        let err = fx
            .load(
                r#"
                [musics]
                musics = [[1, "a.ogg", -1, -1]]

                [g]
                musics = [1]
                target_ids = [3, 3]
                "#,
            )
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateTargetId);
    }

    #[test]
    fn playlist_must_be_table() {
        let fx = Fixture::new(&["a.ogg"]);
        let err = fx
            .load("stray = 1\n[musics]\nmusics = [[1, \"a.ogg\", -1, -1]]\n")
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::MalformedSection);
        assert_eq!(err.context.unwrap().section, "stray");
    }

    #[test]
    fn playlist_fields_required_and_typed() {
        let fx = Fixture::new(&["a.ogg"]);
        let header = "[musics]\nmusics = [[1, \"a.ogg\", -1, -1]]\n";

        let err = fx.load(&format!("{}[g]\nmusics = [1]\n", header)).unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingField);
        assert_eq!(err.context.unwrap().field, "target_ids");

        let err = fx
            .load(&format!("{}[g]\ntarget_ids = [1]\n", header))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingField);
        assert_eq!(err.context.unwrap().field, "musics");

        let err = fx
            .load(&format!("{}[g]\nmusics = 1\ntarget_ids = [1]\n", header))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFieldType);

        let err = fx
            .load(&format!("{}[g]\nmusics = [1]\ntarget_ids = [\"x\"]\n", header))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFieldType);
        assert_eq!(err.context.unwrap().field, "target_ids[0]");
    }

    #[test]
    fn dangling_track_reference() {
        let fx = Fixture::new(&["a.ogg"]);
        let err = fx
            .load(
                r#"
                [musics]
                musics = [[1, "a.ogg", -1, -1]]

                [g]
                musics = [1, 42]
                target_ids = [9]
                "#,
            )
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DanglingTrackReference);
        let ctx = err.context.unwrap();
        assert_eq!(ctx.section, "g");
        assert_eq!(ctx.field, "musics[1]");
        assert_eq!(ctx.value, "42");
    }

    #[test]
    fn load_file_resolves_relative_to_document() {
        let fx = Fixture::new(&["a.ogg"]);
        let doc = fx.dir.path().join("config.toml");
        std::fs::write(
            &doc,
            "[musics]\nmusics = [[1, \"a.ogg\", -1, -1]]\n[g]\nmusics = [1]\ntarget_ids = [1]\n",
        )
        .unwrap();

        let catalog = load_file(&doc).unwrap();
        assert_eq!(catalog.track(1).unwrap().file_path, fx.dir.path().join("a.ogg"));
    }

    #[test]
    fn load_file_missing_document() {
        let fx = Fixture::new(&[]);
        let err = load_file(&fx.dir.path().join("none.toml")).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigReadFailed);
        assert!(std::error::Error::source(&err).is_some());
    }
}
