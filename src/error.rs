//! Error types for the bgm-daemon.
//!
//! Every failure while building a catalog is reported as a [`DaemonError`]
//! carrying an [`ErrorCode`] and, where one exists, the section, field and
//! received value that caused it.

use std::fmt;

/// Error codes reported when a playlist document is rejected.
///
/// These codes are also forwarded in JSON-RPC error responses so that
/// clients can programmatically handle specific error conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The playlist document could not be read from disk.
    ConfigReadFailed,

    /// The playlist document is not valid TOML.
    ConfigSyntax,

    /// A section or record does not have the expected shape.
    /// Trigger: a playlist section that is not a table, a track record that
    /// is not an array, or a record with too many elements.
    MalformedSection,

    /// A required field is absent.
    MissingField,

    /// A field is present but has the wrong type or sign.
    InvalidFieldType,

    /// A track path contains a character we refuse to hand to the OS.
    InvalidPathCharacter,

    /// A track path does not exist.
    FileNotFound,

    /// A track path exists but is not a regular file.
    NotRegularFile,

    /// A track path is a symbolic link.
    SymlinkNotSupported,

    /// A play-range offset is negative and not the `-1` default sentinel,
    /// or a loop offset is negative.
    InvalidOffset,

    /// Only one of the two loop offsets was given.
    IncompleteLoopPair,

    /// Loop end is not after loop begin.
    InvertedLoopOffsets,

    /// Two track records share an id.
    DuplicateTrackId,

    /// Two playlists (or one playlist twice) route the same target id.
    DuplicateTargetId,

    /// A playlist references a track id with no track record.
    DanglingTrackReference,

    /// A play range is empty or exceeds the decoded track length.
    /// Trigger: only raised at the playback boundary, never while loading.
    InvalidPlayRange,
}

impl ErrorCode {
    /// Returns the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigReadFailed => "CONFIG_READ_FAILED",
            ErrorCode::ConfigSyntax => "CONFIG_SYNTAX",
            ErrorCode::MalformedSection => "MALFORMED_SECTION",
            ErrorCode::MissingField => "MISSING_FIELD",
            ErrorCode::InvalidFieldType => "INVALID_FIELD_TYPE",
            ErrorCode::InvalidPathCharacter => "INVALID_PATH_CHARACTER",
            ErrorCode::FileNotFound => "FILE_NOT_FOUND",
            ErrorCode::NotRegularFile => "NOT_REGULAR_FILE",
            ErrorCode::SymlinkNotSupported => "SYMLINK_NOT_SUPPORTED",
            ErrorCode::InvalidOffset => "INVALID_OFFSET",
            ErrorCode::IncompleteLoopPair => "INCOMPLETE_LOOP_PAIR",
            ErrorCode::InvertedLoopOffsets => "INVERTED_LOOP_OFFSETS",
            ErrorCode::DuplicateTrackId => "DUPLICATE_TRACK_ID",
            ErrorCode::DuplicateTargetId => "DUPLICATE_TARGET_ID",
            ErrorCode::DanglingTrackReference => "DANGLING_TRACK_REFERENCE",
            ErrorCode::InvalidPlayRange => "INVALID_PLAY_RANGE",
        }
    }

    /// Returns a human-readable description of the error.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::ConfigReadFailed => "Playlist document could not be read",
            ErrorCode::ConfigSyntax => "Playlist document is not valid TOML",
            ErrorCode::MalformedSection => "Section or record has an unexpected shape",
            ErrorCode::MissingField => "Required field is missing",
            ErrorCode::InvalidFieldType => "Field has the wrong type",
            ErrorCode::InvalidPathCharacter => "Track path contains a disallowed character",
            ErrorCode::FileNotFound => "Track file does not exist",
            ErrorCode::NotRegularFile => "Track path is not a regular file",
            ErrorCode::SymlinkNotSupported => "Track path is a symbolic link",
            ErrorCode::InvalidOffset => "Offset is negative",
            ErrorCode::IncompleteLoopPair => "Only one loop offset was given",
            ErrorCode::InvertedLoopOffsets => "Loop end offset is not after loop begin",
            ErrorCode::DuplicateTrackId => "Track id is declared twice",
            ErrorCode::DuplicateTargetId => "Target id is routed by more than one playlist",
            ErrorCode::DanglingTrackReference => "Playlist references an unknown track id",
            ErrorCode::InvalidPlayRange => "Play range is empty or out of bounds",
        }
    }

    /// Returns a recovery hint suggesting how to resolve this error.
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            ErrorCode::ConfigReadFailed => {
                "Check that the path passed with --config (or BGM_CONFIG_PATH) exists and is readable"
            }
            ErrorCode::ConfigSyntax => "Fix the TOML syntax error at the reported location",
            ErrorCode::MalformedSection => {
                "Playlists are tables with `musics` and `target_ids` arrays; track records are \
                 arrays of [id, path, start, end] or [id, path, start, end, loop_begin, loop_end]"
            }
            ErrorCode::MissingField => {
                "Add the missing field; every playlist needs both `musics` and `target_ids`"
            }
            ErrorCode::InvalidFieldType => {
                "Ids and offsets are integers (ids non-negative), paths are strings"
            }
            ErrorCode::InvalidPathCharacter => {
                "Rename the file using printable ASCII characters only"
            }
            ErrorCode::FileNotFound => {
                "Relative paths are resolved against the playlist document's directory"
            }
            ErrorCode::NotRegularFile => "Point the record at an audio file, not a directory",
            ErrorCode::SymlinkNotSupported => "Reference the link target directly",
            ErrorCode::InvalidOffset => {
                "Use -1 for the default start/end, otherwise a frame offset >= 0"
            }
            ErrorCode::IncompleteLoopPair => "Give both loop_begin and loop_end, or neither",
            ErrorCode::InvertedLoopOffsets => "loop_end must be greater than loop_begin",
            ErrorCode::DuplicateTrackId => "Give every track record a unique id",
            ErrorCode::DuplicateTargetId => {
                "Remove the target id from all but one playlist"
            }
            ErrorCode::DanglingTrackReference => {
                "Add a track record for the id or remove it from the playlist"
            }
            ErrorCode::InvalidPlayRange => {
                "Make the end offset greater than the start offset and within the track length"
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Location of the offending value inside the playlist document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Top-level section name (`musics` for track records).
    pub section: String,
    /// Field within the section, e.g. `musics[3].path` or `target_ids`.
    pub field: String,
    /// The received value, rendered as text.
    pub value: String,
}

impl ErrorContext {
    pub fn new(
        section: impl Into<String>,
        field: impl Into<String>,
        value: impl fmt::Display,
    ) -> Self {
        Self {
            section: section.into(),
            field: field.into(),
            value: value.to_string(),
        }
    }
}

/// Main error type for catalog and playback-boundary operations.
#[derive(Debug)]
pub struct DaemonError {
    /// The error code identifying the type of error.
    pub code: ErrorCode,
    /// Human-readable error message.
    pub message: String,
    /// Where in the document the error was found, if anywhere.
    pub context: Option<ErrorContext>,
    /// Optional underlying cause of the error.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl DaemonError {
    /// Creates a new DaemonError with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
            source: None,
        }
    }

    /// Creates a new DaemonError with an underlying cause.
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
            source: Some(Box::new(source)),
        }
    }

    /// Attaches the document location to this error.
    pub fn at(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates a CONFIG_READ_FAILED error.
    pub fn config_read_failed(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::with_source(
            ErrorCode::ConfigReadFailed,
            format!("Failed to read playlist document {}", path.display()),
            source,
        )
    }

    /// Creates a CONFIG_SYNTAX error.
    pub fn config_syntax(source: toml::de::Error) -> Self {
        Self::with_source(
            ErrorCode::ConfigSyntax,
            format!("Invalid TOML: {}", source.to_string().trim_end()),
            source,
        )
    }

    /// Creates a MALFORMED_SECTION error.
    pub fn malformed(context: ErrorContext, expected: &str) -> Self {
        Self::new(
            ErrorCode::MalformedSection,
            format!("Expected {} at {}.{}", expected, context.section, context.field),
        )
        .at(context)
    }

    /// Creates a MISSING_FIELD error.
    pub fn missing_field(section: &str, field: &str) -> Self {
        Self::new(
            ErrorCode::MissingField,
            format!("Missing field `{}` in [{}]", field, section),
        )
        .at(ErrorContext::new(section, field, "<none>"))
    }

    /// Creates an INVALID_FIELD_TYPE error.
    pub fn invalid_type(context: ErrorContext, expected: &str) -> Self {
        Self::new(
            ErrorCode::InvalidFieldType,
            format!(
                "{}.{} must be {}, got {}",
                context.section, context.field, expected, context.value
            ),
        )
        .at(context)
    }

    /// Creates an INVALID_PATH_CHARACTER error.
    pub fn invalid_path_character(context: ErrorContext, byte: u8) -> Self {
        Self::new(
            ErrorCode::InvalidPathCharacter,
            format!("Invalid character {:#04x} found in {}", byte, context.value),
        )
        .at(context)
    }

    /// Creates a FILE_NOT_FOUND error.
    pub fn file_not_found(context: ErrorContext) -> Self {
        Self::new(
            ErrorCode::FileNotFound,
            format!("{} does not exist", context.value),
        )
        .at(context)
    }

    /// Creates a NOT_REGULAR_FILE error.
    pub fn not_regular_file(context: ErrorContext) -> Self {
        Self::new(
            ErrorCode::NotRegularFile,
            format!("{} is not a regular file", context.value),
        )
        .at(context)
    }

    /// Creates a SYMLINK_NOT_SUPPORTED error.
    pub fn symlink_not_supported(context: ErrorContext) -> Self {
        Self::new(
            ErrorCode::SymlinkNotSupported,
            format!("{} is a symbolic link", context.value),
        )
        .at(context)
    }

    /// Creates an INVALID_OFFSET error.
    pub fn invalid_offset(context: ErrorContext) -> Self {
        Self::new(
            ErrorCode::InvalidOffset,
            format!(
                "Invalid offset {} for {}.{}",
                context.value, context.section, context.field
            ),
        )
        .at(context)
    }

    /// Creates an INCOMPLETE_LOOP_PAIR error.
    pub fn incomplete_loop_pair(context: ErrorContext) -> Self {
        Self::new(
            ErrorCode::IncompleteLoopPair,
            "Only one of loop begin/end offsets was found",
        )
        .at(context)
    }

    /// Creates an INVERTED_LOOP_OFFSETS error.
    pub fn inverted_loop_offsets(context: ErrorContext, begin: i64, end: i64) -> Self {
        Self::new(
            ErrorCode::InvertedLoopOffsets,
            format!("Invalid loop offsets: begin={}, end={}", begin, end),
        )
        .at(context)
    }

    /// Creates a DUPLICATE_TRACK_ID error.
    pub fn duplicate_track_id(context: ErrorContext, track_id: u64) -> Self {
        Self::new(
            ErrorCode::DuplicateTrackId,
            format!("Duplicated music entry for id {} ({:#x})", track_id, track_id),
        )
        .at(context)
    }

    /// Creates a DUPLICATE_TARGET_ID error.
    pub fn duplicate_target_id(context: ErrorContext, target_id: u64, first_owner: &str) -> Self {
        Self::new(
            ErrorCode::DuplicateTargetId,
            format!(
                "Duplicated target id {} ({:#x}), already routed by [{}]",
                target_id, target_id, first_owner
            ),
        )
        .at(context)
    }

    /// Creates a DANGLING_TRACK_REFERENCE error.
    pub fn dangling_track_reference(context: ErrorContext, track_id: u64) -> Self {
        Self::new(
            ErrorCode::DanglingTrackReference,
            format!(
                "[{}] references unknown track id {} ({:#x})",
                context.section, track_id, track_id
            ),
        )
        .at(context)
    }

    /// Creates an INVALID_PLAY_RANGE error.
    pub fn invalid_play_range(track_id: u64, start: u64, end: u64, total_frames: u64) -> Self {
        Self::new(
            ErrorCode::InvalidPlayRange,
            format!(
                "Invalid play range for track {:#x}: start={}, end={}, length={} frames",
                track_id, start, end, total_frames
            ),
        )
    }
}

impl fmt::Display for DaemonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ctx) = &self.context {
            write!(
                f,
                " (section={}, field={}, value={})",
                ctx.section, ctx.field, ctx.value
            )?;
        }
        write!(f, ". Recovery: {}", self.code.recovery_hint())
    }
}

impl std::error::Error for DaemonError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Result type alias using DaemonError.
pub type Result<T> = std::result::Result<T, DaemonError>;
