//! Static vendor category manifest
//!
//! Vendors that do not ship a probe-able HAL describe their categories in a
//! plain text file instead:
//!
//! ```text
//! gfx                  ← category header (no leading space or tab)
//!  mali/mali_job_slots ← event entry (one or more spaces/tabs)
//!  mali/gpu_power
//!
//! memory
//! 	ion/ion_alloc
//! ```
//!
//! Lines of only spaces and tabs are ignored anywhere. A header that repeats an
//! earlier one extends that category instead of resetting it.
//!
//! # Grammar as a state machine
//!
//! ```text
//!             header                     header
//! NoCategory ────────► InCategory(name) ◄────────┐
//!     │                  │      ▲                │
//!     │ event            │ event│ (validate +    │
//!     ▼                  └──────┘  append)  ─────┘
//!   error
//! ```
//!
//! Parsing is fail-fast: the first invalid event entry aborts and its error
//! is returned. Event entries are checked in this order:
//!
//! 1. a category header has been seen
//! 2. exactly one `/` (none → `MalformedPath`, more → `ExtraSlash`)
//! 3. non-empty group
//! 4. non-empty name

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::categories::CategoryMap;
use crate::tracepoint::Tracepoint;

/// Characters that indent an event line or pad a header
const INDENT: [char; 2] = [' ', '\t'];

/// Error returned by the manifest parser
///
/// Syntax variants carry the 1-based line number and the trimmed text of
/// the offending line.
#[derive(Debug)]
pub enum ManifestError {
    /// The manifest could not be opened or read
    Io { path: PathBuf, source: io::Error },
    /// Event entry before any category header
    EventBeforeCategory { line: usize, text: String },
    /// Event entry without a `/`
    MalformedPath { line: usize, text: String },
    /// Event entry with more than one `/`
    ExtraSlash { line: usize, text: String },
    /// Nothing before the `/`
    EmptyGroup { line: usize, text: String },
    /// Nothing after the `/`
    EmptyName { line: usize, text: String },
}

impl ManifestError {
    /// Stable label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            ManifestError::Io { .. } => "io",
            ManifestError::EventBeforeCategory { .. } => "event_before_category",
            ManifestError::MalformedPath { .. } => "malformed_path",
            ManifestError::ExtraSlash { .. } => "extra_slash",
            ManifestError::EmptyGroup { .. } => "empty_group",
            ManifestError::EmptyName { .. } => "empty_name",
        }
    }

    /// Line the error was found on, if it is a syntax error
    pub fn line(&self) -> Option<usize> {
        match self {
            ManifestError::Io { .. } => None,
            ManifestError::EventBeforeCategory { line, .. }
            | ManifestError::MalformedPath { line, .. }
            | ManifestError::ExtraSlash { line, .. }
            | ManifestError::EmptyGroup { line, .. }
            | ManifestError::EmptyName { line, .. } => Some(*line),
        }
    }
}

impl std::fmt::Display for ManifestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ManifestError::Io { path, source } => {
                write!(f, "Cannot read vendor manifest {}: {}", path.display(), source)
            }
            ManifestError::EventBeforeCategory { line, text } => write!(
                f,
                "line {} ({:?}): Ftrace event path before category",
                line, text
            ),
            ManifestError::MalformedPath { line, text } => write!(
                f,
                "line {} ({:?}): Ftrace event path not in group/event format",
                line, text
            ),
            ManifestError::ExtraSlash { line, text } => {
                write!(f, "line {} ({:?}): Ftrace event path has extra /", line, text)
            }
            ManifestError::EmptyGroup { line, text } => write!(
                f,
                "line {} ({:?}): Ftrace event path group is empty",
                line, text
            ),
            ManifestError::EmptyName { line, text } => {
                write!(f, "line {} ({:?}): Ftrace event path name empty", line, text)
            }
        }
    }
}

impl std::error::Error for ManifestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ManifestError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Where the parser is in the grammar
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParserState {
    /// No header seen yet; event entries are rejected
    NoCategory,
    /// Event entries belong to this category
    InCategory(String),
}

/// Line-at-a-time manifest parser writing into a caller-owned map
pub struct ManifestParser<'a> {
    state: ParserState,
    out: &'a mut CategoryMap,
    line: usize,
}

impl<'a> ManifestParser<'a> {
    pub fn new(out: &'a mut CategoryMap) -> Self {
        Self {
            state: ParserState::NoCategory,
            out,
            line: 0,
        }
    }

    pub fn state(&self) -> &ParserState {
        &self.state
    }

    /// Consume one line (without its `\n`; a trailing `\r` is dropped).
    ///
    /// Only ASCII space and tab count as indentation or padding; any other
    /// character, Unicode spaces included, is part of the text.
    pub fn feed_line(&mut self, raw: &str) -> Result<(), ManifestError> {
        self.line += 1;
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        let text = line.trim_matches(INDENT);

        if text.is_empty() {
            return Ok(());
        }

        if !line.starts_with(INDENT) {
            self.out.entry(text);
            self.state = ParserState::InCategory(text.to_string());
            return Ok(());
        }

        let category = match &self.state {
            ParserState::NoCategory => {
                return Err(ManifestError::EventBeforeCategory {
                    line: self.line,
                    text: text.to_string(),
                })
            }
            ParserState::InCategory(category) => category,
        };

        let tracepoint = parse_event_path(text, self.line)?;
        self.out.push(category, tracepoint);
        Ok(())
    }
}

/// Validate one trimmed event entry and split it.
fn parse_event_path(text: &str, line: usize) -> Result<Tracepoint, ManifestError> {
    let text_owned = || text.to_string();

    match text.matches('/').count() {
        0 => {
            return Err(ManifestError::MalformedPath {
                line,
                text: text_owned(),
            })
        }
        1 => {}
        _ => {
            return Err(ManifestError::ExtraSlash {
                line,
                text: text_owned(),
            })
        }
    }

    // Exactly one '/' was counted above
    let (group, name) = text.split_once('/').unwrap_or((text, ""));
    if group.is_empty() {
        return Err(ManifestError::EmptyGroup {
            line,
            text: text_owned(),
        });
    }
    // Group is known non-empty, so `new` can only reject the name
    Tracepoint::new(group, name).ok_or_else(|| ManifestError::EmptyName {
        line,
        text: text_owned(),
    })
}

/// Parse the manifest at `path` into a new map.
pub fn parse(path: impl AsRef<Path>) -> Result<CategoryMap, ManifestError> {
    let mut categories = CategoryMap::new();
    parse_into(path, &mut categories)?;
    Ok(categories)
}

/// Parse the manifest at `path` into `out`.
///
/// On error `out` may hold a partial result and should be discarded.
pub fn parse_into(path: impl AsRef<Path>, out: &mut CategoryMap) -> Result<(), ManifestError> {
    let path = path.as_ref();
    let io_err = |source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    };

    let reader = BufReader::new(File::open(path).map_err(io_err)?);
    let mut parser = ManifestParser::new(out);
    for line in reader.lines() {
        parser.feed_line(&line.map_err(io_err)?)?;
    }

    debug!(
        path = %path.display(),
        categories = out.len(),
        tracepoints = out.tracepoint_count(),
        "Parsed vendor manifest"
    );
    Ok(())
}

/// Parse manifest text already in memory.
pub fn parse_str(text: &str) -> Result<CategoryMap, ManifestError> {
    let mut categories = CategoryMap::new();
    let mut parser = ManifestParser::new(&mut categories);
    for line in text.split('\n') {
        parser.feed_line(line)?;
    }
    Ok(categories)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tp(group: &str, name: &str) -> Tracepoint {
        Tracepoint::new(group, name).unwrap()
    }

    #[test]
    fn test_two_categories() {
        let map = parse_str("gfx\n foo/bar\n g/a\n g/b\nmemory\n grp/evt\n").unwrap();

        let names: Vec<&str> = map.categories().collect();
        assert_eq!(names, vec!["gfx", "memory"]);
        assert_eq!(
            map.get("gfx").unwrap(),
            &[tp("foo", "bar"), tp("g", "a"), tp("g", "b")]
        );
        assert_eq!(map.get("memory").unwrap(), &[tp("grp", "evt")]);
    }

    #[test]
    fn test_blank_lines_ignored() {
        let map = parse_str("\ngfx\n   \n foo/bar\n\n").unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("gfx").unwrap(), &[tp("foo", "bar")]);
    }

    #[test]
    fn test_leading_whitespace_amount_irrelevant() {
        let map = parse_str("gfx\n path/1\n\tpath/2\n  path/3\n\t\tpath/4\n").unwrap();
        assert_eq!(
            map.get("gfx").unwrap(),
            &[tp("path", "1"), tp("path", "2"), tp("path", "3"), tp("path", "4")]
        );
    }

    #[test]
    fn test_repeated_header_extends_category() {
        let map = parse_str("gfx\n a/1\nmemory\n m/1\ngfx\n a/2\n").unwrap();
        let names: Vec<&str> = map.categories().collect();
        assert_eq!(names, vec!["gfx", "memory"]);
        assert_eq!(map.get("gfx").unwrap(), &[tp("a", "1"), tp("a", "2")]);
    }

    #[test]
    fn test_header_is_trimmed_and_crlf_accepted() {
        let map = parse_str("gfx  \r\n foo/bar \r\n").unwrap();
        assert_eq!(map.get("gfx").unwrap(), &[tp("foo", "bar")]);
    }

    #[test]
    fn test_only_ascii_space_and_tab_indent() {
        let map = parse_str("\u{a0}gfx\n foo/bar\n\u{3000}mem\n\tg/a\n").unwrap();
        let names: Vec<&str> = map.categories().collect();
        assert_eq!(names, vec!["\u{a0}gfx", "\u{3000}mem"]);
        assert_eq!(map.get("\u{3000}mem").unwrap(), &[tp("g", "a")]);

        // A Unicode space alone is not a blank line
        let map = parse_str("\u{2003}\n").unwrap();
        assert!(map.contains("\u{2003}"));
    }

    #[test]
    fn test_header_without_events() {
        let map = parse_str("gfx\nmemory\n grp/evt\n").unwrap();
        assert_eq!(map.get("gfx").unwrap().len(), 0);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_event_before_category() {
        let err = parse_str(" foo/bar\n g/a\n g/b\n").unwrap_err();
        assert!(matches!(err, ManifestError::EventBeforeCategory { line: 1, .. }));
        assert!(err.to_string().contains("Ftrace event path before category"));
    }

    #[test]
    fn test_event_before_category_after_blank_lines() {
        let err = parse_str("\n\n\tfoo/bar\ngfx\n").unwrap_err();
        assert!(matches!(err, ManifestError::EventBeforeCategory { line: 3, .. }));
    }

    #[test]
    fn test_no_slash() {
        let err = parse_str("gfx\n event\n").unwrap_err();
        assert!(err
            .to_string()
            .contains("Ftrace event path not in group/event format"));
        assert_eq!(err.kind(), "malformed_path");
    }

    #[test]
    fn test_empty_group() {
        let err = parse_str("gfx\n /event\n").unwrap_err();
        assert!(err.to_string().contains("group is empty"));
    }

    #[test]
    fn test_extra_slash() {
        let err = parse_str("gfx\n group/dir/event\n").unwrap_err();
        assert!(err.to_string().ends_with("extra /"));
        assert_eq!(err.line(), Some(2));
    }

    #[test]
    fn test_empty_name() {
        let err = parse_str("gfx\n group/\n").unwrap_err();
        assert!(err.to_string().contains("name empty"));
    }

    #[test]
    fn test_slash_count_checked_before_emptiness() {
        // Empty group and extra slash both apply; slash count wins.
        let err = parse_str("gfx\n //\n").unwrap_err();
        assert!(matches!(err, ManifestError::ExtraSlash { .. }));

        // Empty group and empty name both apply; group wins.
        let err = parse_str("gfx\n /\n").unwrap_err();
        assert!(matches!(err, ManifestError::EmptyGroup { .. }));
    }

    #[test]
    fn test_first_error_wins() {
        let err = parse_str("gfx\n bad\n /worse\n").unwrap_err();
        assert!(matches!(err, ManifestError::MalformedPath { line: 2, .. }));
    }

    #[test]
    fn test_parser_state_transitions() {
        let mut map = CategoryMap::new();
        let mut parser = ManifestParser::new(&mut map);
        assert_eq!(parser.state(), &ParserState::NoCategory);

        parser.feed_line("   ").unwrap();
        assert_eq!(parser.state(), &ParserState::NoCategory);

        parser.feed_line("gfx").unwrap();
        assert_eq!(parser.state(), &ParserState::InCategory("gfx".to_string()));

        parser.feed_line(" foo/bar").unwrap();
        assert_eq!(parser.state(), &ParserState::InCategory("gfx".to_string()));

        parser.feed_line("memory").unwrap();
        assert_eq!(
            parser.state(),
            &ParserState::InCategory("memory".to_string())
        );
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = parse("/nonexistent/vendor/atrace_categories.txt").unwrap_err();
        assert_eq!(err.kind(), "io");
        assert!(err.line().is_none());
    }
}
