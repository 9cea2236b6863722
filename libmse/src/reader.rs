//! The document reader: block cursor, value coercion, versioning, warnings.
//!
//! A [`Reader`] is bound to one byte stream for its whole lifetime and pulls
//! values forward-only, with no lookahead beyond the current line. The tree
//! structure of a document comes from a flat sequence of indented lines,
//! tracked by a small explicit state machine rather than recursion, so
//! arbitrarily deep nesting never grows the call stack.

use std::io::BufRead;

use chrono::NaiveDateTime;
use log::{debug, warn};

use crate::error::{ParseError, Result, Warning};
use crate::line::{self, LineIssue, ParsedLine};
use crate::scanner::LineScanner;
use crate::value::{self, FileRef, TriBool, Vec2, Version};

/// Cursor position relative to the key under it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CursorState {
    /// Before the first advance; no key is pending.
    Outside,
    /// On the key of a block that was just entered.
    Entered,
    /// The current key's value has been consumed.
    Handled,
    /// The value was read but deferred for a second consumption pass.
    Unhandled,
}

/// Mutable destination for one typed read; the closed set of scalar kinds.
pub enum Target<'a> {
    Text(&'a mut String),
    Int(&'a mut i32),
    UInt(&'a mut u32),
    Float(&'a mut f64),
    Bool(&'a mut bool),
    TriBool(&'a mut TriBool),
    DateTime(&'a mut NaiveDateTime),
    Point(&'a mut Vec2),
    File(&'a mut FileRef),
    Version(&'a mut Version),
}

/// Streaming reader for tab-indented key/value documents.
///
/// Construction eats the byte order mark, advances to the first usable line,
/// and consumes the reserved `mse version` block, so the first caller-visible
/// key is real document content.
pub struct Reader<R> {
    scanner: LineScanner<R>,
    /// Raw text of the current line, kept for multi-line value collection.
    line: String,
    cur: ParsedLine,
    eof: bool,
    state: CursorState,
    /// Indentation required of lines inside the currently open block.
    expected_indent: i32,
    /// Suppress formatting warnings and silently skip unrecognized content.
    lenient: bool,
    filename: String,
    line_number: u64,
    previous_line_number: u64,
    previous_value: String,
    warnings: Vec<Warning>,
    app_version: Version,
    file_version: Version,
}

impl<R: BufRead> Reader<R> {
    /// Bind a reader to `input`. `filename` only labels diagnostics;
    /// `app_version` is the running application's own format version, used
    /// for the newer-file check.
    pub fn new(input: R, filename: &str, app_version: Version, lenient: bool) -> Result<Self> {
        let mut reader = Self {
            scanner: LineScanner::new(input),
            line: String::new(),
            cur: ParsedLine::default(),
            eof: false,
            state: CursorState::Outside,
            expected_indent: 0,
            lenient,
            filename: filename.to_string(),
            line_number: 0,
            previous_line_number: 0,
            previous_value: String::new(),
            warnings: Vec::new(),
            app_version,
            file_version: Version::default(),
        };
        reader.scanner.eat_bom()?;
        reader.move_next()?;
        reader.handle_app_version()?;
        Ok(reader)
    }

    /// Canonicalized key of the line under the cursor.
    pub fn key(&self) -> &str {
        &self.cur.key
    }

    /// One-based number of the current line.
    pub fn line_number(&self) -> u64 {
        self.line_number
    }

    /// The document's declared format version; 0 when the version block was
    /// absent.
    pub fn file_version(&self) -> Version {
        self.file_version
    }

    // ---- lines and the cursor ---------------------------------------------

    /// Read and split the next physical line. `in_text_block` suppresses
    /// formatting repair while a multi-line string is being collected.
    fn read_line(&mut self, in_text_block: bool) -> Result<()> {
        self.line_number += 1;
        self.line = match self.scanner.next_line(self.line_number)? {
            Some(text) => text,
            None => String::new(),
        };
        if self.scanner.at_eof() {
            self.eof = true;
        }
        let (parsed, issues) = line::parse_line(&self.line, in_text_block, self.lenient);
        self.cur = parsed;
        for issue in issues {
            match issue {
                LineIssue::LeadingSpace { key } => self.warning(&format!(
                    "key '{key}' starts with a space; use tabs, not spaces, for indentation"
                )),
                LineIssue::MissingColon => self.warning("missing ':'"),
            }
        }
        Ok(())
    }

    /// Advance to the next non-blank line; the workhorse behind every cursor
    /// operation.
    fn move_next(&mut self) -> Result<()> {
        self.previous_line_number = self.line_number;
        self.state = CursorState::Handled;
        // if no line is read it never has the expected indentation
        self.cur = ParsedLine {
            indent: -1,
            ..ParsedLine::default()
        };
        while self.cur.key.is_empty() && !self.eof {
            self.read_line(false)?;
        }
        self.finish_advance();
        Ok(())
    }

    /// Shared tail of an advance: past the end of the stream the indent
    /// becomes the -1 sentinel, distinguishable from a real zero-indent line.
    fn finish_advance(&mut self) {
        if self.cur.key.is_empty() && self.eof {
            self.line_number += 1;
            self.cur.indent = -1;
        }
    }

    /// Open the block under the cursor regardless of its key name.
    pub fn enter_any_block(&mut self) -> Result<bool> {
        if self.state == CursorState::Entered {
            // on the key of the parent block, first move inside it
            self.move_next()?;
        }
        if self.cur.indent != self.expected_indent {
            return Ok(false); // not enough indentation
        }
        self.state = CursorState::Entered;
        self.expected_indent += 1;
        Ok(true)
    }

    /// Open the block under the cursor if its key matches `name`.
    ///
    /// On mismatch nothing is consumed and the line stays available for
    /// another handler to try. `name` is canonicalized before comparison.
    pub fn enter_block(&mut self, name: &str) -> Result<bool> {
        if self.state == CursorState::Entered {
            self.move_next()?;
        }
        if self.cur.indent != self.expected_indent {
            return Ok(false);
        }
        if self.cur.key != line::canonical_name(name) {
            return Ok(false);
        }
        self.state = CursorState::Entered;
        self.expected_indent += 1;
        Ok(true)
    }

    /// Close the current block.
    ///
    /// Any keys of the block the caller never read are discarded without a
    /// diagnostic; callers rely on that for intentionally-optional trailing
    /// fields.
    pub fn exit_block(&mut self) -> Result<()> {
        debug_assert!(self.expected_indent > 0, "exit_block without an open block");
        debug_assert!(
            self.state != CursorState::Unhandled,
            "exit_block with a deferred value pending"
        );
        self.expected_indent -= 1;
        self.previous_value.clear();
        if self.state == CursorState::Entered {
            self.move_next()?; // leave this key
        }
        while self.cur.indent > self.expected_indent {
            self.move_next()?;
        }
        self.state = CursorState::Handled;
        Ok(())
    }

    /// Whether another key is available at the current nesting level.
    ///
    /// Moves inside a just-entered block first, so it can drive a read loop
    /// directly after `enter_block`.
    pub fn more(&mut self) -> Result<bool> {
        if self.state == CursorState::Entered {
            self.move_next()?;
        }
        Ok(self.cur.indent >= self.expected_indent)
    }

    /// Default handling for a key no handler recognized: skip it and
    /// everything nested under it, with a warning outside leniency mode.
    ///
    /// Below the expected nesting level nothing is consumed; the line may
    /// still be a nameless value for an outer handler to reinterpret.
    pub fn unknown_key(&mut self) -> Result<()> {
        if self.lenient {
            loop {
                self.move_next()?;
                if self.cur.indent <= self.expected_indent {
                    return Ok(());
                }
            }
        }
        if self.cur.indent >= self.expected_indent {
            self.warning(&format!("unexpected key '{}'", self.cur.key));
            loop {
                self.move_next()?;
                if self.cur.indent <= self.expected_indent {
                    break;
                }
            }
        }
        Ok(())
    }

    /// Defer the value just read, so the next `value()` call returns the
    /// same text again without advancing.
    pub fn unhandle(&mut self) {
        debug_assert!(
            self.state == CursorState::Handled,
            "unhandle before a value was read"
        );
        self.state = CursorState::Unhandled;
    }

    // ---- values -----------------------------------------------------------

    /// The raw text value for the current key.
    ///
    /// An empty value after the colon means the value is the following
    /// more-indented run of lines, joined with newlines. Interior blank or
    /// under-indented lines become embedded newlines only when
    /// sufficiently-indented content follows them, so trailing blanks are
    /// dropped.
    pub fn value(&mut self) -> Result<String> {
        debug_assert!(
            self.state != CursorState::Handled,
            "value consumed twice without unhandle"
        );
        if self.state == CursorState::Unhandled {
            self.state = CursorState::Handled;
            return Ok(self.previous_value.clone());
        }
        if self.cur.value.is_empty() {
            return self.multi_line_value();
        }
        self.previous_value = std::mem::take(&mut self.cur.value);
        self.move_next()?;
        Ok(self.previous_value.clone())
    }

    fn multi_line_value(&mut self) -> Result<String> {
        self.previous_value.clear();
        let strip = self.expected_indent as usize;
        let mut pending_newlines = 0usize;
        // read all lines that are indented enough
        self.read_line(true)?;
        self.previous_line_number = self.line_number;
        while self.cur.indent >= self.expected_indent && !self.eof {
            for _ in 0..pending_newlines {
                self.previous_value.push('\n');
            }
            pending_newlines = 0;
            // strip exactly the expected indentation
            self.previous_value.push_str(&self.line[strip..]);
            loop {
                self.read_line(true)?;
                pending_newlines += 1;
                // skip blank lines that are not indented enough
                let blank = self.line.trim().is_empty();
                if !(blank && self.cur.indent < self.expected_indent && !self.eof) {
                    break;
                }
            }
        }
        // move_next, but without the initial read
        self.state = CursorState::Handled;
        while self.cur.key.is_empty() && !self.eof {
            self.read_line(false)?;
        }
        self.finish_advance();
        if self.cur.indent >= self.expected_indent {
            self.warning_at(
                "blank line or comment in text block is insufficiently indented; \
                 either indent it, or add a 'key:' after it",
                -1,
                false,
            );
        }
        Ok(self.previous_value.clone())
    }

    /// Coerce the current value into `target`.
    ///
    /// The whole warn-or-fatal policy sits in this one match: text, int,
    /// uint, float, bool, tribool, file, and version fail softly (a warning
    /// plus a per-kind fallback); date-time and point are fatal on malformed
    /// input.
    pub fn handle(&mut self, target: Target<'_>) -> Result<()> {
        let v = self.value()?;
        match target {
            Target::Text(out) => *out = v,
            Target::Int(out) => match value::parse_long(&v) {
                Some(n) => *out = n as i32,
                None => {
                    self.warning(&format!("expected an integer instead of '{v}'"));
                    *out = 0;
                }
            },
            Target::UInt(out) => match value::parse_long(&v) {
                Some(n) => {
                    if n < 0 {
                        // abs, so that -1 does not come out as a huge number
                        self.warning(&format!("expected a non-negative integer instead of {n}"));
                    }
                    *out = n.unsigned_abs() as u32;
                }
                None => {
                    self.warning(&format!("expected a non-negative integer instead of '{v}'"));
                    *out = 0;
                }
            },
            Target::Float(out) => match value::parse_double(&v) {
                Some(d) => *out = d,
                None => {
                    self.warning(&format!("expected a floating point number instead of '{v}'"))
                }
            },
            Target::Bool(out) => self.coerce_bool(&v, out),
            Target::TriBool(out) => {
                let mut b = out.as_bool().unwrap_or_default();
                self.coerce_bool(&v, &mut b);
                *out = TriBool::from(b);
            }
            Target::DateTime(out) => match value::parse_date_time(&v) {
                Some(dt) => *out = dt,
                None => return Err(ParseError::ExpectedDateTime(v)),
            },
            Target::Point(out) => match Vec2::from_read_string(&v) {
                Some(p) => *out = p,
                None => return Err(ParseError::ExpectedPoint(v)),
            },
            Target::File(out) => *out = FileRef::from_read_string(&v),
            Target::Version(out) => match Version::from_read_string(&v) {
                Some(version) => *out = version,
                None => {
                    self.warning(&format!("expected a version number instead of '{v}'"));
                    *out = Version::default();
                }
            },
        }
        Ok(())
    }

    fn coerce_bool(&mut self, v: &str, out: &mut bool) {
        match value::parse_bool(v) {
            Some(b) => *out = b,
            None => {
                self.warning(&format!(
                    "expected a boolean ('true' or 'false') instead of '{v}'"
                ));
            }
        }
    }

    /// Read the current value as text.
    pub fn handle_string(&mut self, out: &mut String) -> Result<()> {
        self.handle(Target::Text(out))
    }

    /// Read a base-10 signed integer; malformed input warns and yields 0.
    pub fn handle_i32(&mut self, out: &mut i32) -> Result<()> {
        self.handle(Target::Int(out))
    }

    /// Read a non-negative integer. A negative number warns and is folded
    /// through its absolute value, so `-5` reads as 5 rather than erroring.
    pub fn handle_u32(&mut self, out: &mut u32) -> Result<()> {
        self.handle(Target::UInt(out))
    }

    /// Read a floating point number; malformed input warns and leaves the
    /// destination unchanged.
    pub fn handle_f64(&mut self, out: &mut f64) -> Result<()> {
        self.handle(Target::Float(out))
    }

    /// Read a boolean. Exactly `true`/`1`/`yes` and `false`/`0`/`no` are
    /// accepted, case sensitive; anything else warns and leaves the
    /// destination unchanged.
    pub fn handle_bool(&mut self, out: &mut bool) -> Result<()> {
        self.handle(Target::Bool(out))
    }

    /// Read a three-valued boolean by widening a plain boolean read.
    pub fn handle_tribool(&mut self, out: &mut TriBool) -> Result<()> {
        self.handle(Target::TriBool(out))
    }

    /// Read a date and time. Unlike the soft scalar reads this is fatal on
    /// malformed input, including trailing characters.
    pub fn handle_date_time(&mut self, out: &mut NaiveDateTime) -> Result<()> {
        self.handle(Target::DateTime(out))
    }

    /// Read a 2D point in the `(x,y)` form; fatal on malformed input.
    pub fn handle_vec2(&mut self, out: &mut Vec2) -> Result<()> {
        self.handle(Target::Point(out))
    }

    /// Read a file reference; decoding is owned by [`FileRef`].
    pub fn handle_file(&mut self, out: &mut FileRef) -> Result<()> {
        self.handle(Target::File(out))
    }

    /// Read a version token; malformed input warns and yields version 0.
    pub fn handle_version(&mut self, out: &mut Version) -> Result<()> {
        self.handle(Target::Version(out))
    }

    // ---- versioning -------------------------------------------------------

    /// Consume the reserved top-level version block, if present.
    fn handle_app_version(&mut self) -> Result<()> {
        if self.enter_block("mse_version")? {
            let mut version = Version::default();
            self.handle_version(&mut version)?;
            self.file_version = version;
            debug!("{}: document format version {}", self.filename, version);
            if self.app_version < version {
                self.warning(&format!(
                    "file was created by a newer version ({version}) of the program"
                ));
            }
            self.exit_block()?;
        }
        Ok(())
    }

    /// Skip the block `name` if this document predates `end_version`.
    ///
    /// Blocks that only existed before a given format version can be ignored
    /// this way without knowing their contents.
    pub fn handle_ignore(&mut self, end_version: Version, name: &str) -> Result<()> {
        if self.file_version < end_version && self.enter_block(name)? {
            self.exit_block()?;
        }
        Ok(())
    }

    // ---- diagnostics ------------------------------------------------------

    /// Record a warning attributed to the current line.
    pub fn warning(&mut self, message: &str) {
        self.warning_at(message, 0, false);
    }

    /// Record a warning with a line offset, optionally attributed to the
    /// previous successfully-read line.
    pub fn warning_at(&mut self, message: &str, line_delta: i64, on_previous_line: bool) {
        let base = if on_previous_line {
            self.previous_line_number
        } else {
            self.line_number
        };
        let line = (base as i64 + line_delta).max(0) as u64;
        self.warnings.push(Warning {
            line,
            message: message.to_string(),
        });
    }

    /// Warnings accumulated so far.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Drain the accumulated warnings for programmatic handling.
    pub fn take_warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }

    /// Flush all accumulated warnings as one aggregated message through the
    /// `log` facade; does nothing when there are none.
    pub fn show_warnings(&mut self) {
        if self.warnings.is_empty() {
            return;
        }
        let mut report = format!("warnings while reading file: {}", self.filename);
        for warning in &self.warnings {
            report.push('\n');
            report.push_str(&format!("  {warning}"));
        }
        warn!("{report}");
        self.warnings.clear();
    }
}
