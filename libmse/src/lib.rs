//! Streaming reader for MSE set-file documents.
//!
//! The set-file format is a tab-indented, line-oriented text format: each
//! line is `key: value`, nesting is by count of leading tabs, and an empty
//! value means the real value is the following more-indented run of lines.
//! Documents carry their format version in a reserved `mse version` block,
//! conventionally the first content in the file.
//!
//! # Reading Pipeline
//!
//! 1. **Line Scanner**: pulls one UTF-8 line at a time off the byte stream,
//!    normalizing line endings and eating the byte order mark.
//!
//! 2. **Line Parser**: splits a line into indentation, canonical key, and
//!    raw value, repairing space indentation where it can.
//!
//! 3. **Block Cursor**: a small state machine that gives the flat line
//!    sequence its tree structure: callers enter and exit blocks, pull
//!    values, and skip unknown keys.
//!
//! 4. **Value Coercion**: turns raw values (or collected multi-line blocks)
//!    into typed scalars, warning and substituting a default on soft
//!    failures.
//!
//! Warnings accumulate per document and flush as one aggregated message;
//! fatal problems surface as [`ParseError`] and abort the read.
//!
//! # Example
//!
//! ```
//! use std::io::Cursor;
//! use libmse::{Reader, Version};
//!
//! let doc = "mse_version: 308\nname: Example\n";
//! let mut reader =
//!     Reader::new(Cursor::new(doc), "example.mse-set", Version::new(308), false).unwrap();
//! let mut name = String::new();
//! if reader.enter_block("name").unwrap() {
//!     reader.handle_string(&mut name).unwrap();
//!     reader.exit_block().unwrap();
//! }
//! assert_eq!(name, "Example");
//! ```

mod enums;
mod error;
mod line;
mod reader;
mod scanner;
mod value;

pub use enums::EnumReader;
pub use error::{ParseError, Result, Warning};
pub use line::canonical_name;
pub use reader::{Reader, Target};
pub use value::{FileRef, TriBool, Vec2, Version};
