//! GEDCOM 5.5 and 5.5.1 reader, validator and writer.
//!
//! GEDCOM is the line-oriented exchange format genealogy programs use for
//! family trees. Each line carries a level, an optional cross-reference id,
//! a tag and a value; nesting is expressed only through the levels.
//!
//! # Loading Pipeline
//!
//! A load runs in three phases:
//!
//! 1. **Input**: bytes are decoded (byte order marks and UTF-16 included)
//!    and split into numbered lines, whatever terminator the file used.
//!
//! 2. **Tree**: each line is tokenized and attached to its parent by level,
//!    producing a generic tree of tag/value nodes.
//!
//! 3. **Loader**: the tree is interpreted into typed records. Recoverable
//!    problems are collected as [`Diagnostics`]; only structural failures
//!    abort with a [`GedcomError`].
//!
//! The loaded [`Gedcom`] can then be checked (and optionally repaired) with
//! a [`Validator`], and written back out with a [`GedcomWriter`].

mod diagnostics;
mod dialect;
mod error;
mod input;
mod loader;
pub mod model;
mod options;
mod progress;
mod text;
mod tokenizer;
mod tree;
pub mod validate;
mod writer;

use std::path::Path;

pub use diagnostics::{Diagnostic, Diagnostics};
pub use dialect::{CharacterSet, SupportedVersion};
pub use error::{GedcomError, Phase, Result};
pub use model::Gedcom;
pub use options::{LineTerminator, LoadOptions, WriterOptions};
pub use progress::{ProgressEvent, ProgressObserver};
pub use validate::{Finding, ProblemCode, Severity, ValidationResults, Validator};
pub use writer::GedcomWriter;

use error::LoadContext;
use loader::Loader;
use progress::Progress;

/// A loaded document and everything the loader had to say about it.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub gedcom: Gedcom,
    pub diagnostics: Diagnostics,
}

/// Load a GEDCOM document from a string with default options.
///
/// # Example
///
/// ```
/// let loaded = libgedcom::load("0 HEAD\n0 @I1@ INDI\n1 NAME John /Doe/\n0 TRLR\n").unwrap();
/// assert_eq!(loaded.gedcom.individuals.len(), 1);
/// ```
pub fn load(source: &str) -> Result<Loaded> {
    load_with_options(source, &LoadOptions::default())
}

/// Load a GEDCOM document from a string.
pub fn load_with_options(source: &str, options: &LoadOptions) -> Result<Loaded> {
    load_observed(source, options, &mut [])
}

fn load_observed(
    source: &str,
    options: &LoadOptions,
    observers: &mut [Box<dyn ProgressObserver>],
) -> Result<Loaded> {
    let ctx = LoadContext::new(options.filename.as_deref());
    let mut progress = Progress::new(observers, options.notification_rate);
    let mut diagnostics = Diagnostics::new();

    // Phase 1: text to numbered lines
    let lines = input::split_lines(source);

    // Phase 2: lines to generic tree
    let tree = tree::build_tree(&lines, options, &ctx, &mut diagnostics, &mut progress)?;

    // Phase 3: tree to typed records
    let (gedcom, diagnostics) = Loader::new(&tree, options, diagnostics).load(&mut progress)?;
    Ok(Loaded {
        gedcom,
        diagnostics,
    })
}

/// A reusable loader with options and progress observers.
#[derive(Default)]
pub struct GedcomParser {
    options: LoadOptions,
    observers: Vec<Box<dyn ProgressObserver>>,
}

impl GedcomParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: LoadOptions) -> Self {
        Self {
            options,
            observers: Vec::new(),
        }
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Register an observer for progress events. Returning
    /// [`ControlFlow::Break`](std::ops::ControlFlow::Break) from it cancels
    /// the load in progress.
    pub fn observe(&mut self, observer: impl ProgressObserver + 'static) -> &mut Self {
        self.observers.push(Box::new(observer));
        self
    }

    pub fn parse_str(&mut self, source: &str) -> Result<Loaded> {
        load_observed(source, &self.options, &mut self.observers)
    }

    /// Decode raw bytes, then load them.
    pub fn parse_bytes(&mut self, bytes: &[u8]) -> Result<Loaded> {
        let (text, decoding) = input::decode_bytes(bytes);
        tracing::debug!(%decoding, bytes = bytes.len(), "input decoded");
        self.parse_str(&text)
    }

    /// Read and load a file. The file name is used in error messages unless
    /// the options already name one.
    pub fn parse_file(&mut self, path: impl AsRef<Path>) -> Result<Loaded> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let (text, decoding) = input::decode_bytes(&bytes);
        tracing::debug!(path = %path.display(), %decoding, "file read");

        let options = match &self.options.filename {
            Some(_) => self.options.clone(),
            None => self
                .options
                .clone()
                .with_filename(&path.display().to_string()),
        };
        load_observed(&text, &options, &mut self.observers)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::ops::ControlFlow;
    use std::rc::Rc;

    use super::*;

    const SMALL: &str = "0 HEAD\n1 GEDC\n2 VERS 5.5.1\n0 @I1@ INDI\n0 @I2@ INDI\n0 @I3@ INDI\n0 TRLR\n";

    #[test]
    fn test_load_simple() {
        let loaded = load(SMALL).unwrap();
        assert!(loaded.diagnostics.is_clean(), "{:?}", loaded.diagnostics);
        assert_eq!(loaded.gedcom.individuals.len(), 3);
        assert!(loaded.gedcom.trailer.is_some());
    }

    #[test]
    fn test_fatal_error_names_file() {
        let options = LoadOptions::default().with_filename("family.ged");
        let err = load_with_options("0 HEAD\nX TRLR\n", &options).unwrap_err();
        assert!(err.to_string().contains("family.ged"), "{}", err);
    }

    #[test]
    fn test_progress_events() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&events);
        let mut parser = GedcomParser::with_options(LoadOptions::default().with_notification_rate(2));
        parser.observe(move |e: &ProgressEvent| {
            seen.borrow_mut().push(*e);
            ControlFlow::Continue(())
        });
        parser.parse_str(SMALL).unwrap();

        let events = events.borrow();
        let reading: Vec<_> = events.iter().filter(|e| e.phase == Phase::Reading).collect();
        // lines 2, 4 and 6, then completion at 7
        assert_eq!(reading.len(), 4);
        assert!(reading[3].complete);
        assert_eq!(reading[3].count, 7);
        let last = events.last().unwrap();
        assert_eq!(last.phase, Phase::Loading);
        assert!(last.complete);
        assert_eq!(last.count, 5);
    }

    #[test]
    fn test_cancellation() {
        let mut parser = GedcomParser::with_options(LoadOptions::default().with_notification_rate(1));
        parser.observe(|e: &ProgressEvent| {
            if e.phase == Phase::Loading && e.count == 2 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        match parser.parse_str(SMALL) {
            Err(GedcomError::Cancelled { phase, count }) => {
                assert_eq!(phase, Phase::Loading);
                assert_eq!(count, 2);
            }
            other => panic!("expected cancellation, got {:?}", other.map(|l| l.gedcom)),
        }
    }

    #[test]
    fn test_parse_utf16_bytes() {
        let mut bytes = vec![0xFF, 0xFE];
        bytes.extend(SMALL.encode_utf16().flat_map(u16::to_le_bytes));
        let loaded = GedcomParser::new().parse_bytes(&bytes).unwrap();
        assert_eq!(loaded.gedcom.individuals.len(), 3);
    }

    #[test]
    fn test_parse_file() {
        let path = std::env::temp_dir().join("libgedcom-parse-file-test.ged");
        std::fs::write(&path, SMALL).unwrap();
        let loaded = GedcomParser::new().parse_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded.gedcom.individuals.len(), 3);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let path = std::env::temp_dir().join("libgedcom-does-not-exist.ged");
        let err = GedcomParser::new().parse_file(&path).unwrap_err();
        assert!(matches!(err, GedcomError::Io(_)));
    }
}
