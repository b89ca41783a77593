//! Contains the common [`ErrorKind`] trait used by all faults raised while rewriting an
//! expression tree, and the [`Error`] type that locates them in the rendered expression.

use ariadne::{Color, Report, Source};
use std::{any::Any, fmt::{self, Debug}, io, ops::Range};

/// The color to use to highlight expressions.
pub const EXPR: Color = Color::RGB(52, 235, 152);

/// Represents any kind of fault that can occur during a traversal.
pub trait ErrorKind: Debug + Send {
    /// Returns `self` as [`Any`], so that callers can inspect the concrete error kind.
    fn as_any(&self) -> &dyn Any;

    /// Returns the message describing this error, without any source context.
    fn message(&self) -> String;

    /// Builds the report for this error.
    fn build_report<'a>(
        &self,
        src_id: &'a str,
        spans: &[Range<usize>],
    ) -> Report<(&'a str, Range<usize>)>;
}

/// An error associated with regions of a rendered expression that can be highlighted.
///
/// The source text of the report is the [`Display`](std::fmt::Display) output of the expression
/// the failing call was made on.
#[derive(Debug)]
pub struct Error {
    /// The regions of the rendered expression that this error originated from. There is always
    /// at least one.
    pub spans: Vec<Range<usize>>,

    /// The kind of error that occurred.
    pub kind: Box<dyn ErrorKind>,
}

impl Error {
    /// Creates a new error with the given spans and kind.
    ///
    /// An empty list of spans is replaced with a single empty span at the start of the source.
    pub fn new(spans: Vec<Range<usize>>, kind: impl ErrorKind + 'static) -> Self {
        let spans = if spans.is_empty() { vec![0..0] } else { spans };
        Self { spans, kind: Box::new(kind) }
    }

    /// Build a report from this error kind.
    pub fn build_report<'a>(&self, src_id: &'a str) -> Report<(&'a str, Range<usize>)> {
        self.kind.build_report(src_id, &self.spans)
    }

    /// Prints the report of this error to stderr, against the given source text.
    pub fn eprint(&self, src_id: &str, src: &str) -> io::Result<()> {
        self.build_report(src_id).eprint((src_id, Source::from(src)))
    }

    /// Returns true if the error is of the given kind.
    pub fn kind_is<K: ErrorKind + 'static>(&self) -> bool {
        self.kind.as_any().is::<K>()
    }

    /// Returns the error kind as the given concrete type, if it is of that type.
    pub fn downcast_ref<K: ErrorKind + 'static>(&self) -> Option<&K> {
        self.kind.as_any().downcast_ref::<K>()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind.message())
    }
}

impl std::error::Error for Error {}
