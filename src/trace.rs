use backtrace::Backtrace;
use std::error::Error as StdError;
use std::fmt;

/// Default bound on the number of stack frames carried into a record.
pub const DEFAULT_MAX_STACK_TRACE: usize = 10;

/// A single resolved location in an error's call stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    pub function: String,
    pub file: String,
    pub line: u32,
}

impl StackFrame {
    pub fn new(function: impl Into<String>, file: impl Into<String>, line: u32) -> Self {
        Self {
            function: function.into(),
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}:{}", self.function, self.file, self.line)
    }
}

/// Optional capability for error values that carry a captured call
/// stack, ordered innermost call site first.
///
/// The default implementation reports no frames; an error without
/// provenance is a normal case, not a failure.
pub trait Traceback: StdError {
    fn stack_trace(&self) -> &[StackFrame] {
        &[]
    }
}

/// Error wrapper that records the call stack of the site where it was
/// constructed, in the spirit of stack-annotating error libraries.
///
/// Capture resolves symbols eagerly and is expensive; construct these
/// where the error originates, not on every log call. Frames from this
/// crate and the capture machinery itself are skipped. In builds
/// without symbol information the frame list may come up empty, which
/// downstream formatting treats the same as a plain error.
#[derive(Debug)]
pub struct TracedError {
    message: String,
    frames: Vec<StackFrame>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl TracedError {
    /// New error with `message`, capturing the current call stack.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            frames: capture_frames(),
            source: None,
        }
    }

    /// Wrap an existing error, keeping it as `source` and capturing the
    /// current call stack.
    pub fn wrap<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            message: err.to_string(),
            frames: capture_frames(),
            source: Some(Box::new(err)),
        }
    }

    /// New error with an explicit frame list. Deterministic, intended
    /// for contexts where live capture is unwanted (tests, replays).
    pub fn with_frames(message: impl Into<String>, frames: Vec<StackFrame>) -> Self {
        Self {
            message: message.into(),
            frames,
            source: None,
        }
    }
}

impl fmt::Display for TracedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for TracedError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

impl Traceback for TracedError {
    fn stack_trace(&self) -> &[StackFrame] {
        &self.frames
    }
}

fn capture_frames() -> Vec<StackFrame> {
    let bt = Backtrace::new();
    let mut frames = Vec::new();

    for frame in bt.frames() {
        for symbol in frame.symbols() {
            let function = match symbol.name() {
                Some(name) => name.to_string(),
                None => continue,
            };

            // Skip the capture machinery and our own constructors.
            if function.contains("backtrace::") || function.contains("schemalog::trace::") {
                continue;
            }

            let file = symbol
                .filename()
                .and_then(|p| p.to_str())
                .unwrap_or("<unknown>")
                .to_string();

            frames.push(StackFrame {
                function,
                file,
                line: symbol.lineno().unwrap_or(0),
            });
        }
    }

    frames
}

/// Adapter giving a plain error the default (empty) trace capability.
struct Untraced<E>(E);

impl<E: fmt::Display> fmt::Display for Untraced<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<E: fmt::Debug> fmt::Debug for Untraced<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<E: StdError> StdError for Untraced<E> {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

impl<E: StdError> Traceback for Untraced<E> {}

/// Error value reconstructed from a display message alone, used when
/// the original error object is not available to own.
#[derive(Debug)]
pub(crate) struct MessageError(pub(crate) String);

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl StdError for MessageError {}

impl Traceback for MessageError {}

pub(crate) fn untraced<E>(err: E) -> Box<dyn Traceback + Send + Sync>
where
    E: StdError + Send + Sync + 'static,
{
    Box::new(Untraced(err))
}

/// Pull the display message and a bounded, earliest-first frame list
/// out of an error value. Errors without the [`Traceback`] capability
/// (or with an empty capture) yield an empty list.
pub(crate) fn extract_error(err: &(dyn Traceback + Send + Sync), max_stack: usize) -> (String, Vec<String>) {
    let trace = err
        .stack_trace()
        .iter()
        .take(max_stack)
        .map(ToString::to_string)
        .collect();
    (err.to_string(), trace)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(n: usize) -> Vec<StackFrame> {
        (0..n)
            .map(|i| StackFrame::new(format!("app::handler_{i}"), format!("src/f{i}.rs"), i as u32 + 1))
            .collect()
    }

    #[test]
    fn frame_renders_on_one_line() {
        let frame = StackFrame::new("app::run", "src/main.rs", 42);
        assert_eq!(frame.to_string(), "app::run src/main.rs:42");
    }

    #[test]
    fn trace_truncates_to_max_keeping_earliest() {
        let err = TracedError::with_frames("boom", frames(15));
        let (msg, trace) = extract_error(&err, DEFAULT_MAX_STACK_TRACE);
        assert_eq!(msg, "boom");
        assert_eq!(trace.len(), 10);
        assert_eq!(trace[0], "app::handler_0 src/f0.rs:1");
        assert_eq!(trace[9], "app::handler_9 src/f9.rs:10");
    }

    #[test]
    fn trace_shorter_than_max_is_kept_whole() {
        let err = TracedError::with_frames("boom", frames(3));
        let (_, trace) = extract_error(&err, DEFAULT_MAX_STACK_TRACE);
        assert_eq!(trace.len(), 3);
    }

    #[test]
    fn zero_max_yields_empty_trace() {
        let err = TracedError::with_frames("boom", frames(5));
        let (_, trace) = extract_error(&err, 0);
        assert!(trace.is_empty());
    }

    #[test]
    fn plain_error_has_no_trace() {
        let err = untraced(std::io::Error::new(std::io::ErrorKind::Other, "error occurred"));
        let (msg, trace) = extract_error(err.as_ref(), DEFAULT_MAX_STACK_TRACE);
        assert_eq!(msg, "error occurred");
        assert!(trace.is_empty());
    }

    #[test]
    fn wrap_keeps_message_and_source() {
        let inner = std::io::Error::new(std::io::ErrorKind::NotFound, "missing file");
        let err = TracedError::wrap(inner);
        assert_eq!(err.to_string(), "missing file");
        assert!(err.source().is_some());
    }

    #[test]
    fn message_error_round_trip() {
        let err = MessageError("error occurred".into());
        let (msg, trace) = extract_error(&err, DEFAULT_MAX_STACK_TRACE);
        assert_eq!(msg, "error occurred");
        assert!(trace.is_empty());
    }
}
