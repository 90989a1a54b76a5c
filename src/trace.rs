//! Stack trace capture for recovered panics.
//!
//! A trace is a list of lines, one per frame, most recent first. Frames from
//! the capture machinery and the panic runtime at the top of the stack are
//! dropped, and the number of frames is capped, so the first line usually
//! points at the code that panicked.
//!
//! With the `backtrace` feature the frames are resolved with the
//! [`backtrace`](https://docs.rs/backtrace) crate. Otherwise the standard
//! library's [`Backtrace`](std::backtrace::Backtrace) is captured and its
//! frames are filtered the same way.
//!
//! # Environment Variables
//!
//! - `RUST_BACKTRACE=full` disables filtering.
//! - `ERRORX_TRACE` holds comma-separated options:
//!   - `full` keeps the runtime frames at the top of the stack and removes
//!     the frame limit
//!   - `max=<n>` keeps at most `n` frames
//!
//! ```
//! use errorx::trace::{self, TraceFilter};
//!
//! let lines = trace::capture_with(&TraceFilter::FULL);
//! assert!(!lines.is_empty());
//! ```

use alloc::{format, string::String, vec::Vec};
use std::sync::OnceLock;

/// Controls which frames end up in a captured trace.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TraceFilter {
    /// Leading frames whose symbol belongs to one of these crates are
    /// dropped, up to the first frame from any other crate.
    pub skipped_initial_crates: &'static [&'static str],
    /// Maximum number of frames kept.
    pub max_frame_count: usize,
}

impl TraceFilter {
    /// Drops capture and panic runtime frames and keeps 30 frames.
    pub const DEFAULT: Self = Self {
        skipped_initial_crates: &[
            "backtrace",
            "errorx",
            "std",
            "core",
            "alloc",
            "rust_begin_unwind",
            "__rustc",
        ],
        max_frame_count: 30,
    };

    /// Keeps every frame.
    pub const FULL: Self = Self {
        skipped_initial_crates: &[],
        max_frame_count: usize::MAX,
    };

    /// The filter configured by the environment.
    ///
    /// The variables are read once per process.
    pub fn from_env() -> Self {
        static FILTER: OnceLock<TraceFilter> = OnceLock::new();

        *FILTER.get_or_init(|| {
            let rust_backtrace_full =
                std::env::var_os("RUST_BACKTRACE").is_some_and(|var| var == "full");
            let options = std::env::var_os("ERRORX_TRACE");
            let options = options.as_ref().map(|var| var.to_string_lossy());
            Self::parse_options(rust_backtrace_full, options.as_deref())
        })
    }

    fn parse_options(rust_backtrace_full: bool, options: Option<&str>) -> Self {
        if rust_backtrace_full {
            return Self::FULL;
        }

        let mut full = false;
        let mut max = None;
        for option in options.unwrap_or_default().split(',').map(str::trim) {
            if option.eq_ignore_ascii_case("full") {
                full = true;
            } else if let Some(value) = option.strip_prefix("max=")
                && let Ok(value) = value.parse()
            {
                max = Some(value);
            }
        }

        let base = if full { Self::FULL } else { Self::DEFAULT };
        Self {
            max_frame_count: max.unwrap_or(base.max_frame_count),
            ..base
        }
    }
}

impl Default for TraceFilter {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Captures the current stack using [`TraceFilter::from_env`].
pub fn capture() -> Vec<String> {
    capture_with(&TraceFilter::from_env())
}

/// Captures the current stack.
///
/// The result is never empty: when every frame is filtered out a note with
/// the number of omitted frames remains.
pub fn capture_with(filter: &TraceFilter) -> Vec<String> {
    render(capture_frames(), filter)
}

#[derive(Debug)]
struct RawFrame {
    symbol: String,
    location: Option<String>,
}

#[cfg(feature = "backtrace")]
fn capture_frames() -> Vec<RawFrame> {
    let mut frames = Vec::new();
    backtrace::trace(|frame| {
        backtrace::resolve_frame(frame, |symbol| {
            let Some(name) = symbol.name() else {
                return;
            };
            let location = match (symbol.filename(), symbol.lineno()) {
                (Some(file), Some(lineno)) => Some(format!("{}:{lineno}", file.display())),
                (Some(file), None) => Some(format!("{}", file.display())),
                _ => None,
            };
            frames.push(RawFrame {
                symbol: format!("{name:#}"),
                location,
            });
        });
        true
    });
    frames
}

#[cfg(not(feature = "backtrace"))]
fn capture_frames() -> Vec<RawFrame> {
    use std::backtrace::{Backtrace, BacktraceStatus};

    let backtrace = Backtrace::force_capture();
    if backtrace.status() != BacktraceStatus::Captured {
        return Vec::new();
    }
    parse_std_backtrace(&format!("{backtrace}"))
}

/// Splits the standard library's rendering into frames.
///
/// Frames look like `  3: symbol` optionally followed by `at path:line:col`.
#[cfg_attr(feature = "backtrace", allow(dead_code))]
fn parse_std_backtrace(rendered: &str) -> Vec<RawFrame> {
    let mut frames: Vec<RawFrame> = Vec::new();
    for line in rendered.lines().map(str::trim) {
        if let Some((index, symbol)) = line.split_once(": ")
            && !index.is_empty()
            && index.bytes().all(|byte| byte.is_ascii_digit())
        {
            frames.push(RawFrame {
                symbol: String::from(symbol),
                location: None,
            });
        } else if let Some(location) = line.strip_prefix("at ")
            && let Some(frame) = frames.last_mut()
            && frame.location.is_none()
        {
            frame.location = Some(String::from(location));
        }
    }
    frames
}

/// The crate a demangled symbol belongs to.
fn crate_of(symbol: &str) -> &str {
    let symbol = symbol.trim_start_matches('<');
    symbol.split("::").next().unwrap_or(symbol)
}

fn render(frames: Vec<RawFrame>, filter: &TraceFilter) -> Vec<String> {
    let mut lines = Vec::new();
    let mut omitted = 0usize;
    let mut initial_filtering = !filter.skipped_initial_crates.is_empty();

    for frame in frames {
        if initial_filtering {
            let name = crate_of(&frame.symbol);
            if filter.skipped_initial_crates.contains(&name) {
                omitted += 1;
                continue;
            }
            initial_filtering = false;
        }

        if lines.len() >= filter.max_frame_count {
            omitted += 1;
            continue;
        }

        lines.push(match frame.location {
            Some(location) => format!("{} at {location}", frame.symbol),
            None => frame.symbol,
        });
    }

    if omitted > 0 || lines.is_empty() {
        lines.push(format!(
            "note: {omitted} frame(s) omitted. For a complete trace, set RUST_BACKTRACE=full."
        ));
    }
    lines
}
