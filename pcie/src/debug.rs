//! Debug output module.
//!
//! Level-specific debugging macros are provided:
//!
//! * [debugln!]
//! * [infoln!]
//! * [warnln!]
//! * [errorln!]
//!
//! Messages are handed to the [DebugSink] registered with [set_sink]. Until
//! a sink is registered, output is dropped.

use crate::sync::SpinLock;
use core::fmt;

/// Logging levels
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum Level {
    /// Debugging information
    Debug,
    /// General informational messages
    Info,
    /// Non-critical warnings
    Warn,
    /// Critical errors
    Error,
}

/// Destination for debug output, usually the boot console
pub trait DebugSink: Sync {
    /// Writes a single formatted message of given `level`
    fn write(&self, level: Level, args: fmt::Arguments);
}

static SINK: SpinLock<Option<&'static dyn DebugSink>> = SpinLock::new(None);

/// Registers `sink` as the destination of all debug output
pub fn set_sink(sink: &'static dyn DebugSink) {
    *SINK.lock() = Some(sink);
}

/// Writes a message, annotated with current file and line, with a newline, to
/// debug level output.
///
/// Compiled out unless the `verbose` feature is enabled or tests are built.
#[macro_export]
macro_rules! debugln {
    ($($it:tt)+) => (
        if cfg!(any(test, feature = "verbose")) {
            $crate::debug::_debug($crate::debug::Level::Debug, format_args!("[{}:{}] {}\n", file!(), line!(), format_args!($($it)+)))
        }
    )
}

/// Writes a message, annotated with current file and line, with a newline, to
/// info level output.
#[macro_export]
macro_rules! infoln {
    ($($it:tt)+) => (
        $crate::debug::_debug($crate::debug::Level::Info, format_args!("[{}:{}] {}\n", file!(), line!(), format_args!($($it)+)))
    )
}

/// Writes a message, annotated with current file and line, with a newline, to
/// warning level output.
#[macro_export]
macro_rules! warnln {
    ($($it:tt)+) => (
        $crate::debug::_debug($crate::debug::Level::Warn, format_args!("[{}:{}] {}\n", file!(), line!(), format_args!($($it)+)))
    )
}

/// Writes a message, annotated with current file and line, with a newline, to
/// error level output.
#[macro_export]
macro_rules! errorln {
    ($($it:tt)+) => (
        $crate::debug::_debug($crate::debug::Level::Error, format_args!("[{}:{}] {}\n", file!(), line!(), format_args!($($it)+)))
    )
}

#[doc(hidden)]
pub fn _debug(level: Level, args: fmt::Arguments) {
    let sink = *SINK.lock();
    if let Some(sink) = sink {
        sink.write(level, args);
    }
}
