//! Conditional logging macros for native-http.
//!
//! The request layer runs inside host applications (Android, iOS) where a
//! tracing subscriber is not always installed, so every log line goes through
//! these macros instead of calling `tracing` directly.
//!
//! ## Feature Flags
//!
//! - `ffi`: When enabled, uses `println!`/`eprintln!` for output. This is useful for FFI
//!   bindings where log output from `tracing` doesn't reach the host's console.
//! - `subscriber` (default): provides [`init_logging`].
//!
//! ## Usage
//!
//! ```rust
//! use native_http_log::{log_debug, log_error, log_info};
//!
//! log_info!("Http request {} finished in {} ms", "https://api.test/items", 42);
//! log_error!("Failed to decode payload: {:?}", "unexpected token");
//! log_debug!("Issued request with token {}", "7");
//! ```

// Re-export tracing for use in macros when not in FFI mode
#[cfg(not(feature = "ffi"))]
#[doc(hidden)]
pub use tracing;

/// Severity used by the FFI output path
#[cfg(feature = "ffi")]
#[doc(hidden)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiLevel {
    /// stderr
    Error,
    /// stderr
    Warn,
    /// stdout
    Info,
    /// stdout, debug builds only
    Debug,
    /// dropped
    Trace,
}

/// Write one log line in FFI mode.
///
/// Errors and warnings go to stderr, everything else to stdout. Debug lines
/// are only printed by debug builds and trace lines are dropped.
#[cfg(feature = "ffi")]
#[doc(hidden)]
#[inline]
pub fn _emit(level: FfiLevel, msg: std::fmt::Arguments<'_>) {
    match level {
        FfiLevel::Error => eprintln!("[native-http ERROR] {}", msg),
        FfiLevel::Warn => eprintln!("[native-http WARN] {}", msg),
        FfiLevel::Info => println!("[native-http INFO] {}", msg),
        FfiLevel::Debug => {
            #[cfg(debug_assertions)]
            println!("[native-http DEBUG] {}", msg);
        }
        FfiLevel::Trace => {}
    }
}

#[cfg(feature = "ffi")]
#[doc(hidden)]
#[macro_export]
macro_rules! __log_at {
    (error, $($arg:tt)*) => { $crate::_emit($crate::FfiLevel::Error, format_args!($($arg)*)) };
    (warn, $($arg:tt)*) => { $crate::_emit($crate::FfiLevel::Warn, format_args!($($arg)*)) };
    (info, $($arg:tt)*) => { $crate::_emit($crate::FfiLevel::Info, format_args!($($arg)*)) };
    (debug, $($arg:tt)*) => { $crate::_emit($crate::FfiLevel::Debug, format_args!($($arg)*)) };
    (trace, $($arg:tt)*) => { $crate::_emit($crate::FfiLevel::Trace, format_args!($($arg)*)) };
}

#[cfg(not(feature = "ffi"))]
#[doc(hidden)]
#[macro_export]
macro_rules! __log_at {
    ($level:ident, $($arg:tt)*) => { $crate::tracing::$level!($($arg)*) };
}

/// Log an error-level message.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => { $crate::__log_at!(error, $($arg)*) };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => { $crate::__log_at!(warn, $($arg)*) };
}

/// Log an info-level message.
///
/// In FFI mode this prints to stdout, otherwise it is `tracing::info!`.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => { $crate::__log_at!(info, $($arg)*) };
}

/// Log a debug-level message.
///
/// In FFI mode this prints to stdout in debug builds only.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => { $crate::__log_at!(debug, $($arg)*) };
}

/// Log a trace-level message. No-op in FFI mode.
#[macro_export]
macro_rules! log_trace {
    ($($arg:tt)*) => { $crate::__log_at!(trace, $($arg)*) };
}

/// Install a `tracing-subscriber` formatter writing to stdout.
///
/// `level` is an `EnvFilter` directive such as `"debug"` or
/// `"native_http=trace,info"`; an unparsable directive falls back to `info`.
/// Only the first call in a process has an effect, and a subscriber installed
/// by the host application beforehand is left untouched.
#[cfg(feature = "subscriber")]
pub fn init_logging(level: &str) {
    use std::sync::Once;

    use tracing_subscriber::{fmt, EnvFilter};

    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

        let _ = fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_ansi(false)
            .try_init();
    });
}
