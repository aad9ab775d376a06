//! Crate-local logging macros.

/// Evaluates the given expression and logs how long the evaluation took at
/// info level.
macro_rules! with_timing_info_logging {
    ($message:expr $(,$arg:expr)*; $expression:expr) => {{
        let _start_time = ::std::time::Instant::now();
        let _result = $expression;
        let _duration = _start_time.elapsed();
        ::log::info!(
            concat!($message, " took {:.2} ms")$(,$arg)*,
            _duration.as_secs_f64() * 1e3,
        );
        _result
    }};
}

/// Evaluates the given expression with debug logging before and after.
macro_rules! with_debug_logging {
    ($message:expr $(,$arg:expr)*; $expression:expr) => {{
        ::log::debug!(concat!("Begin: ", $message)$(,$arg)*);
        let _result = $expression;
        ::log::debug!(concat!("Done: ", $message)$(,$arg)*);
        _result
    }};
}
