// A simple logging macro. This delegates to the 'log' crate when the
// 'logging' feature is enabled and compiles to nothing otherwise. The
// indirection lets call sites use debug!/trace! unconditionally.
macro_rules! log {
    ($($tt:tt)*) => {
        #[cfg(feature = "logging")]
        {
            $($tt)*
        }
    }
}

macro_rules! debug {
    ($($tt:tt)*) => { log!(log::debug!($($tt)*)) }
}

macro_rules! trace {
    ($($tt:tt)*) => { log!(log::trace!($($tt)*)) }
}
