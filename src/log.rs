//! Logging interface, contingent on the optional `log` feature
//!
//! Only enable `log` when debugging, and when you're certain that your
//! logger isn't itself using USB.

macro_rules! debug {
    ($($args:tt)*) => {
        #[cfg(feature = "log")]
        ::log::debug!($($args)*)
    };
}

macro_rules! trace {
    ($($args:tt)*) => {
        #[cfg(feature = "log")]
        ::log::trace!($($args)*)
    };
}
