use std::fmt;
use std::time::{Duration, Instant};

/// Runs `f`, returning its value together with how long it took.
pub fn measure<T>(f: impl FnOnce() -> T) -> (T, Elapsed) {
    let tt = Instant::now();
    let val = f();

    (val, Elapsed(tt.elapsed()))
}

/// Wall-clock duration of a measured step; formatted with `humantime` when
/// the `metrics` feature is enabled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Elapsed(pub Duration);

impl Elapsed {
    pub fn get(&self) -> Duration {
        self.0
    }
}

impl fmt::Display for Elapsed {
    #[cfg(feature = "metrics")]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", humantime::format_duration(self.0))
    }

    #[cfg(not(feature = "metrics"))]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}
