use tracing_subscriber::fmt::time::uptime;
use tracing_subscriber::EnvFilter;

/// Verbosity chosen on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
    Trace,
}

impl Verbosity {
    pub fn from_flags(verbose: u8, quiet: bool) -> Self {
        match (quiet, verbose) {
            (true, _) => Self::Quiet,
            (false, 0) => Self::Normal,
            (false, 1) => Self::Verbose,
            (false, _) => Self::Trace,
        }
    }

    /// Filter directive for this verbosity, or `None` to use the configured level.
    pub fn directive(self) -> Option<&'static str> {
        match self {
            Self::Quiet => Some("error"),
            Self::Normal => None,
            Self::Verbose => Some("debug"),
            Self::Trace => Some("trace"),
        }
    }
}

/// Installs the global subscriber: compact output with uptime timestamps.
///
/// `RUST_LOG` wins over both the flags and `configured_level`. Calling this
/// twice is harmless; the second call leaves the first subscriber in place.
pub fn setup_tracing(configured_level: &str, verbosity: Verbosity) {
    let default_directive = verbosity.directive().unwrap_or(configured_level);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_timer(uptime())
        .compact()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_map_to_verbosity() {
        assert_eq!(Verbosity::from_flags(0, false), Verbosity::Normal);
        assert_eq!(Verbosity::from_flags(1, false), Verbosity::Verbose);
        assert_eq!(Verbosity::from_flags(3, false), Verbosity::Trace);
        assert_eq!(Verbosity::from_flags(2, true), Verbosity::Quiet);
        assert_eq!(Verbosity::Normal.directive(), None);
    }
}
