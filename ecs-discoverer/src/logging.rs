use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

/// Where log lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStream {
    Stdout,
    Stderr,
}

impl LogStream {
    /// `--debug` reports exclusions on stdout; otherwise stdout holds only the address line.
    pub fn for_debug(debug: bool) -> Self {
        if debug {
            LogStream::Stdout
        } else {
            LogStream::Stderr
        }
    }

    fn make_writer(self) -> BoxMakeWriter {
        match self {
            LogStream::Stdout => BoxMakeWriter::new(std::io::stdout),
            LogStream::Stderr => BoxMakeWriter::new(std::io::stderr),
        }
    }
}

/// Initialize tracing.
///
/// `--debug` raises the crate to `debug`, which is where excluded candidates
/// are reported. `RUST_LOG` overrides both defaults.
pub fn init_logging(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(debug)));

    // Already initialized (tests, embedding) is fine
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(LogStream::for_debug(debug).make_writer())
        .with_target(false)
        .with_level(true)
        .try_init();
}

fn default_directive(debug: bool) -> &'static str {
    if debug {
        "ecs_discoverer=debug"
    } else {
        "ecs_discoverer=warn"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(true), "ecs_discoverer=debug");
        assert_eq!(default_directive(false), "ecs_discoverer=warn");
    }

    #[test]
    fn test_logs_leave_stdout_without_debug() {
        assert_eq!(LogStream::for_debug(false), LogStream::Stderr);
        assert_eq!(LogStream::for_debug(true), LogStream::Stdout);
    }
}
