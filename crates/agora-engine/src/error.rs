//! Error types for the engine binary.

/// Top-level error for the engine binary.
///
/// Each variant wraps a subsystem error so `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: agora_core::config::ConfigError,
    },

    /// Building the initial state failed.
    #[error("spawner error: {source}")]
    Spawn {
        /// The underlying spawner error.
        #[from]
        source: agora_core::SpawnError,
    },

    /// The simulation run failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: agora_core::RunnerError,
    },

    /// Opening or writing the telemetry file failed.
    #[error("telemetry I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The log filter could not be parsed.
    #[error("invalid log filter: {message}")]
    Logging {
        /// Description of the failure.
        message: String,
    },
}
