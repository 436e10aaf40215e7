/// The type returned when loading or parsing configuration fails.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    /// Configuration file is not valid TOML or is missing fields.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// The type returned when a lobby request is rejected before it reaches the
/// transport.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LobbyError {
    /// Session names must be non-empty.
    #[error("session name cannot be empty")]
    EmptyName,
}
