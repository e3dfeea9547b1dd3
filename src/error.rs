//! Error types for the attitude engine

/// Errors raised while reading or composing attitude.
///
/// None of these are fatal to the host render loop; the engine holds the last
/// known attitude and reports the condition upward.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum AttitudeError {
    /// The attitude source has not produced a sample yet.
    #[error("no attitude sample has been received")]
    NoSample,

    /// A relative attitude was requested before the reference frame was reset.
    #[error("no reference frame captured; reset the reference frame first")]
    NoReferenceFrame,

    /// A quaternion with (near) zero norm cannot be normalized.
    #[error("degenerate quaternion with norm {norm}")]
    DegenerateQuaternion { norm: f32 },

    /// Every sample publisher was dropped before the awaited sample arrived.
    #[error("attitude source closed")]
    SourceClosed,
}

/// Errors raised while loading tracker settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid settings: {0}")]
    Invalid(String),
}
