use thiserror::Error;

/// Coarse classification of a [`PanelError`], stable across variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Round-trip failed or the panel answered with an unexpected status.
    Transport,
    /// Body is not JSON or lacks the common envelope shape.
    DecodeCommon,
    /// Protocol-specific envelope failed to decode.
    DecodeProtocol,
    /// VMess `network_settings` is not a valid extra config.
    DecodeExtra,
    /// VLESS `tls_settings` is malformed in Reality mode.
    DecodeTls,
    /// Client configuration or key material is invalid.
    Config,
}

#[derive(Debug, Error)]
pub enum PanelError {
    #[error("request {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request {path} returned status {status}: {body}")]
    Status {
        path: String,
        status: u16,
        body: String,
    },

    #[error("decode common params error ({path}): {reason}")]
    DecodeCommon { path: String, reason: String },

    #[error("decode {protocol} params error ({path}): {source}")]
    DecodeProtocol {
        path: String,
        protocol: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("decode vmess extra config error ({path}): {source}")]
    DecodeExtra {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("decode vless tls settings error ({path}): {source}")]
    DecodeTls {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid client config: {0}")]
    Config(String),

    #[error("invalid reality key: {0}")]
    RealityKey(String),
}

impl PanelError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PanelError::Transport { .. } | PanelError::Status { .. } => ErrorKind::Transport,
            PanelError::DecodeCommon { .. } => ErrorKind::DecodeCommon,
            PanelError::DecodeProtocol { .. } => ErrorKind::DecodeProtocol,
            PanelError::DecodeExtra { .. } => ErrorKind::DecodeExtra,
            PanelError::DecodeTls { .. } => ErrorKind::DecodeTls,
            PanelError::Config(_) | PanelError::RealityKey(_) => ErrorKind::Config,
        }
    }

    /// Request path the error is attached to, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            PanelError::Transport { path, .. }
            | PanelError::Status { path, .. }
            | PanelError::DecodeCommon { path, .. }
            | PanelError::DecodeProtocol { path, .. }
            | PanelError::DecodeExtra { path, .. }
            | PanelError::DecodeTls { path, .. } => Some(path),
            PanelError::Config(_) | PanelError::RealityKey(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PanelError>;
