use crate::lifecycle::EstadoTarea;

#[derive(Debug, thiserror::Error)]
pub enum DeskError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no stored session token; run `servisoft login` first")]
    LoginRequired,
    #[error("session rejected by the server (HTTP {status})")]
    Unauthorized { status: u16 },

    #[error("{resource} not found: {key}")]
    NotFound { resource: &'static str, key: String },
    #[error("server returned HTTP {status}{}", suffix(.message))]
    Api { status: u16, message: Option<String> },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("unexpected response shape at {path}: {message}")]
    Decode { path: String, message: String },

    #[error("cannot move task {task_id} from {from} to {to}")]
    InvalidTransition {
        task_id: i64,
        from: EstadoTarea,
        to: EstadoTarea,
    },
    #[error("a task save is already in progress")]
    SaveInProgress,

    #[error("failed to read session file: {0}")]
    SessionRead(std::io::Error),
    #[error("failed to write session file: {0}")]
    SessionWrite(std::io::Error),
    #[error("session file is corrupt: {0}")]
    SessionFormat(serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("failed to read config file: {0}")]
    ConfigRead(std::io::Error),

    #[error("failed to write report: {0}")]
    ReportWrite(std::io::Error),
    #[error("failed to build report: {0}")]
    ReportFormat(String),
}

impl DeskError {
    /// The `message` field of a failed write, when the server supplied one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            DeskError::Api {
                message: Some(m), ..
            } => Some(m.as_str()),
            _ => None,
        }
    }

    /// True for 401/403 responses, which force a logout.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, DeskError::Unauthorized { .. })
    }
}

impl From<servisoft_types::TextError> for DeskError {
    fn from(err: servisoft_types::TextError) -> Self {
        DeskError::InvalidInput(err.to_string())
    }
}

fn suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {m}"))
        .unwrap_or_default()
}

pub type DeskResult<T> = std::result::Result<T, DeskError>;
