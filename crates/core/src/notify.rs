//! User-facing notifications.
//!
//! Every operation's outcome ends up as one of these at the call site. Failures show the
//! server's own message when it sent one, the validation text for input errors, and a
//! per-operation fallback otherwise.

use crate::DeskError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Success,
    Error,
    Info,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Success => "success",
            Level::Error => "error",
            Level::Info => "info",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: Level::Info,
            message: message.into(),
        }
    }

    /// Turn a failed operation into an error notification.
    pub fn from_error(err: &DeskError, fallback: &str) -> Self {
        let message = match err {
            DeskError::Api { .. } => err.server_message().unwrap_or(fallback).to_string(),
            DeskError::InvalidInput(msg) => msg.clone(),
            DeskError::InvalidTransition { .. }
            | DeskError::SaveInProgress
            | DeskError::LoginRequired
            | DeskError::NotFound { .. } => err.to_string(),
            DeskError::Unauthorized { .. } => {
                "La sesión expiró; inicie sesión nuevamente".to_string()
            }
            _ => fallback.to_string(),
        };
        Self::error(message)
    }
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.level.as_str(), self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_wins_over_fallback() {
        let err = DeskError::Api {
            status: 400,
            message: Some("Ya existe un paciente con ese número".into()),
        };
        let n = Notification::from_error(&err, "Error creando el paciente");
        assert_eq!(n.level, Level::Error);
        assert_eq!(n.message, "Ya existe un paciente con ese número");
    }

    #[test]
    fn transport_and_bare_api_errors_use_fallback() {
        let fallback = "Error al guardar la tarea";
        let bare = DeskError::Api {
            status: 500,
            message: None,
        };
        assert_eq!(Notification::from_error(&bare, fallback).message, fallback);
        let transport = DeskError::Transport("connection reset".into());
        assert_eq!(
            Notification::from_error(&transport, fallback).message,
            fallback
        );
    }

    #[test]
    fn validation_text_is_shown() {
        let err = DeskError::InvalidInput("patient name and identification number are required".into());
        assert_eq!(
            Notification::from_error(&err, "x").message,
            "patient name and identification number are required"
        );
        assert_eq!(
            Notification::success("Tarea creada correctamente").to_string(),
            "[success] Tarea creada correctamente"
        );
    }
}
