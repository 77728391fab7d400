//! Task lifecycle state machine.
//!
//! A task moves along a single line of states and never backwards:
//!
//! ```text
//! PENDIENTE -> EN_PROGRESO -> CITA_CONFIRMADA -> ENVIADA -> COMPLETADA
//! ```
//!
//! `COMPLETADA` is terminal. There is no branching and no cancellation state.

use serde::{Deserialize, Serialize};

/// Lifecycle state of an appointment task.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EstadoTarea {
    /// New tasks start here.
    #[default]
    Pendiente,
    EnProgreso,
    CitaConfirmada,
    Enviada,
    Completada,
}

impl EstadoTarea {
    /// All states in lifecycle order. Board columns are laid out in this order.
    pub const ALL: [EstadoTarea; 5] = [
        EstadoTarea::Pendiente,
        EstadoTarea::EnProgreso,
        EstadoTarea::CitaConfirmada,
        EstadoTarea::Enviada,
        EstadoTarea::Completada,
    ];

    /// Position of the state in the lifecycle, starting at 0.
    pub fn ordinal(self) -> usize {
        match self {
            EstadoTarea::Pendiente => 0,
            EstadoTarea::EnProgreso => 1,
            EstadoTarea::CitaConfirmada => 2,
            EstadoTarea::Enviada => 3,
            EstadoTarea::Completada => 4,
        }
    }

    /// The single successor, or `None` for the terminal state.
    pub fn next(self) -> Option<EstadoTarea> {
        Self::ALL.get(self.ordinal() + 1).copied()
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }

    /// Whether a saved task may go from `self` to `target`.
    ///
    /// Staying put and taking exactly one step forward are the only moves allowed.
    pub fn can_transition_to(self, target: EstadoTarea) -> bool {
        target == self || self.next() == Some(target)
    }

    /// Wire code, e.g. `CITA_CONFIRMADA`.
    pub fn as_code(self) -> &'static str {
        match self {
            EstadoTarea::Pendiente => "PENDIENTE",
            EstadoTarea::EnProgreso => "EN_PROGRESO",
            EstadoTarea::CitaConfirmada => "CITA_CONFIRMADA",
            EstadoTarea::Enviada => "ENVIADA",
            EstadoTarea::Completada => "COMPLETADA",
        }
    }

    /// Human label with underscores replaced, e.g. `CITA CONFIRMADA`.
    pub fn label(self) -> String {
        self.as_code().replace('_', " ")
    }
}

impl std::fmt::Display for EstadoTarea {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_code())
    }
}

impl std::str::FromStr for EstadoTarea {
    type Err = crate::DeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = s.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        Self::ALL
            .into_iter()
            .find(|state| state.as_code() == normalised)
            .ok_or_else(|| crate::DeskError::InvalidInput(format!("unknown task state: {s}")))
    }
}
