//! Pending-work reminder.

use crate::lifecycle::EstadoTarea;
use crate::task::Task;

/// Counts of tasks that still need attention.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Reminder {
    pub pendientes: usize,
    pub en_progreso: usize,
}

impl Reminder {
    pub fn evaluate(tasks: &[Task]) -> Self {
        tasks.iter().fold(Self::default(), |mut acc, task| {
            match task.estado {
                EstadoTarea::Pendiente => acc.pendientes += 1,
                EstadoTarea::EnProgreso => acc.en_progreso += 1,
                _ => {}
            }
            acc
        })
    }

    /// Whether the banner should be shown at all.
    pub fn is_due(&self) -> bool {
        self.pendientes > 0 || self.en_progreso > 0
    }

    /// Banner text, or `None` when nothing is pending.
    pub fn message(&self) -> Option<String> {
        self.is_due().then(|| self.to_string())
    }
}

impl std::fmt::Display for Reminder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Tienes {} tareas pendientes y {} en progreso",
            self.pendientes, self.en_progreso
        )
    }
}
