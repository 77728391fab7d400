//! Dashboard counters.

use crate::lifecycle::EstadoTarea;
use crate::patient::Patient;
use crate::task::Task;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub patients: usize,
    pub pending_tasks: usize,
}

impl DashboardStats {
    pub fn compute(patients: &[Patient], tasks: &[Task]) -> Self {
        Self {
            patients: patients.len(),
            pending_tasks: tasks
                .iter()
                .filter(|t| t.estado == EstadoTarea::Pendiente)
                .count(),
        }
    }
}
