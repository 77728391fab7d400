//! Client-side filters over loaded tasks and patients.
//!
//! Filters are plain predicates: every criterion that is set must match, unset criteria
//! match everything, and applying a filter twice gives the same result as applying it once.

use crate::lifecycle::EstadoTarea;
use crate::patient::{Eps, Patient, TipoPaciente};
use crate::task::{Prioridad, Task};

fn normalise(text: &Option<String>) -> Option<String> {
    text.as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

/// Name (case-insensitive substring) or id-number (substring) match.
fn matches_person(search: &str, nombre: &str, numero: &str) -> bool {
    nombre.to_lowercase().contains(search) || numero.contains(search)
}

/// Task board filter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub estado: Option<EstadoTarea>,
    /// Case-insensitive substring of the specialty.
    pub especialidad: Option<String>,
    pub prioridad: Option<Prioridad>,
    /// Patient name (case-insensitive) or id-number.
    pub search: Option<String>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        if self.estado.is_some_and(|e| e != task.estado) {
            return false;
        }
        if self.prioridad.is_some_and(|p| p != task.priority()) {
            return false;
        }
        if let Some(especialidad) = normalise(&self.especialidad) {
            let task_especialidad = task.especialidad.as_deref().unwrap_or("").to_lowercase();
            if !task_especialidad.contains(&especialidad) {
                return false;
            }
        }
        if let Some(search) = normalise(&self.search) {
            if !matches_person(&search, task.patient_name(), task.patient_id_number()) {
                return false;
            }
        }
        true
    }

    pub fn apply<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        tasks.iter().filter(|t| self.matches(t)).collect()
    }
}

/// Patient registry filter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatientFilter {
    pub tipo: Option<TipoPaciente>,
    pub eps: Option<Eps>,
    /// Name (case-insensitive) or id-number.
    pub search: Option<String>,
}

impl PatientFilter {
    pub fn matches(&self, patient: &Patient) -> bool {
        if self.tipo.is_some_and(|t| t != patient.tipo_paciente) {
            return false;
        }
        if self.eps.is_some() && self.eps != patient.eps {
            return false;
        }
        if let Some(search) = normalise(&self.search) {
            if !matches_person(
                &search,
                &patient.nombre_completo,
                &patient.numero_identificacion,
            ) {
                return false;
            }
        }
        true
    }

    pub fn apply<'a>(&self, patients: &'a [Patient]) -> Vec<&'a Patient> {
        patients.iter().filter(|p| self.matches(p)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::tests::sample_task;

    fn tasks() -> Vec<Task> {
        let mut a = sample_task(1, EstadoTarea::Pendiente);
        a.especialidad = Some("Cardiología".into());
        let mut b = sample_task(2, EstadoTarea::Pendiente);
        b.especialidad = Some("Dermatología".into());
        b.prioridad = Some(Prioridad::Baja);
        if let Some(p) = b.paciente.as_mut() {
            p.nombre_completo = "Luis Mora".into();
        }
        let c = sample_task(3, EstadoTarea::Completada);
        vec![a, b, c]
    }

    fn ids(tasks: &[&Task]) -> Vec<i64> {
        tasks.iter().map(|t| t.id).collect()
    }

    #[test]
    fn empty_filter_keeps_everything() {
        let all = tasks();
        assert_eq!(TaskFilter::default().apply(&all).len(), 3);
    }

    #[test]
    fn criteria_are_anded() {
        let all = tasks();
        let filter = TaskFilter {
            estado: Some(EstadoTarea::Pendiente),
            especialidad: Some("CARDIO".into()),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&all)), vec![1]);

        let filter = TaskFilter {
            estado: Some(EstadoTarea::Pendiente),
            prioridad: Some(Prioridad::Alta),
            search: Some("luis".into()),
            ..Default::default()
        };
        assert!(filter.apply(&all).is_empty());
    }

    #[test]
    fn search_matches_name_or_id_number() {
        let all = tasks();
        let by_name = TaskFilter {
            search: Some("  MORA ".into()),
            ..Default::default()
        };
        assert_eq!(ids(&by_name.apply(&all)), vec![2]);
        let by_id = TaskFilter {
            search: Some("103".into()),
            ..Default::default()
        };
        assert_eq!(ids(&by_id.apply(&all)), vec![3]);
    }

    #[test]
    fn filtering_is_idempotent() {
        let all = tasks();
        let filter = TaskFilter {
            estado: Some(EstadoTarea::Pendiente),
            ..Default::default()
        };
        let once: Vec<Task> = filter.apply(&all).into_iter().cloned().collect();
        let twice: Vec<Task> = filter.apply(&once).into_iter().cloned().collect();
        assert_eq!(once, twice);
    }

    #[test]
    fn patient_filter_by_type_eps_and_text() {
        let patients: Vec<Patient> = serde_json::from_str(
            r#"[
                {"nombreCompleto":"Ana Ruiz","numeroIdentificacion":"11","eps":"EPS_SURA"},
                {"nombreCompleto":"Pablo Ruiz","numeroIdentificacion":"12","eps":"EPS_SURA","parentesco":"HIJO_A"},
                {"nombreCompleto":"Carla Díaz","numeroIdentificacion":"13","eps":"NUEVA_EPS"}
            ]"#,
        )
        .unwrap();
        let filter = PatientFilter {
            eps: Some(Eps::EpsSura),
            search: Some("ruiz".into()),
            ..Default::default()
        };
        assert_eq!(filter.apply(&patients).len(), 2);
        let filter = PatientFilter {
            tipo: Some(TipoPaciente::Beneficiario),
            ..filter
        };
        let found = filter.apply(&patients);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].numero_identificacion, "12");
        let once: Vec<Patient> = found.into_iter().cloned().collect();
        assert_eq!(filter.apply(&once).len(), 1);
    }
}
