//! Task (appointment request) model.
//!
//! Tasks carry an embedded patient snapshot as returned by the task service. Writes
//! always send the full record ([`TaskPayload`]); the backend replaces every field.

use crate::lifecycle::EstadoTarea;
use crate::patient::{Eps, Patient};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Task priority.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Prioridad {
    Alta,
    #[default]
    Media,
    Baja,
}

impl Prioridad {
    pub const ALL: [Prioridad; 3] = [Prioridad::Alta, Prioridad::Media, Prioridad::Baja];

    pub fn as_code(self) -> &'static str {
        match self {
            Prioridad::Alta => "ALTA",
            Prioridad::Media => "MEDIA",
            Prioridad::Baja => "BAJA",
        }
    }
}

impl std::fmt::Display for Prioridad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_code())
    }
}

impl std::str::FromStr for Prioridad {
    type Err = crate::DeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|p| p.as_code() == code)
            .ok_or_else(|| crate::DeskError::InvalidInput(format!("unknown priority: {s}")))
    }
}

/// An appointment task as listed by `GET {tasks}`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub estado: EstadoTarea,
    #[serde(default)]
    pub prioridad: Option<Prioridad>,
    #[serde(default)]
    pub tipo_cita: Option<String>,
    #[serde(default)]
    pub especialidad: Option<String>,
    #[serde(default)]
    pub autorizacion: Option<String>,
    #[serde(default)]
    pub orden: Option<String>,
    #[serde(default)]
    pub radicado: Option<String>,
    #[serde(default)]
    pub especificaciones: Option<String>,
    #[serde(default)]
    pub observacion: Option<String>,
    #[serde(default)]
    pub fecha_creacion: Option<NaiveDateTime>,
    #[serde(default)]
    pub fecha_actualizacion: Option<NaiveDateTime>,
    #[serde(default)]
    pub paciente: Option<Patient>,
    #[serde(default)]
    pub fecha_solicitud_serviconli: Option<NaiveDate>,
    #[serde(default)]
    pub fecha_cita: Option<NaiveDate>,
    #[serde(default)]
    pub hora_cita: Option<String>,
    #[serde(default)]
    pub doctor: Option<String>,
    #[serde(default)]
    pub direccion_cita: Option<String>,
    #[serde(default)]
    pub lugar_cita: Option<String>,
    #[serde(default)]
    pub informacion_cita: Option<String>,
    #[serde(default)]
    pub confirmacion_cita: Option<String>,
}

impl Task {
    /// Name of the linked patient, or an empty string.
    pub fn patient_name(&self) -> &str {
        self.paciente
            .as_ref()
            .map(|p| p.nombre_completo.as_str())
            .unwrap_or("")
    }

    /// Id-number of the linked patient, or an empty string.
    pub fn patient_id_number(&self) -> &str {
        self.paciente
            .as_ref()
            .map(|p| p.numero_identificacion.as_str())
            .unwrap_or("")
    }

    pub fn priority(&self) -> Prioridad {
        self.prioridad.unwrap_or_default()
    }

    /// Fields shown by the observations view, with the placeholders the desk uses
    /// for empty values.
    pub fn observations(&self) -> Vec<(&'static str, String)> {
        fn or(value: &Option<String>, placeholder: &str) -> String {
            value
                .as_deref()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(placeholder)
                .to_string()
        }
        vec![
            ("Autorización", or(&self.autorizacion, "N/A")),
            ("Orden", or(&self.orden, "N/A")),
            ("Radicado", or(&self.radicado, "N/A")),
            ("Especificaciones", or(&self.especificaciones, "N/A")),
            ("Información Cita", or(&self.informacion_cita, "N/A")),
            ("Observación General", or(&self.observacion, "Ninguna")),
        ]
    }
}

/// Body of `POST {tasks}` and `PUT {tasks}/:id`.
///
/// Every field is always present (unset values serialise as `null`) because the
/// update endpoint replaces the whole record. The insured-party reference is only
/// sent when known.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPayload {
    pub paciente_numero_identificacion: Option<String>,
    pub tipo_cita: Option<String>,
    pub prioridad: Prioridad,
    pub estado: EstadoTarea,
    pub especialidad: Option<String>,
    pub autorizacion: Option<String>,
    pub orden: Option<String>,
    pub radicado: Option<String>,
    pub especificaciones: Option<String>,
    pub observacion: Option<String>,
    pub fecha_solicitud_serviconli: Option<NaiveDate>,
    pub fecha_cita: Option<NaiveDate>,
    pub hora_cita: Option<String>,
    pub doctor: Option<String>,
    pub direccion_cita: Option<String>,
    pub lugar_cita: Option<String>,
    pub informacion_cita: Option<String>,
    pub confirmacion_cita: Option<String>,
    pub eps: Option<Eps>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cotizante_numero_identificacion: Option<String>,
}

impl TaskPayload {
    /// Re-send an in-memory task with a new state and everything else unchanged.
    pub fn from_task(task: &Task, estado: EstadoTarea) -> Self {
        let paciente = task.paciente.as_ref();
        TaskPayload {
            paciente_numero_identificacion: paciente
                .map(|p| p.numero_identificacion.clone())
                .filter(|n| !n.is_empty()),
            tipo_cita: task.tipo_cita.clone(),
            prioridad: task.priority(),
            estado,
            especialidad: task.especialidad.clone(),
            autorizacion: task.autorizacion.clone(),
            orden: task.orden.clone(),
            radicado: task.radicado.clone(),
            especificaciones: task.especificaciones.clone(),
            observacion: task.observacion.clone(),
            fecha_solicitud_serviconli: task.fecha_solicitud_serviconli,
            fecha_cita: task.fecha_cita,
            hora_cita: task.hora_cita.clone(),
            doctor: task.doctor.clone(),
            direccion_cita: task.direccion_cita.clone(),
            lugar_cita: task.lugar_cita.clone(),
            informacion_cita: task.informacion_cita.clone(),
            confirmacion_cita: task.confirmacion_cita.clone(),
            eps: paciente.and_then(|p| p.eps),
            cotizante_numero_identificacion: None,
        }
    }
}

/// One state change recorded by the task service.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub tarea_id: Option<i64>,
    #[serde(default)]
    pub estado_anterior: Option<EstadoTarea>,
    pub estado_nuevo: EstadoTarea,
    #[serde(default)]
    pub fecha_cambio: Option<NaiveDateTime>,
    #[serde(default)]
    pub usuario_cambio: Option<String>,
    #[serde(default)]
    pub descripcion_cambio: Option<String>,
}

/// Sort history entries oldest first; entries without a timestamp go last.
pub fn sort_history(entries: &mut [HistoryEntry]) {
    entries.sort_by_key(|e| (e.fecha_cambio.is_none(), e.fecha_cambio, e.id));
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn task_json(id: i64, estado: &str) -> String {
        format!(
            r#"{{
                "id": {id},
                "estado": "{estado}",
                "prioridad": "ALTA",
                "tipoCita": "ESPECIALISTA",
                "especialidad": "Cardiología",
                "autorizacion": "AUT-1",
                "radicado": "RAD-9",
                "fechaCreacion": "2024-05-02T08:15:00",
                "fechaCita": "2024-05-10",
                "horaCita": "08:30",
                "doctor": "Pérez",
                "lugarCita": "Clínica Norte",
                "paciente": {{
                    "nombreCompleto": "Ana Torres",
                    "numeroIdentificacion": "10{id}",
                    "tipoIdentificacion": "CÉDULA DE CIUDADANÍA",
                    "celular": "300 123 4567",
                    "eps": "EPS_SURA"
                }}
            }}"#
        )
    }

    pub(crate) fn sample_task(id: i64, estado: EstadoTarea) -> Task {
        serde_json::from_str(&task_json(id, estado.as_code())).expect("task json")
    }

    #[test]
    fn decodes_backend_task() {
        let task = sample_task(3, EstadoTarea::EnProgreso);
        assert_eq!(task.estado, EstadoTarea::EnProgreso);
        assert_eq!(task.priority(), Prioridad::Alta);
        assert_eq!(task.patient_name(), "Ana Torres");
        assert_eq!(task.fecha_cita, NaiveDate::from_ymd_opt(2024, 5, 10));
        assert!(task.fecha_creacion.is_some());
    }

    #[test]
    fn unknown_state_is_rejected() {
        let json = task_json(1, "CANCELADA");
        assert!(serde_json::from_str::<Task>(&json).is_err());
    }

    #[test]
    fn payload_changes_only_the_state() {
        let task = sample_task(5, EstadoTarea::Pendiente);
        let payload = TaskPayload::from_task(&task, EstadoTarea::EnProgreso);
        assert_eq!(payload.estado, EstadoTarea::EnProgreso);
        assert_eq!(payload.paciente_numero_identificacion.as_deref(), Some("105"));
        assert_eq!(payload.eps, Some(Eps::EpsSura));
        assert_eq!(payload.doctor.as_deref(), Some("Pérez"));
        assert_eq!(payload.fecha_cita, task.fecha_cita);

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["estado"], "EN_PROGRESO");
        assert_eq!(json["fechaCita"], "2024-05-10");
        assert!(json["orden"].is_null());
        assert!(json.get("cotizanteNumeroIdentificacion").is_none());
    }

    #[test]
    fn observations_use_placeholders() {
        let task = sample_task(1, EstadoTarea::Pendiente);
        let obs = task.observations();
        assert_eq!(obs[0], ("Autorización", "AUT-1".to_string()));
        assert_eq!(obs[1], ("Orden", "N/A".to_string()));
        assert_eq!(obs[5], ("Observación General", "Ninguna".to_string()));
    }

    #[test]
    fn history_sorts_oldest_first() {
        let mut entries: Vec<HistoryEntry> = serde_json::from_str(
            r#"[
                {"id": 2, "estadoAnterior": "PENDIENTE", "estadoNuevo": "EN_PROGRESO", "fechaCambio": "2024-05-03T10:00:00"},
                {"id": 1, "estadoNuevo": "PENDIENTE", "fechaCambio": "2024-05-01T09:00:00"}
            ]"#,
        )
        .unwrap();
        sort_history(&mut entries);
        assert_eq!(entries[0].estado_nuevo, EstadoTarea::Pendiente);
        assert_eq!(entries[1].estado_anterior, Some(EstadoTarea::Pendiente));
    }
}
