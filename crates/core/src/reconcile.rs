//! Patient reconciliation on task save.
//!
//! A task form carries a patient section. Before the task is written, that section is
//! matched against the patient service:
//!
//! - no match: the patient is created under the sub-resource for the form's patient type
//! - match with differences: the existing record is updated under *its* type
//! - match without differences: nothing is written
//!
//! There is no concurrency control; the last write wins.

use crate::api::{PatientApi, PatientLookup};
use crate::lifecycle::EstadoTarea;
use crate::patient::{
    Eps, Parentesco, Patient, PatientPayload, TipoIdentificacion, TipoPaciente,
};
use crate::task::{Prioridad, Task, TaskPayload};
use crate::{DeskError, DeskResult};
use chrono::NaiveDate;
use servisoft_types::{IdNumber, NonEmptyText};

fn clean(value: &Option<String>) -> Option<String> {
    NonEmptyText::from_optional(value.as_deref()).map(NonEmptyText::into_string)
}

/// Patient section of the task form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatientForm {
    pub tipo_paciente: Option<TipoPaciente>,
    pub tipo_identificacion: Option<TipoIdentificacion>,
    pub numero_identificacion: String,
    pub nombre_completo: Option<String>,
    pub celular: Option<String>,
    pub correo: Option<String>,
    pub direccion_residencia: Option<String>,
    pub eps: Option<Eps>,
    pub parentesco: Option<Parentesco>,
    pub cotizante_numero_identificacion: Option<String>,
    pub cotizante_nombre: Option<String>,
}

impl PatientForm {
    /// Pre-fill the form from a known patient, as the edit dialog does.
    pub fn from_patient(patient: &Patient) -> Self {
        Self {
            tipo_paciente: Some(patient.tipo_paciente),
            tipo_identificacion: patient.tipo_identificacion,
            numero_identificacion: patient.numero_identificacion.clone(),
            nombre_completo: Some(patient.nombre_completo.clone()),
            celular: patient.celular.clone(),
            correo: patient.correo.clone(),
            direccion_residencia: patient.direccion_residencia.clone(),
            eps: patient.eps,
            parentesco: patient.parentesco,
            cotizante_numero_identificacion: patient.insured_id().map(str::to_string),
            cotizante_nombre: patient.insured_name().map(str::to_string),
        }
    }

    /// Form for the patient at `numero`: the stored record when the service has one,
    /// otherwise just the id-number.
    pub async fn lookup(api: &dyn PatientApi, numero: &str) -> DeskResult<Self> {
        let numero = numero.trim();
        if numero.is_empty() {
            return Ok(Self::default());
        }
        let existing = PatientLookup::parse(numero)
            .run(api)
            .await?
            .into_iter()
            .next();
        Ok(match existing {
            Some(patient) => Self::from_patient(&patient),
            None => Self {
                numero_identificacion: numero.to_string(),
                ..Default::default()
            },
        })
    }

    pub fn kind(&self) -> TipoPaciente {
        self.tipo_paciente.unwrap_or(TipoPaciente::Cotizante)
    }

    /// Write payload for this form. Beneficiary fields are only sent for beneficiaries.
    pub fn to_payload(&self) -> PatientPayload {
        let kind = self.kind();
        let beneficiario = kind == TipoPaciente::Beneficiario;
        PatientPayload {
            nombre_completo: clean(&self.nombre_completo),
            tipo_identificacion: self.tipo_identificacion,
            numero_identificacion: self.numero_identificacion.trim().to_string(),
            eps: self.eps,
            celular: clean(&self.celular),
            correo: clean(&self.correo),
            direccion_residencia: clean(&self.direccion_residencia),
            tipo_paciente: Some(kind),
            parentesco: if beneficiario { self.parentesco } else { None },
            cotizante_numero_identificacion: if beneficiario {
                clean(&self.cotizante_numero_identificacion)
            } else {
                None
            },
            ..Default::default()
        }
    }

    /// Whether the form differs from the stored record in any field the desk edits.
    ///
    /// Missing and empty values compare equal.
    pub fn differs_from(&self, existing: &Patient) -> bool {
        fn text(value: Option<&str>) -> &str {
            value.map(str::trim).unwrap_or("")
        }
        let eps = |e: Option<Eps>| e.map(Eps::as_code).unwrap_or("");

        let base_changed = text(self.nombre_completo.as_deref())
            != existing.nombre_completo.trim()
            || text(self.celular.as_deref()) != text(existing.celular.as_deref())
            || text(self.correo.as_deref()) != text(existing.correo.as_deref())
            || text(self.direccion_residencia.as_deref())
                != text(existing.direccion_residencia.as_deref())
            || eps(self.eps) != eps(existing.eps);
        if base_changed {
            return true;
        }
        if self.kind() != TipoPaciente::Beneficiario {
            return false;
        }
        if text(self.cotizante_numero_identificacion.as_deref()) != text(existing.insured_id()) {
            return true;
        }
        // The payload does not carry the insured name, so only compare one the user typed.
        match clean(&self.cotizante_nombre) {
            Some(nombre) => nombre != text(existing.insured_name()),
            None => false,
        }
    }
}

/// What reconciliation did to the patient service.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconcileAction {
    Created,
    Updated,
    Unchanged,
}

/// Outcome of [`reconcile_patient`]: the id-number the task should reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reconciliation {
    pub numero: IdNumber,
    pub action: ReconcileAction,
}

/// Make sure the patient on a task form exists and is up to date.
///
/// # Errors
///
/// - `InvalidInput` for a blank id-number (nothing is requested), for a new patient
///   without name, or for a beneficiary without its insured reference (nothing is written).
/// - Any lookup or write failure from the patient service.
pub async fn reconcile_patient(
    api: &dyn PatientApi,
    form: &PatientForm,
) -> DeskResult<Reconciliation> {
    let numero = IdNumber::new(&form.numero_identificacion).map_err(|_| {
        DeskError::InvalidInput("patient identification number is required".into())
    })?;

    let existing = PatientLookup::parse(numero.as_str())
        .run(api)
        .await?
        .into_iter()
        .next();
    let payload = form.to_payload();

    match existing {
        None => {
            payload.validate()?;
            let kind = payload.kind();
            let created = api.create(kind, &payload).await?;
            let numero = created
                .and_then(|p| IdNumber::new(&p.numero_identificacion).ok())
                .unwrap_or(numero);
            tracing::info!(numero = %numero, kind = %kind, "patient created");
            Ok(Reconciliation {
                numero,
                action: ReconcileAction::Created,
            })
        }
        Some(existing) if form.differs_from(&existing) => {
            if payload.kind() == TipoPaciente::Beneficiario {
                payload.validate_insured_reference()?;
            }
            let target = IdNumber::new(&existing.numero_identificacion).unwrap_or(numero.clone());
            api.update(existing.tipo_paciente, &target, &payload).await?;
            tracing::info!(numero = %target, kind = %existing.tipo_paciente, "patient updated");
            Ok(Reconciliation {
                numero,
                action: ReconcileAction::Updated,
            })
        }
        Some(_) => {
            tracing::debug!(numero = %numero, "patient unchanged");
            Ok(Reconciliation {
                numero,
                action: ReconcileAction::Unchanged,
            })
        }
    }
}

/// The task dialog: appointment fields plus the patient section.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskForm {
    /// Id of the task being edited; `None` creates a new task.
    pub editing: Option<i64>,
    pub patient: PatientForm,
    pub tipo_cita: Option<String>,
    pub prioridad: Option<Prioridad>,
    pub estado: Option<EstadoTarea>,
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
}

impl TaskForm {
    /// Pre-fill the dialog for editing an existing task.
    pub fn from_task(task: &Task) -> Self {
        Self {
            editing: Some(task.id),
            patient: task
                .paciente
                .as_ref()
                .map(PatientForm::from_patient)
                .unwrap_or_default(),
            tipo_cita: task.tipo_cita.clone(),
            prioridad: task.prioridad,
            estado: Some(task.estado),
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
        }
    }

    pub fn estado(&self) -> EstadoTarea {
        self.estado.unwrap_or_default()
    }

    /// Task payload referencing the reconciled patient.
    pub fn to_payload(&self, numero: &IdNumber) -> TaskPayload {
        TaskPayload {
            paciente_numero_identificacion: Some(numero.to_string()),
            tipo_cita: clean(&self.tipo_cita),
            prioridad: self.prioridad.unwrap_or_default(),
            estado: self.estado(),
            especialidad: clean(&self.especialidad),
            autorizacion: clean(&self.autorizacion),
            orden: clean(&self.orden),
            radicado: clean(&self.radicado),
            especificaciones: clean(&self.especificaciones),
            observacion: clean(&self.observacion),
            fecha_solicitud_serviconli: self.fecha_solicitud_serviconli,
            fecha_cita: self.fecha_cita,
            hora_cita: clean(&self.hora_cita),
            doctor: clean(&self.doctor),
            direccion_cita: clean(&self.direccion_cita),
            lugar_cita: clean(&self.lugar_cita),
            informacion_cita: clean(&self.informacion_cita),
            confirmacion_cita: clean(&self.confirmacion_cita),
            eps: self.patient.eps,
            cotizante_numero_identificacion: clean(&self.patient.cotizante_numero_identificacion),
        }
    }
}
