//! Plain-text rendering of the desk views.

use servisoft_core::{BoardColumn, DashboardStats, HistoryEntry, Patient, Task};
use std::fmt::Write;

fn or<'a>(value: Option<&'a str>, placeholder: &'a str) -> &'a str {
    value.filter(|v| !v.trim().is_empty()).unwrap_or(placeholder)
}

/// One-line task card.
pub fn task_card(task: &Task) -> String {
    let mut line = format!(
        "#{} [{}] {}",
        task.id,
        task.priority(),
        or(Some(task.patient_name()), "Sin paciente")
    );
    if let Some(especialidad) = task.especialidad.as_deref().filter(|e| !e.trim().is_empty()) {
        let _ = write!(line, " · {especialidad}");
    }
    if let Some(fecha) = task.fecha_cita {
        let _ = write!(line, " · {}", fecha.format("%Y-%m-%d"));
        if let Some(hora) = task.hora_cita.as_deref() {
            let _ = write!(line, " {hora}");
        }
    }
    if let Some(next) = task.estado.next() {
        let _ = write!(line, "  (siguiente: {})", next.label());
    }
    line
}

pub fn board(columns: &[BoardColumn<'_>]) -> String {
    let mut out = String::new();
    for column in columns {
        let _ = writeln!(out, "== {} ({}) ==", column.estado.label(), column.tasks.len());
        match column.placeholder() {
            Some(placeholder) => {
                let _ = writeln!(out, "  {placeholder}");
            }
            None => {
                for task in &column.tasks {
                    let _ = writeln!(out, "  {}", task_card(task));
                }
            }
        }
    }
    out
}

pub fn task_detail(task: &Task) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Tarea #{} ({})", task.id, task.estado.label());
    let _ = writeln!(out, "Prioridad: {}", task.priority());
    let _ = writeln!(out, "Tipo de cita: {}", or(task.tipo_cita.as_deref(), "-"));
    let _ = writeln!(out, "Especialidad: {}", or(task.especialidad.as_deref(), "-"));
    if let Some(p) = task.paciente.as_ref() {
        let _ = writeln!(out, "Paciente: {} ({})", p.nombre_completo, p.identification());
        let _ = writeln!(out, "Celular: {}", or(p.celular.as_deref(), "No registrado"));
        if let Some(eps) = p.eps {
            let _ = writeln!(out, "EPS: {}", eps.display_name());
        }
    }
    if let Some(fecha) = task.fecha_cita {
        let _ = writeln!(
            out,
            "Cita: {} {}",
            fecha.format("%Y-%m-%d"),
            or(task.hora_cita.as_deref(), "")
        );
    }
    let _ = writeln!(out, "Doctor: {}", or(task.doctor.as_deref(), "-"));
    let _ = writeln!(
        out,
        "Lugar: {}",
        or(task.lugar_cita.as_deref().or(task.direccion_cita.as_deref()), "-")
    );
    let _ = writeln!(out, "-- Observaciones --");
    for (label, value) in task.observations() {
        let _ = writeln!(out, "{label}: {value}");
    }
    out
}

pub fn patient_line(patient: &Patient) -> String {
    let mut line = format!(
        "{} {} · {}",
        patient.tipo_paciente,
        patient.numero_identificacion,
        patient.nombre_completo
    );
    if let Some(eps) = patient.eps {
        let _ = write!(line, " · {}", eps.display_name());
    }
    if let Some(parentesco) = patient.parentesco.filter(|_| patient.is_beneficiario()) {
        let _ = write!(line, " · {}", parentesco.label());
        if let Some(cotizante) = patient.insured_id() {
            let _ = write!(line, " de {cotizante}");
        }
    }
    line
}

pub fn patient_detail(patient: &Patient) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Nombre: {}", patient.nombre_completo);
    let _ = writeln!(out, "Identificación: {}", patient.identification());
    let _ = writeln!(out, "Tipo: {}", patient.tipo_paciente);
    let _ = writeln!(
        out,
        "EPS: {}",
        patient
            .eps
            .map(|e| e.display_name())
            .unwrap_or_else(|| "-".into())
    );
    let _ = writeln!(out, "Celular: {}", or(patient.celular.as_deref(), "No registrado"));
    let _ = writeln!(out, "Correo: {}", or(patient.correo.as_deref(), "No registrado"));
    let _ = writeln!(
        out,
        "Dirección: {}",
        or(patient.direccion_residencia.as_deref(), "No registrada")
    );
    let _ = writeln!(out, "Estado: {}", patient.estado.as_code());
    if let Some(parentesco) = patient.parentesco.filter(|_| patient.is_beneficiario()) {
        let _ = writeln!(out, "Parentesco: {}", parentesco.label());
    }
    if let Some(cotizante) = patient.insured_id() {
        let _ = writeln!(
            out,
            "Cotizante: {} {}",
            cotizante,
            patient.insured_name().unwrap_or_default()
        );
    }
    out
}

pub fn history(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return "Sin historial\n".to_string();
    }
    let mut out = String::new();
    for entry in entries {
        let when = entry
            .fecha_cambio
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".into());
        let from = entry
            .estado_anterior
            .map(|e| e.label())
            .unwrap_or_else(|| "(nueva)".into());
        let _ = write!(out, "{when}  {from} -> {}", entry.estado_nuevo.label());
        if let Some(user) = entry.usuario_cambio.as_deref() {
            let _ = write!(out, "  por {user}");
        }
        if let Some(desc) = entry.descripcion_cambio.as_deref() {
            let _ = write!(out, "  {desc}");
        }
        out.push('\n');
    }
    out
}

pub fn stats(stats: &DashboardStats) -> String {
    format!(
        "Pacientes: {}\nTareas pendientes: {}\n",
        stats.patients, stats.pending_tasks
    )
}
