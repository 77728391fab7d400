//! Task spreadsheet export.

use chrono::NaiveDate;
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use servisoft_core::constants::{TASK_REPORT_PREFIX, TASK_REPORT_SHEET};
use servisoft_core::{DeskError, DeskResult, Task};
use std::path::{Path, PathBuf};

pub const TASK_HEADERS: [&str; 20] = [
    "ID",
    "Estado",
    "Prioridad",
    "Tipo de Cita",
    "Especialidad",
    "Autorización",
    "Radicado",
    "Paciente",
    "Identificación",
    "Celular",
    "EPS",
    "Cotizante",
    "Fecha Creación",
    "Fecha Cita",
    "Hora Cita",
    "Doctor",
    "Dirección Cita",
    "Lugar Cita",
    "Observación",
    "Especificaciones",
];

fn xlsx_err(e: XlsxError) -> DeskError {
    DeskError::ReportFormat(e.to_string())
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

/// Cells of one task row, in [`TASK_HEADERS`] order. The first cell is the numeric id.
pub fn task_rows(tasks: &[Task]) -> Vec<(i64, Vec<String>)> {
    tasks
        .iter()
        .map(|task| {
            let paciente = task.paciente.as_ref();
            let cotizante = paciente
                .filter(|p| p.is_beneficiario())
                .and_then(|p| {
                    p.insured_id()
                        .map(|id| format!("{} ({id})", p.insured_name().unwrap_or_default()))
                })
                .unwrap_or_default();
            let cells = vec![
                task.estado.as_code().to_string(),
                task.priority().as_code().to_string(),
                text(&task.tipo_cita),
                text(&task.especialidad),
                text(&task.autorizacion),
                text(&task.radicado),
                task.patient_name().to_string(),
                paciente.map(|p| p.identification()).unwrap_or_default(),
                paciente.and_then(|p| p.celular.clone()).unwrap_or_default(),
                paciente
                    .and_then(|p| p.eps)
                    .map(|e| e.as_code().to_string())
                    .unwrap_or_default(),
                cotizante,
                task.fecha_creacion
                    .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default(),
                task.fecha_cita
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
                text(&task.hora_cita),
                text(&task.doctor),
                text(&task.direccion_cita),
                text(&task.lugar_cita),
                text(&task.observacion),
                text(&task.especificaciones),
            ];
            (task.id, cells)
        })
        .collect()
}

/// `Reporte_Tareas_<YYYY-MM-DD>.xlsx`
pub fn task_report_filename(date: NaiveDate) -> String {
    format!("{TASK_REPORT_PREFIX}{}.xlsx", date.format("%Y-%m-%d"))
}

/// Build the workbook in memory.
///
/// # Errors
///
/// Returns `InvalidInput` when there are no tasks to export.
pub fn tasks_xlsx(tasks: &[Task]) -> DeskResult<Vec<u8>> {
    if tasks.is_empty() {
        return Err(DeskError::InvalidInput("No hay tareas para exportar".into()));
    }

    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name(TASK_REPORT_SHEET).map_err(xlsx_err)?;

    for (col, header) in (0u16..).zip(TASK_HEADERS) {
        sheet
            .write_string_with_format(0, col, header, &bold)
            .map_err(xlsx_err)?;
    }
    for (row, (id, cells)) in (1u32..).zip(task_rows(tasks)) {
        sheet.write_number(row, 0, id as f64).map_err(xlsx_err)?;
        for (col, cell) in (1u16..).zip(cells.iter()) {
            sheet.write_string(row, col, cell).map_err(xlsx_err)?;
        }
    }

    workbook.save_to_buffer().map_err(xlsx_err)
}

/// Write the spreadsheet into `dir`, named for `date`, and return its path.
pub fn write_tasks_xlsx(dir: &Path, tasks: &[Task], date: NaiveDate) -> DeskResult<PathBuf> {
    let bytes = tasks_xlsx(tasks)?;
    std::fs::create_dir_all(dir).map_err(DeskError::ReportWrite)?;
    let path = dir.join(task_report_filename(date));
    std::fs::write(&path, bytes).map_err(DeskError::ReportWrite)?;
    tracing::info!(path = %path.display(), rows = tasks.len(), "task report written");
    Ok(path)
}
