//! Patient CSV export.

use servisoft_core::constants::CLIENT_REPORT_FILENAME;
use servisoft_core::{DeskError, DeskResult, Patient};
use std::path::{Path, PathBuf};

pub const CLIENT_HEADERS: [&str; 11] = [
    "Tipo",
    "Nombre",
    "Tipo ID",
    "Número ID",
    "EPS",
    "Celular",
    "Correo",
    "Dirección",
    "Fecha Nacimiento",
    "Parentesco",
    "Cotizante",
];

/// One CSV row per patient, in [`CLIENT_HEADERS`] order.
pub fn client_rows(patients: &[&Patient]) -> Vec<[String; 11]> {
    patients
        .iter()
        .map(|p| {
            [
                p.tipo_paciente.as_code().to_string(),
                p.nombre_completo.clone(),
                p.tipo_identificacion
                    .map(|t| t.description().to_string())
                    .unwrap_or_default(),
                p.numero_identificacion.clone(),
                p.eps.map(|e| e.display_name()).unwrap_or_default(),
                p.celular.clone().unwrap_or_default(),
                p.correo.clone().unwrap_or_default(),
                p.direccion_residencia.clone().unwrap_or_default(),
                p.fecha_nacimiento.clone().unwrap_or_default(),
                p.parentesco
                    .map(|r| r.label().to_string())
                    .unwrap_or_default(),
                p.insured_id().unwrap_or_default().to_string(),
            ]
        })
        .collect()
}

/// Render the CSV. Every field is double-quoted; no patients gives the header row only.
pub fn clients_csv(patients: &[&Patient]) -> DeskResult<String> {
    let format_err = |e: csv::Error| DeskError::ReportFormat(e.to_string());

    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(CLIENT_HEADERS).map_err(format_err)?;
    for row in client_rows(patients) {
        writer.write_record(&row).map_err(format_err)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| DeskError::ReportFormat(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| DeskError::ReportFormat(e.to_string()))
}

/// Write `reporte_clientes.csv` into `dir` and return its path.
pub fn write_clients_csv(dir: &Path, patients: &[&Patient]) -> DeskResult<PathBuf> {
    let csv = clients_csv(patients)?;
    std::fs::create_dir_all(dir).map_err(DeskError::ReportWrite)?;
    let path = dir.join(CLIENT_REPORT_FILENAME);
    std::fs::write(&path, csv).map_err(DeskError::ReportWrite)?;
    tracing::info!(path = %path.display(), rows = patients.len(), "client report written");
    Ok(path)
}
