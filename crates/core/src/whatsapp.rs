//! WhatsApp appointment reminder links.

use crate::constants::WHATSAPP_COUNTRY_CODE;
use crate::task::Task;
use crate::{DeskError, DeskResult};
use chrono::{Datelike, NaiveDate, Weekday};
use url::Url;

/// Spanish weekday name, lower case.
pub fn dia_semana(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "lunes",
        Weekday::Tue => "martes",
        Weekday::Wed => "miércoles",
        Weekday::Thu => "jueves",
        Weekday::Fri => "viernes",
        Weekday::Sat => "sábado",
        Weekday::Sun => "domingo",
    }
}

fn or<'a>(value: Option<&'a str>, placeholder: &'a str) -> &'a str {
    value.map(str::trim).filter(|v| !v.is_empty()).unwrap_or(placeholder)
}

/// Appointment message sent to the patient.
pub fn reminder_message(task: &Task) -> String {
    let paciente = task.paciente.as_ref();
    let nombre = or(paciente.map(|p| p.nombre_completo.as_str()), "[Nombre]");
    let tipo = or(task.tipo_cita.as_deref(), "[Tipo de cita]");
    let (dia, fecha) = match task.fecha_cita {
        Some(date) => (dia_semana(date).to_string(), date.format("%Y-%m-%d").to_string()),
        None => ("[Día]".to_string(), "[Fecha]".to_string()),
    };
    let hora = or(task.hora_cita.as_deref(), "[Hora]");
    let doctor = or(task.doctor.as_deref(), "[Doctor]");
    let lugar = or(
        task.lugar_cita
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .or(task.direccion_cita.as_deref()),
        "[Lugar]",
    );
    let especificaciones = task
        .especificaciones
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(|e| format!(" ({e})"))
        .unwrap_or_default();

    format!(
        "La cita de {nombre} para {tipo} fue asignada para el día {dia} {fecha} a las {hora} \
         con el DR.{doctor}. En {lugar}, recuerde llegar 30 minutos antes con el documento de \
         identidad original, cuota moderadora y tapabocas.{especificaciones}"
    )
}

/// `https://wa.me/57<digits>?text=<message>` for the task's patient.
///
/// # Errors
///
/// Returns `InvalidInput` when the patient has no phone number with digits in it.
pub fn reminder_link(task: &Task) -> DeskResult<Url> {
    let digits: String = task
        .paciente
        .as_ref()
        .and_then(|p| p.celular.as_deref())
        .unwrap_or("")
        .chars()
        .filter(char::is_ascii_digit)
        .collect();
    if digits.is_empty() {
        return Err(DeskError::InvalidInput(
            "No se encontró número de celular del paciente".into(),
        ));
    }
    let text = urlencoding::encode(&reminder_message(task)).into_owned();
    Url::parse(&format!(
        "https://wa.me/{WHATSAPP_COUNTRY_CODE}{digits}?text={text}"
    ))
    .map_err(|e| DeskError::InvalidInput(format!("cannot build WhatsApp link: {e}")))
}
