//! Constants used throughout the ServiSoft core crate.

use std::time::Duration;

/// Backend root used when nothing else is configured.
pub const DEFAULT_API_BASE: &str = "http://localhost:8080";

/// Patient service path below the backend root.
pub const PATIENTS_PATH: &str = "/api/v1/patients";

/// Task service path below the backend root.
pub const TASKS_PATH: &str = "/api/v1/tareas";

/// Sub-resource for primary insured patients.
pub const COTIZANTES_SEGMENT: &str = "cotizantes";

/// Sub-resource for dependants.
pub const BENEFICIARIOS_SEGMENT: &str = "beneficiarios";

/// Filename for the stored session (token plus user info).
pub const SESSION_FILENAME: &str = "session.json";

/// How often the pending-task reminder is re-evaluated.
pub const DEFAULT_REMINDER_INTERVAL: Duration = Duration::from_secs(2 * 60 * 60);

/// Filename of the patient CSV report.
pub const CLIENT_REPORT_FILENAME: &str = "reporte_clientes.csv";

/// Filename prefix of the task spreadsheet report; the ISO date and `.xlsx` follow.
pub const TASK_REPORT_PREFIX: &str = "Reporte_Tareas_";

/// Worksheet name used in the task spreadsheet.
pub const TASK_REPORT_SHEET: &str = "Tareas";

/// Placeholder shown for an empty board column.
pub const EMPTY_COLUMN_PLACEHOLDER: &str = "No hay tareas";

/// Country calling code prefixed to WhatsApp numbers.
pub const WHATSAPP_COUNTRY_CODE: &str = "57";

/// Per-request timeout for calls to the backend.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
