//! # ServiSoft Reports
//!
//! File exports for the desk:
//! - `reporte_clientes.csv`: one row per patient, every field quoted
//! - `Reporte_Tareas_<date>.xlsx`: one row per task on a `Tareas` sheet

pub mod clients;
pub mod tasks;

pub use clients::{client_rows, clients_csv, write_clients_csv, CLIENT_HEADERS};
pub use tasks::{task_report_filename, task_rows, tasks_xlsx, write_tasks_xlsx, TASK_HEADERS};
