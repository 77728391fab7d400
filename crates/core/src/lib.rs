//! # ServiSoft Core
//!
//! Domain logic for the ServiSoft clinic desk.
//!
//! This crate contains the typed model of the two backend services and everything the desk
//! computes on the client side:
//! - Patient classification (cotizante / beneficiario) and display helpers
//! - The task lifecycle state machine and the board view-model
//! - Patient reconciliation when a task is saved
//! - Filters, reminder counts, dashboard counters and WhatsApp links
//! - Session storage and startup configuration
//!
//! **No HTTP concerns**: the backend is reached through the [`api::PatientApi`] and
//! [`api::TaskApi`] traits, implemented by `servisoft-api`.

pub mod api;
pub mod board;
pub mod config;
pub mod constants;
pub mod error;
pub mod filters;
pub mod lifecycle;
pub mod notify;
pub mod patient;
pub mod reconcile;
pub mod registry;
pub mod reminder;
pub mod session;
pub mod stats;
pub mod task;
pub mod whatsapp;

pub use api::{PatientApi, PatientLookup, TaskApi};
pub use board::{BoardColumn, SaveOutcome, TaskBoard};
pub use config::{CoreConfig, EnvOverrides, FileConfig};
pub use error::{DeskError, DeskResult};
pub use filters::{PatientFilter, TaskFilter};
pub use lifecycle::EstadoTarea;
pub use notify::{Level, Notification};
pub use patient::{
    CotizanteSummary, EstadoCliente, Eps, Parentesco, Patient, PatientPayload,
    TipoIdentificacion, TipoPaciente,
};
pub use reconcile::{reconcile_patient, PatientForm, ReconcileAction, Reconciliation, TaskForm};
pub use registry::PatientRegistry;
pub use reminder::Reminder;
pub use session::{Session, SessionStore, UserInfo};
pub use stats::DashboardStats;
pub use task::{HistoryEntry, Prioridad, Task, TaskPayload};

pub use servisoft_types::{IdNumber, NonEmptyText, TextError};
