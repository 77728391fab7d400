//! Backend seams.
//!
//! The desk never talks HTTP directly; it goes through these traits. `servisoft-api`
//! provides the `reqwest` implementation and tests use in-memory fakes.

use crate::patient::{Patient, PatientPayload, TipoPaciente};
use crate::task::{HistoryEntry, Task, TaskPayload};
use crate::DeskResult;
use async_trait::async_trait;
use servisoft_types::IdNumber;

/// Patient service operations.
#[async_trait]
pub trait PatientApi: Send + Sync {
    /// `GET {patients}/search?nombre=<name>`. An empty name lists everyone.
    async fn search(&self, nombre: &str) -> DeskResult<Vec<Patient>>;

    /// `GET {patients}/:id`. A 404 is `Ok(None)`.
    async fn find_by_id(&self, numero: &IdNumber) -> DeskResult<Option<Patient>>;

    /// `POST {patients}/<kind>`. Returns the created record when the server echoes one.
    async fn create(
        &self,
        kind: TipoPaciente,
        payload: &PatientPayload,
    ) -> DeskResult<Option<Patient>>;

    /// `PUT {patients}/<kind>/:id`.
    async fn update(
        &self,
        kind: TipoPaciente,
        numero: &IdNumber,
        payload: &PatientPayload,
    ) -> DeskResult<()>;

    /// `DELETE {patients}/:id`.
    async fn delete(&self, numero: &IdNumber) -> DeskResult<()>;
}

/// Task service operations.
#[async_trait]
pub trait TaskApi: Send + Sync {
    /// `GET {tasks}`.
    async fn list(&self) -> DeskResult<Vec<Task>>;

    /// `POST {tasks}`.
    async fn create(&self, payload: &TaskPayload) -> DeskResult<()>;

    /// `PUT {tasks}/:id`.
    async fn update(&self, id: i64, payload: &TaskPayload) -> DeskResult<()>;

    /// `DELETE {tasks}/:id`.
    async fn delete(&self, id: i64) -> DeskResult<()>;

    /// `GET {tasks}/:id/historial`.
    async fn history(&self, id: i64) -> DeskResult<Vec<HistoryEntry>>;
}

/// How a free-text patient query is resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PatientLookup {
    /// All digits: fetch the record addressed by id-number.
    ById(IdNumber),
    /// Anything else: name search.
    ByName(String),
}

impl PatientLookup {
    pub fn parse(query: &str) -> Self {
        let trimmed = query.trim();
        match IdNumber::new(trimmed) {
            Ok(id) if id.is_numeric() => PatientLookup::ById(id),
            _ => PatientLookup::ByName(trimmed.to_string()),
        }
    }

    /// Run the lookup. Id lookups yield zero or one patient.
    pub async fn run(&self, api: &dyn PatientApi) -> DeskResult<Vec<Patient>> {
        match self {
            PatientLookup::ById(id) => Ok(api.find_by_id(id).await?.into_iter().collect()),
            PatientLookup::ByName(name) => api.search(name).await,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fakes::{FakePatients, PatientCall};
    use super::*;

    fn patient(numero: &str, nombre: &str) -> Patient {
        serde_json::from_value(serde_json::json!({
            "numeroIdentificacion": numero,
            "nombreCompleto": nombre,
        }))
        .unwrap()
    }

    #[test]
    fn digits_are_id_lookups_and_text_is_a_name_search() {
        assert!(matches!(
            PatientLookup::parse(" 1032456 "),
            PatientLookup::ById(id) if id.as_str() == "1032456"
        ));
        assert_eq!(
            PatientLookup::parse("Ana 12"),
            PatientLookup::ByName("Ana 12".into())
        );
        assert_eq!(PatientLookup::parse(""), PatientLookup::ByName(String::new()));
    }

    #[tokio::test]
    async fn id_lookup_miss_is_empty() {
        let api = FakePatients::with(vec![patient("1", "Ana")]);
        let found = PatientLookup::parse("2").run(&api).await.unwrap();
        assert!(found.is_empty());
        assert_eq!(api.calls(), vec![PatientCall::FindById("2".into())]);
    }

    #[tokio::test]
    async fn name_lookup_searches() {
        let api = FakePatients::with(vec![patient("1", "Ana Gómez"), patient("2", "Luis")]);
        let found = PatientLookup::parse("ana").run(&api).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].numero_identificacion, "1");
    }
}
