//! # ServiSoft API client
//!
//! `reqwest` implementation of the [`PatientApi`] and [`TaskApi`] seams.
//!
//! Every request carries the session's bearer token. Responses are mapped onto
//! [`DeskError`]:
//! - 401/403 become `Unauthorized`
//! - other non-2xx statuses become `Api`, with the body's `message` field when present
//! - bodies that do not match the model become `Decode`, with the JSON path of the mismatch

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use servisoft_core::constants::REQUEST_TIMEOUT;
use servisoft_core::{
    CoreConfig, DeskError, DeskResult, HistoryEntry, IdNumber, Patient, PatientApi,
    PatientPayload, Task, TaskApi, TaskPayload, TipoPaciente,
};
use url::Url;

/// HTTP client for both backend services.
#[derive(Clone, Debug)]
pub struct RestClient {
    http: reqwest::Client,
    patients_url: Url,
    tasks_url: Url,
    token: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

fn transport(err: reqwest::Error) -> DeskError {
    DeskError::Transport(err.to_string())
}

impl RestClient {
    /// Build a client for the configured services.
    ///
    /// # Arguments
    /// * `config` - resolved desk configuration
    /// * `token` - bearer token from the stored session
    pub fn new(config: &CoreConfig, token: impl Into<String>) -> DeskResult<Self> {
        Self::with_urls(
            config.patients_url().clone(),
            config.tasks_url().clone(),
            token,
        )
    }

    pub fn with_urls(patients_url: Url, tasks_url: Url, token: impl Into<String>) -> DeskResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(transport)?;
        Ok(Self {
            http,
            patients_url,
            tasks_url,
            token: token.into(),
        })
    }

    /// Append path segments to a service root. Segments are percent-encoded.
    fn endpoint(base: &Url, segments: &[&str]) -> DeskResult<Url> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| DeskError::Config(format!("service URL cannot be a base: {base}")))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn patients(&self, segments: &[&str]) -> DeskResult<Url> {
        Self::endpoint(&self.patients_url, segments)
    }

    fn tasks(&self, segments: &[&str]) -> DeskResult<Url> {
        Self::endpoint(&self.tasks_url, segments)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> DeskResult<reqwest::Response> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(transport)?;
        tracing::debug!(status = %response.status(), url = %response.url(), "backend response");
        Ok(response)
    }

    /// Turn a non-2xx response into an error.
    async fn check(response: reqwest::Response) -> DeskResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(DeskError::Unauthorized {
                status: status.as_u16(),
            });
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.trim().is_empty());
        Err(DeskError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> DeskResult<T> {
        let bytes = response.bytes().await.map_err(transport)?;
        let de = &mut serde_json::Deserializer::from_slice(&bytes);
        serde_path_to_error::deserialize(de).map_err(|e| DeskError::Decode {
            path: e.path().to_string(),
            message: e.inner().to_string(),
        })
    }
}

#[async_trait]
impl PatientApi for RestClient {
    async fn search(&self, nombre: &str) -> DeskResult<Vec<Patient>> {
        let mut url = self.patients(&["search"])?;
        url.query_pairs_mut().append_pair("nombre", nombre);
        let response = Self::check(self.send(self.http.get(url)).await?).await?;
        Self::decode(response).await
    }

    async fn find_by_id(&self, numero: &IdNumber) -> DeskResult<Option<Patient>> {
        let url = self.patients(&[numero.as_str()])?;
        let response = self.send(self.http.get(url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::check(response).await?;
        Self::decode(response).await.map(Some)
    }

    async fn create(
        &self,
        kind: TipoPaciente,
        payload: &PatientPayload,
    ) -> DeskResult<Option<Patient>> {
        let url = self.patients(&[kind.segment()])?;
        let response = Self::check(self.send(self.http.post(url).json(payload)).await?).await?;
        match Self::decode::<Patient>(response).await {
            Ok(created) => Ok(Some(created)),
            Err(e) => {
                tracing::warn!(error = %e, "patient created but response body was not a patient");
                Ok(None)
            }
        }
    }

    async fn update(
        &self,
        kind: TipoPaciente,
        numero: &IdNumber,
        payload: &PatientPayload,
    ) -> DeskResult<()> {
        let url = self.patients(&[kind.segment(), numero.as_str()])?;
        Self::check(self.send(self.http.put(url).json(payload)).await?).await?;
        Ok(())
    }

    async fn delete(&self, numero: &IdNumber) -> DeskResult<()> {
        let url = self.patients(&[numero.as_str()])?;
        Self::check(self.send(self.http.delete(url)).await?).await?;
        Ok(())
    }
}

#[async_trait]
impl TaskApi for RestClient {
    async fn list(&self) -> DeskResult<Vec<Task>> {
        let url = self.tasks(&[])?;
        let response = Self::check(self.send(self.http.get(url)).await?).await?;
        Self::decode(response).await
    }

    async fn create(&self, payload: &TaskPayload) -> DeskResult<()> {
        let url = self.tasks(&[])?;
        Self::check(self.send(self.http.post(url).json(payload)).await?).await?;
        Ok(())
    }

    async fn update(&self, id: i64, payload: &TaskPayload) -> DeskResult<()> {
        let id = id.to_string();
        let url = self.tasks(&[id.as_str()])?;
        Self::check(self.send(self.http.put(url).json(payload)).await?).await?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> DeskResult<()> {
        let id = id.to_string();
        let url = self.tasks(&[id.as_str()])?;
        Self::check(self.send(self.http.delete(url)).await?).await?;
        Ok(())
    }

    async fn history(&self, id: i64) -> DeskResult<Vec<HistoryEntry>> {
        let id = id.to_string();
        let url = self.tasks(&[id.as_str(), "historial"])?;
        let response = Self::check(self.send(self.http.get(url)).await?).await?;
        Self::decode(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use servisoft_core::EstadoTarea;

    fn client(server: &mockito::Server) -> RestClient {
        let base = server.url();
        RestClient::with_urls(
            Url::parse(&format!("{base}/api/v1/patients")).unwrap(),
            Url::parse(&format!("{base}/api/v1/tareas")).unwrap(),
            "tok-123",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn search_sends_bearer_and_empty_name() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/patients/search")
            .match_query(Matcher::UrlEncoded("nombre".into(), "".into()))
            .match_header("authorization", "Bearer tok-123")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[{"numeroIdentificacion":"1","nombreCompleto":"Ana","parentesco":"HIJO_A"}]"#,
            )
            .create_async()
            .await;

        let found = client(&server).search("").await.unwrap();
        mock.assert_async().await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].tipo_paciente, TipoPaciente::Beneficiario);
    }

    #[tokio::test]
    async fn find_by_id_treats_404_as_no_match() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v1/patients/1020")
            .with_status(404)
            .create_async()
            .await;
        let id = IdNumber::new("1020").unwrap();
        assert!(client(&server).find_by_id(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unauthorized_and_server_messages_are_mapped() {
        let mut server = mockito::Server::new_async().await;
        let _list = server
            .mock("GET", "/api/v1/tareas")
            .with_status(403)
            .create_async()
            .await;
        let _create = server
            .mock("POST", "/api/v1/patients/beneficiarios")
            .with_status(400)
            .with_body(r#"{"message":"El cotizante no existe"}"#)
            .create_async()
            .await;

        let api = client(&server);
        let err = TaskApi::list(&api).await.unwrap_err();
        assert!(matches!(err, DeskError::Unauthorized { status: 403 }));

        let err = PatientApi::create(&api, TipoPaciente::Beneficiario, &PatientPayload::default())
            .await
            .unwrap_err();
        assert_eq!(err.server_message(), Some("El cotizante no existe"));
    }

    #[tokio::test]
    async fn decode_errors_report_the_json_path() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v1/tareas")
            .with_status(200)
            .with_body(r#"[{"id":1,"estado":"PENDIENTE"},{"id":2,"estado":"CANCELADA"}]"#)
            .create_async()
            .await;
        let err = TaskApi::list(&client(&server)).await.unwrap_err();
        match err {
            DeskError::Decode { path, .. } => assert_eq!(path, "[1].estado"),
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn task_update_puts_full_payload() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/api/v1/tareas/7")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "estado": "EN_PROGRESO",
                "prioridad": "MEDIA",
                "doctor": null
            })))
            .with_status(200)
            .create_async()
            .await;
        let payload = TaskPayload {
            estado: EstadoTarea::EnProgreso,
            ..Default::default()
        };
        TaskApi::update(&client(&server), 7, &payload).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn patient_update_is_addressed_by_id_number_under_type() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/api/v1/patients/cotizantes/1020")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "numeroIdentificacion": "1020"
            })))
            .with_status(200)
            .create_async()
            .await;
        let payload = PatientPayload {
            numero_identificacion: "1020".into(),
            ..Default::default()
        };
        let id = IdNumber::new("1020").unwrap();
        PatientApi::update(&client(&server), TipoPaciente::Cotizante, &id, &payload)
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn create_without_echo_is_not_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/v1/patients/cotizantes")
            .with_status(201)
            .create_async()
            .await;
        let created =
            PatientApi::create(&client(&server), TipoPaciente::Cotizante, &PatientPayload::default())
                .await
                .unwrap();
        assert!(created.is_none());
    }

    #[tokio::test]
    async fn history_and_delete_hit_task_routes() {
        let mut server = mockito::Server::new_async().await;
        let history = server
            .mock("GET", "/api/v1/tareas/3/historial")
            .with_status(200)
            .with_body(r#"[{"id":1,"tareaId":3,"estadoNuevo":"PENDIENTE"}]"#)
            .create_async()
            .await;
        let delete = server
            .mock("DELETE", "/api/v1/tareas/3")
            .with_status(204)
            .create_async()
            .await;
        let api = client(&server);
        let entries = api.history(3).await.unwrap();
        assert_eq!(entries[0].estado_nuevo, EstadoTarea::Pendiente);
        TaskApi::delete(&api, 3).await.unwrap();
        history.assert_async().await;
        delete.assert_async().await;
    }
}
