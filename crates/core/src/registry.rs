//! Patient registry view-model.

use crate::api::PatientApi;
use crate::filters::PatientFilter;
use crate::patient::{Eps, Patient, PatientPayload, TipoPaciente};
use crate::{DeskError, DeskResult};
use servisoft_types::IdNumber;
use std::collections::BTreeSet;

/// Everyone known to the patient service, classified.
#[derive(Clone, Debug, Default)]
pub struct PatientRegistry {
    patients: Vec<Patient>,
}

impl PatientRegistry {
    pub fn new(patients: Vec<Patient>) -> Self {
        Self { patients }
    }

    /// Fetch every patient (an empty name search).
    pub async fn load(api: &dyn PatientApi) -> DeskResult<Self> {
        let patients = api.search("").await?;
        tracing::debug!(count = patients.len(), "patients loaded");
        Ok(Self { patients })
    }

    pub fn patients(&self) -> &[Patient] {
        &self.patients
    }

    pub fn filter(&self, filter: &PatientFilter) -> Vec<&Patient> {
        filter.apply(&self.patients)
    }

    /// Distinct EPS codes in use, for the EPS filter.
    pub fn used_eps(&self) -> Vec<Eps> {
        self.patients
            .iter()
            .filter_map(|p| p.eps)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Cotizantes a beneficiary can be linked to.
    pub fn cotizantes(&self) -> Vec<&Patient> {
        self.patients
            .iter()
            .filter(|p| p.tipo_paciente == TipoPaciente::Cotizante)
            .collect()
    }

    pub fn find(&self, numero: &str) -> DeskResult<&Patient> {
        let numero = numero.trim();
        self.patients
            .iter()
            .find(|p| p.numero_identificacion == numero)
            .ok_or_else(|| DeskError::NotFound {
                resource: "patient",
                key: numero.to_string(),
            })
    }

    /// Create a cotizante, or update the one at `editing`.
    pub async fn save_cotizante(
        api: &dyn PatientApi,
        mut payload: PatientPayload,
        editing: Option<&IdNumber>,
    ) -> DeskResult<()> {
        payload.tipo_paciente = Some(TipoPaciente::Cotizante);
        payload.parentesco = None;
        payload.cotizante_numero_identificacion = None;
        Self::save(api, payload, editing).await
    }

    /// Create a beneficiario, or update the one at `editing`.
    pub async fn save_beneficiario(
        api: &dyn PatientApi,
        mut payload: PatientPayload,
        editing: Option<&IdNumber>,
    ) -> DeskResult<()> {
        payload.tipo_paciente = Some(TipoPaciente::Beneficiario);
        Self::save(api, payload, editing).await
    }

    async fn save(
        api: &dyn PatientApi,
        payload: PatientPayload,
        editing: Option<&IdNumber>,
    ) -> DeskResult<()> {
        payload.validate()?;
        let kind = payload.kind();
        match editing {
            Some(numero) => {
                api.update(kind, numero, &payload).await?;
                tracing::info!(numero = %numero, kind = %kind, "patient updated");
            }
            None => {
                api.create(kind, &payload).await?;
                tracing::info!(numero = %payload.numero_identificacion, kind = %kind, "patient created");
            }
        }
        Ok(())
    }

    /// Delete a patient by id-number.
    pub async fn delete(api: &dyn PatientApi, numero: &IdNumber) -> DeskResult<()> {
        api.delete(numero).await?;
        tracing::info!(numero = %numero, "patient deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fakes::{FakePatients, PatientCall};
    use crate::patient::Parentesco;

    fn registry() -> PatientRegistry {
        PatientRegistry::new(
            serde_json::from_str(
                r#"[
                    {"nombreCompleto":"Ana Ruiz","numeroIdentificacion":"11","eps":"NUEVA_EPS"},
                    {"nombreCompleto":"Pablo Ruiz","numeroIdentificacion":"12","eps":"EPS_SURA","parentesco":"HIJO_A","cotizanteNumeroIdentificacion":"11"},
                    {"nombreCompleto":"Carla Díaz","numeroIdentificacion":"13","eps":"NUEVA_EPS","tipoPaciente":"COTIZANTE"}
                ]"#,
            )
            .unwrap(),
        )
    }

    #[test]
    fn option_lists() {
        let r = registry();
        assert_eq!(r.used_eps(), vec![Eps::EpsSura, Eps::NuevaEps]);
        let cotizantes: Vec<_> = r
            .cotizantes()
            .iter()
            .map(|p| p.numero_identificacion.as_str())
            .collect();
        assert_eq!(cotizantes, vec!["11", "13"]);
        assert!(r.find(" 12 ").unwrap().is_beneficiario());
        assert!(matches!(r.find("99"), Err(DeskError::NotFound { .. })));
    }

    #[tokio::test]
    async fn load_uses_empty_name_search() {
        let api = FakePatients::with(registry().patients().to_vec());
        let loaded = PatientRegistry::load(&api).await.unwrap();
        assert_eq!(loaded.patients().len(), 3);
        assert_eq!(api.calls(), vec![PatientCall::Search(String::new())]);
    }

    #[tokio::test]
    async fn created_patient_reads_back_with_same_classification() {
        let api = FakePatients::default();
        let payload = PatientPayload {
            nombre_completo: Some("Lucía Ruiz".into()),
            numero_identificacion: "14".into(),
            parentesco: Some(Parentesco::HijoA),
            cotizante_numero_identificacion: Some("11".into()),
            ..Default::default()
        };
        PatientRegistry::save_beneficiario(&api, payload, None)
            .await
            .unwrap();
        let id = IdNumber::new("14").unwrap();
        let fetched = api.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(fetched.tipo_paciente, TipoPaciente::Beneficiario);
    }

    #[tokio::test]
    async fn beneficiario_without_insured_party_is_rejected() {
        let api = FakePatients::default();
        let payload = PatientPayload {
            nombre_completo: Some("Lucía".into()),
            numero_identificacion: "14".into(),
            ..Default::default()
        };
        assert!(PatientRegistry::save_beneficiario(&api, payload, None)
            .await
            .is_err());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn edit_updates_the_addressed_record() {
        let api = FakePatients::default();
        let payload = PatientPayload {
            nombre_completo: Some("Ana Ruiz".into()),
            numero_identificacion: "11".into(),
            parentesco: Some(Parentesco::Mama),
            ..Default::default()
        };
        let id = IdNumber::new("11").unwrap();
        PatientRegistry::save_cotizante(&api, payload, Some(&id))
            .await
            .unwrap();
        match &api.calls()[..] {
            [PatientCall::Update(TipoPaciente::Cotizante, numero, sent)] => {
                assert_eq!(numero, "11");
                assert!(sent.parentesco.is_none());
            }
            other => panic!("unexpected calls: {other:?}"),
        }
        PatientRegistry::delete(&api, &id).await.unwrap();
        assert_eq!(api.calls().last(), Some(&PatientCall::Delete("11".into())));
    }
}
