//! Patient wire models, classification and display helpers.
//!
//! Responsibilities:
//! - Define the closed code sets the patient service uses (EPS, relationship, id type)
//! - Decode the loose wire record the backend returns into a classified [`Patient`]
//! - Build create/update payloads for the `cotizantes` and `beneficiarios` sub-resources
//!
//! Notes:
//! - Listing and search responses do not always carry `tipoPaciente`; it is inferred from
//!   `parentesco` when missing
//! - Beneficiaries reference their insured party by id-number only

use crate::constants::{BENEFICIARIOS_SEGMENT, COTIZANTES_SEGMENT};
use serde::{Deserialize, Serialize};

// ============================================================================
// Code sets
// ============================================================================

/// Whether a patient is the primary insured party or a dependant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TipoPaciente {
    Cotizante,
    Beneficiario,
}

impl TipoPaciente {
    /// Path segment of the sub-resource that creates and updates this kind of patient.
    pub fn segment(self) -> &'static str {
        match self {
            TipoPaciente::Cotizante => COTIZANTES_SEGMENT,
            TipoPaciente::Beneficiario => BENEFICIARIOS_SEGMENT,
        }
    }

    pub fn as_code(self) -> &'static str {
        match self {
            TipoPaciente::Cotizante => "COTIZANTE",
            TipoPaciente::Beneficiario => "BENEFICIARIO",
        }
    }

    fn from_wire(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "COTIZANTE" => Some(TipoPaciente::Cotizante),
            "BENEFICIARIO" => Some(TipoPaciente::Beneficiario),
            _ => None,
        }
    }
}

impl std::fmt::Display for TipoPaciente {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_code())
    }
}

impl std::str::FromStr for TipoPaciente {
    type Err = crate::DeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_wire(s)
            .ok_or_else(|| crate::DeskError::InvalidInput(format!("unknown patient type: {s}")))
    }
}

/// Relationship of a patient to the insured party.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Parentesco {
    /// The patient is the insured party.
    Cotizante,
    #[serde(rename = "ESPOSO_A")]
    EsposoA,
    #[serde(rename = "HIJO_A")]
    HijoA,
    #[serde(rename = "HERMANO_A")]
    HermanoA,
    Mama,
    Papa,
}

impl Parentesco {
    pub const ALL: [Parentesco; 6] = [
        Parentesco::Cotizante,
        Parentesco::EsposoA,
        Parentesco::HijoA,
        Parentesco::HermanoA,
        Parentesco::Mama,
        Parentesco::Papa,
    ];

    pub fn as_code(self) -> &'static str {
        match self {
            Parentesco::Cotizante => "COTIZANTE",
            Parentesco::EsposoA => "ESPOSO_A",
            Parentesco::HijoA => "HIJO_A",
            Parentesco::HermanoA => "HERMANO_A",
            Parentesco::Mama => "MAMA",
            Parentesco::Papa => "PAPA",
        }
    }

    /// Display label, e.g. `Hijo(a)`.
    pub fn label(self) -> &'static str {
        match self {
            Parentesco::Cotizante => "COTIZANTE",
            Parentesco::EsposoA => "Esposo(a)",
            Parentesco::HijoA => "Hijo(a)",
            Parentesco::HermanoA => "Hermano(a)",
            Parentesco::Mama => "Mamá",
            Parentesco::Papa => "Papá",
        }
    }
}

impl std::str::FromStr for Parentesco {
    type Err = crate::DeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|p| p.as_code() == code)
            .ok_or_else(|| crate::DeskError::InvalidInput(format!("unknown relationship: {s}")))
    }
}

/// Client status kept on the patient record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EstadoCliente {
    #[default]
    Activo,
    Inactivo,
}

impl EstadoCliente {
    pub fn as_code(self) -> &'static str {
        match self {
            EstadoCliente::Activo => "ACTIVO",
            EstadoCliente::Inactivo => "INACTIVO",
        }
    }
}

impl std::str::FromStr for EstadoCliente {
    type Err = crate::DeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ACTIVO" => Ok(EstadoCliente::Activo),
            "INACTIVO" => Ok(EstadoCliente::Inactivo),
            _ => Err(crate::DeskError::InvalidInput(format!(
                "unknown client status: {s}"
            ))),
        }
    }
}

/// Identity document type.
///
/// The patient service serialises these by their long description (for example
/// `CÉDULA DE CIUDADANÍA`); the short code is accepted on input as well.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TipoIdentificacion {
    CedulaCiudadania,
    TarjetaIdentidad,
    CedulaExtranjeria,
    RegistroCivil,
    Pasaporte,
    Pep,
    Pt,
}

impl TipoIdentificacion {
    pub const ALL: [TipoIdentificacion; 7] = [
        TipoIdentificacion::CedulaCiudadania,
        TipoIdentificacion::TarjetaIdentidad,
        TipoIdentificacion::CedulaExtranjeria,
        TipoIdentificacion::RegistroCivil,
        TipoIdentificacion::Pasaporte,
        TipoIdentificacion::Pep,
        TipoIdentificacion::Pt,
    ];

    pub fn as_code(self) -> &'static str {
        match self {
            TipoIdentificacion::CedulaCiudadania => "CEDULA_CIUDADANIA",
            TipoIdentificacion::TarjetaIdentidad => "TARJETA_IDENTIDAD",
            TipoIdentificacion::CedulaExtranjeria => "CEDULA_EXTRANJERIA",
            TipoIdentificacion::RegistroCivil => "REGISTRO_CIVIL",
            TipoIdentificacion::Pasaporte => "PASAPORTE",
            TipoIdentificacion::Pep => "PEP",
            TipoIdentificacion::Pt => "PT",
        }
    }

    /// Description used on the wire.
    pub fn description(self) -> &'static str {
        match self {
            TipoIdentificacion::CedulaCiudadania => "CÉDULA DE CIUDADANÍA",
            TipoIdentificacion::TarjetaIdentidad => "TARJETA DE IDENTIDAD",
            TipoIdentificacion::CedulaExtranjeria => "CÉDULA DE EXTRANJERÍA",
            TipoIdentificacion::RegistroCivil => "REGISTRO CIVIL",
            TipoIdentificacion::Pasaporte => "PASAPORTE",
            TipoIdentificacion::Pep => "PEP: PERMISO ESPECIAL DE PERMANENCIA",
            TipoIdentificacion::Pt => "PT: PERMISO POR PROTECCIÓN TEMPORAL",
        }
    }

    fn from_wire(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.description() == s || t.as_code().eq_ignore_ascii_case(s))
    }
}

impl std::fmt::Display for TipoIdentificacion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

impl std::str::FromStr for TipoIdentificacion {
    type Err = crate::DeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_wire(s).ok_or_else(|| {
            crate::DeskError::InvalidInput(format!("unknown identification type: {s}"))
        })
    }
}

impl Serialize for TipoIdentificacion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.description())
    }
}

impl<'de> Deserialize<'de> for TipoIdentificacion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_wire(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown identification type: {s}")))
    }
}

/// Health-insurance provider (EPS) codes accepted by the patient service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Eps {
    EpsSura,
    CoosaludEpsS,
    NuevaEps,
    MutualSer,
    AliansaludEps,
    SaludTotalEpsSa,
    EpsSanitas,
    Famisanar,
    ServicioOccidentalDeSaludEpsSos,
    SaludMia,
    Comfenalco,
    CompensarEps,
    EpmEmpresasPublicasDeMedellin,
    FondoDePasivoSocialDeFerrocarrilesNacionalesDeColombia,
    CajacopiAtlantico,
    Capresoca,
    Comfachoco,
    ComfamiliarDeLaGuajira,
    Comfaoriente,
    EpsFamiliarDeColombia,
    AsmetSalud,
    CapitalSaludEpsS,
    Convida,
    SaviaSaludEps,
    DusakawiEpsi,
    AsociacionIndigenaDelCaucaEpsi,
    AnasWayuuEpsi,
    MallamasEpsi,
    PijaosSaludEps,
}

impl Eps {
    pub const ALL: [Eps; 29] = [
        Eps::EpsSura,
        Eps::CoosaludEpsS,
        Eps::NuevaEps,
        Eps::MutualSer,
        Eps::AliansaludEps,
        Eps::SaludTotalEpsSa,
        Eps::EpsSanitas,
        Eps::Famisanar,
        Eps::ServicioOccidentalDeSaludEpsSos,
        Eps::SaludMia,
        Eps::Comfenalco,
        Eps::CompensarEps,
        Eps::EpmEmpresasPublicasDeMedellin,
        Eps::FondoDePasivoSocialDeFerrocarrilesNacionalesDeColombia,
        Eps::CajacopiAtlantico,
        Eps::Capresoca,
        Eps::Comfachoco,
        Eps::ComfamiliarDeLaGuajira,
        Eps::Comfaoriente,
        Eps::EpsFamiliarDeColombia,
        Eps::AsmetSalud,
        Eps::CapitalSaludEpsS,
        Eps::Convida,
        Eps::SaviaSaludEps,
        Eps::DusakawiEpsi,
        Eps::AsociacionIndigenaDelCaucaEpsi,
        Eps::AnasWayuuEpsi,
        Eps::MallamasEpsi,
        Eps::PijaosSaludEps,
    ];

    pub fn as_code(self) -> &'static str {
        match self {
            Eps::EpsSura => "EPS_SURA",
            Eps::CoosaludEpsS => "COOSALUD_EPS_S",
            Eps::NuevaEps => "NUEVA_EPS",
            Eps::MutualSer => "MUTUAL_SER",
            Eps::AliansaludEps => "ALIANSALUD_EPS",
            Eps::SaludTotalEpsSa => "SALUD_TOTAL_EPS_SA",
            Eps::EpsSanitas => "EPS_SANITAS",
            Eps::Famisanar => "FAMISANAR",
            Eps::ServicioOccidentalDeSaludEpsSos => "SERVICIO_OCCIDENTAL_DE_SALUD_EPS_SOS",
            Eps::SaludMia => "SALUD_MIA",
            Eps::Comfenalco => "COMFENALCO",
            Eps::CompensarEps => "COMPENSAR_EPS",
            Eps::EpmEmpresasPublicasDeMedellin => "EPM_EMPRESAS_PUBLICAS_DE_MEDELLIN",
            Eps::FondoDePasivoSocialDeFerrocarrilesNacionalesDeColombia => {
                "FONDO_DE_PASIVO_SOCIAL_DE_FERROCARRILES_NACIONALES_DE_COLOMBIA"
            }
            Eps::CajacopiAtlantico => "CAJACOPI_ATLANTICO",
            Eps::Capresoca => "CAPRESOCA",
            Eps::Comfachoco => "COMFACHOCO",
            Eps::ComfamiliarDeLaGuajira => "COMFAMILIAR_DE_LA_GUAJIRA",
            Eps::Comfaoriente => "COMFAORIENTE",
            Eps::EpsFamiliarDeColombia => "EPS_FAMILIAR_DE_COLOMBIA",
            Eps::AsmetSalud => "ASMET_SALUD",
            Eps::CapitalSaludEpsS => "CAPITAL_SALUD_EPS_S",
            Eps::Convida => "CONVIDA",
            Eps::SaviaSaludEps => "SAVIA_SALUD_EPS",
            Eps::DusakawiEpsi => "DUSAKAWI_EPSI",
            Eps::AsociacionIndigenaDelCaucaEpsi => "ASOCIACION_INDIGENA_DEL_CAUCA_EPSI",
            Eps::AnasWayuuEpsi => "ANAS_WAYUU_EPSI",
            Eps::MallamasEpsi => "MALLAMAS_EPSI",
            Eps::PijaosSaludEps => "PIJAOS_SALUD_EPS",
        }
    }

    /// Title-cased name, e.g. `EPS_SURA` -> `Eps Sura`.
    pub fn display_name(self) -> String {
        format_code_name(self.as_code())
    }
}

impl std::fmt::Display for Eps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_code())
    }
}

impl std::str::FromStr for Eps {
    type Err = crate::DeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase().replace(' ', "_");
        Self::ALL
            .into_iter()
            .find(|e| e.as_code() == code)
            .ok_or_else(|| crate::DeskError::InvalidInput(format!("unknown EPS: {s}")))
    }
}

/// Title-case an underscore-separated code.
pub fn format_code_name(code: &str) -> String {
    code.split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// Wire record
// ============================================================================

/// Short reference to a beneficiary's insured party.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CotizanteSummary {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub nombre_completo: Option<String>,
    #[serde(default)]
    pub tipo_identificacion: Option<TipoIdentificacion>,
    #[serde(default)]
    pub numero_identificacion: Option<String>,
}

/// Patient as the backend sends it: every field optional.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PatientRecord {
    #[serde(default)]
    id: Option<i64>,
    #[serde(default)]
    tipo_paciente: Option<String>,
    #[serde(default)]
    nombre_completo: Option<String>,
    #[serde(default)]
    tipo_identificacion: Option<TipoIdentificacion>,
    #[serde(default)]
    numero_identificacion: Option<String>,
    #[serde(default)]
    fecha_nacimiento: Option<String>,
    #[serde(default)]
    fecha_expedicion: Option<String>,
    #[serde(default)]
    celular: Option<String>,
    #[serde(default)]
    correo: Option<String>,
    #[serde(default)]
    direccion_residencia: Option<String>,
    #[serde(default, alias = "estadoCliente")]
    estado: Option<EstadoCliente>,
    #[serde(default)]
    parentesco: Option<Parentesco>,
    #[serde(default)]
    eps: Option<Eps>,
    #[serde(default)]
    info_adicional: Option<String>,
    #[serde(default)]
    cotizante_numero_identificacion: Option<String>,
    #[serde(default)]
    cotizante: Option<CotizanteSummary>,
}

// ============================================================================
// Domain type
// ============================================================================

/// A classified patient.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "PatientRecord")]
pub struct Patient {
    pub id: Option<i64>,
    pub tipo_paciente: TipoPaciente,
    pub nombre_completo: String,
    pub tipo_identificacion: Option<TipoIdentificacion>,
    pub numero_identificacion: String,
    pub eps: Option<Eps>,
    pub celular: Option<String>,
    pub correo: Option<String>,
    pub direccion_residencia: Option<String>,
    pub fecha_nacimiento: Option<String>,
    pub fecha_expedicion: Option<String>,
    pub estado: EstadoCliente,
    pub info_adicional: Option<String>,
    pub parentesco: Option<Parentesco>,
    pub cotizante_numero_identificacion: Option<String>,
    pub cotizante: Option<CotizanteSummary>,
}

/// Decide whether a patient is a cotizante or a beneficiario.
///
/// An explicit, recognised `tipoPaciente` wins. Otherwise any relationship other than
/// `COTIZANTE` means beneficiario, and a missing relationship means cotizante.
pub fn classify(tipo_paciente: Option<&str>, parentesco: Option<Parentesco>) -> TipoPaciente {
    if let Some(explicit) = tipo_paciente.and_then(TipoPaciente::from_wire) {
        return explicit;
    }
    match parentesco {
        Some(p) if p != Parentesco::Cotizante => TipoPaciente::Beneficiario,
        _ => TipoPaciente::Cotizante,
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl From<PatientRecord> for Patient {
    fn from(record: PatientRecord) -> Self {
        let tipo_paciente = classify(record.tipo_paciente.as_deref(), record.parentesco);
        Patient {
            id: record.id,
            tipo_paciente,
            nombre_completo: record.nombre_completo.unwrap_or_default(),
            tipo_identificacion: record.tipo_identificacion,
            numero_identificacion: record.numero_identificacion.unwrap_or_default(),
            eps: record.eps,
            celular: blank_to_none(record.celular),
            correo: blank_to_none(record.correo),
            direccion_residencia: blank_to_none(record.direccion_residencia),
            fecha_nacimiento: blank_to_none(record.fecha_nacimiento),
            fecha_expedicion: blank_to_none(record.fecha_expedicion),
            estado: record.estado.unwrap_or_default(),
            info_adicional: blank_to_none(record.info_adicional),
            parentesco: record.parentesco,
            cotizante_numero_identificacion: blank_to_none(record.cotizante_numero_identificacion),
            cotizante: record.cotizante,
        }
    }
}

impl Patient {
    pub fn is_beneficiario(&self) -> bool {
        self.tipo_paciente == TipoPaciente::Beneficiario
    }

    /// Id-number of the insured party, from the flat field or the embedded summary.
    pub fn insured_id(&self) -> Option<&str> {
        self.cotizante_numero_identificacion.as_deref().or_else(|| {
            self.cotizante
                .as_ref()
                .and_then(|c| c.numero_identificacion.as_deref())
                .filter(|n| !n.trim().is_empty())
        })
    }

    /// Name of the insured party, when the embedded summary carries it.
    pub fn insured_name(&self) -> Option<&str> {
        self.cotizante
            .as_ref()
            .and_then(|c| c.nombre_completo.as_deref())
            .filter(|n| !n.trim().is_empty())
    }

    /// `"<id type> <id number>"` as shown on cards and in reports.
    pub fn identification(&self) -> String {
        match self.tipo_identificacion {
            Some(t) => format!("{} {}", t.description(), self.numero_identificacion),
            None => self.numero_identificacion.clone(),
        }
    }
}

// ============================================================================
// Write payload
// ============================================================================

/// Body of `POST`/`PUT` on the `cotizantes` and `beneficiarios` sub-resources.
///
/// Unset optional fields go out as JSON `null`; the beneficiary-only fields are omitted
/// entirely for cotizantes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientPayload {
    pub nombre_completo: Option<String>,
    pub tipo_identificacion: Option<TipoIdentificacion>,
    pub numero_identificacion: String,
    pub eps: Option<Eps>,
    pub celular: Option<String>,
    pub correo: Option<String>,
    pub direccion_residencia: Option<String>,
    pub fecha_nacimiento: Option<String>,
    pub fecha_expedicion: Option<String>,
    pub estado: Option<EstadoCliente>,
    pub info_adicional: Option<String>,
    pub tipo_paciente: Option<TipoPaciente>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parentesco: Option<Parentesco>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cotizante_numero_identificacion: Option<String>,
}

impl PatientPayload {
    /// Payload that re-sends a stored patient unchanged.
    pub fn from_patient(patient: &Patient) -> Self {
        let beneficiario = patient.is_beneficiario();
        Self {
            nombre_completo: Some(patient.nombre_completo.clone()).filter(|n| !n.is_empty()),
            tipo_identificacion: patient.tipo_identificacion,
            numero_identificacion: patient.numero_identificacion.clone(),
            eps: patient.eps,
            celular: patient.celular.clone(),
            correo: patient.correo.clone(),
            direccion_residencia: patient.direccion_residencia.clone(),
            fecha_nacimiento: patient.fecha_nacimiento.clone(),
            fecha_expedicion: patient.fecha_expedicion.clone(),
            estado: Some(patient.estado),
            info_adicional: patient.info_adicional.clone(),
            tipo_paciente: Some(patient.tipo_paciente),
            parentesco: if beneficiario { patient.parentesco } else { None },
            cotizante_numero_identificacion: if beneficiario {
                patient.insured_id().map(str::to_string)
            } else {
                None
            },
        }
    }

    /// Kind of sub-resource the payload targets; defaults to cotizante.
    pub fn kind(&self) -> TipoPaciente {
        self.tipo_paciente.unwrap_or(TipoPaciente::Cotizante)
    }

    /// Check the fields the backend requires before anything is sent.
    ///
    /// # Errors
    ///
    /// Returns [`crate::DeskError::InvalidInput`] if:
    /// - the name or id-number is blank,
    /// - a beneficiary payload has no insured-party id-number or relationship.
    pub fn validate(&self) -> crate::DeskResult<()> {
        if self
            .nombre_completo
            .as_deref()
            .is_none_or(|n| n.trim().is_empty())
            || self.numero_identificacion.trim().is_empty()
        {
            return Err(crate::DeskError::InvalidInput(
                "patient name and identification number are required".into(),
            ));
        }
        if self.kind() == TipoPaciente::Beneficiario {
            self.validate_insured_reference()?;
        }
        Ok(())
    }

    /// A beneficiary must point at its cotizante and say how it is related.
    pub fn validate_insured_reference(&self) -> crate::DeskResult<()> {
        if self
            .cotizante_numero_identificacion
            .as_deref()
            .is_none_or(|n| n.trim().is_empty())
        {
            return Err(crate::DeskError::InvalidInput(
                "a beneficiario needs the cotizante's identification number".into(),
            ));
        }
        if self.parentesco.is_none() {
            return Err(crate::DeskError::InvalidInput(
                "a beneficiario needs a relationship (parentesco)".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Patient {
        serde_json::from_str(json).expect("patient json")
    }

    #[test]
    fn relationship_without_type_classifies_as_beneficiario() {
        let p = parse(
            r#"{"nombreCompleto":"Luisa Gómez","numeroIdentificacion":"1001","parentesco":"HIJO_A","eps":"NUEVA_EPS"}"#,
        );
        assert_eq!(p.tipo_paciente, TipoPaciente::Beneficiario);
    }

    #[test]
    fn cotizante_or_missing_relationship_classifies_as_cotizante() {
        let explicit = parse(r#"{"numeroIdentificacion":"1","parentesco":"COTIZANTE"}"#);
        assert_eq!(explicit.tipo_paciente, TipoPaciente::Cotizante);
        let null = parse(r#"{"numeroIdentificacion":"2","parentesco":null}"#);
        assert_eq!(null.tipo_paciente, TipoPaciente::Cotizante);
        let missing = parse(r#"{"numeroIdentificacion":"3"}"#);
        assert_eq!(missing.tipo_paciente, TipoPaciente::Cotizante);
    }

    #[test]
    fn explicit_type_wins_and_is_case_insensitive() {
        let p = parse(r#"{"numeroIdentificacion":"4","tipoPaciente":"beneficiario"}"#);
        assert_eq!(p.tipo_paciente, TipoPaciente::Beneficiario);
        let odd = parse(r#"{"numeroIdentificacion":"5","tipoPaciente":"OTRO","parentesco":"MAMA"}"#);
        assert_eq!(odd.tipo_paciente, TipoPaciente::Beneficiario);
    }

    #[test]
    fn defaults_fill_missing_fields() {
        let p = parse(r#"{"numeroIdentificacion":"6","celular":"  "}"#);
        assert_eq!(p.estado, EstadoCliente::Activo);
        assert!(p.celular.is_none());
        assert_eq!(p.nombre_completo, "");
    }

    #[test]
    fn id_type_accepts_description_and_code() {
        let by_desc = parse(
            r#"{"numeroIdentificacion":"7","tipoIdentificacion":"CÉDULA DE CIUDADANÍA"}"#,
        );
        let by_code = parse(r#"{"numeroIdentificacion":"7","tipoIdentificacion":"cedula_ciudadania"}"#);
        assert_eq!(
            by_desc.tipo_identificacion,
            Some(TipoIdentificacion::CedulaCiudadania)
        );
        assert_eq!(by_desc.tipo_identificacion, by_code.tipo_identificacion);
        assert_eq!(by_desc.identification(), "CÉDULA DE CIUDADANÍA 7");
    }

    #[test]
    fn insured_reference_comes_from_flat_field_or_summary() {
        let flat = parse(
            r#"{"numeroIdentificacion":"8","parentesco":"PAPA","cotizanteNumeroIdentificacion":"900"}"#,
        );
        assert_eq!(flat.insured_id(), Some("900"));
        let nested = parse(
            r#"{"numeroIdentificacion":"9","parentesco":"PAPA","cotizante":{"nombreCompleto":"Jorge","numeroIdentificacion":"901"}}"#,
        );
        assert_eq!(nested.insured_id(), Some("901"));
        assert_eq!(nested.insured_name(), Some("Jorge"));
    }

    #[test]
    fn eps_display_names_are_title_cased() {
        assert_eq!(Eps::EpsSura.display_name(), "Eps Sura");
        assert_eq!(Eps::CoosaludEpsS.display_name(), "Coosalud Eps S");
        assert_eq!(
            serde_json::to_string(&Eps::ServicioOccidentalDeSaludEpsSos).unwrap(),
            "\"SERVICIO_OCCIDENTAL_DE_SALUD_EPS_SOS\""
        );
        for eps in Eps::ALL {
            let json = serde_json::to_string(&eps).unwrap();
            assert_eq!(json, format!("\"{}\"", eps.as_code()));
        }
    }

    #[test]
    fn relationship_labels() {
        assert_eq!(Parentesco::HijoA.label(), "Hijo(a)");
        assert_eq!(Parentesco::Mama.label(), "Mamá");
        assert_eq!("hermano_a".parse::<Parentesco>().unwrap(), Parentesco::HermanoA);
    }

    #[test]
    fn beneficiario_payload_requires_insured_reference() {
        let mut payload = PatientPayload {
            nombre_completo: Some("Sofía Ruiz".into()),
            numero_identificacion: "1002".into(),
            tipo_paciente: Some(TipoPaciente::Beneficiario),
            parentesco: Some(Parentesco::HijoA),
            ..Default::default()
        };
        assert!(payload.validate().is_err());
        payload.cotizante_numero_identificacion = Some("500".into());
        assert!(payload.validate().is_ok());
        payload.parentesco = None;
        assert!(payload.validate().is_err());
    }

    #[test]
    fn cotizante_payload_omits_beneficiary_fields() {
        let payload = PatientPayload {
            nombre_completo: Some("Ana".into()),
            numero_identificacion: "1".into(),
            tipo_paciente: Some(TipoPaciente::Cotizante),
            ..Default::default()
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("parentesco").is_none());
        assert!(json.get("cotizanteNumeroIdentificacion").is_none());
        assert!(json.get("celular").is_some_and(|v| v.is_null()));
        assert_eq!(json["tipoPaciente"], "COTIZANTE");
    }
}
