use crate::lenient_deserializer::{integer_or_string, string_or_number};
use serde::Deserialize;
use serde_json::Value;

/// A delivery run as handed over by the dispatch screens: the run summary plus its notes.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SerializedRun {
    pub programacion: Option<SerializedProgramacion>,
    /// Kept raw, malformed entries are skipped one by one.
    pub notas: Option<Vec<Value>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SerializedProgramacion {
    #[serde(deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub fecha_entrega: Option<String>,
    #[serde(deserialize_with = "integer_or_string")]
    pub estado_entrega: Option<i64>,
    #[serde(deserialize_with = "string_or_number")]
    pub vehiculo_descripcion: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub conductor_nombre: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub dispositivo_id: Option<String>,
}

/// Every field is read loosely, a badly typed field falls back to its default instead of
/// dropping the stop.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SerializedNote {
    #[serde(deserialize_with = "string_or_number")]
    pub id_salida_programada: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub id_nota_salida: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub nro_salida: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub cliente: Option<String>,
    #[serde(deserialize_with = "integer_or_string")]
    pub orden_prioridad_ruta: Option<i64>,
    #[serde(deserialize_with = "integer_or_string")]
    pub estado_entrega: Option<i64>,
    #[serde(deserialize_with = "string_or_number")]
    pub direccion: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub ubicacion_entrega: Option<String>,
}
