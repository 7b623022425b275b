use crate::domain::{Coordinate, DeliveryRun, DeliveryStatus, DeliveryStop};
use crate::run_loader::serialized_run::{SerializedNote, SerializedProgramacion, SerializedRun};
use serde_json::Value;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

#[instrument]
pub async fn load_run(path: &str) -> Result<DeliveryRun, RunLoadError> {
    info!("📁 Loading delivery run...");
    let content = fs::read_to_string(path).await.map_err(|e| RunLoadError::Io {
        source: e,
        path: PathBuf::from(path),
    })?;

    let run = from_json(&content)?;
    info!(
        "📁 Loading delivery run... OK, '{}' with {} stop(s), {} on the map",
        run.id,
        run.stops.len(),
        run.mapped_stops().count()
    );
    Ok(run)
}

pub fn from_json(content: &str) -> Result<DeliveryRun, RunLoadError> {
    let serialized: SerializedRun = serde_json::from_str(content)?;
    let programacion = serialized.programacion.ok_or(RunLoadError::MissingRun)?;

    let stops = serialized
        .notas
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .filter_map(|(index, note)| match note {
            Value::Object(_) => match serde_json::from_value::<SerializedNote>(note) {
                Ok(note) => Some(to_stop(note)),
                Err(e) => {
                    warn!("⚠️ Skipping delivery note #{}: {}", index, e);
                    None
                }
            },
            _ => {
                debug!("Skipping delivery note #{}, not an object", index);
                None
            }
        })
        .collect();

    Ok(to_run(programacion, stops))
}

fn to_run(programacion: SerializedProgramacion, stops: Vec<DeliveryStop>) -> DeliveryRun {
    DeliveryRun {
        id: sanitize(programacion.id),
        delivery_date: programacion.fecha_entrega,
        delivery_status: programacion.estado_entrega,
        vehicle_description: sanitize(programacion.vehiculo_descripcion),
        driver_name: sanitize(programacion.conductor_nombre),
        device_id: programacion.dispositivo_id.map(|device_id| device_id.trim().to_string()),
        stops,
    }
}

fn to_stop(note: SerializedNote) -> DeliveryStop {
    let raw_location = sanitize(note.ubicacion_entrega);
    let coordinate = match raw_location.parse::<Coordinate>() {
        Ok(coordinate) => Some(coordinate),
        Err(e) => {
            debug!("Stop location '{}' is not plottable: {}", raw_location, e);
            None
        }
    };

    let exit_id = sanitize(note.id_salida_programada);
    DeliveryStop {
        id: if exit_id.is_empty() { sanitize(note.id_nota_salida) } else { exit_id },
        client: or_default(sanitize(note.cliente), "No client"),
        address: or_default(sanitize(note.direccion), "No address"),
        exit_number: or_default(sanitize(note.nro_salida), "-"),
        priority_order: note.orden_prioridad_ruta,
        status: DeliveryStatus::from_code(note.estado_entrega),
        raw_location,
        coordinate,
    }
}

fn sanitize(value: Option<String>) -> String {
    value.as_deref().map(str::trim).unwrap_or_default().to_string()
}

fn or_default(value: String, default: &str) -> String {
    if value.is_empty() { default.to_string() } else { value }
}

#[derive(Error, Debug)]
pub enum RunLoadError {
    #[error("{}", source)]
    Io { source: io::Error, path: PathBuf },
    #[error("invalid delivery run: {0}")]
    Json(#[from] serde_json::Error),
    #[error("the delivery run has no 'programacion'")]
    MissingRun,
}
