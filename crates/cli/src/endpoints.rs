use crate::error::CliError;
use connectors::{
    csv::source::CsvSource,
    memory::MemoryStore,
    sled_store::SledStore,
    store::{DataDestination, DataSource},
};
use engine_core::config::{EndpointConfig, EndpointKind};
use std::{path::PathBuf, sync::Arc};

fn required_path(endpoint: &EndpointConfig, role: &str) -> Result<PathBuf, CliError> {
    endpoint
        .path
        .clone()
        .ok_or_else(|| CliError::Unexpected(format!("{role} endpoint requires a path")))
}

pub fn build_source(endpoint: &EndpointConfig) -> Result<Arc<dyn DataSource>, CliError> {
    match endpoint.kind {
        EndpointKind::Csv => {
            let path = required_path(endpoint, "source")?;
            let entity = endpoint.entity.clone().ok_or_else(|| {
                CliError::Unexpected("csv source requires an entity name".into())
            })?;
            Ok(Arc::new(CsvSource::new(&entity, path)))
        }
        EndpointKind::Sled => {
            let path = required_path(endpoint, "source")?;
            let store = SledStore::open(path)
                .map_err(|err| CliError::Unexpected(format!("cannot open source store: {err}")))?;
            Ok(Arc::new(store))
        }
        EndpointKind::Memory => Ok(Arc::new(MemoryStore::new())),
    }
}

pub fn build_destination(endpoint: &EndpointConfig) -> Result<Arc<dyn DataDestination>, CliError> {
    match endpoint.kind {
        // CSV files are extraction-only
        EndpointKind::Csv => Err(CliError::UnsupportedEndpoint {
            kind: "csv".into(),
            role: "target".into(),
        }),
        EndpointKind::Sled => {
            let path = required_path(endpoint, "target")?;
            let store = SledStore::open(path)
                .map_err(|err| CliError::Unexpected(format!("cannot open target store: {err}")))?;
            Ok(Arc::new(store))
        }
        EndpointKind::Memory => Ok(Arc::new(MemoryStore::new())),
    }
}
