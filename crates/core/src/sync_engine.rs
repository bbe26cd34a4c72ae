//! One-way OS2mo -> OS2rollekatalog synchronization pass.
//!
//! A run is strictly sequential:
//!
//! 1. Load the identity mapping (flat payload only).
//! 2. Transform org units.
//! 3. Transform employees.
//! 4. Optionally append the payload to the dump file.
//! 5. POST the payload to the role catalog.
//!
//! Any error aborts the run before the POST; there is no partial success.

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{AppConfig, PayloadFormat};
use crate::errors::{ConfigError, CoreError};
use crate::identity::MappingFile;
use crate::mo::{MoClient, OrgSource};
use crate::models::{DataWarning, OrganisationPayload, RoleCatalogPayload};
use crate::rollekatalog::{RoleCatalogClient, RoleCatalogSink};
use crate::transform::{build_org_tree, transform_employees, transform_org_units};

/// Outcome of a run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub org_units: usize,
    pub users: usize,
    pub warnings: Vec<DataWarning>,
    /// HTTP status returned by the role catalog; `None` for a dry run.
    pub sink_status: Option<u16>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl SyncReport {
    fn started() -> Self {
        Self {
            org_units: 0,
            users: 0,
            warnings: Vec::new(),
            sink_status: None,
            started_at: Utc::now(),
            completed_at: None,
        }
    }
}

/// Reads from `S`, writes to `K`.
pub struct SyncEngine<S, K> {
    config: AppConfig,
    source: S,
    sink: K,
}

impl SyncEngine<MoClient, RoleCatalogClient> {
    /// Engine wired to the real OS2mo and OS2rollekatalog clients.
    pub fn from_config(config: AppConfig) -> Result<Self, CoreError> {
        let source = MoClient::new(&config.os2mo, &config.http)?;
        let sink = RoleCatalogClient::new(&config.rollekatalog, &config.http)?;
        Ok(Self::new(config, source, sink))
    }
}

impl<S, K> SyncEngine<S, K>
where
    S: OrgSource,
    K: RoleCatalogSink,
{
    pub fn new(config: AppConfig, source: S, sink: K) -> Self {
        info!(format = ?config.sync.payload_format, "initializing sync engine");
        Self {
            config,
            source,
            sink,
        }
    }

    /// Read everything from the source and build the payload, without
    /// sending it.
    pub async fn build_payload(
        &self,
        warnings: &mut Vec<DataWarning>,
    ) -> Result<RoleCatalogPayload, CoreError> {
        let ad_system_name = &self.config.identity.ad_system_name;

        match self.config.sync.payload_format {
            PayloadFormat::Flat => {
                let mapping = MappingFile::load(&self.config.identity.mapping_file)?;
                info!(entries = mapping.len(), "identity mapping loaded");

                info!("reading organisation");
                let org_units = transform_org_units(&self.source, ad_system_name, warnings).await?;
                info!("found {} org units", org_units.len());

                info!("reading employees");
                let users = transform_employees(
                    &self.source,
                    &mapping,
                    ad_system_name,
                    self.config.sync.positions,
                    warnings,
                )
                .await?;
                info!("found {} employees", users.len());

                Ok(RoleCatalogPayload::Flat(OrganisationPayload { org_units, users }))
            }
            PayloadFormat::Tree => {
                let root = self.config.sync.root_org_unit.as_deref().ok_or_else(|| {
                    ConfigError::InvalidValue {
                        field: "sync.root_org_unit".into(),
                        detail: "a root org unit is required for the tree payload".into(),
                    }
                })?;
                let tree = build_org_tree(&self.source, root, ad_system_name, warnings).await?;
                info!("found {} org units", tree.len());
                Ok(RoleCatalogPayload::Tree(tree))
            }
        }
    }

    /// Build the payload and return it unsent.
    pub async fn dry_run(&self) -> Result<(RoleCatalogPayload, SyncReport), CoreError> {
        let mut report = SyncReport::started();
        let payload = self.build_payload(&mut report.warnings).await?;
        report.org_units = payload.org_unit_count();
        report.users = payload.user_count();
        report.completed_at = Some(Utc::now());
        Ok((payload, report))
    }

    /// Run a full pass: build, dump, send.
    pub async fn run(&self) -> Result<SyncReport, CoreError> {
        let mut report = SyncReport::started();
        let payload = self.build_payload(&mut report.warnings).await?;
        report.org_units = payload.org_unit_count();
        report.users = payload.user_count();

        self.dump(&payload)?;

        info!("writing to OS2rollekatalog");
        let response = self.sink.send(&payload).await?;
        report.sink_status = Some(response.status);
        report.completed_at = Some(Utc::now());

        info!(
            org_units = report.org_units,
            users = report.users,
            warnings = report.warnings.len(),
            "sync complete"
        );
        Ok(report)
    }

    /// Append the payload to the configured dump file, if any.
    fn dump(&self, payload: &RoleCatalogPayload) -> Result<(), CoreError> {
        let Some(path) = &self.config.output.dump_path else {
            return Ok(());
        };
        debug!(path = %path.display(), "dumping payload");

        let to_dump_error = |source: std::io::Error| CoreError::Dump {
            path: path.display().to_string(),
            source,
        };
        let json = serde_json::to_string_pretty(payload)
            .map_err(|e| to_dump_error(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(to_dump_error)?;
        writeln!(file, "{}", json).map_err(to_dump_error)?;
        Ok(())
    }
}
