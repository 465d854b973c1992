use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::pipeline::evaluate_section;
use crate::registry::Registry;
use crate::snmp::{
    DeviceDetector, DeviceInfo, FetchError, FetchMode, SYS_OBJECT_ID_SUFFIX, SYSTEM_OID,
    TableFetcher,
};

pub mod correlate;
pub mod types;

pub use types::{CheckResult, DeviceReport, RecordFailure, SectionOutcome};

/// Опрос одного устройства по всем разделам реестра
pub struct DevicePoller<F> {
    registry: Arc<Registry>,
    fetcher: Arc<F>,
    target: String,
}

impl<F: TableFetcher + 'static> DevicePoller<F> {
    pub fn new(registry: Arc<Registry>, fetcher: Arc<F>, target: impl Into<String>) -> Self {
        Self {
            registry,
            fetcher,
            target: target.into(),
        }
    }

    /// Один цикл опроса. Разделы обрабатываются параллельно отдельными
    /// задачами; сбой одного раздела не влияет на остальные.
    pub async fn poll(&self) -> DeviceReport {
        let device = self.identify().await;

        let sections = match self.detect().await {
            Ok(()) => self.collect_sections().await,
            Err(e) => {
                info!(target_device = %self.target, error = %e, "устройство не опрошено");
                self.registry
                    .sections()
                    .iter()
                    .map(|def| SectionOutcome::absent(def.kind, e.clone()))
                    .collect()
            }
        };

        DeviceReport {
            target: self.target.clone(),
            profile: self.registry.profile_name().to_string(),
            device,
            sections,
        }
    }

    async fn collect_sections(&self) -> Vec<SectionOutcome> {
        let handles: Vec<_> = self
            .registry
            .sections()
            .iter()
            .map(|def| {
                let def = Arc::clone(def);
                let kind = def.kind;
                let fetcher = Arc::clone(&self.fetcher);
                let handle: JoinHandle<SectionOutcome> = tokio::spawn(async move {
                    let fetched = fetcher.fetch(&def.base_oid, &def.suffixes(), def.mode).await;
                    evaluate_section(&def, fetched)
                });
                (kind, handle)
            })
            .collect();

        let mut sections = Vec::with_capacity(handles.len());
        for (kind, handle) in handles {
            match handle.await {
                Ok(outcome) => sections.push(outcome),
                Err(e) => {
                    error!(section = %kind, error = %e, "задача раздела завершилась аварийно");
                    sections.push(SectionOutcome::absent(kind, FetchError::Aborted(e.to_string())));
                }
            }
        }
        sections
    }

    /// Определяет производителя по sysObjectID; ошибки здесь не критичны
    async fn identify(&self) -> DeviceInfo {
        match self
            .fetcher
            .fetch(SYSTEM_OID, &[SYS_OBJECT_ID_SUFFIX.to_string()], FetchMode::Get)
            .await
        {
            Ok(columns) => columns
                .into_iter()
                .next()
                .and_then(|column| column.into_iter().next())
                .map(|id| DeviceDetector::detect_device_type(&id))
                .unwrap_or_else(DeviceInfo::generic),
            Err(e) => {
                debug!(target_device = %self.target, error = %e, "sysObjectID не получен");
                DeviceInfo::generic()
            }
        }
    }

    /// Проверяет, что устройство отвечает на OID профиля
    async fn detect(&self) -> Result<(), FetchError> {
        let Some(oid) = self.registry.detect_oid() else {
            return Ok(());
        };

        let columns = self.fetcher.fetch(oid, &[String::new()], FetchMode::Get).await?;
        let found = columns.first().is_some_and(|column| !column.is_empty());
        if found {
            Ok(())
        } else {
            Err(FetchError::NotDetected(oid.to_string()))
        }
    }
}
