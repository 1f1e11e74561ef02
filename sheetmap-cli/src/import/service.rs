//! Entry points of the import engine

use std::sync::Arc;

use tokio::io::AsyncRead;

use crate::domain::{
    CrudService, HardwareLookup, HardwareRecord, StockLookup, StockRecord, TariffLookup,
    TariffRecord,
};

use super::dictionary::{FieldDictionaries, UploadType};
use super::error::ImportError;
use super::identifier::resolve_identifier;
use super::preview::preview_with;
use super::reconcile::{ReconcilePlan, reconcile};
use super::staging::StagingStore;
use super::transform::NumberPolicy;
use super::{MappingInstruction, MappingOptions, MappingResult, UploadData};

/// Record stores per upload type
#[derive(Clone)]
pub struct Backends {
    pub tariffs: Arc<dyn CrudService<TariffRecord, TariffLookup>>,
    pub hardware: Arc<dyn CrudService<HardwareRecord, HardwareLookup>>,
    pub stocks: Arc<dyn CrudService<StockRecord, StockLookup>>,
}

/// Stages uploads, previews them and applies mapping instructions
#[derive(Clone)]
pub struct MappingService {
    staging: StagingStore,
    dictionaries: Arc<FieldDictionaries>,
    backends: Backends,
    number_policy: NumberPolicy,
}

impl MappingService {
    pub fn new(
        staging: StagingStore,
        dictionaries: Arc<FieldDictionaries>,
        backends: Backends,
    ) -> Self {
        Self {
            staging,
            dictionaries,
            backends,
            number_policy: NumberPolicy::default(),
        }
    }

    pub fn with_number_policy(mut self, policy: NumberPolicy) -> Self {
        self.number_policy = policy;
        self
    }

    pub fn staging(&self) -> &StagingStore {
        &self.staging
    }

    pub fn dictionaries(&self) -> &FieldDictionaries {
        &self.dictionaries
    }

    /// Stage an upload and preview it for mapping.
    ///
    /// The upload type is checked before anything is written. If the staged
    /// file cannot be previewed the session is discarded again.
    pub async fn read_file<R>(&self, upload: UploadData<R>) -> Result<MappingOptions, ImportError>
    where
        R: AsyncRead + Unpin,
    {
        let dictionary = self.dictionaries.dictionary_for(&upload.upload_type)?;

        let session_id = upload.session_id.as_deref().filter(|id| !id.is_empty());
        let staged = self.staging.stage(session_id, upload.uploaded_file).await?;

        match preview_with(&staged.path, dictionary, &staged.session_id) {
            Ok(options) => {
                log::info!(
                    "Session {}: {} upload with {} columns ready for mapping",
                    options.session_id,
                    upload.upload_type,
                    options.header_row.len()
                );
                Ok(options)
            }
            Err(e) => {
                log::warn!("Session {}: preview failed: {}", staged.session_id, e);
                if let Err(discard_err) = self.staging.discard(&staged.session_id).await {
                    log::warn!("Session {}: {}", staged.session_id, discard_err);
                }
                Err(e)
            }
        }
    }

    /// Apply a mapping instruction to the file staged under its session.
    ///
    /// The cleanup countdown is cancelled first; the staged file is kept
    /// afterwards.
    pub async fn write_mapping(
        &self,
        instruction: &MappingInstruction,
    ) -> Result<MappingResult, ImportError> {
        if self.staging.cancel(&instruction.session_id) {
            log::debug!("Session {}: cleanup cancelled", instruction.session_id);
        }

        let upload_type: UploadType = instruction.upload_type.parse()?;
        let identifier =
            resolve_identifier(&instruction.mapping).ok_or(ImportError::MissingIdentifier)?;
        let filter = upload_type
            .identifier_filter(identifier.kind)
            .ok_or(ImportError::MissingIdentifier)?;
        let path = self.staging.staged_file_path(&instruction.session_id)?;

        log::info!(
            "Session {}: reconciling {} upload by {} in column {}",
            instruction.session_id,
            upload_type,
            identifier.kind,
            identifier.column_index + 1
        );

        let plan = ReconcilePlan {
            identifier,
            filter,
            mapping: &instruction.mapping,
            policy: self.number_policy,
        };

        match upload_type {
            UploadType::Tariff => reconcile(self.backends.tariffs.as_ref(), &path, plan).await,
            UploadType::Hardware => reconcile(self.backends.hardware.as_ref(), &path, plan).await,
            UploadType::Stocks => reconcile(self.backends.stocks.as_ref(), &path, plan).await,
        }
    }

    /// Keep a session's staged file beyond its countdown
    pub fn cancel_cleanup(&self, session_id: &str) -> bool {
        self.staging.cancel(session_id)
    }

    /// Drop a session and its staged file
    pub async fn discard(&self, session_id: &str) -> Result<(), ImportError> {
        self.staging.discard(session_id).await
    }
}
