//! # Character lifecycle
//!
//! Sequences the record store and the blob store for every operation that
//! spans both. There is no shared transaction, so each operation is a short
//! linear sequence with fixed ordering:
//!
//! - **create**: store image → insert record. A failed upload aborts before
//!   any record exists.
//! - **update**: find → store new image → update record. A failed upload
//!   leaves the record and its old image untouched.
//! - **delete**: find → release image (best effort) → remove record. The
//!   record removal runs even when the image can't be reclaimed.
//!
//! Two gaps remain where a blob can outlive its record write. What happens
//! there is set by [`LifecyclePolicy`].

use std::str::FromStr;
use std::sync::Arc;

use chara_blob::{BlobAdapter, BlobError, BlobRef, ImagePut};
use tracing::{debug, error, info, instrument, warn};

use crate::entity::{Character, CharacterId, CharacterPatch, NewCharacter};
use crate::errors::{CharaError, CharaResult};
use crate::records::RecordStore;
use crate::requests::{CreateRequest, UpdateRequest};

/// What to do with a freshly stored image whose record write then failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrphanPolicy {
    /// Remove it again, best effort.
    #[default]
    Compensate,
    /// Leave it at the host.
    Tolerate,
}

/// What to do with an entity's previous image once an update replaced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SupersededImagePolicy {
    /// One blob per entity: remove the old one, best effort.
    #[default]
    Remove,
    /// Keep every version at the host.
    Retain,
}

impl FromStr for OrphanPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compensate" => Ok(Self::Compensate),
            "tolerate" => Ok(Self::Tolerate),
            other => Err(format!("unknown orphan policy: {other}")),
        }
    }
}

impl FromStr for SupersededImagePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "remove" => Ok(Self::Remove),
            "retain" => Ok(Self::Retain),
            other => Err(format!("unknown superseded image policy: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LifecyclePolicy {
    pub orphans: OrphanPolicy,
    pub superseded: SupersededImagePolicy,
}

/// The character service: records plus their images.
#[derive(Clone)]
pub struct CharacterLifecycle {
    records: Arc<dyn RecordStore>,
    blobs: BlobAdapter,
    policy: LifecyclePolicy,
}

impl CharacterLifecycle {
    pub fn new<R: RecordStore + 'static>(records: R, blobs: BlobAdapter) -> Self {
        Self::from_arc(Arc::new(records), blobs)
    }

    pub fn from_arc(records: Arc<dyn RecordStore>, blobs: BlobAdapter) -> Self {
        Self {
            records,
            blobs,
            policy: LifecyclePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: LifecyclePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> LifecyclePolicy {
        self.policy
    }

    pub fn blobs(&self) -> &BlobAdapter {
        &self.blobs
    }

    pub async fn list_characters(&self) -> CharaResult<Vec<Character>> {
        self.records
            .list()
            .await
            .map_err(|e| record_failure("list", e))
    }

    pub async fn get_character(&self, id: CharacterId) -> CharaResult<Character> {
        self.find_existing(id).await
    }

    #[instrument(skip_all, fields(name = %req.name, with_image = req.image.is_some()))]
    pub async fn create_character(&self, req: CreateRequest) -> CharaResult<Character> {
        let blob = match req.image {
            Some(image) => Some(self.upload(image).await?),
            None => None,
        };

        let data = NewCharacter {
            name: req.name,
            age: req.age,
            image_ref: blob
                .as_ref()
                .map(|b| b.locator.clone())
                .unwrap_or_default(),
        };

        match self.records.insert(data).await {
            Ok(created) => {
                info!(id = created.id, "character created");
                Ok(created)
            }
            Err(err) => {
                if let Some(blob) = &blob {
                    self.discard_orphan(blob).await;
                }
                Err(record_failure("create", err))
            }
        }
    }

    #[instrument(skip_all, fields(id = req.id, with_image = req.image.is_some()))]
    pub async fn update_character(&self, req: UpdateRequest) -> CharaResult<Character> {
        let existing = self.find_existing(req.id).await?;

        let blob = match req.image {
            Some(image) => Some(self.upload(image).await?),
            None => None,
        };

        let patch = CharacterPatch {
            name: req.name,
            age: req.age,
            image_ref: blob.as_ref().map(|b| b.locator.clone()),
        };

        let updated = match self.records.update(req.id, patch).await {
            Ok(Some(updated)) => updated,
            Ok(None) => {
                if let Some(blob) = &blob {
                    self.discard_orphan(blob).await;
                }
                return Err(not_found(req.id));
            }
            Err(err) => {
                if let Some(blob) = &blob {
                    self.discard_orphan(blob).await;
                }
                return Err(record_failure("update", err));
            }
        };

        let superseded = blob.is_some()
            && existing.has_image()
            && existing.image_ref != updated.image_ref;
        if superseded {
            match self.policy.superseded {
                SupersededImagePolicy::Remove => {
                    self.release_image(existing.id, &existing.image_ref).await
                }
                SupersededImagePolicy::Retain => {
                    debug!(locator = %existing.image_ref, "retaining superseded image")
                }
            }
        }

        info!(id = updated.id, "character updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_character(&self, id: CharacterId) -> CharaResult<()> {
        let existing = self.find_existing(id).await?;

        if existing.has_image() {
            self.release_image(id, &existing.image_ref).await;
        }

        let removed = self
            .records
            .remove(id)
            .await
            .map_err(|e| record_failure("delete", e))?;
        if !removed {
            debug!(id, "record already gone at removal");
        }

        info!(id, "character deleted");
        Ok(())
    }

    async fn find_existing(&self, id: CharacterId) -> CharaResult<Character> {
        self.records
            .find(id)
            .await
            .map_err(|e| record_failure("load", e))?
            .ok_or_else(|| not_found(id))
    }

    async fn upload(&self, image: ImagePut) -> CharaResult<BlobRef> {
        self.blobs.put(image).await.map_err(|err| {
            warn!(error = %err, "image upload failed");
            let message = match &err {
                BlobError::UploadRejected { reason } => format!("Image rejected: {reason}"),
                _ => "Image upload failed".to_string(),
            };
            CharaError::image_upload_failed(message).with_source(err)
        })
    }

    /// Blob cleanup never fails the caller; problems only reach the log.
    async fn release_image(&self, id: CharacterId, locator: &str) {
        match self.blobs.release(locator).await {
            Ok(outcome) => debug!(id, locator, ?outcome, "released image blob"),
            Err(err) => warn!(id, locator, error = %err, "blob cleanup failed"),
        }
    }

    async fn discard_orphan(&self, blob: &BlobRef) {
        match self.policy.orphans {
            OrphanPolicy::Tolerate => {
                warn!(identifier = %blob.identifier, "record write failed, image blob left orphaned")
            }
            OrphanPolicy::Compensate => match self.blobs.remove(&blob.identifier).await {
                Ok(outcome) => {
                    info!(identifier = %blob.identifier, ?outcome, "removed image blob of failed record write")
                }
                Err(err) => {
                    warn!(identifier = %blob.identifier, error = %err, "blob cleanup failed, image blob orphaned")
                }
            },
        }
    }
}

fn not_found(id: CharacterId) -> CharaError {
    CharaError::not_found(format!("Character not found: {id}"))
}

fn record_failure(action: &str, err: anyhow::Error) -> CharaError {
    error!(error = %err, "record store failed to {action}");
    CharaError::internal(format!("Failed to {action} character")).with_source(err)
}
