use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chara_blob::store::BlobStore;
use chara_blob::{
    BlobAdapter, BlobConfig, BlobId, BlobRef, BlobResult, ImagePut, MemoryBlobStore, Removal,
};
use chara_core::{
    CharacterLifecycle, CharacterPatch, CreateRequest, ErrorKind, LifecyclePolicy,
    MemoryRecordStore, NewCharacter, OrphanPolicy, RecordStore, UpdateRequest,
};
use chara_core::{Character, CharacterId};

/// Wraps the memory store and injects failures on demand.
#[derive(Clone, Default)]
struct FlakyRecords {
    inner: MemoryRecordStore,
    fail_insert: Arc<AtomicBool>,
    fail_update: Arc<AtomicBool>,
    vanish_before_update: Arc<AtomicBool>,
    remove_calls: Arc<AtomicUsize>,
}

#[async_trait]
impl RecordStore for FlakyRecords {
    async fn find(&self, id: CharacterId) -> Result<Option<Character>> {
        self.inner.find(id).await
    }

    async fn list(&self) -> Result<Vec<Character>> {
        self.inner.list().await
    }

    async fn insert(&self, data: NewCharacter) -> Result<Character> {
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(anyhow!("database is locked"));
        }
        self.inner.insert(data).await
    }

    async fn update(&self, id: CharacterId, patch: CharacterPatch) -> Result<Option<Character>> {
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(anyhow!("database is locked"));
        }
        if self.vanish_before_update.load(Ordering::SeqCst) {
            self.inner.remove(id).await?;
        }
        self.inner.update(id, patch).await
    }

    async fn remove(&self, id: CharacterId) -> Result<bool> {
        self.remove_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.remove(id).await
    }
}

/// Always answers with the same reference, like a CDN with a fixed public id.
struct FixedBlobStore;

#[async_trait]
impl BlobStore for FixedBlobStore {
    async fn store(&self, _image: ImagePut) -> BlobResult<BlobRef> {
        Ok(BlobRef::new(
            "https://cdn/upload/character/abc123.png",
            BlobId::from("character/abc123"),
        ))
    }

    async fn remove(&self, _id: &BlobId) -> BlobResult<Removal> {
        Ok(Removal::Removed)
    }
}

fn png() -> ImagePut {
    ImagePut::new(vec![0x89u8, b'P', b'N', b'G']).with_content_type("image/png")
}

fn setup() -> (CharacterLifecycle, FlakyRecords, MemoryBlobStore) {
    let records = FlakyRecords::default();
    let blobs = MemoryBlobStore::new();
    let chars = CharacterLifecycle::new(
        records.clone(),
        BlobAdapter::new(blobs.clone(), BlobConfig::default()),
    );
    (chars, records, blobs)
}

#[tokio::test]
async fn create_persists_the_locator_the_blob_store_returned() {
    let chars = CharacterLifecycle::new(
        MemoryRecordStore::new(),
        BlobAdapter::new(FixedBlobStore, BlobConfig::default()),
    );

    let created = chars
        .create_character(CreateRequest::new("Haru", 55).with_image(png()))
        .await
        .unwrap();

    assert_eq!(created.id, 1);
    assert_eq!(created.name, "Haru");
    assert_eq!(created.age, 55);
    assert_eq!(created.image_ref, "https://cdn/upload/character/abc123.png");
}

#[tokio::test]
async fn create_without_image_has_empty_ref() {
    let (chars, _, blobs) = setup();

    let created = chars
        .create_character(CreateRequest::new("Mika", 12))
        .await
        .unwrap();

    assert!(!created.has_image());
    assert!(blobs.is_empty().await);
}

#[tokio::test]
async fn failed_upload_leaves_no_record() {
    let (chars, records, blobs) = setup();
    blobs.set_unavailable(true);

    let err = chars
        .create_character(CreateRequest::new("Haru", 55).with_image(png()))
        .await
        .unwrap_err();

    assert!(err.is(ErrorKind::ImageUploadFailed));
    assert_eq!(err.code(), 502);
    assert!(records.list().await.unwrap().is_empty());
    assert!(records.find(1).await.unwrap().is_none());
}

#[tokio::test]
async fn failed_insert_compensates_the_uploaded_blob() {
    let (chars, records, blobs) = setup();
    records.fail_insert.store(true, Ordering::SeqCst);

    let err = chars
        .create_character(CreateRequest::new("Haru", 55).with_image(png()))
        .await
        .unwrap_err();

    assert!(err.is(ErrorKind::InternalError));
    assert!(blobs.is_empty().await);
}

#[tokio::test]
async fn failed_insert_leaves_blob_when_tolerating_orphans() {
    let (chars, records, blobs) = setup();
    let chars = chars.with_policy(LifecyclePolicy {
        orphans: OrphanPolicy::Tolerate,
        ..Default::default()
    });
    records.fail_insert.store(true, Ordering::SeqCst);

    chars
        .create_character(CreateRequest::new("Haru", 55).with_image(png()))
        .await
        .unwrap_err();

    assert_eq!(blobs.len().await, 1);
}

#[tokio::test]
async fn delete_succeeds_when_blob_removal_fails() {
    let (chars, records, blobs) = setup();
    let created = chars
        .create_character(CreateRequest::new("Haru", 55).with_image(png()))
        .await
        .unwrap();

    blobs.set_unavailable(true);
    chars.delete_character(created.id).await.unwrap();

    assert!(records.find(created.id).await.unwrap().is_none());
    assert_eq!(records.remove_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn delete_with_unparseable_locator_still_removes() {
    let (chars, records, _) = setup();
    let created = records
        .insert(NewCharacter {
            name: "Haru".into(),
            age: 55,
            image_ref: "not a url".into(),
        })
        .await
        .unwrap();

    chars.delete_character(created.id).await.unwrap();

    assert!(records.find(created.id).await.unwrap().is_none());
}

#[tokio::test]
async fn delete_removes_image_blob() {
    let (chars, _, blobs) = setup();
    let created = chars
        .create_character(CreateRequest::new("Haru", 55).with_image(png()))
        .await
        .unwrap();
    assert_eq!(blobs.len().await, 1);

    chars.delete_character(created.id).await.unwrap();

    assert!(blobs.is_empty().await);
}

#[tokio::test]
async fn delete_of_missing_id_is_not_found_without_remove_call() {
    let (chars, records, _) = setup();

    let err = chars.delete_character(999).await.unwrap_err();

    assert!(err.is(ErrorKind::NotFound));
    assert_eq!(records.remove_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn update_age_only_keeps_name_and_image() {
    let (chars, _, _) = setup();
    let created = chars
        .create_character(CreateRequest::new("Haru", 55).with_image(png()))
        .await
        .unwrap();

    let updated = chars
        .update_character(UpdateRequest::new(created.id).with_age(30))
        .await
        .unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.name, "Haru");
    assert_eq!(updated.age, 30);
    assert_eq!(updated.image_ref, created.image_ref);
}

#[tokio::test]
async fn update_name_only_keeps_age() {
    let (chars, _, _) = setup();
    let created = chars
        .create_character(CreateRequest::new("Haru", 55))
        .await
        .unwrap();

    let updated = chars
        .update_character(UpdateRequest::new(created.id).with_name("Haruka"))
        .await
        .unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.age, 55);
    assert_eq!(updated.name, "Haruka");
}

#[tokio::test]
async fn update_with_failed_upload_keeps_record_untouched() {
    let (chars, records, blobs) = setup();
    let created = chars
        .create_character(CreateRequest::new("Haru", 55).with_image(png()))
        .await
        .unwrap();

    blobs.set_unavailable(true);
    let err = chars
        .update_character(
            UpdateRequest::new(created.id)
                .with_age(30)
                .with_image(png()),
        )
        .await
        .unwrap_err();

    assert!(err.is(ErrorKind::ImageUploadFailed));
    assert_eq!(records.find(created.id).await.unwrap(), Some(created));
}

#[tokio::test]
async fn update_of_missing_id_is_not_found() {
    let (chars, _, blobs) = setup();

    let err = chars
        .update_character(UpdateRequest::new(7).with_image(png()))
        .await
        .unwrap_err();

    assert!(err.is(ErrorKind::NotFound));
    assert!(blobs.is_empty().await);
}

#[tokio::test]
async fn record_vanishing_mid_update_is_not_found_and_compensated() {
    let (chars, records, blobs) = setup();
    let created = chars
        .create_character(CreateRequest::new("Haru", 55))
        .await
        .unwrap();
    records.vanish_before_update.store(true, Ordering::SeqCst);

    let err = chars
        .update_character(UpdateRequest::new(created.id).with_image(png()))
        .await
        .unwrap_err();

    assert!(err.is(ErrorKind::NotFound));
    assert!(blobs.is_empty().await);
}

#[tokio::test]
async fn failed_record_update_compensates_new_blob_and_keeps_old() {
    let (chars, records, blobs) = setup();
    let created = chars
        .create_character(CreateRequest::new("Haru", 55).with_image(png()))
        .await
        .unwrap();
    records.fail_update.store(true, Ordering::SeqCst);

    let err = chars
        .update_character(UpdateRequest::new(created.id).with_image(png()))
        .await
        .unwrap_err();

    assert!(err.is(ErrorKind::InternalError));
    assert_eq!(err.sanitize_for_client().message, "Internal error");
    assert_eq!(blobs.len().await, 1);
    let old = chars.blobs().identifier(&created.image_ref).unwrap();
    assert!(blobs.contains(&old).await);
}

#[tokio::test]
async fn list_and_get_reflect_writes() {
    let (chars, _, _) = setup();
    let a = chars
        .create_character(CreateRequest::new("Haru", 55))
        .await
        .unwrap();
    let b = chars
        .create_character(CreateRequest::new("Mika", 12))
        .await
        .unwrap();

    let all = chars.list_characters().await.unwrap();
    assert_eq!(all, vec![a.clone(), b]);

    assert_eq!(chars.get_character(a.id).await.unwrap(), a);
    assert!(chars
        .get_character(404)
        .await
        .unwrap_err()
        .is(ErrorKind::NotFound));
}
