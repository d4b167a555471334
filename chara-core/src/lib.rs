//! chara-core: the character record plus its image, kept consistent.
//!
//! Transport-agnostic. HTTP lives in `chara-axum`, persistence backends
//! in `chara-sqlx` and `chara-blob`.

pub mod config;
pub mod entity;
pub mod errors;
pub mod lifecycle;
pub mod records;
pub mod requests;

pub use config::{ConfigSnapshot, ConfigStore, ENV_PREFIX};
pub use entity::{Character, CharacterId, CharacterPatch, NewCharacter};
pub use errors::{CharaError, CharaResult, ErrorKind};
pub use lifecycle::{CharacterLifecycle, LifecyclePolicy, OrphanPolicy, SupersededImagePolicy};
pub use records::{MemoryRecordStore, RecordStore};
pub use requests::{CreateRequest, UpdateRequest};
