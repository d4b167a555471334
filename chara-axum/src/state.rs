use std::sync::Arc;

use chara_core::CharacterLifecycle;

use crate::middlewares::MultipartConfig;

#[derive(Clone)]
pub struct CharaAxumState {
    pub lifecycle: Arc<CharacterLifecycle>,
    pub form: Arc<MultipartConfig>,
}

impl CharaAxumState {
    pub fn new(lifecycle: CharacterLifecycle, form: MultipartConfig) -> Self {
        Self {
            lifecycle: Arc::new(lifecycle),
            form: Arc::new(form),
        }
    }
}
