use std::sync::Arc;

use crate::auth::TokenKeys;
use crate::db::Repository;

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repository>,
    pub tokens: Arc<TokenKeys>,
}

impl AppState {
    pub fn new(repo: Arc<dyn Repository>, tokens: TokenKeys) -> Self {
        Self {
            repo,
            tokens: Arc::new(tokens),
        }
    }
}
