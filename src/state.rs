use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    config::Config,
    repository::{CategoryRepository, PostRepository, UserRepository},
    services::{CategoryService, PostService},
};

#[derive(Clone)]
pub struct AppState {
    pub posts: PostService,
    pub categories: CategoryService,
    pub users: Arc<dyn UserRepository>,
    pub config: Config,
}

impl AppState {
    /// Wires every service to one store implementing all repositories.
    pub fn new<S>(store: Arc<S>, config: Config) -> Self
    where
        S: PostRepository + CategoryRepository + UserRepository + 'static,
    {
        Self {
            posts: PostService::new(store.clone()),
            categories: CategoryService::new(store.clone()),
            users: store,
            config,
        }
    }
}

impl FromRef<AppState> for PostService {
    fn from_ref(state: &AppState) -> Self {
        state.posts.clone()
    }
}

impl FromRef<AppState> for CategoryService {
    fn from_ref(state: &AppState) -> Self {
        state.categories.clone()
    }
}

impl FromRef<AppState> for Arc<dyn UserRepository> {
    fn from_ref(state: &AppState) -> Self {
        state.users.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
