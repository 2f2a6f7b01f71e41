use std::sync::Arc;

use meme_arena_engine::ArenaService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ArenaService>,
}
