// src/services/mod.rs

pub mod categories;
pub mod posts;

pub use categories::CategoryService;
pub use posts::PostService;

/// How many times a write is retried after losing a slug race.
const SLUG_WRITE_ATTEMPTS: usize = 3;
