pub mod memory;
pub mod mysql;

pub use memory::InMemoryRepository;
pub use mysql::{MySqlRepository, MySqlSettings};
pub use urlshortener_core::repository::{scoped, Result, UrlRepository};
pub use urlshortener_core::StorageError;
