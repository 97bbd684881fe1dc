#![forbid(unsafe_code)]

pub mod app_services;
pub mod catalog;
pub mod chat;
pub mod error;
pub mod identity;
pub mod lesson;
pub mod progress_store;

pub use tutor_core::Clock;

pub use app_services::AppServices;
pub use catalog::{Catalog, CatalogProvider, GeneratedCatalog};
pub use chat::{ChatConfig, ChatSession, ChatTutorService};
pub use error::{
    AppServicesError, AuthError, CatalogError, ChatConfigError, ChatError, NarrationError,
};
pub use identity::{AuthSession, IdentityProvider, sign_in_with_backoff, sign_up_with_backoff};
pub use lesson::{LessonView, Narrator, RevealTimer, SilentEngine, SpeechEngine};
pub use progress_store::{ProgressStore, StoreSnapshot};
