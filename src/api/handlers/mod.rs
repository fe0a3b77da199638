pub mod errors;
pub mod events;
pub mod health;
pub mod history;
pub mod sessions;
pub mod settings;
