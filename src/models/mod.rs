pub mod action;
pub mod element;
pub mod error_record;
pub mod requests;
pub mod responses;
pub mod settings;

pub use action::*;
pub use element::*;
pub use error_record::*;
pub use requests::*;
pub use responses::*;
pub use settings::*;
