//! Domain models for the SPFarms harvest workflow

mod facility;
mod harvest;
mod requests;
mod user;

pub use facility::*;
pub use harvest::*;
pub use requests::*;
pub use user::*;
