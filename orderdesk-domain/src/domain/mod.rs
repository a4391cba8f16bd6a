pub mod configuration;
pub mod descriptor;
pub mod error;
pub mod record;
pub mod secret;

pub use configuration::*;
pub use descriptor::*;
pub use error::*;
pub use record::*;
pub use secret::*;

pub type Unit = ();
