mod credential;
mod resolver;
mod secret;

pub use credential::*;
pub use resolver::*;
pub use secret::*;
