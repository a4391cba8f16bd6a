pub mod bootstrap;
pub mod guard;
pub mod records;
