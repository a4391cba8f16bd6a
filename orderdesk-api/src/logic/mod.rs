pub mod guestbook;
pub mod orders;
pub mod probe;
