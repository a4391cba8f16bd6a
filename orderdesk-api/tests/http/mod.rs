mod bootstrap;
mod guestbook;
mod orders;
mod postgres;
