pub mod invoke;
pub mod login;
