pub mod envelope;
pub mod event;
pub mod health;
pub mod outcome;
pub mod payload;
pub mod response;
pub mod retry;
