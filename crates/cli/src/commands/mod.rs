pub mod chat;
pub mod chef;
pub mod email;
pub mod onboard;
pub mod status;
pub mod threads;
