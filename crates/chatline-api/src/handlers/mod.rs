pub mod assets;
pub mod chat;
pub mod openai;
pub mod session;
