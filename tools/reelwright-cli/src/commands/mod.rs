pub mod captions;
pub mod check;
pub mod init;
pub mod render;
pub mod script;
pub mod thumbnail;
pub mod validate;
