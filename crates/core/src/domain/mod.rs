pub mod entity;
pub mod installation;
pub mod message;
