// src/models/mod.rs

pub mod exam;
pub mod question;
pub mod user;
