//! Ciberabogados: diagnostic flow core for the legal-services assistant.

pub mod chat;
pub mod config;
pub mod error;
pub mod flow;
pub mod handover;
pub mod notice;
pub mod quiz;
pub mod registration;
pub mod services;
