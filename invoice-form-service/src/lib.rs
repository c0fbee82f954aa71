//! Invoice Form Service - validates invoice form submissions, persists them
//! and revalidates the invoices dashboard.

pub mod actions;
pub mod config;
pub mod forms;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
