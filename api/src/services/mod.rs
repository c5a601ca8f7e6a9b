// Service layer between handlers and the store

pub mod delegation_service;

pub use delegation_service::DelegationService;
