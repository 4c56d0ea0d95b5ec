pub mod comparison_service;
pub mod ingest_service;
pub mod processor;
