pub mod claims_service;
pub mod idea_service;
pub mod trader_service;
