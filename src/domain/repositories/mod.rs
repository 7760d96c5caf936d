pub mod idea_repository;
pub mod platform_repository;
