pub mod media;
pub mod sqlx_repo;
