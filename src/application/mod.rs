//! Application services: the listing read path, the load generator, and
//! startup seeding, wired over the repository port.

pub mod benchmark;
pub mod error;
pub mod listing;
pub mod pagination;
pub mod repos;
pub mod seed;
