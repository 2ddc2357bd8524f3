//! Application services: listing, resolution, click accounting, caching.

pub mod audit;
pub mod cache;
pub mod clicks;
pub mod listing;
pub mod navigator;
pub mod offers;
pub mod pagination;
pub mod repos;
