//! dealstack: public listing and offer-click API for a coupon storefront.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
