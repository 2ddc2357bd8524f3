use std::sync::Arc;

use crate::application::clicks::ClickService;
use crate::application::listing::ListingService;

use super::rate_limit::ClickRateLimiter;

#[derive(Clone)]
pub struct ApiState {
    pub listing: Arc<ListingService>,
    pub clicks: Arc<ClickService>,
    pub rate_limiter: Arc<ClickRateLimiter>,
}
