//! Click accounting: redirect choice, code reveal, counter upkeep, audit.

use std::sync::Arc;

use metrics::counter;
use time::OffsetDateTime;
use url::Url;
use uuid::Uuid;

use crate::application::audit::ClickAudit;
use crate::application::offers::OfferResolver;
use crate::application::repos::{MerchantsRepo, OffersRepo, RepoError};
use crate::domain::entities::{ClickAuditRecord, ClickSource, MerchantRecord, ResolvedOffer};

/// Request-scoped facts about the clicking client.
#[derive(Debug, Clone, Default)]
pub struct ClickContext {
    pub client_ip: String,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub platform: Option<String>,
    pub store_slug: Option<String>,
}

/// What the client gets back for an accepted click.
#[derive(Debug, Clone, PartialEq)]
pub struct ClickOutcome {
    pub code: Option<String>,
    pub redirect_url: Option<String>,
    /// Post-increment count for canonical offers; synthetic offers are never
    /// counted.
    pub clicks: Option<i64>,
    pub source: ClickSource,
}

pub struct ClickService {
    resolver: OfferResolver,
    offers: Arc<dyn OffersRepo>,
    merchants: Arc<dyn MerchantsRepo>,
    audit: ClickAudit,
}

impl ClickService {
    pub fn new(
        resolver: OfferResolver,
        offers: Arc<dyn OffersRepo>,
        merchants: Arc<dyn MerchantsRepo>,
        audit: ClickAudit,
    ) -> Self {
        Self {
            resolver,
            offers,
            merchants,
            audit,
        }
    }

    /// Register a click against `reference`. `Ok(None)` means the reference
    /// resolved to nothing. The audit write is enqueued, never awaited.
    pub async fn register_click(
        &self,
        reference: &str,
        ctx: ClickContext,
    ) -> Result<Option<ClickOutcome>, RepoError> {
        let Some(resolved) = self.resolver.resolve(reference).await? else {
            return Ok(None);
        };

        let merchant = self.merchants.find_by_id(resolved.merchant_id()).await?;

        let outcome = match &resolved {
            ResolvedOffer::Canonical(offer) => {
                let clicks = self.offers.increment_clicks(offer.id).await?;
                ClickOutcome {
                    code: offer.code.clone(),
                    redirect_url: pick_redirect([
                        merchant.as_ref().and_then(|m| m.affiliate_url.as_deref()),
                        merchant.as_ref().and_then(|m| m.website_url.as_deref()),
                    ]),
                    clicks: Some(clicks),
                    source: ClickSource::Canonical,
                }
            }
            ResolvedOffer::Synthetic(offer) => ClickOutcome {
                code: None,
                redirect_url: pick_redirect([
                    offer.redirect_url.as_deref(),
                    merchant.as_ref().and_then(|m| m.affiliate_url.as_deref()),
                    merchant.as_ref().and_then(|m| m.website_url.as_deref()),
                ]),
                clicks: None,
                source: ClickSource::MerchantBlock,
            },
        };

        counter!("dealstack_click_accepted_total").increment(1);
        self.audit.record(audit_record(&resolved, &ctx));

        Ok(Some(outcome))
    }
}

/// First candidate that parses as an absolute http(s) URL; anything else
/// (relative paths, other schemes, empty strings) is skipped.
fn pick_redirect<'a>(candidates: impl IntoIterator<Item = Option<&'a str>>) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .find(|candidate| {
            Url::parse(candidate)
                .map(|url| matches!(url.scheme(), "http" | "https"))
                .unwrap_or(false)
        })
        .map(str::to_string)
}

fn audit_record(resolved: &ResolvedOffer, ctx: &ClickContext) -> ClickAuditRecord {
    let (source, block_kind, block_index) = match resolved {
        ResolvedOffer::Canonical(_) => (ClickSource::Canonical, None, None),
        ResolvedOffer::Synthetic(offer) => (
            ClickSource::MerchantBlock,
            Some(offer.block_kind),
            Some(offer.block_index as i32),
        ),
    };
    ClickAuditRecord {
        id: Uuid::new_v4(),
        offer_ref: resolved.reference(),
        merchant_id: resolved.merchant_id(),
        client_ip: ctx.client_ip.clone(),
        user_agent: ctx.user_agent.clone(),
        referrer: ctx.referrer.clone(),
        platform: ctx.platform.clone(),
        store_slug: ctx.store_slug.clone(),
        source,
        block_kind,
        block_index,
        created_at: OffsetDateTime::now_utc(),
    }
}
