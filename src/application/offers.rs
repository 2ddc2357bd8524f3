//! Offer reference resolution.
//!
//! Maps an inbound reference string to either a stored offer row or a
//! synthetic offer reconstructed from a merchant's embedded content blocks.
//! Resolution is a pure function of the reference and the current merchant
//! row: nothing is mutated, and the same reference against an unchanged
//! merchant always selects the same block.

use std::sync::Arc;

use tracing::warn;

use crate::application::repos::{MerchantsRepo, OffersRepo, RepoError};
use crate::domain::entities::{ContentBlock, MerchantRecord, ResolvedOffer, SyntheticOffer};
use crate::domain::offer_ref::{CanonicalId, OfferRef};
use crate::domain::types::BlockKind;

pub struct OfferResolver {
    offers: Arc<dyn OffersRepo>,
    merchants: Arc<dyn MerchantsRepo>,
}

impl OfferResolver {
    pub fn new(offers: Arc<dyn OffersRepo>, merchants: Arc<dyn MerchantsRepo>) -> Self {
        Self { offers, merchants }
    }

    /// Resolve `reference` to an offer, or `None` when nothing matches.
    ///
    /// Canonical-shaped references try the offers table first. A lookup
    /// miss falls through to the composite grammars, and so does a lookup
    /// failure, which is a soft signal rather than an error.
    pub async fn resolve(&self, reference: &str) -> Result<Option<ResolvedOffer>, RepoError> {
        if let Some(canonical) = CanonicalId::parse(reference) {
            match self.offers.find_canonical(canonical).await {
                Ok(Some(offer)) => return Ok(Some(ResolvedOffer::Canonical(offer))),
                Ok(None) => {}
                Err(error) => {
                    warn!(%reference, error = %error, "canonical offer lookup failed, trying composite grammars");
                }
            }
        }

        let Some(composite) = OfferRef::parse_composite(reference) else {
            return Ok(None);
        };

        let merchant_id = match composite {
            OfferRef::Trending { merchant_id, .. }
            | OfferRef::Block { merchant_id, .. }
            | OfferRef::Legacy { merchant_id, .. } => merchant_id,
        };
        let Some(merchant) = self.merchants.find_by_id(merchant_id).await? else {
            return Ok(None);
        };

        Ok(synthesize(&merchant, composite).map(ResolvedOffer::Synthetic))
    }
}

/// Select the block named by `composite` and build the synthetic view.
/// Out-of-range indexes select nothing.
fn synthesize(merchant: &MerchantRecord, composite: OfferRef) -> Option<SyntheticOffer> {
    let (kind, index) = match composite {
        // 1-based position across h2 blocks followed by h3 blocks
        OfferRef::Trending { position, .. } => {
            let combined = position.checked_sub(1)?;
            if combined < merchant.h2_blocks.len() {
                (BlockKind::H2, combined)
            } else {
                (BlockKind::H3, combined - merchant.h2_blocks.len())
            }
        }
        OfferRef::Block { kind, index, .. } => (kind, index),
        OfferRef::Legacy {
            block: Some((kind, index)),
            ..
        } => (kind, index),
        // a bare legacy merchant reference selects the first block on offer
        OfferRef::Legacy { block: None, .. } => {
            if !merchant.h2_blocks.is_empty() {
                (BlockKind::H2, 0)
            } else {
                (BlockKind::H3, 0)
            }
        }
    };

    let blocks: &[ContentBlock] = match kind {
        BlockKind::H2 => &merchant.h2_blocks,
        BlockKind::H3 => &merchant.h3_blocks,
    };
    let block = blocks.get(index)?;

    Some(SyntheticOffer {
        id: format!("{}-{}-{}", kind.as_str(), merchant.id, index),
        merchant_id: merchant.id,
        merchant_slug: merchant.slug.clone(),
        title: block.heading.clone(),
        description: block.description.clone(),
        redirect_url: block.redirect_url.clone(),
        block_kind: kind,
        block_index: index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use time::macros::datetime;

    use crate::application::pagination::OfferCursor;
    use crate::application::repos::{MerchantFilter, OfferFilter};
    use crate::domain::entities::OfferRecord;
    use crate::domain::types::{CouponKind, MerchantSort, OfferSort};

    fn block(heading: &str) -> ContentBlock {
        ContentBlock {
            heading: heading.to_string(),
            description: format!("{heading} details"),
            redirect_url: None,
        }
    }

    fn merchant_42() -> MerchantRecord {
        MerchantRecord {
            id: 42,
            slug: "acme".to_string(),
            name: "Acme".to_string(),
            category_slug: None,
            affiliate_url: None,
            website_url: None,
            offer_count: 0,
            featured: false,
            locale: "en".to_string(),
            h2_blocks: vec![block("h2-first"), block("h2-second")],
            h3_blocks: vec![block("h3-first"), block("h3-second"), block("h3-third")],
            created_at: datetime!(2026-01-01 00:00 UTC),
        }
    }

    fn canonical_offer() -> OfferRecord {
        OfferRecord {
            id: 7,
            uuid: uuid::Uuid::new_v4(),
            kind: CouponKind::Code,
            title: "10% off".to_string(),
            description: "sitewide".to_string(),
            code: Some("SAVE10".to_string()),
            ends_at: None,
            click_count: 3,
            featured: false,
            locale: "en".to_string(),
            merchant_id: 42,
            merchant_slug: "acme".to_string(),
            created_at: datetime!(2026-01-02 00:00 UTC),
        }
    }

    struct FakeOffers {
        stored: Option<OfferRecord>,
        fail_lookup: bool,
    }

    #[async_trait]
    impl OffersRepo for FakeOffers {
        async fn list_offers(
            &self,
            _: &OfferFilter,
            _: OfferSort,
            _: u64,
            _: u32,
        ) -> Result<Vec<OfferRecord>, RepoError> {
            Ok(Vec::new())
        }

        async fn count_offers(&self, _: &OfferFilter) -> Result<u64, RepoError> {
            Ok(0)
        }

        async fn list_offers_after(
            &self,
            _: &OfferFilter,
            _: Option<OfferCursor>,
            _: u32,
        ) -> Result<Vec<OfferRecord>, RepoError> {
            Ok(Vec::new())
        }

        async fn spotlight_offers(&self, _: u32) -> Result<Vec<OfferRecord>, RepoError> {
            Ok(Vec::new())
        }

        async fn find_canonical(&self, _: CanonicalId) -> Result<Option<OfferRecord>, RepoError> {
            if self.fail_lookup {
                return Err(RepoError::Persistence("offers table unavailable".into()));
            }
            Ok(self.stored.clone())
        }

        async fn increment_clicks(&self, _: i64) -> Result<i64, RepoError> {
            Ok(0)
        }
    }

    struct FakeMerchants {
        merchant: Option<MerchantRecord>,
    }

    #[async_trait]
    impl MerchantsRepo for FakeMerchants {
        async fn list_merchants(
            &self,
            _: &MerchantFilter,
            _: MerchantSort,
            _: u64,
            _: u32,
        ) -> Result<Vec<MerchantRecord>, RepoError> {
            Ok(Vec::new())
        }

        async fn count_merchants(&self, _: &MerchantFilter) -> Result<u64, RepoError> {
            Ok(0)
        }

        async fn spotlight_merchants(&self, _: u32) -> Result<Vec<MerchantRecord>, RepoError> {
            Ok(Vec::new())
        }

        async fn find_by_slug(&self, _: &str) -> Result<Option<MerchantRecord>, RepoError> {
            Ok(self.merchant.clone())
        }

        async fn find_by_id(&self, id: i64) -> Result<Option<MerchantRecord>, RepoError> {
            Ok(self.merchant.clone().filter(|m| m.id == id))
        }
    }

    fn resolver(offers: FakeOffers, merchants: FakeMerchants) -> OfferResolver {
        OfferResolver::new(Arc::new(offers), Arc::new(merchants))
    }

    fn with_merchant() -> OfferResolver {
        resolver(
            FakeOffers {
                stored: None,
                fail_lookup: false,
            },
            FakeMerchants {
                merchant: Some(merchant_42()),
            },
        )
    }

    async fn resolve_synthetic(resolver: &OfferResolver, reference: &str) -> SyntheticOffer {
        match resolver.resolve(reference).await.expect("resolution succeeds") {
            Some(ResolvedOffer::Synthetic(offer)) => offer,
            other => panic!("expected synthetic offer for {reference}, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn canonical_reference_resolves_to_stored_row() {
        let resolver = resolver(
            FakeOffers {
                stored: Some(canonical_offer()),
                fail_lookup: false,
            },
            FakeMerchants { merchant: None },
        );
        let resolved = resolver.resolve("7").await.expect("resolution succeeds");
        assert!(matches!(resolved, Some(ResolvedOffer::Canonical(offer)) if offer.id == 7));
    }

    #[tokio::test]
    async fn trending_position_one_selects_first_h2_block() {
        let offer = resolve_synthetic(&with_merchant(), "trending-42-1").await;
        assert_eq!(offer.title, "h2-first");
        assert_eq!(offer.id, "h2-42-0");
    }

    #[tokio::test]
    async fn trending_position_past_h2_spills_into_h3() {
        let offer = resolve_synthetic(&with_merchant(), "trending-42-3").await;
        assert_eq!(offer.title, "h3-first");
        assert_eq!(offer.id, "h3-42-0");
    }

    #[tokio::test]
    async fn block_reference_indexes_its_own_array() {
        let offer = resolve_synthetic(&with_merchant(), "h3-42-2").await;
        assert_eq!(offer.title, "h3-third");
        assert_eq!(offer.block_kind, BlockKind::H3);
        assert_eq!(offer.block_index, 2);
    }

    #[tokio::test]
    async fn out_of_range_index_is_unresolved() {
        let resolver = with_merchant();
        assert_eq!(resolver.resolve("h3-42-9").await.expect("resolution succeeds"), None);
        assert_eq!(
            resolver.resolve("trending-42-6").await.expect("resolution succeeds"),
            None
        );
        assert_eq!(
            resolver.resolve("trending-42-0").await.expect("resolution succeeds"),
            None
        );
    }

    #[tokio::test]
    async fn digits_fall_through_to_legacy_merchant_reference() {
        // canonical lookup misses, "42" then parses as a legacy merchant ref
        let offer = resolve_synthetic(&with_merchant(), "42").await;
        assert_eq!(offer.title, "h2-first");
    }

    #[tokio::test]
    async fn canonical_lookup_failure_is_a_soft_signal() {
        let resolver = resolver(
            FakeOffers {
                stored: None,
                fail_lookup: true,
            },
            FakeMerchants {
                merchant: Some(merchant_42()),
            },
        );
        let offer = resolve_synthetic(&resolver, "42").await;
        assert_eq!(offer.merchant_id, 42);
    }

    #[tokio::test]
    async fn unknown_merchant_is_unresolved() {
        let resolver = resolver(
            FakeOffers {
                stored: None,
                fail_lookup: false,
            },
            FakeMerchants { merchant: None },
        );
        assert_eq!(
            resolver.resolve("h2-9-0").await.expect("resolution succeeds"),
            None
        );
    }

    #[tokio::test]
    async fn same_reference_resolves_to_same_block() {
        let resolver = with_merchant();
        let first = resolve_synthetic(&resolver, "trending-42-4").await;
        let second = resolve_synthetic(&resolver, "trending-42-4").await;
        assert_eq!(first, second);
        assert_eq!(first.id, "h3-42-1");
    }
}
