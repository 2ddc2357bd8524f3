//! Shared domain enumerations aligned with persisted database enums.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "coupon_kind", rename_all = "snake_case")]
pub enum CouponKind {
    Code,
    Deal,
    FreeShipping,
}

impl CouponKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CouponKind::Code => "code",
            CouponKind::Deal => "deal",
            CouponKind::FreeShipping => "free_shipping",
        }
    }
}

/// Validity filter evaluated against an offer's `ends_at` timestamp.
///
/// `Active` keeps offers with no expiry or an expiry still in the future;
/// `Expired` keeps offers whose expiry has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatusFilter {
    Active,
    Expired,
}

impl OfferStatusFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            OfferStatusFilter::Active => "active",
            OfferStatusFilter::Expired => "expired",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferSort {
    #[default]
    Newest,
    EndingSoon,
    Popular,
    Featured,
}

impl OfferSort {
    pub fn as_str(self) -> &'static str {
        match self {
            OfferSort::Newest => "newest",
            OfferSort::EndingSoon => "ending_soon",
            OfferSort::Popular => "popular",
            OfferSort::Featured => "featured",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MerchantSort {
    #[default]
    Newest,
    Name,
    Popular,
}

impl MerchantSort {
    pub fn as_str(self) -> &'static str {
        match self {
            MerchantSort::Newest => "newest",
            MerchantSort::Name => "name",
            MerchantSort::Popular => "popular",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleSort {
    #[default]
    Newest,
    Title,
}

impl ArticleSort {
    pub fn as_str(self) -> &'static str {
        match self {
            ArticleSort::Newest => "newest",
            ArticleSort::Title => "title",
        }
    }
}

/// Which embedded merchant block array a synthetic offer was cut from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    H2,
    H3,
}

impl BlockKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BlockKind::H2 => "h2",
            BlockKind::H3 => "h3",
        }
    }
}
