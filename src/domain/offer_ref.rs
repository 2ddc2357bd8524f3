//! Offer reference grammar.
//!
//! An inbound offer reference is either a canonical identifier (all digits or
//! a UUID) naming a stored offer row, or a composite identifier naming a
//! block embedded in a merchant row. Composite grammars are tried in a fixed
//! order; the first match wins.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use uuid::Uuid;

use crate::domain::types::BlockKind;

/// A reference with a canonical shape, resolvable against the offers table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanonicalId {
    Numeric(i64),
    Uuid(Uuid),
}

/// Parsed composite reference into merchant-embedded content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferRef {
    /// `trending-<merchant>-<position>`, position 1-based across the
    /// merchant's h2 blocks followed by its h3 blocks.
    Trending { merchant_id: i64, position: usize },
    /// `h2-<merchant>-<index>` / `h3-<merchant>-<index>`, index 0-based into
    /// the named array.
    Block {
        kind: BlockKind,
        merchant_id: i64,
        index: usize,
    },
    /// `merchant-<id>`, `<id>-h2-<index>`, `merchant:<id>:h3:<index>` and the
    /// other separator spellings older clients still send.
    Legacy {
        merchant_id: i64,
        block: Option<(BlockKind, usize)>,
    },
}

fn block_kind(digit: &str) -> Option<BlockKind> {
    match digit {
        "2" => Some(BlockKind::H2),
        "3" => Some(BlockKind::H3),
        _ => None,
    }
}

fn build_trending(caps: &Captures<'_>) -> Option<OfferRef> {
    Some(OfferRef::Trending {
        merchant_id: caps[1].parse().ok()?,
        position: caps[2].parse().ok()?,
    })
}

fn build_block(caps: &Captures<'_>) -> Option<OfferRef> {
    Some(OfferRef::Block {
        kind: block_kind(&caps[1])?,
        merchant_id: caps[2].parse().ok()?,
        index: caps[3].parse().ok()?,
    })
}

fn build_legacy(caps: &Captures<'_>) -> Option<OfferRef> {
    let merchant_id = caps[1].parse().ok()?;
    let block = match (caps.get(2), caps.get(3)) {
        (Some(kind), Some(index)) => Some((
            block_kind(kind.as_str())?,
            index.as_str().parse().ok()?,
        )),
        _ => None,
    };
    Some(OfferRef::Legacy { merchant_id, block })
}

type BuildRef = fn(&Captures<'_>) -> Option<OfferRef>;

static COMPOSITE_GRAMMARS: Lazy<Vec<(Regex, BuildRef)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"^trending-(\d+)-(\d+)$").expect("trending grammar compiles"),
            build_trending as BuildRef,
        ),
        (
            Regex::new(r"^h([23])-(\d+)-(\d+)$").expect("block grammar compiles"),
            build_block as BuildRef,
        ),
        (
            Regex::new(r"^(?:merchant[:-])?(\d+)(?:[:-]h([23])[:-]?(\d+))?$")
                .expect("legacy grammar compiles"),
            build_legacy as BuildRef,
        ),
    ]
});

impl CanonicalId {
    /// Parse a reference with canonical shape. Digits win over UUID parsing
    /// since a decimal string is never a valid UUID.
    pub fn parse(input: &str) -> Option<Self> {
        if !input.is_empty() && input.bytes().all(|b| b.is_ascii_digit()) {
            return input.parse().ok().map(CanonicalId::Numeric);
        }
        Uuid::parse_str(input).ok().map(CanonicalId::Uuid)
    }
}

impl OfferRef {
    /// Match `input` against the composite grammars in declaration order.
    pub fn parse_composite(input: &str) -> Option<Self> {
        COMPOSITE_GRAMMARS
            .iter()
            .find_map(|(grammar, build)| grammar.captures(input).and_then(|caps| build(&caps)))
    }
}
