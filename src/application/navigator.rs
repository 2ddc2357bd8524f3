//! Prev/next/canonical link derivation for offset-paginated listings.

use url::Url;

/// Navigation links for one offset-paginated page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLinks {
    pub canonical: String,
    pub prev: Option<String>,
    pub next: Option<String>,
    pub total_pages: u32,
}

/// Builds page links from an offset/limit/total triple.
///
/// Links are site-relative by default, prefixed with the canonical origin when
/// one is configured, and rewritten onto the external API base (path and query
/// preserved) when that is configured. The `page` parameter is serialized only
/// past page one and `limit` only when it differs from the configured default,
/// so page one of a default-sized listing canonicalizes to the bare path.
#[derive(Debug, Clone)]
pub struct Navigator {
    default_limit: u32,
    api_base: Option<Url>,
    canonical_origin: Option<Url>,
}

impl Navigator {
    pub fn new(default_limit: u32, api_base: Option<Url>, canonical_origin: Option<Url>) -> Self {
        Self {
            default_limit,
            api_base,
            canonical_origin,
        }
    }

    pub fn default_limit(&self) -> u32 {
        self.default_limit
    }

    /// Derive links for the page at `page` of `total` rows, `limit` per page.
    ///
    /// `extra` carries the listing's filter parameters in the order they
    /// should serialize; identical inputs always produce identical links.
    pub fn links(
        &self,
        base_path: &str,
        page: u32,
        limit: u32,
        total: u64,
        extra: &[(&str, String)],
    ) -> PageLinks {
        let limit = limit.max(1);
        let total_pages = u32::try_from(total.div_ceil(u64::from(limit)))
            .unwrap_or(u32::MAX)
            .max(1);
        let page = page.max(1);

        let prev = (page > 1).then(|| self.href(base_path, extra, page - 1, limit));
        let next = (page < total_pages).then(|| self.href(base_path, extra, page + 1, limit));

        PageLinks {
            canonical: self.href(base_path, extra, page, limit),
            prev,
            next,
            total_pages,
        }
    }

    fn href(&self, base_path: &str, extra: &[(&str, String)], page: u32, limit: u32) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        let mut has_pairs = false;
        for (name, value) in extra {
            if !value.is_empty() {
                query.append_pair(name, value);
                has_pairs = true;
            }
        }
        if page > 1 {
            query.append_pair("page", &page.to_string());
            has_pairs = true;
        }
        if limit != self.default_limit {
            query.append_pair("limit", &limit.to_string());
            has_pairs = true;
        }
        let query = query.finish();
        let query = has_pairs.then_some(query.as_str());

        match self.api_base.as_ref().or(self.canonical_origin.as_ref()) {
            Some(base) => {
                let mut target = base.clone();
                let mut path = base.path().trim_end_matches('/').to_string();
                path.push_str(base_path);
                target.set_path(&path);
                target.set_query(query);
                target.to_string()
            }
            None => match query {
                Some(query) => format!("{base_path}?{query}"),
                None => base_path.to_string(),
            },
        }
    }
}
