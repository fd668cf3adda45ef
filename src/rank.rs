//! Free-text relevance ranking.
//!
//! Retrieval pulls a bounded candidate pool through the store's substring
//! predicates (AND over query tokens, OR over the searchable fields), then
//! scoring re-ranks that pool with a lexical similarity the store cannot
//! express natively.

use tracing::debug;

use crate::error::QueryError;
use crate::models::Address;
use crate::query::predicate::{Field, Predicate, SEARCH_FIELDS};
use crate::store::{AddressStore, Order, QueryOp, StoreQuery};

/// When the top score reaches the cutoff, only candidates within the band
/// below it survive.
const CLOSE_MATCH_CUTOFF: f64 = 0.75;
const CLOSE_MATCH_FLOOR: f64 = 0.70;
const CLOSE_MATCH_BAND: f64 = 0.08;
/// Flat bonus when a field value starts with the full query string.
const PREFIX_BOOST: f64 = 0.15;
/// Floor on the candidate pool size.
const MIN_POOL: usize = 100;

/// Weight applied to a field's individual similarity.
fn field_weight(field: Field) -> f64 {
    match field {
        Field::Street => 1.0,
        Field::City => 0.9,
        Field::Postcode => 0.8,
        Field::Number => 0.5,
        _ => 0.0,
    }
}

/// Lowercase alphanumeric tokens, split on any non-alphanumeric run.
/// Empty tokens are discarded.
pub fn tokenize(query: &str) -> Vec<String> {
    query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Sørensen–Dice similarity over character bigrams.
///
/// Symmetric, in `[0, 1]`, exactly 1.0 for identical strings; 0.0 when the
/// strings differ and either side is shorter than two characters. Inputs are
/// lowercased before comparison.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    if a == b {
        return 1.0;
    }

    let a_grams = bigrams(&a);
    let mut b_grams = bigrams(&b);
    if a_grams.is_empty() || b_grams.is_empty() {
        return 0.0;
    }

    let total = a_grams.len() + b_grams.len();
    let mut shared = 0usize;
    for gram in &a_grams {
        if let Some(pos) = b_grams.iter().position(|g| g == gram) {
            b_grams.swap_remove(pos);
            shared += 1;
        }
    }

    (2.0 * shared as f64) / total as f64
}

fn bigrams(s: &str) -> Vec<[char; 2]> {
    let chars: Vec<char> = s.chars().collect();
    chars.windows(2).map(|w| [w[0], w[1]]).collect()
}

/// Score one candidate against the full lowercased query.
///
/// The score is the best of the concatenated-fields similarity and the
/// weighted per-field similarities, plus a capped prefix bonus.
pub fn score_candidate(query: &str, address: &Address) -> f64 {
    let p = &address.properties;
    let concatenated = format!("{} {} {} {}", p.street, p.number, p.postcode, p.city);
    let mut score = similarity(query, &concatenated);

    let mut prefix_hit = false;
    for field in SEARCH_FIELDS {
        let value = field.value_of(p).to_lowercase();
        if value.is_empty() {
            continue;
        }
        score = score.max(field_weight(field) * similarity(query, &value));
        if value.starts_with(query) {
            prefix_hit = true;
        }
    }

    if prefix_hit {
        score = (score + PREFIX_BOOST).min(1.0);
    }
    score
}

/// Retrieve, score, and rank addresses for a free-text query.
///
/// Returns at most `limit` records, best match first. An empty or
/// whitespace-only query returns empty without touching the store.
pub async fn search_ranked<S: AddressStore>(
    store: &S,
    query: &str,
    limit: usize,
) -> Result<Vec<Address>, QueryError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let tokens = tokenize(trimmed);
    if tokens.is_empty() {
        return Ok(Vec::new());
    }

    // Every token must appear in at least one searchable field.
    let per_token: Vec<Predicate> = tokens
        .iter()
        .map(|token| {
            Predicate::Or(
                SEARCH_FIELDS
                    .iter()
                    .map(|&field| Predicate::Substring {
                        field,
                        needle: token.clone(),
                    })
                    .collect(),
            )
        })
        .collect();

    let pool_size = (2 * limit).max(MIN_POOL);
    let candidates = store
        .fetch(
            QueryOp::Search,
            &StoreQuery {
                predicate: Predicate::and(per_token),
                order: Order::RecordKeyAsc,
                limit: Some(pool_size),
            },
        )
        .await?;
    debug!(
        "free-text {:?}: {} candidates in pool",
        trimmed,
        candidates.len()
    );

    let needle = trimmed.to_lowercase();
    let mut scored: Vec<(f64, Address)> = candidates
        .into_iter()
        .map(|address| (score_candidate(&needle, &address), address))
        .collect();
    // Stable sort: ties keep retrieval order.
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    let best = scored.first().map(|(score, _)| *score).unwrap_or(0.0);
    if best >= CLOSE_MATCH_CUTOFF {
        let floor = CLOSE_MATCH_FLOOR.max(best - CLOSE_MATCH_BAND);
        scored.retain(|(score, _)| *score >= floor);
    }

    scored.truncate(limit);
    Ok(scored.into_iter().map(|(_, address)| address).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn tokenizer_splits_on_non_alphanumeric_runs() {
        assert_eq!(tokenize("Dam-square, 12"), vec!["dam", "square", "12"]);
        assert_eq!(tokenize("  \t..!  "), Vec::<String>::new());
        assert_eq!(tokenize("Wijkstraat"), vec!["wijkstraat"]);
    }

    #[test]
    fn similarity_bounds_and_symmetry() {
        assert_eq!(similarity("appingedam", "appingedam"), 1.0);
        assert_eq!(similarity("Appingedam", "appingedam"), 1.0);
        assert_eq!(similarity("abcd", "wxyz"), 0.0);
        assert_eq!(similarity("a", "b"), 0.0);

        let ab = similarity("wijkstraat", "wijkstraet");
        let ba = similarity("wijkstraet", "wijkstraat");
        assert_eq!(ab, ba);
        assert!(ab > 0.0 && ab < 1.0);
    }

    #[test]
    fn exact_street_match_outscores_unrelated() {
        let exact = Address::new("a", "h1", 0.0, 0.0).with_street("Wijkstraat");
        let unrelated = Address::new("b", "h2", 0.0, 0.0)
            .with_street("Coolsingel")
            .with_city("Rotterdam");

        let hit = score_candidate("wijkstraat", &exact);
        let miss = score_candidate("wijkstraat", &unrelated);
        assert!(hit >= miss);
        assert_eq!(hit, 1.0);
        assert!(miss < 0.2);
    }

    #[test]
    fn prefix_boost_is_capped_at_one() {
        let address = Address::new("a", "h", 0.0, 0.0).with_city("Appingedam");
        let score = score_candidate("appingedam", &address);
        assert_eq!(score, 1.0);

        let prefix_only = Address::new("b", "h2", 0.0, 0.0).with_city("Appingedamsterweg");
        let boosted = score_candidate("appingedam", &prefix_only);
        assert!(boosted > score_candidate_no_boost_reference(&prefix_only));
        assert!(boosted <= 1.0);
    }

    fn score_candidate_no_boost_reference(address: &Address) -> f64 {
        0.9 * similarity("appingedam", &address.properties.city)
    }

    #[tokio::test]
    async fn empty_query_returns_empty_without_fetching() {
        // A store that fails loudly if touched.
        struct Untouchable;

        #[async_trait::async_trait]
        impl AddressStore for Untouchable {
            async fn fetch(
                &self,
                _op: QueryOp,
                _query: &StoreQuery,
            ) -> Result<Vec<Address>, crate::store::StoreError> {
                panic!("store must not be queried for an empty query");
            }
        }

        assert!(search_ranked(&Untouchable, "", 10).await.unwrap().is_empty());
        assert!(search_ranked(&Untouchable, "   \t", 10).await.unwrap().is_empty());
        assert!(search_ranked(&Untouchable, "..,,--", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn appingedam_query_ranks_the_city_match_first() {
        let mut store = MemoryStore::new();
        store.insert(
            Address::new("a/1", "h1", 6.8581, 53.3217)
                .with_street("Wijkstraat")
                .with_number("36")
                .with_postcode("9901AJ")
                .with_city("Appingedam"),
        );
        store.insert(
            Address::new("a/2", "h2", 4.4777, 51.9244)
                .with_street("Coolsingel")
                .with_city("Rotterdam"),
        );

        let results = search_ranked(&store, "Appingedam", 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "a/1");

        let score = score_candidate("appingedam", &results[0]);
        assert!(score >= CLOSE_MATCH_CUTOFF);
    }

    #[tokio::test]
    async fn close_match_band_drops_weak_candidates() {
        let mut store = MemoryStore::new();
        store.insert(Address::new("strong", "h1", 0.0, 0.0).with_street("Kerkstraat"));
        // Shares the "kerk" substring so it lands in the pool, but scores far
        // below the band around the top match.
        store.insert(
            Address::new("weak", "h2", 0.0, 0.0).with_street("Achterkerkstraatweg Noordzijde"),
        );

        let results = search_ranked(&store, "Kerkstraat", 10).await.unwrap();
        assert_eq!(results[0].id, "strong");
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn results_are_truncated_to_limit() {
        let mut store = MemoryStore::new();
        for i in 0..8 {
            store.insert(Address::new(format!("a/{i}"), format!("h{i}"), 0.0, 0.0)
                .with_street("Dorpsstraat"));
        }
        let results = search_ranked(&store, "Dorpsstraat", 3).await.unwrap();
        assert_eq!(results.len(), 3);
        // Stable ties: retrieval (record key) order preserved.
        assert_eq!(results[0].id, "a/0");
        assert_eq!(results[2].id, "a/2");
    }

    #[tokio::test]
    async fn all_tokens_must_match_for_retrieval() {
        let mut store = MemoryStore::new();
        store.insert(
            Address::new("both", "h1", 0.0, 0.0)
                .with_street("Wijkstraat")
                .with_city("Appingedam"),
        );
        store.insert(Address::new("one", "h2", 0.0, 0.0).with_street("Wijkstraat"));

        let results = search_ranked(&store, "Wijkstraat Appingedam", 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "both");
    }
}
