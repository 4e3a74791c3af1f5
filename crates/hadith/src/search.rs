use dashmap::DashMap;
use futures_util::future::join_all;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::aliases::{TOPIC_SEARCH_EDITIONS, detect_collection, resolve_collection};
use crate::cache::EditionCache;
use crate::error::{SearchError, SourceError};
use crate::record::HadithResult;
use crate::source::HadithSource;
use crate::text::{fold, leading_number};

pub const DEFAULT_LIMIT: usize = 1000;

#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub collection: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub results: Vec<HadithResult>,
    /// Unique results before the limit was applied
    pub total: usize,
}

pub struct SearchEngine {
    source: Arc<dyn HadithSource>,
    cache: EditionCache,
    /// One fetch per slug at a time; waiters pick the result up from the cache.
    fetch_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl SearchEngine {
    pub fn new(source: Arc<dyn HadithSource>, cache: EditionCache) -> Self {
        Self {
            source,
            cache,
            fetch_locks: DashMap::new(),
        }
    }

    pub fn cache(&self) -> &EditionCache {
        &self.cache
    }

    /// Fetch a whole edition, serving it from the cache while it is fresh.
    pub async fn load_edition(&self, slug: &str) -> Result<Arc<Vec<HadithResult>>, SourceError> {
        if let Some(cached) = self.cache.get(slug) {
            return Ok(cached);
        }

        let lock = self
            .fetch_locks
            .entry(slug.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        if let Some(cached) = self.cache.get(slug) {
            debug!(slug, "Edition fetched by a concurrent request");
            return Ok(cached);
        }

        let outcome = self
            .source
            .fetch_edition(slug)
            .await
            .map(|edition| Arc::new(edition.into_results(slug)));
        if let Ok(results) = &outcome {
            info!(slug, hadiths = results.len(), "Edition fetched and cached");
            self.cache.insert(slug, results.clone());
        }
        self.fetch_locks.remove(slug);
        outcome
    }

    /// Returns `None` when neither a query nor a collection was given.
    pub async fn search(&self, query: &SearchQuery) -> Result<Option<SearchResults>, SearchError> {
        let q = query.q.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let collection = query.collection.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let limit = query.limit.unwrap_or(DEFAULT_LIMIT);

        let found: Vec<HadithResult> = match (collection, q) {
            (None, None) => return Ok(None),
            (Some(collection), q) => {
                let slug = resolve_collection(collection);
                info!(collection, %slug, "Collection request");
                let records = self.load_collection(&slug).await?;
                match q {
                    Some(term) => {
                        let term = fold(term);
                        records.iter().filter(|h| matches_topic(h, &term)).cloned().collect()
                    }
                    None => records.to_vec(),
                }
            }
            (None, Some(q)) => match detect_collection(q) {
                Some(slug) => {
                    info!(query = q, slug, "Detected collection in query");
                    self.load_collection(slug).await?.to_vec()
                }
                None => {
                    info!(query = q, "Topic search");
                    self.topic_search(q).await
                }
            },
        };

        let fetched = found.len();
        let mut results = dedup_and_sort(found);
        let total = results.len();
        results.truncate(limit);
        info!(fetched, unique = total, returned = results.len(), limit, "Search complete");

        Ok(Some(SearchResults { results, total }))
    }

    async fn load_collection(&self, slug: &str) -> Result<Arc<Vec<HadithResult>>, SearchError> {
        self.load_edition(slug)
            .await
            .map_err(|source| SearchError::CollectionUnavailable {
                slug: slug.to_string(),
                source,
            })
    }

    /// Fan out over the canonical editions; a failing edition contributes nothing.
    async fn topic_search(&self, q: &str) -> Vec<HadithResult> {
        let term = fold(q);
        let fetches = TOPIC_SEARCH_EDITIONS
            .iter()
            .map(|slug| async move { (*slug, self.load_edition(slug).await) });

        let mut matches = Vec::new();
        for (slug, outcome) in join_all(fetches).await {
            match outcome {
                Ok(records) => {
                    matches.extend(records.iter().filter(|h| matches_topic(h, &term)).cloned());
                }
                Err(e) => {
                    warn!(slug, error = %e, "Edition unavailable, skipping");
                }
            }
        }
        matches
    }
}

/// `term` must already be folded.
pub fn matches_topic(hadith: &HadithResult, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    fold(&hadith.hadith_arabic).contains(term)
        || hadith
            .hadith_english
            .as_deref()
            .is_some_and(|english| fold(english).contains(term))
        || fold(&hadith.book_name).contains(term)
        || fold(&hadith.chapter_name).contains(term)
}

/// Keep the first record per trimmed text, then order by hadith number.
/// Numbers without leading digits sort as 0; ties keep their original order.
pub fn dedup_and_sort(results: Vec<HadithResult>) -> Vec<HadithResult> {
    let mut seen = HashSet::new();
    let mut unique: Vec<HadithResult> = results
        .into_iter()
        .filter(|h| seen.insert(h.dedup_key().to_string()))
        .collect();
    unique.sort_by_key(|h| leading_number(&h.hadith_number));
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Edition, NumberOrText, RawHadith};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn hadith(number: &str, text: &str) -> HadithResult {
        HadithResult {
            hadith_number: number.to_string(),
            collection: "test".to_string(),
            book_name: String::new(),
            chapter_name: String::new(),
            hadith_arabic: text.to_string(),
            hadith_english: None,
            grade: None,
            narrator: None,
            source: "fawazahmed0".to_string(),
        }
    }

    fn raw(number: u32, text: &str) -> RawHadith {
        RawHadith {
            hadithnumber: Some(NumberOrText::Number(number as f64)),
            text: Some(text.to_string()),
            ..Default::default()
        }
    }

    /// Serves canned editions, counting fetches per slug.
    struct MockSource {
        editions: HashMap<String, Vec<RawHadith>>,
        calls: StdMutex<HashMap<String, usize>>,
        total_calls: AtomicUsize,
        delay: Duration,
    }

    impl MockSource {
        fn new(editions: Vec<(&str, Vec<RawHadith>)>) -> Self {
            Self {
                editions: editions
                    .into_iter()
                    .map(|(slug, hadiths)| (slug.to_string(), hadiths))
                    .collect(),
                calls: StdMutex::new(HashMap::new()),
                total_calls: AtomicUsize::new(0),
                delay: Duration::ZERO,
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn calls_for(&self, slug: &str) -> usize {
            self.calls.lock().unwrap().get(slug).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl HadithSource for MockSource {
        async fn fetch_edition(&self, slug: &str) -> Result<Edition, SourceError> {
            self.total_calls.fetch_add(1, Ordering::SeqCst);
            *self.calls.lock().unwrap().entry(slug.to_string()).or_default() += 1;
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            match self.editions.get(slug) {
                Some(hadiths) => Ok(Edition {
                    hadiths: hadiths.clone(),
                    ..Default::default()
                }),
                None => Err(SourceError::Status(404)),
            }
        }
    }

    fn engine(source: Arc<MockSource>) -> SearchEngine {
        SearchEngine::new(source, EditionCache::new(Duration::from_secs(3600), 64))
    }

    #[test]
    fn test_dedup_by_trimmed_text() {
        let results = dedup_and_sort(vec![
            hadith("1", "إنما الأعمال بالنيات"),
            hadith("2", "  إنما الأعمال بالنيات  "),
            hadith("3", "الدين النصيحة لله ولرسوله"),
        ]);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].hadith_number, "1");
    }

    #[test]
    fn test_sort_numerically() {
        let results = dedup_and_sort(vec![
            hadith("12", "text twelve is here"),
            hadith("1", "text one is here"),
            hadith("7", "text seven is here"),
        ]);
        let numbers: Vec<_> = results.iter().map(|h| h.hadith_number.as_str()).collect();
        assert_eq!(numbers, vec!["1", "7", "12"]);
    }

    #[test]
    fn test_non_numeric_sorts_as_zero() {
        let results = dedup_and_sort(vec![
            hadith("3", "text three is here"),
            hadith("", "text empty is here"),
            hadith("abc", "text letters is here"),
        ]);
        let numbers: Vec<_> = results.iter().map(|h| h.hadith_number.as_str()).collect();
        assert_eq!(numbers, vec!["", "abc", "3"]);
    }

    #[test]
    fn test_matches_topic_ignores_diacritics() {
        let mut h = hadith("1", "إِنَّمَا الأَعْمَالُ بِالنِّيَّاتِ");
        h.chapter_name = "Revelation".to_string();

        assert!(matches_topic(&h, &fold("الأعمال")));
        assert!(matches_topic(&h, &fold("revelation")));
        assert!(!matches_topic(&h, &fold("الصيام")));
    }

    #[tokio::test]
    async fn test_empty_query_returns_none() {
        let engine = engine(Arc::new(MockSource::new(vec![])));
        let outcome = engine
            .search(&SearchQuery {
                q: Some("   ".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn test_collection_is_cached() {
        let source = Arc::new(MockSource::new(vec![(
            "ara-bukhari",
            vec![raw(2, "الحديث الثاني في الصحيح"), raw(1, "الحديث الأول في الصحيح")],
        )]));
        let engine = engine(source.clone());
        let query = SearchQuery {
            collection: Some("bukhari".to_string()),
            ..Default::default()
        };

        let first = engine.search(&query).await.unwrap().unwrap();
        let second = engine.search(&query).await.unwrap().unwrap();

        assert_eq!(first.total, 2);
        assert_eq!(first.results[0].hadith_number, "1");
        assert_eq!(second.total, 2);
        assert_eq!(source.calls_for("ara-bukhari"), 1);
    }

    #[tokio::test]
    async fn test_limit_truncates_but_total_counts_all() {
        let source = Arc::new(MockSource::new(vec![(
            "ara-muslim",
            (1..=5).map(|n| raw(n, &format!("نص الحديث رقم {n} في الكتاب"))).collect(),
        )]));
        let engine = engine(source);
        let outcome = engine
            .search(&SearchQuery {
                collection: Some("muslim".to_string()),
                limit: Some(2),
                ..Default::default()
            })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(outcome.total, 5);
        assert_eq!(outcome.results.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_collection_is_an_error() {
        let engine = engine(Arc::new(MockSource::new(vec![])));
        let err = engine
            .search(&SearchQuery {
                collection: Some("unknown-edition".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.upstream_status(), Some(404));
    }

    #[tokio::test]
    async fn test_topic_search_skips_failing_editions() {
        // Only two of the seven editions exist; the rest fail with 404
        let source = Arc::new(MockSource::new(vec![
            ("ara-bukhari", vec![raw(5, "من صام رمضان إيمانا واحتسابا")]),
            ("ara-muslim", vec![
                raw(3, "من صام رمضان إيمانا واحتسابا"),
                raw(9, "الطهور شطر الإيمان والحمد لله"),
            ]),
        ]));
        let engine = engine(source.clone());
        let outcome = engine
            .search(&SearchQuery {
                q: Some("رمضان".to_string()),
                ..Default::default()
            })
            .await
            .unwrap()
            .unwrap();

        // Same text in two editions collapses to one
        assert_eq!(outcome.total, 1);
        assert_eq!(outcome.results[0].hadith_number, "5");
        assert_eq!(source.total_calls.load(Ordering::SeqCst), TOPIC_SEARCH_EDITIONS.len());
    }

    #[tokio::test]
    async fn test_query_naming_collection_returns_whole_collection() {
        let source = Arc::new(MockSource::new(vec![(
            "ara-tirmidhi",
            vec![raw(1, "الحديث الأول من سنن الترمذي"), raw(2, "الحديث الثاني من سنن الترمذي")],
        )]));
        let engine = engine(source);
        let outcome = engine
            .search(&SearchQuery {
                q: Some("Tirmidhi".to_string()),
                ..Default::default()
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(outcome.total, 2);
    }

    #[tokio::test]
    async fn test_collection_with_query_filters_records() {
        let source = Arc::new(MockSource::new(vec![(
            "ara-bukhari",
            vec![
                raw(3, "من صام رمضان إيمانا واحتسابا غفر له"),
                raw(1, "إنما الأعمال بالنيات وإنما لكل امرئ ما نوى"),
                raw(2, "من قام رمضان إيمانا واحتسابا غفر له"),
            ],
        )]));
        let engine = engine(source);
        let outcome = engine
            .search(&SearchQuery {
                q: Some("رمضان".to_string()),
                collection: Some("bukhari".to_string()),
                ..Default::default()
            })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(outcome.total, 2);
        let numbers: Vec<_> = outcome.results.iter().map(|h| h.hadith_number.as_str()).collect();
        assert_eq!(numbers, vec!["2", "3"]);
    }

    #[tokio::test]
    async fn test_topic_word_containing_alias_is_a_topic_search() {
        let source = Arc::new(MockSource::new(vec![(
            "ara-muslim",
            vec![
                raw(1, "المسلم من سلم المسلمون من لسانه ويده"),
                raw(2, "الطهور شطر الإيمان والحمد لله"),
            ],
        )]));
        let engine = engine(source.clone());
        let outcome = engine
            .search(&SearchQuery {
                q: Some("المسلمون".to_string()),
                ..Default::default()
            })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(outcome.total, 1);
        assert_eq!(outcome.results[0].hadith_number, "1");
        assert_eq!(source.total_calls.load(Ordering::SeqCst), TOPIC_SEARCH_EDITIONS.len());
    }

    #[tokio::test]
    async fn test_concurrent_misses_fetch_once() {
        let source = Arc::new(
            MockSource::new(vec![("ara-bukhari", vec![raw(1, "الحديث الأول في الصحيح")])])
                .with_delay(Duration::from_millis(50)),
        );
        let engine = engine(source.clone());

        let loads = (0..5).map(|_| engine.load_edition("ara-bukhari"));
        for outcome in join_all(loads).await {
            assert_eq!(outcome.unwrap().len(), 1);
        }
        assert_eq!(source.calls_for("ara-bukhari"), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let source = Arc::new(MockSource::new(vec![]));
        let engine = engine(source.clone());

        assert!(engine.load_edition("ara-malik").await.is_err());
        assert!(engine.load_edition("ara-malik").await.is_err());
        assert_eq!(source.calls_for("ara-malik"), 2);
    }
}
