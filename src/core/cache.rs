//! Bounded memo of ranking results keyed by a profile fingerprint.

use crate::core::ranking::{Ranking, RankingConfig};
use crate::domain::model::StudentProfile;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::{Arc, Mutex};

pub const DEFAULT_CACHE_SIZE: usize = 128;

/// Profile reduced to the fields ranking reads, with lists lowercased,
/// trimmed, deduplicated and sorted so equivalent profiles hash alike.
#[derive(Debug, Serialize)]
struct NormalizedProfile {
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    interests: BTreeSet<String>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    avoid: BTreeSet<String>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    goals: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    workload: Option<&'static str>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    exam_types: BTreeSet<String>,
    // course codes are case-sensitive
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    liked: BTreeSet<String>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    disliked: BTreeSet<String>,
}

fn folded(items: &[String]) -> BTreeSet<String> {
    items
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn codes(items: &[String]) -> BTreeSet<String> {
    items
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl NormalizedProfile {
    fn of(profile: &StudentProfile) -> Self {
        Self {
            interests: folded(&profile.interests),
            avoid: folded(&profile.avoid),
            goals: folded(&profile.goals),
            language: profile.language(),
            workload: profile.workload().map(|w| w.as_str()),
            exam_types: folded(&profile.preferred_exam_types),
            liked: codes(&profile.liked_courses),
            disliked: codes(&profile.disliked_courses),
        }
    }
}

#[derive(Serialize)]
struct KeyMaterial<'a> {
    profile: NormalizedProfile,
    config: &'a RankingConfig,
    top_k: usize,
    generation: u64,
}

/// Hex SHA-256 over the normalised profile, ranking parameters, result
/// size and engine generation.
pub fn cache_key(
    profile: &StudentProfile,
    config: &RankingConfig,
    top_k: usize,
    generation: u64,
) -> String {
    let material = KeyMaterial {
        profile: NormalizedProfile::of(profile),
        config,
        top_k,
        generation,
    };
    // serialising plain structs of strings and numbers cannot fail
    let bytes = serde_json::to_vec(&material).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<String, Arc<Ranking>>,
    order: VecDeque<String>,
}

/// First-in first-out eviction once `capacity` entries are held.
/// A capacity of zero disables caching.
#[derive(Debug)]
pub struct RankingCache {
    capacity: usize,
    inner: Mutex<CacheInner>,
}

impl RankingCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(CacheInner::default()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.capacity > 0
    }

    pub fn get(&self, key: &str) -> Option<Arc<Ranking>> {
        if !self.is_enabled() {
            return None;
        }
        let inner = self.inner.lock().ok()?;
        inner.entries.get(key).cloned()
    }

    pub fn insert(&self, key: String, ranking: Arc<Ranking>) {
        if !self.is_enabled() {
            return;
        }
        let Ok(mut inner) = self.inner.lock() else {
            tracing::warn!("Ranking cache lock poisoned, skipping insert");
            return;
        };
        if inner.entries.contains_key(&key) {
            inner.entries.insert(key, ranking);
            return;
        }
        while inner.order.len() >= self.capacity {
            match inner.order.pop_front() {
                Some(oldest) => {
                    inner.entries.remove(&oldest);
                }
                None => break,
            }
        }
        inner.order.push_back(key.clone());
        inner.entries.insert(key, ranking);
    }

    pub fn clear(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.entries.clear();
            inner.order.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|i| i.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RankingCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_SIZE)
    }
}
