//! Performance improvement recommendations

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::metrics::{names, Category};

/// Category score below which a recommendation is emitted
pub const RECOMMENDATION_THRESHOLD: f64 = 70.0;

/// Rendering score below which the recommendation is critical
pub const RENDERING_CRITICAL_THRESHOLD: f64 = 50.0;

/// Memory score below which the recommendation is critical
pub const MEMORY_CRITICAL_THRESHOLD: f64 = 40.0;

/// Recommendation priority. Declaration order is sort order (critical first).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

/// Implementation effort
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Easy,
    Medium,
    Hard,
}

/// Performance improvement recommendation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub priority: Priority,
    pub category: Category,
    /// Recommendation title
    pub title: String,
    /// Detailed description
    pub description: String,
    /// Expected improvement (0-100)
    pub estimated_impact: f64,
    pub implementation_complexity: Complexity,
    /// Implementation steps, in order
    pub steps: Vec<String>,
    pub related_metrics: Vec<String>,
}

/// Recommendation engine trait
pub trait RecommendationEngine: Send + Sync {
    /// Generates recommendations from per-category scores
    fn generate_recommendations(&self, category_scores: &BTreeMap<Category, f64>) -> Vec<Recommendation>;

    /// Sorts by priority (critical first), then estimated impact descending,
    /// dropping repeated titles
    fn prioritize_recommendations(&self, recommendations: &[Recommendation]) -> Vec<Recommendation> {
        let mut seen = HashSet::new();
        let mut sorted: Vec<Recommendation> = recommendations
            .iter()
            .filter(|r| seen.insert(r.title.clone()))
            .cloned()
            .collect();

        sorted.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| b.estimated_impact.total_cmp(&a.estimated_impact))
        });
        sorted
    }
}

/// Default recommendation engine implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRecommendationEngine;

impl DefaultRecommendationEngine {
    /// Creates a new default recommendation engine
    pub fn new() -> Self {
        Self
    }

    fn recommend(&self, category: Category, score: f64) -> Option<Recommendation> {
        if score >= RECOMMENDATION_THRESHOLD {
            return None;
        }

        let recommendation = match category {
            Category::Rendering => Recommendation {
                priority: if score < RENDERING_CRITICAL_THRESHOLD {
                    Priority::Critical
                } else {
                    Priority::High
                },
                category,
                title: "Improve rendering performance".to_string(),
                description: format!(
                    "Rendering score is {:.0}. Frames are being dropped during normal use.",
                    score
                ),
                estimated_impact: 40.0,
                implementation_complexity: Complexity::Medium,
                steps: steps(&[
                    "Profile slow screens to find components that re-render on every frame",
                    "Memoize expensive components and stabilize their props",
                    "Virtualize long lists instead of rendering every row",
                    "Move heavy computation off the UI thread",
                    "Verify frame rate stays above 55 fps after the changes",
                ]),
                related_metrics: vec![names::FPS.to_string()],
            },
            Category::Memory => Recommendation {
                priority: if score < MEMORY_CRITICAL_THRESHOLD {
                    Priority::Critical
                } else {
                    Priority::High
                },
                category,
                title: "Reduce memory usage".to_string(),
                description: format!(
                    "Memory score is {:.0}. The application is close to its memory budget.",
                    score
                ),
                estimated_impact: 35.0,
                implementation_complexity: Complexity::Hard,
                steps: steps(&[
                    "Take heap snapshots before and after navigating between screens",
                    "Release images and large buffers when screens unmount",
                    "Cap in-memory caches with size-based eviction",
                    "Remove listeners and subscriptions that outlive their owners",
                    "Monitor usage_percentage for regressions",
                ]),
                related_metrics: vec![names::MEMORY_USAGE.to_string()],
            },
            Category::Network => Recommendation {
                priority: Priority::High,
                category,
                title: "Reduce network latency".to_string(),
                description: format!(
                    "Network score is {:.0}. Requests are slow enough to stall the interface.",
                    score
                ),
                estimated_impact: 30.0,
                implementation_complexity: Complexity::Medium,
                steps: steps(&[
                    "Identify the slowest endpoints from latency samples",
                    "Cache responses that rarely change",
                    "Shrink payloads with pagination and field selection",
                    "Batch or deduplicate concurrent requests",
                    "Show optimistic UI while requests are in flight",
                ]),
                related_metrics: vec![names::LATENCY.to_string()],
            },
            Category::Bundle => Recommendation {
                priority: Priority::Medium,
                category,
                title: "Optimize bundle size".to_string(),
                description: format!(
                    "Bundle score is {:.0}. Startup and screen loads take longer than needed.",
                    score
                ),
                estimated_impact: 25.0,
                implementation_complexity: Complexity::Easy,
                steps: steps(&[
                    "Analyze the bundle to find the largest modules",
                    "Lazy-load screens that are not needed at startup",
                    "Remove unused dependencies and dead code",
                    "Compress and resize bundled assets",
                ]),
                related_metrics: vec![names::LOAD_TIME.to_string()],
            },
            Category::UserInteraction | Category::Custom => return None,
        };

        Some(recommendation)
    }
}

fn steps(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl RecommendationEngine for DefaultRecommendationEngine {
    fn generate_recommendations(&self, category_scores: &BTreeMap<Category, f64>) -> Vec<Recommendation> {
        let recommendations: Vec<Recommendation> = category_scores
            .iter()
            .filter_map(|(category, score)| self.recommend(*category, *score))
            .collect();

        self.prioritize_recommendations(&recommendations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(entries: &[(Category, f64)]) -> BTreeMap<Category, f64> {
        entries.iter().copied().collect()
    }

    #[test]
    fn test_healthy_scores_yield_nothing() {
        let engine = DefaultRecommendationEngine::new();
        let recs = engine.generate_recommendations(&scores(&[
            (Category::Rendering, 95.0),
            (Category::Memory, 70.0),
            (Category::Network, 88.0),
        ]));
        assert!(recs.is_empty());
    }

    #[test]
    fn test_critical_rendering_before_high_memory() {
        let engine = DefaultRecommendationEngine::new();
        let recs = engine.generate_recommendations(&scores(&[
            (Category::Memory, 65.0),
            (Category::Rendering, 45.0),
        ]));

        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].category, Category::Rendering);
        assert_eq!(recs[0].priority, Priority::Critical);
        assert_eq!(recs[1].category, Category::Memory);
        assert_eq!(recs[1].priority, Priority::High);
    }

    #[test]
    fn test_inner_thresholds() {
        let engine = DefaultRecommendationEngine::new();

        let rendering = engine.generate_recommendations(&scores(&[(Category::Rendering, 50.0)]));
        assert_eq!(rendering[0].priority, Priority::High);

        let memory = engine.generate_recommendations(&scores(&[(Category::Memory, 39.0)]));
        assert_eq!(memory[0].priority, Priority::Critical);

        let network = engine.generate_recommendations(&scores(&[(Category::Network, 5.0)]));
        assert_eq!(network[0].priority, Priority::High);

        let bundle = engine.generate_recommendations(&scores(&[(Category::Bundle, 10.0)]));
        assert_eq!(bundle[0].priority, Priority::Medium);
        assert_eq!(bundle[0].implementation_complexity, Complexity::Easy);
    }

    #[test]
    fn test_ties_broken_by_impact() {
        let engine = DefaultRecommendationEngine::new();
        let recs = engine.generate_recommendations(&scores(&[
            (Category::Network, 60.0),
            (Category::Memory, 60.0),
            (Category::Rendering, 60.0),
        ]));

        let order: Vec<Category> = recs.iter().map(|r| r.category).collect();
        assert_eq!(
            order,
            vec![Category::Rendering, Category::Memory, Category::Network]
        );
        assert!(recs.iter().all(|r| r.priority == Priority::High));
    }

    #[test]
    fn test_unsupported_categories_are_skipped() {
        let engine = DefaultRecommendationEngine::new();
        let recs = engine.generate_recommendations(&scores(&[
            (Category::UserInteraction, 10.0),
            (Category::Custom, 10.0),
        ]));
        assert!(recs.is_empty());
    }

    #[test]
    fn test_prioritize_drops_duplicates() {
        let engine = DefaultRecommendationEngine::new();
        let recs = engine.generate_recommendations(&scores(&[(Category::Network, 20.0)]));
        let doubled = [recs.clone(), recs].concat();

        assert_eq!(engine.prioritize_recommendations(&doubled).len(), 1);
    }

    #[test]
    fn test_steps_are_ordered() {
        let engine = DefaultRecommendationEngine::new();
        let recs = engine.generate_recommendations(&scores(&[(Category::Rendering, 30.0)]));
        assert!(recs[0].steps[0].starts_with("Profile"));
        assert_eq!(recs[0].related_metrics, vec!["fps".to_string()]);
    }
}
