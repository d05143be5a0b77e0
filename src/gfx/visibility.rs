//! Search, category and comparison filtering.
//!
//! Hidden points are parked at a sentinel coordinate in the display
//! position buffer instead of being removed, so buffer indices always match
//! point indices. Picking consults the [`VisibleSet`] rather than geometry,
//! which keeps parked points unselectable.

use std::collections::BTreeSet;

use crate::data::ConversationPoint;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Cluster(String),
}

impl CategoryFilter {
    fn matches(&self, point: &ConversationPoint) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Cluster(title) => point.cluster_title.as_deref() == Some(title.as_str()),
        }
    }
}

/// Two users whose points remain visible in comparison mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonPair {
    pub current_user: String,
    pub target: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub search: String,
    pub category: CategoryFilter,
    pub comparison: Option<ComparisonPair>,
}

impl FilterCriteria {
    /// Whether every active predicate accepts `point`. `needle` is the
    /// lowercased search term.
    fn accepts(&self, point: &ConversationPoint, needle: &str) -> bool {
        if !needle.is_empty() && !matches_search(point, needle) {
            return false;
        }
        if !self.category.matches(point) {
            return false;
        }
        match &self.comparison {
            Some(pair) => point.email == pair.current_user || point.email == pair.target,
            None => true,
        }
    }
}

fn matches_search(point: &ConversationPoint, needle: &str) -> bool {
    let contains = |field: &str| field.to_lowercase().contains(needle);
    contains(&point.title)
        || contains(&point.email)
        || point.cluster_title.as_deref().is_some_and(contains)
        || point.body.as_deref().is_some_and(contains)
}

/// Indices of points currently eligible for display and picking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibleSet(BTreeSet<usize>);

impl VisibleSet {
    pub fn all(count: usize) -> Self {
        Self((0..count).collect())
    }

    pub fn contains(&self, index: usize) -> bool {
        self.0.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<usize> for VisibleSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct VisibilityFilter {
    pub sentinel: f32,
}

impl Default for VisibilityFilter {
    fn default() -> Self {
        Self { sentinel: 10_000.0 }
    }
}

impl VisibilityFilter {
    pub fn new(sentinel: f32) -> Self {
        Self { sentinel }
    }

    /// Recomputes visibility for every point and rewrites `positions`
    /// (three floats per point) in place: true coordinates for passing
    /// points, the sentinel for the rest. Idempotent for unchanged inputs.
    pub fn apply(
        &self,
        points: &[ConversationPoint],
        criteria: &FilterCriteria,
        positions: &mut Vec<f32>,
    ) -> VisibleSet {
        let needle = criteria.search.trim().to_lowercase();
        positions.resize(points.len() * 3, self.sentinel);

        let mut visible = BTreeSet::new();
        for (index, point) in points.iter().enumerate() {
            let slot = &mut positions[index * 3..index * 3 + 3];
            if criteria.accepts(point, &needle) {
                slot.copy_from_slice(&point.position());
                visible.insert(index);
            } else {
                slot.fill(self.sentinel);
            }
        }

        VisibleSet(visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(email: &str, title: &str, cluster: Option<&str>, body: Option<&str>) -> ConversationPoint {
        ConversationPoint {
            x: 1.0,
            y: 2.0,
            z: 3.0,
            email: email.to_string(),
            title: title.to_string(),
            timestamp: String::new(),
            cluster_id: None,
            cluster_title: cluster.map(str::to_string),
            body: body.map(str::to_string),
        }
    }

    fn sample() -> Vec<ConversationPoint> {
        vec![
            point("alice@company.com", "API Design", Some("Development & Coding"), None),
            point("bob@startup.io", "Roadmap", Some("Project Management"), Some("quarterly OKRs")),
            point("carol@tech.org", "Bug Fix Strategy", None, None),
        ]
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let points = sample();
        let filter = VisibilityFilter::default();
        let mut positions = Vec::new();

        let by = |term: &str, positions: &mut Vec<f32>| {
            let criteria = FilterCriteria {
                search: term.to_string(),
                ..FilterCriteria::default()
            };
            filter.apply(&points, &criteria, positions).iter().collect::<Vec<_>>()
        };

        assert_eq!(by("api", &mut positions), vec![0]);
        assert_eq!(by("STARTUP", &mut positions), vec![1]);
        assert_eq!(by("okrs", &mut positions), vec![1]);
        assert_eq!(by("coding", &mut positions), vec![0]);
        assert_eq!(by("", &mut positions), vec![0, 1, 2]);
        assert_eq!(by("nothing matches", &mut positions), Vec::<usize>::new());
    }

    #[test]
    fn hidden_points_are_parked_at_sentinel() {
        let points = sample();
        let filter = VisibilityFilter::new(10_000.0);
        let mut positions = Vec::new();
        let criteria = FilterCriteria {
            category: CategoryFilter::Cluster("Project Management".to_string()),
            ..FilterCriteria::default()
        };

        let visible = filter.apply(&points, &criteria, &mut positions);

        assert_eq!(visible.iter().collect::<Vec<_>>(), vec![1]);
        assert_eq!(&positions[0..3], &[10_000.0; 3]);
        assert_eq!(&positions[3..6], &[1.0, 2.0, 3.0]);
        assert_eq!(&positions[6..9], &[10_000.0; 3]);
    }

    #[test]
    fn comparison_keeps_both_users() {
        let points = sample();
        let mut positions = Vec::new();
        let criteria = FilterCriteria {
            comparison: Some(ComparisonPair {
                current_user: "alice@company.com".to_string(),
                target: "carol@tech.org".to_string(),
            }),
            ..FilterCriteria::default()
        };

        let visible = VisibilityFilter::default().apply(&points, &criteria, &mut positions);
        assert_eq!(visible.iter().collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn predicates_combine() {
        let points = sample();
        let mut positions = Vec::new();
        let criteria = FilterCriteria {
            search: "bug".to_string(),
            category: CategoryFilter::Cluster("Development & Coding".to_string()),
            comparison: None,
        };
        let visible = VisibilityFilter::default().apply(&points, &criteria, &mut positions);
        assert!(visible.is_empty());
        assert!(positions.iter().all(|c| *c == 10_000.0));
    }

    #[test]
    fn clearing_filters_restores_positions() {
        let points = sample();
        let filter = VisibilityFilter::default();
        let mut positions = Vec::new();
        let narrow = FilterCriteria {
            search: "roadmap".to_string(),
            ..FilterCriteria::default()
        };

        filter.apply(&points, &narrow, &mut positions);
        let visible = filter.apply(&points, &FilterCriteria::default(), &mut positions);

        assert_eq!(visible, VisibleSet::all(3));
        assert_eq!(positions, [1.0, 2.0, 3.0].repeat(3));
    }
}
