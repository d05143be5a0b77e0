//! Wire types for the conversation API.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};

/// One conversation projected into embedding space.
///
/// Points are replaced wholesale on refresh and never patched in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub email: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default)]
    pub timestamp: String,
    /// The server sends this as `cluster`, sometimes as a float.
    #[serde(
        default,
        alias = "cluster",
        deserialize_with = "cluster_id_from_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub cluster_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl ConversationPoint {
    pub fn position(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "Untitled"
        } else {
            &self.title
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn cluster_id_from_number<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value.and_then(|v| (v.is_finite() && v >= 0.0).then(|| v as u32)))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default)]
    pub min: Option<String>,
    #[serde(default)]
    pub max: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    #[serde(default)]
    pub total_conversations: usize,
    #[serde(default)]
    pub unique_users: usize,
    #[serde(default)]
    pub unique_clusters: usize,
    #[serde(default)]
    pub date_range: DateRange,
}

impl Stats {
    /// Derives summary numbers from a point set, for payloads that carry none.
    pub fn from_points(points: &[ConversationPoint]) -> Self {
        let users: BTreeSet<&str> = points.iter().map(|p| p.email.as_str()).collect();
        let clusters: BTreeSet<u32> = points.iter().filter_map(|p| p.cluster_id).collect();
        let timestamps = points
            .iter()
            .map(|p| p.timestamp.as_str())
            .filter(|t| !t.is_empty());

        // ISO-8601 strings in one format order lexicographically.
        let min = timestamps.clone().min().map(str::to_string);
        let max = timestamps.max().map(str::to_string);

        Self {
            total_conversations: points.len(),
            unique_users: users.len(),
            unique_clusters: clusters.len(),
            date_range: DateRange { min, max },
        }
    }
}

/// Payload of `GET /data`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataResponse {
    #[serde(default)]
    pub data: Vec<ConversationPoint>,
    #[serde(default)]
    pub stats: Stats,
    #[serde(default)]
    pub last_updated: String,
}

/// Two conversations from different users judged similar by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedConnection {
    pub conversation1: ConversationPoint,
    pub conversation2: ConversationPoint,
    pub similarity: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompareRequest<'a> {
    pub email1: &'a str,
    pub email2: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}

/// Sorted unique emails.
pub fn unique_users(points: &[ConversationPoint]) -> Vec<String> {
    let users: BTreeSet<&str> = points.iter().map(|p| p.email.as_str()).collect();
    users.into_iter().map(str::to_string).collect()
}

/// Sorted unique cluster titles, skipping points without one.
pub fn unique_cluster_titles(points: &[ConversationPoint]) -> Vec<String> {
    let titles: BTreeSet<&str> = points
        .iter()
        .filter_map(|p| p.cluster_title.as_deref())
        .collect();
    titles.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_payload_decodes() {
        let json = r#"{
            "data": [
                {"x": 1.5, "y": -2.0, "z": 0.25, "email": "alice@company.com",
                 "title": null, "timestamp": "2024-03-01T10:00:00",
                 "cluster": 3.0, "cluster_title": "Design & UX", "body": "hello"},
                {"x": 0, "y": 0, "z": 0, "email": "bob@startup.io",
                 "title": "API Design", "timestamp": "2024-01-01T00:00:00"}
            ],
            "stats": {"total_conversations": 2, "unique_users": 2, "unique_clusters": 1,
                      "date_range": {"min": "2024-01-01T00:00:00", "max": "2024-03-01T10:00:00"}},
            "cluster_info": [{"cluster": 3}],
            "last_updated": "2024-03-02T00:00:00"
        }"#;

        let response: DataResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.data.len(), 2);
        assert_eq!(response.data[0].cluster_id, Some(3));
        assert_eq!(response.data[0].title, "");
        assert_eq!(response.data[0].display_title(), "Untitled");
        assert_eq!(response.data[1].cluster_id, None);
        assert_eq!(response.stats.unique_users, 2);
    }

    #[test]
    fn stats_are_derived_from_points() {
        let point = |email: &str, cluster: Option<u32>, ts: &str| ConversationPoint {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            email: email.to_string(),
            title: String::new(),
            timestamp: ts.to_string(),
            cluster_id: cluster,
            cluster_title: None,
            body: None,
        };
        let points = vec![
            point("a@x.io", Some(1), "2024-05-01T00:00:00"),
            point("b@x.io", Some(1), "2023-12-31T00:00:00"),
            point("a@x.io", Some(4), "2024-07-01T00:00:00"),
        ];

        let stats = Stats::from_points(&points);
        assert_eq!(stats.total_conversations, 3);
        assert_eq!(stats.unique_users, 2);
        assert_eq!(stats.unique_clusters, 2);
        assert_eq!(stats.date_range.min.as_deref(), Some("2023-12-31T00:00:00"));
        assert_eq!(stats.date_range.max.as_deref(), Some("2024-07-01T00:00:00"));
    }

    #[test]
    fn empty_point_set_has_empty_stats() {
        let stats = Stats::from_points(&[]);
        assert_eq!(stats, Stats::default());
    }
}
