use serde::Serialize;

use crate::entity::{ClusterKey, DisplayEntity};
use crate::visuals::VisualParams;

/// What the renderer draws for one entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderEntity {
    pub lat: f64,
    pub lng: f64,
    pub radius: f64,
    pub height_above_surface: f64,
    /// `#rrggbb`.
    pub color: String,
    pub label_text: String,
    pub is_cluster: bool,
    pub member_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<ClusterKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip)]
    raw_label: String,
    #[serde(skip)]
    member_texts: Vec<String>,
}

impl RenderEntity {
    pub fn new(entity: &DisplayEntity, visuals: VisualParams) -> Self {
        let position = entity.position();
        let raw_label = entity.label_text();
        let member_texts = match entity {
            DisplayEntity::Single { .. } => Vec::new(),
            DisplayEntity::Cluster(c) => c.member_texts.clone(),
        };
        Self {
            lat: position.lat,
            lng: position.lng,
            radius: visuals.radius,
            height_above_surface: visuals.height_above_surface,
            color: visuals.color.to_hex(),
            label_text: raw_label.clone(),
            is_cluster: entity.is_cluster(),
            member_count: entity.member_count(),
            key: entity.key(),
            summary: None,
            raw_label,
            member_texts,
        }
    }

    /// The label before any summary was attached.
    pub fn raw_label(&self) -> &str {
        &self.raw_label
    }

    /// Member texts of a cluster in input order; empty for singles.
    pub fn member_texts(&self) -> &[String] {
        &self.member_texts
    }

    /// Prepends `summary` to the raw label; replaces any earlier summary.
    pub fn augment(&mut self, summary: &str) {
        self.label_text = format!("{summary}\n\n{}", self.raw_label);
        self.summary = Some(summary.to_string());
    }
}

/// One complete level-of-detail pass, handed to the renderer as a unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Recompute pass counter; 0 is the empty initial snapshot.
    pub pass: u64,
    pub altitude: f64,
    pub merge_distance_km: f64,
    pub entities: Vec<RenderEntity>,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self {
            pass: 0,
            altitude: 0.0,
            merge_distance_km: 0.0,
            entities: Vec::new(),
        }
    }

    pub fn cluster_count(&self) -> usize {
        self.entities.iter().filter(|e| e.is_cluster).count()
    }

    pub fn single_count(&self) -> usize {
        self.entities.len() - self.cluster_count()
    }

    /// Sum of member counts; equals the input length for every pass.
    pub fn point_count(&self) -> usize {
        self.entities.iter().map(|e| e.member_count).sum()
    }

    pub fn contains_key(&self, key: &ClusterKey) -> bool {
        self.find(key).is_some()
    }

    pub fn find(&self, key: &ClusterKey) -> Option<&RenderEntity> {
        self.entities.iter().find(|e| e.key.as_ref() == Some(key))
    }

    pub fn find_mut(&mut self, key: &ClusterKey) -> Option<&mut RenderEntity> {
        self.entities.iter_mut().find(|e| e.key.as_ref() == Some(key))
    }

    /// Clusters ordered by member count (largest first), ties in snapshot order.
    pub fn clusters_by_size(&self) -> Vec<&RenderEntity> {
        let mut clusters: Vec<&RenderEntity> =
            self.entities.iter().filter(|e| e.is_cluster).collect();
        clusters.sort_by(|a, b| b.member_count.cmp(&a.member_count));
        clusters
    }
}
