use rand::Rng;

use super::palette::{ColorAssignment, ColorMode};
use crate::data::ConversationPoint;

/// Flat per-point attribute buffers, three floats per position and colour
/// and one per size, all in point-array order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloudBuffers {
    pub positions: Vec<f32>,
    pub colors: Vec<f32>,
    pub sizes: Vec<f32>,
}

impl PointCloudBuffers {
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    pub fn position(&self, index: usize) -> [f32; 3] {
        let i = index * 3;
        [self.positions[i], self.positions[i + 1], self.positions[i + 2]]
    }

    pub fn color(&self, index: usize) -> [f32; 3] {
        let i = index * 3;
        [self.colors[i], self.colors[i + 1], self.colors[i + 2]]
    }
}

/// Builds [`PointCloudBuffers`] from conversation points.
///
/// Sizes are `size_base + U[0, size_jitter)`; the shader scales them by the
/// point-size control, so changing that control never requires a rebuild.
#[derive(Debug, Clone, Copy)]
pub struct PointCloudBuilder {
    pub size_base: f32,
    pub size_jitter: f32,
    /// Perturb lightness by cluster id when colouring by user.
    pub cluster_shading: bool,
}

impl Default for PointCloudBuilder {
    fn default() -> Self {
        Self {
            size_base: 0.8,
            size_jitter: 0.5,
            cluster_shading: true,
        }
    }
}

impl PointCloudBuilder {
    pub fn build<R: Rng + ?Sized>(
        &self,
        points: &[ConversationPoint],
        colors: &ColorAssignment,
        rng: &mut R,
    ) -> PointCloudBuffers {
        let mut buffers = PointCloudBuffers {
            positions: Vec::with_capacity(points.len() * 3),
            colors: Vec::with_capacity(points.len() * 3),
            sizes: Vec::with_capacity(points.len()),
        };

        for point in points {
            buffers.positions.extend_from_slice(&point.position());

            let mut color = colors.base_color(point);
            if self.cluster_shading && colors.mode() == ColorMode::ByUser {
                if let Some(cluster) = point.cluster_id {
                    color = color.shade_for_cluster(cluster);
                }
            }
            buffers.colors.extend_from_slice(&color.0);

            let jitter = if self.size_jitter > 0.0 {
                rng.random_range(0.0..self.size_jitter)
            } else {
                0.0
            };
            buffers.sizes.push(self.size_base + jitter);
        }

        buffers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::point_cloud::palette::Rgb;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn point(email: &str, cluster: Option<u32>, x: f32) -> ConversationPoint {
        ConversationPoint {
            x,
            y: x * 2.0,
            z: -x,
            email: email.to_string(),
            title: String::new(),
            timestamp: String::new(),
            cluster_id: cluster,
            cluster_title: cluster.map(|c| format!("cluster {c}")),
            body: None,
        }
    }

    #[test]
    fn buffers_are_laid_out_per_point() {
        let points = vec![point("a@x.io", None, 1.0), point("b@x.io", None, 2.0)];
        let colors = ColorAssignment::assign(&points, ColorMode::ByUser);
        let buffers = PointCloudBuilder::default().build(&points, &colors, &mut StdRng::seed_from_u64(1));

        assert_eq!(buffers.len(), 2);
        assert_eq!(buffers.positions, vec![1.0, 2.0, -1.0, 2.0, 4.0, -2.0]);
        assert_eq!(buffers.colors.len(), 6);
        assert_eq!(buffers.position(1), [2.0, 4.0, -2.0]);
    }

    #[test]
    fn sizes_are_jittered_within_range() {
        let points: Vec<_> = (0..200).map(|i| point("a@x.io", None, i as f32)).collect();
        let colors = ColorAssignment::assign(&points, ColorMode::ByUser);
        let buffers = PointCloudBuilder::default().build(&points, &colors, &mut StdRng::seed_from_u64(9));

        assert!(buffers.sizes.iter().all(|s| (0.8..1.3).contains(s)));
        let first = buffers.sizes[0];
        assert!(buffers.sizes.iter().any(|s| *s != first));
    }

    #[test]
    fn cluster_shading_only_applies_in_user_mode() {
        let points = vec![point("a@x.io", Some(0), 0.0), point("a@x.io", None, 0.0)];
        let mut rng = StdRng::seed_from_u64(2);

        let by_user = ColorAssignment::assign(&points, ColorMode::ByUser);
        let buffers = PointCloudBuilder::default().build(&points, &by_user, &mut rng);
        let base = by_user.get("a@x.io").unwrap();
        assert_eq!(buffers.color(1), base.0);
        assert_eq!(buffers.color(0), base.shade_for_cluster(0).0);
        assert_ne!(buffers.color(0), buffers.color(1));

        let by_cluster = ColorAssignment::assign(&points, ColorMode::ByCluster);
        let buffers = PointCloudBuilder::default().build(&points, &by_cluster, &mut rng);
        assert_eq!(buffers.color(0), by_cluster.get("cluster 0").map(|c: Rgb| c.0).unwrap());
    }

    #[test]
    fn empty_input_gives_empty_buffers() {
        let colors = ColorAssignment::assign(&[], ColorMode::ByUser);
        let buffers = PointCloudBuilder::default().build(&[], &colors, &mut StdRng::seed_from_u64(0));
        assert!(buffers.is_empty());
    }
}
