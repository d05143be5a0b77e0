//! Colour assignment for the point cloud.

use std::collections::HashMap;

use serde::Deserialize;

use crate::data::ConversationPoint;

/// Key shared by points that carry no cluster title.
pub const UNCLUSTERED: &str = "Unclustered";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum ColorMode {
    #[default]
    #[serde(rename = "user")]
    ByUser,
    #[serde(rename = "cluster")]
    ByCluster,
}

impl ColorMode {
    pub fn label(self) -> &'static str {
        match self {
            ColorMode::ByUser => "User",
            ColorMode::ByCluster => "Cluster",
        }
    }

    pub fn palette(self) -> &'static [u32] {
        match self {
            ColorMode::ByUser => &USER_PALETTE,
            ColorMode::ByCluster => &CLUSTER_PALETTE,
        }
    }

    /// The grouping key a point is coloured by in this mode.
    pub fn key_of(self, point: &ConversationPoint) -> &str {
        match self {
            ColorMode::ByUser => &point.email,
            ColorMode::ByCluster => point.cluster_title.as_deref().unwrap_or(UNCLUSTERED),
        }
    }
}

/// RGB triple in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb(pub [f32; 3]);

impl Rgb {
    pub fn from_hex(hex: u32) -> Self {
        Self([
            ((hex >> 16) & 0xff) as f32 / 255.0,
            ((hex >> 8) & 0xff) as f32 / 255.0,
            (hex & 0xff) as f32 / 255.0,
        ])
    }

    pub fn to_hex_string(self) -> String {
        let [r, g, b] = self.0.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
        format!("#{r:02x}{g:02x}{b:02x}")
    }

    /// Returns `(hue, saturation, lightness)`, each in `[0, 1]`.
    pub fn to_hsl(self) -> (f32, f32, f32) {
        let [r, g, b] = self.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let lightness = (max + min) / 2.0;

        if max == min {
            return (0.0, 0.0, lightness);
        }

        let delta = max - min;
        let saturation = if lightness <= 0.5 {
            delta / (max + min)
        } else {
            delta / (2.0 - max - min)
        };
        let hue = if max == r {
            (g - b) / delta + if g < b { 6.0 } else { 0.0 }
        } else if max == g {
            (b - r) / delta + 2.0
        } else {
            (r - g) / delta + 4.0
        };

        (hue / 6.0, saturation, lightness)
    }

    pub fn from_hsl(hue: f32, saturation: f32, lightness: f32) -> Self {
        let hue = hue.rem_euclid(1.0);
        let saturation = saturation.clamp(0.0, 1.0);
        let lightness = lightness.clamp(0.0, 1.0);

        if saturation == 0.0 {
            return Self([lightness; 3]);
        }

        let q = if lightness <= 0.5 {
            lightness * (1.0 + saturation)
        } else {
            lightness + saturation - lightness * saturation
        };
        let p = 2.0 * lightness - q;

        Self([
            hue_to_rgb(p, q, hue + 1.0 / 3.0),
            hue_to_rgb(p, q, hue),
            hue_to_rgb(p, q, hue - 1.0 / 3.0),
        ])
    }

    /// Shifts lightness by a step derived from a cluster id so that clusters
    /// sharing a base colour stay distinguishable.
    pub fn shade_for_cluster(self, cluster_id: u32) -> Self {
        let (h, s, l) = self.to_hsl();
        let shift = ((cluster_id % 5) as f32 - 2.0) * 0.1;
        Self::from_hsl(h, s, (l + shift).clamp(0.2, 0.9))
    }
}

fn hue_to_rgb(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * 6.0 * (2.0 / 3.0 - t)
    } else {
        p
    }
}

pub const USER_PALETTE: [u32; 12] = [
    0x00d9ff,
    0xff0080,
    0x00ff88,
    0xff8800,
    0x8800ff,
    0xff4444,
    0x44ff44,
    0x4444ff,
    0xffff44,
    0xff44ff,
    0x44ffff,
    0xffffff,
];

pub const CLUSTER_PALETTE: [u32; 12] = [
    0xff6b6b,
    0x4ecdc4,
    0x45b7d1,
    0x96ceb4,
    0xffeaa7,
    0xdda0dd,
    0x98d8c8,
    0xf7dc6f,
    0xbb8fce,
    0x85c1e9,
    0xf8c471,
    0x82e0aa,
];

/// Key → colour map for one colour mode, cycled through the mode's palette
/// in first-seen key order.
#[derive(Debug, Clone, Default)]
pub struct ColorAssignment {
    mode: ColorMode,
    order: Vec<String>,
    colors: HashMap<String, Rgb>,
}

impl ColorAssignment {
    pub fn assign(points: &[ConversationPoint], mode: ColorMode) -> Self {
        let palette = mode.palette();
        let mut assignment = Self {
            mode,
            order: Vec::new(),
            colors: HashMap::new(),
        };

        for point in points {
            let key = mode.key_of(point);
            if !assignment.colors.contains_key(key) {
                let color = Rgb::from_hex(palette[assignment.order.len() % palette.len()]);
                assignment.colors.insert(key.to_string(), color);
                assignment.order.push(key.to_string());
            }
        }

        assignment
    }

    pub fn mode(&self) -> ColorMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<Rgb> {
        self.colors.get(key).copied()
    }

    /// Base colour for a point; white for keys not in the map.
    pub fn base_color(&self, point: &ConversationPoint) -> Rgb {
        self.get(self.mode.key_of(point)).unwrap_or(Rgb([1.0; 3]))
    }

    /// Legend entries in assignment order.
    pub fn legend(&self) -> impl Iterator<Item = (&str, Rgb)> {
        self.order
            .iter()
            .map(|key| (key.as_str(), self.colors[key]))
    }
}
