//! Fluid property records and the fallback-merge that keeps them complete.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Full visual/physical description of the current fluid.
///
/// Every scalar is non-negative and both colors are linear-ish RGB in [0, 1].
/// Records are replaced wholesale; the simulator smooths toward them.
#[derive(Clone, Debug, PartialEq)]
pub struct FluidPropertyRecord {
    pub name: String,
    pub description: String,
    pub base_color: Vec3,
    pub highlight_color: Vec3,
    pub particle_size: f32,
    /// 0.5 reads as water, 0.99 as tar.
    pub viscosity: f32,
    pub force_strength: f32,
    pub flow_speed: f32,
    /// Spatial frequency of the flow noise.
    pub chaos: f32,
    pub glow: f32,
}

impl FluidPropertyRecord {
    /// The calm pool every session starts with.
    pub fn pure_water() -> Self {
        Self {
            name: "Pure Water".into(),
            description: "A calm, clear pool of digital essence.".into(),
            base_color: hex_or_white("#0ea5e9"),
            highlight_color: hex_or_white("#e0f2fe"),
            particle_size: 1.8,
            viscosity: 0.5,
            force_strength: 2.0,
            flow_speed: 0.2,
            chaos: 0.2,
            glow: 1.0,
        }
    }

    /// Source of every field a composer leaves out.
    pub fn liquid_void() -> Self {
        Self {
            name: "Liquid Void".into(),
            description: "A dark, primordial ocean waiting for creation.".into(),
            base_color: hex_or_white("#1e1b4b"),
            highlight_color: hex_or_white("#6366f1"),
            particle_size: 2.0,
            viscosity: 0.92,
            force_strength: 2.0,
            flow_speed: 0.3,
            chaos: 0.5,
            glow: 1.0,
        }
    }
}

impl Default for FluidPropertyRecord {
    fn default() -> Self {
        Self::pure_water()
    }
}

/// A composer result in which any field may be missing.
///
/// Field names follow the camelCase JSON schema the composer speaks.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartialFluidRecord {
    pub name: Option<String>,
    pub description: Option<String>,
    pub base_color: Option<String>,
    pub highlight_color: Option<String>,
    pub particle_size: Option<f32>,
    pub viscosity: Option<f32>,
    pub force_strength: Option<f32>,
    pub flow_speed: Option<f32>,
    pub chaos: Option<f32>,
    pub glow: Option<f32>,
}

impl From<&FluidPropertyRecord> for PartialFluidRecord {
    fn from(r: &FluidPropertyRecord) -> Self {
        Self {
            name: Some(r.name.clone()),
            description: Some(r.description.clone()),
            base_color: Some(to_hex_color(r.base_color)),
            highlight_color: Some(to_hex_color(r.highlight_color)),
            particle_size: Some(r.particle_size),
            viscosity: Some(r.viscosity),
            force_strength: Some(r.force_strength),
            flow_speed: Some(r.flow_speed),
            chaos: Some(r.chaos),
            glow: Some(r.glow),
        }
    }
}

/// Fill every field `partial` omits from `default`.
///
/// Unparseable colors and non-finite scalars count as omitted; negative
/// scalars are clamped to zero. The result is always fully populated and
/// safe to hand to the simulator.
pub fn fallback_merge(
    partial: &PartialFluidRecord,
    default: &FluidPropertyRecord,
) -> FluidPropertyRecord {
    let text = |v: &Option<String>, d: &str| match v {
        Some(s) if !s.trim().is_empty() => s.trim().to_string(),
        _ => d.to_string(),
    };
    let color = |v: &Option<String>, d: Vec3| {
        v.as_deref().and_then(parse_hex_color).unwrap_or(d)
    };
    let scalar = |v: Option<f32>, d: f32| match v {
        Some(x) if x.is_finite() => x.max(0.0),
        _ => d,
    };

    FluidPropertyRecord {
        name: text(&partial.name, &default.name),
        description: text(&partial.description, &default.description),
        base_color: color(&partial.base_color, default.base_color),
        highlight_color: color(&partial.highlight_color, default.highlight_color),
        particle_size: scalar(partial.particle_size, default.particle_size),
        viscosity: scalar(partial.viscosity, default.viscosity),
        force_strength: scalar(partial.force_strength, default.force_strength),
        flow_speed: scalar(partial.flow_speed, default.flow_speed),
        chaos: scalar(partial.chaos, default.chaos),
        glow: scalar(partial.glow, default.glow),
    }
}

/// Parse `#rgb` or `#rrggbb` (leading `#` optional) into [0, 1] RGB.
pub fn parse_hex_color(s: &str) -> Option<Vec3> {
    let hex = s.trim().trim_start_matches('#');
    if !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize, len: usize| -> Option<f32> {
        let v = u8::from_str_radix(&hex[i * len..(i + 1) * len], 16).ok()?;
        Some(if len == 1 { (v * 17) as f32 } else { v as f32 } / 255.0)
    };
    let len = match hex.len() {
        3 => 1,
        6 => 2,
        _ => return None,
    };
    Some(Vec3::new(channel(0, len)?, channel(1, len)?, channel(2, len)?))
}

pub fn to_hex_color(c: Vec3) -> String {
    let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!("#{:02x}{:02x}{:02x}", q(c.x), q(c.y), q(c.z))
}

fn hex_or_white(s: &str) -> Vec3 {
    parse_hex_color(s).unwrap_or(Vec3::ONE)
}
