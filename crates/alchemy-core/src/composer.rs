//! The Fluid Composer seam: whatever turns "current fluid + ingredient" into a
//! new fluid. Real implementations talk to an external service; the recipe
//! book here is a local stand-in driven by a JSON asset.

use crate::fluid::{parse_hex_color, to_hex_color, FluidPropertyRecord, PartialFluidRecord};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

pub static BUILTIN_RECIPES_JSON: &str = include_str!("../assets/recipes.json");

#[derive(Debug, Error)]
pub enum ComposerError {
    #[error("composer unavailable: {0}")]
    Unavailable(String),
    #[error("composer timed out after {0:?}")]
    Timeout(Duration),
    #[error("malformed composer reply: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unknown ingredient {0:?}")]
    UnknownIngredient(String),
}

/// External collaborator that composes a new fluid.
///
/// `compose` may block for an arbitrary time; callers run it off the render
/// and logic loops.
pub trait FluidComposer: Send + Sync {
    fn compose(
        &self,
        current: &FluidPropertyRecord,
        ingredient: &str,
    ) -> Result<PartialFluidRecord, ComposerError>;
}

/// Parse a JSON reply (camelCase field names, any subset present).
///
/// The reply must be a JSON object; serde would otherwise accept a sequence
/// for the struct and hand back an all-empty record.
pub fn parse_reply(text: &str) -> Result<PartialFluidRecord, ComposerError> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    if !value.is_object() {
        return Err(ComposerError::Malformed(serde::de::Error::custom(
            "expected a JSON object",
        )));
    }
    Ok(serde_json::from_value(value)?)
}

/// How one ingredient transforms whatever it is poured into.
///
/// Colors are pulled halfway toward `tint`/`highlight`; scalars are offsets.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Tincture {
    pub epithet: String,
    pub description: Option<String>,
    pub tint: Option<String>,
    pub highlight: Option<String>,
    pub particle_size: f32,
    pub viscosity: f32,
    pub force_strength: f32,
    pub flow_speed: f32,
    pub chaos: f32,
    pub glow: f32,
}

const TINT_WEIGHT: f32 = 0.5;

/// Local composer backed by a table of tinctures keyed by ingredient name.
#[derive(Clone, Debug)]
pub struct RecipeBook {
    tinctures: HashMap<String, Tincture>,
    latency: Option<Duration>,
}

impl RecipeBook {
    pub fn from_json(text: &str) -> Result<Self, ComposerError> {
        let raw: HashMap<String, Tincture> = serde_json::from_str(text)?;
        let tinctures = raw
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();
        Ok(Self {
            tinctures,
            latency: None,
        })
    }

    pub fn builtin() -> Result<Self, ComposerError> {
        Self::from_json(BUILTIN_RECIPES_JSON)
    }

    /// Sleep this long inside `compose`, imitating a remote round trip.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn len(&self) -> usize {
        self.tinctures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tinctures.is_empty()
    }

    pub fn tincture(&self, ingredient: &str) -> Option<&Tincture> {
        self.tinctures.get(&ingredient.to_lowercase())
    }
}

impl FluidComposer for RecipeBook {
    fn compose(
        &self,
        current: &FluidPropertyRecord,
        ingredient: &str,
    ) -> Result<PartialFluidRecord, ComposerError> {
        if let Some(latency) = self.latency {
            std::thread::sleep(latency);
        }
        let t = self
            .tincture(ingredient)
            .ok_or_else(|| ComposerError::UnknownIngredient(ingredient.to_string()))?;

        let noun = current.name.split_whitespace().last().unwrap_or("Essence");
        let pull = |from: glam::Vec3, toward: &Option<String>| {
            let target = toward.as_deref().and_then(parse_hex_color).unwrap_or(from);
            to_hex_color(from.lerp(target, TINT_WEIGHT))
        };

        Ok(PartialFluidRecord {
            name: Some(format!("{} {}", t.epithet, noun)),
            description: t.description.clone(),
            base_color: Some(pull(current.base_color, &t.tint)),
            highlight_color: Some(pull(current.highlight_color, &t.highlight)),
            particle_size: Some(current.particle_size + t.particle_size),
            viscosity: Some(current.viscosity + t.viscosity),
            force_strength: Some(current.force_strength + t.force_strength),
            flow_speed: Some(current.flow_speed + t.flow_speed),
            chaos: Some(current.chaos + t.chaos),
            glow: Some(current.glow + t.glow),
        })
    }
}
