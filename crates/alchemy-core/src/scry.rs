//! "Scrying": capture what the field currently looks like and get a short
//! description of it back. Auxiliary to mixing; failures only ever produce a
//! fallback sentence.

use crate::field::ParticleField;
use glam::Vec3;

pub const CLOUDED: &str = "The scrying glass is clouded.";
pub const UNCLEAR: &str = "The vision is unclear.";

/// A captured frame as linear RGB samples.
#[derive(Clone, Debug, Default)]
pub struct CapturedFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Vec3>,
}

pub trait FrameCapture {
    fn capture(&self) -> anyhow::Result<CapturedFrame>;
}

/// External collaborator that describes a captured frame.
pub trait EssenceReader {
    fn read(&self, frame: &CapturedFrame) -> anyhow::Result<String>;
}

/// Capture, read, and fold every failure into a fixed sentence.
pub fn scry(capture: &dyn FrameCapture, reader: &dyn EssenceReader) -> String {
    let reading = capture.capture().and_then(|frame| reader.read(&frame));
    match reading {
        Ok(text) if text.trim().is_empty() => UNCLEAR.to_string(),
        Ok(text) => text,
        Err(e) => {
            log::warn!("[scry] {e:#}");
            CLOUDED.to_string()
        }
    }
}

/// The particle colors of the last frame, one pixel per particle.
impl FrameCapture for ParticleField {
    fn capture(&self) -> anyhow::Result<CapturedFrame> {
        let pixels: Vec<Vec3> = self
            .instances()
            .iter()
            .map(|p| Vec3::new(p.color[0], p.color[1], p.color[2]))
            .collect();
        anyhow::ensure!(!pixels.is_empty(), "field has no particles to capture");
        Ok(CapturedFrame {
            width: pixels.len() as u32,
            height: 1,
            pixels,
        })
    }
}

/// Local reader that names the dominant hue and brightness of a frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct PaletteReader;

impl EssenceReader for PaletteReader {
    fn read(&self, frame: &CapturedFrame) -> anyhow::Result<String> {
        anyhow::ensure!(!frame.pixels.is_empty(), "empty frame");
        let mean = frame.pixels.iter().copied().sum::<Vec3>() / frame.pixels.len() as f32;
        let spread = frame
            .pixels
            .iter()
            .map(|p| p.distance_squared(mean))
            .sum::<f32>()
            / frame.pixels.len() as f32;

        let brightness = match mean.max_element() {
            b if b > 0.8 => "blazing",
            b if b > 0.45 => "glimmering",
            b if b > 0.15 => "dim",
            _ => "lightless",
        };
        let texture = if spread > 0.05 {
            "restless and many-hued"
        } else {
            "still and of one mind"
        };
        Ok(format!(
            "A {brightness} {} essence swirls within. It seems {texture}.",
            hue_name(mean)
        ))
    }
}

fn hue_name(c: Vec3) -> &'static str {
    let max = c.max_element();
    let min = c.min_element();
    if max - min < 0.08 {
        return "pale";
    }
    let d = max - min;
    let sector = if max == c.x {
        ((c.y - c.z) / d).rem_euclid(6.0)
    } else if max == c.y {
        (c.z - c.x) / d + 2.0
    } else {
        (c.x - c.y) / d + 4.0
    };
    match (sector * 60.0) as u32 {
        0..=20 | 331..=360 => "crimson",
        21..=50 => "amber",
        51..=70 => "golden",
        71..=160 => "verdant",
        161..=200 => "cerulean",
        201..=260 => "azure",
        261..=300 => "violet",
        _ => "rose",
    }
}
