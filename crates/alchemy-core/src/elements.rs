//! The static pool of elements a hand can pick up and drop into the cauldron.

use crate::fluid::parse_hex_color;
use glam::{Vec2, Vec3};

/// Stable identity of a pickable element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ElementId(pub &'static str);

/// Glyph shown for an element by the front-end.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Icon {
    Flame,
    Droplets,
    Mountain,
    Wind,
}

/// An element in the pool. Immutable for the process lifetime.
///
/// Fields:
/// - `id`: identity used by hover/drag state
/// - `name`: display name, also the ingredient name sent to the composer
/// - `accent_hex`: accent color as `#rrggbb`
/// - `position`: fixed normalized screen position
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PickableElement {
    pub id: ElementId,
    pub name: &'static str,
    pub accent_hex: &'static str,
    pub icon: Icon,
    pub position: [f32; 2],
}

impl PickableElement {
    #[inline]
    pub fn position(&self) -> Vec2 {
        Vec2::from(self.position)
    }

    pub fn accent(&self) -> Vec3 {
        parse_hex_color(self.accent_hex).unwrap_or(Vec3::ONE)
    }
}

/// Default pool, stacked along the left edge. Order is the hover tie-break.
pub const ELEMENT_POOL: [PickableElement; 4] = [
    PickableElement {
        id: ElementId("fire"),
        name: "Ignis",
        accent_hex: "#ef4444",
        icon: Icon::Flame,
        position: [0.1, 0.3],
    },
    PickableElement {
        id: ElementId("water"),
        name: "Aqua",
        accent_hex: "#3b82f6",
        icon: Icon::Droplets,
        position: [0.1, 0.45],
    },
    PickableElement {
        id: ElementId("earth"),
        name: "Terra",
        accent_hex: "#22c55e",
        icon: Icon::Mountain,
        position: [0.1, 0.6],
    },
    PickableElement {
        id: ElementId("air"),
        name: "Aer",
        accent_hex: "#a8a29e",
        icon: Icon::Wind,
        position: [0.1, 0.75],
    },
];

pub fn find_element(pool: &[PickableElement], id: ElementId) -> Option<&PickableElement> {
    pool.iter().find(|e| e.id == id)
}
