pub mod composer;
pub mod constants;
pub mod elements;
pub mod field;
pub mod fluid;
pub mod interaction;
pub mod mixer;
pub mod pose;
pub mod reaction;
pub mod scry;
pub mod session;
pub mod state;
pub mod ticker;

// Shaders bundled as string constants
pub static PARTICLES_WGSL: &str = include_str!("../shaders/particles.wgsl");

pub use composer::*;
pub use constants::*;
pub use elements::*;
pub use fluid::*;
pub use interaction::*;
pub use mixer::*;
pub use pose::*;
pub use reaction::*;
pub use session::*;
pub use state::*;
pub use ticker::*;
