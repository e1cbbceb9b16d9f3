//! Session simulation
//!
//! All gameplay logic lives here:
//! - Caller-supplied timestep only, sanitized on entry
//! - Seeded RNG only
//! - One ordered collection per entity kind
//! - No rendering, camera or threading dependencies

pub mod collision;
pub mod entity;
pub mod mask;
pub mod player;
pub mod scroller;
pub mod sprites;
pub mod state;
pub mod tick;
pub mod view;

pub use collision::{check_coin_collisions, check_obstacle_collision};
pub use entity::{Footprint, Footprinted, Mortal, Rect, Update};
pub use mask::Mask;
pub use player::{Plane, PlaneParams};
pub use scroller::{Anchor, Background, Scroller, ScrollerKind};
pub use sprites::Sprites;
pub use state::{EndReason, GameEvent, GameState, SessionState, SpawnTimer, time_score};
pub use tick::{TickInput, tick};
pub use view::{DrawEntity, DrawKind, RenderView};
