//! Read-only snapshot for the renderer and HUD

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::Mortal;
use super::scroller::{Scroller, ScrollerKind};
use super::state::{GameState, SessionState};

/// What a drawable is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawKind {
    Plane,
    Scroller(ScrollerKind),
}

/// One drawable entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawEntity {
    pub id: u32,
    pub kind: DrawKind,
    /// Top-left of the unrotated sprite
    pub pos: Vec2,
    /// Degrees, positive is counter-clockwise
    pub rotation: f32,
    pub frame: usize,
}

/// Everything the presentation layer needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderView {
    pub session: SessionState,
    pub status: String,
    pub time_score: u32,
    pub coin_score: u32,
    /// Offset of the two-tile background strip
    pub background_offset: f32,
    /// Back to front: clouds, obstacles, coins, plane
    pub entities: Vec<DrawEntity>,
}

impl RenderView {
    pub fn capture(state: &GameState) -> Self {
        let (time_score, coin_score) = state.scores();

        let scrollers = state
            .clouds
            .iter()
            .chain(state.obstacles.iter())
            .chain(state.coins.iter())
            .filter(|s| s.is_alive());
        let mut entities: Vec<DrawEntity> = scrollers.map(draw_scroller).collect();
        entities.push(DrawEntity {
            id: 0,
            kind: DrawKind::Plane,
            pos: state.plane.pos,
            rotation: state.plane.rotation_current,
            frame: state.plane.frame_index(),
        });

        Self {
            session: state.session,
            status: state.session.status_text(),
            time_score,
            coin_score,
            background_offset: state.background.offset,
            entities,
        }
    }
}

fn draw_scroller(scroller: &Scroller) -> DrawEntity {
    DrawEntity {
        id: scroller.id,
        kind: DrawKind::Scroller(scroller.kind),
        pos: scroller.pos,
        rotation: 0.0,
        frame: 0,
    }
}
