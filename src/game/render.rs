//! Render Frames
//!
//! The renderer is an external collaborator. Once per display callback
//! it receives a [`RenderFrame`]: every visible entity with its position
//! already blended as `prev + (curr - prev) * t`, never the raw current
//! position.
//!
//! Visual assets may still be loading when the simulation runs. The
//! [`VisualSource`] gate only flips a `placeholder` flag on the sprite;
//! the entity is still updated and still listed.

use serde::{Serialize, Deserialize};

use crate::game::animation::{Anim, Animated};
use crate::game::body::{Body, Facing};
use crate::game::particle::ParticleKind;
use crate::game::state::{EntityId, World};

/// What a sprite depicts, for asset lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpriteKind {
    /// The player character
    Player,
    /// A patrolling enemy
    Enemy,
    /// Treasure chest
    Chest,
    /// Scroll revealed from the chest
    Scroll,
    /// Pistol bullet
    Bullet,
    /// Effect particle
    Particle(ParticleKind),
    /// Eyes watching from the bushes
    Eyes,
}

/// One sprite to draw, in world coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpriteView {
    /// What to draw
    pub kind: SpriteKind,
    /// Registry identity, where the kind has one
    pub id: Option<EntityId>,
    /// Interpolated left edge
    pub x: f32,
    /// Interpolated top edge
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
    /// Current clip, for animated kinds
    pub anim: Option<Anim>,
    /// Frame within the clip
    pub frame: u32,
    /// Facing (mirrors the sprite when left)
    pub facing: Facing,
    /// Opacity in `[0, 1]`
    pub alpha: f32,
    /// Uniform scale (scroll reveal, eye lid openness)
    pub scale: f32,
    /// Visuals not loaded yet, draw a stand-in
    pub placeholder: bool,
}

/// Everything the renderer needs for one display callback.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderFrame {
    /// Blend factor between the last two ticks
    pub interpolation: f32,
    /// Interpolated camera left edge
    pub camera_x: f32,
    /// Sprites in draw order
    pub sprites: Vec<SpriteView>,
}

impl RenderFrame {
    /// Sprites of one kind.
    pub fn of_kind(&self, kind: SpriteKind) -> impl Iterator<Item = &SpriteView> + '_ {
        self.sprites.iter().filter(move |s| s.kind == kind)
    }
}

/// Reports which visuals finished loading.
pub trait VisualSource {
    /// Whether `kind` can be drawn with real assets.
    fn is_loaded(&self, kind: SpriteKind) -> bool;
}

/// Visual source with everything loaded.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllLoaded;

impl VisualSource for AllLoaded {
    fn is_loaded(&self, _kind: SpriteKind) -> bool {
        true
    }
}

/// Draws frames. Implemented outside the crate.
pub trait Renderer {
    /// Draw one frame.
    fn draw_frame(&mut self, frame: &RenderFrame);
}

#[inline]
fn lerp(prev: f32, curr: f32, t: f32) -> f32 {
    prev + (curr - prev) * t
}

struct FrameBuilder<'a> {
    t: f32,
    left: f32,
    right: f32,
    visuals: &'a dyn VisualSource,
    sprites: Vec<SpriteView>,
}

impl FrameBuilder<'_> {
    fn visible(&self, x: f32, width: f32) -> bool {
        x + width >= self.left && x <= self.right
    }

    fn sprite(&self, kind: SpriteKind, x: f32, y: f32, width: f32, height: f32) -> SpriteView {
        SpriteView {
            kind,
            id: None,
            x,
            y,
            width,
            height,
            anim: None,
            frame: 0,
            facing: Facing::Right,
            alpha: 1.0,
            scale: 1.0,
            placeholder: !self.visuals.is_loaded(kind),
        }
    }

    fn body_sprite(&self, kind: SpriteKind, body: &Body, animated: &dyn Animated) -> SpriteView {
        let animator = animated.animator();
        SpriteView {
            anim: Some(animator.current()),
            frame: animator.frame(),
            facing: body.facing,
            ..self.sprite(
                kind,
                lerp(body.prev_x, body.x, self.t),
                lerp(body.prev_y, body.y, self.t),
                body.width,
                body.height,
            )
        }
    }

    fn push_if_visible(&mut self, sprite: SpriteView) {
        if self.visible(sprite.x, sprite.width) {
            self.sprites.push(sprite);
        }
    }
}

/// Build the frame for blend factor `t` (clamped to `[0, 1]`).
///
/// Draw order: eyes, chests, scrolls, enemies, player, bullets,
/// particles. Everything outside the camera span is culled except the
/// player.
pub fn build_frame(world: &World, t: f32, visuals: &dyn VisualSource) -> RenderFrame {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let (left, right) = world.camera.visible_span(t);
    let mut builder = FrameBuilder { t, left, right, visuals, sprites: Vec::new() };

    for eyes in world.scenery.eyes().iter().filter(|e| e.is_visible()) {
        let sprite = SpriteView {
            alpha: eyes.alpha,
            scale: eyes.lid,
            ..builder.sprite(SpriteKind::Eyes, eyes.x - 20.0, eyes.y - 10.0, 40.0, 20.0)
        };
        builder.push_if_visible(sprite);
    }

    let registry = &world.registry;
    for chest in registry.chests() {
        let animator = chest.animator();
        let sprite = SpriteView {
            id: Some(chest.id),
            anim: Some(animator.current()),
            frame: animator.frame(),
            ..builder.sprite(SpriteKind::Chest, chest.x, chest.y, chest.width, chest.height)
        };
        builder.push_if_visible(sprite);
    }

    for scroll in registry.spawner().scrolls() {
        let sprite = SpriteView {
            id: Some(scroll.id),
            scale: scroll.scale,
            ..builder.sprite(SpriteKind::Scroll, scroll.x, scroll.y, scroll.width, scroll.height)
        };
        builder.push_if_visible(sprite);
    }

    for enemy in registry.enemies() {
        let sprite = SpriteView {
            id: Some(enemy.id),
            alpha: enemy.alpha,
            ..builder.body_sprite(SpriteKind::Enemy, &enemy.body, enemy)
        };
        builder.push_if_visible(sprite);
    }

    if let Some(player) = registry.player() {
        let sprite = builder.body_sprite(SpriteKind::Player, &player.body, player);
        builder.sprites.push(sprite);
    }

    for bullet in registry.spawner().bullets() {
        let sprite = SpriteView {
            id: Some(bullet.id),
            facing: bullet.facing,
            alpha: bullet.alpha,
            ..builder.sprite(
                SpriteKind::Bullet,
                lerp(bullet.prev_x, bullet.x, t),
                lerp(bullet.prev_y, bullet.y, t),
                bullet.width,
                bullet.height,
            )
        };
        builder.push_if_visible(sprite);
    }

    for particle in registry.spawner().particles() {
        let bounds = particle.bounds();
        let sprite = SpriteView {
            alpha: particle.alpha(),
            ..builder.sprite(
                SpriteKind::Particle(particle.kind),
                lerp(particle.prev_x, particle.x, t),
                lerp(particle.prev_y, particle.y, t),
                bounds.width,
                bounds.height,
            )
        };
        builder.push_if_visible(sprite);
    }

    RenderFrame {
        interpolation: t,
        camera_x: world.camera.interpolated_x(t),
        sprites: builder.sprites,
    }
}

// =============================================================================
// TESTS
// =============================================================================
