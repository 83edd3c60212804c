//! Simulation Tick
//!
//! The per-tick call order and the frame driver around it. Everything in
//! here must stay deterministic: given the same config, level, seed and
//! per-tick actions, every run produces the same state hash no matter
//! how the display divided time between callbacks.

use tracing::debug;

use crate::core::clock::{FixedStepClock, FrameReport};
use crate::game::collision::{resolve_combat, CombatReport};
use crate::game::config::GameConfig;
use crate::game::events::{GameEvent, GameEventData};
use crate::game::input::{ActionState, InputRecording, InputSource};
use crate::game::level::LevelData;
use crate::game::registry::TickContext;
use crate::game::render::{build_frame, Renderer, RenderFrame, VisualSource};
use crate::game::state::{BuildError, GamePhase, World};

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Events generated this tick
    pub events: Vec<GameEvent>,
    /// Hits and scares from the combat pass
    pub combat: CombatReport,
    /// Entities reaped by the cull pass
    pub culled: usize,
}

/// Run one simulation tick of exactly `world.step_ms()`.
///
/// Order is fixed: collisions see post-movement positions, and anything
/// they kill survives until a later cull.
pub fn tick(world: &mut World, actions: ActionState) -> TickResult {
    let mut result = TickResult::default();
    let phase = world.phase;

    world.events.begin_tick(world.tick);

    #[cfg(feature = "debug-tracing")]
    tracing::trace!(tick = world.tick, ?phase, entities = world.registry.entity_count(), "tick");

    let ctx = TickContext {
        dt_ms: world.step_ms,
        now_ms: world.tick as f64 * world.step_ms,
        playing: phase.is_playing(),
        level: &world.level,
        world_width: world.config.game.world_width(),
    };

    // 1. Resolve actions
    if phase.is_playing() {
        world.controller.update(actions, &mut world.registry, &ctx, &mut world.events);
    }

    // 2. Physics and animation
    if phase.is_paused() {
        world.registry.hold_still();
    } else {
        world.registry.update(&ctx, &mut world.events);
    }

    // 3. Reap what was marked before this point
    result.culled = world.registry.cull();

    // 4. Combat
    if phase.is_playing() {
        result.combat = resolve_combat(
            &mut world.registry,
            &mut world.scenery,
            &world.config.melee,
            &mut world.events,
        );
    }

    // 5. Camera and scenery
    if phase.is_paused() {
        world.camera.hold();
    } else {
        if let Some(player) = world.registry.player() {
            world.camera.follow(&player.body.bounds());
        }
        let player_x = world.registry.player().map(|p| p.body.center_x());
        world.scenery.update(world.step_ms, player_x);
    }

    let revealed = world
        .pending_events()
        .iter()
        .any(|e| matches!(e.data, GameEventData::ScrollRevealed { .. }));
    if revealed {
        world.set_phase(GamePhase::GameOver);
    }

    world.tick += 1;
    result.events = world.take_events();
    result
}

// =============================================================================
// FRAME DRIVER
// =============================================================================

/// A world, its clock and its input source.
///
/// Call [`Game::frame`] from the display callback. Ticks run through
/// the fixed-step clock. Every tick's actions and every phase change made
/// through [`Game::set_phase`] are recorded for replay.
pub struct Game<I> {
    world: World,
    clock: FixedStepClock,
    input: I,
    recording: InputRecording,
    events: Vec<GameEvent>,
}

impl<I: InputSource> Game<I> {
    /// Drive `world` with `input`.
    ///
    /// Any ticks `world` ran before this must have been spent at the menu.
    pub fn new(world: World, input: I) -> Self {
        let clock = FixedStepClock::new(world.step_ms(), world.config().game.max_frame_ms);
        let mut recording = InputRecording::starting_at(world.seed, world.tick);
        recording.record_phase(world.tick, world.phase());
        Self {
            world,
            clock,
            input,
            recording,
            events: Vec::new(),
        }
    }

    /// Leave the menu and start playing.
    pub fn start(&mut self) {
        self.set_phase(GamePhase::Playing);
    }

    /// Move the world to `phase` and record the change.
    pub fn set_phase(&mut self, phase: GamePhase) {
        if self.world.phase() == phase {
            return;
        }
        self.recording.record_phase(self.world.tick, phase);
        self.world.set_phase(phase);
    }

    /// Display callback at wall-clock `now_ms`.
    pub fn frame(&mut self, now_ms: f64) -> FrameReport {
        let Self { world, clock, input, recording, events } = self;
        clock.advance(now_ms, |_| run_tick(world, input, recording, events))
    }

    /// Display callback with an already-measured elapsed time.
    pub fn advance_by(&mut self, elapsed_ms: f64) -> FrameReport {
        let Self { world, clock, input, recording, events } = self;
        clock.advance_by(elapsed_ms, |_| run_tick(world, input, recording, events))
    }

    /// The page was hidden; the next callback only sets a new baseline.
    pub fn suspend(&mut self) {
        self.clock.reset_baseline();
    }

    /// Render frame at the clock's current blend factor.
    pub fn render(&self, visuals: &dyn VisualSource) -> RenderFrame {
        build_frame(&self.world, self.clock.interpolation() as f32, visuals)
    }

    /// Build the current frame and hand it to `renderer`.
    pub fn present(&self, renderer: &mut dyn Renderer, visuals: &dyn VisualSource) {
        renderer.draw_frame(&self.render(visuals));
    }

    /// The simulated world.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The clock.
    pub fn clock(&self) -> &FixedStepClock {
        &self.clock
    }

    /// Take events produced since the last call.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Stop and hand back the world and the recording.
    pub fn finish(self) -> (World, InputRecording) {
        (self.world, self.recording)
    }
}

fn run_tick<I: InputSource>(
    world: &mut World,
    input: &mut I,
    recording: &mut InputRecording,
    events: &mut Vec<GameEvent>,
) {
    let actions = input.sample(world.tick);
    recording.record(world.tick, actions);
    events.extend(tick(world, actions).events);
}

// =============================================================================
// REPLAY
// =============================================================================

/// Rebuild a world and re-run a recorded session.
///
/// Ticks before the recording's start run idle at the menu. From
/// `start_tick` up to (not including) `end_tick` each tick gets its
/// recorded actions, with recorded phase changes applied before the tick
/// they were made at. Changes made after the last tick are applied last.
pub fn replay(
    config: GameConfig,
    level: LevelData,
    recording: &InputRecording,
) -> Result<(World, Vec<GameEvent>), BuildError> {
    let mut world = World::new(config, level, recording.seed)?;
    let mut all_events = Vec::new();

    while world.tick < recording.start_tick {
        all_events.extend(tick(&mut world, ActionState::new()).events);
    }

    let mut phases = recording.phase_changes().iter().peekable();
    for (tick_no, actions) in recording.playback() {
        while let Some(change) = phases.next_if(|c| c.tick <= tick_no) {
            world.set_phase(change.phase);
        }
        all_events.extend(tick(&mut world, actions).events);
    }
    for change in phases {
        world.set_phase(change.phase);
    }

    debug!(
        ticks = world.tick,
        deltas = recording.delta_count(),
        "replayed recording"
    );
    Ok((world, all_events))
}

// =============================================================================
// TESTS
// =============================================================================
