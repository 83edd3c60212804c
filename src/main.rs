//! Grimwood Simulation Runner
//!
//! Runs a scripted session through the frame driver with uneven display
//! pacing, then replays the recorded input and checks the final state
//! hash matches.
//!
//! Usage: `grimwood-sim [config.json]`

use anyhow::{bail, Context};
use tracing::info;

use grimwood::{
    DeterministicRng, TICK_RATE, VERSION,
    game::{
        config::GameConfig,
        events::GameEventData,
        input::{ActionState, ScriptedInput},
        level::LevelData,
        render::{AllLoaded, RenderFrame, Renderer},
        state::{GamePhase, World},
        tick::{replay, Game},
    },
};

/// World seed for the demo session.
const SEED: u64 = 12345;

/// Give up after this much simulated wall-clock time.
const SESSION_LIMIT_MS: f64 = 120_000.0;

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Grimwood Simulation v{}", VERSION);
    info!("Tick Rate: {} Hz", TICK_RATE);

    let config = match std::env::args().nth(1) {
        Some(path) => GameConfig::load(&path).with_context(|| format!("loading config {path}"))?,
        None => GameConfig::default(),
    };

    demo_session(config)
}

/// Walk right through the level swinging and shooting, holding
/// interact so the chest opens as soon as it is in reach.
fn demo_script(t: u32) -> ActionState {
    let mut actions = ActionState::new();
    actions.set(ActionState::MOVE_RIGHT, true);
    actions.set(ActionState::JUMP, t % 150 < 2);
    actions.set(ActionState::MELEE, t % 45 == 20);
    actions.set(ActionState::SHOOT, t % 100 == 70);
    actions.set(ActionState::INTERACT, true);
    actions
}

/// Counts what would have been drawn.
#[derive(Default)]
struct StatsRenderer {
    frames: u64,
    sprites: u64,
    peak: usize,
}

impl Renderer for StatsRenderer {
    fn draw_frame(&mut self, frame: &RenderFrame) {
        self.frames += 1;
        self.sprites += frame.sprites.len() as u64;
        self.peak = self.peak.max(frame.sprites.len());
    }
}

fn demo_session(config: GameConfig) -> anyhow::Result<()> {
    info!("=== Starting Demo Session ===");
    info!("RNG Seed: {}", SEED);

    let world = World::new(config.clone(), LevelData::default_level(), SEED)
        .context("building world")?;
    let mut game = Game::new(world, ScriptedInput::new(demo_script));
    let mut renderer = StatsRenderer::default();

    // Display callbacks between 4ms and 40ms apart
    let mut pacing = DeterministicRng::for_stream(SEED, b"display");
    let mut now = 0.0;
    let mut next_frame = |now: &mut f64| {
        *now += pacing.range_f32(4.0, 40.0) as f64;
        *now
    };

    // Half a second at the title screen, then a second of intro dialogue
    while now < 500.0 {
        let t = next_frame(&mut now);
        game.frame(t);
        game.present(&mut renderer, &AllLoaded);
    }
    game.set_phase(GamePhase::Dialogue);
    while now < 1500.0 {
        let t = next_frame(&mut now);
        game.frame(t);
        game.present(&mut renderer, &AllLoaded);
    }
    game.start();

    let mut total_events = 0usize;
    let mut last_report_tick = 0;
    while now < SESSION_LIMIT_MS && game.world().phase() != GamePhase::GameOver {
        let t = next_frame(&mut now);
        game.frame(t);
        game.present(&mut renderer, &AllLoaded);

        for event in game.take_events() {
            total_events += 1;
            match event.data {
                GameEventData::EnemyKilled { enemy } => {
                    info!("Tick {}: enemy {} killed", event.tick, enemy.0);
                }
                GameEventData::ChestOpened { chest } => {
                    info!("Tick {}: chest {} opened", event.tick, chest.0);
                }
                GameEventData::ScrollRevealed { .. } => {
                    info!("Tick {}: scroll revealed", event.tick);
                }
                _ => {}
            }
        }

        let world = game.world();
        if world.tick - last_report_tick >= 10 * TICK_RATE {
            let player_x = world.registry().player().map_or(0.0, |p| p.body.x);
            info!(
                "Tick {}: player x {:.0}, {} enemies, {} entities, {} events so far",
                world.tick,
                player_x,
                world.registry().enemies().len(),
                world.registry().entity_count(),
                total_events
            );
            last_report_tick = world.tick;
        }
    }

    info!("=== Session Results ===");
    info!(
        "Rendered {} frames, {} sprites (peak {})",
        renderer.frames, renderer.sprites, renderer.peak
    );

    let (world, recording) = game.finish();
    let hash = world.compute_hash();
    info!("Final tick: {} ({:?})", world.tick, world.phase());
    info!("Final State Hash: {}", hex::encode(hash));
    info!(
        "Recording: {} ticks, {} deltas, {} phase changes, hash {}",
        recording.tick_count(),
        recording.delta_count(),
        recording.phase_changes().len(),
        hex::encode(&recording.hash()[..8])
    );

    info!("=== Verifying Determinism ===");
    let (replayed, _) = replay(config, LevelData::default_level(), &recording)
        .context("replaying recording")?;
    let replay_hash = replayed.compute_hash();
    info!("Replay State Hash: {}", hex::encode(replay_hash));

    if hash == replay_hash {
        info!("DETERMINISM VERIFIED: Hashes match!");
        Ok(())
    } else {
        bail!("DETERMINISM FAILURE: Hashes differ!")
    }
}
