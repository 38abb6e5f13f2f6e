//! Neon Snake entry point
//!
//! Headless runner: plays one session with an autopilot standing in for the
//! pointer and prints a JSON summary.
//!
//! Usage: `neon-snake [--tier easy|normal|hard] [--seed N] [--seconds S] [--config tuning.json]`

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::{Path, PathBuf};
    use std::process::ExitCode;
    use std::time::{SystemTime, UNIX_EPOCH};

    use clap::{Parser, ValueEnum};
    use glam::Vec2;
    use serde::Serialize;

    use neon_snake::sim::{Board, GameEvent, GamePhase, Rect, Session, TickInput, tick};
    use neon_snake::{ConfigError, Tier, Tuning};

    const FRAME_DT: f32 = 1.0 / 60.0;
    const BOARD_WIDTH: f32 = 1280.0;
    const BOARD_HEIGHT: f32 = 800.0;
    /// HUD strip across the top (criterion, timer, score)
    const HUD_HEIGHT: f32 = 72.0;
    /// Press the pointer once the head is this close to its target
    const PRESS_DISTANCE: f32 = 120.0;

    #[derive(Parser, Debug)]
    #[command(name = "neon-snake")]
    #[command(about = "Play one seeded Neon Snake session with an autopilot and print a JSON summary")]
    struct Cli {
        /// Starting difficulty tier
        #[arg(long, value_enum, default_value_t = CliTier::Normal)]
        tier: CliTier,
        /// RNG seed (defaults to the current time)
        #[arg(long)]
        seed: Option<u64>,
        /// Simulated seconds to play before stopping
        #[arg(long, default_value_t = 120.0, value_parser = parse_seconds)]
        seconds: f32,
        /// Tuning file (JSON) overriding the built-in difficulty table
        #[arg(long)]
        config: Option<PathBuf>,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
    enum CliTier {
        Easy,
        Normal,
        Hard,
    }

    impl From<CliTier> for Tier {
        fn from(value: CliTier) -> Self {
            match value {
                CliTier::Easy => Tier::Easy,
                CliTier::Normal => Tier::Normal,
                CliTier::Hard => Tier::Hard,
            }
        }
    }

    fn parse_seconds(s: &str) -> Result<f32, String> {
        s.parse::<f32>()
            .ok()
            .filter(|v| v.is_finite() && *v > 0.0)
            .ok_or_else(|| format!("expected a positive number of seconds, got {s:?}"))
    }

    fn time_seed() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0)
    }

    fn load_tuning(path: Option<&Path>) -> Result<Tuning, String> {
        let Some(path) = path else {
            return Ok(Tuning::default());
        };
        let json = std::fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()))?;
        Tuning::from_json(&json).map_err(|e: ConfigError| format!("{}: {e}", path.display()))
    }

    /// Steer toward the nearest live target matching the criterion, pressing
    /// the pointer for the final approach
    fn autopilot(session: &Session) -> TickInput {
        let head = session.chain.head();
        let criterion = session.challenge.criterion;
        let nearest = session
            .target_positions()
            .filter(|(target, _)| target.matches(&criterion))
            .map(|(_, pos)| pos)
            .min_by(|a, b| head.distance(*a).total_cmp(&head.distance(*b)));

        match nearest {
            Some(pos) => TickInput {
                drag_target: Some(pos),
                pointer_down: head.distance(pos) < PRESS_DISTANCE,
            },
            None => TickInput {
                drag_target: Some(Vec2::new(BOARD_WIDTH * 0.5, BOARD_HEIGHT * 0.5)),
                pointer_down: false,
            },
        }
    }

    /// Countdown for the notification on screen. A newer notification replaces
    /// the current one instead of queueing behind it.
    #[derive(Debug, Default)]
    struct Toast {
        left_ms: i64,
    }

    impl Toast {
        fn show(&mut self, duration_ms: u32) {
            self.left_ms = i64::from(duration_ms);
        }

        /// Returns true once the toast has expired
        fn elapse(&mut self, dt: f32) -> bool {
            self.left_ms = (self.left_ms - (dt * 1000.0) as i64).max(0);
            self.left_ms == 0
        }
    }

    #[derive(Debug, Default, Serialize)]
    struct Summary {
        seed: u64,
        start_tier: &'static str,
        final_tier: &'static str,
        outcome: String,
        seconds_played: f32,
        score: u64,
        challenges_completed: u32,
        matched_captures: u32,
        wrong_hits: u32,
        forgiven_hits: u32,
        promotions: u32,
        rerolls: u32,
        final_length: f32,
        base_length: f32,
    }

    pub fn run() -> ExitCode {
        env_logger::init();

        let cli = Cli::parse();
        let tier = Tier::from(cli.tier);
        let seed = cli.seed.unwrap_or_else(time_seed);
        let tuning = match load_tuning(cli.config.as_deref()) {
            Ok(tuning) => tuning,
            Err(e) => {
                log::error!("Failed to load tuning: {e}");
                return ExitCode::FAILURE;
            }
        };

        log::info!("Neon Snake (headless) starting...");
        let board = Board::new(BOARD_WIDTH, BOARD_HEIGHT)
            .with_exclusion(Rect::new(0.0, 0.0, BOARD_WIDTH, HUD_HEIGHT));
        let mut session = Session::new(tuning, tier, board, seed);

        let mut summary = Summary {
            seed,
            start_tier: tier.as_str(),
            ..Default::default()
        };
        let mut toast = Toast::default();
        let frames = (cli.seconds / FRAME_DT).ceil() as u64;

        for frame in 0..frames {
            let input = autopilot(&session);
            tick(&mut session, &input, FRAME_DT);

            for event in session.drain_events() {
                match event {
                    GameEvent::Captured {
                        matched, penalized, ..
                    } => match (matched, penalized) {
                        (true, _) => summary.matched_captures += 1,
                        (false, true) => summary.wrong_hits += 1,
                        (false, false) => summary.forgiven_hits += 1,
                    },
                    GameEvent::ChallengeCompleted { .. } => {}
                    GameEvent::TierPromoted { .. } => summary.promotions += 1,
                    GameEvent::CriterionRerolled { .. } => summary.rerolls += 1,
                    GameEvent::Notify { text, duration_ms } => {
                        log::info!("[notify] {text}");
                        toast.show(duration_ms);
                    }
                    GameEvent::GameOver { cause, score } => {
                        log::info!("{} (score {score})", cause.as_str());
                    }
                }
            }

            if session.phase == GamePhase::Suspended && toast.elapse(FRAME_DT) {
                session.resume();
            }

            summary.seconds_played = (frame + 1) as f32 * FRAME_DT;
            if session.is_over() {
                break;
            }
        }

        summary.final_tier = session.tier.as_str();
        summary.outcome = match session.phase {
            GamePhase::GameOver { cause } => cause.as_str().to_string(),
            _ => "Still running".to_string(),
        };
        summary.score = session.score;
        summary.challenges_completed = session.completed;
        summary.final_length = session.chain.length;
        summary.base_length = session.chain.base_length;

        match serde_json::to_string_pretty(&summary) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                log::error!("Failed to encode summary: {e}");
                ExitCode::FAILURE
            }
        }
    }

}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    native::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The simulation is a library on the web; hosts drive `sim::tick` themselves
}
