//! Game state and core simulation types
//!
//! The [`Session`] aggregate owns every entity. Nothing in the simulation
//! reaches outside it; hosts read it for rendering and feed it input.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::Rect;
use super::drift::Drift;
use super::ramp::RampedParams;
use crate::consts::*;
use crate::tuning::{Tier, TierParams, Tuning};

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Running,
    /// Waiting for the host to report that a notification expired
    Suspended,
    /// Session ended
    GameOver { cause: GameOverCause },
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOverCause {
    /// Chain length ran out
    Vanished,
    /// Countdown ran out
    TimeUp,
}

impl GameOverCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameOverCause::Vanished => "Snake vanished",
            GameOverCause::TimeUp => "Time up",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Size {
    Small,
    Medium,
    Large,
}

impl Size {
    pub const ALL: [Size; 3] = [Size::Small, Size::Medium, Size::Large];

    /// Radius on a mid-sized board (scaled by [`Board::radius_scale`])
    pub fn base_radius(&self) -> f32 {
        match self {
            Size::Small => 10.0,
            Size::Medium => 16.0,
            Size::Large => 23.0,
        }
    }

    /// Capture radius as a fraction of the drawn radius.
    /// Small targets get a generous hit area, large ones a tighter one.
    pub fn capture_fraction(&self) -> f32 {
        match self {
            Size::Small => 1.12,
            Size::Medium => 0.92,
            Size::Large => 0.85,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Size::Small => "Small",
            Size::Medium => "Medium",
            Size::Large => "Large",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hue {
    Blue,
    Pink,
    Yellow,
    Green,
    Red,
}

impl Hue {
    pub const ALL: [Hue; 5] = [Hue::Blue, Hue::Pink, Hue::Yellow, Hue::Green, Hue::Red];

    pub fn display_name(&self) -> &'static str {
        match self {
            Hue::Blue => "Blue",
            Hue::Pink => "Pink",
            Hue::Yellow => "Yellow",
            Hue::Green => "Green",
            Hue::Red => "Red",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shape {
    Circle,
    Triangle,
    Square,
}

impl Shape {
    pub const ALL: [Shape; 3] = [Shape::Circle, Shape::Triangle, Shape::Square];

    pub fn display_name(&self) -> &'static str {
        match self {
            Shape::Circle => "Circle",
            Shape::Triangle => "Triangle",
            Shape::Square => "Square",
        }
    }
}

/// Visual classification of a target; also used as the challenge criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Kind {
    pub size: Size,
    pub hue: Hue,
    pub shape: Shape,
}

impl Kind {
    pub fn new(size: Size, hue: Hue, shape: Shape) -> Self {
        Self { size, hue, shape }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            size: Size::ALL[rng.random_range(0..Size::ALL.len())],
            hue: Hue::ALL[rng.random_range(0..Hue::ALL.len())],
            shape: Shape::ALL[rng.random_range(0..Shape::ALL.len())],
        }
    }

    /// Random kind guaranteed to differ from `other` in at least one attribute
    pub fn random_except<R: Rng + ?Sized>(rng: &mut R, other: Kind) -> Self {
        loop {
            let kind = Self::random(rng);
            if kind != other {
                return kind;
            }
        }
    }
}

/// A drifting target (bubble)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    pub id: u32,
    pub kind: Kind,
    /// Center of the drift oscillation
    pub anchor: Vec2,
    pub drift: Drift,
    /// Drawn radius
    pub radius: f32,
    /// Radius + padding + max drift amplitude at spawn time
    pub bbox_radius: f32,
    pub alive: bool,
}

impl Target {
    /// Drifted position at simulation time `t`
    #[inline]
    pub fn position(&self, t: f32) -> Vec2 {
        self.drift.position(self.anchor, t)
    }

    #[inline]
    pub fn capture_radius(&self) -> f32 {
        self.kind.size.capture_fraction() * self.radius
    }

    #[inline]
    pub fn matches(&self, criterion: &Kind) -> bool {
        self.kind == *criterion
    }
}

/// Slot-stable target storage.
///
/// Captured targets are tombstoned in place; their slots are handed out again
/// to later spawns. Iteration visits live targets in spawn order, so a reused
/// low slot never jumps ahead of an older target.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetArena {
    slots: Vec<Target>,
    free: Vec<usize>,
    /// Live slots, oldest spawn first
    order: Vec<usize>,
}

impl TargetArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a live target, reusing a tombstoned slot when one exists
    pub fn insert(&mut self, target: Target) -> usize {
        debug_assert!(target.alive);
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = target;
                slot
            }
            None => {
                self.slots.push(target);
                self.slots.len() - 1
            }
        };
        self.order.push(slot);
        slot
    }

    /// Tombstone a live target. Returns `None` for empty or already dead slots.
    pub fn kill(&mut self, slot: usize) -> Option<&Target> {
        let target = self.slots.get_mut(slot)?;
        if !target.alive {
            return None;
        }
        target.alive = false;
        self.free.push(slot);
        self.order.retain(|&s| s != slot);
        Some(&self.slots[slot])
    }

    pub fn get(&self, slot: usize) -> Option<&Target> {
        self.slots.get(slot)
    }

    /// Live targets with their slot index, oldest spawn first
    pub fn live(&self) -> impl Iterator<Item = (usize, &Target)> + '_ {
        self.order.iter().map(|&slot| (slot, &self.slots[slot]))
    }

    /// Every slot, dead ones included
    pub fn slots(&self) -> &[Target] {
        &self.slots
    }

    pub fn alive_count(&self) -> usize {
        self.order.len()
    }
}

/// Logical play area plus the UI rectangles spawns must avoid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    pub width: f32,
    pub height: f32,
    exclusions: Vec<Rect>,
}

impl Board {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
            exclusions: Vec::new(),
        }
    }

    pub fn with_exclusion(mut self, rect: Rect) -> Self {
        self.exclusions.push(rect);
        self
    }

    /// Replace the UI exclusion zones (recomputed by the host on layout change)
    pub fn set_exclusions(&mut self, rects: Vec<Rect>) {
        self.exclusions = rects;
    }

    pub fn exclusions(&self) -> &[Rect] {
        &self.exclusions
    }

    pub fn min_side(&self) -> f32 {
        self.width.min(self.height)
    }

    /// Target size scale: smaller boards get smaller bubbles
    pub fn radius_scale(&self) -> f32 {
        let base = self.min_side();
        if base <= 500.0 {
            0.8
        } else if base <= 900.0 {
            1.0
        } else {
            1.2
        }
    }

    pub fn target_radius(&self, size: Size) -> f32 {
        size.base_radius() * self.radius_scale()
    }

    /// How many live targets the board should carry
    pub fn target_density(&self) -> usize {
        let by_area = ((self.width * self.height) / AREA_PER_TARGET).floor() as usize;
        by_area.clamp(MIN_TARGETS, MAX_TARGETS)
    }
}

/// Render hint for the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainTint {
    /// Criterion hue
    Normal,
    /// Just took a wrong hit
    FlashWrong,
    /// Just made a matching capture
    PulseGood,
}

/// The player's chain (snake). Segment 0 is the head.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chain {
    pub segments: Vec<Vec2>,
    /// Current length budget (segment count follows it)
    pub length: f32,
    /// Length at session start; rewards never exceed it
    pub base_length: f32,
    /// Head speed before the autonomy coefficient
    pub speed: f32,
    /// Unit heading
    pub heading: Vec2,
    pub drag_target: Option<Vec2>,
    pub pointer_down: bool,
    pub wrong_grace_until: f32,
    pub flash_wrong_until: f32,
    pub pulse_good_until: f32,
}

impl Chain {
    /// Straight chain lying leftwards from (0.5 W, 0.6 H), heading up
    pub fn new(board: &Board, speed: f32) -> Self {
        let base_length =
            (board.min_side() * BASE_LENGTH_FRACTION).clamp(MIN_BASE_LENGTH, MAX_BASE_LENGTH);
        let count = ((base_length / SEGMENT_SPACING).ceil() as usize).max(2);
        let origin = Vec2::new(board.width * 0.5, board.height * 0.6);
        let segments = (0..count)
            .map(|i| origin - Vec2::new(i as f32 * SEGMENT_SPACING, 0.0))
            .collect();

        Self {
            segments,
            length: base_length,
            base_length,
            speed,
            heading: Vec2::new(0.0, -1.0),
            drag_target: None,
            pointer_down: false,
            wrong_grace_until: 0.0,
            flash_wrong_until: 0.0,
            pulse_good_until: 0.0,
        }
    }

    #[inline]
    pub fn head(&self) -> Vec2 {
        self.segments[0]
    }

    pub fn set_drag_target(&mut self, point: Vec2) {
        self.drag_target = Some(point);
    }

    pub fn clear_drag_target(&mut self) {
        self.drag_target = None;
    }

    pub fn set_pointer_down(&mut self, down: bool) {
        self.pointer_down = down;
    }

    /// Shrink by `fraction` of the baseline. Returns true once the chain has vanished.
    pub fn apply_penalty(&mut self, fraction: f32) -> bool {
        self.length -= fraction * self.base_length;
        self.length <= 0.0
    }

    /// Grow by `fraction` of the baseline, never past the baseline
    pub fn apply_reward(&mut self, fraction: f32) {
        self.length = (self.length + fraction * self.base_length).min(self.base_length);
    }

    pub fn in_wrong_grace(&self, now: f32) -> bool {
        now < self.wrong_grace_until
    }

    pub fn tint(&self, now: f32) -> ChainTint {
        if now < self.flash_wrong_until {
            ChainTint::FlashWrong
        } else if now < self.pulse_good_until {
            ChainTint::PulseGood
        } else {
            ChainTint::Normal
        }
    }
}

/// Active matching criterion and progress toward it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    pub criterion: Kind,
    pub needed: u32,
    pub got: u32,
}

impl Challenge {
    pub fn new(criterion: Kind) -> Self {
        Self {
            criterion,
            needed: CHALLENGE_SIZE,
            got: 0,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.got >= self.needed
    }

    /// Progress in [0, 1] for the progress bar
    pub fn progress(&self) -> f32 {
        if self.needed == 0 {
            1.0
        } else {
            (self.got as f32 / self.needed as f32).min(1.0)
        }
    }

    /// e.g. "Collect 3 Small Blue Circles"
    pub fn label(&self) -> String {
        let shape = self.criterion.shape.display_name();
        let plural = if shape.ends_with('s') { "" } else { "s" };
        format!(
            "Collect {} {} {} {}{}",
            self.needed,
            self.criterion.size.display_name(),
            self.criterion.hue.display_name(),
            shape,
            plural
        )
    }
}

/// Things that happened during a tick, drained by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Captured {
        id: u32,
        position: Vec2,
        matched: bool,
        /// False for wrong hits swallowed by the grace window
        penalized: bool,
    },
    ChallengeCompleted { completed: u32 },
    TierPromoted { from: Tier, to: Tier },
    CriterionRerolled { criterion: Kind },
    /// Show `text` for `duration_ms`, then call [`Session::resume`]
    Notify { text: String, duration_ms: u32 },
    GameOver { cause: GameOverCause, score: u64 },
}

/// Complete session state (deterministic for a given seed and input stream)
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub seed: u64,
    #[serde(skip)]
    pub(crate) rng: Pcg32,
    pub tuning: Tuning,
    /// Tier the session was started in (restored by [`Session::reset`])
    pub start_tier: Tier,
    pub tier: Tier,
    pub phase: GamePhase,
    pub board: Board,
    pub chain: Chain,
    pub targets: TargetArena,
    pub challenge: Challenge,
    /// Countdown (seconds)
    pub time_left: f32,
    pub score: u64,
    /// Challenges completed since the session started; drives promotion
    pub completed: u32,
    /// Drives the difficulty ramps; never reset by promotion
    pub challenge_index: u32,
    /// Simulation clock (seconds); frozen while suspended
    pub clock: f32,
    /// True until the initial board has reached density
    pub seeding: bool,
    pub target_density: usize,
    #[serde(skip)]
    pub events: Vec<GameEvent>,
    next_id: u32,
}

impl Session {
    /// Start a session in `tier`. The session opens suspended on the first
    /// challenge's notification; the board fills in over the next frames.
    pub fn new(tuning: Tuning, tier: Tier, board: Board, seed: u64) -> Self {
        Self::with_rng(tuning, tier, board, seed, Pcg32::seed_from_u64(seed))
    }

    fn with_rng(tuning: Tuning, tier: Tier, board: Board, seed: u64, mut rng: Pcg32) -> Self {
        let params = tuning.params(tier);
        let chain = Chain::new(&board, params.start_speed);
        let time_left = params.timer_start;
        let challenge = Challenge::new(Kind::random(&mut rng));
        let target_density = board.target_density();

        log::info!(
            "New session: tier={} seed={} board={}x{} density={}",
            tier.as_str(),
            seed,
            board.width,
            board.height,
            target_density
        );

        let mut session = Self {
            seed,
            rng,
            tuning,
            start_tier: tier,
            tier,
            phase: GamePhase::Running,
            board,
            chain,
            targets: TargetArena::new(),
            challenge,
            time_left,
            score: 0,
            completed: 0,
            challenge_index: 0,
            clock: 0.0,
            seeding: true,
            target_density,
            events: Vec::new(),
            next_id: 1,
        };

        session.guarantee_matches();
        session.announce_challenge();
        session
    }

    /// Throw away the chain, targets and timers and start over from the
    /// starting tier. The RNG stream carries on so restarts differ.
    pub fn reset(&mut self) {
        let rng = self.rng.clone();
        let fresh = Self::with_rng(
            self.tuning.clone(),
            self.start_tier,
            self.board.clone(),
            self.seed,
            rng,
        );
        *self = fresh;
    }

    /// Parameters of the active tier
    pub fn params(&self) -> &TierParams {
        self.tuning.params(self.tier)
    }

    /// Ramp-interpolated values for the current challenge index
    pub fn ramped(&self) -> RampedParams {
        RampedParams::at(&self.tuning, self.tier, self.challenge_index)
    }

    pub fn is_running(&self) -> bool {
        self.phase == GamePhase::Running
    }

    pub fn is_over(&self) -> bool {
        matches!(self.phase, GamePhase::GameOver { .. })
    }

    /// Notification expired: continue play with a full countdown
    pub fn resume(&mut self) {
        if self.phase == GamePhase::Suspended {
            self.phase = GamePhase::Running;
            self.time_left = self.params().timer_start;
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Store a target at `anchor` without any placement checks
    pub fn insert_target(&mut self, kind: Kind, anchor: Vec2, drift: Drift) -> usize {
        let radius = self.board.target_radius(kind.size);
        let bbox_radius = radius + PLACEMENT_PADDING + self.params().drift.amp_max;
        let id = self.next_entity_id();
        self.targets.insert(Target {
            id,
            kind,
            anchor,
            drift,
            radius,
            bbox_radius,
            alive: true,
        })
    }

    /// Live targets matching the active criterion
    pub fn count_matches(&self) -> usize {
        let criterion = self.challenge.criterion;
        self.targets
            .live()
            .filter(|(_, t)| t.matches(&criterion))
            .count()
    }

    /// Drifted positions of live targets at the current clock
    pub fn target_positions(&self) -> impl Iterator<Item = (&Target, Vec2)> + '_ {
        let now = self.clock;
        self.targets.live().map(move |(_, t)| (t, t.position(now)))
    }

    /// Take the events produced since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Queue a notification and suspend until the host resumes
    pub(crate) fn notify(&mut self, text: String) {
        self.events.push(GameEvent::Notify {
            text,
            duration_ms: NOTIFY_MS,
        });
        if self.is_running() {
            self.phase = GamePhase::Suspended;
        }
    }

    pub(crate) fn announce_challenge(&mut self) {
        let label = self.challenge.label();
        self.notify(label);
    }

    /// End the session. Only the first fatal condition is recorded.
    pub(crate) fn end(&mut self, cause: GameOverCause) {
        if self.is_over() {
            return;
        }
        log::info!(
            "Game over ({}): score={} completed={} tier={}",
            cause.as_str(),
            self.score,
            self.completed,
            self.tier.as_str()
        );
        self.phase = GamePhase::GameOver { cause };
        self.events.push(GameEvent::GameOver {
            cause,
            score: self.score,
        });
    }
}
