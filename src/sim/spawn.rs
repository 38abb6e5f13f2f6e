//! Target spawning: rejection-sampled placement, board seeding, density
//! maintenance and the matching guarantee.

use glam::Vec2;
use rand::Rng;

use super::collision::{circle_overlaps_rect, distance_to_polyline};
use super::drift::Drift;
use super::state::{Board, Challenge, GameEvent, Kind, Session, TargetArena};
use crate::consts::*;

/// Everything a placement has to keep clear of
#[derive(Debug, Clone, Copy)]
pub struct PlacementContext<'a> {
    pub board: &'a Board,
    pub targets: &'a TargetArena,
    /// Chain points, head first
    pub chain: &'a [Vec2],
    /// Largest drift amplitude the active tier can hand out
    pub max_amp: f32,
}

impl PlacementContext<'_> {
    /// Check a candidate anchor for a target of drawn radius `radius`
    pub fn can_place_at(&self, pos: Vec2, radius: f32) -> bool {
        let envelope = radius + self.max_amp;
        let bbox_radius = envelope + PLACEMENT_PADDING;

        // Board edges
        if pos.x < bbox_radius
            || pos.x > self.board.width - bbox_radius
            || pos.y < bbox_radius
            || pos.y > self.board.height - bbox_radius
        {
            return false;
        }

        // Other targets' static envelopes
        if self
            .targets
            .live()
            .any(|(_, other)| pos.distance(other.anchor) < bbox_radius + other.bbox_radius)
        {
            return false;
        }

        // Chain body, head excluded
        if self.chain.len() > 2
            && distance_to_polyline(pos, &self.chain[1..]) - envelope < TAIL_CLEARANCE
        {
            return false;
        }

        // UI chrome
        !self
            .board
            .exclusions()
            .iter()
            .any(|rect| circle_overlaps_rect(pos, envelope, rect))
    }

    /// Up to [`ATTEMPTS_PER_SPAWN`] uniform trials inside the edge margin.
    /// `None` is a soft failure; the caller simply tries again next tick.
    pub fn try_place<R: Rng + ?Sized>(&self, rng: &mut R, radius: f32) -> Option<Vec2> {
        let margin = radius + self.max_amp + PLACEMENT_PADDING;
        let (min_x, max_x) = (margin, self.board.width - margin);
        let (min_y, max_y) = (margin, self.board.height - margin);
        if min_x > max_x || min_y > max_y {
            return None; // Board smaller than one envelope
        }

        (0..ATTEMPTS_PER_SPAWN).find_map(|_| {
            let candidate = Vec2::new(
                rng.random_range(min_x..=max_x),
                rng.random_range(min_y..=max_y),
            );
            self.can_place_at(candidate, radius).then_some(candidate)
        })
    }
}

impl Session {
    fn placement(&self) -> PlacementContext<'_> {
        PlacementContext {
            board: &self.board,
            targets: &self.targets,
            chain: &self.chain.segments,
            max_amp: self.params().drift.amp_max,
        }
    }

    /// Place one target of `kind` with a drift drawn from the current ramp.
    /// Returns its arena slot.
    pub fn spawn_target(&mut self, kind: Kind) -> Option<usize> {
        let radius = self.board.target_radius(kind.size);
        let range = self.ramped().drift;
        let ctx = PlacementContext {
            board: &self.board,
            targets: &self.targets,
            chain: &self.chain.segments,
            max_amp: self.params().drift.amp_max,
        };
        let anchor = ctx.try_place(&mut self.rng, radius)?;
        let drift = Drift::random(&mut self.rng, &range);
        Some(self.insert_target(kind, anchor, drift))
    }

    pub fn spawn_random(&mut self) -> Option<usize> {
        let kind = Kind::random(&mut self.rng);
        self.spawn_target(kind)
    }

    /// Whether a target of `kind` could be placed at `pos` right now
    pub fn can_place(&self, kind: Kind, pos: Vec2) -> bool {
        self.placement()
            .can_place_at(pos, self.board.target_radius(kind.size))
    }

    /// Start a fresh challenge with a random criterion
    pub fn roll_challenge(&mut self) {
        self.challenge = Challenge::new(Kind::random(&mut self.rng));
    }

    /// Replace the criterion with one that differs from both the current
    /// criterion and `avoid`
    fn reroll_challenge(&mut self, avoid: Kind) {
        let current = self.challenge.criterion;
        let criterion = loop {
            let kind = Kind::random_except(&mut self.rng, current);
            if kind != avoid {
                break kind;
            }
        };
        log::debug!(
            "Criterion starved, rerolled to {}",
            Challenge::new(criterion).label()
        );
        self.challenge = Challenge::new(criterion);
        self.events.push(GameEvent::CriterionRerolled { criterion });
    }

    /// Make sure the board offers [`REQUIRED_MATCHES`] targets of the active
    /// criterion. A criterion that cannot be placed is swapped for another
    /// rather than waited on; once the reroll budget is spent the criterion
    /// has changed and the routine stops for this rotation.
    pub fn guarantee_matches(&mut self) {
        let rolled = self.challenge.criterion;
        let mut failures = 0;
        let mut rerolls = 0;

        while self.count_matches() < REQUIRED_MATCHES {
            if self.spawn_target(self.challenge.criterion).is_some() {
                failures = 0;
                continue;
            }
            failures += 1;
            if failures < GUARANTEE_FAILURE_LIMIT {
                continue;
            }
            if rerolls >= MAX_CRITERION_REROLLS {
                log::warn!(
                    "Matching guarantee gave up after {} rerolls ({} matches on board)",
                    rerolls,
                    self.count_matches()
                );
                return;
            }
            self.reroll_challenge(rolled);
            rerolls += 1;
            failures = 0;
        }
    }

    /// One seeding batch. Seeding ends at density, or as soon as a whole
    /// batch fails to place anything.
    pub(crate) fn seed_step(&mut self) {
        let mut placed = 0;
        for _ in 0..SEED_BATCH {
            if self.targets.alive_count() >= self.target_density {
                break;
            }
            if self.spawn_random().is_some() {
                placed += 1;
            }
        }

        if self.targets.alive_count() >= self.target_density {
            self.seeding = false;
            log::debug!("Seeding done: {} targets", self.targets.alive_count());
        } else if placed == 0 {
            self.seeding = false;
            log::debug!(
                "Seeding exhausted at {}/{} targets",
                self.targets.alive_count(),
                self.target_density
            );
        }
    }

    /// Top the board back up toward its density, a few spawns per tick
    pub(crate) fn maintain_density(&mut self) {
        for _ in 0..DENSITY_BATCH {
            if self.targets.alive_count() >= self.target_density {
                return;
            }
            self.spawn_random();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::collision::{Rect, distance_to_segment};
    use crate::sim::state::{Hue, Shape, Size};
    use crate::tuning::{Tier, Tuning};
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn seeded_session(width: f32, height: f32, seed: u64) -> Session {
        let board = Board::new(width, height).with_exclusion(Rect::new(0.0, 0.0, width, 60.0));
        let mut session = Session::new(Tuning::default(), Tier::Normal, board, seed);
        while session.seeding {
            session.seed_step();
        }
        session
    }

    /// Recheck all four placement rules from scratch
    fn violations(session: &Session, anchor: Vec2, radius: f32) -> Vec<&'static str> {
        let amp = session.params().drift.amp_max;
        let envelope = radius + amp;
        let bbox = envelope + PLACEMENT_PADDING;
        let board = &session.board;
        let mut out = Vec::new();

        if anchor.x < bbox
            || anchor.y < bbox
            || anchor.x > board.width - bbox
            || anchor.y > board.height - bbox
        {
            out.push("edge");
        }
        for target in session.targets.slots().iter().filter(|t| t.alive) {
            if anchor.distance(target.anchor) < bbox + target.bbox_radius {
                out.push("target");
            }
        }
        let segs = &session.chain.segments;
        if segs.len() > 2 {
            let mut nearest = f32::INFINITY;
            for i in 1..segs.len() - 1 {
                nearest = nearest.min(distance_to_segment(anchor, segs[i], segs[i + 1]));
            }
            if nearest - envelope < TAIL_CLEARANCE {
                out.push("tail");
            }
        }
        for rect in board.exclusions() {
            let grown = rect.inflate(envelope);
            let inside_grown = grown.contains(anchor);
            let corner = Vec2::new(
                anchor.x.clamp(rect.left, rect.right),
                anchor.y.clamp(rect.top, rect.bottom),
            );
            if inside_grown && anchor.distance(corner) < envelope {
                out.push("exclusion");
            }
        }
        out
    }

    #[test]
    fn test_placement_rejects_each_constraint() {
        let session = seeded_session(900.0, 640.0, 7);
        let kind = Kind::new(Size::Medium, Hue::Blue, Shape::Circle);

        // Off the edge
        assert!(!session.can_place(kind, Vec2::new(5.0, 300.0)));
        // Inside the exclusion strip
        assert!(!session.can_place(kind, Vec2::new(450.0, 70.0)));
        // On top of a live target
        let (_, existing) = session.targets.live().next().expect("seeded board");
        assert!(!session.can_place(kind, existing.anchor));
        // On the chain body
        let body = session.chain.segments[10];
        assert!(!session.can_place(kind, body));
    }

    #[test]
    fn test_placement_on_empty_board() {
        let board = Board::new(800.0, 600.0);
        let targets = TargetArena::new();
        let ctx = PlacementContext {
            board: &board,
            targets: &targets,
            chain: &[],
            max_amp: 25.0,
        };
        assert!(ctx.can_place_at(Vec2::new(400.0, 300.0), 16.0));
        // 16 + 25 + 6 = 47 from the edge
        assert!(ctx.can_place_at(Vec2::new(47.0, 47.0), 16.0));
        assert!(!ctx.can_place_at(Vec2::new(46.0, 300.0), 16.0));

        let mut rng = Pcg32::seed_from_u64(1);
        let tiny = Board::new(60.0, 60.0);
        let ctx = PlacementContext {
            board: &tiny,
            ..ctx
        };
        assert!(ctx.try_place(&mut rng, 16.0).is_none());
    }

    #[test]
    fn test_seeding_reaches_density_in_batches() {
        let board = Board::new(900.0, 640.0);
        let mut session = Session::new(Tuning::default(), Tier::Easy, board, 99);
        let density = session.target_density;
        assert_eq!(density, MAX_TARGETS);

        let before = session.targets.alive_count();
        session.seed_step();
        assert!(session.targets.alive_count() <= before + SEED_BATCH);

        let mut batches = 1;
        while session.seeding && batches < 100 {
            session.seed_step();
            batches += 1;
        }
        assert!(!session.seeding);
        assert!(session.targets.alive_count() <= density);
    }

    #[test]
    fn test_maintain_density_is_throttled() {
        let mut session = seeded_session(1280.0, 800.0, 4);
        let slots: Vec<usize> = session.targets.live().map(|(slot, _)| slot).take(5).collect();
        for slot in slots {
            session.targets.kill(slot);
        }
        let before = session.targets.alive_count();
        session.maintain_density();
        assert!(session.targets.alive_count() <= before + DENSITY_BATCH);
        assert!(session.targets.alive_count() <= session.target_density);
    }

    #[test]
    fn test_crowded_board_rerolls_criterion() {
        // Every candidate lands on the chain body, so nothing can be placed
        let mut session = Session::new(Tuning::default(), Tier::Normal, Board::new(100.0, 100.0), 8);
        session.drain_events();

        session.roll_challenge();
        let rolled = session.challenge.criterion;
        session.guarantee_matches();

        assert_ne!(session.challenge.criterion, rolled);
        let rerolls = session
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::CriterionRerolled { .. }))
            .count();
        assert_eq!(rerolls, MAX_CRITERION_REROLLS as usize);
    }

    #[test]
    fn test_guarantee_places_exact_kind() {
        let mut session = seeded_session(1280.0, 800.0, 21);
        session.roll_challenge();
        session.guarantee_matches();
        assert!(session.count_matches() >= REQUIRED_MATCHES);
        let criterion = session.challenge.criterion;
        assert!(
            session
                .targets
                .live()
                .filter(|(_, t)| t.kind == criterion)
                .all(|(_, t)| t.radius == session.board.target_radius(criterion.size))
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_placements_satisfy_all_constraints(
            seed in any::<u64>(),
            width in 480.0f32..1600.0,
            height in 480.0f32..1000.0,
        ) {
            let mut session = seeded_session(width, height, seed);
            for _ in 0..20 {
                let kind = Kind::random(&mut session.rng);
                let radius = session.board.target_radius(kind.size);
                let ctx = session.placement();
                let mut rng = session.rng.clone();
                if let Some(anchor) = ctx.try_place(&mut rng, radius) {
                    let failed = violations(&session, anchor, radius);
                    prop_assert!(failed.is_empty(), "{:?} violated at {:?}", failed, anchor);
                    let range = session.ramped().drift;
                    session.insert_target(kind, anchor, Drift::random(&mut rng, &range));
                }
                session.rng = rng;
            }
        }

        #[test]
        fn prop_guarantee_holds_or_criterion_changes(
            seed in any::<u64>(),
            stress in 0usize..80,
        ) {
            let mut session = seeded_session(640.0, 480.0, seed);
            for _ in 0..stress {
                session.spawn_random();
            }
            session.roll_challenge();
            let rolled = session.challenge.criterion;
            session.guarantee_matches();
            prop_assert!(
                session.count_matches() >= REQUIRED_MATCHES
                    || session.challenge.criterion != rolled
            );
        }
    }
}
