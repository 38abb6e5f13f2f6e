//! Capture handling and the challenge state machine
//!
//! A running tick captures at most one target. Matches feed the active
//! challenge; completing it rotates the challenge, possibly promotes the
//! tier, and suspends the session behind a notification.

use super::collision::find_capture;
use super::state::{GameEvent, GameOverCause, Session};
use crate::consts::*;

impl Session {
    /// Capture the first target under the head (if any) and apply its effects
    pub(crate) fn check_collisions(&mut self) {
        if !self.is_running() {
            return;
        }
        let now = self.clock;
        let Some(hit) = find_capture(self.chain.head(), self.targets.live(), now) else {
            return;
        };
        let Some(target) = self.targets.kill(hit.slot) else {
            return;
        };
        let (id, kind) = (target.id, target.kind);

        if kind == self.challenge.criterion {
            self.challenge.got += 1;
            self.score += SCORE_PER_CORRECT;
            self.chain.pulse_good_until = now + PULSE_GOOD_SECS;

            let params = self.params();
            let (bonus, cap) = (params.time_bonus_per_correct, params.timer_start);
            if bonus > 0.0 {
                self.time_left = (self.time_left + bonus).min(cap);
            }

            self.events.push(GameEvent::Captured {
                id,
                position: hit.position,
                matched: true,
                penalized: false,
            });

            if self.challenge.is_complete() {
                self.complete_challenge();
            }
            return;
        }

        if self.chain.in_wrong_grace(now) {
            // Same overlap as the last wrong hit
            self.events.push(GameEvent::Captured {
                id,
                position: hit.position,
                matched: false,
                penalized: false,
            });
            return;
        }

        self.chain.wrong_grace_until = now + WRONG_GRACE_SECS;
        self.chain.flash_wrong_until = now + FLASH_WRONG_SECS;
        let (length_penalty, time_penalty) = {
            let params = self.params();
            (params.wrong_penalty, params.time_penalty_wrong)
        };
        let vanished = self.chain.apply_penalty(length_penalty);

        self.events.push(GameEvent::Captured {
            id,
            position: hit.position,
            matched: false,
            penalized: true,
        });

        if vanished {
            self.end(GameOverCause::Vanished);
            return;
        }
        if time_penalty > 0.0 {
            self.time_left = (self.time_left - time_penalty).max(0.0);
        }
    }

    /// Rotate to a new challenge
    fn complete_challenge(&mut self) {
        self.completed += 1;
        self.maybe_promote();

        for _ in 0..COMPLETION_BURST {
            self.spawn_random();
        }

        let reward = self.params().challenge_reward;
        self.chain.apply_reward(reward);
        self.challenge_index += 1;

        self.roll_challenge();
        self.guarantee_matches();

        log::info!(
            "Challenge {} complete: score={} tier={} next=\"{}\"",
            self.completed,
            self.score,
            self.tier.as_str(),
            self.challenge.label()
        );
        self.events.push(GameEvent::ChallengeCompleted {
            completed: self.completed,
        });
        self.announce_challenge();
    }

    /// Step up one tier when the completed count reaches the current tier's
    /// threshold. Returns true on promotion.
    fn maybe_promote(&mut self) -> bool {
        let Some(next) = self.tuning.progression.promote(self.tier, self.completed) else {
            return false;
        };
        let from = self.tier;
        self.tier = next;
        self.time_left = self.params().timer_start;

        log::info!(
            "Promoted {} -> {} after {} challenges",
            from.as_str(),
            next.as_str(),
            self.completed
        );
        self.events.push(GameEvent::TierPromoted { from, to: next });
        self.notify(format!("Difficulty up: {}", next.display_name()));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::drift::Drift;
    use crate::sim::state::{Board, GamePhase, Hue, Kind};
    use crate::tuning::{Tier, Tuning};
    use proptest::prelude::*;

    fn running(tier: Tier, seed: u64) -> Session {
        let mut session = Session::new(Tuning::default(), tier, Board::new(900.0, 640.0), seed);
        session.resume();
        session.drain_events();
        session
    }

    /// Same size and shape, different hue
    fn other_kind(kind: Kind) -> Kind {
        let hue = if kind.hue == Hue::Red { Hue::Blue } else { Hue::Red };
        Kind { hue, ..kind }
    }

    fn drop_on_head(session: &mut Session, kind: Kind) -> usize {
        let head = session.chain.head();
        session.insert_target(kind, head, Drift::STILL)
    }

    #[test]
    fn test_match_scores_and_pulses() {
        let mut session = running(Tier::Normal, 1);
        session.clock = 2.0;
        session.time_left = 10.0;
        let criterion = session.challenge.criterion;
        let slot = drop_on_head(&mut session, criterion);

        session.check_collisions();

        assert!(!session.targets.get(slot).unwrap().alive);
        assert_eq!(session.challenge.got, 1);
        assert_eq!(session.score, SCORE_PER_CORRECT);
        assert_eq!(session.time_left, 11.0);
        assert!((session.chain.pulse_good_until - (2.0 + PULSE_GOOD_SECS)).abs() < 1e-6);
        assert!(matches!(
            session.drain_events().as_slice(),
            [GameEvent::Captured { matched: true, .. }]
        ));
    }

    #[test]
    fn test_easy_three_matches_complete_challenge() {
        let mut session = running(Tier::Easy, 2);
        let criterion = session.challenge.criterion;
        let base = session.chain.base_length;
        session.chain.length = base * 0.5;
        for _ in 0..3 {
            drop_on_head(&mut session, criterion);
        }

        // Overlapping targets: one capture per call
        session.check_collisions();
        assert_eq!(session.challenge.got, 1);
        session.check_collisions();
        session.check_collisions();

        assert_eq!(session.score, 30);
        assert_eq!(session.time_left, 30.0);
        assert_eq!(session.completed, 1);
        assert_eq!(session.challenge_index, 1);
        assert_eq!(session.challenge.got, 0);
        assert!((session.chain.length - base * 0.85).abs() < 1e-3);
        assert_eq!(session.phase, GamePhase::Suspended);
        assert!(session.count_matches() >= REQUIRED_MATCHES);

        let events = session.drain_events();
        assert!(events.contains(&GameEvent::ChallengeCompleted { completed: 1 }));
        assert!(matches!(events.last(), Some(GameEvent::Notify { .. })));
    }

    #[test]
    fn test_overlapping_wrong_targets_penalize_once() {
        let mut session = running(Tier::Normal, 3);
        session.clock = 5.0;
        let wrong = other_kind(session.challenge.criterion);
        drop_on_head(&mut session, wrong);
        drop_on_head(&mut session, wrong);
        let base = session.chain.base_length;
        let time = session.time_left;

        session.check_collisions();
        session.check_collisions();

        assert!((session.chain.length - base * 0.9).abs() < 1e-3);
        assert_eq!(session.time_left, time - 1.0);
        assert!(session.chain.in_wrong_grace(5.1));
        assert!(!session.chain.in_wrong_grace(5.4));

        let penalized: Vec<bool> = session
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                GameEvent::Captured { penalized, .. } => Some(penalized),
                _ => None,
            })
            .collect();
        assert_eq!(penalized, vec![true, false]);
    }

    #[test]
    fn test_older_target_wins_over_reused_slot() {
        let mut session = running(Tier::Normal, 11);
        let criterion = session.challenge.criterion;
        let older = drop_on_head(&mut session, other_kind(criterion));
        assert_ne!(older, 0);
        let older_id = session.targets.get(older).unwrap().id;

        // Free the lowest slot, then spawn a matching target into it
        assert!(session.targets.kill(0).is_some());
        let newer = drop_on_head(&mut session, criterion);
        assert_eq!(newer, 0);

        session.check_collisions();

        assert!(!session.targets.get(older).unwrap().alive);
        assert!(session.targets.get(newer).unwrap().alive);
        assert_eq!(session.challenge.got, 0);
        assert!(matches!(
            session.drain_events().as_slice(),
            [GameEvent::Captured { id, matched: false, penalized: true, .. }] if *id == older_id
        ));
    }

    #[test]
    fn test_wrong_hit_time_penalty_floors_at_zero() {
        let mut session = running(Tier::Hard, 4);
        session.time_left = 0.5;
        let wrong = other_kind(session.challenge.criterion);
        drop_on_head(&mut session, wrong);
        session.check_collisions();
        assert_eq!(session.time_left, 0.0);
        // Zero time is caught by the countdown, not here
        assert!(session.is_running());
    }

    #[test]
    fn test_vanish_ends_once() {
        let mut session = running(Tier::Normal, 5);
        session.chain.length = session.chain.base_length * 0.05;
        let wrong = other_kind(session.challenge.criterion);
        drop_on_head(&mut session, wrong);
        drop_on_head(&mut session, wrong);
        session.clock = 1.0;
        session.check_collisions();
        session.clock = 2.0;
        session.check_collisions();

        assert_eq!(
            session.phase,
            GamePhase::GameOver {
                cause: GameOverCause::Vanished
            }
        );
        let game_overs = session
            .drain_events()
            .iter()
            .filter(|e| matches!(e, GameEvent::GameOver { .. }))
            .count();
        assert_eq!(game_overs, 1);
        // The second target was never reached
        assert_eq!(session.targets.live().filter(|(_, t)| t.kind == wrong).count(), 1);
    }

    #[test]
    fn test_promotion_at_threshold() {
        for time_before in [29.0, 3.0] {
            let mut session = running(Tier::Easy, 6);
            session.completed = 14;
            session.challenge_index = 14;
            session.time_left = time_before;
            let criterion = session.challenge.criterion;
            for _ in 0..3 {
                drop_on_head(&mut session, criterion);
                session.check_collisions();
            }

            assert_eq!(session.tier, Tier::Normal);
            assert_eq!(session.completed, 15);
            assert_eq!(session.time_left, 25.0);

            let events = session.drain_events();
            let promotions: Vec<_> = events
                .iter()
                .filter(|e| matches!(e, GameEvent::TierPromoted { .. }))
                .collect();
            assert_eq!(
                promotions,
                vec![&GameEvent::TierPromoted {
                    from: Tier::Easy,
                    to: Tier::Normal
                }]
            );
            assert!(events.iter().any(|e| matches!(
                e,
                GameEvent::Notify { text, .. } if text == "Difficulty up: Normal"
            )));

            // Next completion stays in normal
            session.resume();
            let criterion = session.challenge.criterion;
            for _ in 0..3 {
                drop_on_head(&mut session, criterion);
                session.check_collisions();
            }
            assert_eq!(session.tier, Tier::Normal);
            assert!(
                !session
                    .drain_events()
                    .iter()
                    .any(|e| matches!(e, GameEvent::TierPromoted { .. }))
            );
        }
    }

    #[test]
    fn test_hard_never_promotes() {
        let mut session = running(Tier::Hard, 7);
        session.completed = 500;
        assert!(!session.maybe_promote());
        assert_eq!(session.tier, Tier::Hard);
    }

    #[test]
    fn test_suspended_session_captures_nothing() {
        let mut session = Session::new(Tuning::default(), Tier::Normal, Board::new(900.0, 640.0), 8);
        let criterion = session.challenge.criterion;
        let slot = drop_on_head(&mut session, criterion);
        session.check_collisions();
        assert!(session.targets.get(slot).unwrap().alive);
        assert_eq!(session.score, 0);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_length_capped_and_vanish_fires_once(
            seed in any::<u64>(),
            ops in prop::collection::vec(any::<bool>(), 1..40),
        ) {
            let mut session = running(Tier::Hard, seed);
            session.time_left = 1000.0;
            let base = session.chain.base_length;
            let wrong = other_kind(session.challenge.criterion);
            let mut vanished = false;

            for reward in ops {
                if reward {
                    let fraction = session.params().challenge_reward;
                    session.chain.apply_reward(fraction);
                } else {
                    // Step past the previous grace window so every hit counts
                    session.clock += 1.0;
                    drop_on_head(&mut session, wrong);
                    let before = session.chain.length;
                    session.check_collisions();
                    if session.is_running() {
                        prop_assert!(session.chain.length < before);
                    }
                }
                prop_assert!(session.chain.length <= base);
                vanished |= session.chain.length <= 0.0;
                prop_assert_eq!(session.is_over(), vanished);
            }

            let game_overs = session
                .drain_events()
                .iter()
                .filter(|e| matches!(e, GameEvent::GameOver { cause: GameOverCause::Vanished, .. }))
                .count();
            prop_assert_eq!(game_overs, usize::from(vanished));
        }
    }
}
