//! Point-mass rocket: per-frame kinematics, hit-testing and fitness.
//!
//! Each frame the driver calls, in order: [`Rocket::decide_and_accelerate`]
//! (alive rockets only), [`Rocket::check_contacts`], then [`Rocket::step`].
//! Probes used by the contact checks are therefore the ones computed by the
//! previous frame's step (or at spawn for frame 0).

use crate::schema::{AgentView, Arena, RocketStatus, SimulationConfig};

use super::{EvolutionError, Genome};

/// Kinematic constants copied out of [`SimulationConfig`] at spawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kinematics {
    pub turn_step_degrees: f32,
    pub accel_step: f32,
    pub decel_step: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    pub capture_radius: f32,
    pub body_offset: (f32, f32),
    pub probe_radius: f32,
    pub probe_angles: [f32; 3],
}

impl From<&SimulationConfig> for Kinematics {
    fn from(config: &SimulationConfig) -> Self {
        Self {
            turn_step_degrees: config.turn_step_degrees,
            accel_step: config.accel_step,
            decel_step: config.decel_step,
            min_speed: config.min_speed,
            max_speed: config.max_speed,
            capture_radius: config.target_capture_radius,
            body_offset: config.body_offset,
            probe_radius: config.probe_radius,
            probe_angles: config.probe_angles,
        }
    }
}

/// A single agent, driven frame-by-frame by the genome it owns.
#[derive(Debug, Clone)]
pub struct Rocket {
    position: (f32, f32),
    center: (f32, f32),
    /// Degrees; positive turns left (counter-clockwise on screen).
    orientation: f32,
    speed: f32,
    probes: [(f32, f32); 3],
    status: RocketStatus,
    frames_survived: usize,
    fitness: f32,
    genome: Genome,
    body: Kinematics,
}

impl Rocket {
    /// Spawn a rocket at the configured start, at rest, facing +x.
    pub fn new(genome: Genome, config: &SimulationConfig) -> Self {
        let body = Kinematics::from(config);
        let mut rocket = Self {
            position: config.start_position,
            center: (0.0, 0.0),
            orientation: 0.0,
            speed: config.min_speed,
            probes: [(0.0, 0.0); 3],
            status: RocketStatus::Alive,
            frames_survived: 0,
            fitness: 0.0,
            genome,
            body,
        };
        rocket.refresh_body();
        rocket
    }

    pub fn position(&self) -> (f32, f32) {
        self.position
    }

    pub fn center(&self) -> (f32, f32) {
        self.center
    }

    pub fn orientation(&self) -> f32 {
        self.orientation
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn probes(&self) -> &[(f32, f32); 3] {
        &self.probes
    }

    pub fn status(&self) -> RocketStatus {
        self.status
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.status.is_alive()
    }

    pub fn reached_target(&self) -> bool {
        self.status == RocketStatus::ReachedTarget
    }

    /// Index of the last frame at which this rocket executed an action.
    pub fn frames_survived(&self) -> usize {
        self.frames_survived
    }

    pub fn fitness(&self) -> f32 {
        self.fitness
    }

    pub(crate) fn set_fitness(&mut self, fitness: f32) {
        self.fitness = fitness;
    }

    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    /// Apply the genome's action for `frame` and clamp the speed.
    pub fn decide_and_accelerate(&mut self, frame: usize) -> Result<(), EvolutionError> {
        if !self.is_alive() {
            return Err(EvolutionError::AgentNotAlive);
        }
        let action = self
            .genome
            .action(frame)
            .ok_or(EvolutionError::FrameOutOfRange {
                frame,
                length: self.genome.len(),
            })?;

        self.frames_survived = frame;

        if action.decelerate {
            self.speed -= self.body.decel_step;
        }
        if action.accelerate {
            self.speed += self.body.accel_step;
        }
        if action.turn_left {
            self.orientation += self.body.turn_step_degrees;
        }
        if action.turn_right {
            self.orientation -= self.body.turn_step_degrees;
        }

        self.speed = self.speed.clamp(self.body.min_speed, self.body.max_speed);
        Ok(())
    }

    /// Advance one frame along the current heading and recompute probes.
    ///
    /// Runs for dead rockets too; their speed is pinned to zero so their
    /// position is a fixed point.
    pub fn step(&mut self) {
        if !self.is_alive() {
            self.speed = 0.0;
        }
        self.orientation %= 360.0;

        let (dx, dy) = heading(self.orientation);
        self.position.0 += dx * self.speed;
        self.position.1 += dy * self.speed;
        self.refresh_body();
    }

    /// True if any probe is out of bounds or inside an obstacle.
    pub fn collides(&self, arena: &Arena) -> bool {
        self.probes.iter().any(|p| arena.is_blocked(*p))
    }

    /// True if any probe lies strictly within the capture radius of the target.
    pub fn touches_target(&self, target: (f32, f32)) -> bool {
        self.probes
            .iter()
            .any(|p| distance(*p, target) < self.body.capture_radius)
    }

    /// Crash the rocket if it collides. Returns whether a crash happened now.
    pub fn check_collision(&mut self, arena: &Arena) -> bool {
        if self.is_alive() && self.collides(arena) {
            self.finish(RocketStatus::Crashed);
            return true;
        }
        false
    }

    /// Mark arrival if a probe touches the target. Returns whether it arrived now.
    pub fn check_target(&mut self, target: (f32, f32)) -> bool {
        if self.is_alive() && self.touches_target(target) {
            self.finish(RocketStatus::ReachedTarget);
            return true;
        }
        false
    }

    /// Run both contact checks against the same probe positions.
    ///
    /// Both tests are evaluated; if both fire on the same frame the arrival
    /// wins. Terminal states are never overwritten.
    pub fn check_contacts(&mut self, arena: &Arena) -> RocketStatus {
        if self.is_alive() {
            let arrived = self.touches_target(arena.target);
            let crashed = self.collides(arena);
            if arrived {
                self.finish(RocketStatus::ReachedTarget);
            } else if crashed {
                self.finish(RocketStatus::Crashed);
            }
        }
        self.status
    }

    /// Score the rocket against the target and store the result.
    ///
    /// `(1/d)^2`, plus `(1/frames)^2` and doubled on arrival. Distance and
    /// frame count are floored at 1.
    pub fn compute_fitness(&mut self, target: (f32, f32)) -> f32 {
        let d = distance(self.center, target).max(1.0);
        let mut fitness = (1.0 / d).powi(2);

        if self.reached_target() {
            let frames = self.frames_survived.max(1) as f32;
            fitness += (1.0 / frames).powi(2);
            fitness *= 2.0;
        }

        self.fitness = fitness;
        fitness
    }

    /// Render-facing copy of the rocket's state.
    pub fn view(&self) -> AgentView {
        AgentView {
            position: self.position,
            center: self.center,
            orientation: self.orientation,
            speed: self.speed,
            status: self.status,
            probes: self.probes,
        }
    }

    fn finish(&mut self, status: RocketStatus) {
        self.status = status;
        self.speed = 0.0;
    }

    fn refresh_body(&mut self) {
        self.center = (
            self.position.0 + self.body.body_offset.0,
            self.position.1 + self.body.body_offset.1,
        );

        let base = (360.0 - self.orientation).to_radians();
        for (probe, angle) in self.probes.iter_mut().zip(self.body.probe_angles) {
            let a = base + angle.to_radians();
            *probe = (
                self.center.0 + a.cos() * self.body.probe_radius,
                self.center.1 + a.sin() * self.body.probe_radius,
            );
        }
    }
}

/// Unit heading for an orientation in degrees (screen space, y grows downward).
#[inline]
pub fn heading(orientation: f32) -> (f32, f32) {
    let a = (360.0 - orientation).to_radians();
    (a.cos(), a.sin())
}

#[inline]
pub fn distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::{Action, GenomeRng};
    use crate::schema::Obstacle;
    use proptest::prelude::*;

    fn config() -> SimulationConfig {
        SimulationConfig::default()
    }

    fn rocket_with(action: Action) -> Rocket {
        let config = config();
        Rocket::new(Genome::repeat(action, config.max_frames, 0.02), &config)
    }

    /// One frame of the generation loop for a single rocket.
    fn fly(rocket: &mut Rocket, arena: &Arena, frames: usize) {
        for frame in 0..frames {
            if rocket.is_alive() {
                rocket.decide_and_accelerate(frame).unwrap();
            }
            rocket.check_contacts(arena);
            rocket.step();
        }
    }

    #[test]
    fn test_spawn_state() {
        let rocket = rocket_with(Action::IDLE);
        assert_eq!(rocket.position(), (100.0, 300.0));
        assert_eq!(rocket.center(), (125.0, 325.0));
        assert_eq!(rocket.speed(), 0.0);
        assert!(rocket.is_alive());
        // Nose probe sits straight ahead of the center.
        let nose = rocket.probes()[0];
        assert!((nose.0 - 147.0).abs() < 1e-4);
        assert!((nose.1 - 325.0).abs() < 1e-4);
    }

    #[test]
    fn test_decide_applies_actions() {
        let mut rocket = rocket_with(Action {
            decelerate: true,
            accelerate: true,
            turn_left: true,
            turn_right: false,
        });
        rocket.decide_and_accelerate(0).unwrap();
        assert_eq!(rocket.speed(), 1.0);
        assert_eq!(rocket.orientation(), 15.0);
        assert_eq!(rocket.frames_survived(), 0);

        rocket.decide_and_accelerate(3).unwrap();
        assert_eq!(rocket.speed(), 2.0);
        assert_eq!(rocket.frames_survived(), 3);
    }

    #[test]
    fn test_left_and_right_cancel() {
        let mut rocket = rocket_with(Action {
            decelerate: false,
            accelerate: false,
            turn_left: true,
            turn_right: true,
        });
        rocket.decide_and_accelerate(0).unwrap();
        assert_eq!(rocket.orientation(), 0.0);
    }

    #[test]
    fn test_decide_preconditions() {
        let mut rocket = rocket_with(Action::THRUST);
        assert_eq!(
            rocket.decide_and_accelerate(500),
            Err(EvolutionError::FrameOutOfRange {
                frame: 500,
                length: 500
            })
        );

        rocket.finish(RocketStatus::Crashed);
        assert_eq!(
            rocket.decide_and_accelerate(0),
            Err(EvolutionError::AgentNotAlive)
        );
    }

    #[test]
    fn test_orientation_wraps_at_full_turn() {
        let mut rocket = rocket_with(Action {
            turn_left: true,
            ..Action::IDLE
        });
        for frame in 0..24 {
            rocket.decide_and_accelerate(frame).unwrap();
            rocket.step();
            assert!(rocket.orientation() > -360.0 && rocket.orientation() < 360.0);
        }
        assert_eq!(rocket.orientation(), 0.0);
    }

    #[test]
    fn test_orientation_wraps_turning_right() {
        let mut rocket = rocket_with(Action {
            turn_right: true,
            ..Action::IDLE
        });
        for frame in 0..23 {
            rocket.decide_and_accelerate(frame).unwrap();
            rocket.step();
        }
        assert_eq!(rocket.orientation(), -345.0);

        rocket.decide_and_accelerate(23).unwrap();
        assert_eq!(rocket.orientation(), -360.0);
        rocket.step();
        assert_eq!(rocket.orientation(), 0.0);
        // A full right turn ends facing +x again.
        let (dx, dy) = heading(rocket.orientation());
        assert!((dx - 1.0).abs() < 1e-6);
        assert!(dy.abs() < 1e-6);
    }

    #[test]
    fn test_left_turn_heads_up_screen() {
        let (dx, dy) = heading(90.0);
        assert!(dx.abs() < 1e-6);
        assert!((dy + 1.0).abs() < 1e-6);
        let (dx, dy) = heading(0.0);
        assert!((dx - 1.0).abs() < 1e-6);
        assert!(dy.abs() < 1e-6);
    }

    #[test]
    fn test_idle_rocket_never_moves() {
        let arena = Arena::default();
        let mut rocket = rocket_with(Action::IDLE);
        let start = rocket.position();

        fly(&mut rocket, &arena, 500);

        assert_eq!(rocket.speed(), 0.0);
        assert_eq!(rocket.position(), start);
        assert!(rocket.is_alive());
        assert!(!rocket.reached_target());

        let d = distance(rocket.center(), arena.target);
        let fitness = rocket.compute_fitness(arena.target);
        assert!((fitness - (1.0 / d).powi(2)).abs() < 1e-12);
    }

    #[test]
    fn test_full_thrust_reaches_target_ahead() {
        let arena = Arena::new(800.0, 600.0, (625.0, 325.0));
        let mut rocket = rocket_with(Action::THRUST);

        let distance_to_target = distance(rocket.center(), arena.target);
        let budget = (distance_to_target / 10.0).ceil() as usize;

        fly(&mut rocket, &arena, budget + 2);

        assert!(rocket.reached_target());
        let frames = rocket.frames_survived();
        assert!(frames <= budget + 1, "arrived at frame {frames}, budget {budget}");
        assert!(frames + 10 >= budget, "arrived implausibly early at {frames}");
    }

    #[test]
    fn test_obstacle_ahead_crashes() {
        let arena = Arena::default().with_obstacle(Obstacle {
            x: 160.0,
            y: 300.0,
            width: 40.0,
            height: 50.0,
        });
        let mut rocket = rocket_with(Action::THRUST);

        fly(&mut rocket, &arena, 10);

        assert_eq!(rocket.status(), RocketStatus::Crashed);
        assert_eq!(rocket.speed(), 0.0);
        assert!(rocket.frames_survived() < 10);
    }

    #[test]
    fn test_leaving_bounds_crashes_without_obstacles() {
        let arena = Arena::new(200.0, 600.0, (100.0, 550.0));
        let mut rocket = rocket_with(Action::THRUST);
        fly(&mut rocket, &arena, 30);
        assert_eq!(rocket.status(), RocketStatus::Crashed);
        assert!(rocket.probes()[0].0 <= 215.0);
    }

    #[test]
    fn test_dead_rocket_is_frozen() {
        let arena = Arena::default().with_obstacle(Obstacle {
            x: 160.0,
            y: 300.0,
            width: 40.0,
            height: 50.0,
        });
        let mut rocket = rocket_with(Action::THRUST);
        fly(&mut rocket, &arena, 10);
        assert!(!rocket.is_alive());

        let frozen = rocket.position();
        for _ in 0..50 {
            rocket.check_contacts(&arena);
            rocket.step();
            assert_eq!(rocket.position(), frozen);
        }
    }

    #[test]
    fn test_arrival_beats_collision_on_same_frame() {
        // Target sits inside an obstacle right at the nose probe.
        let arena = Arena::new(800.0, 600.0, (150.0, 325.0)).with_obstacle(Obstacle {
            x: 145.0,
            y: 320.0,
            width: 10.0,
            height: 10.0,
        });
        let mut rocket = rocket_with(Action::IDLE);
        assert!(rocket.collides(&arena));
        assert!(rocket.touches_target(arena.target));

        assert_eq!(rocket.check_contacts(&arena), RocketStatus::ReachedTarget);
        // Terminal: a later collision check cannot overwrite it.
        assert!(!rocket.check_collision(&arena));
        assert!(rocket.reached_target());
    }

    #[test]
    fn test_individual_checks_transition_once() {
        let arena = Arena::new(800.0, 600.0, (150.0, 325.0));
        let mut rocket = rocket_with(Action::IDLE);
        assert!(!rocket.check_collision(&arena));
        assert!(rocket.check_target(arena.target));
        assert!(!rocket.check_target(arena.target));
        assert_eq!(rocket.status(), RocketStatus::ReachedTarget);
    }

    #[test]
    fn test_fitness_decreases_with_distance() {
        let target = (700.0, 300.0);
        let mut near = rocket_with(Action::IDLE);
        let mut far = rocket_with(Action::IDLE);
        near.center = (600.0, 300.0);
        far.center = (300.0, 300.0);
        assert!(near.compute_fitness(target) > far.compute_fitness(target));
    }

    #[test]
    fn test_arrival_bonus() {
        let target = (700.0, 300.0);
        let mut arrived = rocket_with(Action::IDLE);
        let mut missed = rocket_with(Action::IDLE);
        for r in [&mut arrived, &mut missed] {
            r.center = (690.0, 300.0);
            r.frames_survived = 120;
        }
        arrived.status = RocketStatus::ReachedTarget;
        let a = arrived.compute_fitness(target);
        let m = missed.compute_fitness(target);
        assert!(a > m);
        let expected = ((1.0f32 / 10.0).powi(2) + (1.0f32 / 120.0).powi(2)) * 2.0;
        assert!((a - expected).abs() < 1e-9);
    }

    #[test]
    fn test_fitness_floors_zero_distance_and_frames() {
        let mut rocket = rocket_with(Action::IDLE);
        let target = rocket.center();
        rocket.status = RocketStatus::ReachedTarget;
        rocket.frames_survived = 0;
        let fitness = rocket.compute_fitness(target);
        assert!(fitness.is_finite());
        assert_eq!(fitness, 4.0);
    }

    proptest! {
        #[test]
        fn prop_speed_stays_clamped(seed in any::<u64>(), frames in 1usize..500) {
            let config = config();
            let genome = GenomeRng::new(seed).random_genome(config.max_frames, 0.02);
            let mut rocket = Rocket::new(genome, &config);
            for frame in 0..frames {
                rocket.decide_and_accelerate(frame).unwrap();
                prop_assert!(rocket.speed() >= config.min_speed);
                prop_assert!(rocket.speed() <= config.max_speed);
                rocket.step();
            }
        }
    }
}
