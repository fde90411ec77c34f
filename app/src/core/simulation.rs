use models::schemas::game::Direction;
use rand::{Rng, SeedableRng, rngs::StdRng};

pub const FIELD_WIDTH: f64 = 100.0;
pub const FIELD_HEIGHT: f64 = 100.0;

pub const PADDLE_WIDTH: f64 = 3.0;
pub const PADDLE_HEIGHT: f64 = 25.0;
pub const PADDLE_SPEED: f64 = 1.0;
const PADDLE_INSET: f64 = 1.0;

pub const BALL_RADIUS: f64 = 1.5;
pub const BALL_SPEED: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Paddle {
    pub x: f64,
    y: f64,
    pub width: f64,
    pub height: f64,
    pub direction: Direction,
    pub speed: f64,
}

impl Paddle {
    fn new(x: f64) -> Self {
        let mut paddle = Self {
            x,
            y: FIELD_HEIGHT / 2.0,
            width: PADDLE_WIDTH,
            height: PADDLE_HEIGHT,
            direction: Direction::Stop,
            speed: PADDLE_SPEED,
        };
        paddle.clamp();
        paddle
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    fn top(&self) -> f64 {
        self.y - self.height / 2.0
    }

    fn bottom(&self) -> f64 {
        self.y + self.height / 2.0
    }

    fn advance(&mut self) {
        match self.direction {
            Direction::Up => self.y -= self.speed,
            Direction::Down => self.y += self.speed,
            Direction::Stop => {}
        }
        self.clamp();
    }

    fn clamp(&mut self) {
        let half = self.height / 2.0;
        self.y = self.y.clamp(half, FIELD_HEIGHT - half);
    }
}

#[derive(Debug, Clone)]
pub struct Ball {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub x_speed: f64,
    pub y_speed: f64,
}

impl Ball {
    fn launch(rng: &mut impl Rng) -> Self {
        let mut ball = Self {
            x: FIELD_WIDTH / 2.0,
            y: FIELD_HEIGHT / 2.0,
            radius: BALL_RADIUS,
            x_speed: BALL_SPEED,
            y_speed: BALL_SPEED,
        };
        ball.reset(rng);
        ball
    }

    /// Back to the center with a fresh direction on each axis.
    fn reset(&mut self, rng: &mut impl Rng) {
        self.x = FIELD_WIDTH / 2.0;
        self.y = FIELD_HEIGHT / 2.0;
        self.x_speed = BALL_SPEED * random_sign(rng);
        self.y_speed = BALL_SPEED * random_sign(rng);
    }

    fn advance(&mut self) {
        self.x += self.x_speed;
        self.y += self.y_speed;
    }

    fn overlaps_vertically(&self, paddle: &Paddle) -> bool {
        self.y + self.radius >= paddle.top() && self.y - self.radius <= paddle.bottom()
    }

    /// Flips vertical velocity when the ball is entering the paddle through
    /// its top or bottom edge.
    fn deflect_off_edges(&mut self, paddle: &Paddle) {
        let above = self.y < paddle.top();
        let below = self.y > paddle.bottom();
        if (above && self.y_speed > 0.0) || (below && self.y_speed < 0.0) {
            self.y_speed = -self.y_speed;
        }
    }
}

fn random_sign(rng: &mut impl Rng) -> f64 {
    if rng.random_bool(0.5) { -1.0 } else { 1.0 }
}

/// One contest on the normalized 100 x 100 field. Up is towards y = 0.
pub struct Simulation {
    left: Paddle,
    right: Paddle,
    ball: Ball,
    left_score: u32,
    right_score: u32,
    winning_score: u32,
    finished: bool,
    decided_by: Option<Side>,
    rng: StdRng,
}

impl Simulation {
    pub fn new(winning_score: u32) -> Self {
        Self::with_rng(winning_score, StdRng::from_os_rng())
    }

    pub fn seeded(winning_score: u32, seed: u64) -> Self {
        Self::with_rng(winning_score, StdRng::seed_from_u64(seed))
    }

    fn with_rng(winning_score: u32, mut rng: StdRng) -> Self {
        Self {
            left: Paddle::new(PADDLE_INSET),
            right: Paddle::new(FIELD_WIDTH - PADDLE_INSET),
            ball: Ball::launch(&mut rng),
            left_score: 0,
            right_score: 0,
            winning_score,
            finished: false,
            decided_by: None,
            rng,
        }
    }

    pub fn left(&self) -> &Paddle {
        &self.left
    }

    pub fn right(&self) -> &Paddle {
        &self.right
    }

    pub fn ball(&self) -> &Ball {
        &self.ball
    }

    pub fn scores(&self) -> (u32, u32) {
        (self.left_score, self.right_score)
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// The side whose score reached the threshold, if play decided the match.
    pub fn decided_by(&self) -> Option<Side> {
        self.decided_by
    }

    /// Strictly higher scorer; `None` on equal scores.
    pub fn leader(&self) -> Option<Side> {
        use std::cmp::Ordering;
        match self.left_score.cmp(&self.right_score) {
            Ordering::Greater => Some(Side::Left),
            Ordering::Less => Some(Side::Right),
            Ordering::Equal => None,
        }
    }

    pub fn set_direction(&mut self, side: Side, direction: Direction) {
        match side {
            Side::Left => self.left.direction = direction,
            Side::Right => self.right.direction = direction,
        }
    }

    /// Advances one tick and reports whether the contest is over.
    pub fn step(&mut self) -> bool {
        if self.finished {
            return true;
        }

        self.left.advance();
        self.right.advance();
        self.ball.advance();
        self.resolve_collisions();
        self.check_score();

        self.finished
    }

    /// Credits a point to `side` with the same consequences as the ball
    /// leaving the field on the opponent's end.
    pub fn award_point(&mut self, side: Side) -> bool {
        if self.finished {
            return true;
        }

        let score = match side {
            Side::Left => &mut self.left_score,
            Side::Right => &mut self.right_score,
        };
        *score += 1;

        if *score >= self.winning_score {
            self.finished = true;
            self.decided_by = Some(side);
        }

        self.ball.reset(&mut self.rng);
        self.finished
    }

    /// Ends the contest with the scores as they stand.
    pub fn force_finish(&mut self) {
        self.finished = true;
    }

    fn resolve_collisions(&mut self) {
        let ball = &mut self.ball;

        let left = &self.left;
        let reaches_left =
            ball.x - ball.radius <= left.x + left.width / 2.0 && ball.x > left.x;
        if reaches_left && ball.overlaps_vertically(left) {
            if ball.x_speed < 0.0 {
                ball.x_speed = -ball.x_speed;
            }
            ball.deflect_off_edges(left);
        }

        let right = &self.right;
        let reaches_right =
            ball.x + ball.radius >= right.x - right.width / 2.0 && ball.x < right.x;
        if reaches_right && ball.overlaps_vertically(right) {
            if ball.x_speed > 0.0 {
                ball.x_speed = -ball.x_speed;
            }
            ball.deflect_off_edges(right);
        }

        if ball.y_speed < 0.0 && ball.y - ball.radius < 0.0 {
            ball.y_speed = -ball.y_speed;
        }
        if ball.y_speed > 0.0 && ball.y + ball.radius > FIELD_HEIGHT {
            ball.y_speed = -ball.y_speed;
        }
    }

    fn check_score(&mut self) {
        if self.ball.x < 0.0 {
            self.award_point(Side::Right);
        } else if self.ball.x > FIELD_WIDTH {
            self.award_point(Side::Left);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sim() -> Simulation {
        Simulation::seeded(5, 7)
    }

    fn assert_at_center(ball: &Ball) {
        assert_eq!((ball.x, ball.y), (FIELD_WIDTH / 2.0, FIELD_HEIGHT / 2.0));
        assert_eq!(ball.x_speed.abs(), BALL_SPEED);
        assert_eq!(ball.y_speed.abs(), BALL_SPEED);
    }

    #[test]
    fn paddles_never_leave_the_field() {
        let mut sim = sim();
        sim.set_direction(Side::Left, Direction::Up);
        sim.set_direction(Side::Right, Direction::Down);
        for _ in 0..200 {
            sim.left.advance();
            sim.right.advance();
        }
        assert_eq!(sim.left().y(), PADDLE_HEIGHT / 2.0);
        assert_eq!(sim.right().y(), FIELD_HEIGHT - PADDLE_HEIGHT / 2.0);
    }

    #[test]
    fn invariants_hold_over_long_play() {
        let mut sim = Simulation::seeded(5, 42);
        for tick in 0..20_000u32 {
            let left = if tick % 240 < 120 { Direction::Up } else { Direction::Down };
            let right = match tick % 90 {
                0..30 => Direction::Down,
                30..60 => Direction::Stop,
                _ => Direction::Up,
            };
            sim.set_direction(Side::Left, left);
            sim.set_direction(Side::Right, right);

            let before = sim.scores();
            let finished = sim.step();
            let (l, r) = sim.scores();

            for paddle in [sim.left(), sim.right()] {
                assert!(paddle.y() >= PADDLE_HEIGHT / 2.0);
                assert!(paddle.y() <= FIELD_HEIGHT - PADDLE_HEIGHT / 2.0);
            }
            assert!(l >= before.0 && r >= before.1);
            assert_eq!(finished, l >= 5 || r >= 5);
            if (l, r) != before && !finished {
                assert_at_center(sim.ball());
            }
            if finished {
                break;
            }
        }
    }

    #[test]
    fn ball_past_left_edge_scores_for_right() {
        let mut sim = sim();
        sim.ball.x = 0.2;
        sim.ball.y = 5.0;
        sim.ball.x_speed = -BALL_SPEED;
        sim.ball.y_speed = BALL_SPEED;

        assert!(!sim.step());
        assert_eq!(sim.scores(), (0, 1));
        assert_at_center(sim.ball());
    }

    #[test]
    fn ball_past_right_edge_scores_for_left() {
        let mut sim = sim();
        sim.ball.x = 99.8;
        sim.ball.y = 95.0;
        sim.ball.x_speed = BALL_SPEED;
        sim.ball.y_speed = -BALL_SPEED;

        sim.step();
        assert_eq!(sim.scores(), (1, 0));
    }

    #[test]
    fn paddle_face_reflects_ball() {
        let mut sim = sim();
        sim.ball.x = 3.5;
        sim.ball.y = 50.0;
        sim.ball.x_speed = -BALL_SPEED;
        sim.ball.y_speed = BALL_SPEED;

        sim.step();
        assert!(sim.ball().x_speed > 0.0);
        assert!(sim.ball().y_speed > 0.0);

        sim.ball.x = 96.5;
        sim.ball.y = 50.0;
        sim.ball.x_speed = BALL_SPEED;
        sim.step();
        assert!(sim.ball().x_speed < 0.0);
    }

    #[test]
    fn paddle_top_edge_reflects_downward_ball() {
        let mut sim = sim();
        // Left paddle spans 37.5..62.5; the ball clips its top corner.
        sim.ball.x = 2.4;
        sim.ball.y = 36.0;
        sim.ball.x_speed = -BALL_SPEED;
        sim.ball.y_speed = BALL_SPEED;

        sim.step();
        assert!(sim.ball().y_speed < 0.0);
    }

    #[test]
    fn paddle_bottom_edge_reflects_upward_ball() {
        let mut sim = sim();
        // Right paddle spans 37.5..62.5.
        sim.ball.x = 97.6;
        sim.ball.y = 64.0;
        sim.ball.x_speed = BALL_SPEED;
        sim.ball.y_speed = -BALL_SPEED;

        sim.step();
        assert!(sim.ball().y_speed > 0.0);
        assert!(sim.ball().x_speed < 0.0);
    }

    #[test]
    fn walls_reflect_vertical_motion() {
        let mut sim = sim();
        sim.ball.x = 50.0;
        sim.ball.y = 1.0;
        sim.ball.y_speed = -BALL_SPEED;
        sim.step();
        assert!(sim.ball().y_speed > 0.0);

        sim.ball.y = 99.0;
        sim.step();
        assert!(sim.ball().y_speed < 0.0);
    }

    #[test]
    fn reaching_the_threshold_finishes_and_freezes() {
        let mut sim = sim();
        for _ in 0..4 {
            assert!(!sim.award_point(Side::Left));
        }
        sim.award_point(Side::Right);
        assert!(sim.award_point(Side::Left));
        assert_eq!(sim.scores(), (5, 1));
        assert_eq!(sim.decided_by(), Some(Side::Left));
        assert_eq!(sim.leader(), Some(Side::Left));

        let ball = sim.ball().clone();
        assert!(sim.step());
        assert!(sim.award_point(Side::Right));
        assert_eq!(sim.scores(), (5, 1));
        assert_eq!((sim.ball().x, sim.ball().y), (ball.x, ball.y));
    }

    #[test]
    fn forced_finish_on_equal_scores_has_no_leader() {
        let mut sim = sim();
        sim.award_point(Side::Left);
        sim.award_point(Side::Right);
        sim.force_finish();
        assert!(sim.step());
        assert_eq!(sim.leader(), None);
        assert_eq!(sim.decided_by(), None);
    }
}
