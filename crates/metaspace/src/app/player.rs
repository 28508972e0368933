use engine::{Direction, Vec2};
use serde::{Deserialize, Serialize};

pub(crate) const AVATAR_VARIANTS: u8 = 4;
/// Remotes holding no update for this long drop back to idle animation.
pub(crate) const REMOTE_STALE_AFTER_SECONDS: f32 = 0.25;
const WALK_FRAME_SECONDS: f32 = 0.15;

const FNV1A_OFFSET_BASIS_64: u64 = 0xcbf2_9ce4_8422_2325;
const FNV1A_PRIME_64: u64 = 0x0000_0100_0000_01b3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum PlayerStatus {
    #[default]
    Online,
    Away,
    Busy,
}

/// Authoritative per-participant state. For the local player it is written
/// directly from input; for remotes it tracks the last received values.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PlayerState {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) position: Vec2,
    pub(crate) direction: Direction,
    pub(crate) moving: bool,
    pub(crate) map_id: String,
    pub(crate) status: PlayerStatus,
    pub(crate) local: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AnimationAction {
    Idle,
    Walk,
}

impl AnimationAction {
    fn as_str(self) -> &'static str {
        match self {
            AnimationAction::Idle => "idle",
            AnimationAction::Walk => "walk",
        }
    }

    fn frame_count(self) -> u32 {
        match self {
            AnimationAction::Idle => 1,
            AnimationAction::Walk => 2,
        }
    }
}

pub(crate) fn direction_token(direction: Direction) -> &'static str {
    match direction {
        Direction::Up => "up",
        Direction::Down => "down",
        Direction::Left => "left",
        Direction::Right => "right",
    }
}

/// (variant, action, direction) triple that selects an animation clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AnimationKey {
    pub(crate) variant: u8,
    pub(crate) action: AnimationAction,
    pub(crate) direction: Direction,
}

impl AnimationKey {
    pub(crate) fn frame_sprite_key(&self, frame: u32) -> String {
        format!(
            "avatars/v{}/{}_{}_{}",
            self.variant,
            self.action.as_str(),
            direction_token(self.direction),
            frame
        )
    }

    pub(crate) fn frame_count(&self) -> u32 {
        self.action.frame_count()
    }
}

/// Stable variant choice so a participant looks the same on every peer.
pub(crate) fn variant_for_id(id: &str) -> u8 {
    let mut hash = FNV1A_OFFSET_BASIS_64;
    for byte in id.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV1A_PRIME_64);
    }
    (hash % u64::from(AVATAR_VARIANTS)) as u8
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct RemoteMotion {
    from: Vec2,
    to: Vec2,
    elapsed: f32,
    duration: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PlayerEntity {
    state: PlayerState,
    displayed: Vec2,
    motion: Option<RemoteMotion>,
    seconds_since_remote_update: f32,
    variant: u8,
    current_clip: Option<AnimationKey>,
    clip_time_seconds: f32,
}

impl PlayerEntity {
    pub(crate) fn new(state: PlayerState) -> Self {
        let displayed = state.position;
        let variant = variant_for_id(&state.id);
        Self {
            state,
            displayed,
            motion: None,
            seconds_since_remote_update: 0.0,
            variant,
            current_clip: None,
            clip_time_seconds: 0.0,
        }
    }

    /// Immutable snapshot, never a live reference.
    pub(crate) fn state(&self) -> PlayerState {
        self.state.clone()
    }

    pub(crate) fn id(&self) -> &str {
        &self.state.id
    }

    pub(crate) fn variant(&self) -> u8 {
        self.variant
    }

    pub(crate) fn displayed_position(&self) -> Vec2 {
        self.displayed
    }

    pub(crate) fn set_status(&mut self, status: PlayerStatus) {
        self.state.status = status;
    }

    /// Local movement is authoritative and takes effect immediately.
    pub(crate) fn apply_local_input(&mut self, position: Vec2, direction: Direction, moving: bool) {
        self.state.position = position;
        self.state.direction = direction;
        self.state.moving = moving;
        self.displayed = position;
    }

    /// A remote position report starts an interpolation from the currently
    /// displayed position, so motion stays smooth between discrete updates.
    pub(crate) fn apply_remote_move(&mut self, target: Vec2, interval_seconds: f32) {
        self.motion = Some(RemoteMotion {
            from: self.displayed,
            to: target,
            elapsed: 0.0,
            duration: interval_seconds.max(f32::EPSILON),
        });
        self.state.position = target;
        self.state.moving = true;
        self.seconds_since_remote_update = 0.0;
    }

    pub(crate) fn apply_remote_update(
        &mut self,
        direction: Option<Direction>,
        moving: Option<bool>,
        status: Option<PlayerStatus>,
    ) {
        if let Some(direction) = direction {
            self.state.direction = direction;
        }
        if let Some(moving) = moving {
            self.state.moving = moving;
        }
        if let Some(status) = status {
            self.state.status = status;
        }
        self.seconds_since_remote_update = 0.0;
    }

    /// Teleport/map-change only; the single path that may move the visual
    /// discontinuously.
    pub(crate) fn snap_to(&mut self, position: Vec2) {
        self.state.position = position;
        self.displayed = position;
        self.motion = None;
    }

    pub(crate) fn advance(&mut self, dt_seconds: f32) {
        if let Some(motion) = self.motion.as_mut() {
            motion.elapsed += dt_seconds;
            let t = (motion.elapsed / motion.duration).min(1.0);
            self.displayed = Vec2 {
                x: motion.from.x + (motion.to.x - motion.from.x) * t,
                y: motion.from.y + (motion.to.y - motion.from.y) * t,
            };
            if t >= 1.0 {
                self.motion = None;
            }
        }

        if !self.state.local {
            self.seconds_since_remote_update += dt_seconds;
            if self.seconds_since_remote_update > REMOTE_STALE_AFTER_SECONDS
                && self.motion.is_none()
            {
                self.state.moving = false;
            }
        }

        let action = if self.state.moving {
            AnimationAction::Walk
        } else {
            AnimationAction::Idle
        };
        self.select_clip(AnimationKey {
            variant: self.variant,
            action,
            direction: self.state.direction,
        });
        self.clip_time_seconds += dt_seconds;
    }

    /// Re-requesting the playing clip is a no-op, not a restart.
    pub(crate) fn select_clip(&mut self, key: AnimationKey) {
        if self.current_clip == Some(key) {
            return;
        }
        self.current_clip = Some(key);
        self.clip_time_seconds = 0.0;
    }

    pub(crate) fn current_clip(&self) -> Option<AnimationKey> {
        self.current_clip
    }

    pub(crate) fn current_frame(&self) -> u32 {
        match self.current_clip {
            Some(clip) => {
                (self.clip_time_seconds / WALK_FRAME_SECONDS) as u32 % clip.frame_count()
            }
            None => 0,
        }
    }

    pub(crate) fn sprite_key(&self) -> String {
        let clip = self.current_clip.unwrap_or(AnimationKey {
            variant: self.variant,
            action: AnimationAction::Idle,
            direction: self.state.direction,
        });
        clip.frame_sprite_key(self.current_frame())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote_state(id: &str) -> PlayerState {
        PlayerState {
            id: id.to_string(),
            name: format!("peer {id}"),
            position: Vec2 { x: 100.0, y: 100.0 },
            direction: Direction::Down,
            moving: false,
            map_id: "library".to_string(),
            status: PlayerStatus::Online,
            local: false,
        }
    }

    fn local_state() -> PlayerState {
        PlayerState {
            local: true,
            ..remote_state("local")
        }
    }

    #[test]
    fn local_input_moves_immediately() {
        let mut entity = PlayerEntity::new(local_state());
        entity.apply_local_input(Vec2 { x: 110.0, y: 90.0 }, Direction::Right, true);
        assert_eq!(entity.displayed_position(), Vec2 { x: 110.0, y: 90.0 });
        let state = entity.state();
        assert_eq!(state.position, Vec2 { x: 110.0, y: 90.0 });
        assert_eq!(state.direction, Direction::Right);
        assert!(state.moving);
    }

    #[test]
    fn remote_move_interpolates_without_jumping() {
        let mut entity = PlayerEntity::new(remote_state("a"));
        let interval = 0.05;
        entity.apply_remote_move(Vec2 { x: 110.0, y: 100.0 }, interval);

        let dt = 0.01;
        let mut previous = entity.displayed_position();
        let mut max_step = 0.0f32;
        for _ in 0..6 {
            entity.advance(dt);
            let current = entity.displayed_position();
            let step = ((current.x - previous.x).powi(2) + (current.y - previous.y).powi(2)).sqrt();
            max_step = max_step.max(step);
            previous = current;
        }

        // 10 px over 5 ticks of the interval: 2 px per tick, never a snap.
        assert!(max_step < 2.5, "max step {max_step}");
        assert!((entity.displayed_position().x - 110.0).abs() < 1e-3);
    }

    #[test]
    fn remote_converges_within_one_broadcast_interval() {
        let mut entity = PlayerEntity::new(remote_state("a"));
        entity.apply_remote_move(Vec2 { x: 140.0, y: 80.0 }, 0.05);
        entity.advance(0.05);
        assert_eq!(entity.displayed_position(), Vec2 { x: 140.0, y: 80.0 });
    }

    #[test]
    fn successive_remote_moves_start_from_displayed_position() {
        let mut entity = PlayerEntity::new(remote_state("a"));
        entity.apply_remote_move(Vec2 { x: 110.0, y: 100.0 }, 0.05);
        entity.advance(0.025);
        let mid = entity.displayed_position();
        entity.apply_remote_move(Vec2 { x: 120.0, y: 100.0 }, 0.05);
        // No jump at retarget time.
        assert_eq!(entity.displayed_position(), mid);
    }

    #[test]
    fn snap_is_discontinuous_and_cancels_motion() {
        let mut entity = PlayerEntity::new(remote_state("a"));
        entity.apply_remote_move(Vec2 { x: 110.0, y: 100.0 }, 0.05);
        entity.snap_to(Vec2 { x: 50.0, y: 300.0 });
        entity.advance(0.05);
        assert_eq!(entity.displayed_position(), Vec2 { x: 50.0, y: 300.0 });
    }

    #[test]
    fn stale_remote_drops_to_idle_but_holds_position() {
        let mut entity = PlayerEntity::new(remote_state("a"));
        entity.apply_remote_move(Vec2 { x: 110.0, y: 100.0 }, 0.05);
        for _ in 0..30 {
            entity.advance(0.05);
        }
        assert!(!entity.state().moving);
        assert_eq!(entity.displayed_position(), Vec2 { x: 110.0, y: 100.0 });
        let clip = entity.current_clip().expect("clip");
        assert_eq!(clip.action, AnimationAction::Idle);
    }

    #[test]
    fn reselecting_current_clip_does_not_restart_it() {
        let mut entity = PlayerEntity::new(remote_state("a"));
        let key = AnimationKey {
            variant: entity.variant(),
            action: AnimationAction::Walk,
            direction: Direction::Left,
        };
        entity.select_clip(key);
        entity.clip_time_seconds = 0.2;
        entity.select_clip(key);
        assert_eq!(entity.clip_time_seconds, 0.2);

        entity.select_clip(AnimationKey {
            direction: Direction::Right,
            ..key
        });
        assert_eq!(entity.clip_time_seconds, 0.0);
    }

    #[test]
    fn walk_clip_cycles_frames() {
        let mut entity = PlayerEntity::new(local_state());
        entity.apply_local_input(Vec2 { x: 0.0, y: 0.0 }, Direction::Down, true);
        entity.advance(0.01);
        let first = entity.current_frame();
        entity.advance(WALK_FRAME_SECONDS);
        let second = entity.current_frame();
        assert_ne!(first, second);
    }

    #[test]
    fn variant_is_stable_and_in_range() {
        let a = variant_for_id("alice");
        assert_eq!(a, variant_for_id("alice"));
        assert!(a < AVATAR_VARIANTS);
    }

    #[test]
    fn sprite_keys_are_lowercase_paths() {
        let key = AnimationKey {
            variant: 2,
            action: AnimationAction::Walk,
            direction: Direction::Left,
        };
        assert_eq!(key.frame_sprite_key(1), "avatars/v2/walk_left_1");
        assert!(engine::validate_sprite_key(&key.frame_sprite_key(0)).is_ok());
    }
}
