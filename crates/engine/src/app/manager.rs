use std::collections::HashMap;
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{info, warn};

use super::scene::{
    InputSnapshot, Scene, SceneCommand, SceneId, SceneTransfer, SceneWorld,
};

const READINESS_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Hooks through which the embedding application observes the core. It
/// controls the core only via the manager's public methods.
pub trait SurfaceEvents {
    fn game_ready(&mut self) {}
    fn scene_changed(&mut self, _scene_id: &SceneId) {}
}

pub struct NoopSurface;

impl SurfaceEvents for NoopSurface {}

pub type SceneFactory = Box<dyn Fn() -> Box<dyn Scene>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    Uninitialized,
    Initializing,
    Ready,
    SceneActive,
    ScenePaused,
    Destroyed,
}

#[derive(Debug, Error)]
pub enum InitError {
    #[error("initialize is not valid from state {0:?}")]
    InvalidState(ManagerState),
    #[error("rendering runtime construction failed: {0}")]
    RuntimeConstruction(String),
}

#[derive(Debug, Error)]
pub enum SceneStartError {
    #[error("no scene registered for id '{0}'")]
    UnknownScene(SceneId),
    #[error("start_scene is not valid from state {0:?}")]
    InvalidState(ManagerState),
}

/// One poll of the host rendering runtime during initialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadinessPoll {
    Pending,
    Ready,
    Failed(String),
}

struct ActiveScene {
    id: SceneId,
    scene: Box<dyn Scene>,
    world: SceneWorld,
}

/// Top-level session lifecycle. Owns the active scene and its world; scenes
/// are constructed from registered factories and fully unloaded before the
/// next one is built, so nothing of a previous scene can leak across a
/// switch.
pub struct GameManager {
    state: ManagerState,
    factories: HashMap<SceneId, SceneFactory>,
    active: Option<ActiveScene>,
    surface: Box<dyn SurfaceEvents>,
    window_size: (u32, u32),
}

impl GameManager {
    pub fn new(surface: Box<dyn SurfaceEvents>) -> Self {
        Self {
            state: ManagerState::Uninitialized,
            factories: HashMap::new(),
            active: None,
            surface,
            window_size: (0, 0),
        }
    }

    pub fn state(&self) -> ManagerState {
        self.state
    }

    pub fn register_scene(&mut self, id: SceneId, factory: SceneFactory) {
        self.factories.insert(id, factory);
    }

    pub fn knows_scene(&self, id: &SceneId) -> bool {
        self.factories.contains_key(id)
    }

    /// Wait for the rendering runtime to signal readiness, bounded by
    /// `timeout`. A timeout is recoverable: the manager force-transitions
    /// to Ready and logs a degraded start. A failed probe is fatal.
    pub fn initialize(
        &mut self,
        mut poll: impl FnMut() -> ReadinessPoll,
        timeout: Duration,
    ) -> Result<(), InitError> {
        if self.state != ManagerState::Uninitialized {
            return Err(InitError::InvalidState(self.state));
        }
        self.state = ManagerState::Initializing;

        let deadline = Instant::now() + timeout;
        loop {
            match poll() {
                ReadinessPoll::Ready => break,
                ReadinessPoll::Failed(reason) => {
                    self.state = ManagerState::Uninitialized;
                    return Err(InitError::RuntimeConstruction(reason));
                }
                ReadinessPoll::Pending => {
                    if Instant::now() >= deadline {
                        warn!(
                            timeout_ms = timeout.as_millis() as u64,
                            "degraded_start"
                        );
                        break;
                    }
                    thread::sleep(READINESS_POLL_INTERVAL);
                }
            }
        }

        self.state = ManagerState::Ready;
        self.surface.game_ready();
        info!("manager_ready");
        Ok(())
    }

    pub fn start_scene(
        &mut self,
        id: &SceneId,
        transfer: SceneTransfer,
    ) -> Result<(), SceneStartError> {
        match self.state {
            ManagerState::Ready | ManagerState::SceneActive => {}
            other => return Err(SceneStartError::InvalidState(other)),
        }
        if !self.factories.contains_key(id) {
            return Err(SceneStartError::UnknownScene(id.clone()));
        }

        self.shutdown_active();

        let Some(factory) = self.factories.get(id) else {
            return Err(SceneStartError::UnknownScene(id.clone()));
        };
        let mut scene = factory();
        let mut world = SceneWorld::default();
        scene.load(&mut world, &transfer);
        self.active = Some(ActiveScene {
            id: id.clone(),
            scene,
            world,
        });
        self.state = ManagerState::SceneActive;
        self.surface.scene_changed(id);
        info!(scene = %id, "scene_started");
        Ok(())
    }

    /// One fixed-timestep update of the active scene. A scene-issued switch
    /// to an unknown target is logged and ignored; the current scene keeps
    /// running.
    pub fn tick(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot) {
        if self.state != ManagerState::SceneActive {
            return;
        }
        let command = match self.active.as_mut() {
            Some(active) => active
                .scene
                .update(fixed_dt_seconds, input, &mut active.world),
            None => return,
        };
        match command {
            SceneCommand::None => {}
            SceneCommand::SwitchTo { scene, transfer } => {
                if let Err(error) = self.start_scene(&scene, transfer) {
                    warn!(error = %error, "scene_switch_rejected");
                }
            }
        }
    }

    pub fn pause(&mut self) {
        if self.state != ManagerState::SceneActive {
            return;
        }
        if let Some(active) = self.active.as_mut() {
            active.scene.pause();
        }
        self.state = ManagerState::ScenePaused;
        info!("scene_paused");
    }

    pub fn resume(&mut self) {
        if self.state != ManagerState::ScenePaused {
            return;
        }
        if let Some(active) = self.active.as_mut() {
            active.scene.resume();
        }
        self.state = ManagerState::SceneActive;
        info!("scene_resumed");
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.window_size = (width, height);
    }

    pub fn window_size(&self) -> (u32, u32) {
        self.window_size
    }

    pub fn destroy(&mut self) {
        if self.state == ManagerState::Destroyed {
            return;
        }
        self.shutdown_active();
        self.state = ManagerState::Destroyed;
        info!("manager_destroyed");
    }

    pub fn active_scene_id(&self) -> Option<&SceneId> {
        self.active.as_ref().map(|active| &active.id)
    }

    pub fn active_world(&self) -> Option<&SceneWorld> {
        self.active.as_ref().map(|active| &active.world)
    }

    pub fn debug_title_active(&self) -> Option<String> {
        let active = self.active.as_ref()?;
        active.scene.debug_title(&active.world)
    }

    fn shutdown_active(&mut self) {
        if let Some(mut active) = self.active.take() {
            active.scene.unload(&mut active.world);
            active.world.clear();
            info!(scene = %active.id, "scene_shutdown");
        }
        if matches!(
            self.state,
            ManagerState::SceneActive | ManagerState::ScenePaused
        ) {
            self.state = ManagerState::Ready;
        }
    }
}
