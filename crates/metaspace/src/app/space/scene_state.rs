struct SpaceScene {
    config: SceneConfig,
    identity: LocalIdentity,
    transport_factory: Rc<dyn TransportFactory>,
    net_config: NetConfig,
    map: Option<MapModel>,
    local: Option<PlayerEntity>,
    net: Option<NetworkClient>,
    remotes: HashMap<String, RemoteEntry>,
    next_remote_avatar: u64,
    suppressed_zone_ids: Vec<String>,
    occupied_zone_ids: Vec<String>,
    nearby_ids: Vec<String>,
    clip_retry: HashMap<String, f32>,
    clip_given_up: HashSet<String>,
    ticks: u64,
}

impl SpaceScene {
    fn new(
        config: SceneConfig,
        identity: LocalIdentity,
        transport_factory: Rc<dyn TransportFactory>,
        net_config: NetConfig,
    ) -> Self {
        Self {
            config,
            identity,
            transport_factory,
            net_config,
            map: None,
            local: None,
            net: None,
            remotes: HashMap::new(),
            next_remote_avatar: 1,
            suppressed_zone_ids: Vec::new(),
            occupied_zone_ids: Vec::new(),
            nearby_ids: Vec::new(),
            clip_retry: HashMap::new(),
            clip_given_up: HashSet::new(),
            ticks: 0,
        }
    }

    fn map_token(&self) -> &'static str {
        self.config.map_id.as_str()
    }

    fn apply_remote_event(&mut self, event: RemoteEvent, world: &mut SceneWorld) {
        match event {
            RemoteEvent::Joined {
                id,
                name,
                position,
                map_id,
                status,
            } => {
                if id == self.identity.player_id || map_id != self.map_token() {
                    return;
                }
                self.spawn_remote(
                    PlayerState {
                        id,
                        name,
                        position,
                        direction: Direction::default(),
                        moving: false,
                        map_id,
                        status,
                        local: false,
                    },
                    world,
                );
            }
            RemoteEvent::Left { id } => self.remove_remote(&id, world),
            RemoteEvent::Moved { id, position } => {
                if let Some(entry) = self.remotes.get_mut(&id) {
                    entry
                        .entity
                        .apply_remote_move(position, self.net_config.broadcast_interval.as_secs_f32());
                }
            }
            RemoteEvent::Updated {
                id,
                direction,
                moving,
                status,
            } => {
                if let Some(entry) = self.remotes.get_mut(&id) {
                    entry.entity.apply_remote_update(direction, moving, status);
                }
            }
            RemoteEvent::MapChanged { id, map_id } => {
                if map_id != self.map_token() {
                    self.remove_remote(&id, world);
                }
            }
            RemoteEvent::Proximity { nearby_ids } => {
                debug!(count = nearby_ids.len(), "proximity_update");
                self.nearby_ids = nearby_ids;
            }
        }
    }

    /// A re-join for a known id replaces the old entity instead of stacking
    /// a second avatar.
    fn spawn_remote(&mut self, state: PlayerState, world: &mut SceneWorld) {
        let id = state.id.clone();
        self.remove_remote(&id, world);
        let avatar = AvatarId(self.next_remote_avatar);
        self.next_remote_avatar = self.next_remote_avatar.saturating_add(1);
        let mut entity = PlayerEntity::new(state);
        entity.advance(0.0);
        info!(peer = %id, "peer_joined");
        world.upsert_avatar(avatar, entity.displayed_position(), entity.sprite_key());
        self.remotes.insert(id, RemoteEntry { entity, avatar });
    }

    fn remove_remote(&mut self, id: &str, world: &mut SceneWorld) {
        if let Some(entry) = self.remotes.remove(id) {
            world.remove_avatar(entry.avatar);
            info!(peer = %id, "peer_left");
        }
    }

    fn evaluate_zones(&mut self, now: Instant) -> Option<SceneCommand> {
        let (position, local_id) = match self.local.as_ref() {
            Some(local) => (local.state().position, local.id().to_string()),
            None => return None,
        };
        let events = match self.map.as_ref() {
            Some(map) => zones::evaluate(position, &map.zones),
            None => return None,
        };
        let current_ids: Vec<String> = events
            .iter()
            .map(|event| event.zone_id.clone())
            .collect();
        // A zone the player spawned inside stays muted until first exit.
        self.suppressed_zone_ids
            .retain(|zone_id| current_ids.contains(zone_id));

        let mut command = None;
        for event in &events {
            if self
                .suppressed_zone_ids
                .iter()
                .any(|zone_id| zone_id == &event.zone_id)
            {
                continue;
            }
            match event.kind {
                ZoneKind::Teleport => {
                    let Some(target) = event.target.as_ref() else {
                        warn!(zone = %event.zone_id, "invalid_zone_target");
                        continue;
                    };
                    if MapId::parse(&target.map_id).is_none() {
                        warn!(zone = %event.zone_id, map = %target.map_id, "invalid_zone_target");
                        continue;
                    }
                    if command.is_none() {
                        info!(
                            zone = %event.zone_id,
                            target_map = %target.map_id,
                            "teleport_triggered"
                        );
                        if let Some(net) = self.net.as_mut() {
                            net.notify_map_change(now, &local_id, &target.map_id);
                        }
                        command = Some(SceneCommand::SwitchTo {
                            scene: SceneId::new(target.map_id.clone()),
                            transfer: SceneTransfer {
                                spawn_override: Some(Vec2 {
                                    x: target.x,
                                    y: target.y,
                                }),
                            },
                        });
                    }
                }
                _ => {
                    if !self.occupied_zone_ids.contains(&event.zone_id) {
                        debug!(
                            zone = %event.zone_id,
                            kind = event.kind.as_str(),
                            "zone_entered"
                        );
                    }
                }
            }
        }
        self.occupied_zone_ids = current_ids;
        command
    }

    fn sync_avatars(&mut self, world: &mut SceneWorld) {
        let mut draws: Vec<(AvatarId, Vec2, String, u8, Direction)> = Vec::new();
        if let Some(local) = self.local.as_ref() {
            world.camera_mut().position = local.displayed_position();
            draws.push((
                LOCAL_AVATAR,
                local.displayed_position(),
                local.sprite_key(),
                local.variant(),
                local.state().direction,
            ));
        }
        for entry in self.remotes.values() {
            draws.push((
                entry.avatar,
                entry.entity.displayed_position(),
                entry.entity.sprite_key(),
                entry.entity.variant(),
                entry.entity.state().direction,
            ));
        }
        for (avatar, position, desired_key, variant, direction) in draws {
            let key = self.resolve_sprite_key(world.assets(), desired_key, variant, direction);
            world.upsert_avatar(avatar, position, key);
        }
    }

    /// Missing clip frames retry once after a short delay, then give up
    /// silently; the renderer's placeholder covers the gap either way.
    fn resolve_sprite_key(
        &mut self,
        assets: &AssetRegistry,
        desired: String,
        variant: u8,
        direction: Direction,
    ) -> String {
        if assets.contains_sprite(&desired) {
            self.clip_retry.remove(&desired);
            self.clip_given_up.remove(&desired);
            return desired;
        }
        if self.clip_given_up.contains(&desired) {
            return desired;
        }
        match self.clip_retry.get(&desired) {
            None => {
                debug!(sprite_key = %desired, "animation_not_ready");
                self.clip_retry
                    .insert(desired.clone(), ANIMATION_RETRY_DELAY_SECONDS);
            }
            Some(remaining) if *remaining > 0.0 => {}
            Some(_) => {
                self.clip_retry.remove(&desired);
                self.clip_given_up.insert(desired.clone());
                return desired;
            }
        }
        let fallback = AnimationKey {
            variant,
            action: AnimationAction::Idle,
            direction,
        }
        .frame_sprite_key(0);
        if assets.contains_sprite(&fallback) {
            fallback
        } else {
            desired
        }
    }

    fn tick_clip_retries(&mut self, dt_seconds: f32) {
        for remaining in self.clip_retry.values_mut() {
            *remaining -= dt_seconds;
        }
    }
}
