impl Scene for SpaceScene {
    fn load(&mut self, world: &mut SceneWorld, transfer: &SceneTransfer) {
        let map = map::generate(self.config.map_id);
        if let Err(error) = map.validate() {
            warn!(map = self.map_token(), error = %error, "map_invalid");
        }

        generate_assets(&map, &self.config, world.assets_mut());
        match build_tile_layers(&map) {
            Ok(layers) => world.set_layers(layers),
            Err(error) => warn!(error = %error, "tile_layer_build_failed"),
        }

        // A teleport's explicit target wins over the map's own spawn list.
        let spawn = transfer
            .spawn_override
            .or_else(|| map.spawn_points.first().copied())
            .unwrap_or(Vec2 {
                x: map.width_px() * 0.5,
                y: map.height_px() * 0.5,
            });
        let mut local = PlayerEntity::new(PlayerState {
            id: self.identity.player_id.clone(),
            name: self.identity.player_name.clone(),
            position: spawn,
            direction: Direction::default(),
            moving: false,
            map_id: self.map_token().to_string(),
            status: PlayerStatus::Online,
            local: true,
        });
        local.advance(0.0);

        self.suppressed_zone_ids = zones::evaluate(spawn, &map.zones)
            .into_iter()
            .map(|event| event.zone_id)
            .collect();
        self.occupied_zone_ids.clear();
        self.remotes.clear();
        self.next_remote_avatar = 1;
        self.nearby_ids.clear();
        self.clip_retry.clear();
        self.clip_given_up.clear();
        self.ticks = 0;

        let mut net = NetworkClient::new(Rc::clone(&self.transport_factory), self.net_config.clone());
        net.connect(Instant::now());

        self.map = Some(map);
        self.local = Some(local);
        self.net = Some(net);
        self.sync_avatars(world);

        info!(
            map = self.map_token(),
            scene = self.config.display_name,
            spawn_x = spawn.x,
            spawn_y = spawn.y,
            ambient_audio = ?self.config.ambient_audio,
            "scene_loaded"
        );
    }

    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand {
        let now = Instant::now();
        self.ticks = self.ticks.saturating_add(1);

        // Fixed per-tick order: input, local movement, broadcast, queued
        // remote updates, interpolation, zones, then the render-facing sync.
        let movement = MovementInput::from_snapshot(input);
        if let (Some(map), Some(local)) = (self.map.as_ref(), self.local.as_mut()) {
            let direction = resolve_direction(movement.x, movement.y, local.state().direction);
            let delta = Vec2 {
                x: movement.x * PLAYER_SPEED_PX_PER_SECOND * fixed_dt_seconds,
                y: movement.y * PLAYER_SPEED_PX_PER_SECOND * fixed_dt_seconds,
            };
            let next = move_with_collision(
                map,
                local.displayed_position(),
                delta,
                PLAYER_COLLIDER_HALF_PX,
            );
            local.apply_local_input(next, direction, movement.moving);
        }

        let events = match (self.net.as_mut(), self.local.as_ref()) {
            (Some(net), Some(local)) => {
                net.pump(now, &local.state());
                net.drain_events()
            }
            _ => Vec::new(),
        };
        for event in events {
            self.apply_remote_event(event, world);
        }

        if let Some(local) = self.local.as_mut() {
            local.advance(fixed_dt_seconds);
        }
        for entry in self.remotes.values_mut() {
            entry.entity.advance(fixed_dt_seconds);
        }
        self.tick_clip_retries(fixed_dt_seconds);

        let command = self.evaluate_zones(now);
        self.sync_avatars(world);

        command.unwrap_or(SceneCommand::None)
    }

    fn unload(&mut self, world: &mut SceneWorld) {
        let local_id = self.identity.player_id.clone();
        if let Some(mut net) = self.net.take() {
            net.disconnect(&local_id);
        }
        let peer_ids: Vec<String> = self.remotes.keys().cloned().collect();
        for id in peer_ids {
            self.remove_remote(&id, world);
        }
        world.remove_avatar(LOCAL_AVATAR);
        self.local = None;
        self.map = None;
        self.suppressed_zone_ids.clear();
        self.occupied_zone_ids.clear();
        self.nearby_ids.clear();
        self.clip_retry.clear();
        self.clip_given_up.clear();
        info!(map = self.map_token(), ticks = self.ticks, "scene_unloaded");
    }

    fn pause(&mut self) {
        if let Some(local) = self.local.as_mut() {
            local.set_status(PlayerStatus::Away);
        }
        debug!(map = self.map_token(), "scene_paused");
    }

    fn resume(&mut self) {
        if let Some(local) = self.local.as_mut() {
            local.set_status(PlayerStatus::Online);
        }
        debug!(map = self.map_token(), "scene_resumed");
    }

    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        let local = self.local.as_ref()?;
        let position = local.displayed_position();
        let net_state = self
            .net
            .as_ref()
            .map(|net| net.state().as_str())
            .unwrap_or("disconnected");
        Some(format!(
            "Metaspace | {} | ({:.0}, {:.0}) | peers {} | nearby {} | net {}",
            self.config.display_name,
            position.x,
            position.y,
            self.remotes.len(),
            self.nearby_ids.len(),
            net_state
        ))
    }
}
