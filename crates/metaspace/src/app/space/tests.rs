use std::f32::consts::FRAC_1_SQRT_2;
use std::time::Duration;

use engine::InputAction;

use super::*;
use crate::app::net::{MemoryEndpoint, MemoryTransportFactory, WireMessage};

const DT: f32 = 1.0 / 60.0;

fn quick_net_config() -> NetConfig {
    NetConfig {
        broadcast_interval: Duration::from_millis(50),
        max_reconnect_attempts: 3,
        reconnect_base_delay: Duration::from_millis(50),
        connect_timeout: Duration::from_millis(100),
    }
}

fn fixture(map_id: MapId) -> (SpaceScene, SceneWorld, MemoryEndpoint) {
    let endpoint = MemoryEndpoint::default();
    let factory: Rc<dyn TransportFactory> = Rc::new(MemoryTransportFactory::new(endpoint.clone()));
    let config = scene_configs()
        .into_iter()
        .find(|config| config.map_id == map_id)
        .expect("scene config");
    let scene = SpaceScene::new(
        config,
        LocalIdentity {
            player_id: "local".to_string(),
            player_name: "Local Tester".to_string(),
        },
        factory,
        quick_net_config(),
    );
    (scene, SceneWorld::default(), endpoint)
}

fn loaded_fixture(map_id: MapId) -> (SpaceScene, SceneWorld, MemoryEndpoint) {
    let (mut scene, mut world, endpoint) = fixture(map_id);
    scene.load(&mut world, &SceneTransfer::default());
    (scene, world, endpoint)
}

fn snapshot(actions: &[InputAction]) -> InputSnapshot {
    let mut snapshot = InputSnapshot::empty();
    for action in actions {
        snapshot = snapshot.with_action_down(*action, true);
    }
    snapshot
}

fn local_position(scene: &SpaceScene) -> Vec2 {
    scene
        .local
        .as_ref()
        .expect("local player")
        .displayed_position()
}

fn push_peer_join(endpoint: &MemoryEndpoint, id: &str, map_id: &str, x: f32, y: f32) {
    endpoint.push_message(WireMessage::PlayerJoin {
        id: id.to_string(),
        name: format!("Peer {id}"),
        x,
        y,
        map_id: map_id.to_string(),
        status: PlayerStatus::Online,
    });
}

const LIBRARY_PAD_CENTER: Vec2 = Vec2 { x: 1120.0, y: 528.0 };

#[test]
fn spawns_at_first_declared_spawn_point_without_override() {
    let (scene, world, _endpoint) = loaded_fixture(MapId::Library);
    let map = map::generate(MapId::Library);
    assert_eq!(local_position(&scene), map.spawn_points[0]);
    assert!(world.find_avatar(LOCAL_AVATAR).is_some());
}

#[test]
fn spawn_override_takes_precedence_over_spawn_list() {
    let (mut scene, mut world, _endpoint) = fixture(MapId::Library);
    scene.load(
        &mut world,
        &SceneTransfer {
            spawn_override: Some(Vec2 { x: 50.0, y: 300.0 }),
        },
    );
    assert_eq!(local_position(&scene), Vec2 { x: 50.0, y: 300.0 });
}

#[test]
fn renderable_layers_match_map_dimensions() {
    let (_scene, world, _endpoint) = loaded_fixture(MapId::Library);
    let map = map::generate(MapId::Library);
    for kind in [
        TileLayerKind::Background,
        TileLayerKind::Collision,
        TileLayerKind::Decoration,
    ] {
        let grid = world.layer(kind).expect("layer");
        assert_eq!(grid.width(), map.width);
        assert_eq!(grid.height(), map.height);
        assert_eq!(grid.tile_size_px(), map.tile_size);
    }
}

#[test]
fn join_broadcast_goes_out_on_scene_entry() {
    let (mut scene, mut world, endpoint) = loaded_fixture(MapId::Library);
    scene.update(DT, &InputSnapshot::empty(), &mut world);
    let sent = endpoint.sent();
    assert!(matches!(
        sent.first(),
        Some(WireMessage::PlayerJoin { map_id, .. }) if map_id == "library"
    ));
}

#[test]
fn diagonal_movement_is_normalized() {
    let (mut scene, mut world, _endpoint) = loaded_fixture(MapId::Library);
    let start = local_position(&scene);

    scene.update(
        DT,
        &snapshot(&[InputAction::MoveRight, InputAction::MoveUp]),
        &mut world,
    );

    let position = local_position(&scene);
    let expected = PLAYER_SPEED_PX_PER_SECOND * FRAC_1_SQRT_2 * DT;
    assert!((position.x - start.x - expected).abs() < 1e-3);
    assert!((position.y - start.y + expected).abs() < 1e-3);
    assert_eq!(
        scene.local.as_ref().expect("local").state().direction,
        Direction::Right,
        "horizontal wins facing precedence"
    );
}

#[test]
fn single_axis_speed_matches_diagonal_speed() {
    let (mut scene, mut world, _endpoint) = loaded_fixture(MapId::Library);
    let start = local_position(&scene);
    scene.update(DT, &snapshot(&[InputAction::MoveRight]), &mut world);
    let single = local_position(&scene).x - start.x;

    let (mut scene2, mut world2, _endpoint2) = loaded_fixture(MapId::Library);
    let start2 = local_position(&scene2);
    scene2.update(
        DT,
        &snapshot(&[InputAction::MoveRight, InputAction::MoveUp]),
        &mut world2,
    );
    let end2 = local_position(&scene2);
    let diagonal = ((end2.x - start2.x).powi(2) + (end2.y - start2.y).powi(2)).sqrt();
    assert!((single - diagonal).abs() < 1e-3);
}

#[test]
fn perimeter_walls_block_movement() {
    let (mut scene, mut world, _endpoint) = loaded_fixture(MapId::Library);
    scene
        .local
        .as_mut()
        .expect("local")
        .snap_to(Vec2 { x: 50.0, y: 400.0 });

    for _ in 0..120 {
        scene.update(DT, &snapshot(&[InputAction::MoveLeft]), &mut world);
    }

    let x = local_position(&scene).x;
    assert!(x >= 32.0 + PLAYER_COLLIDER_HALF_PX - 0.01, "x={x}");
}

#[test]
fn blocked_collision_cells_block_the_player_box_on_every_map() {
    for map_id in MapId::all() {
        let map = map::generate(map_id);
        for tile_y in 0..map.height {
            for tile_x in 0..map.width {
                if !map.is_blocked(tile_x, tile_y) {
                    continue;
                }
                let center = map::tile_center(tile_x, tile_y);
                assert!(
                    aabb_blocked(&map, center, PLAYER_COLLIDER_HALF_PX),
                    "map {} cell ({tile_x},{tile_y})",
                    map_id.as_str()
                );
            }
        }
    }
}

#[test]
fn teleport_zone_switches_scene_with_target_spawn() {
    let (mut scene, mut world, endpoint) = loaded_fixture(MapId::Library);
    scene.update(DT, &InputSnapshot::empty(), &mut world);

    scene
        .local
        .as_mut()
        .expect("local")
        .snap_to(LIBRARY_PAD_CENTER);
    let command = scene.update(DT, &InputSnapshot::empty(), &mut world);

    match command {
        SceneCommand::SwitchTo { scene: id, transfer } => {
            assert_eq!(id.as_str(), "office");
            assert_eq!(transfer.spawn_override, Some(map::tile_center(4, 9)));
            assert_eq!(
                transfer.spawn_override,
                Some(Vec2 { x: 144.0, y: 304.0 })
            );
        }
        other => panic!("expected scene switch, got {other:?}"),
    }
    assert!(endpoint.sent().iter().any(|message| matches!(
        message,
        WireMessage::MapChange { map_id, .. } if map_id == "office"
    )));
}

#[test]
fn teleport_zone_is_suppressed_until_first_exit_after_spawn() {
    let (mut scene, mut world, _endpoint) = fixture(MapId::Library);
    scene.load(
        &mut world,
        &SceneTransfer {
            spawn_override: Some(LIBRARY_PAD_CENTER),
        },
    );

    // Standing in the arrival zone must not bounce straight back.
    for _ in 0..5 {
        let command = scene.update(DT, &InputSnapshot::empty(), &mut world);
        assert_eq!(command, SceneCommand::None);
    }

    // Walk out of the pad, then step back in: now it fires.
    for _ in 0..60 {
        let command = scene.update(DT, &snapshot(&[InputAction::MoveDown]), &mut world);
        assert_eq!(command, SceneCommand::None);
    }
    scene
        .local
        .as_mut()
        .expect("local")
        .snap_to(LIBRARY_PAD_CENTER);
    let command = scene.update(DT, &InputSnapshot::empty(), &mut world);
    assert!(matches!(command, SceneCommand::SwitchTo { .. }));
}

#[test]
fn remote_join_spawns_one_avatar_and_moves_are_interpolated() {
    let (mut scene, mut world, endpoint) = loaded_fixture(MapId::Library);
    scene.update(DT, &InputSnapshot::empty(), &mut world);

    push_peer_join(&endpoint, "peer", "library", 700.0, 620.0);
    scene.update(DT, &InputSnapshot::empty(), &mut world);
    assert_eq!(scene.remotes.len(), 1);
    assert_eq!(world.avatar_count(), 2);

    endpoint.push_message(WireMessage::PlayerMove {
        id: "peer".to_string(),
        x: 710.0,
        y: 620.0,
    });
    scene.update(DT, &InputSnapshot::empty(), &mut world);
    let mid = scene.remotes["peer"].entity.displayed_position();
    assert!(mid.x > 700.0 && mid.x < 710.0, "interpolating, x={}", mid.x);

    for _ in 0..3 {
        scene.update(DT, &InputSnapshot::empty(), &mut world);
    }
    let settled = scene.remotes["peer"].entity.displayed_position();
    assert!((settled.x - 710.0).abs() < 1e-3);
}

#[test]
fn duplicate_join_replaces_instead_of_stacking_avatars() {
    let (mut scene, mut world, endpoint) = loaded_fixture(MapId::Library);
    push_peer_join(&endpoint, "peer", "library", 700.0, 620.0);
    push_peer_join(&endpoint, "peer", "library", 705.0, 620.0);
    scene.update(DT, &InputSnapshot::empty(), &mut world);
    assert_eq!(scene.remotes.len(), 1);
    assert_eq!(world.avatar_count(), 2);
}

#[test]
fn remote_leave_removes_roster_entry_and_avatar() {
    let (mut scene, mut world, endpoint) = loaded_fixture(MapId::Library);
    push_peer_join(&endpoint, "peer", "library", 700.0, 620.0);
    scene.update(DT, &InputSnapshot::empty(), &mut world);
    assert_eq!(world.avatar_count(), 2);

    endpoint.push_message(WireMessage::PlayerLeave {
        id: "peer".to_string(),
    });
    scene.update(DT, &InputSnapshot::empty(), &mut world);
    assert!(scene.remotes.is_empty());
    assert_eq!(world.avatar_count(), 1);
}

#[test]
fn remote_map_change_to_another_map_removes_the_peer() {
    let (mut scene, mut world, endpoint) = loaded_fixture(MapId::Library);
    push_peer_join(&endpoint, "peer", "library", 700.0, 620.0);
    scene.update(DT, &InputSnapshot::empty(), &mut world);

    endpoint.push_message(WireMessage::MapChange {
        id: "peer".to_string(),
        map_id: "office".to_string(),
    });
    scene.update(DT, &InputSnapshot::empty(), &mut world);
    assert!(scene.remotes.is_empty());
    assert_eq!(world.avatar_count(), 1);
}

#[test]
fn joins_for_other_maps_and_own_echo_are_ignored() {
    let (mut scene, mut world, endpoint) = loaded_fixture(MapId::Library);
    push_peer_join(&endpoint, "peer", "office", 700.0, 620.0);
    push_peer_join(&endpoint, "local", "library", 700.0, 620.0);
    scene.update(DT, &InputSnapshot::empty(), &mut world);
    assert!(scene.remotes.is_empty());
    assert_eq!(world.avatar_count(), 1);
}

#[test]
fn shutdown_then_restart_leaves_no_ghost_peers_or_timers() {
    let (mut scene, mut world, endpoint) = loaded_fixture(MapId::Library);
    scene.update(DT, &InputSnapshot::empty(), &mut world);
    push_peer_join(&endpoint, "peer", "library", 700.0, 620.0);
    scene.update(DT, &InputSnapshot::empty(), &mut world);
    assert_eq!(world.avatar_count(), 2);

    scene.unload(&mut world);
    assert!(scene.net.is_none(), "network session torn down with scene");
    assert_eq!(world.avatar_count(), 0);
    assert!(endpoint.is_shut_down());
    assert!(matches!(
        endpoint.sent().last(),
        Some(WireMessage::PlayerLeave { id }) if id == "local"
    ));

    let (mut next_scene, mut next_world, _next_endpoint) = loaded_fixture(MapId::Library);
    next_scene.update(DT, &InputSnapshot::empty(), &mut next_world);
    assert!(next_scene.remotes.is_empty());
    assert_eq!(next_world.avatar_count(), 1);
}

#[test]
fn generated_assets_cover_tile_taxonomy_and_avatar_clips() {
    let (_scene, world, _endpoint) = loaded_fixture(MapId::Library);
    let map = map::generate(MapId::Library);
    for tile_id in map.tile_properties.keys() {
        assert!(
            world.assets().tile_sprite(*tile_id).is_some(),
            "tile {tile_id}"
        );
    }
    for variant in 0..AVATAR_VARIANTS {
        for action in [AnimationAction::Idle, AnimationAction::Walk] {
            for direction in [
                Direction::Up,
                Direction::Down,
                Direction::Left,
                Direction::Right,
            ] {
                let key = AnimationKey {
                    variant,
                    action,
                    direction,
                };
                for frame in 0..key.frame_count() {
                    assert!(
                        world.assets().contains_sprite(&key.frame_sprite_key(frame)),
                        "missing {}",
                        key.frame_sprite_key(frame)
                    );
                }
            }
        }
    }
}

#[test]
fn pause_marks_local_away_and_broadcasts_the_change() {
    let (mut scene, mut world, endpoint) = loaded_fixture(MapId::Library);
    scene.update(DT, &InputSnapshot::empty(), &mut world);
    endpoint.take_sent();

    scene.pause();
    scene.update(DT, &InputSnapshot::empty(), &mut world);
    assert!(endpoint.sent().iter().any(|message| matches!(
        message,
        WireMessage::PlayerUpdate {
            status: Some(PlayerStatus::Away),
            ..
        }
    )));

    scene.resume();
    scene.update(DT, &InputSnapshot::empty(), &mut world);
    assert!(endpoint.sent().iter().any(|message| matches!(
        message,
        WireMessage::PlayerUpdate {
            status: Some(PlayerStatus::Online),
            ..
        }
    )));
}

#[test]
fn missing_clip_falls_back_then_gives_up_silently() {
    let (mut scene, world, _endpoint) = loaded_fixture(MapId::Library);
    let missing = "avatars/v0/missing_clip_0".to_string();

    let first = scene.resolve_sprite_key(world.assets(), missing.clone(), 0, Direction::Down);
    assert_eq!(first, "avatars/v0/idle_down_0", "fallback while waiting");

    scene.tick_clip_retries(ANIMATION_RETRY_DELAY_SECONDS + 0.01);
    let second = scene.resolve_sprite_key(world.assets(), missing.clone(), 0, Direction::Down);
    assert_eq!(second, missing, "gave up; renderer placeholder takes over");
    assert!(scene.clip_given_up.contains(&missing));
}

#[test]
fn debug_title_reports_map_peers_and_net_state() {
    let (mut scene, mut world, endpoint) = loaded_fixture(MapId::Library);
    scene.update(DT, &InputSnapshot::empty(), &mut world);
    push_peer_join(&endpoint, "peer", "library", 700.0, 620.0);
    scene.update(DT, &InputSnapshot::empty(), &mut world);

    let title = scene.debug_title(&world).expect("title");
    assert!(title.contains("Campus Library"), "{title}");
    assert!(title.contains("peers 1"), "{title}");
    assert!(title.contains("net connected"), "{title}");
}
