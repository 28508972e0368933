#[derive(Debug, Clone)]
pub(crate) struct LocalIdentity {
    pub(crate) player_id: String,
    pub(crate) player_name: String,
}

/// Map variants are data plus a decoration hook, not scene subclasses: one
/// SpaceScene implementation reads one of these per map.
#[derive(Clone, Copy)]
pub(crate) struct SceneConfig {
    pub(crate) map_id: MapId,
    pub(crate) display_name: &'static str,
    pub(crate) ambient_audio: Option<&'static str>,
    /// Ambient tint folded into every generated tile texture.
    pub(crate) tint: [u8; 3],
    /// Optional per-map sprite overrides, applied after base generation.
    pub(crate) decorate: Option<fn(&MapModel, &mut AssetRegistry)>,
}

pub(crate) fn scene_configs() -> [SceneConfig; 3] {
    [
        SceneConfig {
            map_id: MapId::Library,
            display_name: "Campus Library",
            ambient_audio: Some("ambience/library"),
            tint: [96, 80, 58],
            decorate: Some(decorate_library),
        },
        SceneConfig {
            map_id: MapId::Office,
            display_name: "Study Office",
            ambient_audio: None,
            tint: [66, 82, 104],
            decorate: None,
        },
        SceneConfig {
            map_id: MapId::Lounge,
            display_name: "Social Lounge",
            ambient_audio: Some("ambience/lounge"),
            tint: [92, 70, 96],
            decorate: Some(decorate_lounge),
        },
    ]
}

struct RemoteEntry {
    entity: PlayerEntity,
    avatar: AvatarId,
}
