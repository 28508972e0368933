mod transport;

pub(crate) use transport::{
    MemoryEndpoint, TcpTransport, Transport, TransportError, TransportEvent,
};

use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use engine::{Direction, Vec2};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::player::{PlayerState, PlayerStatus};

/// Logical event contract of the network channel, one message per event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub(crate) enum WireMessage {
    #[serde(rename_all = "camelCase")]
    PlayerJoin {
        id: String,
        name: String,
        x: f32,
        y: f32,
        map_id: String,
        status: PlayerStatus,
    },
    PlayerLeave {
        id: String,
    },
    PlayerMove {
        id: String,
        x: f32,
        y: f32,
    },
    PlayerUpdate {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        direction: Option<Direction>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        moving: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<PlayerStatus>,
    },
    #[serde(rename_all = "camelCase")]
    MapChange {
        id: String,
        map_id: String,
    },
    #[serde(rename_all = "camelCase")]
    ProximityUpdate {
        nearby_ids: Vec<String>,
    },
}

/// Remote update as consumed by the scene, drained once per tick.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RemoteEvent {
    Joined {
        id: String,
        name: String,
        position: Vec2,
        map_id: String,
        status: PlayerStatus,
    },
    Left {
        id: String,
    },
    Moved {
        id: String,
        position: Vec2,
    },
    Updated {
        id: String,
        direction: Option<Direction>,
        moving: Option<bool>,
        status: Option<PlayerStatus>,
    },
    MapChanged {
        id: String,
        map_id: String,
    },
    Proximity {
        nearby_ids: Vec<String>,
    },
}

fn remote_event_from_wire(message: WireMessage) -> RemoteEvent {
    match message {
        WireMessage::PlayerJoin {
            id,
            name,
            x,
            y,
            map_id,
            status,
        } => RemoteEvent::Joined {
            id,
            name,
            position: Vec2 { x, y },
            map_id,
            status,
        },
        WireMessage::PlayerLeave { id } => RemoteEvent::Left { id },
        WireMessage::PlayerMove { id, x, y } => RemoteEvent::Moved {
            id,
            position: Vec2 { x, y },
        },
        WireMessage::PlayerUpdate {
            id,
            direction,
            moving,
            status,
        } => RemoteEvent::Updated {
            id,
            direction,
            moving,
            status,
        },
        WireMessage::MapChange { id, map_id } => RemoteEvent::MapChanged { id, map_id },
        WireMessage::ProximityUpdate { nearby_ids } => RemoteEvent::Proximity { nearby_ids },
    }
}

/// Result of kicking off one connection attempt. Transports that connect
/// synchronously resolve Ready; socket transports resolve on a background
/// thread and report through the channel.
pub(crate) enum ConnectProgress {
    Ready(Result<Box<dyn Transport>, TransportError>),
    Pending(Receiver<Result<Box<dyn Transport>, TransportError>>),
}

pub(crate) trait TransportFactory {
    fn begin_connect(&self) -> ConnectProgress;
}

pub(crate) struct TcpTransportFactory {
    pub(crate) addr: String,
    pub(crate) connect_timeout: Duration,
}

impl TransportFactory for TcpTransportFactory {
    fn begin_connect(&self) -> ConnectProgress {
        let (sender, receiver) = mpsc::channel();
        let addr = self.addr.clone();
        let timeout = self.connect_timeout;
        thread::spawn(move || {
            let result = TcpTransport::connect(&addr, timeout)
                .map(|transport| Box::new(transport) as Box<dyn Transport>);
            let _ = sender.send(result);
        });
        ConnectProgress::Pending(receiver)
    }
}

/// Offline/deterministic factory: every connect yields a fresh handle onto
/// the same in-memory endpoint.
#[derive(Default)]
pub(crate) struct MemoryTransportFactory {
    endpoint: MemoryEndpoint,
}

impl MemoryTransportFactory {
    pub(crate) fn new(endpoint: MemoryEndpoint) -> Self {
        Self { endpoint }
    }

    pub(crate) fn endpoint(&self) -> &MemoryEndpoint {
        &self.endpoint
    }
}

impl TransportFactory for MemoryTransportFactory {
    fn begin_connect(&self) -> ConnectProgress {
        ConnectProgress::Ready(Ok(Box::new(self.endpoint.transport())))
    }
}

#[derive(Debug, Clone)]
pub(crate) struct NetConfig {
    pub(crate) broadcast_interval: Duration,
    pub(crate) max_reconnect_attempts: u32,
    pub(crate) reconnect_base_delay: Duration,
    pub(crate) connect_timeout: Duration,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            broadcast_interval: Duration::from_millis(50),
            max_reconnect_attempts: 5,
            reconnect_base_delay: Duration::from_millis(500),
            connect_timeout: Duration::from_secs(3),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Offline,
}

impl ConnectionState {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Offline => "offline",
        }
    }
}

enum Link {
    Idle,
    Connecting {
        pending: Receiver<Result<Box<dyn Transport>, TransportError>>,
    },
    Backoff {
        retry_at: Instant,
    },
    Connected {
        transport: Box<dyn Transport>,
    },
    Offline,
}

/// Per-scene network session. Connection progress, reconnect backoff and the
/// broadcast cadence are all driven from the owning scene's tick via
/// [`NetworkClient::pump`]; nothing here runs between ticks except transport
/// I/O threads, whose traffic queues until drained.
pub(crate) struct NetworkClient {
    factory: Rc<dyn TransportFactory>,
    config: NetConfig,
    link: Link,
    join_pending: bool,
    reconnect_attempts: u32,
    next_broadcast_at: Option<Instant>,
    last_broadcast_position: Option<Vec2>,
    last_sent_direction: Option<Direction>,
    last_sent_moving: Option<bool>,
    last_sent_status: Option<PlayerStatus>,
    inbound: Vec<RemoteEvent>,
}

impl NetworkClient {
    pub(crate) fn new(factory: Rc<dyn TransportFactory>, config: NetConfig) -> Self {
        Self {
            factory,
            config,
            link: Link::Idle,
            join_pending: false,
            reconnect_attempts: 0,
            next_broadcast_at: None,
            last_broadcast_position: None,
            last_sent_direction: None,
            last_sent_moving: None,
            last_sent_status: None,
            inbound: Vec::new(),
        }
    }

    /// Begin connecting. Never blocks; progress is driven by `pump`.
    pub(crate) fn connect(&mut self, now: Instant) {
        if matches!(self.link, Link::Idle) {
            self.reconnect_attempts = 0;
            self.begin_attempt(now);
        }
    }

    pub(crate) fn state(&self) -> ConnectionState {
        match self.link {
            Link::Idle => ConnectionState::Disconnected,
            Link::Connecting { .. } | Link::Backoff { .. } => ConnectionState::Connecting,
            Link::Connected { .. } => ConnectionState::Connected,
            Link::Offline => ConnectionState::Offline,
        }
    }

    pub(crate) fn is_connected(&self) -> bool {
        matches!(self.link, Link::Connected { .. })
    }

    pub(crate) fn reconnect_attempts(&self) -> u32 {
        self.reconnect_attempts
    }

    pub(crate) fn broadcast_timer_active(&self) -> bool {
        self.next_broadcast_at.is_some()
    }

    /// Drive connection progress, drain inbound traffic, and send outbound
    /// updates. Called once per tick with the current local state.
    pub(crate) fn pump(&mut self, now: Instant, local: &PlayerState) {
        self.drive_link(now);
        if self.join_pending && self.is_connected() {
            self.send_join(now, local);
        }
        self.drain_transport(now);
        self.pump_broadcast(now, local);
    }

    /// Queued remote updates, in arrival order. Draining resets the queue;
    /// updates arriving after a disconnect are never surfaced.
    pub(crate) fn drain_events(&mut self) -> Vec<RemoteEvent> {
        std::mem::take(&mut self.inbound)
    }

    pub(crate) fn notify_map_change(&mut self, now: Instant, local_id: &str, map_id: &str) {
        let message = WireMessage::MapChange {
            id: local_id.to_string(),
            map_id: map_id.to_string(),
        };
        self.try_send(now, &message);
    }

    /// Synchronous teardown: best-effort leave, transport shutdown, timer
    /// cleared, queued updates discarded.
    pub(crate) fn disconnect(&mut self, local_id: &str) {
        if self.is_connected() {
            let leave = WireMessage::PlayerLeave {
                id: local_id.to_string(),
            };
            if let Link::Connected { transport } = &mut self.link {
                let _ = transport.send(&leave);
            }
        }
        self.drop_connection();
        self.link = Link::Idle;
        self.inbound.clear();
        debug!("net_disconnected");
    }

    fn begin_attempt(&mut self, now: Instant) {
        match self.factory.begin_connect() {
            ConnectProgress::Ready(Ok(transport)) => self.finish_connect(transport),
            ConnectProgress::Ready(Err(error)) => {
                warn!(error = %error, "net_connect_failed");
                self.register_failure(now);
            }
            ConnectProgress::Pending(pending) => {
                self.link = Link::Connecting { pending };
            }
        }
    }

    fn finish_connect(&mut self, transport: Box<dyn Transport>) {
        self.link = Link::Connected { transport };
        self.join_pending = true;
        self.reconnect_attempts = 0;
        info!("net_connected");
    }

    fn drive_link(&mut self, now: Instant) {
        match std::mem::replace(&mut self.link, Link::Idle) {
            Link::Connecting { pending } => match pending.try_recv() {
                Ok(Ok(transport)) => self.finish_connect(transport),
                Ok(Err(error)) => {
                    warn!(error = %error, "net_connect_failed");
                    self.register_failure(now);
                }
                Err(TryRecvError::Empty) => {
                    self.link = Link::Connecting { pending };
                }
                Err(TryRecvError::Disconnected) => {
                    warn!("net_connect_aborted");
                    self.register_failure(now);
                }
            },
            Link::Backoff { retry_at } => {
                if now >= retry_at {
                    self.begin_attempt(now);
                } else {
                    self.link = Link::Backoff { retry_at };
                }
            }
            other => self.link = other,
        }
    }

    fn drain_transport(&mut self, now: Instant) {
        let events = match &mut self.link {
            Link::Connected { transport } => transport.poll(),
            _ => return,
        };
        for event in events {
            match event {
                TransportEvent::Message(message) => {
                    self.inbound.push(remote_event_from_wire(message));
                }
                TransportEvent::Closed { reason } => {
                    warn!(reason = %reason, "net_connection_lost");
                    self.drop_connection();
                    self.reconnect_attempts = 0;
                    self.begin_attempt(now);
                    return;
                }
            }
        }
    }

    fn send_join(&mut self, now: Instant, local: &PlayerState) {
        let join = WireMessage::PlayerJoin {
            id: local.id.clone(),
            name: local.name.clone(),
            x: local.position.x,
            y: local.position.y,
            map_id: local.map_id.clone(),
            status: local.status,
        };
        if self.try_send(now, &join) {
            self.join_pending = false;
            self.last_broadcast_position = Some(local.position);
            self.last_sent_direction = Some(local.direction);
            self.last_sent_moving = Some(local.moving);
            self.last_sent_status = Some(local.status);
            self.next_broadcast_at = Some(now + self.config.broadcast_interval);
        }
    }

    fn pump_broadcast(&mut self, now: Instant, local: &PlayerState) {
        if !self.is_connected() || self.join_pending {
            return;
        }

        // Direction/motion/status changes go out as they happen.
        let direction = (self.last_sent_direction != Some(local.direction))
            .then_some(local.direction);
        let moving = (self.last_sent_moving != Some(local.moving)).then_some(local.moving);
        let status = (self.last_sent_status != Some(local.status)).then_some(local.status);
        if direction.is_some() || moving.is_some() || status.is_some() {
            let update = WireMessage::PlayerUpdate {
                id: local.id.clone(),
                direction,
                moving,
                status,
            };
            if self.try_send(now, &update) {
                self.last_sent_direction = Some(local.direction);
                self.last_sent_moving = Some(local.moving);
                self.last_sent_status = Some(local.status);
            } else {
                return;
            }
        }

        // Position rides the fixed cadence, and only when it changed.
        let Some(deadline) = self.next_broadcast_at else {
            return;
        };
        if now < deadline {
            return;
        }
        self.next_broadcast_at = Some(now + self.config.broadcast_interval);
        if self.last_broadcast_position == Some(local.position) {
            return;
        }
        let message = WireMessage::PlayerMove {
            id: local.id.clone(),
            x: local.position.x,
            y: local.position.y,
        };
        if self.try_send(now, &message) {
            self.last_broadcast_position = Some(local.position);
        }
    }

    fn try_send(&mut self, now: Instant, message: &WireMessage) -> bool {
        let result = match &mut self.link {
            Link::Connected { transport } => transport.send(message),
            _ => return false,
        };
        match result {
            Ok(()) => true,
            Err(error) => {
                warn!(error = %error, "net_send_failed");
                self.drop_connection();
                self.register_failure(now);
                false
            }
        }
    }

    fn drop_connection(&mut self) {
        if let Link::Connected { mut transport } = std::mem::replace(&mut self.link, Link::Idle) {
            transport.shutdown();
        }
        self.join_pending = false;
        self.next_broadcast_at = None;
        self.last_broadcast_position = None;
        self.last_sent_direction = None;
        self.last_sent_moving = None;
        self.last_sent_status = None;
    }

    /// Exponential backoff: base delay times the attempt number, up to the
    /// configured attempt cap, then terminal offline.
    fn register_failure(&mut self, now: Instant) {
        self.reconnect_attempts = self.reconnect_attempts.saturating_add(1);
        if self.reconnect_attempts >= self.config.max_reconnect_attempts {
            warn!(
                attempts = self.reconnect_attempts,
                "net_offline"
            );
            self.link = Link::Offline;
            return;
        }
        let delay = self.config.reconnect_base_delay * self.reconnect_attempts;
        self.link = Link::Backoff {
            retry_at: now + delay,
        };
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    use super::*;

    fn local_state() -> PlayerState {
        PlayerState {
            id: "local".to_string(),
            name: "Local".to_string(),
            position: Vec2 { x: 10.0, y: 20.0 },
            direction: Direction::Down,
            moving: false,
            map_id: "library".to_string(),
            status: PlayerStatus::Online,
            local: true,
        }
    }

    fn quick_config() -> NetConfig {
        NetConfig {
            broadcast_interval: Duration::from_millis(50),
            max_reconnect_attempts: 3,
            reconnect_base_delay: Duration::from_millis(100),
            connect_timeout: Duration::from_millis(100),
        }
    }

    enum ScriptedOutcome {
        Accept(MemoryEndpoint),
        Refuse,
    }

    struct ScriptedFactory {
        outcomes: RefCell<VecDeque<ScriptedOutcome>>,
        attempts_seen: Cell<u32>,
    }

    impl ScriptedFactory {
        fn refusing() -> Self {
            Self {
                outcomes: RefCell::new(VecDeque::new()),
                attempts_seen: Cell::new(0),
            }
        }

        fn accepting(endpoint: MemoryEndpoint) -> Self {
            let mut outcomes = VecDeque::new();
            outcomes.push_back(ScriptedOutcome::Accept(endpoint));
            Self {
                outcomes: RefCell::new(outcomes),
                attempts_seen: Cell::new(0),
            }
        }

        fn push(&self, outcome: ScriptedOutcome) {
            self.outcomes.borrow_mut().push_back(outcome);
        }
    }

    impl TransportFactory for ScriptedFactory {
        fn begin_connect(&self) -> ConnectProgress {
            self.attempts_seen.set(self.attempts_seen.get() + 1);
            match self.outcomes.borrow_mut().pop_front() {
                Some(ScriptedOutcome::Accept(endpoint)) => {
                    ConnectProgress::Ready(Ok(Box::new(endpoint.transport())))
                }
                Some(ScriptedOutcome::Refuse) | None => {
                    ConnectProgress::Ready(Err(TransportError::Connect {
                        addr: "test".to_string(),
                        reason: "refused".to_string(),
                    }))
                }
            }
        }
    }

    fn connected_client() -> (NetworkClient, MemoryEndpoint, Rc<ScriptedFactory>, Instant) {
        let endpoint = MemoryEndpoint::default();
        let factory = Rc::new(ScriptedFactory::accepting(endpoint.clone()));
        let mut client = NetworkClient::new(Rc::clone(&factory) as Rc<dyn TransportFactory>, quick_config());
        let t0 = Instant::now();
        client.connect(t0);
        client.pump(t0, &local_state());
        (client, endpoint, factory, t0)
    }

    fn count_moves(sent: &[WireMessage]) -> usize {
        sent.iter()
            .filter(|message| matches!(message, WireMessage::PlayerMove { .. }))
            .count()
    }

    #[test]
    fn wire_messages_use_kebab_case_tags_and_camel_case_fields() {
        let join = WireMessage::PlayerJoin {
            id: "p1".to_string(),
            name: "Ada".to_string(),
            x: 1.0,
            y: 2.0,
            map_id: "library".to_string(),
            status: PlayerStatus::Online,
        };
        let json = serde_json::to_string(&join).expect("encode");
        assert!(json.contains("\"type\":\"player-join\""), "{json}");
        assert!(json.contains("\"mapId\":\"library\""), "{json}");
        assert!(json.contains("\"status\":\"online\""), "{json}");

        let update: WireMessage = serde_json::from_str(
            "{\"type\":\"player-update\",\"id\":\"p1\",\"direction\":\"left\"}",
        )
        .expect("decode");
        assert_eq!(
            update,
            WireMessage::PlayerUpdate {
                id: "p1".to_string(),
                direction: Some(Direction::Left),
                moving: None,
                status: None,
            }
        );

        let proximity = WireMessage::ProximityUpdate {
            nearby_ids: vec!["a".to_string()],
        };
        let json = serde_json::to_string(&proximity).expect("encode");
        assert!(json.contains("\"type\":\"proximity-update\""), "{json}");
        assert!(json.contains("\"nearbyIds\":[\"a\"]"), "{json}");
    }

    #[test]
    fn connect_sends_join_on_scene_entry() {
        let (client, endpoint, _, _) = connected_client();
        assert!(client.is_connected());
        assert!(client.broadcast_timer_active());
        let sent = endpoint.sent();
        assert_eq!(sent.len(), 1);
        assert!(matches!(sent[0], WireMessage::PlayerJoin { .. }));
    }

    #[test]
    fn position_broadcast_waits_for_cadence_and_change() {
        let (mut client, endpoint, _, t0) = connected_client();
        endpoint.take_sent();
        let interval = quick_config().broadcast_interval;

        // Deadline reached, position unchanged: nothing goes out.
        client.pump(t0 + interval, &local_state());
        assert_eq!(count_moves(&endpoint.sent()), 0);

        // Position changed but deadline not reached yet: still nothing.
        let mut moved = local_state();
        moved.position = Vec2 { x: 42.0, y: 20.0 };
        client.pump(t0 + interval + Duration::from_millis(1), &moved);
        assert_eq!(count_moves(&endpoint.sent()), 0);

        // Deadline and change: exactly one move.
        client.pump(t0 + interval * 2 + Duration::from_millis(2), &moved);
        assert_eq!(count_moves(&endpoint.sent()), 1);

        // Same position again on the next cadence: suppressed.
        client.pump(t0 + interval * 3 + Duration::from_millis(3), &moved);
        assert_eq!(count_moves(&endpoint.sent()), 1);
    }

    #[test]
    fn direction_change_sends_player_update_immediately() {
        let (mut client, endpoint, _, t0) = connected_client();
        endpoint.take_sent();

        let mut turned = local_state();
        turned.direction = Direction::Left;
        turned.moving = true;
        client.pump(t0 + Duration::from_millis(1), &turned);

        let sent = endpoint.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0],
            WireMessage::PlayerUpdate {
                id: "local".to_string(),
                direction: Some(Direction::Left),
                moving: Some(true),
                status: None,
            }
        );

        // No repeat while unchanged.
        client.pump(t0 + Duration::from_millis(2), &turned);
        assert_eq!(endpoint.sent().len(), 1);
    }

    #[test]
    fn backoff_delay_grows_with_attempt_number() {
        let factory = Rc::new(ScriptedFactory::refusing());
        let mut client =
            NetworkClient::new(Rc::clone(&factory) as Rc<dyn TransportFactory>, quick_config());
        let t0 = Instant::now();
        let base = quick_config().reconnect_base_delay;

        client.connect(t0);
        assert_eq!(client.reconnect_attempts(), 1);
        assert_eq!(client.state(), ConnectionState::Connecting);

        // Before the first retry deadline nothing happens.
        client.pump(t0 + base - Duration::from_millis(1), &local_state());
        assert_eq!(factory.attempts_seen.get(), 1);

        // First retry at base*1, second at +base*2.
        client.pump(t0 + base, &local_state());
        assert_eq!(factory.attempts_seen.get(), 2);
        assert_eq!(client.reconnect_attempts(), 2);

        client.pump(t0 + base * 3, &local_state());
        assert_eq!(factory.attempts_seen.get(), 3);
        assert_eq!(client.state(), ConnectionState::Offline);
    }

    #[test]
    fn no_attempts_scheduled_after_terminal_offline() {
        let factory = Rc::new(ScriptedFactory::refusing());
        let mut client =
            NetworkClient::new(Rc::clone(&factory) as Rc<dyn TransportFactory>, quick_config());
        let t0 = Instant::now();
        client.connect(t0);
        for step in 1..20u32 {
            client.pump(t0 + Duration::from_millis(u64::from(step) * 200), &local_state());
        }
        assert_eq!(client.state(), ConnectionState::Offline);
        assert_eq!(factory.attempts_seen.get(), quick_config().max_reconnect_attempts);
        assert!(!client.broadcast_timer_active());
    }

    #[test]
    fn connection_loss_reconnects_and_clears_broadcast_timer() {
        let (mut client, endpoint, factory, t0) = connected_client();
        let replacement = MemoryEndpoint::default();
        factory.push(ScriptedOutcome::Accept(replacement.clone()));

        endpoint.push_closed("server restart");
        client.pump(t0 + Duration::from_millis(1), &local_state());

        assert!(client.is_connected(), "reconnected to replacement endpoint");
        let rejoin = replacement.sent();
        assert!(rejoin.is_empty(), "join waits for next pump");
        client.pump(t0 + Duration::from_millis(2), &local_state());
        assert!(matches!(
            replacement.sent().first(),
            Some(WireMessage::PlayerJoin { .. })
        ));
    }

    #[test]
    fn drain_events_maps_wire_messages_in_order() {
        let (mut client, endpoint, _, t0) = connected_client();
        endpoint.push_message(WireMessage::PlayerJoin {
            id: "peer".to_string(),
            name: "Peer".to_string(),
            x: 5.0,
            y: 6.0,
            map_id: "library".to_string(),
            status: PlayerStatus::Busy,
        });
        endpoint.push_message(WireMessage::PlayerMove {
            id: "peer".to_string(),
            x: 7.0,
            y: 8.0,
        });

        client.pump(t0 + Duration::from_millis(1), &local_state());
        let events = client.drain_events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], RemoteEvent::Joined { .. }));
        assert_eq!(
            events[1],
            RemoteEvent::Moved {
                id: "peer".to_string(),
                position: Vec2 { x: 7.0, y: 8.0 },
            }
        );
        assert!(client.drain_events().is_empty());
    }

    #[test]
    fn disconnect_sends_leave_shuts_down_and_drops_late_updates() {
        let (mut client, endpoint, _, t0) = connected_client();
        endpoint.take_sent();
        endpoint.push_message(WireMessage::PlayerMove {
            id: "peer".to_string(),
            x: 1.0,
            y: 1.0,
        });
        client.pump(t0 + Duration::from_millis(1), &local_state());

        client.disconnect("local");
        assert_eq!(client.state(), ConnectionState::Disconnected);
        assert!(!client.broadcast_timer_active());
        assert!(client.drain_events().is_empty(), "late updates are dropped");
        assert!(endpoint.is_shut_down());
        assert!(matches!(
            endpoint.sent().last(),
            Some(WireMessage::PlayerLeave { .. })
        ));
    }

    #[test]
    fn map_change_notification_goes_out_when_connected() {
        let (mut client, endpoint, _, t0) = connected_client();
        endpoint.take_sent();
        client.notify_map_change(t0 + Duration::from_millis(1), "local", "office");
        assert_eq!(
            endpoint.sent(),
            vec![WireMessage::MapChange {
                id: "local".to_string(),
                map_id: "office".to_string(),
            }]
        );
    }
}
