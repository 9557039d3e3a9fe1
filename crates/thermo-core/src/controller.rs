// ── Controller abstraction ──
//
// Lifecycle management for one thermostat controller session: the HTTP
// command client, the inbound event stream, command routing, and the
// reactive store that the reconciliation core feeds.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use thermo_api::transport::{TlsMode, TransportConfig};
use thermo_api::websocket::{InboundFrame, StreamHandle};
use thermo_api::{PidParams, TemperatureSample, ThermostatClient};

use crate::command::{Command, CommandEnvelope, CommandResult};
use crate::config::{ControllerConfig, TlsVerification};
use crate::error::CoreError;
use crate::model::{Alarm, DeviceStatus, FanSpeed, Mode};
use crate::reconcile::{Admission, Clock, DecodeError, Inbound, SystemClock, classify, to_external};
use crate::store::DataStore;
use crate::stream::StateStream;

const COMMAND_CHANNEL_SIZE: usize = 64;
const ALARM_CHANNEL_SIZE: usize = 256;

/// Accepted target temperature range for the PID loop, °C.
pub const PID_TARGET_RANGE: std::ops::RangeInclusive<f64> = 15.0..=30.0;

/// Upper bound for the proportional gain.
pub const PID_KP_MAX: f64 = 50.0;
/// Upper bound for the integral and derivative gains.
pub const PID_KI_KD_MAX: f64 = 10.0;

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

/// What happened to one ingested payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Ingested {
    /// Merged into the status record; carries the new record.
    Telemetry(Arc<DeviceStatus>),
    /// Offered to alarm admission.
    Alarm(Admission),
}

// ── Controller ───────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. Owns the reconciliation
/// pipeline (classify → merge / admit → store) and routes outbound
/// commands through a single processor task.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: ControllerConfig,
    store: Arc<DataStore>,
    connection_state: watch::Sender<ConnectionState>,
    alarm_tx: broadcast::Sender<Arc<Alarm>>,
    command_tx: Mutex<mpsc::Sender<CommandEnvelope>>,
    command_rx: Mutex<Option<mpsc::Receiver<CommandEnvelope>>>,
    cancel: CancellationToken,
    /// Child token for the current connection -- cancelled on disconnect,
    /// replaced on reconnect.
    cancel_child: Mutex<CancellationToken>,
    client: Mutex<Option<Arc<ThermostatClient>>>,
    stream_handle: Mutex<Option<StreamHandle>>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Controller {
    /// Create a new Controller using the wall clock. Does NOT connect --
    /// call [`connect()`](Self::connect) to start background tasks.
    pub fn new(config: ControllerConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a Controller whose alarm admission reads `clock`.
    pub fn with_clock(config: ControllerConfig, clock: Arc<dyn Clock>) -> Self {
        let store = Arc::new(DataStore::new(
            clock,
            config.alarm_window,
            config.alarm_retention,
        ));
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        let (alarm_tx, _) = broadcast::channel(ALARM_CHANNEL_SIZE);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();

        Self {
            inner: Arc::new(ControllerInner {
                config,
                store,
                connection_state,
                alarm_tx,
                command_tx: Mutex::new(command_tx),
                command_rx: Mutex::new(Some(command_rx)),
                cancel,
                cancel_child: Mutex::new(cancel_child),
                client: Mutex::new(None),
                stream_handle: Mutex::new(None),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Access the controller configuration.
    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    /// Access the underlying DataStore.
    pub fn store(&self) -> &Arc<DataStore> {
        &self.inner.store
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Build the command client, spawn the command processor and, when
    /// enabled, open the event stream.
    ///
    /// The stream connects in the background; a controller that is down
    /// at startup is retried with backoff rather than failing here.
    pub async fn connect(&self) -> Result<(), CoreError> {
        self.set_state(ConnectionState::Connecting);

        // Fresh child token for this connection (supports reconnect).
        let child = self.inner.cancel.child_token();
        *self.inner.cancel_child.lock().await = child.clone();

        let config = &self.inner.config;
        let transport = build_transport(config);

        let client = match ThermostatClient::new(config.api_url.clone(), &transport) {
            Ok(c) => c,
            Err(e) => {
                self.set_state(ConnectionState::Failed);
                return Err(e.into());
            }
        };
        *self.inner.client.lock().await = Some(Arc::new(client));

        let mut handles = self.inner.task_handles.lock().await;

        if let Some(rx) = self.inner.command_rx.lock().await.take() {
            let ctrl = self.clone();
            handles.push(tokio::spawn(command_processor_task(ctrl, rx)));
        }

        if config.websocket_enabled {
            if let Err(e) = self.spawn_stream(&child, &mut handles).await {
                drop(handles);
                self.set_state(ConnectionState::Failed);
                return Err(e);
            }
        }

        self.set_state(ConnectionState::Connected);
        info!(api = %config.api_url, "connected to controller");
        Ok(())
    }

    /// Open the event stream and a bridge task feeding frames, in
    /// delivery order, into [`ingest`](Self::ingest).
    async fn spawn_stream(
        &self,
        cancel: &CancellationToken,
        handles: &mut Vec<JoinHandle<()>>,
    ) -> Result<(), CoreError> {
        let config = &self.inner.config;
        let stream_cancel = cancel.child_token();

        let handle = StreamHandle::connect(
            config.stream_url.clone(),
            config.stream_protocol,
            config.reconnect.clone(),
            stream_cancel.clone(),
        )?;

        let rx = handle.subscribe();
        let ctrl = self.clone();
        handles.push(tokio::spawn(stream_bridge_task(ctrl, rx, stream_cancel)));

        *self.inner.stream_handle.lock().await = Some(handle);
        info!(url = %config.stream_url, protocol = ?config.stream_protocol, "event stream spawned");
        Ok(())
    }

    /// Disconnect from the controller.
    ///
    /// Cancels background tasks, drops the client, and resets the
    /// connection state to [`Disconnected`](ConnectionState::Disconnected).
    /// The status record and alarm log survive for the session.
    pub async fn disconnect(&self) {
        // Cancel the child token (not the parent -- allows reconnect).
        self.inner.cancel_child.lock().await.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        drop(handles);

        if let Some(handle) = self.inner.stream_handle.lock().await.take() {
            handle.shutdown();
        }

        *self.inner.client.lock().await = None;

        // Recreate command channel so reconnects can spawn a fresh receiver.
        {
            let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
            *self.inner.command_tx.lock().await = tx;
            *self.inner.command_rx.lock().await = Some(rx);
        }

        self.set_state(ConnectionState::Disconnected);
        debug!("disconnected");
    }

    fn set_state(&self, state: ConnectionState) {
        // `send` drops the value when nobody is subscribed.
        self.inner.connection_state.send_replace(state);
    }

    // ── Inbound reconciliation ───────────────────────────────────

    /// Classify one inbound payload and route it.
    ///
    /// Telemetry is merged into the status record; alarms go through
    /// admission, and accepted ones are broadcast on
    /// [`alarm_notifications`](Self::alarm_notifications). A payload that
    /// cannot be decoded is logged and dropped without touching state.
    pub fn ingest(&self, payload: &str) -> Result<Ingested, DecodeError> {
        let inbound = classify(payload).inspect_err(|e| {
            warn!(error = %e, payload = %preview(payload), "dropping undecodable frame");
        })?;

        let store = &self.inner.store;
        match inbound {
            Inbound::Telemetry(frame) => Ok(Ingested::Telemetry(store.apply_telemetry(&frame))),
            Inbound::Alarm(frame) => {
                let outcome = store.offer_alarm(&frame);
                match &outcome {
                    Admission::Accepted(alarm) => {
                        info!(id = %alarm.id, description = %alarm.description, "alarm accepted");
                        let _ = self.inner.alarm_tx.send(Arc::clone(alarm));
                    }
                    Admission::Rejected { since_last } => {
                        debug!(
                            description = %frame.alarm_description,
                            since_last_ms = since_last.num_milliseconds(),
                            "alarm rejected by rate limit"
                        );
                    }
                }
                Ok(Ingested::Alarm(outcome))
            }
        }
    }

    // ── Outbound commands ────────────────────────────────────────

    /// Switch the operating mode.
    ///
    /// Two-phase: the status record shows `mode` immediately, then the
    /// command goes out. A failed command is reported but the local mode
    /// is NOT rolled back; the next telemetry frame carrying a mode is
    /// what corrects it. Reserved modes (`off`, `eco`) change nothing and
    /// send nothing.
    pub async fn set_mode(&self, mode: Mode) -> Result<CommandResult, CoreError> {
        let token = match to_external(mode) {
            Ok(token) => token,
            Err(unsupported) => {
                warn!(%mode, "mode has no controller equivalent; not sent");
                return Err(CoreError::UnsupportedMode {
                    mode: unsupported.0,
                });
            }
        };

        self.inner.store.set_mode(mode);
        self.execute(Command::SetMode(token)).await
    }

    /// Command the manual fan speed, `0..=3`.
    pub async fn set_fan_speed(&self, level: u8) -> Result<CommandResult, CoreError> {
        let speed = FanSpeed::new(level).ok_or_else(|| CoreError::ValidationFailed {
            message: format!("fan speed must be between 0 and 3, got {level}"),
        })?;
        self.execute(Command::SetFanSpeed(speed)).await
    }

    /// Push new PID gains and setpoint.
    pub async fn set_pid_params(&self, params: PidParams) -> Result<CommandResult, CoreError> {
        validate_pid(&params)?;
        self.execute(Command::SetPidParams(params)).await
    }

    /// Execute a command against the controller.
    ///
    /// Sends the command through the internal channel to the command
    /// processor task and awaits the result. Failures are logged here and
    /// returned; nothing is retried.
    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        let label = format!("{cmd:?}");
        self.dispatch(cmd)
            .await
            .inspect_err(|e| warn!(error = %e, command = %label, "command failed"))
    }

    async fn dispatch(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        if *self.inner.connection_state.borrow() != ConnectionState::Connected {
            return Err(CoreError::ControllerDisconnected);
        }

        let (tx, rx) = tokio::sync::oneshot::channel();

        let command_tx = self.inner.command_tx.lock().await.clone();
        command_tx
            .send(CommandEnvelope {
                command: cmd,
                response_tx: tx,
            })
            .await
            .map_err(|_| CoreError::ControllerDisconnected)?;

        rx.await.map_err(|_| CoreError::ControllerDisconnected)?
    }

    // ── Ad-hoc reads ─────────────────────────────────────────────

    /// Recent temperature samples from the controller's history endpoint.
    pub async fn recent_temperatures(&self) -> Result<Vec<TemperatureSample>, CoreError> {
        let client = self.client().await?;
        Ok(client.recent_temperatures().await?)
    }

    /// Wait until at least one telemetry frame has been merged.
    pub async fn wait_for_telemetry(
        &self,
        timeout: Duration,
    ) -> Result<Arc<DeviceStatus>, CoreError> {
        let mut rx = self.inner.store.subscribe_last_telemetry();
        let waited = tokio::time::timeout(timeout, rx.wait_for(Option::is_some)).await;

        match waited {
            Ok(Ok(_)) => Ok(self.inner.store.status_snapshot()),
            Ok(Err(_)) => Err(CoreError::ControllerDisconnected),
            Err(_) => Err(CoreError::Timeout {
                timeout_secs: timeout.as_secs(),
            }),
        }
    }

    // ── One-shot convenience ─────────────────────────────────────

    /// One-shot: connect, run closure, disconnect.
    ///
    /// Disables the event stream since a single command needs only the
    /// HTTP client.
    pub async fn oneshot<F, Fut, T>(config: ControllerConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Controller) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.websocket_enabled = false;

        let controller = Controller::new(cfg);
        controller.connect().await?;
        let result = f(controller.clone()).await;
        controller.disconnect().await;
        result
    }

    // ── State observation ────────────────────────────────────────

    /// Subscribe to connection state changes.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    /// Subscribe to accepted-alarm notifications.
    pub fn alarm_notifications(&self) -> broadcast::Receiver<Arc<Alarm>> {
        self.inner.alarm_tx.subscribe()
    }

    pub fn status_snapshot(&self) -> Arc<DeviceStatus> {
        self.inner.store.status_snapshot()
    }

    pub fn alarms_snapshot(&self) -> Arc<Vec<Arc<Alarm>>> {
        self.inner.store.alarms_snapshot()
    }

    pub fn status(&self) -> StateStream<DeviceStatus> {
        self.inner.store.subscribe_status()
    }

    async fn client(&self) -> Result<Arc<ThermostatClient>, CoreError> {
        self.inner
            .client
            .lock()
            .await
            .clone()
            .ok_or(CoreError::ControllerDisconnected)
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Feed stream frames into the reconciler, one at a time, in order.
async fn stream_bridge_task(
    controller: Controller,
    mut rx: broadcast::Receiver<Arc<InboundFrame>>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = rx.recv() => {
                match result {
                    Ok(frame) => {
                        trace!(event = ?frame.event, "inbound frame");
                        // Undecodable frames are logged inside ingest.
                        let _ = controller.ingest(&frame.payload);
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "stream bridge lagged; frames dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }
}

/// Process commands from the mpsc channel, one at a time.
async fn command_processor_task(controller: Controller, mut rx: mpsc::Receiver<CommandEnvelope>) {
    let cancel = controller.inner.cancel_child.lock().await.clone();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            envelope = rx.recv() => {
                let Some(envelope) = envelope else { break };
                let result = route_command(&controller, envelope.command).await;
                let _ = envelope.response_tx.send(result);
            }
        }
    }
}

// ── Command routing ──────────────────────────────────────────────

async fn route_command(controller: &Controller, cmd: Command) -> Result<CommandResult, CoreError> {
    let client = controller.client().await?;

    match cmd {
        Command::SetMode(token) => {
            let ack = client.set_mode(token.as_str()).await?;
            debug!(token = %token, ack = ?ack.mode, "mode command acknowledged");
            Ok(CommandResult::Mode(ack.mode))
        }
        Command::SetFanSpeed(speed) => {
            let ack = client.set_manual_speed(speed.level()).await?;
            Ok(CommandResult::FanSpeed(ack.fan_speed))
        }
        Command::SetPidParams(params) => {
            let echo = client.set_pid_params(&params).await?;
            Ok(CommandResult::PidParams(echo))
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────

fn build_transport(config: &ControllerConfig) -> TransportConfig {
    TransportConfig {
        tls: tls_to_transport(&config.tls),
        timeout: config.timeout,
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}

fn validate_pid(params: &PidParams) -> Result<(), CoreError> {
    let gains = [
        ("kp", params.kp, PID_KP_MAX),
        ("ki", params.ki, PID_KI_KD_MAX),
        ("kd", params.kd, PID_KI_KD_MAX),
    ];
    for (name, value, max) in gains {
        if !(0.0..=max).contains(&value) {
            return Err(CoreError::ValidationFailed {
                message: format!("{name} must be between 0 and {max}, got {value}"),
            });
        }
    }
    if !PID_TARGET_RANGE.contains(&params.target_temp) {
        return Err(CoreError::ValidationFailed {
            message: format!(
                "target temperature must be between {} and {} °C, got {}",
                PID_TARGET_RANGE.start(),
                PID_TARGET_RANGE.end(),
                params.target_temp
            ),
        });
    }
    Ok(())
}

fn preview(payload: &str) -> String {
    const MAX: usize = 120;
    if payload.chars().count() <= MAX {
        payload.to_owned()
    } else {
        let head: String = payload.chars().take(MAX).collect();
        format!("{head}…")
    }
}
