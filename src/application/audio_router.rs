//! Per-application audio routing use case
//!
//! Creates a virtual sink, loops it back to the user's speakers and moves the
//! selected application streams into it. Teardown undoes all of it.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::audio::{
    AudioRoute, ModuleId, SinkId, StreamId, StreamInfo, RECORD_SINK_DESCRIPTION, RECORD_SINK_NAME,
};

use super::ports::{AudioServer, AudioServerError};

/// Errors from the audio router
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioRouterError {
    #[error("Audio setup failed: {0}")]
    Setup(AudioServerError),

    #[error("Stream #{0} no longer exists")]
    StreamGone(StreamId),

    #[error("Failed to route stream #{stream}: {source}")]
    Routing {
        stream: StreamId,
        source: AudioServerError,
    },

    #[error("Audio routing is not set up")]
    NotSetUp,
}

/// What teardown managed to undo
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownReport {
    pub routes_restored: usize,
    pub routes_failed: usize,
    pub modules_unloaded: usize,
    pub modules_failed: usize,
}

impl TeardownReport {
    pub fn is_clean(&self) -> bool {
        self.routes_failed == 0 && self.modules_failed == 0
    }
}

#[derive(Debug, Default)]
struct RouterState {
    original_default: Option<SinkId>,
    null_sink_module: Option<ModuleId>,
    loopback_module: Option<ModuleId>,
    routes: Vec<AudioRoute>,
}

impl RouterState {
    fn is_set_up(&self) -> bool {
        self.null_sink_module.is_some()
    }
}

/// Audio router over an [`AudioServer`]
pub struct AudioRouter {
    server: Arc<dyn AudioServer>,
    sample_rate: u32,
    channels: u16,
    state: Mutex<RouterState>,
}

impl AudioRouter {
    pub fn new(server: Arc<dyn AudioServer>, sample_rate: u32, channels: u16) -> Self {
        Self {
            server,
            sample_rate,
            channels,
            state: Mutex::new(RouterState::default()),
        }
    }

    pub fn record_sink(&self) -> SinkId {
        SinkId::record_sink()
    }

    /// Create the recording sink and its loopback.
    ///
    /// A partial setup is rolled back before the error is returned. Calling
    /// this again after a successful setup is a no-op.
    pub async fn setup(&self) -> Result<SinkId, AudioRouterError> {
        let mut state = self.state.lock().await;
        if state.is_set_up() {
            return Ok(self.record_sink());
        }

        match self.setup_locked(&mut state).await {
            Ok(sink) => Ok(sink),
            Err(e) => {
                warn!("Audio setup failed, rolling back: {}", e);
                self.teardown_locked(&mut state).await;
                Err(AudioRouterError::Setup(e))
            }
        }
    }

    async fn setup_locked(&self, state: &mut RouterState) -> Result<SinkId, AudioServerError> {
        self.server.ping().await?;
        info!("Setting up audio capture");

        let original = self.resolve_output_sink().await?;
        debug!("Original sink: {}", original);
        state.original_default = Some(original.clone());

        let null_sink = self
            .server
            .load_null_sink(
                RECORD_SINK_NAME,
                RECORD_SINK_DESCRIPTION,
                self.sample_rate,
                self.channels,
            )
            .await?;
        debug!("Created null sink module: {}", null_sink);
        state.null_sink_module = Some(null_sink);

        let record_sink = self.record_sink();
        let loopback = self
            .server
            .load_loopback(&record_sink.monitor_source(), &original)
            .await?;
        debug!("Created loopback module: {}", loopback);
        state.loopback_module = Some(loopback);

        info!("Keeping {} as default output", original);
        Ok(record_sink)
    }

    /// Default sink, or the first real sink when the default is unusable
    async fn resolve_output_sink(&self) -> Result<SinkId, AudioServerError> {
        match self.server.default_sink().await {
            Ok(sink) if sink.as_str() != RECORD_SINK_NAME && !sink.as_str().is_empty() => {
                return Ok(sink)
            }
            Ok(sink) => debug!("Default sink '{}' is not usable, looking for another", sink),
            Err(e) => debug!("Could not read default sink: {}", e),
        }

        self.server
            .list_sinks()
            .await?
            .into_iter()
            .find(|sink| !sink.is_record_sink())
            .map(|sink| SinkId::new(sink.name))
            .ok_or_else(|| AudioServerError::Parse("No real audio sink found".to_string()))
    }

    /// Playing streams, excluding loopbacks such as the one feeding the speakers.
    pub async fn list_candidate_streams(&self) -> Result<Vec<StreamInfo>, AudioServerError> {
        let streams = self.server.list_streams().await?;
        Ok(streams
            .into_iter()
            .filter(|s| !s.app_name.to_lowercase().contains("loopback"))
            .collect())
    }

    /// Move one stream into the recording sink.
    pub async fn route(&self, stream_id: StreamId) -> Result<AudioRoute, AudioRouterError> {
        let mut state = self.state.lock().await;
        if !state.is_set_up() {
            return Err(AudioRouterError::NotSetUp);
        }

        if let Some(existing) = state.routes.iter().find(|r| r.stream_id == stream_id && r.is_active()) {
            return Ok(existing.clone());
        }

        let streams = self
            .server
            .list_streams()
            .await
            .map_err(|source| AudioRouterError::Routing { stream: stream_id, source })?;
        let stream = streams
            .into_iter()
            .find(|s| s.id == stream_id)
            .ok_or(AudioRouterError::StreamGone(stream_id))?;

        let route = self.route_locked(&mut state, stream).await?;
        Ok(route)
    }

    async fn route_locked(
        &self,
        state: &mut RouterState,
        stream: StreamInfo,
    ) -> Result<AudioRoute, AudioRouterError> {
        let target = self.record_sink();
        let already_recorded = self.is_record_sink(&stream.sink).await;
        self.server
            .move_stream(stream.id, &target)
            .await
            .map_err(|source| AudioRouterError::Routing { stream: stream.id, source })?;

        // a stream already in the record sink goes back to the real output
        let original = if already_recorded {
            state.original_default.clone().unwrap_or_else(|| stream.sink.clone())
        } else {
            stream.sink.clone()
        };

        info!("Moved {} to record sink", stream.app_name);
        let route = AudioRoute::new(stream.id, stream.app_name, original, target);
        state.routes.push(route.clone());
        Ok(route)
    }

    /// Streams report their sink by index, the record sink is known by name
    async fn is_record_sink(&self, sink: &SinkId) -> bool {
        if sink.as_str() == RECORD_SINK_NAME {
            return true;
        }
        let Ok(index) = sink.as_str().parse::<u32>() else {
            return false;
        };
        match self.server.list_sinks().await {
            Ok(sinks) => sinks.iter().any(|s| s.index == index && s.is_record_sink()),
            Err(e) => {
                debug!("Could not list sinks: {}", e);
                false
            }
        }
    }

    /// Route every candidate stream whose application name contains one of `apps`.
    ///
    /// Per-stream failures are logged and skipped.
    pub async fn route_selected(&self, apps: &[String]) -> Result<Vec<AudioRoute>, AudioRouterError> {
        let mut state = self.state.lock().await;
        if !state.is_set_up() {
            return Err(AudioRouterError::NotSetUp);
        }

        let streams = match self.list_candidate_streams().await {
            Ok(streams) => streams,
            Err(e) => {
                warn!("Failed to list sink inputs: {}", e);
                Vec::new()
            }
        };

        let mut routed = Vec::new();
        for stream in streams {
            if !apps.iter().any(|app| stream.matches_app(app)) {
                continue;
            }
            if state.routes.iter().any(|r| r.stream_id == stream.id && r.is_active()) {
                continue;
            }
            let name = stream.app_name.clone();
            match self.route_locked(&mut state, stream).await {
                Ok(route) => routed.push(route),
                Err(e) => warn!("Failed to move {}: {}", name, e),
            }
        }

        if routed.is_empty() {
            warn!("No matching applications found to capture");
        } else {
            info!("Audio setup complete. Moved {} applications.", routed.len());
        }
        Ok(routed)
    }

    /// Routes created so far, including restored ones
    pub async fn routes(&self) -> Vec<AudioRoute> {
        self.state.lock().await.routes.clone()
    }

    pub async fn is_set_up(&self) -> bool {
        self.state.lock().await.is_set_up()
    }

    /// Restore every route, then unload the loopback and the null sink.
    ///
    /// Never fails. Each step is attempted even if an earlier one failed.
    pub async fn teardown(&self) -> TeardownReport {
        let mut state = self.state.lock().await;
        self.teardown_locked(&mut state).await
    }

    async fn teardown_locked(&self, state: &mut RouterState) -> TeardownReport {
        let mut report = TeardownReport::default();

        for route in state.routes.iter_mut().filter(|r| r.is_active()) {
            match self.server.move_stream(route.stream_id, &route.original_sink).await {
                Ok(()) => {
                    debug!("Restored {} to {}", route.app_name, route.original_sink);
                    route.mark_restored();
                    report.routes_restored += 1;
                }
                Err(e) => {
                    warn!("Failed to restore {} (stream #{}): {}", route.app_name, route.stream_id, e);
                    route.mark_restore_failed(e.to_string());
                    report.routes_failed += 1;
                }
            }
        }

        // loopback first, it reads from the null sink's monitor
        for (label, module) in [
            ("loopback", state.loopback_module.take()),
            ("null sink", state.null_sink_module.take()),
        ] {
            let Some(module) = module else { continue };
            match self.server.unload_module(module).await {
                Ok(()) => {
                    debug!("Unloaded {} module", label);
                    report.modules_unloaded += 1;
                }
                Err(e) => {
                    warn!("Failed to unload {} module {}: {}", label, module, e);
                    report.modules_failed += 1;
                }
            }
        }

        state.original_default = None;

        if report.is_clean() {
            if report.modules_unloaded > 0 || report.routes_restored > 0 {
                info!("Audio cleanup completed successfully");
            }
        } else {
            warn!("Audio cleanup completed with some errors");
        }
        report
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::audio::{RouteStatus, SinkInfo};
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    pub(crate) const RECORD_SINK_INDEX: u32 = 118;

    /// In-memory audio server that records every call
    #[derive(Default)]
    pub(crate) struct MockAudioServer {
        pub unreachable: bool,
        pub fail_loopback: bool,
        pub streams: StdMutex<Vec<StreamInfo>>,
        /// streams whose restore move fails
        pub fail_restore: Vec<StreamId>,
        /// shared so other fakes can log into the same sequence
        pub calls: Arc<StdMutex<Vec<String>>>,
        pub next_module: StdMutex<u32>,
    }

    impl MockAudioServer {
        pub fn with_streams(streams: Vec<(u32, &str, &str)>) -> Self {
            let streams = streams
                .into_iter()
                .map(|(id, app, sink)| StreamInfo {
                    id: StreamId(id),
                    app_name: app.to_string(),
                    sink: SinkId::new(sink),
                })
                .collect();
            Self {
                streams: StdMutex::new(streams),
                ..Default::default()
            }
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn count(&self, prefix: &str) -> usize {
            self.calls().iter().filter(|c| c.starts_with(prefix)).count()
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl AudioServer for MockAudioServer {
        async fn ping(&self) -> Result<(), AudioServerError> {
            self.record("info".to_string());
            if self.unreachable {
                return Err(AudioServerError::Unreachable("Connection refused".to_string()));
            }
            Ok(())
        }

        async fn default_sink(&self) -> Result<SinkId, AudioServerError> {
            Ok(SinkId::new("speakers"))
        }

        /// Streams name their sink by these indexes, as `pactl` prints them
        async fn list_sinks(&self) -> Result<Vec<SinkInfo>, AudioServerError> {
            let sink = |index: u32, name: &str| SinkInfo {
                index,
                name: name.to_string(),
                state: None,
            };
            Ok(vec![
                sink(0, "speakers"),
                sink(1, "headset"),
                sink(RECORD_SINK_INDEX, RECORD_SINK_NAME),
            ])
        }

        async fn list_streams(&self) -> Result<Vec<StreamInfo>, AudioServerError> {
            Ok(self.streams.lock().unwrap().clone())
        }

        async fn load_null_sink(
            &self,
            name: &str,
            _description: &str,
            rate: u32,
            channels: u16,
        ) -> Result<ModuleId, AudioServerError> {
            self.record(format!("load null-sink {} {} {}", name, rate, channels));
            let mut next = self.next_module.lock().unwrap();
            *next += 1;
            Ok(ModuleId(*next))
        }

        async fn load_loopback(&self, source: &str, sink: &SinkId) -> Result<ModuleId, AudioServerError> {
            self.record(format!("load loopback {} {}", source, sink));
            if self.fail_loopback {
                return Err(AudioServerError::CommandFailed {
                    command: "pactl load-module module-loopback".to_string(),
                    code: Some(1),
                    stderr: "Module initialization failed".to_string(),
                });
            }
            let mut next = self.next_module.lock().unwrap();
            *next += 1;
            Ok(ModuleId(*next))
        }

        async fn move_stream(&self, stream: StreamId, sink: &SinkId) -> Result<(), AudioServerError> {
            self.record(format!("move {} {}", stream, sink));
            if sink.as_str() != RECORD_SINK_NAME && self.fail_restore.contains(&stream) {
                return Err(AudioServerError::CommandFailed {
                    command: format!("pactl move-sink-input {} {}", stream, sink),
                    code: Some(1),
                    stderr: "No such entity".to_string(),
                });
            }
            Ok(())
        }

        async fn unload_module(&self, module: ModuleId) -> Result<(), AudioServerError> {
            self.record(format!("unload {}", module));
            Ok(())
        }
    }

    fn router(server: Arc<MockAudioServer>) -> AudioRouter {
        AudioRouter::new(server, 48_000, 2)
    }

    #[tokio::test]
    async fn setup_loads_sink_and_loopback() {
        let server = Arc::new(MockAudioServer::default());
        let router = router(Arc::clone(&server));

        let sink = router.setup().await.unwrap();
        assert_eq!(sink, SinkId::record_sink());
        assert_eq!(
            server.calls(),
            vec![
                "info",
                "load null-sink record_sink 48000 2",
                "load loopback record_sink.monitor speakers",
            ]
        );

        // second setup does nothing
        router.setup().await.unwrap();
        assert_eq!(server.count("load"), 2);
    }

    #[tokio::test]
    async fn unreachable_server_creates_nothing() {
        let server = Arc::new(MockAudioServer {
            unreachable: true,
            ..Default::default()
        });
        let router = router(Arc::clone(&server));

        let err = router.setup().await.unwrap_err();
        assert!(matches!(err, AudioRouterError::Setup(AudioServerError::Unreachable(_))));
        assert_eq!(server.count("load"), 0);
        assert!(!router.is_set_up().await);
    }

    #[tokio::test]
    async fn partial_setup_is_rolled_back() {
        let server = Arc::new(MockAudioServer {
            fail_loopback: true,
            ..Default::default()
        });
        let router = router(Arc::clone(&server));

        assert!(router.setup().await.is_err());
        assert_eq!(server.count("unload 1"), 1);
        assert!(!router.is_set_up().await);
    }

    #[tokio::test]
    async fn route_selected_matches_case_insensitively() {
        let server = Arc::new(MockAudioServer::with_streams(vec![
            (10, "Firefox", "0"),
            (11, "mpv", "0"),
            (12, "Google Chrome", "1"),
        ]));
        let router = router(Arc::clone(&server));
        router.setup().await.unwrap();

        let apps = vec!["firefox".to_string(), "chrome".to_string()];
        let routes = router.route_selected(&apps).await.unwrap();

        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].stream_id, StreamId(10));
        assert_eq!(routes[1].original_sink, SinkId::new("1"));
        assert_eq!(server.count("move"), 2);
    }

    #[tokio::test]
    async fn route_requires_setup() {
        let server = Arc::new(MockAudioServer::with_streams(vec![(10, "mpv", "0")]));
        let router = router(server);
        assert_eq!(router.route(StreamId(10)).await.unwrap_err(), AudioRouterError::NotSetUp);
    }

    #[tokio::test]
    async fn route_missing_stream_fails() {
        let server = Arc::new(MockAudioServer::with_streams(vec![(10, "mpv", "0")]));
        let router = router(server);
        router.setup().await.unwrap();

        let route = router.route(StreamId(10)).await.unwrap();
        assert_eq!(route.original_sink, SinkId::new("0"));
        assert_eq!(
            router.route(StreamId(99)).await.unwrap_err(),
            AudioRouterError::StreamGone(StreamId(99))
        );
    }

    #[tokio::test]
    async fn teardown_attempts_every_restore() {
        let mut server = MockAudioServer::with_streams(vec![
            (10, "Firefox", "0"),
            (11, "Spotify", "0"),
            (12, "discord", "0"),
        ]);
        server.fail_restore = vec![StreamId(10)];
        let server = Arc::new(server);
        let router = router(Arc::clone(&server));
        router.setup().await.unwrap();
        let apps: Vec<String> = ["Firefox", "Spotify", "discord"].iter().map(|s| s.to_string()).collect();
        router.route_selected(&apps).await.unwrap();

        let report = router.teardown().await;

        assert_eq!(report.routes_failed, 1);
        assert_eq!(report.routes_restored, 2);
        assert_eq!(report.modules_unloaded, 2);
        assert_eq!(server.count("move 11 0"), 1);
        assert_eq!(server.count("move 12 0"), 1);

        let routes = router.routes().await;
        assert!(matches!(routes[0].status(), RouteStatus::RestoreFailed(_)));
        assert!(routes[1].is_restored());
    }

    #[tokio::test]
    async fn stream_left_in_record_sink_goes_back_to_real_output() {
        let index = RECORD_SINK_INDEX.to_string();
        let server = Arc::new(MockAudioServer::with_streams(vec![
            (10, "mpv", index.as_str()),
            (11, "Firefox", "1"),
        ]));
        let router = router(Arc::clone(&server));
        router.setup().await.unwrap();

        let apps = vec!["mpv".to_string(), "firefox".to_string()];
        let routes = router.route_selected(&apps).await.unwrap();
        assert_eq!(routes[0].original_sink, SinkId::new("speakers"));
        assert_eq!(routes[1].original_sink, SinkId::new("1"));

        router.teardown().await;
        assert_eq!(server.count("move 10 speakers"), 1);
        assert_eq!(server.count(&format!("move 10 {}", index)), 0);
        assert_eq!(server.count("move 11 1"), 1);
    }

    #[tokio::test]
    async fn teardown_is_idempotent() {
        let server = Arc::new(MockAudioServer::with_streams(vec![(10, "mpv", "0")]));
        let router = router(Arc::clone(&server));
        router.setup().await.unwrap();
        router.route(StreamId(10)).await.unwrap();

        router.teardown().await;
        let calls_after_first = server.calls().len();
        let second = router.teardown().await;

        assert_eq!(second, TeardownReport::default());
        assert_eq!(server.calls().len(), calls_after_first);
    }
}
