use std::path::Path;
use std::sync::Arc;

use anchorage_3d::{camera::CameraId, depth::DepthSnapshot, pose::PoseError};

use crate::config::SessionConfig;
use crate::error::{PlacementError, SessionError};
use crate::events::{ServiceEvent, UpdateListener};
use crate::extrinsics::{ExtrinsicsCache, ExtrinsicsSet};
use crate::interfaces::{PlaneFitter, Renderer, TrackingService};
use crate::pipeline::{AnchorPipeline, AnchorPose};
use crate::store::DepthSnapshotStore;
use crate::touch::{normalize_touch, TouchAction, TouchEvent};

/// Routes tracking updates: depth into the store, colour frames to the renderer.
struct SessionListener<R> {
    store: Arc<DepthSnapshotStore>,
    renderer: Arc<R>,
    color_camera: CameraId,
}

impl<R: Renderer> UpdateListener for SessionListener<R> {
    fn on_frame_available(&self, camera: CameraId) {
        if camera == self.color_camera {
            self.renderer.on_frame_available(camera);
        }
    }

    fn on_depth_available(&self, snapshot: Arc<DepthSnapshot>) {
        log::trace!(
            "depth snapshot with {} points at t={:.6}",
            snapshot.len(),
            snapshot.timestamp()
        );
        self.store.update(snapshot);
    }

    fn on_service_event(&self, event: &ServiceEvent) {
        log::debug!("service event {}={} at t={:.6}", event.key, event.value, event.timestamp);
    }
}

/// An AR session: connects the tracking service, feeds the depth store and turns touches
/// into anchors.
///
/// Example:
///
/// ```no_run
/// # fn run<S, F, R>(service: S, fitter: F, renderer: R) -> Result<(), Box<dyn std::error::Error>>
/// # where
/// #     S: anchorage_ar::interfaces::TrackingService + 'static,
/// #     F: anchorage_ar::interfaces::PlaneFitter + 'static,
/// #     R: anchorage_ar::interfaces::Renderer + 'static,
/// # {
/// use std::path::Path;
/// use std::sync::Arc;
/// use anchorage_ar::{config::SessionConfig, session::ArSession};
///
/// let mut session = ArSession::new(
///     Arc::new(service),
///     Arc::new(fitter),
///     Arc::new(renderer),
///     SessionConfig::default(),
/// );
/// session.connect()?;
///
/// // a tap in the middle of a 1280x720 view
/// let anchor = session.on_touch_up(640.0, 360.0, 1280.0, 720.0)?;
/// println!("anchor at {:?}", anchor.position());
///
/// session.disconnect();
/// # Ok(())
/// # }
/// ```
pub struct ArSession<S, F, R>
where
    S: TrackingService + 'static,
    F: PlaneFitter + 'static,
    R: Renderer + 'static,
{
    service: Arc<S>,
    fitter: Arc<F>,
    renderer: Arc<R>,
    config: SessionConfig,
    store: Arc<DepthSnapshotStore>,
    extrinsics: ExtrinsicsCache,
    pipeline: Option<AnchorPipeline<S, F, R>>,
}

impl<S, F, R> ArSession<S, F, R>
where
    S: TrackingService + 'static,
    F: PlaneFitter + 'static,
    R: Renderer + 'static,
{
    /// Create a disconnected session.
    pub fn new(service: Arc<S>, fitter: Arc<F>, renderer: Arc<R>, config: SessionConfig) -> Self {
        let extrinsics = ExtrinsicsCache::new(config.extrinsics_time);
        Self {
            service,
            fitter,
            renderer,
            config,
            store: Arc::new(DepthSnapshotStore::new()),
            extrinsics,
            pipeline: None,
        }
    }

    /// Create a disconnected session configured from a JSON file.
    pub fn from_config_file(
        service: Arc<S>,
        fitter: Arc<F>,
        renderer: Arc<R>,
        path: impl AsRef<Path>,
    ) -> Result<Self, SessionError> {
        let config = SessionConfig::from_file(path)?;
        Ok(Self::new(service, fitter, renderer, config))
    }

    /// The session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The depth snapshot store fed by the tracking service.
    pub fn store(&self) -> &Arc<DepthSnapshotStore> {
        &self.store
    }

    /// The frozen extrinsics of the current session, once connected.
    pub fn extrinsics(&self) -> Option<&ExtrinsicsSet> {
        self.extrinsics.get()
    }

    /// The placement pipeline, once connected.
    pub fn pipeline(&self) -> Option<&AnchorPipeline<S, F, R>> {
        self.pipeline.as_ref()
    }

    /// Whether [`ArSession::connect`] succeeded and the session was not disconnected since.
    pub fn is_connected(&self) -> bool {
        self.pipeline.is_some()
    }

    /// The last anchor published to the renderer in this session.
    pub fn last_anchor(&self) -> Option<AnchorPose> {
        self.pipeline.as_ref().and_then(|p| p.last_anchor())
    }

    /// Connect the tracking service and prepare the placement pipeline.
    ///
    /// The extrinsics are captured right after connecting, retried while the service is
    /// not ready yet. Does nothing if the session is already connected.
    pub fn connect(&mut self) -> Result<(), SessionError> {
        if self.pipeline.is_some() {
            return Ok(());
        }

        self.service.connect(&self.config)?;

        match self.start() {
            Ok(pipeline) => {
                self.pipeline = Some(pipeline);
                log::info!("session connected");
                Ok(())
            }
            Err(err) => {
                log::error!("failed to start session: {err}");
                self.service.disconnect();
                self.store.clear();
                self.extrinsics = ExtrinsicsCache::new(self.config.extrinsics_time);
                Err(err)
            }
        }
    }

    fn start(&self) -> Result<AnchorPipeline<S, F, R>, SessionError> {
        // a listener of the previous connection may still have written into the store
        self.store.clear();
        let listener = Arc::new(SessionListener {
            store: self.store.clone(),
            renderer: self.renderer.clone(),
            color_camera: self.config.color_camera,
        });
        self.service.connect_listener(listener)?;

        let extrinsics = self.capture_extrinsics()?;
        let intrinsics = self.service.camera_intrinsics(self.config.color_camera)?;
        log::debug!("{:?} intrinsics: {intrinsics:?}", self.config.color_camera);

        Ok(AnchorPipeline::new(
            self.store.clone(),
            self.service.clone(),
            self.fitter.clone(),
            self.renderer.clone(),
            intrinsics,
            &extrinsics,
            self.config.placement.clone(),
        )?)
    }

    fn capture_extrinsics(&self) -> Result<ExtrinsicsSet, PoseError> {
        let policy = &self.config.extrinsics_retry;
        let attempts = policy.attempts.max(1);

        let mut attempt = 1;
        loop {
            match self.extrinsics.capture(self.service.as_ref()) {
                Ok(extrinsics) => return Ok(extrinsics),
                Err(PoseError::NotReady { pair }) if attempt < attempts => {
                    log::debug!("{pair} not ready (attempt {attempt}/{attempts}), retrying");
                    std::thread::sleep(policy.delay());
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Disconnect the tracking service and drop the depth data and extrinsics of the
    /// session. Does nothing if the session is not connected.
    pub fn disconnect(&mut self) {
        if self.pipeline.take().is_none() {
            return;
        }
        self.service.disconnect();
        self.store.clear();
        self.extrinsics = ExtrinsicsCache::new(self.config.extrinsics_time);
        log::info!("session disconnected");
    }

    /// Place the object under a touch released at pixel `(x, y)` of a `width` x `height`
    /// view.
    ///
    /// Failures are logged and returned; the previous anchor stays in place.
    pub fn on_touch_up(
        &self,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<AnchorPose, PlacementError> {
        let result = self.place(x, y, width, height);
        if let Err(err) = &result {
            log::warn!("placement at ({x}, {y}) failed: {err}");
        }
        result
    }

    fn place(&self, x: f64, y: f64, width: f64, height: f64) -> Result<AnchorPose, PlacementError> {
        let pipeline = self
            .pipeline
            .as_ref()
            .ok_or(PlacementError::ServiceDisconnected)?;
        let click = normalize_touch(x, y, width, height)?;
        pipeline.place_anchor(click)
    }

    /// Handle a raw pointer event. Only releases place the object; other events return
    /// `None`.
    pub fn on_touch(
        &self,
        event: TouchEvent,
        width: f64,
        height: f64,
    ) -> Option<Result<AnchorPose, PlacementError>> {
        (event.action == TouchAction::Up).then(|| self.on_touch_up(event.x, event.y, width, height))
    }
}

impl<S, F, R> Drop for ArSession<S, F, R>
where
    S: TrackingService + 'static,
    F: PlaneFitter + 'static,
    R: Renderer + 'static,
{
    fn drop(&mut self) {
        self.disconnect();
    }
}
