use std::sync::Arc;
use std::thread::JoinHandle;

use anchorage_3d::{camera::CameraId, depth::DepthSnapshot, pose::Pose};
use crossbeam_channel::{Receiver, Sender};

/// A status notification from the tracking service, e.g. an over-exposed camera.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceEvent {
    /// When the event was raised, in seconds.
    pub timestamp: f64,
    /// The event name.
    pub key: String,
    /// The event payload.
    pub value: String,
}

/// An asynchronous update delivered by the tracking service.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A new pose for one of the subscribed frame pairs.
    Pose(Pose),
    /// A new image is available for a camera.
    FrameAvailable(CameraId),
    /// A new depth snapshot.
    Depth(Arc<DepthSnapshot>),
    /// A service status notification.
    Service(ServiceEvent),
}

/// One handler per kind of [`SessionEvent`].
///
/// Handlers may be called from any thread and must not block for long.
pub trait UpdateListener: Send + Sync {
    /// A new pose. Ignored unless overridden.
    fn on_pose_available(&self, _pose: &Pose) {}

    /// A new camera image.
    fn on_frame_available(&self, camera: CameraId);

    /// A new depth snapshot.
    fn on_depth_available(&self, snapshot: Arc<DepthSnapshot>);

    /// A service status notification. Ignored unless overridden.
    fn on_service_event(&self, _event: &ServiceEvent) {}
}

/// Route an event to the matching handler of `listener`.
pub fn dispatch(listener: &dyn UpdateListener, event: SessionEvent) {
    match event {
        SessionEvent::Pose(pose) => listener.on_pose_available(&pose),
        SessionEvent::FrameAvailable(camera) => listener.on_frame_available(camera),
        SessionEvent::Depth(snapshot) => listener.on_depth_available(snapshot),
        SessionEvent::Service(event) => listener.on_service_event(&event),
    }
}

/// Create the notification channel between a tracking service and its dispatcher.
pub fn channel() -> (Sender<SessionEvent>, Receiver<SessionEvent>) {
    crossbeam_channel::unbounded()
}

/// A dedicated thread draining the notification channel into an [`UpdateListener`].
///
/// The thread stops once every sender of the channel has been dropped.
pub struct EventDispatcher {
    handle: JoinHandle<usize>,
}

impl EventDispatcher {
    /// Spawn the dispatcher thread.
    pub fn spawn(
        receiver: Receiver<SessionEvent>,
        listener: Arc<dyn UpdateListener>,
    ) -> std::io::Result<Self> {
        let handle = std::thread::Builder::new()
            .name("anchorage-events".to_string())
            .spawn(move || {
                let mut delivered = 0;
                for event in receiver.iter() {
                    dispatch(listener.as_ref(), event);
                    delivered += 1;
                }
                log::debug!("event dispatcher stopped after {delivered} events");
                delivered
            })?;
        Ok(Self { handle })
    }

    /// Wait for the channel to close. Returns the number of delivered events.
    pub fn join(self) -> std::thread::Result<usize> {
        self.handle.join()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchorage_3d::frame::CoordinateFrame;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        frames: Mutex<Vec<CameraId>>,
        depth_timestamps: Mutex<Vec<f64>>,
    }

    impl UpdateListener for Recorder {
        fn on_frame_available(&self, camera: CameraId) {
            self.frames.lock().push(camera);
        }

        fn on_depth_available(&self, snapshot: Arc<DepthSnapshot>) {
            self.depth_timestamps.lock().push(snapshot.timestamp());
        }
    }

    #[test]
    fn test_dispatcher_delivers_in_order() -> Result<(), Box<dyn std::error::Error>> {
        let recorder = Arc::new(Recorder::default());
        let (sender, receiver) = channel();
        let dispatcher = EventDispatcher::spawn(receiver, recorder.clone())?;

        sender.send(SessionEvent::FrameAvailable(CameraId::Color))?;
        sender.send(SessionEvent::Depth(Arc::new(DepthSnapshot::new(1.0, vec![]))))?;
        sender.send(SessionEvent::Pose(Pose::identity(
            CoordinateFrame::World,
            CoordinateFrame::Device,
            1.0,
        )))?;
        sender.send(SessionEvent::Service(ServiceEvent {
            timestamp: 1.1,
            key: "FisheyeOverExposed".to_string(),
            value: "true".to_string(),
        }))?;
        sender.send(SessionEvent::Depth(Arc::new(DepthSnapshot::new(2.0, vec![]))))?;
        drop(sender);

        let delivered = dispatcher.join().map_err(|_| "dispatcher panicked")?;
        assert_eq!(delivered, 5);
        assert_eq!(*recorder.frames.lock(), vec![CameraId::Color]);
        assert_eq!(*recorder.depth_timestamps.lock(), vec![1.0, 2.0]);
        Ok(())
    }
}
