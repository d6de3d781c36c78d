//! State, generation and executor bookkeeping shared by the device drivers

use super::executor::BackgroundExecutor;
use super::state::{next, CaptureState, CaptureTransition, DeviceFault, Generation};
use super::{DeviceEvent, OnCameraStartedListener};
use crate::error::{MediaError, MediaResult};
use crate::surface::DestinationSurface;
use crate::viewport::FrameInfo;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

const EVENT_CAPACITY: usize = 64;

struct Core<H> {
    state: CaptureState,
    generation: Generation,
    frame_info: Option<FrameInfo>,
    executor: Option<Arc<BackgroundExecutor>>,
    /// Executors stopped by a fault or disconnect, joined outside the lock
    retired: Vec<Arc<BackgroundExecutor>>,
    listener: Option<OnCameraStartedListener>,
    handles: H,
}

/// Driver-independent half of a capture device.
///
/// `H` holds the driver's platform handles. They are only ever touched under
/// the lifecycle lock and are handed back to the driver for release.
pub(crate) struct DeviceLifecycle<H> {
    label: &'static str,
    core: Mutex<Core<H>>,
    events: broadcast::Sender<DeviceEvent>,
}

impl<H: Default> DeviceLifecycle<H> {
    pub(crate) fn new(label: &'static str) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            label,
            core: Mutex::new(Core {
                state: CaptureState::Closed,
                generation: Generation::default(),
                frame_info: None,
                executor: None,
                retired: Vec::new(),
                listener: None,
                handles: H::default(),
            }),
            events,
        }
    }

    pub(crate) fn label(&self) -> &'static str {
        self.label
    }

    pub(crate) fn state(&self) -> CaptureState {
        self.core.lock().state.clone()
    }

    pub(crate) fn generation(&self) -> Generation {
        self.core.lock().generation
    }

    pub(crate) fn is_current(&self, generation: Generation) -> bool {
        self.core.lock().generation == generation
    }

    pub(crate) fn frame_info(&self) -> Option<FrameInfo> {
        self.core.lock().frame_info
    }

    pub(crate) fn set_listener(&self, listener: Option<OnCameraStartedListener>) {
        self.core.lock().listener = listener;
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: DeviceEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// CLOSED -> OPENING for a new generation, with a fresh executor
    pub(crate) fn begin_open(&self) -> MediaResult<Generation> {
        let retired = {
            let mut core = self.core.lock();
            self.check_open(&core)?;
            std::mem::take(&mut core.retired)
        };
        // Jobs left on a retired executor may still need the lock
        join_all(retired);

        let executor = Arc::new(BackgroundExecutor::start(format!("{}-background", self.label))?);
        let mut core = self.core.lock();
        let to = self.check_open(&core)?;
        let generation = core.generation.bump();
        let replaced = core.executor.replace(executor);
        core.frame_info = None;
        let from = std::mem::replace(&mut core.state, to.clone());
        drop(core);

        if let Some(replaced) = replaced {
            replaced.quit_safely();
        }
        debug!(device = self.label, %generation, "{} -> {}", from, to);
        self.emit(DeviceEvent::StateChanged {
            generation,
            from,
            to,
        });
        Ok(generation)
    }

    fn check_open(&self, core: &Core<H>) -> MediaResult<CaptureState> {
        next(&core.state, &CaptureTransition::Open).ok_or_else(|| MediaError::InvalidState {
            message: format!("{} cannot start while {}", self.label, core.state),
        })
    }

    /// Apply `transition` if `generation` is current and the table allows
    /// it, then run `f` on the handles under the same lock.
    pub(crate) fn advance<R>(
        &self,
        generation: Generation,
        transition: CaptureTransition,
        f: impl FnOnce(&mut H) -> R,
    ) -> Option<R> {
        self.apply(generation, transition, false, f)
    }

    fn apply<R>(
        &self,
        generation: Generation,
        transition: CaptureTransition,
        retire: bool,
        f: impl FnOnce(&mut H) -> R,
    ) -> Option<R> {
        let mut core = self.core.lock();
        if core.generation != generation {
            debug!(
                device = self.label,
                %generation,
                current = %core.generation,
                ?transition,
                "Discarding stale transition"
            );
            return None;
        }
        let Some(to) = next(&core.state, &transition) else {
            debug!(device = self.label, %generation, state = %core.state, ?transition, "Discarding invalid transition");
            return None;
        };
        let from = std::mem::replace(&mut core.state, to.clone());
        let result = f(&mut core.handles);
        if retire {
            // Stop accepting work without joining; callbacks may be running on it
            if let Some(executor) = core.executor.take() {
                executor.quit();
                core.retired.push(executor);
            }
        }
        drop(core);

        debug!(device = self.label, %generation, "{} -> {}", from, to);
        if let CaptureState::Error(fault) = &to {
            self.emit(DeviceEvent::Fault {
                generation,
                fault: fault.clone(),
            });
        }
        self.emit(DeviceEvent::StateChanged {
            generation,
            from,
            to,
        });
        Some(result)
    }

    /// Record the selected device's characteristics
    pub(crate) fn characterize(&self, generation: Generation, info: FrameInfo) -> bool {
        let mut core = self.core.lock();
        if core.generation != generation {
            return false;
        }
        core.frame_info = Some(info);
        true
    }

    /// Run `f` on the handles if `generation` is still current
    pub(crate) fn with_handles<R>(
        &self,
        generation: Generation,
        f: impl FnOnce(&mut H) -> R,
    ) -> Option<R> {
        let mut core = self.core.lock();
        if core.generation != generation {
            return None;
        }
        Some(f(&mut core.handles))
    }

    /// Queue work on this generation's executor
    pub(crate) fn execute(&self, generation: Generation, job: impl FnOnce() + Send + 'static) -> bool {
        let executor = {
            let core = self.core.lock();
            if core.generation != generation {
                return false;
            }
            core.executor.clone()
        };
        executor.map(|executor| executor.execute(job)).unwrap_or(false)
    }

    /// Notify the started listener. Only fires in OPEN for the current
    /// generation.
    pub(crate) fn fire_started(&self, generation: Generation, surface: &Arc<DestinationSurface>) -> bool {
        let listener = {
            let core = self.core.lock();
            if core.generation != generation || core.state != CaptureState::Open {
                return false;
            }
            core.listener.clone()
        };
        info!(device = self.label, %generation, surface_id = surface.id(), "Camera started");
        if let Some(listener) = listener {
            listener(Arc::clone(surface));
        }
        self.emit(DeviceEvent::CameraStarted {
            generation,
            surface_id: surface.id(),
        });
        true
    }

    /// Move to ERROR, stop the executor and hand back the handles for release
    pub(crate) fn fault(&self, generation: Generation, fault: DeviceFault) -> Option<H> {
        let reason = fault.to_string();
        let handles = self.apply(generation, CaptureTransition::Fail(fault), true, std::mem::take);
        if handles.is_some() {
            error!(device = self.label, %generation, error = %reason, "Capture device fault");
        }
        handles
    }

    /// Asynchronous disconnect: move to CLOSED, stop the executor and hand
    /// back the handles
    pub(crate) fn disconnect(&self, generation: Generation) -> Option<H> {
        self.apply(generation, CaptureTransition::Disconnected, true, std::mem::take)
    }

    /// Invalidate every outstanding callback, stop and join the executor,
    /// then hand back whatever handles remain.
    pub(crate) fn close(&self) -> H {
        let mut core = self.core.lock();
        let generation = core.generation.bump();
        let mut executors = std::mem::take(&mut core.retired);
        executors.extend(core.executor.take());
        let handles = std::mem::take(&mut core.handles);
        let change = next(&core.state, &CaptureTransition::Close)
            .map(|to| (std::mem::replace(&mut core.state, to.clone()), to));
        drop(core);

        // Lock released: queued jobs may still need it to finish
        join_all(executors);
        if let Some((from, to)) = change {
            debug!(device = self.label, %generation, "{} -> {}", from, to);
            self.emit(DeviceEvent::StateChanged {
                generation,
                from,
                to,
            });
        }
        handles
    }
}

fn join_all(executors: Vec<Arc<BackgroundExecutor>>) {
    for executor in executors {
        executor.quit_safely();
    }
}
