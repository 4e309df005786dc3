//! Callback registry for engine events

use crate::api::types::EngineEvent;

/// Callback function type for engine events
pub type EventCallback = Box<dyn Fn(&EngineEvent) + Send + Sync>;

/// Callback registration handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackHandle(u32);

impl CallbackHandle {
    fn new(id: u32) -> Self {
        CallbackHandle(id)
    }

    pub fn id(&self) -> u32 {
        self.0
    }
}

/// Registered callbacks, invoked in registration order
#[derive(Default)]
pub(crate) struct CallbackRegistry {
    callback_counter: u32,
    callbacks: Vec<(CallbackHandle, EventCallback)>,
}

impl CallbackRegistry {
    pub(crate) fn register(&mut self, callback: EventCallback) -> CallbackHandle {
        self.callback_counter += 1;
        let handle = CallbackHandle::new(self.callback_counter);
        self.callbacks.push((handle, callback));
        handle
    }

    pub(crate) fn unregister(&mut self, handle: CallbackHandle) -> bool {
        let before = self.callbacks.len();
        self.callbacks.retain(|(h, _)| *h != handle);
        self.callbacks.len() != before
    }

    pub(crate) fn dispatch(&self, event: &EngineEvent) {
        for (_, callback) in &self.callbacks {
            callback(event);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.callbacks.len()
    }
}
