//! Callback registry shared by the device worker and the network client
//!
//! Callbacks are stored as `Arc`s behind a plain mutex and cloned out before
//! invocation, so a callback body may legally call back into its own
//! registration (re-register or clear itself) without deadlocking. This
//! replaces the reentrant-mutex approach with the cheaper clone-then-invoke
//! pattern.

use crate::controls::{Button, Dial, Slider};
use std::sync::{Arc, Mutex};

pub type ButtonCallback = Arc<dyn Fn(Button, bool) + Send + Sync>;
pub type DialCallback = Arc<dyn Fn(Dial, f32) + Send + Sync>;
pub type SliderCallback = Arc<dyn Fn(Slider, f32) + Send + Sync>;

/// Thread-safe storage for the three user callback slots.
#[derive(Default)]
pub struct CallbackRegistry {
    button: Mutex<Option<ButtonCallback>>,
    dial: Mutex<Option<DialCallback>>,
    slider: Mutex<Option<SliderCallback>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_button(&self, callback: impl Fn(Button, bool) + Send + Sync + 'static) {
        *self.button.lock().unwrap() = Some(Arc::new(callback));
    }

    pub fn clear_button(&self) {
        *self.button.lock().unwrap() = None;
    }

    pub fn set_dial(&self, callback: impl Fn(Dial, f32) + Send + Sync + 'static) {
        *self.dial.lock().unwrap() = Some(Arc::new(callback));
    }

    pub fn clear_dial(&self) {
        *self.dial.lock().unwrap() = None;
    }

    pub fn set_slider(&self, callback: impl Fn(Slider, f32) + Send + Sync + 'static) {
        *self.slider.lock().unwrap() = Some(Arc::new(callback));
    }

    pub fn clear_slider(&self) {
        *self.slider.lock().unwrap() = None;
    }

    /// Invoke the button callback, if one is registered.
    ///
    /// The slot lock is released before the call.
    pub fn invoke_button(&self, button: Button, pressed: bool) {
        let callback = self.button.lock().unwrap().clone();
        if let Some(callback) = callback {
            callback(button, pressed);
        }
    }

    /// Invoke the dial callback, if one is registered.
    pub fn invoke_dial(&self, dial: Dial, value: f32) {
        let callback = self.dial.lock().unwrap().clone();
        if let Some(callback) = callback {
            callback(dial, value);
        }
    }

    /// Invoke the slider callback, if one is registered.
    pub fn invoke_slider(&self, slider: Slider, value: f32) {
        let callback = self.slider.lock().unwrap().clone();
        if let Some(callback) = callback {
            callback(slider, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_invoke_and_clear() {
        let registry = CallbackRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));

        let counter = count.clone();
        registry.set_button(move |button, pressed| {
            assert_eq!(button, Button::Play);
            assert!(pressed);
            counter.fetch_add(1, Ordering::SeqCst);
        });

        registry.invoke_button(Button::Play, true);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        registry.clear_button();
        registry.invoke_button(Button::Play, true);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_callback_may_clear_itself() {
        // A callback clearing its own registration must not deadlock
        let registry = Arc::new(CallbackRegistry::new());
        let count = Arc::new(AtomicUsize::new(0));

        let registry_clone = registry.clone();
        let counter = count.clone();
        registry.set_dial(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            registry_clone.clear_dial();
        });

        registry.invoke_dial(Dial::Group1, 0.5);
        registry.invoke_dial(Dial::Group1, 0.5);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
