//! `HTMLAudioElement` media backend

use crate::{BackendEvent, LoadOptions, MediaBackend, MediaHandle, PlaybackError, Result, SourceRef};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{DomException, HtmlAudioElement};

type EventQueue = Rc<RefCell<VecDeque<BackendEvent>>>;

/// One audio element plus the handlers attached to it
///
/// The closures must live as long as the element references them; they are
/// detached in [`MediaElement::detach`] before being dropped.
struct MediaElement {
    audio: HtmlAudioElement,
    on_ready: Closure<dyn FnMut()>,
    on_error: Closure<dyn FnMut()>,
    on_ended: Closure<dyn FnMut()>,
}

impl MediaElement {
    fn attach(audio: HtmlAudioElement, handle: MediaHandle, queue: &EventQueue) -> Self {
        let ready = Rc::new(Cell::new(false));

        let on_ready = {
            let audio = audio.clone();
            let queue = Rc::clone(queue);
            let ready = Rc::clone(&ready);
            Closure::<dyn FnMut()>::new(move || {
                ready.set(true);
                queue.borrow_mut().push_back(BackendEvent::Ready {
                    handle,
                    duration_secs: audio.duration(),
                });
            })
        };

        // Element errors after loadedmetadata (stalled stream, decode
        // failure mid-file) are playback failures
        let on_error = {
            let audio = audio.clone();
            let queue = Rc::clone(queue);
            Closure::<dyn FnMut()>::new(move || {
                let message = audio
                    .error()
                    .map(|e| format!("media error {}: {}", e.code(), e.message()))
                    .unwrap_or_else(|| "media element error".to_string());
                queue
                    .borrow_mut()
                    .push_back(BackendEvent::failure(handle, ready.get(), message));
            })
        };

        let on_ended = {
            let queue = Rc::clone(queue);
            Closure::<dyn FnMut()>::new(move || {
                queue.borrow_mut().push_back(BackendEvent::Ended { handle });
            })
        };

        audio.set_onloadedmetadata(Some(on_ready.as_ref().unchecked_ref()));
        audio.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        audio.set_onended(Some(on_ended.as_ref().unchecked_ref()));

        Self {
            audio,
            on_ready,
            on_error,
            on_ended,
        }
    }

    fn detach(self) {
        let Self {
            audio,
            on_ready,
            on_error,
            on_ended,
        } = self;

        audio.set_onloadedmetadata(None);
        audio.set_onerror(None);
        audio.set_onended(None);
        audio.pause().ok();
        // Dropping the src and reloading aborts any in-flight download
        audio.remove_attribute("src").ok();
        audio.load();

        drop((on_ready, on_error, on_ended));
    }
}

/// Browser media backend
///
/// Every `create` makes a fresh `<audio>` element; nothing is inserted into
/// the document. Element notifications land in a shared queue that the
/// controller drains through [`MediaBackend::poll_event`].
pub struct HtmlMediaBackend {
    next_handle: u64,
    elements: HashMap<MediaHandle, MediaElement>,
    events: EventQueue,
}

impl HtmlMediaBackend {
    pub fn new() -> Self {
        Self {
            next_handle: 0,
            elements: HashMap::new(),
            events: Rc::new(RefCell::new(VecDeque::new())),
        }
    }

    fn audio(&self, handle: MediaHandle) -> Result<&HtmlAudioElement> {
        self.elements
            .get(&handle)
            .map(|element| &element.audio)
            .ok_or(PlaybackError::UnknownHandle(handle))
    }
}

impl Default for HtmlMediaBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaBackend for HtmlMediaBackend {
    fn create(&mut self, source: &SourceRef, options: &LoadOptions) -> Result<MediaHandle> {
        let audio = HtmlAudioElement::new_with_src(source.as_str()).map_err(js_error)?;
        audio.set_preload(if options.streaming { "metadata" } else { "auto" });
        audio.set_volume(f64::from(options.volume));

        self.next_handle += 1;
        let handle = MediaHandle(self.next_handle);
        let element = MediaElement::attach(audio, handle, &self.events);
        self.elements.insert(handle, element);

        Ok(handle)
    }

    fn play(&mut self, handle: MediaHandle) -> Result<()> {
        let promise = self.audio(handle)?.play().map_err(js_error)?;

        let queue = Rc::clone(&self.events);
        wasm_bindgen_futures::spawn_local(async move {
            let Err(err) = JsFuture::from(promise).await else {
                return;
            };
            // A pause before playback starts rejects the promise with AbortError
            let aborted = err
                .dyn_ref::<DomException>()
                .is_some_and(|e| e.name() == "AbortError");
            if !aborted {
                queue.borrow_mut().push_back(BackendEvent::PlaybackError {
                    handle,
                    message: describe(&err),
                });
            }
        });

        Ok(())
    }

    fn pause(&mut self, handle: MediaHandle) -> Result<()> {
        self.audio(handle)?.pause().map_err(js_error)
    }

    fn stop(&mut self, handle: MediaHandle) -> Result<()> {
        let audio = self.audio(handle)?;
        audio.pause().map_err(js_error)?;
        audio.set_current_time(0.0);
        Ok(())
    }

    fn seek(&mut self, handle: MediaHandle, seconds: f64) -> Result<()> {
        self.audio(handle)?.set_current_time(seconds);
        Ok(())
    }

    fn position(&self, handle: MediaHandle) -> f64 {
        self.audio(handle).map(|a| a.current_time()).unwrap_or(0.0)
    }

    fn duration(&self, handle: MediaHandle) -> f64 {
        self.audio(handle).map(|a| a.duration()).unwrap_or(0.0)
    }

    fn set_volume(&mut self, handle: MediaHandle, level: f32) -> Result<()> {
        self.audio(handle)?.set_volume(f64::from(level));
        Ok(())
    }

    fn unload(&mut self, handle: MediaHandle) {
        if let Some(element) = self.elements.remove(&handle) {
            element.detach();
        }
    }

    fn poll_event(&mut self) -> Option<BackendEvent> {
        self.events.borrow_mut().pop_front()
    }
}

fn describe(value: &JsValue) -> String {
    if let Some(exception) = value.dyn_ref::<DomException>() {
        return format!("{}: {}", exception.name(), exception.message());
    }
    value
        .as_string()
        .unwrap_or_else(|| format!("{:?}", value))
}

fn js_error(value: JsValue) -> PlaybackError {
    PlaybackError::Backend(describe(&value))
}
