use std::sync::{Arc, Mutex, MutexGuard};

use mars_events::EventQueue;

use crate::event::{Event, EventType};
use crate::trace;

#[derive(Default)]
struct Inner {
    pointer_down: bool,
    cursor_x: i32,
    cursor_y: i32,
    focused: bool,
}

/// Host-side producer of VM events.
///
/// The platform layer calls these from its UI thread; the VM thread drains the
/// shared queue through `maGetEvent`. A little pointer state is kept so that moves
/// only become drag events while a button is held.
#[derive(Clone)]
pub struct InputHub {
    inner: Arc<Mutex<Inner>>,
    events: Arc<EventQueue<Event>>,
}

impl InputHub {
    pub fn new(events: Arc<EventQueue<Event>>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner { focused: true, ..Default::default() })),
            events,
        }
    }

    pub fn events(&self) -> &Arc<EventQueue<Event>> {
        &self.events
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poison| poison.into_inner())
    }

    pub fn post(&self, ev: Event) {
        trace::event(format_args!("posted {:?}", ev));
        self.events.post(ev);
    }

    pub fn pointer_pressed(&self, x: i32, y: i32) {
        {
            let mut inner = self.lock();
            inner.pointer_down = true;
            inner.cursor_x = x;
            inner.cursor_y = y;
        }
        self.post(Event::pointer(EventType::PointerPressed, x, y));
    }

    pub fn pointer_released(&self, x: i32, y: i32) {
        {
            let mut inner = self.lock();
            inner.pointer_down = false;
            inner.cursor_x = x;
            inner.cursor_y = y;
        }
        self.post(Event::pointer(EventType::PointerReleased, x, y));
    }

    /// Cursor motion. Posts a drag event only while the pointer is down and the
    /// position actually changed.
    pub fn pointer_moved(&self, x: i32, y: i32) {
        let drag = {
            let mut inner = self.lock();
            let moved = inner.cursor_x != x || inner.cursor_y != y;
            inner.cursor_x = x;
            inner.cursor_y = y;
            inner.pointer_down && moved
        };
        if drag {
            self.post(Event::pointer(EventType::PointerDragged, x, y));
        }
    }

    /// Unconditional drag event, for hosts that track the button themselves.
    pub fn pointer_dragged(&self, x: i32, y: i32) {
        {
            let mut inner = self.lock();
            inner.cursor_x = x;
            inner.cursor_y = y;
        }
        self.post(Event::pointer(EventType::PointerDragged, x, y));
    }

    pub fn key_pressed(&self, code: i32) {
        self.post(Event::key(EventType::KeyPressed, code));
    }

    pub fn key_released(&self, code: i32) {
        self.post(Event::key(EventType::KeyReleased, code));
    }

    pub fn close(&self) {
        self.post(Event::close());
    }

    /// Losing focus also ends any drag in progress.
    pub fn focus_lost(&self) {
        let changed = {
            let mut inner = self.lock();
            inner.pointer_down = false;
            std::mem::replace(&mut inner.focused, false)
        };
        if changed {
            self.post(Event::new(EventType::FocusLost, 0, 0));
        }
    }

    pub fn focus_gained(&self) {
        let changed = !std::mem::replace(&mut self.lock().focused, true);
        if changed {
            self.post(Event::new(EventType::FocusGained, 0, 0));
        }
    }

    pub fn is_pointer_down(&self) -> bool {
        self.lock().pointer_down
    }

    pub fn cursor(&self) -> (i32, i32) {
        let inner = self.lock();
        (inner.cursor_x, inner.cursor_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn types(hub: &InputHub) -> Vec<Option<EventType>> {
        hub.events().drain().iter().map(Event::kind).collect()
    }

    #[test]
    fn moves_only_drag_while_pressed() {
        let hub = InputHub::new(Arc::new(EventQueue::new()));
        hub.pointer_moved(1, 1);
        hub.pointer_pressed(1, 1);
        hub.pointer_moved(1, 1);
        hub.pointer_moved(2, 3);
        hub.pointer_released(2, 3);
        hub.pointer_moved(4, 4);

        assert_eq!(
            types(&hub),
            vec![
                Some(EventType::PointerPressed),
                Some(EventType::PointerDragged),
                Some(EventType::PointerReleased),
            ]
        );
        assert_eq!(hub.cursor(), (4, 4));
    }

    #[test]
    fn pointer_fields_are_coordinates() {
        let hub = InputHub::new(Arc::new(EventQueue::new()));
        hub.pointer_pressed(-5, 640);
        assert_eq!(
            hub.events().poll(),
            Some(Event { event_type: 8, field1: -5, field2: 640 })
        );
    }

    #[test]
    fn focus_changes_are_deduplicated() {
        let hub = InputHub::new(Arc::new(EventQueue::new()));
        hub.focus_gained();
        hub.pointer_pressed(0, 0);
        hub.focus_lost();
        hub.focus_lost();
        hub.focus_gained();

        assert!(!hub.is_pointer_down());
        assert_eq!(
            types(&hub),
            vec![
                Some(EventType::PointerPressed),
                Some(EventType::FocusLost),
                Some(EventType::FocusGained),
            ]
        );
    }

    #[test]
    fn keys_and_close() {
        let hub = InputHub::new(Arc::new(EventQueue::new()));
        hub.key_pressed(42);
        hub.key_released(42);
        hub.close();
        assert_eq!(
            hub.events().drain(),
            vec![
                Event { event_type: 2, field1: 42, field2: 0 },
                Event { event_type: 3, field1: 42, field2: 0 },
                Event { event_type: 1, field1: 0, field2: 0 },
            ]
        );
    }
}
