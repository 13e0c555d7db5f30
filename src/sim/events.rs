//! Simulation events and the observer bus
//!
//! The host subscribes listeners (UI toasts, audio, the persistence profile)
//! instead of the simulation reaching out to them.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Something that happened during a tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    /// Package collected at the pickup point
    Pickup { position: Vec2 },
    /// Package dropped off
    Delivery {
        reward: f32,
        elapsed_seconds: f32,
        /// Consecutive deliveries inside the chain window
        chain: u32,
    },
    LevelUp { level: u32, skill_points: u32 },
    /// Positional audio cue
    VehicleStoppedNearPlayer { vehicle_id: u32, position: Vec2 },
}

/// Handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u32);

type Listener = Box<dyn FnMut(&GameEvent)>;

/// Fan-out of tick events to host listeners, in subscription order
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u32,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&GameEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener; returns false if it was already gone
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    pub fn publish(&mut self, events: &[GameEvent]) {
        for event in events {
            for (_, listener) in &mut self.listeners {
                listener(event);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_listeners_receive_events_in_order() {
        let mut bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        bus.subscribe(move |event| sink.borrow_mut().push(*event));

        let events = [
            GameEvent::Pickup {
                position: Vec2::new(1.0, 2.0),
            },
            GameEvent::LevelUp {
                level: 2,
                skill_points: 1,
            },
        ];
        bus.publish(&events);
        assert_eq!(*seen.borrow(), events.to_vec());
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let mut bus = EventBus::new();
        let count = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&count);
        let id = bus.subscribe(move |_| *counter.borrow_mut() += 1);

        let event = GameEvent::LevelUp {
            level: 2,
            skill_points: 1,
        };
        bus.publish(&[event]);
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.publish(&[event]);
        assert_eq!(*count.borrow(), 1);
        assert!(bus.is_empty());
    }

    #[test]
    fn test_event_json_is_tagged() {
        let json = serde_json::to_string(&GameEvent::Delivery {
            reward: 7.5,
            elapsed_seconds: 12.0,
            chain: 2,
        })
        .unwrap();
        assert!(json.contains(r#""type":"delivery""#));
        assert!(json.contains(r#""reward":7.5"#));
    }
}
