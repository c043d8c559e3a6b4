pub mod event_bus;
pub mod pipeline_events;
