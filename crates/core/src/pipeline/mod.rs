pub mod frame_pool;
pub mod pipeline_control;
pub mod pipeline_driver;
pub mod pipeline_logger;
pub mod pipeline_settings;
pub mod tick_scheduler;
