pub mod histogram_engine;
