pub mod coordinate_mapper;
pub mod density_grid;
pub mod density_updater;
pub mod detection;
pub mod grid_config;
pub mod result_record;
pub mod sliding_window;
