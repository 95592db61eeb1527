pub mod connection;
pub mod polling;
pub mod log_files;
pub mod sensors;
pub mod logs;
pub mod plots;

pub use connection::render_connection_panel;
pub use polling::render_polling_section;
pub use log_files::render_log_files_section;
pub use sensors::render_sensors_section;
pub use logs::render_logs_section;
pub use plots::{render_dashboard_plot, render_latest_values};
