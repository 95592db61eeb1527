pub mod dashboard;

pub use dashboard::render_dashboard_window;
