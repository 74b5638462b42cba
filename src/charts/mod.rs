mod render;

pub use render::{team_chart, utilization_chart};
