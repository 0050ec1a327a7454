// Task-Module für die Embassy-Executor-Tasks
pub mod http;
pub mod monitor;
pub mod portal;
pub mod wifi;

pub use http::http_server_task;
pub use monitor::input_monitor_task;
pub use portal::{portal_server_task, reboot_task};
pub use wifi::{
    ap_net_task, connect_station, dhcp_server_task, sta_net_task, start_access_point,
};
