// Server configuration from environment variables.

use std::env;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: IpAddr,
    pub port: u16,
    pub output_dir: PathBuf,
    /// Report template override; the built-in template is used when unset
    /// or unreadable.
    pub template_path: Option<PathBuf>,
    /// Directory holding records.json and other lookup data.
    pub data_dir: PathBuf,
    pub max_sectors: usize,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let bind_addr = env::var("STATS_UDP_BIND")
            .ok()
            .and_then(|value| value.parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));
        let port = env::var("STATS_UDP_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(29_999);
        let output_dir = env::var("STATS_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("reports"));
        let template_path = env::var("STATS_TEMPLATE").ok().map(PathBuf::from);
        let data_dir = env::var("STATS_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));
        let max_sectors = env::var("STATS_MAX_SECTORS")
            .ok()
            .and_then(|value| value.parse::<usize>().ok())
            .unwrap_or(4);

        Self {
            bind_addr,
            port,
            output_dir,
            template_path,
            data_dir,
            max_sectors,
        }
    }
}
