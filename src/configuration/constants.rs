pub mod cargo_env {
    pub const CARGO_PKG_NAME: &str = env!("CARGO_PKG_NAME");
}

pub mod defaults {
    pub const SERVER: &str = "http://localhost:8075";
    pub const BATCH_SIZE: usize = 5;
    pub const TOTAL: usize = 10;
    pub const RUNS: usize = 1;
    pub const DATABASE: &str = "mysql-operator";
    pub const FILESTORE: &str = "minio-operator";
    pub const SIZE: &str = "100users";
    pub const AFFINITY: &str = "multitenant";
    pub const OWNER: &str = "cloudsoak";
    pub const DNS_DOMAIN: &str = "example.com";
    pub const POLL_INTERVAL_SECS: u64 = 5;
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
    pub const ENV_PREFIX: &str = "CLOUDSOAK";
}
