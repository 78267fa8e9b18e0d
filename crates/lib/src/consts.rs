//! Names, locations and timings shared across the crate.

use std::time::Duration;

pub const APP_NAME: &str = "peridot";

/// Suffix of every artifact considered by the index builder and the plugin diff.
pub const JAR_SUFFIX: &str = ".jar";

/// Folder (under the working root) holding one sub-folder per repository.
pub const REPOS_DIR: &str = "repos";

/// Folder (under the working root) holding one Lua file per server.
pub const CONFIGS_DIR: &str = "configs";

pub const PLUGINS_DIR: &str = "plugins";
pub const SERVER_PROPERTIES_FILE: &str = "server.properties";

pub const ROOT_ENV: &str = "PERIDOT_ROOT";
pub const CONTROL_SOCKET_ENV: &str = "PERIDOT_CONTROL_SOCKET";
pub const DEFAULT_CONTROL_SOCKET: &str = "/tmp/octyne.sock.42069";

/// Length of a checksum when shown to the operator.
pub const SHORT_HASH_LEN: usize = 8;

pub const STATUS_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const STOP_TIMEOUT: Duration = Duration::from_secs(60);

/// Upper bound on a single request to the process-control service.
pub const CONTROL_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Largest response body accepted from the process-control service.
pub const CONTROL_MAX_RESPONSE_BYTES: usize = 1024 * 1024;
