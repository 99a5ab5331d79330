// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Logger initialisation for host binaries.

use env_logger::{Builder, Env};
use log::SetLoggerError;

/// Installs `env_logger` as the global logger.
///
/// `RUST_LOG` takes precedence; `default_filter` applies when it is unset.
///
/// # Errors
///
/// Fails if a global logger was already installed.
pub fn init_logging(default_filter: &str) -> Result<(), SetLoggerError> {
    Builder::from_env(Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_rejected() {
        // The first call may race with other tests in this binary; only the
        // second one is guaranteed to fail.
        let _ = init_logging("warn");
        assert!(init_logging("warn").is_err());
    }
}
