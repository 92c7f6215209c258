// Copyright 2022, The Android Open Source Project
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

//! The watchdog of the hardware calls which may never return.

use std::future::Future;
use std::time::Duration;

use log::error;
use tokio::time::timeout;

use crate::error::{Error, Result};

/// Run the task on the runtime and wait for it at most `duration`. When the watchdog expires the
/// task keeps running detached, and its output is dropped once it completes.
pub(crate) async fn run_with_watchdog<F>(duration: Duration, task: F) -> Result<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    let join_handle = tokio::spawn(task);
    match timeout(duration, join_handle).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => {
            error!("The watched task is aborted: {:?}", e);
            Err(Error::Unknown)
        }
        Err(_) => {
            error!("The watchdog expired after {:?}", duration);
            Err(Error::Timeout)
        }
    }
}
