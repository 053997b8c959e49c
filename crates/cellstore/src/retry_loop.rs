//! Generic make-one-call-with-retry utility for unary operations.

use std::future::Future;

use cellstore_protocol::Status;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::policies::{BackoffPolicy, RetryPolicy};
use crate::transport::CallContext;

/// Issue a unary call under retry/backoff policy control.
///
/// `call` is invoked once per attempt with a freshly configured context.
/// On failure the loop stops immediately when the retry policy refuses
/// another attempt or when the request is not idempotent; otherwise it
/// sleeps for the backoff delay and tries again. Attempts are strictly
/// sequential.
pub(crate) async fn retry_unary<T, F, Fut>(
    mut retry: Box<dyn RetryPolicy>,
    mut backoff: Box<dyn BackoffPolicy>,
    is_idempotent: bool,
    operation_name: &'static str,
    mut call: F,
) -> Result<T>
where
    F: FnMut(CallContext) -> Fut,
    Fut: Future<Output = std::result::Result<T, Status>>,
{
    loop {
        let mut ctx = CallContext::new();
        retry.setup(&mut ctx);
        match call(ctx).await {
            Ok(response) => return Ok(response),
            Err(status) => {
                // It is up to the policy to terminate this loop; retrying a
                // non-idempotent request is never allowed, whatever the code.
                if !retry.on_failure(&status) || !is_idempotent {
                    warn!(
                        operation = operation_name,
                        status = %status,
                        "permanent (or too many transient) errors"
                    );
                    return Err(Error::Rpc(status));
                }
                let delay = backoff.on_completion(&status);
                debug!(
                    operation = operation_name,
                    delay_ms = delay.as_millis() as u64,
                    "transient failure, backing off"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
