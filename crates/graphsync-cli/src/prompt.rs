//! Interactive confirmation of obsolete diagram deletion

use graphsync_core::{ConfirmationPrompt, ConfirmationRequest};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tokio::sync::Mutex;

/// Asks on stderr and reads one answer line
pub struct LinePrompt<R> {
    input: Mutex<R>,
}

impl LinePrompt<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R> LinePrompt<R> {
    pub fn new(input: R) -> Self {
        Self {
            input: Mutex::new(input),
        }
    }
}

fn is_acceptance(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

fn completion_message(request: &ConfirmationRequest, succeeded: bool) -> String {
    let count = request.diagrams.len();
    if succeeded {
        format!("Deleted {count} obsolete diagram(s).")
    } else {
        format!("Deleting {count} obsolete diagram(s) failed; see the log.")
    }
}

#[async_trait::async_trait]
impl<R> ConfirmationPrompt for LinePrompt<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn confirm(&self, request: &ConfirmationRequest) -> bool {
        eprintln!("These diagrams have no writable vocabulary left and will be deleted:");
        for name in request.names() {
            eprintln!("  - {name}");
        }
        eprint!("Delete them? [y/N] ");

        let mut line = String::new();
        let mut input = self.input.lock().await;
        match input.read_line(&mut line).await {
            Ok(0) => false,
            Ok(_) => is_acceptance(&line),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read confirmation");
                false
            }
        }
    }

    async fn completed(&self, request: &ConfirmationRequest, succeeded: bool) {
        eprintln!("{}", completion_message(request, succeeded));
    }
}
