//! Interactive planning REPL
//!
//! One session id for the whole conversation, so follow-up requests can
//! modify the plan built earlier.

mod session;

pub use session::ChatSession;

use std::sync::Arc;

use eyre::Result;

use crate::domain::generate_session_id;
use crate::orchestrator::Orchestrator;
use crate::synth::TextSynthesizer;

/// Run the interactive REPL
///
/// This is the main entry point for `wf chat`.
pub async fn run_interactive(orchestrator: Arc<Orchestrator>, session_id: Option<String>) -> Result<()> {
    let session_id = session_id.unwrap_or_else(generate_session_id);
    let mut session = ChatSession::new(orchestrator, TextSynthesizer::new()?, session_id);
    session.run().await
}
