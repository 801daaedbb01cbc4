use async_trait::async_trait;
use restguard::{Transport, TransportError, TransportRequest, TransportResponse};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

type Scripted = Result<TransportResponse, TransportError>;

/// Transport that replays a script of results and records every request it sees.
///
/// Once the script runs out, every further attempt gets the fallback.
#[derive(Debug, Clone)]
pub struct ScriptedTransport {
    script: Arc<Mutex<VecDeque<Scripted>>>,
    fallback: Arc<Mutex<Scripted>>,
    seen: Arc<Mutex<Vec<TransportRequest>>>,
}

impl ScriptedTransport {
    pub fn always(result: Scripted) -> Self {
        Self {
            script: Arc::default(),
            fallback: Arc::new(Mutex::new(result)),
            seen: Arc::default(),
        }
    }

    pub fn then(self, result: Scripted) -> Self {
        self.script.lock().unwrap().push_back(result);
        self
    }

    /// Replace what attempts return from now on, dropping anything still scripted.
    pub fn switch_to(&self, result: Scripted) {
        self.script.lock().unwrap().clear();
        *self.fallback.lock().unwrap() = result;
    }

    pub fn attempts(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn attempt(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        self.seen.lock().unwrap().push(request.clone());
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.lock().unwrap().clone())
    }
}

pub fn ok(body: &str) -> Scripted {
    Ok(TransportResponse::new(200, body))
}

pub fn status(code: u16) -> Scripted {
    Ok(TransportResponse::new(code, ""))
}

pub fn connect_refused() -> Scripted {
    Err(TransportError::new(restguard::TransportErrorKind::Connect, "connection refused"))
}

/// Route `tracing` output to the test writer; safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}
