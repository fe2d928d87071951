#![allow(dead_code)]

use solstat::Result;
use solstat::SolstatError;
use solstat::vendor::{VendorApi, VendorSummary};
use solstat::weather::{FetchFailure, WeatherApi, WeatherObservation};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub const NOW: i64 = 1_700_000_000;

pub type FetchResult = std::result::Result<WeatherObservation, FetchFailure>;

/// Weather fake: plays the script, then repeats the fallback forever
pub struct ScriptedWeather {
    script: Mutex<VecDeque<FetchResult>>,
    fallback: FetchResult,
    calls: AtomicUsize,
}

impl ScriptedWeather {
    pub fn always(fallback: FetchResult) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn then(self, result: FetchResult) -> Self {
        self.script.lock().unwrap().push_back(result);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl WeatherApi for ScriptedWeather {
    async fn fetch(&self) -> FetchResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

/// Clear daytime sky around [`NOW`]
pub fn clear_sky() -> FetchResult {
    sky(800)
}

pub fn sky(code: u16) -> FetchResult {
    Ok(WeatherObservation {
        condition_code: code,
        sunrise: NOW - 20_000,
        sunset: NOW + 20_000,
    })
}

/// Vendor fake returning queued summaries; errors once the queue is empty
pub struct ScriptedVendor {
    script: Mutex<VecDeque<VendorSummary>>,
}

impl ScriptedVendor {
    pub fn new<I: IntoIterator<Item = VendorSummary>>(summaries: I) -> Self {
        Self {
            script: Mutex::new(summaries.into_iter().collect()),
        }
    }
}

#[async_trait::async_trait]
impl VendorApi for ScriptedVendor {
    async fn fetch_summary(&self) -> Result<VendorSummary> {
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| SolstatError::network("vendor unreachable"))
    }
}

pub fn summary(last_report_at: i64, status: &str, energy_today: f64) -> VendorSummary {
    VendorSummary {
        last_report_at,
        status: status.to_string(),
        energy_today,
    }
}

/// Serve each canned HTTP response to one connection, in order.
///
/// Returns the base URL and a handle yielding every request line seen.
pub async fn serve_responses(
    responses: Vec<(u16, String)>,
) -> (String, tokio::task::JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let mut seen = Vec::new();
        for (status, body) in responses {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let n = socket.read(&mut buf).await.unwrap();
            let request = String::from_utf8_lossy(&buf[..n]).to_string();
            seen.push(request.lines().next().unwrap_or_default().to_string());
            let reply = format!(
                "HTTP/1.1 {} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        }
        seen
    });
    (format!("http://{}", addr), handle)
}
