//! Pipeline orchestrator: discovery → session → per-tick color streaming.
//!
//! Connect-once model: `Searching → Connected → Streaming`, with no path back
//! to `Searching`. On command failure the next tick simply issues a corrected
//! command.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::device::DeviceSession;
use crate::discovery::DeviceScanner;
use crate::error::Result;
use crate::quantizer::{Color, MedianCutQuantizer};

/// One rectangular buffer of pixel colors, row-major.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl Frame {
    pub fn new(width: u32, height: u32, pixels: Vec<Color>) -> Self {
        debug_assert_eq!(pixels.len(), (width * height) as usize);
        Self {
            width,
            height,
            pixels,
        }
    }

    /// A frame with no pixels; the tick that receives one sends nothing.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// The capture collaborator. The core is scheduling-agnostic: a timer, a
/// manual trigger, or a test harness may drive it equally well. `None` means
/// the source is exhausted and streaming ends.
pub trait FrameSource {
    fn next_frame(&mut self) -> Option<Frame>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Searching,
    Connected,
    Streaming,
}

/// Clone-able handle that asks a running pipeline to wind down. The tick loop
/// observes the flag first; the discovery listener is stopped after the loops
/// exit, so the socket is released last.
#[derive(Clone)]
pub struct ShutdownHandle {
    running: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Drives the whole pipeline: polls discovery until a device appears,
/// connects a session, then streams one ambient color per tick.
pub struct Pipeline {
    config: Config,
    scanner: DeviceScanner,
    session: DeviceSession,
    quantizer: MedianCutQuantizer,
    state: PipelineState,
    running: Arc<AtomicBool>,
}

impl Pipeline {
    pub fn new(config: Config, scanner: DeviceScanner) -> Self {
        Self {
            config,
            scanner,
            session: DeviceSession::new(),
            quantizer: MedianCutQuantizer::new(),
            state: PipelineState::Searching,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            running: self.running.clone(),
        }
    }

    /// Run until the frame source is exhausted or a shutdown handle fires.
    /// Searching loops indefinitely by design; only shutdown ends it early.
    pub async fn run<S: FrameSource>(&mut self, source: &mut S) -> Result<()> {
        self.running.store(true, Ordering::SeqCst);
        self.scanner.start_listening();

        self.search().await;
        if self.state == PipelineState::Connected {
            self.stream(source).await;
        }

        // Tick loop is already done; now release the discovery listener.
        self.scanner.stop();
        self.session.close();
        info!("pipeline stopped");
        Ok(())
    }

    /// Searching phase: broadcast, wait a short interval, connect to the
    /// first discovered device, issue the initial brightness.
    async fn search(&mut self) {
        let poll = Duration::from_millis(self.config.discovery_poll_ms);
        info!("searching for devices");

        while self.running.load(Ordering::SeqCst) {
            if let Err(e) = self.scanner.send_discovery_message().await {
                warn!("discovery send failed: {e}");
            }
            sleep(poll).await;

            let Some(device) = self.scanner.discovered_devices().first().await else {
                continue;
            };

            match self.session.connect(&device).await {
                Ok(()) => {
                    // Initial power/brightness are best-effort like any other
                    // command.
                    if let Err(e) = self.session.power_on(self.config.transition_ms).await {
                        warn!("power-on command failed: {e}");
                    }
                    if let Err(e) = self
                        .session
                        .set_brightness(self.config.brightness_channel, self.config.initial_brightness)
                        .await
                    {
                        warn!("initial brightness command failed: {e}");
                    }
                    self.state = PipelineState::Connected;
                    return;
                }
                Err(e) => {
                    // Stay in Searching; the device may come back or another
                    // may appear.
                    warn!("connect to {} failed: {e}", device.addr);
                }
            }
        }
    }

    /// Streaming phase: fixed-cadence ticks, one frame drained per tick.
    async fn stream<S: FrameSource>(&mut self, source: &mut S) {
        self.state = PipelineState::Streaming;
        info!(
            "streaming ambient color every {} ms",
            self.config.tick_interval_ms
        );

        let mut ticker = interval(Duration::from_millis(self.config.tick_interval_ms));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        while self.running.load(Ordering::SeqCst) {
            ticker.tick().await;
            let Some(frame) = source.next_frame() else {
                debug!("frame source exhausted");
                break;
            };
            self.process_frame(&frame).await;
        }
    }

    /// One tick: accumulate, reduce, select, clear, send.
    pub async fn process_frame(&mut self, frame: &Frame) {
        for &pixel in &frame.pixels {
            self.quantizer.add_color(pixel);
        }

        let palette = self.quantizer.get_palette(self.config.palette_size);
        self.quantizer.clear();

        let Some(color) = ambient_color(&palette) else {
            debug!("empty frame, nothing to send");
            return;
        };

        if let Err(e) = self
            .session
            .set_color(
                color.r as u16,
                color.g as u16,
                color.b as u16,
                self.config.transition_ms,
            )
            .await
        {
            // Non-fatal: the next tick sends a corrected command.
            warn!("color command failed: {e}");
        }
    }
}

/// Deterministic ambient selection: the palette entry with the lowest
/// perceptual brightness, first entry on ties. The darker entry keeps the
/// emitted light saturated instead of washed out by a near-white dominant.
pub fn ambient_color(palette: &[Color]) -> Option<Color> {
    palette.iter().copied().min_by_key(Color::brightness)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::DiscoveredDevice;
    use tokio::io::{AsyncBufReadExt, BufReader};
    use tokio::net::TcpListener;

    /// Scripted frame source for driving ticks synchronously.
    struct Script {
        frames: Vec<Frame>,
    }

    impl FrameSource for Script {
        fn next_frame(&mut self) -> Option<Frame> {
            if self.frames.is_empty() {
                None
            } else {
                Some(self.frames.remove(0))
            }
        }
    }

    fn solid_frame(color: Color, w: u32, h: u32) -> Frame {
        Frame::new(w, h, vec![color; (w * h) as usize])
    }

    #[test]
    fn ambient_color_picks_the_darker_entry() {
        let palette = [Color::new(255, 255, 255, 255), Color::new(10, 0, 0, 255)];
        assert_eq!(ambient_color(&palette), Some(Color::new(10, 0, 0, 255)));
        assert_eq!(ambient_color(&[]), None);
    }

    #[test]
    fn ambient_color_is_stable_on_ties() {
        // Both score 5 after truncation; whichever comes first must win.
        let a = Color::rgb(10, 0, 0);
        let b = Color::rgb(0, 0, 16);
        assert_eq!(a.brightness(), b.brightness());
        assert_eq!(ambient_color(&[a, b]), Some(a));
        assert_eq!(ambient_color(&[b, a]), Some(b));
    }

    /// End-to-end over loopback: fake bulb answers discovery on the scanner's
    /// socket, accepts the TCP session, and the pipeline streams its first
    /// ambient color command.
    #[tokio::test]
    async fn pipeline_discovers_connects_and_streams() {
        let bulb_tcp = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let control_addr = bulb_tcp.local_addr().unwrap();

        let bulb = tokio::spawn(async move {
            let (stream, _) = bulb_tcp.accept().await.unwrap();
            let mut reader = BufReader::new(stream);
            let mut lines = Vec::new();
            // power_on, initial brightness, then the first color tick.
            for _ in 0..3 {
                let mut line = String::new();
                reader.read_line(&mut line).await.unwrap();
                lines.push(line);
            }
            lines
        });

        let scanner = DeviceScanner::bind().await.unwrap();

        // Seed the registry the way the listener would after a reply.
        scanner
            .discovered_devices()
            .upsert(DiscoveredDevice {
                id: "0xbulb".to_string(),
                addr: control_addr,
                model: Some("color".to_string()),
                fw_ver: None,
                support: vec!["set_power".into(), "set_bright".into(), "set_rgb".into()],
                power_on: true,
                last_seen: chrono::Utc::now(),
            })
            .await;

        let config = Config {
            tick_interval_ms: 10,
            discovery_poll_ms: 10,
            ..Config::default()
        };
        let mut pipeline = Pipeline::new(config, scanner);
        let mut source = Script {
            frames: vec![solid_frame(Color::rgb(200, 30, 30), 4, 4)],
        };

        pipeline.run(&mut source).await.unwrap();
        assert_eq!(pipeline.state(), PipelineState::Streaming);

        let lines = bulb.await.unwrap();
        let methods: Vec<String> = lines
            .iter()
            .map(|l| {
                serde_json::from_str::<serde_json::Value>(l.trim()).unwrap()["method"]
                    .as_str()
                    .unwrap()
                    .to_string()
            })
            .collect();
        assert_eq!(methods, vec!["set_power", "set_bright", "set_rgb"]);

        // A solid frame reduces to exactly its color.
        let last: serde_json::Value = serde_json::from_str(lines[2].trim()).unwrap();
        assert_eq!(
            last["params"][0],
            serde_json::json!((200u32 << 16) | (30 << 8) | 30)
        );
    }

    /// Empty frames produce no command; the source running out ends the run.
    #[tokio::test]
    async fn empty_frames_send_nothing() {
        let bulb_tcp = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let control_addr = bulb_tcp.local_addr().unwrap();
        let bulb = tokio::spawn(async move {
            let (stream, _) = bulb_tcp.accept().await.unwrap();
            let mut reader = BufReader::new(stream);
            let mut lines = Vec::new();
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).await.unwrap_or(0) == 0 {
                    break;
                }
                lines.push(line);
            }
            lines
        });

        let scanner = DeviceScanner::bind().await.unwrap();
        scanner
            .discovered_devices()
            .upsert(DiscoveredDevice {
                id: "0xbulb".to_string(),
                addr: control_addr,
                model: None,
                fw_ver: None,
                support: vec![],
                power_on: false,
                last_seen: chrono::Utc::now(),
            })
            .await;

        let config = Config {
            tick_interval_ms: 10,
            discovery_poll_ms: 10,
            ..Config::default()
        };
        let mut pipeline = Pipeline::new(config, scanner);
        let mut source = Script {
            frames: vec![Frame::empty(), Frame::empty()],
        };
        pipeline.run(&mut source).await.unwrap();

        // Only the connect-time power/brightness commands reach the bulb.
        let lines = bulb.await.unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("set_power"));
        assert!(lines[1].contains("set_bright"));
    }

    /// The shutdown handle ends the Searching loop even when no device ever
    /// appears.
    #[tokio::test]
    async fn shutdown_interrupts_searching() {
        let scanner = DeviceScanner::bind().await.unwrap();
        let config = Config {
            discovery_poll_ms: 10,
            ..Config::default()
        };
        let mut pipeline = Pipeline::new(config, scanner);
        let handle = pipeline.shutdown_handle();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            handle.stop();
        });

        let mut source = Script { frames: vec![] };
        tokio::time::timeout(Duration::from_secs(5), pipeline.run(&mut source))
            .await
            .expect("run did not observe shutdown")
            .unwrap();
        assert_eq!(pipeline.state(), PipelineState::Searching);
    }

}
