//! Bridge between a background capture thread and the signal sampler.
//!
//! Use [`setup_capture`] once during initialization to spawn the capture
//! thread and obtain a [`CaptureHandle`]; its [`CaptureBridge`] is the
//! [`AudioSource`] the [`SignalSampler`](crate::sampler::SignalSampler) polls.
//! Call [`shutdown_capture`] during teardown to stop and join the thread.
//!
//! The thread only ever talks to the main loop through lock-free channels, so
//! a slow or failing device can never stall a game tick.

use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, unbounded};
use log::{debug, info};

use crate::sampler::{AudioSource, SignalError};

/// One frequency-magnitude buffer, lowest bins first.
pub type AudioBlock = Vec<u8>;

/// Commands sent *to* the capture thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureCmd {
    Shutdown,
}

/// Receiving end of the capture channel.
#[derive(Debug)]
pub struct CaptureBridge {
    rx_block: Receiver<AudioBlock>,
}

impl CaptureBridge {
    /// Create a bridge together with the sender a producer writes into.
    pub fn channel() -> (Sender<AudioBlock>, Self) {
        let (tx_block, rx_block) = unbounded();
        (tx_block, Self { rx_block })
    }
}

impl AudioSource for CaptureBridge {
    /// Drain everything pending and keep only the newest block.
    fn latest_block(&mut self) -> Result<Option<AudioBlock>, SignalError> {
        let mut newest = None;
        loop {
            match self.rx_block.try_recv() {
                Ok(block) => newest = Some(block),
                Err(TryRecvError::Empty) => return Ok(newest),
                Err(TryRecvError::Disconnected) => {
                    return match newest {
                        Some(block) => Ok(Some(block)),
                        None => Err(SignalError::Disconnected),
                    };
                }
            }
        }
    }
}

/// Owner of the running capture thread.
pub struct CaptureHandle {
    /// Source to hand to the sampler.
    pub bridge: CaptureBridge,
    tx_cmd: Sender<CaptureCmd>,
    handle: JoinHandle<()>,
}

/// Spawn the capture thread.
///
/// `producer` is called once per `period` and returns the newest block, or
/// `None` when the device is gone, which ends the thread. The sampler then
/// sees a disconnected source and freezes the last sound level.
pub fn setup_capture<F>(period: Duration, producer: F) -> CaptureHandle
where
    F: FnMut() -> Option<AudioBlock> + Send + 'static,
{
    let (tx_block, bridge) = CaptureBridge::channel();
    let (tx_cmd, rx_cmd) = unbounded::<CaptureCmd>();

    let handle = std::thread::spawn(move || capture_thread(period, producer, rx_cmd, tx_block));

    CaptureHandle {
        bridge,
        tx_cmd,
        handle,
    }
}

/// Gracefully request shutdown of the capture thread and join it.
pub fn shutdown_capture(capture: CaptureHandle) {
    let _ = capture.tx_cmd.send(CaptureCmd::Shutdown);
    let _ = capture.handle.join();
}

fn capture_thread<F>(
    period: Duration,
    mut producer: F,
    rx_cmd: Receiver<CaptureCmd>,
    tx_block: Sender<AudioBlock>,
) where
    F: FnMut() -> Option<AudioBlock>,
{
    info!("Capture thread started ({}ms blocks)", period.as_millis());
    loop {
        match rx_cmd.recv_timeout(period) {
            Ok(CaptureCmd::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }
        let Some(block) = producer() else {
            debug!("Capture device stopped producing blocks");
            break;
        };
        if tx_block.send(block).is_err() {
            break;
        }
    }
    info!("Capture thread stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_keeps_only_newest_block() {
        let (tx, mut bridge) = CaptureBridge::channel();
        tx.send(vec![1]).unwrap();
        tx.send(vec![2]).unwrap();
        tx.send(vec![3]).unwrap();
        assert_eq!(bridge.latest_block().unwrap(), Some(vec![3]));
        assert_eq!(bridge.latest_block().unwrap(), None);
    }

    #[test]
    fn test_bridge_reports_disconnect_once_drained() {
        let (tx, mut bridge) = CaptureBridge::channel();
        tx.send(vec![9]).unwrap();
        drop(tx);
        assert_eq!(bridge.latest_block().unwrap(), Some(vec![9]));
        assert_eq!(bridge.latest_block(), Err(SignalError::Disconnected));
    }

    #[test]
    fn test_capture_thread_delivers_and_shuts_down() {
        let mut capture = setup_capture(Duration::from_millis(1), || Some(vec![42; 8]));
        let mut received = None;
        for _ in 0..500 {
            if let Ok(Some(block)) = capture.bridge.latest_block() {
                received = Some(block);
                break;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        shutdown_capture(capture);
        assert_eq!(received, Some(vec![42; 8]));
    }

    #[test]
    fn test_capture_thread_ends_when_device_disappears() {
        let mut capture = setup_capture(Duration::from_millis(1), || None);
        let mut outcome = Ok(None);
        for _ in 0..500 {
            outcome = capture.bridge.latest_block();
            if outcome.is_err() {
                break;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        shutdown_capture(capture);
        assert_eq!(outcome, Err(SignalError::Disconnected));
    }
}
