
use thiserror::Error;

pub mod filters;
pub mod io;
pub mod gnss;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum DigSigProcErr {
	#[error("loss of lock")]
	LossOfLock,
	#[error("invalid configuration: {0}")]
	InvalidConfig(&'static str),
	#[error("unsupported satellite {system}{prn}")]
	UnsupportedSatellite { system: char, prn: u32 },
	#[error("tracking not initialized: {0}")]
	NotInitialized(&'static str),
}

/// Event sent over the channel's outbound control queue.  The framework
/// bridge owns the receiving side; the tracking core only ever try_sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelEvent {
	LossOfLock { channel_id: usize },
}
