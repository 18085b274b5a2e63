
use std::f64::consts;

use num_complex::Complex;
use serde::{Serialize, Deserialize};
use log::{debug, info, warn};
use crossbeam_channel::Sender;

use crate::{ChannelEvent, DigSigProcErr};
use crate::filters::{self, ScalarFilter, SecondOrderLoopFilter};
use super::SignalSpec;

pub mod replica;
pub mod correlator;
pub mod discriminators;
pub mod lock_detectors;
pub mod dump;

use self::replica::{CodeTable, ReplicaBlock};
use self::lock_detectors::{LockMonitor, LockUpdate};
use self::dump::{DumpRecord, TrackingDump};

const TWO_PI:f64 = 2.0 * consts::PI;

/// Channel configuration, immutable after construction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
	pub if_freq_hz: f64,
	pub fs_in_hz: f64,
	pub vector_length_samples: usize,
	pub pll_bw_hz: f64,
	pub dll_bw_hz: f64,
	pub early_late_space_chips: f64,
	pub carrier_aiding: bool,
	pub dump: bool,
	pub dump_filename: String,
}

impl TrackingConfig {

	pub fn default_l1_ca(fs_in_hz:f64, vector_length_samples:usize) -> Self {
		Self {
			if_freq_hz: 0.0,
			fs_in_hz,
			vector_length_samples,
			pll_bw_hz: 40.0,
			dll_bw_hz: 4.0,
			early_late_space_chips: 0.5,
			carrier_aiding: true,
			dump: false,
			dump_filename: String::from("tracking_ch_"),
		}
	}

	pub fn validate(&self) -> Result<(), DigSigProcErr> {
		if !(self.fs_in_hz > 0.0) {
			return Err(DigSigProcErr::InvalidConfig("sampling rate must be positive"));
		}
		if self.vector_length_samples == 0 {
			return Err(DigSigProcErr::InvalidConfig("vector length must be positive"));
		}
		if !(self.pll_bw_hz > 0.0) || !(self.dll_bw_hz > 0.0) {
			return Err(DigSigProcErr::InvalidConfig("loop bandwidths must be positive"));
		}
		if !(self.early_late_space_chips > 0.0 && self.early_late_space_chips < 1.0) {
			return Err(DigSigProcErr::InvalidConfig("early-late spacing must be in (0, 1) chips"));
		}
		if !self.if_freq_hz.is_finite() {
			return Err(DigSigProcErr::InvalidConfig("intermediate frequency must be finite"));
		}
		Ok(())
	}

}

/// Acquisition estimate handed to the channel before `start_tracking`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AcquisitionHandoff {
	pub prn: u32,
	pub system: char,
	pub acq_delay_samples: f64,
	pub acq_doppler_hz: f64,
	pub acq_samplestamp_samples: u64,
}

/// Per-block record handed to the telemetry decoder.  One of these is
/// produced for every processed block, locked or not; `valid` is true only
/// for closed-loop tracking blocks with finite correlator output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackingOutput {
	pub prompt_i: f64,
	pub prompt_q: f64,
	pub timestamp_secs: f64,
	pub acc_carrier_phase_rad: f64,
	pub carrier_doppler_hz: f64,
	pub code_freq_chips: f64,
	pub cn0_db_hz: f64,
	pub valid: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingState {
	/// Not tracking; blocks are consumed and zero-valued outputs emitted
	Idle,
	/// Next invocation aligns the sample stream to the acquisition code phase
	PullIn,
	/// Closed-loop code and carrier tracking
	Tracking,
}

/// Single-channel DLL + PLL tracking driver.  Owns every piece of loop
/// state; the replica, correlator, discriminator, filter, and lock-detector
/// components are pure functions of what the driver hands them.
pub struct Tracking {
	cfg: TrackingConfig,
	signal: SignalSpec,
	channel_id: usize,
	event_tx: Option<Sender<ChannelEvent>>,
	state: TrackingState,

	// Acquisition handoff
	acq: Option<AcquisitionHandoff>,
	acq_code_phase_samples: f64,
	acq_carrier_doppler_hz: f64,
	acq_sample_stamp: u64,

	// Loop state
	sample_counter: u64,
	carrier_doppler_hz: f64,
	code_freq_chips: f64,
	rem_code_phase_samples: f64,
	rem_carr_phase_rad: f64,
	acc_carrier_phase_rad: f64,
	acc_code_phase_secs: f64,
	current_prn_length_samples: usize,

	carrier_filter: SecondOrderLoopFilter,
	code_filter: SecondOrderLoopFilter,
	lock_monitor: LockMonitor,

	code_table: Option<CodeTable>,
	replica: ReplicaBlock,

	dump: Option<TrackingDump>,
	last_seg: u64,
}

impl Tracking {

	pub fn new(cfg:TrackingConfig, channel_id:usize, event_tx:Option<Sender<ChannelEvent>>) -> Result<Self, DigSigProcErr> {
		cfg.validate()?;

		let signal = SignalSpec::gps_l1_ca();
		let pdi = signal.code_period_secs();
		let carrier_filter = filters::new_pll_filter(cfg.pll_bw_hz, pdi);
		let code_filter = filters::new_dll_filter(cfg.dll_bw_hz, pdi);

		// Replica buffers are sized for the largest block that can occur so
		// per-block resampling never reallocates
		let replica = ReplicaBlock::with_capacity(2 * cfg.vector_length_samples);

		let dump = if cfg.dump {
			match TrackingDump::create(&cfg.dump_filename, channel_id) {
				Ok(d) => {
					info!("channel {}: tracking dump enabled, file {}", channel_id, d.path);
					Some(d)
				},
				Err(e) => {
					warn!("channel {}: unable to open tracking dump file: {}", channel_id, e);
					None
				},
			}
		} else { None };

		Ok(Self {
			current_prn_length_samples: cfg.vector_length_samples,
			code_freq_chips: signal.code_rate_hz,
			cfg, signal, channel_id, event_tx,
			state: TrackingState::Idle,
			acq: None,
			acq_code_phase_samples: 0.0,
			acq_carrier_doppler_hz: 0.0,
			acq_sample_stamp: 0,
			sample_counter: 0,
			carrier_doppler_hz: 0.0,
			rem_code_phase_samples: 0.0,
			rem_carr_phase_rad: 0.0,
			acc_carrier_phase_rad: 0.0,
			acc_code_phase_secs: 0.0,
			carrier_filter, code_filter,
			lock_monitor: LockMonitor::new(),
			code_table: None,
			replica,
			dump,
			last_seg: 0,
		})
	}

	// Read-only getter methods
	pub fn state(&self) -> TrackingState { self.state }
	pub fn is_enabled(&self) -> bool { self.state != TrackingState::Idle }
	pub fn channel_id(&self) -> usize { self.channel_id }
	pub fn sample_counter(&self) -> u64 { self.sample_counter }
	pub fn carrier_doppler_hz(&self) -> f64 { self.carrier_doppler_hz }
	pub fn code_freq_chips(&self) -> f64 { self.code_freq_chips }
	pub fn rem_code_phase_samples(&self) -> f64 { self.rem_code_phase_samples }
	pub fn rem_carr_phase_rad(&self) -> f64 { self.rem_carr_phase_rad }
	pub fn acc_carrier_phase_rad(&self) -> f64 { self.acc_carrier_phase_rad }
	pub fn acc_code_phase_secs(&self) -> f64 { self.acc_code_phase_secs }
	pub fn current_prn_length_samples(&self) -> usize { self.current_prn_length_samples }
	pub fn cn0_db_hz(&self) -> f64 { self.lock_monitor.cn0_db_hz() }
	pub fn carrier_lock_test(&self) -> f64 { self.lock_monitor.carrier_lock_test() }
	pub fn signal(&self) -> SignalSpec { self.signal }

	pub fn set_acquisition(&mut self, acq:AcquisitionHandoff) { self.acq = Some(acq); }

	/// Number of input samples the next `process` call will consume
	pub fn samples_needed(&self) -> usize {
		match self.state {
			TrackingState::PullIn => self.pull_in_samples_offset(),
			_ => self.current_prn_length_samples,
		}
	}

	/// Transitions the channel from idle to pull-in using the most recent
	/// acquisition handoff.  Corrects the acquisition code phase for the
	/// code Doppler accumulated between the acquisition sample stamp and
	/// the present sample counter, re-seeds both loop filters, and builds
	/// the local code table for the acquired satellite.
	pub fn start_tracking(&mut self) -> Result<(), DigSigProcErr> {
		let acq = self.acq.ok_or(DigSigProcErr::NotInitialized("no acquisition handoff"))?;
		let signal = SignalSpec::for_system(acq.system)?;
		let code = signal.local_code(acq.prn)?;
		self.signal = signal;

		self.acq_code_phase_samples = acq.acq_delay_samples;
		self.acq_carrier_doppler_hz = acq.acq_doppler_hz;
		self.acq_sample_stamp = acq.acq_samplestamp_samples;

		let fs = self.cfg.fs_in_hz;
		let code_len_chips = signal.code_length_chips as f64;

		let acq_trk_diff_samples:i64 = self.sample_counter as i64 - self.acq_sample_stamp as i64;
		let acq_trk_diff_seconds = acq_trk_diff_samples as f64 / fs;
		debug!("channel {}: {} samples between acquisition and tracking", self.channel_id, acq_trk_diff_samples);

		// PRN period as modified by the acquisition Doppler
		let radial_velocity = (signal.carrier_freq_hz + acq.acq_doppler_hz) / signal.carrier_freq_hz;
		self.code_freq_chips = radial_velocity * signal.code_rate_hz;
		let t_prn_mod_seconds = code_len_chips / self.code_freq_chips;
		let t_prn_mod_samples = t_prn_mod_seconds * fs;
		self.current_prn_length_samples = t_prn_mod_samples.round() as usize;

		// The acquisition code phase ages while the channel waits to start;
		// slide it by the accumulated period difference
		let t_prn_true_seconds = code_len_chips / signal.code_rate_hz;
		let t_prn_true_samples = t_prn_true_seconds * fs;
		let t_prn_diff_seconds = t_prn_true_seconds - t_prn_mod_seconds;
		let n_prn_diff = acq_trk_diff_seconds / t_prn_true_seconds;
		let mut corrected_acq_phase_samples = (acq.acq_delay_samples + t_prn_diff_seconds * n_prn_diff * fs) % t_prn_true_samples;
		if corrected_acq_phase_samples < 0.0 {
			corrected_acq_phase_samples += t_prn_mod_samples;
		}
		let delay_correction_samples = acq.acq_delay_samples - corrected_acq_phase_samples;
		self.acq_code_phase_samples = corrected_acq_phase_samples;

		self.carrier_doppler_hz = acq.acq_doppler_hz;
		self.code_freq_chips = signal.code_rate_hz + (self.carrier_doppler_hz * signal.code_rate_hz) / signal.carrier_freq_hz;

		let pdi = signal.code_period_secs();
		self.carrier_filter = filters::new_pll_filter(self.cfg.pll_bw_hz, pdi);
		self.code_filter = filters::new_dll_filter(self.cfg.dll_bw_hz, pdi);
		self.carrier_filter.initialize(self.carrier_doppler_hz);
		if self.cfg.carrier_aiding {
			self.code_filter.initialize(0.0);
		} else {
			self.code_filter.initialize(self.carrier_doppler_hz * signal.code_rate_hz / signal.carrier_freq_hz);
		}

		self.code_table = Some(CodeTable::new(&code));
		self.lock_monitor.reset();
		self.rem_code_phase_samples = 0.0;
		self.rem_carr_phase_rad = 0.0;
		self.acc_carrier_phase_rad = 0.0;
		self.acc_code_phase_secs = 0.0;

		info!("channel {}: tracking start for satellite {}{}, doppler {:.1} Hz, code phase {:.2} samples (delay correction {:.2} samples)",
			self.channel_id, acq.system, acq.prn, self.carrier_doppler_hz, self.acq_code_phase_samples, delay_correction_samples);

		self.state = TrackingState::PullIn;
		Ok(())
	}

	/// Disables tracking at the next block boundary
	pub fn stop_tracking(&mut self) {
		self.state = TrackingState::Idle;
	}

	/// Processes exactly one block: consumes the block's samples from
	/// `input` and writes one record to `output[0]`.  Returns the consumed
	/// and produced counts; (0, 0) means `input` did not yet hold a full
	/// block and nothing changed.
	pub fn process(&mut self, input:&[Complex<f32>], output:&mut [TrackingOutput]) -> (usize, usize) {
		if output.is_empty() { return (0, 0); }
		match self.state {
			TrackingState::Idle => self.process_idle(input, output),
			TrackingState::PullIn => self.process_pull_in(input, output),
			TrackingState::Tracking => self.process_tracking(input, output),
		}
	}

	fn process_idle(&mut self, input:&[Complex<f32>], output:&mut [TrackingOutput]) -> (usize, usize) {
		let n = self.current_prn_length_samples;
		if input.len() < n { return (0, 0); }

		self.sample_counter += n as u64;
		self.log_segment();

		output[0] = TrackingOutput::default();

		self.write_dump(&DumpRecord {
			sample_counter: self.sample_counter,
			carrier_doppler_hz: self.carrier_doppler_hz,
			code_freq_chips: self.code_freq_chips,
			cn0_db_hz: self.lock_monitor.cn0_db_hz(),
			carrier_lock_test: self.lock_monitor.carrier_lock_test(),
			rem_code_phase_samples: self.rem_code_phase_samples,
			next_sample_boundary: (self.sample_counter + n as u64) as f64,
			..DumpRecord::default()
		});

		(n, 1)
	}

	fn pull_in_samples_offset(&self) -> usize {
		let len = self.current_prn_length_samples as i64;
		let acq_to_trk_delay_samples = self.sample_counter as i64 - self.acq_sample_stamp as i64;
		let shift_correction = len - acq_to_trk_delay_samples.rem_euclid(len);
		(self.acq_code_phase_samples + shift_correction as f64).round() as usize
	}

	fn process_pull_in(&mut self, input:&[Complex<f32>], output:&mut [TrackingOutput]) -> (usize, usize) {
		let samples_offset = self.pull_in_samples_offset();
		if input.len() < samples_offset { return (0, 0); }

		// Discard samples up to the next PRN start; no correlation here
		self.sample_counter += samples_offset as u64;
		self.rem_code_phase_samples = 0.0;
		self.state = TrackingState::Tracking;

		debug!("channel {}: pull-in consumed {} samples", self.channel_id, samples_offset);

		// Pass the acquisition estimate downstream so the output stream has
		// no gap
		output[0] = TrackingOutput {
			carrier_doppler_hz: self.acq_carrier_doppler_hz,
			code_freq_chips: self.code_freq_chips,
			timestamp_secs: self.sample_counter as f64 / self.cfg.fs_in_hz,
			..TrackingOutput::default()
		};

		(samples_offset, 1)
	}

	fn process_tracking(&mut self, input:&[Complex<f32>], output:&mut [TrackingOutput]) -> (usize, usize) {
		let n = self.current_prn_length_samples;
		if input.len() < n { return (0, 0); }

		let fs = self.cfg.fs_in_hz;
		let code_len_chips = self.signal.code_length_chips as f64;
		let t_int = self.signal.code_period_secs();

		let table = match &self.code_table {
			Some(t) => t,
			None => return (0, 0),
		};

		// Local code replicas for this block, then carrier wipe-off fused
		// with the E/P/L correlation
		let code_phase_step_chips = self.code_freq_chips / fs;
		let rem_code_phase_chips = self.rem_code_phase_samples * code_phase_step_chips;
		self.replica.resample(table, n, rem_code_phase_chips, self.cfg.early_late_space_chips, code_phase_step_chips);

		let carrier_start = Complex{ re: self.rem_carr_phase_rad.cos(), im: -self.rem_carr_phase_rad.sin() };
		let phase_inc_rad = TWO_PI * (self.cfg.if_freq_hz + self.carrier_doppler_hz) / fs;
		let carrier_inc = Complex{ re: phase_inc_rad.cos(), im: -phase_inc_rad.sin() };

		let corr = correlator::carrier_rotate_and_epl(&input[..n], carrier_start, carrier_inc, &self.replica);

		// Numerical fault: drain what the caller offered, keep the loop
		// state untouched, stay enabled
		if !corr.prompt.re.is_finite() || !corr.prompt.im.is_finite() {
			let available = input.len();
			self.sample_counter += available as u64;
			warn!("channel {}: non-finite correlator output at sample {}", self.channel_id, self.sample_counter);
			output[0] = TrackingOutput {
				timestamp_secs: self.sample_counter as f64 / fs,
				..TrackingOutput::default()
			};
			return (available, 1);
		}

		self.sample_counter += n as u64;

		// Carrier loop
		let carr_error_hz = discriminators::pll_two_quadrant_atan(corr.prompt) / TWO_PI;
		let carr_error_filt_hz = self.carrier_filter.apply(carr_error_hz);
		self.carrier_doppler_hz = carr_error_filt_hz;

		if self.cfg.carrier_aiding {
			self.code_freq_chips = self.signal.code_rate_hz + (self.carrier_doppler_hz * self.signal.code_rate_hz) / self.signal.carrier_freq_hz;
		} else {
			self.code_freq_chips = self.signal.code_rate_hz;
		}

		self.acc_carrier_phase_rad -= TWO_PI * self.carrier_doppler_hz * t_int;
		self.rem_carr_phase_rad = (self.rem_carr_phase_rad + TWO_PI * (self.cfg.if_freq_hz + self.carrier_doppler_hz) * t_int).rem_euclid(TWO_PI);

		// Code loop
		let code_error_chips = discriminators::dll_nc_e_minus_l_normalized(corr.early, corr.late) * (1.0 - self.cfg.early_late_space_chips);
		let code_error_filt_chips = self.code_filter.apply(code_error_chips);
		self.code_freq_chips += code_error_filt_chips;
		let code_error_filt_secs = (t_int * code_error_filt_chips) / self.signal.code_rate_hz;
		self.acc_code_phase_secs += code_error_filt_secs;

		// Next block length from the updated code period; the rounding
		// error is carried, not discarded, so block boundaries never drift
		let t_prn_samples = (code_len_chips / self.code_freq_chips) * fs;
		let k_blk_samples = t_prn_samples + self.rem_code_phase_samples;
		let next_prn_length_samples = k_blk_samples.round();
		self.rem_code_phase_samples = k_blk_samples - next_prn_length_samples;

		// Lock supervision
		if self.lock_monitor.update(corr.prompt, t_int) == LockUpdate::LostLock {
			info!("Loss of lock in channel {}", self.channel_id);
			self.send_event(ChannelEvent::LossOfLock{ channel_id: self.channel_id });
			self.state = TrackingState::Idle;
		}

		self.log_segment();

		output[0] = TrackingOutput {
			prompt_i: corr.prompt.re,
			prompt_q: corr.prompt.im,
			timestamp_secs: (self.sample_counter as f64 + self.rem_code_phase_samples) / fs,
			acc_carrier_phase_rad: self.acc_carrier_phase_rad,
			carrier_doppler_hz: self.carrier_doppler_hz,
			code_freq_chips: self.code_freq_chips,
			cn0_db_hz: self.lock_monitor.cn0_db_hz(),
			valid: self.state == TrackingState::Tracking,
		};

		self.write_dump(&DumpRecord {
			abs_early: corr.early.norm() as f32,
			abs_prompt: corr.prompt.norm() as f32,
			abs_late: corr.late.norm() as f32,
			prompt_i: corr.prompt.re as f32,
			prompt_q: corr.prompt.im as f32,
			sample_counter: self.sample_counter,
			acc_carrier_phase_rad: self.acc_carrier_phase_rad,
			carrier_doppler_hz: self.carrier_doppler_hz,
			code_freq_chips: self.code_freq_chips,
			carr_error_hz,
			carr_error_filt_hz,
			code_error_chips,
			code_error_filt_chips,
			cn0_db_hz: self.lock_monitor.cn0_db_hz(),
			carrier_lock_test: self.lock_monitor.carrier_lock_test(),
			rem_code_phase_samples: self.rem_code_phase_samples,
			next_sample_boundary: (self.sample_counter + n as u64) as f64,
		});

		self.current_prn_length_samples = next_prn_length_samples as usize;

		(n, 1)
	}

	fn log_segment(&mut self) {
		let seg = (self.sample_counter as f64 / self.cfg.fs_in_hz).floor() as u64;
		if seg != self.last_seg {
			self.last_seg = seg;
			debug!("channel {}: input signal time {} s, cn0 {:.1} dB-Hz", self.channel_id, seg, self.lock_monitor.cn0_db_hz());
		}
	}

	fn send_event(&self, event:ChannelEvent) {
		if let Some(tx) = &self.event_tx {
			if let Err(e) = tx.try_send(event) {
				warn!("channel {}: unable to deliver control event: {}", self.channel_id, e);
			}
		}
	}

	fn write_dump(&mut self, rec:&DumpRecord) {
		if let Some(dump) = &mut self.dump {
			if let Err(e) = dump.write_record(rec) {
				warn!("channel {}: error writing tracking dump: {}", self.channel_id, e);
			}
		}
	}

}
