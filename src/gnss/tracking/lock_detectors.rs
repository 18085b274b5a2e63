
use num_complex::Complex;

pub const CN0_ESTIMATION_SAMPLES:usize = 20;
pub const MINIMUM_VALID_CN0_DB_HZ:f64 = 25.0;
pub const MAXIMUM_LOCK_FAIL_COUNTER:u32 = 50;
pub const CARRIER_LOCK_THRESHOLD:f64 = 0.85;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cn0Estimate {
	pub cn0_db_hz: f64,
	pub reliable: bool,
}

/// Signal-to-noise variance C/N0 estimator over a buffer of prompt
/// correlator outputs.  The second and fourth moments of the prompt
/// envelope separate signal power, sqrt(2*M2^2 - M4), from noise power,
/// M2 minus that; when the moment inequality 2*M2^2 >= M4 fails or either
/// power estimate is non-positive the estimate is reported as 0 and flagged
/// unreliable.
pub fn cn0_m2m4_estimator(prompt_buffer:&[Complex<f64>], integration_time_s:f64) -> Cn0Estimate {
	let n = prompt_buffer.len() as f64;
	let m2:f64 = prompt_buffer.iter().map(|p| p.norm_sqr()).sum::<f64>() / n;
	let m4:f64 = prompt_buffer.iter().map(|p| p.norm_sqr() * p.norm_sqr()).sum::<f64>() / n;

	let signal_arg = 2.0 * m2 * m2 - m4;
	if signal_arg <= 0.0 {
		return Cn0Estimate{ cn0_db_hz: 0.0, reliable: false };
	}

	let signal_power = signal_arg.sqrt();
	let noise_power = m2 - signal_power;
	if signal_power <= 0.0 || noise_power <= 0.0 {
		return Cn0Estimate{ cn0_db_hz: 0.0, reliable: false };
	}

	let snr = signal_power / noise_power;
	Cn0Estimate{ cn0_db_hz: 10.0 * (snr / integration_time_s).log10(), reliable: true }
}

/// Narrowband power carrier lock test.  Ratio of the difference to the sum
/// of squared coherent I/Q sums, in [-1, 1]; near 1 when the carrier phase
/// is locked and the prompt energy sits on the I axis.
pub fn carrier_lock_detector(prompt_buffer:&[Complex<f64>]) -> f64 {
	let sum_i:f64 = prompt_buffer.iter().map(|p| p.re).sum();
	let sum_q:f64 = prompt_buffer.iter().map(|p| p.im).sum();
	let nbp = sum_i * sum_i + sum_q * sum_q;
	let nbd = sum_i * sum_i - sum_q * sum_q;
	if nbp == 0.0 { 0.0 } else { nbd / nbp }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockUpdate {
	/// Still filling the prompt buffer; no new estimate this block
	Buffering,
	/// Estimates refreshed, lock still considered held
	Checked,
	/// The fail counter crossed its limit; the caller must disable tracking
	LostLock,
}

/// Windowed lock supervision: buffers prompt outputs, refreshes the C/N0
/// and carrier-lock estimates once per full window, and runs the hysteretic
/// failure counter over the results.
pub struct LockMonitor {
	prompt_buffer: Vec<Complex<f64>>,
	cn0_db_hz: f64,
	cn0_reliable: bool,
	carrier_lock_test: f64,
	fail_counter: u32,
}

impl LockMonitor {

	pub fn new() -> Self {
		Self {
			prompt_buffer: Vec::with_capacity(CN0_ESTIMATION_SAMPLES),
			cn0_db_hz: 0.0,
			cn0_reliable: false,
			carrier_lock_test: 1.0,
			fail_counter: 0,
		}
	}

	pub fn cn0_db_hz(&self) -> f64 { self.cn0_db_hz }
	pub fn cn0_reliable(&self) -> bool { self.cn0_reliable }
	pub fn carrier_lock_test(&self) -> f64 { self.carrier_lock_test }
	pub fn fail_counter(&self) -> u32 { self.fail_counter }

	pub fn reset(&mut self) {
		self.prompt_buffer.clear();
		self.cn0_db_hz = 0.0;
		self.cn0_reliable = false;
		self.carrier_lock_test = 1.0;
		self.fail_counter = 0;
	}

	pub fn update(&mut self, prompt:Complex<f64>, integration_time_s:f64) -> LockUpdate {
		if self.prompt_buffer.len() < CN0_ESTIMATION_SAMPLES {
			self.prompt_buffer.push(prompt);
			return LockUpdate::Buffering;
		}

		let est = cn0_m2m4_estimator(&self.prompt_buffer, integration_time_s);
		self.cn0_db_hz = est.cn0_db_hz;
		self.cn0_reliable = est.reliable;
		self.carrier_lock_test = carrier_lock_detector(&self.prompt_buffer);
		self.prompt_buffer.clear();

		if self.carrier_lock_test < CARRIER_LOCK_THRESHOLD || self.cn0_db_hz < MINIMUM_VALID_CN0_DB_HZ {
			self.fail_counter += 1;
		} else if self.fail_counter > 0 {
			self.fail_counter -= 1;
		}

		if self.fail_counter > MAXIMUM_LOCK_FAIL_COUNTER {
			self.fail_counter = 0;
			return LockUpdate::LostLock;
		}

		LockUpdate::Checked
	}

}
