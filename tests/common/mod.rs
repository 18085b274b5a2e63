
use num_complex::Complex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use rust_gnss::gnss::SignalSpec;
use rust_gnss::gnss::tracking::{Tracking, TrackingOutput, TrackingState};

/// Sample-by-sample GPS L1 C/A baseband simulator.  The code phase and the
/// carrier phase advance by Doppler-consistent increments, so changing the
/// Doppler mid-run keeps both phases continuous.
pub struct SignalSim {
	code: Vec<i8>,
	fs: f64,
	if_freq_hz: f64,
	doppler_hz: f64,
	carrier_freq_hz: f64,
	code_rate_hz: f64,
	code_len_chips: f64,
	amplitude: f64,
	noise_sigma: f64,
	code_phase_chips: f64,
	carrier_phase_rad: f64,
	rng: StdRng,
}

impl SignalSim {

	/// `delay_samples` positions chip 0 of the code at that sample index,
	/// matching the `acq_delay_samples` convention of the acquisition
	/// handoff
	pub fn new(prn:u32, fs:f64, if_freq_hz:f64, doppler_hz:f64, delay_samples:f64, noise_sigma:f64, seed:u64) -> Self {
		let spec = SignalSpec::gps_l1_ca();
		let code = spec.local_code(prn).unwrap();
		let code_len_chips = spec.code_length_chips as f64;

		let chip_step = Self::chip_step_static(&spec, doppler_hz, fs);
		let code_phase_chips = (-delay_samples * chip_step).rem_euclid(code_len_chips);

		Self {
			code, fs, if_freq_hz, doppler_hz,
			carrier_freq_hz: spec.carrier_freq_hz,
			code_rate_hz: spec.code_rate_hz,
			code_len_chips,
			amplitude: 1.0,
			noise_sigma,
			code_phase_chips,
			carrier_phase_rad: 0.0,
			rng: StdRng::seed_from_u64(seed),
		}
	}

	fn chip_step_static(spec:&SignalSpec, doppler_hz:f64, fs:f64) -> f64 {
		spec.code_rate_hz * (1.0 + doppler_hz / spec.carrier_freq_hz) / fs
	}

	fn chip_step(&self) -> f64 {
		self.code_rate_hz * (1.0 + self.doppler_hz / self.carrier_freq_hz) / self.fs
	}

	pub fn true_code_freq_chips(&self) -> f64 {
		self.code_rate_hz * (1.0 + self.doppler_hz / self.carrier_freq_hz)
	}

	/// Phase-continuous Doppler change
	pub fn set_doppler(&mut self, doppler_hz:f64) { self.doppler_hz = doppler_hz; }

	pub fn next_sample(&mut self) -> Complex<f32> {
		let chip = self.code[self.code_phase_chips.floor() as usize] as f64;
		let (sin_phi, cos_phi) = self.carrier_phase_rad.sin_cos();
		let mut re = self.amplitude * chip * cos_phi;
		let mut im = self.amplitude * chip * sin_phi;

		if self.noise_sigma > 0.0 {
			let normal = Normal::new(0.0, self.noise_sigma).unwrap();
			re += normal.sample(&mut self.rng);
			im += normal.sample(&mut self.rng);
		}

		let dphase = 2.0 * std::f64::consts::PI * (self.if_freq_hz + self.doppler_hz) / self.fs;
		self.carrier_phase_rad = (self.carrier_phase_rad + dphase).rem_euclid(2.0 * std::f64::consts::PI);
		self.code_phase_chips = (self.code_phase_chips + self.chip_step()).rem_euclid(self.code_len_chips);

		Complex{ re: re as f32, im: im as f32 }
	}

	pub fn fill(&mut self, buf:&mut Vec<Complex<f32>>, n:usize) {
		for _ in 0..n {
			let s = self.next_sample();
			buf.push(s);
		}
	}

}

/// Runs the tracker for `n_blocks` invocations, feeding exactly the number
/// of samples each block asks for, and asserts the bookkeeping invariants
/// on every block
pub fn track_blocks(trk:&mut Tracking, sim:&mut SignalSim, n_blocks:usize, fs:f64) -> Vec<TrackingOutput> {
	let mut outputs:Vec<TrackingOutput> = vec![];
	let mut buf:Vec<Complex<f32>> = vec![];
	let mut out:[TrackingOutput; 1] = [TrackingOutput::default()];

	for _ in 0..n_blocks {
		let needed = trk.samples_needed();
		buf.clear();
		sim.fill(&mut buf, needed);

		let counter_before = trk.sample_counter();
		let (consumed, produced) = trk.process(&buf, &mut out);

		assert_eq!(consumed, needed);
		assert_eq!(produced, 1);
		assert_eq!(trk.sample_counter(), counter_before + consumed as u64);

		let rem_carr = trk.rem_carr_phase_rad();
		assert!(rem_carr >= 0.0 && rem_carr < 2.0 * std::f64::consts::PI, "rem_carr_phase_rad out of range: {}", rem_carr);

		if trk.state() == TrackingState::Tracking {
			let ideal = fs * (trk.signal().code_length_chips as f64) / trk.code_freq_chips();
			let actual = trk.current_prn_length_samples() as f64;
			assert!((actual - ideal).abs() <= 1.0, "block length {} drifted from ideal {}", actual, ideal);
		}

		outputs.push(out[0]);
	}

	outputs
}

pub fn mean(values:impl Iterator<Item = f64>) -> f64 {
	let v:Vec<f64> = values.collect();
	v.iter().sum::<f64>() / (v.len() as f64)
}
