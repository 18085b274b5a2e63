
// Discrete-time loop controllers for the code and carrier tracking loops.
// Gains follow the standard second-order design with a bilinear-transform
// integrator; see Kaplan & Hegarty ch. 5 for the tau derivations.

const DAMPING_RATIO:f64 = 0.7;

pub trait ScalarFilter {

	fn initialize(&mut self, value:f64);
	fn apply(&mut self, error:f64) -> f64;

}

/// Second-order controller producing an absolute NCO command.  The output of
/// `apply` is the filtered rate estimate itself, not a delta, so the filter
/// must be seeded with the acquisition estimate before the first block.
pub struct SecondOrderLoopFilter {
	tau1: f64,
	tau2: f64,
	pdi: f64,
	last_error: f64,
	last_output: f64,
}

impl SecondOrderLoopFilter {

	fn new(noise_bw_hz:f64, natural_freq_gain:f64, pdi_s:f64) -> Self {
		let zeta = DAMPING_RATIO;
		let wn = (noise_bw_hz * 8.0 * zeta) / (4.0 * zeta * zeta + 1.0);
		Self {
			tau1: natural_freq_gain / (wn * wn),
			tau2: (2.0 * zeta) / wn,
			pdi: pdi_s,
			last_error: 0.0,
			last_output: 0.0,
		}
	}

}

impl ScalarFilter for SecondOrderLoopFilter {

	fn initialize(&mut self, value:f64) {
		self.last_error = 0.0;
		self.last_output = value;
	}

	fn apply(&mut self, error:f64) -> f64 {
		let output = self.last_output
			+ (self.tau2 / self.tau1) * (error - self.last_error)
			+ (error + self.last_error) * (self.pdi / (2.0 * self.tau1));
		self.last_error = error;
		self.last_output = output;
		output
	}

}

pub fn new_pll_filter(noise_bw_hz:f64, pdi_s:f64) -> SecondOrderLoopFilter {
	SecondOrderLoopFilter::new(noise_bw_hz, 0.25, pdi_s)
}

pub fn new_dll_filter(noise_bw_hz:f64, pdi_s:f64) -> SecondOrderLoopFilter {
	SecondOrderLoopFilter::new(noise_bw_hz, 1.0, pdi_s)
}

#[cfg(test)]
mod tests {

	use super::*;

	#[test]
	fn seeded_filter_holds_value_at_zero_error() {
		let mut filt = new_pll_filter(25.0, 1.0e-3);
		filt.initialize(1500.0);
		for _ in 0..100 {
			let out = filt.apply(0.0);
			assert!((out - 1500.0).abs() < 1.0e-9);
		}
	}

	#[test]
	fn constant_error_integrates() {
		// With a persistent positive error the integrator must ramp the
		// output upward every step.
		let mut filt = new_dll_filter(2.0, 1.0e-3);
		filt.initialize(0.0);
		let mut last = filt.apply(0.5);
		for _ in 0..20 {
			let next = filt.apply(0.5);
			assert!(next > last);
			last = next;
		}
	}

	#[test]
	fn initialize_clears_history() {
		let mut filt = new_pll_filter(25.0, 1.0e-3);
		filt.initialize(0.0);
		for _ in 0..50 { filt.apply(0.3); }
		filt.initialize(250.0);
		let out = filt.apply(0.0);
		assert!((out - 250.0).abs() < 1.0e-9);
	}

}
