
use num_complex::Complex;

use super::replica::ReplicaBlock;

const ZERO:Complex<f64> = Complex{ re: 0.0, im: 0.0 };

/// The three complex accumulators produced by one block of correlation
#[derive(Debug, Clone, Copy, Default)]
pub struct CorrelatorOutput {
	pub early: Complex<f64>,
	pub prompt: Complex<f64>,
	pub late: Complex<f64>,
}

/// Carrier wipe-off fused with the E/P/L accumulation.  The carrier
/// conjugate is an evolving unit rotor: `carrier_start` is the rotor at the
/// first sample and `carrier_inc` advances it by one sample of carrier
/// phase, so no separate wipe-off buffer is needed.
pub fn carrier_rotate_and_epl(input:&[Complex<f32>], carrier_start:Complex<f64>, carrier_inc:Complex<f64>, replica:&ReplicaBlock) -> CorrelatorOutput {
	debug_assert!(input.len() == replica.prompt.len());
	debug_assert!(input.len() == replica.early.len());
	debug_assert!(input.len() == replica.late.len());

	let mut rotor = carrier_start;
	let mut early  = ZERO;
	let mut prompt = ZERO;
	let mut late   = ZERO;

	for (i, x) in input.iter().enumerate() {
		let bb = Complex{ re: x.re as f64, im: x.im as f64 } * rotor;
		early  += bb * replica.early[i];
		prompt += bb * replica.prompt[i];
		late   += bb * replica.late[i];
		rotor = rotor * carrier_inc;
	}

	CorrelatorOutput { early, prompt, late }
}

#[cfg(test)]
mod tests {

	use std::f64::consts;

	use super::*;
	use crate::gnss::tracking::replica::{CodeTable, ReplicaBlock};

	fn all_ones_replica(n:usize) -> ReplicaBlock {
		let code:Vec<i8> = vec![1; 1023];
		let table = CodeTable::new(&code);
		let mut rep = ReplicaBlock::with_capacity(n);
		rep.resample(&table, n, 0.0, 0.5, 0.25);
		rep
	}

	#[test]
	fn zero_input_integrates_to_zero() {
		let n = 1000;
		let input:Vec<Complex<f32>> = vec![Complex{ re: 0.0, im: 0.0 }; n];
		let rep = all_ones_replica(n);
		let out = carrier_rotate_and_epl(&input, Complex{ re: 1.0, im: 0.0 }, Complex{ re: 1.0, im: 0.0 }, &rep);
		assert_eq!(out.prompt.norm(), 0.0);
		assert_eq!(out.early.norm(), 0.0);
		assert_eq!(out.late.norm(), 0.0);
	}

	#[test]
	fn tone_at_rotor_frequency_integrates_coherently() {
		// A pure carrier at the rotor frequency should wipe off to DC and
		// integrate to ~n on the prompt arm
		let n = 1000;
		let dphase = 2.0 * consts::PI * 0.013;
		let input:Vec<Complex<f32>> = (0..n).map(|i| {
			let phi = dphase * (i as f64);
			Complex{ re: phi.cos() as f32, im: phi.sin() as f32 }
		}).collect();

		let rep = all_ones_replica(n);
		let inc = Complex{ re: dphase.cos(), im: -dphase.sin() };
		let out = carrier_rotate_and_epl(&input, Complex{ re: 1.0, im: 0.0 }, inc, &rep);

		assert!((out.prompt.re - n as f64).abs() < 1.0e-6 * (n as f64));
		assert!(out.prompt.im.abs() < 1.0e-6 * (n as f64));
	}

	#[test]
	fn mismatched_tone_integrates_incoherently() {
		// Half a cycle of frequency offset over the block collapses the sum
		let n = 1000;
		let dphase = 2.0 * consts::PI * 0.013;
		let offset = consts::PI / (n as f64);
		let input:Vec<Complex<f32>> = (0..n).map(|i| {
			let phi = (dphase + offset) * (i as f64);
			Complex{ re: phi.cos() as f32, im: phi.sin() as f32 }
		}).collect();

		let rep = all_ones_replica(n);
		let inc = Complex{ re: dphase.cos(), im: -dphase.sin() };
		let out = carrier_rotate_and_epl(&input, Complex{ re: 1.0, im: 0.0 }, inc, &rep);

		assert!(out.prompt.norm() < 0.7 * (n as f64));
	}

}
