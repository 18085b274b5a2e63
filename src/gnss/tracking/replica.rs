
// Local code replica generation.  Chip phase is kept in a 64-bit fixed-point
// format with 32 integer and 32 fractional bits so that phase coherence
// survives arbitrarily long tracks; a plain f64 accumulator loses precision
// once the integer part grows.

pub const FXPT64_SCALE:f64 = 4294967296.0;		// 2^32

pub fn double_to_fxpt64(x:f64) -> i64 { (x * FXPT64_SCALE) as i64 }

/// Whole-chip index of a 32.32 fixed-point phase.  The arithmetic shift
/// floors negative phases, so a phase in [-1, 0) maps to chip -1.
pub fn fxpt64_chip(phase:i64) -> i64 { phase >> 32 }

/// One period of the local code with one wrap-guard chip at each end:
/// index 0 repeats the last chip and index L+1 repeats the first chip, so a
/// resampler phase may fall one chip past either edge without a branch.
pub struct CodeTable {
	table: Vec<f64>,
	len_chips: usize,
}

impl CodeTable {

	pub fn new(code:&[i8]) -> Self {
		let l = code.len();
		let mut table:Vec<f64> = vec![0.0; l + 2];
		for (i, chip) in code.iter().enumerate() {
			table[i + 1] = *chip as f64;
		}
		table[0] = table[l];
		table[l + 1] = table[1];
		Self { table, len_chips: l }
	}

	pub fn len_chips(&self) -> usize { self.len_chips }

	#[inline]
	pub fn chip_at(&self, phase_fxp:i64) -> f64 { self.table[(1 + fxpt64_chip(phase_fxp)) as usize] }

}

/// Early, prompt, and late code sequences for one block.  The three vectors
/// are allocated once and reused; `resample` never reallocates as long as
/// the block length stays within the initial capacity.
pub struct ReplicaBlock {
	pub early: Vec<f64>,
	pub prompt: Vec<f64>,
	pub late: Vec<f64>,
}

impl ReplicaBlock {

	pub fn with_capacity(max_block_samples:usize) -> Self {
		Self {
			early: Vec::with_capacity(max_block_samples),
			prompt: Vec::with_capacity(max_block_samples),
			late: Vec::with_capacity(max_block_samples),
		}
	}

	/// Resamples the code table at the prompt phase and at +/- the
	/// early-late spacing, advancing all three phases by `step_chips` per
	/// output sample.
	pub fn resample(&mut self, table:&CodeTable, n:usize, rem_code_phase_chips:f64, spacing_chips:f64, step_chips:f64) {
		self.early.clear();
		self.prompt.clear();
		self.late.clear();

		let tcode_chips = -rem_code_phase_chips;

		let mut prompt_fxp = double_to_fxpt64(tcode_chips);
		let mut early_fxp  = double_to_fxpt64(tcode_chips + spacing_chips);
		let mut late_fxp   = double_to_fxpt64(tcode_chips - spacing_chips);
		let step_fxp = double_to_fxpt64(step_chips);

		for _ in 0..n {
			self.early.push(table.chip_at(early_fxp));
			self.prompt.push(table.chip_at(prompt_fxp));
			self.late.push(table.chip_at(late_fxp));

			early_fxp  += step_fxp;
			prompt_fxp += step_fxp;
			late_fxp   += step_fxp;
		}
	}

}

#[cfg(test)]
mod tests {

	use super::*;

	#[test]
	fn wrap_guards_replicate_edge_chips() {
		let code:[i8; 4] = [1, -1, -1, 1];
		let table = CodeTable::new(&code);
		assert_eq!(table.len_chips(), 4);

		// One chip before the start reads the last chip; one past the end
		// reads the first
		assert_eq!(table.chip_at(double_to_fxpt64(-0.5)), 1.0);
		assert_eq!(table.chip_at(double_to_fxpt64(4.2)), 1.0);
		assert_eq!(table.chip_at(double_to_fxpt64(0.0)), 1.0);
		assert_eq!(table.chip_at(double_to_fxpt64(1.9)), -1.0);
		assert_eq!(table.chip_at(double_to_fxpt64(3.0)), 1.0);
	}

	#[test]
	fn one_sample_per_chip_resample() {
		let code:[i8; 4] = [1, -1, -1, 1];
		let table = CodeTable::new(&code);
		let mut rep = ReplicaBlock::with_capacity(8);

		rep.resample(&table, 4, 0.0, 0.5, 1.0);

		assert_eq!(rep.prompt, vec![1.0, -1.0, -1.0, 1.0]);
		// Early leads by half a chip: floor(0.5), floor(1.5), ...
		assert_eq!(rep.early, vec![1.0, -1.0, -1.0, 1.0]);
		// Late lags by half a chip: floor(-0.5) = -1 reads the wrap guard
		assert_eq!(rep.late, vec![1.0, 1.0, -1.0, -1.0]);
	}

	#[test]
	fn fixed_point_agrees_with_float_floor() {
		let code:Vec<i8> = (0..1023).map(|i| if i % 3 == 0 { 1 } else { -1 }).collect();
		let table = CodeTable::new(&code);
		let mut rep = ReplicaBlock::with_capacity(4096);

		let step = 0.2557;
		let rem = 0.125;
		rep.resample(&table, 4000, rem, 0.5, step);

		for i in 0..4000 {
			let phase = -rem + (i as f64) * step;
			// The fixed-point accumulator truncates at 2^-32 chips; skip
			// samples whose float phase sits within that quantization of a
			// chip boundary, where floor legitimately disagrees
			let frac = phase - phase.floor();
			if frac < 1.0e-5 || frac > 1.0 - 1.0e-5 { continue; }
			let chip = phase.floor() as i64;
			let expected = code[chip.rem_euclid(1023) as usize] as f64;
			assert_eq!(rep.prompt[i], expected, "sample {}", i);
		}
	}

	#[test]
	fn resample_reuses_allocation() {
		let code:Vec<i8> = vec![1; 1023];
		let table = CodeTable::new(&code);
		let mut rep = ReplicaBlock::with_capacity(4096);

		rep.resample(&table, 4000, 0.0, 0.5, 0.25);
		let cap = rep.prompt.capacity();
		rep.resample(&table, 4001, 0.1, 0.5, 0.25);
		assert_eq!(rep.prompt.capacity(), cap);
		assert_eq!(rep.prompt.len(), 4001);
	}

}
