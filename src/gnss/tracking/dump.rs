
use std::fs::File;
use std::io::BufWriter;

use byteorder::{LittleEndian, WriteBytesExt};

/// One per-block record of internal tracking state, written little-endian
/// in field order for offline analysis
#[derive(Debug, Clone, Copy, Default)]
pub struct DumpRecord {
	pub abs_early: f32,
	pub abs_prompt: f32,
	pub abs_late: f32,
	pub prompt_i: f32,
	pub prompt_q: f32,
	pub sample_counter: u64,
	pub acc_carrier_phase_rad: f64,
	pub carrier_doppler_hz: f64,
	pub code_freq_chips: f64,
	pub carr_error_hz: f64,
	pub carr_error_filt_hz: f64,
	pub code_error_chips: f64,
	pub code_error_filt_chips: f64,
	pub cn0_db_hz: f64,
	pub carrier_lock_test: f64,
	pub rem_code_phase_samples: f64,
	pub next_sample_boundary: f64,
}

pub struct TrackingDump {
	writer: BufWriter<File>,
	pub path: String,
}

impl TrackingDump {

	pub fn create(path_prefix:&str, channel_id:usize) -> std::io::Result<Self> {
		let path = format!("{}{}.dat", path_prefix, channel_id);
		let f = File::create(&path)?;
		Ok(Self{ writer: BufWriter::new(f), path })
	}

	pub fn write_record(&mut self, rec:&DumpRecord) -> std::io::Result<()> {
		self.writer.write_f32::<LittleEndian>(rec.abs_early)?;
		self.writer.write_f32::<LittleEndian>(rec.abs_prompt)?;
		self.writer.write_f32::<LittleEndian>(rec.abs_late)?;
		self.writer.write_f32::<LittleEndian>(rec.prompt_i)?;
		self.writer.write_f32::<LittleEndian>(rec.prompt_q)?;
		self.writer.write_u64::<LittleEndian>(rec.sample_counter)?;
		self.writer.write_f64::<LittleEndian>(rec.acc_carrier_phase_rad)?;
		self.writer.write_f64::<LittleEndian>(rec.carrier_doppler_hz)?;
		self.writer.write_f64::<LittleEndian>(rec.code_freq_chips)?;
		self.writer.write_f64::<LittleEndian>(rec.carr_error_hz)?;
		self.writer.write_f64::<LittleEndian>(rec.carr_error_filt_hz)?;
		self.writer.write_f64::<LittleEndian>(rec.code_error_chips)?;
		self.writer.write_f64::<LittleEndian>(rec.code_error_filt_chips)?;
		self.writer.write_f64::<LittleEndian>(rec.cn0_db_hz)?;
		self.writer.write_f64::<LittleEndian>(rec.carrier_lock_test)?;
		self.writer.write_f64::<LittleEndian>(rec.rem_code_phase_samples)?;
		self.writer.write_f64::<LittleEndian>(rec.next_sample_boundary)?;
		Ok(())
	}

}
