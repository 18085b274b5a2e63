
use std::fs::File;
use std::io::BufReader;

use byteorder::{LittleEndian, ReadBytesExt};
use num_complex::Complex;

/// A source of complex baseband samples read in whole blocks, the unit the
/// tracking loop consumes
pub trait IqSource {

	/// Appends up to `n` samples to `buf`; returns the number actually
	/// read, which is less than `n` only at end of stream
	fn read_block(&mut self, buf:&mut Vec<Complex<f32>>, n:usize) -> std::io::Result<usize>;

}

/// Interleaved little-endian f32 I/Q pairs
pub struct IqFileSourceF32 {
	rdr: BufReader<File>,
}

impl IqFileSourceF32 {

	pub fn open(filename:&str) -> std::io::Result<Self> {
		Ok(Self{ rdr: BufReader::new(File::open(filename)?) })
	}

}

impl IqSource for IqFileSourceF32 {

	fn read_block(&mut self, buf:&mut Vec<Complex<f32>>, n:usize) -> std::io::Result<usize> {
		for count in 0..n {
			let re = match self.rdr.read_f32::<LittleEndian>() {
				Ok(v) => v,
				Err(ref e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(count),
				Err(e) => return Err(e),
			};
			let im = match self.rdr.read_f32::<LittleEndian>() {
				Ok(v) => v,
				Err(ref e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(count),
				Err(e) => return Err(e),
			};
			buf.push(Complex{ re, im });
		}
		Ok(n)
	}

}

/// Interleaved little-endian i16 I/Q pairs, e.g. raw USRP captures
pub struct IqFileSourceI16 {
	rdr: BufReader<File>,
}

impl IqFileSourceI16 {

	pub fn open(filename:&str) -> std::io::Result<Self> {
		Ok(Self{ rdr: BufReader::new(File::open(filename)?) })
	}

}

impl IqSource for IqFileSourceI16 {

	fn read_block(&mut self, buf:&mut Vec<Complex<f32>>, n:usize) -> std::io::Result<usize> {
		for count in 0..n {
			let re = match self.rdr.read_i16::<LittleEndian>() {
				Ok(v) => v,
				Err(ref e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(count),
				Err(e) => return Err(e),
			};
			let im = match self.rdr.read_i16::<LittleEndian>() {
				Ok(v) => v,
				Err(ref e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(count),
				Err(e) => return Err(e),
			};
			buf.push(Complex{ re: re as f32, im: im as f32 });
		}
		Ok(n)
	}

}
