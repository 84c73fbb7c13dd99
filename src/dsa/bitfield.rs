use std::borrow::Borrow;
use std::fmt::{self, Display, LowerHex, Write as _};
use std::io::{self, Write};

use log::{debug, warn};
use thiserror::Error;

#[derive(Error,Debug,Clone,PartialEq,Eq)]
pub enum BitsError {
    #[error("non-empty index set required by {operation}")]
    EmptyIndexSet{operation:&'static str},
}

pub type Result<T> = std::result::Result<T,BitsError>;

// bit n lives in byte n/8 at mask 0x80 >> (n%8)
// any indexed access grows storage to cover it, reads included
#[derive(Clone,Debug,Default)]
pub struct BitField {
    name:Option<String>,
    verbose:bool,
    // capacity in bits is always bytes.len() * 8
    bytes:Vec<u8>,
}

// name and verbose are cosmetic, only storage counts
impl PartialEq for BitField {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for BitField {}

#[inline]
fn locate(index:usize) -> (usize,u8) {
    (index / 8, 0x80u8 >> (index % 8))
}

impl BitField {
    pub fn new() -> Self {
        Self {name:None,verbose:false,bytes:vec![]}
    }
    pub fn with_max_bit_index(max_bit_index:usize) -> Self {
        let mut field = Self::new();
        field.set_max_bit_index(max_bit_index);
        field
    }
    pub fn with_verbose(mut self,verbose:bool) -> Self {
        self.verbose = verbose;
        self
    }
    pub fn set_verbose(&mut self,verbose:bool) {
        self.verbose = verbose;
    }
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
    pub fn set_name<S:Into<String>>(&mut self,name:S) {
        self.name = Some(name.into());
    }
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
    pub fn bit_capacity(&self) -> usize {
        self.bytes.len() * 8
    }
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    // a reset, not a grow: previous contents are dropped
    pub fn set_max_bit_index(&mut self,max_bit_index:usize) {
        self.bytes = vec![0;max_bit_index / 8 + 1];
    }

    fn ensure_capacity(&mut self,index:usize) {
        if index < self.bit_capacity() {return}
        self.bytes.resize(index / 8 + 1,0);
        if self.verbose {
            debug!("bit {index} required extending capacity to {}",self.bit_capacity());
        }
    }

    pub fn get_at(&self,index:usize) -> Option<bool> {
        let (byte_pos,mask) = locate(index);
        let byte = self.bytes.get(byte_pos)?;
        Some(*byte & mask != 0)
    }
    pub fn get_bit(&mut self,index:usize) -> bool {
        self.ensure_capacity(index);
        let (byte_pos,mask) = locate(index);
        self.bytes[byte_pos] & mask != 0
    }
    pub fn set_bit(&mut self,index:usize) {
        self.ensure_capacity(index);
        let (byte_pos,mask) = locate(index);
        self.bytes[byte_pos] |= mask;
    }
    pub fn clear_bit(&mut self,index:usize) {
        self.ensure_capacity(index);
        let (byte_pos,mask) = locate(index);
        self.bytes[byte_pos] &= !mask;
    }
    pub fn toggle_bit(&mut self,index:usize) {
        self.ensure_capacity(index);
        let (byte_pos,mask) = locate(index);
        self.bytes[byte_pos] ^= mask;
    }

    pub fn set_bits<I,A>(&mut self,indices:I) where I:IntoIterator<Item = A>,A:Borrow<usize> {
        for index in indices {
            self.set_bit(*index.borrow());
        }
    }
    pub fn clear_bits<I,A>(&mut self,indices:I) where I:IntoIterator<Item = A>,A:Borrow<usize> {
        for index in indices {
            self.clear_bit(*index.borrow());
        }
    }
    // duplicates toggle twice and cancel
    pub fn toggle_bits<I,A>(&mut self,indices:I) where I:IntoIterator<Item = A>,A:Borrow<usize> {
        for index in indices {
            self.toggle_bit(*index.borrow());
        }
    }

    // ranges are inclusive on both ends, lo > hi touches nothing
    pub fn set_range(&mut self,lo:usize,hi:usize) {
        for index in lo..=hi {
            self.set_bit(index);
        }
    }
    pub fn clear_range(&mut self,lo:usize,hi:usize) {
        for index in lo..=hi {
            self.clear_bit(index);
        }
    }
    pub fn toggle_range(&mut self,lo:usize,hi:usize) {
        for index in lo..=hi {
            self.toggle_bit(index);
        }
    }

    pub fn true_bits_in_range(&mut self,lo:usize,hi:usize) -> Vec<usize> {
        (lo..=hi).filter(|index| self.get_bit(*index)).collect()
    }
    pub fn false_bits_in_range(&mut self,lo:usize,hi:usize) -> Vec<usize> {
        (lo..=hi).filter(|index| !self.get_bit(*index)).collect()
    }

    pub fn and_by_indices<I,A>(&mut self,indices:I) -> Result<bool> where I:IntoIterator<Item = A>,A:Borrow<usize> {
        let mut iter = indices.into_iter();
        let Some(first) = iter.next() else {
            return Err(self.empty_index_set("and_by_indices"));
        };
        if !self.get_bit(*first.borrow()) {
            return Ok(false);
        }
        Ok(iter.all(|index| self.get_bit(*index.borrow())))
    }
    pub fn or_by_indices<I,A>(&mut self,indices:I) -> Result<bool> where I:IntoIterator<Item = A>,A:Borrow<usize> {
        let mut iter = indices.into_iter();
        let Some(first) = iter.next() else {
            return Err(self.empty_index_set("or_by_indices"));
        };
        if self.get_bit(*first.borrow()) {
            return Ok(true);
        }
        Ok(iter.any(|index| self.get_bit(*index.borrow())))
    }
    fn empty_index_set(&self,operation:&'static str) -> BitsError {
        if self.verbose {
            warn!("{operation} called with an empty index set");
        }
        BitsError::EmptyIndexSet{operation}
    }

    pub fn to_hex_string(&self) -> String {
        format!("{self:x}")
    }
    pub fn to_binary_string(&self) -> String {
        self.to_string()
    }

    fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<NoName>")
    }
    pub fn dump_range_to<W:Write>(&mut self,out:&mut W,lo:usize,hi:usize) -> io::Result<()> {
        writeln!(out,"{} dump_range {lo} .. {hi}",self.display_name())?;
        for index in lo..=hi {
            let value = self.get_bit(index);
            writeln!(out,"\tbit[{index}] = {value}")?;
        }
        Ok(())
    }
    pub fn dump_range(&mut self,lo:usize,hi:usize) -> io::Result<()> {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        self.dump_range_to(&mut lock,lo,hi)
    }
    pub fn dump_all_to<W:Write>(&mut self,out:&mut W) -> io::Result<()> {
        match self.bit_capacity() {
            0 => writeln!(out,"{} dump_all (empty)",self.display_name()),
            capacity => self.dump_range_to(out,0,capacity - 1),
        }
    }
    pub fn dump_all(&mut self) -> io::Result<()> {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        self.dump_all_to(&mut lock)
    }
}

// binary, 8 chars per byte; {:#} adds a 0b prefix
impl Display for BitField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut text = String::with_capacity(2 + self.bytes.len() * 8);
        if f.alternate() {text.push_str("0b")}
        for byte in self.bytes.iter() {
            write!(text,"{byte:08b}")?;
        }
        f.pad(&text)
    }
}

impl LowerHex for BitField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut text = String::with_capacity(2 + self.bytes.len() * 2);
        if f.alternate() {text.push_str("0x")}
        for byte in self.bytes.iter() {
            write!(text,"{byte:02x}")?;
        }
        f.pad(&text)
    }
}

impl<A:Borrow<usize>> FromIterator<A> for BitField {
    fn from_iter<T: IntoIterator<Item = A>>(iter: T) -> Self {
        let mut field = Self::new();
        field.set_bits(iter);
        field
    }
}

impl<A:Borrow<usize>> Extend<A> for BitField {
    fn extend<T: IntoIterator<Item = A>>(&mut self, iter: T) {
        self.set_bits(iter);
    }
}
