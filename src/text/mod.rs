//! Text coordinate utilities shared by the scanners.

mod offset_mapper;

pub use offset_mapper::TextOffsetMapper;
