//! Core markup parsing primitives
//!
//! This module contains the fundamental building blocks for the strict reader:
//! - Scanner: SIMD-accelerated delimiter detection using memchr
//! - Entities: entity decoding with Cow (zero-copy when possible) and escaping
//! - Attributes: strict attribute parsing
//! - Encoding: BOM / UTF-16 detection and conversion to UTF-8

pub mod attributes;
pub mod encoding;
pub mod entities;
pub mod scanner;
