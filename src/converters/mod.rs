//! Format converters
//!
//! This module contains converters between different music notation formats.

pub mod musicxml;
