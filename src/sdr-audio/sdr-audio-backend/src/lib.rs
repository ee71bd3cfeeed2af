// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Sample sources feeding the demodulation pipeline.

pub mod assemble;
pub mod device;
pub mod reader;
#[cfg(feature = "soapysdr")]
pub mod soapy;

pub use assemble::BufferAssembler;
pub use device::{DeviceSelector, TunerSettings};
pub use reader::ReaderSource;
#[cfg(feature = "soapysdr")]
pub use soapy::SoapySource;
