//! Transform adapters from dataset records into response shapes.

pub mod drug;
