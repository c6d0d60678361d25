pub mod block;
pub mod wavelet;
