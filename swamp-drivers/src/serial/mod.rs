//! Serial output

pub mod usart;

pub use usart::Usart0;
