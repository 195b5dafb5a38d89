pub mod builder;
pub mod fees;
pub mod sender;

pub use builder::RaceTxBuilder;
pub use fees::FeeBump;
pub use sender::{TxOutcome, TxSender};
