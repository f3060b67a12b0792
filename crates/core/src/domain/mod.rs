pub mod amounts;
pub mod assets;
pub mod chains;

pub use amounts::{NativeAmount, NATIVE_DECIMALS};
pub use assets::AssetRef;
pub use chains::{chain_label, ChainId, Domain};
