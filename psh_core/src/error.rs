//! Construction error kinds (spec.md §7).

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildError {
    #[error("no empty key set may be constructed into a perfect spatial hash")]
    EmptyKeySet,

    #[error("exhausted {tries} global seed attempts without finding a valid m\u{0304}/r\u{0304} pair")]
    BadRatioRetriesExhausted { tries: u32 },

    #[error("offset jiggler could not place bucket of size {bucket_size} within r\u{0304}^d offsets")]
    JigglerExhausted { bucket_size: usize },

    #[error("positional-hash fixer could not disambiguate slot {slot} within the k search bound")]
    FixerExhausted { slot: u64 },

    #[error("exhausted {tries} construction retries")]
    RetriesExhausted { tries: u32 },
}
